use anyhow::{Context, Result, bail};
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;
use rand_distr::Uniform;

/// Anything that can produce a lazy sequence of bounded samples.
pub trait SampleSource {
    fn samples(&mut self) -> impl Iterator<Item = f64> + '_;
}

/// Uniform samples in `[low, high)` from a ChaCha12 generator.
pub struct UniformSampler {
    dist: Uniform<f64>,
    rng: ChaCha12Rng,
}

impl UniformSampler {
    /// Create a sampler, seeded from `seed` or from the OS when `seed` is `None`.
    pub fn new(low: f64, high: f64, seed: Option<u64>) -> Result<Self> {
        if !(low.is_finite() && high.is_finite()) {
            bail!("sample range bounds must be finite, but are [{low}, {high})");
        }
        let dist = Uniform::new(low, high)
            .with_context(|| format!("invalid sample range [{low}, {high})"))?;

        let rng = match seed {
            Some(seed) => ChaCha12Rng::seed_from_u64(seed),
            None => ChaCha12Rng::try_from_os_rng().context("failed to seed rng from os")?,
        };

        Ok(Self { dist, rng })
    }
}

impl SampleSource for UniformSampler {
    fn samples(&mut self) -> impl Iterator<Item = f64> + '_ {
        Distribution::sample_iter(&self.dist, &mut self.rng)
    }
}
