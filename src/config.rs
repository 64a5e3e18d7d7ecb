use crate::mean::{Lanes, Reducer, Summation};
use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::{fmt::Debug, fs, ops::RangeBounds, path::Path};

/// Number of samples generated when no length is given.
pub const DEFAULT_LEN: usize = 100_000_000;
/// Lower bound of the default sample range.
pub const DEFAULT_LOW: f64 = -100.0;
/// Upper bound (exclusive) of the default sample range.
pub const DEFAULT_HIGH: f64 = 100.0;

/// Benchmark configuration parameters.
///
/// Every section and key is optional; missing values take the defaults of a
/// plain run (100 million samples in `[-100, 100)`, 8-lane unrolled summation).
#[derive(Debug, PartialEq, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub sample: SampleConfig,
    pub summation: SummationConfig,
    pub output: OutputConfig,
}

/// Sample generation parameters.
#[derive(Debug, PartialEq, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SampleConfig {
    /// Number of samples.
    pub len: usize,
    /// Lower bound of the sample range. `len * max(|low|, |high|)` must be
    /// finite.
    pub low: f64,
    /// Upper bound (exclusive) of the sample range.
    pub high: f64,
    /// Generator seed; drawn from the OS when absent.
    pub seed: Option<u64>,
    /// Allocate the buffer on a 64-byte boundary.
    pub aligned: bool,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            len: DEFAULT_LEN,
            low: DEFAULT_LOW,
            high: DEFAULT_HIGH,
            seed: None,
            aligned: false,
        }
    }
}

#[derive(Debug, PartialEq, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SummationConfig {
    pub method: Summation,
    pub lanes: Lanes,
}

/// Output parameters.
#[derive(Debug, PartialEq, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Print phase timings after the average.
    pub timing: bool,
    /// Number of repeated runs.
    pub runs: usize,
    /// Average one buffer with every summation strategy.
    pub compare: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            timing: true,
            runs: 1,
            compare: false,
        }
    }
}

impl Config {
    /// Load a [`Config`] from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;
        Self::from_toml(&contents).with_context(|| format!("failed to load {file:?}"))
    }

    /// Parse and validate a [`Config`] from a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents).context("failed to deserialize config")?;
        config.validate().context("failed to validate config")?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        check_num(self.sample.len, 1..).context("invalid number of samples")?;
        check_range(self.sample.low, self.sample.high).context("invalid sample range")?;
        check_magnitude(self.sample.len, self.sample.low, self.sample.high)
            .context("invalid sample range")?;
        check_num(self.output.runs, 1..=1000).context("invalid number of runs")?;
        Ok(())
    }

    pub fn reducer(&self) -> Reducer {
        Reducer::new(self.summation.method, self.summation.lanes)
    }
}

fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}

fn check_range(low: f64, high: f64) -> Result<()> {
    if !(low.is_finite() && high.is_finite()) {
        bail!("range bounds must be finite, but are [{low}, {high})");
    }
    if low >= high {
        bail!("lower bound must be less than upper bound, but range is [{low}, {high})");
    }
    Ok(())
}

/// The running sum of `len` samples must stay finite.
fn check_magnitude(len: usize, low: f64, high: f64) -> Result<()> {
    let bound = len as f64 * low.abs().max(high.abs());
    if !bound.is_finite() {
        bail!("sum of {len} samples in [{low}, {high}) may overflow f64");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.sample.len, 100_000_000);
        assert_eq!(config.sample.low, -100.0);
        assert_eq!(config.sample.high, 100.0);
        assert_eq!(config.summation.lanes.count(), 8);
        assert_eq!(config.summation.method, Summation::Unrolled);
        assert!(config.output.timing);
        assert_eq!(config.output.runs, 1);
    }

    #[test]
    fn full_file_is_parsed() {
        let contents = r#"
[sample]
len = 1000
low = 0.0
high = 1.0
seed = 42
aligned = true

[summation]
method = "kahan"
lanes = 16

[output]
timing = false
runs = 3
compare = true
"#;
        let config = Config::from_toml(contents).unwrap();
        assert_eq!(config.sample.len, 1000);
        assert_eq!(config.sample.seed, Some(42));
        assert!(config.sample.aligned);
        assert_eq!(config.summation.method, Summation::Kahan);
        assert_eq!(config.summation.lanes, Lanes::Sixteen);
        assert!(!config.output.timing);
        assert_eq!(config.output.runs, 3);
        assert!(config.output.compare);
        assert_eq!(config.reducer(), Reducer::new(Summation::Kahan, Lanes::Sixteen));
    }

    #[test]
    fn invalid_values_are_rejected() {
        for contents in [
            "[sample]\nlen = 0\n",
            "[sample]\nlow = 1.0\nhigh = 1.0\n",
            "[sample]\nlow = 2.0\nhigh = -2.0\n",
            "[summation]\nlanes = 6\n",
            "[summation]\nmethod = \"simd\"\n",
            "[output]\nruns = 0\n",
            "[sample]\nlength = 10\n",
            "[sample]\nlen = 3\nlow = 1e308\nhigh = 1.7e308\n",
        ] {
            assert!(Config::from_toml(contents).is_err(), "{contents:?}");
        }
    }

    #[test]
    fn large_ranges_are_bounded_by_len() {
        assert!(check_magnitude(1, 1e308, 1.7e308).is_ok());
        assert!(check_magnitude(3, 1e308, 1.7e308).is_err());
        assert!(check_magnitude(usize::MAX, -100.0, 100.0).is_ok());
    }

    #[test]
    fn check_num_reports_range() {
        let err = check_num(5, 1..=3).unwrap_err();
        assert_eq!(err.to_string(), "number must be in the range 1..=3, but is 5");
    }
}
