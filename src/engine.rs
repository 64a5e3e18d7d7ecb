use crate::buffer::SampleBuffer;
use crate::config::Config;
use crate::mean::{Reducer, Summation};
use crate::sampler::{SampleSource, UniformSampler};
use anyhow::{Context, Result, bail};
use std::{
    io::{self, Write},
    time::{Duration, Instant},
};

/// Outcome of a single benchmark run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub average: f64,
    /// Buffer address modulo 64, only recorded for the aligned layout.
    pub alignment: Option<usize>,
    pub creation: Duration,
    pub averaging: Duration,
    pub total: Duration,
}

impl RunReport {
    pub fn write_to<W: Write>(&self, out: &mut W, timing: bool) -> io::Result<()> {
        writeln!(out, "average = {}", self.average)?;
        if let Some(alignment) = self.alignment {
            writeln!(out, "alignment = {alignment}")?;
        }
        if timing {
            writeln!(out, "Data creation: {:.6} seconds", self.creation.as_secs_f64())?;
            writeln!(out, "Averaging:     {:.6} seconds", self.averaging.as_secs_f64())?;
            writeln!(out, "Total:         {:.6} seconds", self.total.as_secs_f64())?;
        }
        Ok(())
    }
}

/// Average and timing of one summation strategy over a shared buffer.
#[derive(Debug, Clone)]
pub struct ComparisonRow {
    pub summation: Summation,
    pub average: f64,
    pub averaging: Duration,
}

/// Benchmark engine.
///
/// Holds the configuration and the sample source, and performs runs:
/// allocate a buffer, populate it, average it, and time each phase.
pub struct Engine<S = UniformSampler> {
    cfg: Config,
    source: S,
}

impl Engine<UniformSampler> {
    /// Create an `Engine` drawing uniform samples in the configured range.
    pub fn new(cfg: Config) -> Result<Self> {
        let source = UniformSampler::new(cfg.sample.low, cfg.sample.high, cfg.sample.seed)
            .context("failed to construct sampler")?;
        Ok(Self { cfg, source })
    }
}

impl<S: SampleSource> Engine<S> {
    pub fn with_source(cfg: Config, source: S) -> Self {
        Self { cfg, source }
    }

    /// Perform one run and return its average and phase timings.
    pub fn perform_run(&mut self) -> Result<RunReport> {
        let reducer = self.cfg.reducer();

        let (buf, creation) = self.populate_buffer()?;
        let start_average = Instant::now();
        let average = reducer
            .mean(buf.as_slice())
            .context("failed to average samples")?;
        let averaging = start_average.elapsed();
        log::debug!("averaged {} samples in {averaging:?}", buf.len());

        Ok(RunReport {
            average,
            alignment: buf.is_aligned().then(|| buf.alignment_offset()),
            creation,
            averaging,
            total: creation + averaging,
        })
    }

    /// Populate one buffer and average it with every summation strategy.
    pub fn perform_comparison(&mut self) -> Result<Vec<ComparisonRow>> {
        let lanes = self.cfg.summation.lanes;
        let (buf, _) = self.populate_buffer()?;

        let mut rows = Vec::with_capacity(Summation::ALL.len());
        for summation in Summation::ALL {
            let start_average = Instant::now();
            let average = Reducer::new(summation, lanes)
                .mean(buf.as_slice())
                .with_context(|| format!("failed to average samples with {summation}"))?;
            let averaging = start_average.elapsed();
            log::debug!("{summation} took {averaging:?}");
            rows.push(ComparisonRow {
                summation,
                average,
                averaging,
            });
        }

        Ok(rows)
    }

    fn populate_buffer(&mut self) -> Result<(SampleBuffer, Duration)> {
        let len = self.cfg.sample.len;
        let mut buf = SampleBuffer::allocate(len, self.cfg.sample.aligned)
            .with_context(|| format!("failed to allocate buffer of {len} samples"))?;
        log::debug!("allocated buffer of {len} samples");

        let start_create = Instant::now();
        let n_written = buf.fill(self.source.samples());
        let creation = start_create.elapsed();
        if n_written != len {
            bail!("sample source ran out after {n_written} of {len} samples");
        }
        log::debug!("populated buffer in {creation:?}");

        Ok((buf, creation))
    }
}
