use crate::config::Config;
use crate::engine::{ComparisonRow, Engine, RunReport};
use crate::mean::Summation;
use crate::stats::TimingSummary;
use anyhow::{Context, Result};
use std::io::Write;

pub struct Manager {
    cfg: Config,
}

impl Manager {
    pub fn new(cfg: Config) -> Result<Self> {
        cfg.validate().context("failed to validate cfg")?;
        log::info!("{cfg:#?}");

        Ok(Self { cfg })
    }

    /// Run the configured benchmark and write the results to `out`.
    pub fn run_benchmark<W: Write>(&self, out: &mut W) -> Result<()> {
        let mut engine = Engine::new(self.cfg.clone()).context("failed to construct engine")?;

        let n_runs = self.cfg.output.runs;

        if self.cfg.output.compare {
            let mut rounds = Vec::with_capacity(n_runs);
            for i_run in 0..n_runs {
                let rows = engine
                    .perform_comparison()
                    .with_context(|| format!("failed to perform comparison {i_run}"))?;
                log::info!("completed comparison {}/{n_runs}", i_run + 1);
                rounds.push(rows);
            }
            write_comparison(out, &rounds, self.cfg.output.timing)
                .context("failed to write comparison")?;
            return Ok(());
        }

        let mut reports = Vec::with_capacity(n_runs);
        for i_run in 0..n_runs {
            let report = engine
                .perform_run()
                .with_context(|| format!("failed to perform run {i_run}"))?;
            log::info!("completed run {}/{n_runs}", i_run + 1);

            if n_runs > 1 {
                writeln!(out, "run {}/{n_runs}:", i_run + 1)?;
            }
            report
                .write_to(out, self.cfg.output.timing)
                .context("failed to write report")?;
            reports.push(report);
        }

        if n_runs > 1 && self.cfg.output.timing {
            write_summary(out, &reports).context("failed to write summary")?;
        }

        Ok(())
    }
}

fn write_summary<W: Write>(out: &mut W, reports: &[RunReport]) -> Result<()> {
    let phases: [(&str, fn(&RunReport) -> f64); 3] = [
        ("Data creation", |report| report.creation.as_secs_f64()),
        ("Averaging", |report| report.averaging.as_secs_f64()),
        ("Total", |report| report.total.as_secs_f64()),
    ];

    writeln!(
        out,
        "{:<14} {:>10} {:>10} {:>10} {:>10} {:>10}",
        "phase", "min", "max", "mean", "median", "std_dev"
    )?;
    for (name, secs_of) in phases {
        let secs: Vec<_> = reports.iter().map(secs_of).collect();
        let summary = TimingSummary::from_secs(&secs)?;
        writeln!(
            out,
            "{name:<14} {:>10.6} {:>10.6} {:>10.6} {:>10.6} {:>10.6}",
            summary.min, summary.max, summary.mean, summary.median, summary.std_dev
        )?;
    }

    Ok(())
}

/// One line per strategy: the first round's average and its deviation from
/// pairwise, then the timing spread over all rounds relative to naive.
fn write_comparison<W: Write>(
    out: &mut W,
    rounds: &[Vec<ComparisonRow>],
    timing: bool,
) -> Result<()> {
    let first = rounds.first().context("comparison has no rounds")?;

    // Pairwise summation is the lane-independent reference.
    let reference = first
        .iter()
        .find(|row| row.summation == Summation::Pairwise)
        .map(|row| row.average)
        .context("comparison has no pairwise result")?;

    let summaries = Summation::ALL
        .iter()
        .map(|&summation| {
            let secs: Vec<_> = rounds
                .iter()
                .flatten()
                .filter(|row| row.summation == summation)
                .map(|row| row.averaging.as_secs_f64())
                .collect();
            TimingSummary::from_secs(&secs)
                .with_context(|| format!("no timings for {summation}"))
        })
        .collect::<Result<Vec<_>>>()?;
    let baseline = summaries[0].mean;

    for (row, summary) in first.iter().zip(&summaries) {
        write!(out, "{:<10} average = {}", row.summation, row.average)?;
        write!(out, "  deviation = {:e}", row.average - reference)?;
        if timing {
            write!(out, "  time = {:.6} seconds", summary.mean)?;
            write!(out, "  relative = {:.2}x", relative(summary.mean, baseline))?;
            if rounds.len() > 1 {
                write!(
                    out,
                    "  min = {:.6}  max = {:.6}  median = {:.6}  std_dev = {:.6}",
                    summary.min, summary.max, summary.median, summary.std_dev
                )?;
            }
        }
        writeln!(out)?;
    }

    Ok(())
}

fn relative(secs: f64, baseline: f64) -> f64 {
    if baseline > 0.0 {
        secs / baseline
    } else if secs > 0.0 {
        f64::INFINITY
    } else {
        1.0
    }
}
