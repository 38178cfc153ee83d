//! Command-line parsing for the drug-release analysis tool.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the calibration/release code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{DEFAULT_SAMPLE_VOLUME, MAX_SAMPLES, ReleaseConfig};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "release", version, about = "Drug release curves from UV-Vis absorbance")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit the standard curve, compute cumulative release per sample, and compare.
    Analyze(AnalyzeArgs),
    /// Fit and report the standard curve only.
    Calibrate(CalibrateArgs),
    /// Plot a previously exported comparison JSON.
    Plot(PlotArgs),
    /// Write blank calibration and release tables to fill in.
    Template(TemplateArgs),
    /// Generate a synthetic dataset (first-order release profiles).
    Demo(DemoArgs),
}

/// Plot geometry shared by the commands that draw.
#[derive(Debug, Args, Clone)]
pub struct PlotSize {
    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}

/// Options for a full analysis.
#[derive(Debug, Parser, Clone)]
pub struct AnalyzeArgs {
    /// Calibration CSV with `concentration` and `absorbance` columns.
    #[arg(short = 'c', long, value_name = "CSV")]
    pub calibration: PathBuf,

    /// Release CSV. With `--wide`, a single table with a time column and one
    /// column per sample; otherwise one `time, absorbance` table per sample
    /// (repeat the flag, up to 9 times).
    #[arg(short = 's', long = "sample", value_name = "CSV", required = true)]
    pub samples: Vec<PathBuf>,

    /// Sample label, in the same order as `--sample` (defaults to the file stem).
    #[arg(short = 'l', long = "label")]
    pub labels: Vec<String>,

    /// Treat the single `--sample` file as a wide table.
    #[arg(long)]
    pub wide: bool,

    /// Sample volume in mL, applied to every sample.
    #[arg(long, env = "RELEASE_SAMPLE_VOLUME", default_value_t = DEFAULT_SAMPLE_VOLUME)]
    pub sample_volume: f64,

    /// Render ASCII plots in the terminal (enabled by default).
    #[arg(long, default_value_t = true)]
    pub plot: bool,

    /// Disable the terminal plots.
    #[arg(long)]
    pub no_plot: bool,

    #[command(flatten)]
    pub size: PlotSize,

    /// Write one release CSV per sample into this directory.
    #[arg(long, value_name = "DIR")]
    pub export_dir: Option<PathBuf>,

    /// Export the comparison (model + series + summaries) to JSON.
    #[arg(long = "export-comparison", value_name = "JSON")]
    pub export_comparison: Option<PathBuf>,
}

impl AnalyzeArgs {
    pub fn release_config(&self) -> ReleaseConfig {
        ReleaseConfig::with_sample_volume(self.sample_volume)
    }

    pub fn show_plot(&self) -> bool {
        self.plot && !self.no_plot
    }
}

/// Options for calibration only.
#[derive(Debug, Parser, Clone)]
pub struct CalibrateArgs {
    /// Calibration CSV with `concentration` and `absorbance` columns.
    #[arg(short = 'c', long, value_name = "CSV")]
    pub calibration: PathBuf,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    #[command(flatten)]
    pub size: PlotSize,
}

/// Options for plotting a saved comparison.
#[derive(Debug, Parser)]
pub struct PlotArgs {
    /// Comparison JSON file produced by `release analyze --export-comparison`.
    #[arg(long, value_name = "JSON")]
    pub comparison: PathBuf,

    #[command(flatten)]
    pub size: PlotSize,
}

/// Options for blank templates.
#[derive(Debug, Parser)]
pub struct TemplateArgs {
    /// Output directory.
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,

    /// Number of sample columns in the release template.
    #[arg(short = 'n', long, default_value_t = 3, value_parser = clap::value_parser!(u8).range(1..=MAX_SAMPLES as i64))]
    pub samples: u8,
}

/// Options for synthetic data.
#[derive(Debug, Parser)]
pub struct DemoArgs {
    /// Output directory.
    #[arg(long, default_value = "demo-data")]
    pub dir: PathBuf,

    /// Number of samples to generate.
    #[arg(short = 'n', long, default_value_t = 3, value_parser = clap::value_parser!(u8).range(1..=MAX_SAMPLES as i64))]
    pub samples: u8,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Absorbance noise standard deviation (AU).
    #[arg(long, default_value_t = 0.001)]
    pub noise: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analyze_collects_repeated_samples() {
        let cli = Cli::parse_from([
            "release", "analyze", "-c", "cal.csv", "-s", "a.csv", "-s", "b.csv", "--label", "A", "--no-plot",
        ]);
        let Command::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        assert_eq!(args.samples.len(), 2);
        assert_eq!(args.labels, vec!["A".to_string()]);
        assert!(!args.show_plot());
        assert!(!args.wide);
    }

    #[test]
    fn analyze_reads_sample_volume_flag() {
        let cli = Cli::parse_from([
            "release", "analyze", "-c", "cal.csv", "-s", "r.csv", "--wide", "--sample-volume", "10",
        ]);
        let Command::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        assert_eq!(args.release_config().sample_volume, 10.0);
        assert!(args.wide);
    }

    #[test]
    fn template_rejects_ten_samples() {
        let res = Cli::try_parse_from(["release", "template", "-n", "10"]);
        assert!(res.is_err());
    }
}
