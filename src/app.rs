//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and initializes logging
//! - parses CLI arguments
//! - reads the calibration and release tables
//! - runs the session pipeline
//! - prints reports/plots
//! - writes optional exports

use std::path::Path;

use clap::Parser;
use log::debug;

use crate::cli::{AnalyzeArgs, CalibrateArgs, Command, DemoArgs, PlotArgs, TemplateArgs};
use crate::error::AppError;
use crate::io::ingest::RawTable;

pub mod pipeline;

/// Entry point for the `release` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = crate::cli::Cli::parse();
    debug!("command: {:?}", cli.command);

    match cli.command {
        Command::Analyze(args) => handle_analyze(args),
        Command::Calibrate(args) => handle_calibrate(args),
        Command::Plot(args) => handle_plot(args),
        Command::Template(args) => handle_template(args),
        Command::Demo(args) => handle_demo(args),
    }
}

fn handle_analyze(args: AnalyzeArgs) -> Result<(), AppError> {
    let config = args.release_config();
    let input = session_input_from_args(&args)?;
    let output = pipeline::run_session(&input, &config)?;

    println!("{}", crate::report::format_run_summary(&output));
    if args.show_plot() && !output.calibration.model.is_fallback() {
        println!(
            "{}",
            crate::plot::render_calibration_plot(
                &output.standards,
                &output.calibration.model,
                args.size.width,
                args.size.height / 2,
            )
        );
    }

    // The comparison stays borrowed from `output` while we report and export it.
    let comparison = output.comparison().ok();
    if let Some(set) = &comparison {
        let summaries = crate::compare::summarize(set);
        println!("{}", crate::report::format_comparison(&summaries));

        if args.show_plot() {
            println!(
                "{}",
                crate::plot::render_release_overlay(set, args.size.width, args.size.height)
            );
        }
    }

    let advisories = crate::report::format_advisories(&output.advisories);
    if !advisories.is_empty() {
        println!("{advisories}");
    }

    // Optional exports.
    if let Some(dir) = &args.export_dir {
        let paths = crate::io::export::export_releases(dir, output.releases())?;
        println!("Exported {} release table(s) to {}", paths.len(), dir.display());
    }
    if let Some(path) = &args.export_comparison {
        let Some(set) = &comparison else {
            return Err(AppError::new(
                2,
                "Cannot export the comparison: it was withheld (see advisories).",
            ));
        };
        let file = crate::io::comparison::ComparisonFile::from_set(
            set,
            &output.calibration.model,
            config.sample_volume,
        );
        crate::io::comparison::write_comparison_json(path, &file)?;
        println!("Exported comparison to {}", path.display());
    }

    Ok(())
}

fn handle_calibrate(args: CalibrateArgs) -> Result<(), AppError> {
    let table = RawTable::from_path(&args.calibration)?;
    let cleaned = crate::io::ingest::clean_calibration(&table)?;

    // No fallback here: insufficient standards are reported as an error.
    let model = crate::calibration::fit(&cleaned.rows)?;

    println!("{}", crate::report::format_calibration(&model));
    if !args.no_plot {
        println!(
            "{}",
            crate::plot::render_calibration_plot(&cleaned.rows, &model, args.size.width, args.size.height)
        );
    }
    if !cleaned.dropped.is_empty() {
        println!(
            "! calibration: {} row(s) skipped ({} unusable cell(s)).",
            cleaned.dropped_rows(),
            cleaned.dropped.len()
        );
    }
    Ok(())
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let file = crate::io::comparison::read_comparison_json(&args.comparison)?;

    println!("Calibration: {}", file.model.equation());
    let plot = crate::plot::render_series_overlay(&file.plot_series(), args.size.width, args.size.height);
    println!("{plot}");
    Ok(())
}

fn handle_template(args: TemplateArgs) -> Result<(), AppError> {
    crate::io::template::write_templates(&args.dir, usize::from(args.samples))?;
    println!(
        "Wrote calibration.csv and release.csv ({} sample column(s)) to {}",
        args.samples,
        args.dir.display()
    );
    Ok(())
}

fn handle_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = crate::data::DemoConfig {
        samples: usize::from(args.samples),
        seed: args.seed,
        noise_sd: args.noise,
        ..crate::data::DemoConfig::default()
    };
    let dataset = crate::data::generate_demo(&config)?;
    crate::data::write_demo(&args.dir, &dataset)?;

    println!(
        "Wrote demo calibration.csv and release.csv ({} sample(s)) to {}",
        dataset.samples.len(),
        args.dir.display()
    );
    println!(
        "Try: release analyze -c {} -s {} --wide",
        args.dir.join("calibration.csv").display(),
        args.dir.join("release.csv").display()
    );
    Ok(())
}

/// Read the tables named on the command line into a session input.
pub fn session_input_from_args(args: &AnalyzeArgs) -> Result<pipeline::SessionInput, AppError> {
    if args.wide && !args.labels.is_empty() {
        return Err(AppError::new(
            2,
            "--label cannot be combined with --wide: sample labels come from the release table header.",
        ));
    }

    let calibration = RawTable::from_path(&args.calibration)?;

    if args.wide {
        let [path] = args.samples.as_slice() else {
            return Err(AppError::new(
                2,
                format!("--wide expects exactly one release table (got {}).", args.samples.len()),
            ));
        };
        let release = RawTable::from_path(path)?;
        return pipeline::SessionInput::from_wide_table(&calibration, &release);
    }

    if args.labels.len() > args.samples.len() {
        return Err(AppError::new(
            2,
            format!(
                "Got {} label(s) for {} sample table(s).",
                args.labels.len(),
                args.samples.len()
            ),
        ));
    }

    let samples = args
        .samples
        .iter()
        .enumerate()
        .map(|(idx, path)| {
            let label = args
                .labels
                .get(idx)
                .cloned()
                .unwrap_or_else(|| default_label(path, idx));
            Ok((label, RawTable::from_path(path)?))
        })
        .collect::<Result<Vec<(String, RawTable)>, AppError>>()?;

    pipeline::SessionInput::from_long_tables(&calibration, &samples)
}

fn default_label(path: &Path, idx: usize) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Sample {}", idx + 1))
}
