//! # pmtraces
//!
//! Command-line front end for batches of exported traces.
//!
//! ```bash
//! # mean of samples [0, 100) for every current trace of group 1, sorted
//! pmtraces mean 0 100 "PM_1_*_Imon.npy"
//!
//! # x/y columns of two traces
//! pmtraces axis PM_1_1_1_Imon.npy PM_1_1_2_Imon.npy
//!
//! # plot all voltage traces
//! pmtraces plot "PM_*_Vmon.npy"
//! ```

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use pmtraces::app;
use pmtraces::config::Config;
use pmtraces::report;
use pmtraces::{BatchPipeline, CurveSet, MetadataEncoding, Operation, PipelineOptions};

/// Sort, average and plot exported traces
#[derive(Parser)]
#[command(name = "pmtraces")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// TOML file with pipeline settings
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Text encoding of the .json sidecars
    #[arg(long, value_enum, global = true)]
    encoding: Option<MetadataEncoding>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the mean of samples [FIRST, LAST) for every matching trace
    Mean {
        /// First sample of the window
        #[arg(allow_negative_numbers = true)]
        first: i64,

        /// One past the last sample of the window
        #[arg(allow_negative_numbers = true)]
        last: i64,

        /// Trace files or shell-style patterns (e.g. "PM_1_*_Imon.npy")
        #[arg(value_name = "PATTERN", required = true)]
        patterns: Vec<String>,

        /// Keep match order instead of sorting by name fields
        #[arg(long)]
        no_sort: bool,

        /// Parameter printed next to each mean (default: "sweep/Rel. Sweep Time")
        #[arg(long, value_name = "PATH", conflicts_with = "no_param")]
        param: Option<String>,

        /// Do not print a parameter column
        #[arg(long)]
        no_param: bool,

        /// Append the y unit of each trace
        #[arg(long)]
        with_unit: bool,
    },

    /// Print reconstructed x values next to the samples of every matching trace
    Axis {
        /// Trace files or shell-style patterns
        #[arg(value_name = "PATTERN", required = true)]
        patterns: Vec<String>,

        /// Keep match order instead of sorting by name fields
        #[arg(long)]
        no_sort: bool,
    },

    /// Plot every matching trace in one window
    Plot {
        /// Trace files or shell-style patterns
        #[arg(value_name = "PATTERN", required = true)]
        patterns: Vec<String>,

        /// Keep match order instead of sorting by name fields
        #[arg(long)]
        no_sort: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    let settings = &config.pipeline;
    let encoding = settings.encoding(cli.encoding);
    let pipeline = BatchPipeline::from_files(encoding);
    info!("metadata encoding: {encoding:?}");

    match cli.command {
        Commands::Mean {
            first,
            last,
            patterns,
            no_sort,
            param,
            no_param,
            with_unit,
        } => {
            let options = PipelineOptions {
                operation: Operation::Mean {
                    start: first,
                    end: last,
                },
                sort: settings.sort(no_sort),
                param: settings.param(param.as_deref(), no_param),
            };
            let results = pipeline.run(&patterns, &options)?;

            let stdout = std::io::stdout();
            report::write_means(stdout.lock(), &results, with_unit)?;
        }

        Commands::Axis { patterns, no_sort } => {
            let options = PipelineOptions {
                operation: Operation::Curve,
                sort: settings.sort(no_sort),
                param: None,
            };
            let results = pipeline.run(&patterns, &options)?;

            let mut stdout = std::io::stdout().lock();
            report::write_curves(&mut stdout, &results)?;
            stdout.flush().context("writing to stdout")?;
        }

        Commands::Plot { patterns, no_sort } => {
            let options = PipelineOptions {
                operation: Operation::Curve,
                sort: settings.sort(no_sort),
                param: None,
            };
            let results = pipeline.run(&patterns, &options)?;

            let title = match results.as_slice() {
                [single] => single.name.clone(),
                _ => format!("pmtraces – {} traces", results.len()),
            };
            app::show(&title, CurveSet::from_results(results))?;
        }
    }

    Ok(())
}
