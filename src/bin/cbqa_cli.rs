//! CLI tool for cbqa - builds, inspects and cross-checks QA workbooks
//!
//! Usage:
//!   cbqa_cli build --config run.toml            # Write the workbook named in the config
//!   cbqa_cli build --config run.toml -o out.xlsx
//!   cbqa_cli inspect QA_QC.xlsx [--sheet M8_EC] # Dump cells as JSON
//!   cbqa_cli verify QA_QC.xlsx                  # Evaluate cumulative formulas

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use serde::Serialize;

use cbqa::verify::{verify_workbook, DEFAULT_TOLERANCE};
use cbqa::{CellData, RunConfig};

#[derive(Parser)]
#[command(version, about = "Build and check cost-benefit QA workbooks.")]
struct Args {
    /// Log debug detail (RUST_LOG overrides).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Lay out every strategy sheet and the summary, then save the workbook.
    Build {
        /// Run configuration (TOML).
        #[arg(short, long, value_name = "PATH")]
        config: PathBuf,

        /// Output workbook; overrides `output` in the config.
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Print the cells of a workbook as JSON.
    Inspect {
        /// Workbook to read.
        file: PathBuf,

        /// Only this sheet.
        #[arg(long)]
        sheet: Option<String>,
    },
    /// Evaluate each strategy sheet's cumulative formulas against its reference block.
    ///
    /// Exits non-zero when any category differs.
    Verify {
        /// Workbook to check.
        file: PathBuf,

        /// Relative tolerance.
        #[arg(long, default_value_t = DEFAULT_TOLERANCE)]
        tolerance: f64,
    },
}

#[derive(Serialize)]
struct SheetDump<'a> {
    name: &'a str,
    cells: Vec<CellData>,
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    init_logging(args.verbose);

    match args.command {
        Command::Build { config, output } => {
            let mut run_config = RunConfig::from_path(&config)
                .with_context(|| format!("loading {}", config.display()))?;
            if let Some(output) = output {
                run_config.output = output;
            }
            let path = cbqa::run::run(&run_config).context("building QA workbook")?;
            info!("Written: {}", path.display());
            Ok(ExitCode::SUCCESS)
        }
        Command::Inspect { file, sheet } => {
            let workbook = cbqa::parser::read_xlsx_path(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let dumps: Vec<SheetDump<'_>> = workbook
                .sheets()
                .iter()
                .filter(|s| {
                    sheet
                        .as_deref()
                        .map_or(true, |n| cbqa::same_sheet_name(&s.name, n))
                })
                .map(|s| SheetDump {
                    name: &s.name,
                    cells: s.cell_data(),
                })
                .collect();
            if let Some(name) = &sheet {
                anyhow::ensure!(!dumps.is_empty(), "no sheet named `{name}`");
            }

            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            serde_json::to_writer_pretty(&mut handle, &dumps)?;
            handle.write_all(b"\n")?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Verify { file, tolerance } => {
            let workbook = cbqa::parser::read_xlsx_path(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let reports = verify_workbook(&workbook, tolerance)?;

            let mut mismatches = 0usize;
            for report in &reports {
                for check in &report.checks {
                    let reference = check
                        .reference_value
                        .map_or_else(|| "(missing)".to_string(), |v| v.to_string());
                    let status = if check.matches { "ok" } else { "MISMATCH" };
                    println!(
                        "{}\t{}\t{}\t{}\t{status}",
                        report.sheet, check.category, check.formula_value, reference
                    );
                    if !check.matches {
                        mismatches += 1;
                    }
                }
            }

            if mismatches > 0 {
                warn!("{mismatches} cumulative values differ from their reference");
                return Ok(ExitCode::FAILURE);
            }
            info!("{} strategy sheets verified", reports.len());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}
