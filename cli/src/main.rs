//! cfgrid CLI - conditional-format color grids from XLSX workbooks
//!
//! Scans directories of workbooks, prints their colored grids and writes
//! grids back out.

mod logger;

use cfgrid::render::{report_to_json, render_file, render_sheet, to_json, JsonFormat};
use cfgrid::{Color, ParseOptions};
use clap::{Parser, Subcommand};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Conditional-format color grids from XLSX workbooks
#[derive(Parser)]
#[command(
    name = "cfgrid",
    author = "iyulab",
    version,
    about = "Read XLSX conditional-format colors into grids",
    long_about = "cfgrid - resolve conditional formatting in XLSX workbooks.\n\n\
                  Reads each sheet into a grid of values annotated with the color\n\
                  its conditional formatting rules give it, and writes grids back."
)]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse every .xlsx file under a directory
    Scan {
        /// Directory to scan recursively
        dir: PathBuf,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,

        /// Output compact JSON (no indentation)
        #[arg(long, requires = "json")]
        compact: bool,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Parse options as JSON
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print the colored grid of every sheet in a workbook
    Show {
        /// Input file path
        input: PathBuf,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,

        /// Parse options as JSON
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Parse a workbook and write one sheet's grid to another workbook
    Export {
        /// Input file path
        input: PathBuf,

        /// Destination workbook
        #[arg(short, long)]
        output: PathBuf,

        /// Sheet to export, 1-based
        #[arg(long, default_value = "1")]
        sheet: usize,

        /// Write into Sheet1 of an existing destination instead of replacing it
        #[arg(long)]
        update: bool,

        /// Parse options as JSON
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Show version information
    Version,
}

fn main() {
    let cli = Cli::parse();
    logger::init(logger::level_for(cli.verbose, cli.quiet));

    if let Err(e) = run(cli) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Scan {
            dir,
            json,
            compact,
            output,
            config,
        } => {
            let options = load_options(config.as_deref())?;
            let pb = create_spinner(&format!("Scanning {}...", dir.display()));
            let report = cfgrid::scan_dir(&dir, &options)?;
            pb.finish_and_clear();

            if json {
                let format = if compact {
                    JsonFormat::Compact
                } else {
                    JsonFormat::Pretty
                };
                write_output(output.as_ref(), &report_to_json(&report, format)?)?;
                return Ok(());
            }

            let mut summary = String::new();
            for parsed in &report.succeeded {
                let colored_cells: usize = parsed
                    .sheets
                    .iter()
                    .map(|s| s.grid.cells().filter(|(_, _, c)| c.color != Color::None).count())
                    .sum();
                summary.push_str(&format!(
                    "{} {} ({} sheets, {} colored cells)\n",
                    "✓".green().bold(),
                    parsed.path.display(),
                    parsed.sheets.len(),
                    colored_cells
                ));
            }
            for failure in &report.failed {
                summary.push_str(&format!(
                    "{} {}: {}\n",
                    "✗".red().bold(),
                    failure.path.display(),
                    failure.error
                ));
            }
            summary.push_str(&format!(
                "\n{}: {} parsed, {} failed",
                "Summary".cyan().bold(),
                report.succeeded.len(),
                report.failed.len()
            ));
            write_output(output.as_ref(), &summary)?;
        }

        Commands::Show {
            input,
            json,
            config,
        } => {
            let options = load_options(config.as_deref())?;
            let pb = create_spinner("Parsing workbook...");
            let parsed = cfgrid::parse_file_with_options(&input, options)?;
            pb.finish_and_clear();

            let content = if json {
                to_json(&parsed, JsonFormat::Pretty)?
            } else {
                render_file(&parsed)
            };
            write_output(None, &content)?;
        }

        Commands::Export {
            input,
            output,
            sheet,
            update,
            config,
        } => {
            let options = load_options(config.as_deref())?;
            let pb = create_spinner("Parsing workbook...");
            let parsed = cfgrid::parse_file_with_options(&input, options)?;

            let chosen = sheet
                .checked_sub(1)
                .and_then(|index| parsed.sheets.get(index))
                .ok_or_else(|| {
                    format!(
                        "sheet {} not found ({} has {} sheets)",
                        sheet,
                        input.display(),
                        parsed.sheets.len()
                    )
                })?;

            pb.set_message("Writing workbook...");
            if update {
                cfgrid::update_grid(&output, &chosen.grid)?;
            } else {
                cfgrid::write_grid(&output, &chosen.grid)?;
            }
            pb.finish_and_clear();

            log::debug!("{}", render_sheet(chosen));
            println!(
                "{} Exported '{}' to {}",
                "✓".green().bold(),
                chosen.name,
                output.display()
            );
        }

        Commands::Version => {
            print_version();
        }
    }

    Ok(())
}

fn load_options(config: Option<&Path>) -> cfgrid::Result<ParseOptions> {
    match config {
        Some(path) => ParseOptions::from_json_file(path),
        None => Ok(ParseOptions::default()),
    }
}

fn print_version() {
    println!("{} {}", "cfgrid".green().bold(), env!("CARGO_PKG_VERSION"));
    println!("Conditional-format color grids from XLSX workbooks");
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
        .template("{spinner:.blue} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn write_output(path: Option<&PathBuf>, content: &str) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            writeln!(handle, "{}", content)?;
        }
    }
    Ok(())
}
