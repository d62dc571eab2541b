//! sheetseek CLI - row search over large Excel workbooks
//!
//! A command-line tool for listing sheets and finding rows in XLSX files
//! without loading them into memory.

use clap::{Parser, Subcommand};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use sheetseek::{ReaderConfig, Search, SheetDescriptor, XlsxReader};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Streaming row search for Excel workbooks
#[derive(Parser)]
#[command(
    name = "sheetseek",
    author = "iyulab",
    version,
    about = "Find rows in large Excel workbooks",
    long_about = "sheetseek - Streaming row search for XLSX workbooks.\n\n\
                  Scans sheets row by row from a scratch file, so workbooks with\n\
                  hundreds of thousands of rows are searched in constant memory."
)]
struct Cli {
    /// Print debug logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the sheets of a workbook
    #[command(visible_alias = "ls")]
    Sheets {
        /// Input file path
        input: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Find rows containing a cell that satisfies any rule
    Find {
        /// Input file path
        input: PathBuf,

        /// Search rule; `/pattern/flags` is a regular expression, anything else
        /// is an exact match
        #[arg(short, long = "rule", required = true)]
        rules: Vec<String>,

        /// Sheet name (default: first sheet)
        #[arg(short, long)]
        sheet: Option<String>,

        /// Return every matching row instead of stopping at the first
        #[arg(short, long)]
        all: bool,

        /// Skip matching rows that contain this value
        #[arg(short = 'x', long = "exclude")]
        exclude: Vec<String>,

        /// Treat the first row as a header and print rows keyed by column
        #[arg(long)]
        header: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Directory for scratch files (default: system temp dir)
        #[arg(long)]
        scratch_dir: Option<PathBuf>,
    },

    /// Print the header row of a sheet
    Header {
        /// Input file path
        input: PathBuf,

        /// Sheet name (default: first sheet)
        #[arg(short, long)]
        sheet: Option<String>,
    },

    /// Show version information
    Version,
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Sheets { input, json } => {
            let mut reader = XlsxReader::open(&input)?;
            let sheets = reader.load_manifest()?;

            if json {
                println!("{}", serde_json::to_string_pretty(sheets)?);
            } else {
                println!("{}", display_name(&input).cyan().bold());
                println!("{}", "─".repeat(40));
                for (idx, sheet) in sheets.iter().enumerate() {
                    println!(
                        "{:>3}  {}  {}",
                        idx + 1,
                        sheet.name.bold(),
                        format!("(sheetId {}, {})", sheet.sheet_id, sheet.relationship_id).dimmed()
                    );
                }
                if sheets.is_empty() {
                    println!("{} Workbook has no sheets", "!".yellow().bold());
                }
            }
        }

        Commands::Find {
            input,
            rules,
            sheet,
            all,
            exclude,
            header,
            json,
            scratch_dir,
        } => {
            let search = Search::new(&rules)?.excluding(exclude);

            let mut config = ReaderConfig::default();
            if let Some(dir) = scratch_dir {
                config = config.with_scratch_dir(dir);
            }

            let pb = create_spinner("Loading workbook...");
            let mut reader = XlsxReader::open_with_config(&input, config)?;
            reader.load()?;
            let target = select_sheet(&reader, sheet.as_deref())?;
            log::debug!(
                "searching '{}' with {} rule(s), {} exclusion(s)",
                target.name,
                search.rules().len(),
                search.excluded().len()
            );

            // one pass: the header is consumed before the search starts
            let mut rows = reader.rows(&target)?;
            if header {
                reader.read_header(&mut rows)?;
            }

            pb.set_message(format!("Scanning '{}'...", target.name));
            let found = if all {
                reader.find_rows_in(&mut rows, &search)?
            } else {
                reader.find_row_in(&mut rows, &search)?.into_iter().collect()
            };
            pb.finish_and_clear();

            let stdout = io::stdout();
            let mut out = stdout.lock();
            for values in &found {
                if header {
                    let aligned = reader.align_row(values.clone())?;
                    if json {
                        writeln!(out, "{}", serde_json::to_string(&aligned.into_map())?)?;
                    } else {
                        for (column, value) in aligned.iter() {
                            writeln!(out, "{}: {}", column.bold(), value.unwrap_or(""))?;
                        }
                        writeln!(out)?;
                    }
                } else if json {
                    writeln!(out, "{}", serde_json::to_string(values)?)?;
                } else {
                    writeln!(out, "{}", values.join("\t"))?;
                }
            }

            if found.is_empty() {
                eprintln!("{} No matching rows in '{}'", "!".yellow().bold(), target.name);
            } else {
                eprintln!(
                    "{} {} matching row{} in '{}'",
                    "✓".green().bold(),
                    found.len(),
                    if found.len() == 1 { "" } else { "s" },
                    target.name
                );
            }
        }

        Commands::Header { input, sheet } => {
            let mut reader = XlsxReader::open(&input)?;
            reader.load()?;
            let target = select_sheet(&reader, sheet.as_deref())?;

            let mut rows = reader.rows(&target)?;
            let header = reader.read_header(&mut rows)?;

            println!("{}", format!("Header of '{}'", target.name).cyan().bold());
            println!("{}", "─".repeat(40));
            for (idx, column) in header.columns().iter().enumerate() {
                println!("{:>3}  {}", idx + 1, column);
            }
        }

        Commands::Version => {
            print_version();
        }
    }

    Ok(())
}

fn select_sheet(reader: &XlsxReader, name: Option<&str>) -> sheetseek::Result<SheetDescriptor> {
    match name {
        Some(name) => reader.sheet(name).cloned(),
        None => reader.sheets().first().cloned().ok_or_else(|| {
            sheetseek::Error::SheetNotFound {
                path: reader.path().to_path_buf(),
                name: "<first sheet>".to_string(),
            }
        }),
    }
}

fn print_version() {
    println!("{} {}", "sheetseek".green().bold(), env!("CARGO_PKG_VERSION"));
    println!("Streaming row search for Excel workbooks");
    println!();
    println!("Supported formats: XLSX");
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
            .template("{spinner:.blue} {msg}")
            .unwrap(),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn display_name(path: &Path) -> String {
    path.file_name().unwrap_or_default().to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_find_args() {
        let cli = Cli::parse_from([
            "sheetseek", "find", "data.xlsx", "-r", "Bob", "--rule", "/^A/i", "--all", "-x", "old",
        ]);
        match cli.command {
            Commands::Find {
                rules, all, exclude, ..
            } => {
                assert_eq!(rules, ["Bob", "/^A/i"]);
                assert!(all);
                assert_eq!(exclude, ["old"]);
            }
            _ => panic!("expected find"),
        }
    }
}
