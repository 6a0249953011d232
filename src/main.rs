use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use rustyline::error::ReadlineError;
use rustyline::{Config, DefaultEditor, EditMode};

use shelfscope::data::filter::{parse_availability, parse_ratings};
use shelfscope::data::{clean, export};
use shelfscope::interactive::{self, Command, Reply};
use shelfscope::{AnalysisConfig, Availability, FilterCriteria, Session, render};

/// Book catalogue analysis
#[derive(Parser, Debug)]
#[command(name = "shelfscope", version)]
#[command(about = "Filter a book catalogue and report statistics and hypothesis tests")]
struct Args {
    /// JSON file overriding analysis settings (alpha, histogram_bins, ...)
    #[arg(long, global = true, value_name = "JSON")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the report for a cleaned table
    Report {
        /// .csv, .json or .parquet
        file: PathBuf,
        #[command(flatten)]
        filters: FilterArgs,
        /// Print JSON instead of tables
        #[arg(long)]
        json: bool,
    },
    /// Write the filtered table to another file
    Export {
        file: PathBuf,
        /// Output path; the extension picks the format, `-` prints CSV
        #[arg(long)]
        out: PathBuf,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Clean a scraped CSV into a table file
    Clean {
        raw: PathBuf,
        #[arg(long)]
        out: PathBuf,
    },
    /// Explore a table with line commands
    Interactive { file: PathBuf },
}

#[derive(clap::Args, Debug)]
struct FilterArgs {
    #[arg(long, value_name = "PRICE")]
    min_price: Option<f64>,

    #[arg(long, value_name = "PRICE")]
    max_price: Option<f64>,

    /// Comma-separated ratings, e.g. 4,5
    #[arg(long, value_parser = parse_ratings)]
    ratings: Option<BTreeSet<u8>>,

    /// in, out or all
    #[arg(long, value_parser = parse_availability)]
    availability: Option<BTreeSet<Availability>>,

    /// Case-insensitive title substring
    #[arg(long)]
    title: Option<String>,

    /// Only ratings 4 and 5
    #[arg(long)]
    top_rated: bool,
}

impl FilterArgs {
    fn apply_to(self, c: &mut FilterCriteria) {
        if let Some(v) = self.min_price {
            c.price_min = v;
        }
        if let Some(v) = self.max_price {
            c.price_max = v;
        }
        if let Some(r) = self.ratings {
            c.ratings = r;
        }
        if let Some(a) = self.availability {
            c.availability = a;
        }
        c.title_substring = self.title;
        c.top_rated_only = self.top_rated;
    }
}

fn open_filtered(file: &Path, config: AnalysisConfig, filters: FilterArgs) -> Result<Session> {
    let mut session = Session::open(file, config)?;
    session.update_criteria(|c| filters.apply_to(c))?;
    Ok(session)
}

fn run_interactive(mut session: Session) -> Result<()> {
    let config = Config::builder()
        .history_ignore_space(true)
        .edit_mode(EditMode::Emacs)
        .build();
    let mut editor = DefaultEditor::with_config(config)?;

    println!(
        "{} records loaded. Type 'help' for commands, 'quit' to leave.\n",
        session.table().len()
    );
    println!("{}", render::report_text(session.report(), session.criteria()));

    loop {
        match editor.readline("shelfscope> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(line);

                match line.parse::<Command>() {
                    Ok(command) => match interactive::execute(&mut session, command) {
                        Reply::Print(text) => println!("{text}"),
                        Reply::Quit => break,
                    },
                    Err(e) => eprintln!("{e}"),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Error: {e}");
                break;
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => AnalysisConfig::from_file(path)?,
        None => AnalysisConfig::default(),
    };

    match args.command {
        Commands::Report { file, filters, json } => {
            let session = open_filtered(&file, config, filters)?;
            if json {
                println!("{}", render::report_json(session.report())?);
            } else {
                println!("{}", render::report_text(session.report(), session.criteria()));
            }
        }
        Commands::Export { file, out, filters } => {
            let mut session = open_filtered(&file, config, filters)?;
            if out.as_os_str() == "-" {
                print!("{}", export::to_csv_string(session.filtered())?);
                return Ok(());
            }
            session.export(&out)?;
            if let Some(msg) = &session.status_message {
                println!("{msg}");
            }
        }
        Commands::Clean { raw, out } => {
            let (table, summary) = clean::clean_file(&raw)?;
            export::write_file(&out, &table)?;
            println!(
                "Read {} rows, kept {} ({} prices imputed), dropped {} -> {}",
                summary.rows_read,
                summary.kept,
                summary.imputed_prices,
                summary.dropped,
                out.display()
            );
        }
        Commands::Interactive { file } => {
            let session = Session::open(&file, config)?;
            run_interactive(session)?;
        }
    }
    Ok(())
}
