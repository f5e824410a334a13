//! `mdjournal` command line entry point.
//!
//! Thin argument-parsing shell over `mdjournal_core::ops`; every command
//! prints its report and exits non-zero on fatal parse or IO errors.

use chrono::{Days, Local, NaiveDate, NaiveDateTime};
use clap::{Parser as ClapParser, Subcommand};
use mdjournal_core::notebook::ensure_quarter_file;
use mdjournal_core::ops::{
    archive_entries, compile_handout, compile_notes, find_entries, sort_journal,
    tag_recent_entries, CompileOptions, FindOptions, HandoutOptions, RECENT_TAG,
};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, ClapParser)]
#[command(name = "mdjournal", version, about = "Markdown journal toolkit")]
struct Cli {
    /// Path to the notebook directory.
    #[arg(long)]
    notebookpath: PathBuf,

    /// Log directory; defaults to `.mdjournal/logs` inside the notebook.
    #[arg(long)]
    logdir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compile tagged entries into per-tag files.
    Compile {
        /// Journal directory, relative to the notebook.
        #[arg(long, default_value = "journal")]
        journalpath: String,
        /// Tags that never get a file of their own; repeatable.
        #[arg(long = "ignore-tag")]
        ignore_tags: Vec<String>,
        /// Parse all files, ignoring modification timestamps.
        #[arg(long)]
        ignore_modification_timestamps: bool,
    },
    /// Move old entries into per-quarter archive folders.
    Archive {
        /// Working directory, relative to the notebook.
        #[arg(long, default_value = "./")]
        workingdirectory: String,
        /// Entries older than this many weeks are archived.
        #[arg(long, default_value_t = 12)]
        older_than_weeks: u64,
    },
    /// Rebuild the static per-tag handout directory.
    Handout {
        /// Number of weeks considered recent.
        #[arg(long, default_value_t = 1)]
        weeks: u64,
        /// Skip tags whose newest entry is older than this many months;
        /// zero disables the window.
        #[arg(long, default_value_t = 3)]
        ignore_older_than_months: u64,
    },
    /// Search entries by prefix-matched words.
    Find {
        /// Search terms; every term must match.
        #[arg(long, num_args = 1.., required = true)]
        search: Vec<String>,
        /// Skip entries older than this many months; zero disables.
        #[arg(long, default_value_t = 3)]
        ignore_older_than_months: u64,
        /// Write results to this notebook-relative file instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Tag entries of the last weeks as recent.
    TagRecent {
        #[arg(long, default_value_t = 1)]
        weeks: u64,
        #[arg(long, default_value = RECENT_TAG)]
        tag: String,
    },
    /// Regroup journal entries into their quarter files.
    Sort {
        #[arg(long, default_value = "journal")]
        journalpath: String,
    },
    /// Create the current quarter journal file if missing.
    NewQuarter {
        #[arg(long, default_value = "journal")]
        journalpath: String,
        #[arg(long, default_value = "")]
        fileprefix: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("mdjournal: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let notebook_root = cli
        .notebookpath
        .canonicalize()
        .map_err(|err| format!("cannot resolve notebook `{}`: {err}", cli.notebookpath.display()))?;

    let log_dir = cli
        .logdir
        .unwrap_or_else(|| notebook_root.join(".mdjournal/logs"));
    if let Err(err) = mdjournal_core::init_logging(mdjournal_core::default_log_level(), &log_dir) {
        eprintln!("mdjournal: logging disabled: {err}");
    }

    let today = Local::now().date_naive();

    match cli.command {
        Command::Compile {
            journalpath,
            ignore_tags,
            ignore_modification_timestamps,
        } => {
            let options = CompileOptions {
                journal_rel: journalpath,
                ignore_tags,
                ignore_modification_timestamps,
                ..CompileOptions::default()
            };
            let report = compile_notes(&notebook_root, today, &options)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Archive {
            workingdirectory,
            older_than_weeks,
        } => {
            let working_dir = notebook_root.join(workingdirectory);
            let report =
                archive_entries(&notebook_root, &working_dir, weeks_ago(today, older_than_weeks))?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Handout {
            weeks,
            ignore_older_than_months,
        } => {
            let options = HandoutOptions {
                weeks,
                ignore_older_than_months,
            };
            let report = compile_handout(&notebook_root, today, &options)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Find {
            search,
            ignore_older_than_months,
            out,
        } => {
            let options = FindOptions {
                search,
                ignore_older_than_months,
                out,
            };
            let report = find_entries(&notebook_root, today, &options)?;
            print_find_report(&report);
        }
        Command::TagRecent { weeks, tag } => {
            let modified = tag_recent_entries(&notebook_root, weeks_ago(today, weeks), &tag)?;
            println!("{}", serde_json::to_string_pretty(&modified)?);
        }
        Command::Sort { journalpath } => {
            let written = sort_journal(&notebook_root, &journalpath)?;
            println!("{}", serde_json::to_string_pretty(&written)?);
        }
        Command::NewQuarter {
            journalpath,
            fileprefix,
        } => {
            let journal_dir = notebook_root.join(journalpath);
            let path = ensure_quarter_file(&journal_dir, today, &fileprefix)?;
            println!("{}", path.display());
        }
    }

    Ok(())
}

fn print_find_report(report: &mdjournal_core::ops::FindReport) {
    let summary: Vec<String> = report
        .tags_seen
        .iter()
        .map(|(tag, count)| format!("{tag} ({count})"))
        .collect();
    println!(
        "=== {} entries scanned; tags: {} ===\n",
        report.entries_scanned,
        summary.join("; ")
    );

    match report.out_file.as_deref() {
        Some(out_file) => println!("{} results: /{out_file}", report.matches.len()),
        None => {
            for found in &report.matches {
                println!("{}\n\n/{}:{}\n", found.content.join("\n"), found.path, found.position);
            }
        }
    }
}

fn weeks_ago(today: NaiveDate, weeks: u64) -> NaiveDateTime {
    today
        .checked_sub_days(Days::new(weeks * 7))
        .unwrap_or(today)
        .and_hms_opt(0, 0, 0)
        .expect("midnight is always valid")
}
