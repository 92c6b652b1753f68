//! Command-line interface for tcsv
//!
//! # Usage Examples
//!
//! ```bash
//! # Print every content row as one JSON object per line
//! tcsv cat members.csv
//!
//! # Keep values that fail conversion instead of aborting
//! tcsv cat --lenient members.csv
//!
//! # Semicolon-delimited input
//! tcsv cat --delimiter ';' members.csv
//!
//! # Per-table summary: index, columns, row count
//! tcsv check members.csv
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::fs::File;
use std::path::{Path, PathBuf};
use tcsv::{Reader, ReaderBuilder};

#[derive(Parser)]
#[command(name = "tcsv")]
#[command(about = "Read and inspect CSV files with typed column headers")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every content row as one JSON object per line
    Cat {
        /// Input file
        file: PathBuf,

        /// Field delimiter
        #[arg(long, default_value = ",")]
        delimiter: char,

        /// Keep values that fail conversion instead of aborting
        #[arg(long)]
        lenient: bool,
    },

    /// Parse the whole file and summarize each table
    Check {
        /// Input file
        file: PathBuf,

        /// Field delimiter
        #[arg(long, default_value = ",")]
        delimiter: char,

        /// Keep values that fail conversion instead of aborting
        #[arg(long)]
        lenient: bool,
    },
}

fn main() -> anyhow::Result<()> {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Cat {
            file,
            delimiter,
            lenient,
        } => cat(&file, delimiter, lenient),
        Commands::Check {
            file,
            delimiter,
            lenient,
        } => check(&file, delimiter, lenient),
    }
}

fn open(file: &Path, delimiter: char, lenient: bool) -> anyhow::Result<Reader<File>> {
    let delimiter = u8::try_from(delimiter).context("delimiter must be a single ASCII character")?;
    ReaderBuilder::new()
        .delimiter(delimiter)
        .ignore_value_errors(lenient)
        .from_path(file)
        .with_context(|| format!("cannot open {}", file.display()))
}

fn cat(file: &Path, delimiter: char, lenient: bool) -> anyhow::Result<()> {
    let mut reader = open(file, delimiter, lenient)?;
    while let Some(row) = reader.read_row()? {
        println!("{}", serde_json::to_string(&row)?);
    }
    Ok(())
}

fn check(file: &Path, delimiter: char, lenient: bool) -> anyhow::Result<()> {
    let mut reader = open(file, delimiter, lenient)?;
    let mut current: Option<usize> = None;
    let mut columns: Vec<String> = Vec::new();
    let mut row_count = 0usize;
    loop {
        let row = reader.read_row()?;
        if reader.table_index() != current {
            if let Some(index) = current {
                summarize(index, &columns, row_count);
            }
            current = reader.table_index();
            columns = reader.header_names().to_vec();
            row_count = 0;
        }
        match row {
            Some(_) => row_count += 1,
            None => break,
        }
    }
    if let Some(index) = current {
        summarize(index, &columns, row_count);
    }
    Ok(())
}

fn summarize(index: usize, columns: &[String], row_count: usize) {
    println!(
        "table {index}: {row_count} row(s), columns: {}",
        columns.join(", ")
    );
}
