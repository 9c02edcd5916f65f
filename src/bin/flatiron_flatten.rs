//! flatiron-flatten: Flatten nested JSON records into tabular sheets
//!
//! Usage:
//!   # Read a data file, stream all sheets to stdout
//!   flatiron-flatten releases.json
//!
//!   # Read from stdin
//!   cat releases.json | flatiron-flatten
//!
//!   # Schema-guided flattening, one .jsonl file per sheet
//!   flatiron-flatten --schema release-schema.json releases.json -o ./sheets
//!
//!   # The record list lives under a key inside the document
//!   flatiron-flatten --root-list-path releases release-package.json

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::Result;
use clap::Parser;
use flatiron::{input, DelimiterPolicy, FlattenConfig, Flattener, SheetWriter, SingleWriter};
use serde_json::Value;
use std::path::Path;

#[derive(Parser, Debug)]
#[command(name = "flatiron-flatten")]
#[command(about = "Flatten nested JSON records into tabular sheets", long_about = None)]
struct Args {
    /// Input data file (use stdin if omitted)
    #[arg(value_name = "FILE")]
    input: Option<String>,

    /// JSON Schema used to plan sheet names and column order
    #[arg(long)]
    schema: Option<String>,

    /// Name of the main sheet (default: "main")
    #[arg(long)]
    main_sheet_name: Option<String>,

    /// Slash-delimited path to the record list inside the document
    #[arg(long)]
    root_list_path: Option<String>,

    /// Output directory for separate .jsonl files per sheet
    /// If omitted, writes all rows to stdout tagged with their sheet name
    #[arg(long, short = 'o')]
    output_dir: Option<String>,

    /// Separator for joining arrays of scalars (default: ";")
    #[arg(long)]
    delimiter: Option<char>,

    /// Fail instead of silently joining when an array value contains the
    /// delimiter
    #[arg(long)]
    reject_delimiter: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let mut config = FlattenConfig::default();
    if let Some(name) = args.main_sheet_name {
        config.main_sheet_name = name;
    }
    config.root_list_path = args.root_list_path;
    if let Some(delimiter) = args.delimiter {
        config.array_delimiter = delimiter;
    }
    if args.reject_delimiter {
        config.delimiter_policy = DelimiterPolicy::Reject;
    }

    let data: Value = if let Some(path) = &args.input {
        input::load_document(Some(Path::new(path)), None)?
    } else {
        serde_json::from_reader(std::io::stdin().lock())?
    };

    let flattener = match &args.schema {
        Some(path) => {
            let schema = input::load_document(Some(Path::new(path)), None)?;
            let plan = flatiron::SheetPlanner::new(config.clone()).plan(&schema)?;
            Flattener::with_plan(config.clone(), &plan)
        }
        None => Flattener::new(config.clone()),
    };

    let book = flattener.flatten_root(&data)?;

    if let Some(output_dir) = args.output_dir {
        let writer = SheetWriter::new(output_dir)?;
        writer.write_workbook(&config.main_sheet_name, &book)?;
    } else {
        let mut writer = SingleWriter::new(std::io::stdout());
        writer.write_workbook(&config.main_sheet_name, &book)?;
        writer.flush()?;
    }

    Ok(())
}
