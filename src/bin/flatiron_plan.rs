//! flatiron-plan: Compute the sheet/column plan for a JSON Schema
//!
//! Prints which columns the main sheet gets, which sub-sheets exist, and
//! each sub-sheet's column list including parent-link columns, without
//! reading any data.
//!
//! Usage:
//!   # Plan a schema file
//!   flatiron-plan release-schema.json
//!
//!   # Records live under a path inside the schema
//!   flatiron-plan --root-list-path releases release-package-schema.json

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::Result;
use clap::Parser;
use flatiron::{input, FlattenConfig, SheetPlanner};
use std::path::Path;

#[derive(Parser, Debug)]
#[command(name = "flatiron-plan")]
#[command(about = "Compute the sheet/column plan for a JSON Schema", long_about = None)]
struct Args {
    /// Schema file to plan
    #[arg(value_name = "SCHEMA")]
    schema: String,

    /// Name of the main sheet (default: "main")
    #[arg(long)]
    main_sheet_name: Option<String>,

    /// Slash-delimited path to the record list inside the schema
    #[arg(long)]
    root_list_path: Option<String>,

    /// Compact output (no pretty-printing)
    #[arg(long)]
    compact: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let mut config = FlattenConfig::default();
    if let Some(name) = args.main_sheet_name {
        config.main_sheet_name = name;
    }
    config.root_list_path = args.root_list_path;

    let schema = input::load_document(Some(Path::new(&args.schema)), None)?;
    let plan = SheetPlanner::new(config).plan(&schema)?;

    let output = if args.compact {
        serde_json::to_string(&plan)?
    } else {
        serde_json::to_string_pretty(&plan)?
    };
    println!("{output}");

    Ok(())
}
