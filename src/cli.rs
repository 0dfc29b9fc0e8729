// CLI module - command-line argument parsing and handlers
//
// With no subcommand the TUI starts. Subcommands:
// - page <N>: print one page as JSON
// - select --count N [--start-page P]: select the first N rows, print the outcome
// - config --show|--path|--reset: inspect or regenerate the config file

use crate::config::{Config, VERSION};
use crate::selection::{BulkSelectReport, SelectionController};
use crate::source::{Record, RecordId};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::Write;

/// Page through a remote record collection and build a selection
#[derive(Parser)]
#[command(name = "pagesel")]
#[command(version = VERSION)]
#[command(about = "Paginated record browser with cross-page selection", long_about = None)]
pub struct Cli {
    /// Serve generated records instead of calling the API
    #[arg(long, global = true)]
    pub demo: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch one page and print it as JSON
    Page {
        /// 1-based page number
        page: u32,
    },

    /// Select the first N rows and print the report and selected ids
    Select {
        /// Number of rows to select
        #[arg(long, short = 'n', allow_negative_numbers = true)]
        count: i64,

        /// Page to start scanning from
        #[arg(long, default_value_t = 1)]
        start_page: u32,
    },

    /// Manage configuration
    Config {
        /// Show effective configuration
        #[arg(long)]
        show: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,

        /// Reset config file to defaults
        #[arg(long)]
        reset: bool,
    },
}

#[derive(Serialize)]
struct PageOutput<'a> {
    page: u32,
    last_page: Option<u32>,
    total_records: Option<u64>,
    records: &'a [Record],
}

#[derive(Serialize)]
struct SelectOutput {
    report: BulkSelectReport,
    selected_ids: Vec<RecordId>,
}

/// `page <N>`
pub async fn handle_page(controller: &SelectionController, page: u32) -> Result<()> {
    controller
        .go_to_page(page)
        .await
        .with_context(|| format!("Failed to load page {}", page))?;

    let view = controller.view();
    let output = PageOutput {
        page: view.current_page,
        last_page: view.last_page,
        total_records: view.total_records,
        records: &view.records,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// `select --count N`. Returns false when the scan stopped on a source error.
pub async fn handle_select(
    controller: &SelectionController,
    count: i64,
    start_page: u32,
) -> Result<bool> {
    let report = controller
        .select_first_n(count, start_page)
        .await
        .context("Bulk select failed")?;

    let success = report.is_success();
    if !success {
        eprintln!("Warning: {}", report.summary());
    }

    let output = SelectOutput {
        report,
        selected_ids: controller.selected_ids(),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(success)
}

/// `config [--show|--path|--reset]`
pub fn handle_config(show: bool, path: bool, reset: bool) -> Result<()> {
    if path {
        handle_config_path()
    } else if show {
        handle_config_show()
    } else if reset {
        handle_config_reset()
    } else {
        // No flag provided, show help
        println!("Usage: pagesel config [--show|--path|--reset]");
        println!();
        println!("Options:");
        println!("  --show    Display effective configuration");
        println!("  --path    Show config file path");
        println!("  --reset   Reset config file to defaults");
        Ok(())
    }
}

fn handle_config_path() -> Result<()> {
    let path = Config::config_path().context("Could not determine config path")?;
    println!("{}", path.display());
    Ok(())
}

fn handle_config_show() -> Result<()> {
    let config = Config::from_env()?;

    println!("# Effective configuration (env > file > defaults)");
    println!();
    print!("{}", config.to_toml());

    println!();
    if let Some(path) = Config::config_path() {
        if path.exists() {
            println!("# Source: {}", path.display());
        } else {
            println!("# Source: defaults (no config file)");
        }
    }
    Ok(())
}

fn handle_config_reset() -> Result<()> {
    let path = Config::config_path().context("Could not determine config path")?;

    // Confirm if file exists
    if path.exists() {
        eprint!(
            "Config file exists at {}. Overwrite? [y/N] ",
            path.display()
        );
        std::io::stderr().flush()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Aborted.");
            return Ok(());
        }
    }

    Config::default().write_to(&path)?;
    println!("Config reset to defaults: {}", path.display());
    Ok(())
}
