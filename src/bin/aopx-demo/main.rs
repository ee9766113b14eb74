// aopx demo - calls the book controller through a woven dispatcher

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::{json, Value};
use std::sync::Arc;

use aopx::aop::{self, AopConfig};
use aopx::books::{BookController, BookControllerConfig, ADD_BOOK, DECLARING_TYPE, GET_BOOKS};
use aopx::cfg::parse_duration;
use cli::{Cli, Commands};

const DEFAULT_CONFIG: &str = include_str!("../../../demos/aop.json5");

/// Load configuration from file, or the built-in one
fn load_config(path: Option<&str>) -> Result<AopConfig> {
    match path {
        Some(path) => AopConfig::from_file(path),
        None => AopConfig::from_json(DEFAULT_CONFIG).context("Failed to parse built-in config"),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    let pipeline = aop::init(config)?;

    let controller = Arc::new(BookController::new(BookControllerConfig {
        add_delay: parse_duration(&cli.delay)
            .with_context(|| format!("Invalid delay: {}", cli.delay))?,
    }));

    let mut dispatcher = pipeline.dispatcher();
    controller.register(&mut dispatcher);

    let (method, args) = match &cli.command {
        Commands::List => (GET_BOOKS, vec![]),
        Commands::Add(args) => (ADD_BOOK, vec![json!(args.book)]),
    };

    let result = dispatcher.call(&format!("{}.{}", DECLARING_TYPE, method), args)?;
    for key in aopx::log::global_logger_manager().keys() {
        if let Some(logger) = aopx::log::get(&key) {
            logger.flush()?;
        }
    }

    match result {
        Value::String(s) => println!("{}", s),
        other => println!("{}", serde_json::to_string_pretty(&other)?),
    }

    Ok(())
}
