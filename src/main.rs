use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::AsyncReadExt;

use dqltools::ast::{parse_block, render, validate_round_trip, QueryBlock, QueryParser};
use dqltools::config::Settings;
use dqltools::defaults::apply_defaults;
use dqltools::service::{QueryRequest, QueryService};
use dqltools::store::{QueryExecutor, TimeoutExecutor};

/// Render, check and fill graph queries
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Settings file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the query text of a JSON query block
    Render {
        /// Query block file, or `-` for stdin
        input: String,
        /// Require the text to parse back to the same block
        #[arg(long)]
        validate: bool,
    },
    /// Parse query text and print its tree as JSON
    Parse {
        /// Query text file, or `-` for stdin
        input: String,
        /// Query variable as `name=value`, repeatable
        #[arg(long = "var", value_parser = parse_variable)]
        variables: Vec<(String, String)>,
    },
    /// Authorize a query request, run it on the store and print the filled response
    Query {
        /// Query request file, or `-` for stdin
        input: String,
    },
    /// Fill a store response with the defaults of a query block
    Defaults {
        /// Query block file the response answers
        #[arg(long)]
        template: String,
        /// Store response file, or `-` for stdin
        #[arg(long)]
        response: String,
    },
}

fn parse_variable(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected name=value, got {:?}", raw))
}

async fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut content = String::new();
        tokio::io::stdin()
            .read_to_string(&mut content)
            .await
            .context("Failed to read stdin")?;
        return Ok(content);
    }
    tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("Failed to read {}", input))
}

async fn read_block(input: &str) -> Result<QueryBlock> {
    let content = read_input(input).await?;
    serde_json::from_str(&content).with_context(|| format!("Invalid query block in {}", input))
}

fn require_parser(settings: &Settings) -> Result<impl QueryParser> {
    match settings.parser() {
        Some(parser) => Ok(parser),
        None => bail!(
            "no external parser configured; set [parser] program in {}",
            Settings::config_path().display()
        ),
    }
}

fn require_store(settings: &Settings) -> Result<impl QueryExecutor> {
    match settings.store() {
        Some(store) => Ok(store),
        None => bail!(
            "no store configured; set [store] program in {}",
            Settings::config_path().display()
        ),
    }
}

async fn run_query<P: QueryParser, E: QueryExecutor>(
    parser: P,
    executor: E,
    request: &QueryRequest,
) -> Result<serde_json::Value> {
    let service = QueryService::new(parser, executor);
    Ok(service.query(request).await?)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = match &cli.config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };

    match cli.command {
        Command::Render { input, validate } => {
            let block = read_block(&input).await?;
            let text = if validate || settings.parser.is_some() {
                let parser = require_parser(&settings)?;
                validate_round_trip(&parser, &block).await?
            } else {
                render(&block)?
            };
            println!("{}", text);
        }
        Command::Parse { input, variables } => {
            let parser = require_parser(&settings)?;
            let text = read_input(&input).await?;
            let variables: BTreeMap<String, String> = variables.into_iter().collect();
            let queries = parse_block(&parser, &text, &variables).await?;
            println!("{}", serde_json::to_string_pretty(&queries)?);
        }
        Command::Query { input } => {
            let parser = require_parser(&settings)?;
            let executor = require_store(&settings)?;
            let content = read_input(&input).await?;
            let request: QueryRequest = serde_json::from_str(&content)
                .with_context(|| format!("Invalid query request in {}", input))?;
            let response = match settings.store_timeout() {
                Some(limit) => {
                    run_query(parser, TimeoutExecutor::new(executor, limit), &request).await?
                }
                None => run_query(parser, executor, &request).await?,
            };
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Command::Defaults { template, response } => {
            if template == "-" && response == "-" {
                bail!("only one of --template and --response can read stdin");
            }
            let block = read_block(&template).await?;
            let content = read_input(&response).await?;
            let response: serde_json::Value = serde_json::from_str(&content)
                .with_context(|| format!("Invalid JSON response in {}", response))?;
            let filled = apply_defaults(&block.queries, response);
            println!("{}", serde_json::to_string_pretty(&filled)?);
        }
    }

    Ok(())
}
