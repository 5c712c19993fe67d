//! bqfdw: offline driver for the BigQuery foreign data wrapper core
//!
//! Renders the remote query a scan would issue, replays scans and schema
//! imports against a JSON fixture, and prints the resulting rows or DDL.

use std::path::PathBuf;

use anyhow::{Context, Result};
use bqfdw_exec::{import_foreign_schema, CancelToken, ForeignTable, StaticClient};
use bqfdw_import::{SchemaImporter, SchemaRestriction};
use bqfdw_options::FdwOptions;
use bqfdw_query::{Qualifier, QueryBuilder};
use bqfdw_types::Diagnostics;
use clap::{Parser, Subcommand};
use tracing::info;

mod args;
mod config;
mod logging;

use config::Config;

#[derive(Parser)]
#[command(name = "bqfdw")]
#[command(about = "Build BigQuery queries and foreign table definitions", long_about = None)]
struct Cli {
    /// Path to the configuration file (defaults to ./bqfdw.yaml when present)
    #[arg(long, short, env = "BQFDW_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the remote query and bind parameters for a scan
    Query {
        #[command(flatten)]
        scan: ScanArgs,
    },
    /// Run a scan against a fixture and print rows as JSON lines
    Scan {
        #[command(flatten)]
        scan: ScanArgs,
        /// JSON fixture standing in for the remote service
        #[arg(long)]
        fixture: PathBuf,
        /// Stop after this many rows
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Import a remote dataset's tables and print CREATE FOREIGN TABLE statements
    Import {
        /// Remote dataset, optionally `project.dataset`
        dataset: String,
        /// JSON fixture standing in for the remote service
        #[arg(long)]
        fixture: PathBuf,
        /// Only import these schemas
        #[arg(long, conflicts_with = "except")]
        limit_to: Vec<String>,
        /// Skip these schemas
        #[arg(long)]
        except: Vec<String>,
        /// Project recorded in the imported tables' dataset option
        #[arg(long)]
        project: Option<String>,
    },
}

#[derive(clap::Args)]
struct ScanArgs {
    /// Predicate as `column operator value`, repeatable
    #[arg(long = "where", short = 'w')]
    predicates: Vec<String>,
    /// Comma-separated columns to project (defaults to every column)
    #[arg(long)]
    columns: Option<String>,
}

impl ScanArgs {
    fn qualifiers(&self) -> Result<Vec<Qualifier>> {
        self.predicates
            .iter()
            .map(|p| args::parse_qualifier(p).with_context(|| format!("invalid --where '{}'", p)))
            .collect()
    }

    fn columns(&self) -> Option<Vec<String>> {
        self.columns.as_deref().map(args::parse_columns)
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = Config::discover(cli.config.as_deref()).context("failed to load configuration")?;
    logging::init(&config.logging);

    let diagnostics = Diagnostics::tracing(true);
    let options = FdwOptions::parse(&config.wrapper_options()?, &diagnostics);

    match cli.command {
        Commands::Query { scan } => {
            let builder = QueryBuilder::new(&options, config.columns.clone(), diagnostics)?;
            let qualifiers = scan.qualifiers()?;
            let columns = scan.columns();
            let names: Option<Vec<&str>> = columns
                .as_ref()
                .map(|c| c.iter().map(String::as_str).collect());

            let query = builder.build_query(Some(&qualifiers[..]), names.as_deref());
            println!("{}", query.sql);
            println!("{}", serde_json::to_string_pretty(&query.parameters)?);
            info!(fingerprint = %query.fingerprint(), dialect = %query.dialect, "Query built");
        }
        Commands::Scan { scan, fixture, limit } => {
            let builder = QueryBuilder::new(&options, config.columns.clone(), diagnostics.clone())?;
            let table = ForeignTable::connect(builder, || StaticClient::from_fixture(&fixture), diagnostics);
            let qualifiers = scan.qualifiers()?;
            let columns = scan.columns();
            let names: Option<Vec<&str>> = columns
                .as_ref()
                .map(|c| c.iter().map(String::as_str).collect());

            let rows = table.scan(Some(&qualifiers[..]), names.as_deref(), CancelToken::new());
            for row in rows.take(limit.unwrap_or(usize::MAX)) {
                println!("{}", serde_json::to_string(&row)?);
            }
        }
        Commands::Import {
            dataset,
            fixture,
            limit_to,
            except,
            project,
        } => {
            let client = StaticClient::from_fixture(&fixture)?;
            let mut importer = SchemaImporter::new(&options, diagnostics.clone());
            if let Some(project) = project {
                importer = importer.with_project(project);
            }
            let restriction = if limit_to.is_empty() {
                SchemaRestriction::from_host("except", except)
            } else {
                SchemaRestriction::from_host("limit_to", limit_to)
            };

            let report = import_foreign_schema(&client, &dataset, &importer, &restriction, &diagnostics)?;
            for draft in &report.drafts {
                println!("{}\n", draft.to_sql(&config.server.local_schema, &config.server.name));
            }
            info!(
                imported = report.drafts.len(),
                rejected = report.rejected.len(),
                "Import finished"
            );
        }
    }

    Ok(())
}
