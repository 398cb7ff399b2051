//! Venture CLI - build, render and run filter criteria
//!
//! ```text
//! venture sql     --schema schema.json --entity BswPersonas --filters '{"eq:id": 7}'
//! venture explain --entity BswPersonas --filters @filters.json
//! venture eval    --entity BswPersonas --filters @filters.json --data personas.json
//! venture query   --entity BswPersonas --filters @filters.json --database-url postgres://...
//! ```

mod config;
mod logging;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::json;
use venture_criteria::{
    filter_records, BuilderOptions, Condition, CriteriaBuilder, FilterMap, PgExecutor, Schema,
    SelectQuery, UnknownOperatorPolicy,
};

use crate::config::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "venture", version, about = "Build and run dynamic filter criteria")]
struct Cli {
    /// Configuration file (defaults to ./venture.toml when present)
    #[arg(long, global = true, env = "VENTURE_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (overrides configuration)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the rendered SQL and bind values
    Sql(FilterArgs),
    /// Print the condition tree as JSON
    Explain(FilterArgs),
    /// Evaluate against a JSON array of records and print the matches
    Eval {
        #[command(flatten)]
        filters: FilterArgs,
        /// JSON file holding an array of records
        #[arg(long)]
        data: PathBuf,
    },
    /// Count matching rows in PostgreSQL
    Query {
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long, env = "DATABASE_URL")]
        database_url: Option<String>,
    },
}

#[derive(Args, Debug)]
struct FilterArgs {
    /// Schema file (JSON)
    #[arg(long)]
    schema: Option<PathBuf>,

    /// Root entity name
    #[arg(long)]
    entity: String,

    /// Filter mapping as JSON, or @path to read it from a file
    #[arg(long, default_value = "{}")]
    filters: String,

    #[arg(long, value_enum)]
    unknown_operator: Option<PolicyArg>,

    #[arg(long)]
    max_filters: Option<usize>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PolicyArg {
    Ignore,
    Reject,
}

impl From<PolicyArg> for UnknownOperatorPolicy {
    fn from(value: PolicyArg) -> Self {
        match value {
            PolicyArg::Ignore => Self::Ignore,
            PolicyArg::Reject => Self::Reject,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    config.logging.json |= cli.log_json;

    logging::init_logging(&config.logging).context("Failed to initialize logging")?;

    match cli.command {
        Command::Sql(args) => {
            let (schema, condition) = build(&config, &args)?;
            let query = SelectQuery::build(&schema, &args.entity, &condition)?;
            let output = json!({
                "sql": query.sql(),
                "count_sql": query.count_sql(),
                "binds": query.binds(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Command::Explain(args) => {
            let (_, condition) = build(&config, &args)?;
            println!("{}", serde_json::to_string_pretty(&condition)?);
        }
        Command::Eval { filters, data } => {
            let (_, condition) = build(&config, &filters)?;
            let records = read_records(&data)?;
            let matches = filter_records(&condition, &records);
            tracing::info!(total = records.len(), matched = matches.len(), "Evaluated records");
            println!("{}", serde_json::to_string_pretty(&matches)?);
        }
        Command::Query {
            filters,
            database_url,
        } => {
            let (schema, condition) = build(&config, &filters)?;
            let query = SelectQuery::build(&schema, &filters.entity, &condition)?;

            let Some(url) = database_url.or_else(|| config.database.url.clone()) else {
                bail!("No database URL: pass --database-url or set VENTURE__DATABASE__URL");
            };
            let executor = PgExecutor::connect(&url, config.database.max_connections)
                .await
                .context("Failed to connect to database")?;
            let total = executor.count(&query).await.context("Query failed")?;
            println!("{}", total);
        }
    }

    Ok(())
}

fn build(config: &AppConfig, args: &FilterArgs) -> anyhow::Result<(Schema, Condition)> {
    let Some(schema_path) = args.schema.as_ref().or(config.schema.as_ref()) else {
        bail!("No schema: pass --schema or set `schema` in the configuration");
    };
    let schema = Schema::from_path(schema_path)?;
    if schema.entity(&args.entity).is_none() {
        let known: Vec<&str> = schema.entity_names().collect();
        bail!(
            "Unknown entity '{}'; schema declares: {}",
            args.entity,
            known.join(", ")
        );
    }
    let filters = read_filters(&args.filters)?;

    let options = BuilderOptions {
        unknown_operator: args
            .unknown_operator
            .map(Into::into)
            .unwrap_or(config.builder.unknown_operator),
        max_filters: args.max_filters.unwrap_or(config.builder.max_filters),
    };

    let condition = CriteriaBuilder::with_options(&schema, options)
        .build(&args.entity, &filters)
        .with_context(|| format!("Failed to build criteria for '{}'", args.entity))?;
    Ok((schema, condition))
}

fn read_filters(arg: &str) -> anyhow::Result<FilterMap> {
    let json = match arg.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read filters from {}", path))?,
        None => arg.to_string(),
    };
    serde_json::from_str(&json).context("Filters must be a JSON object of key to value")
}

fn read_records(path: &Path) -> anyhow::Result<Vec<serde_json::Value>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read records from {}", path.display()))?;
    serde_json::from_str(&json).context("Records must be a JSON array")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_query_subcommand() {
        let cli = Cli::try_parse_from([
            "venture",
            "query",
            "--entity",
            "BswPersonas",
            "--filters",
            "{\"eq:id\": 1}",
            "--unknown-operator",
            "reject",
            "--database-url",
            "postgres://localhost/venture",
        ])
        .unwrap();
        let Command::Query { filters, database_url } = cli.command else {
            panic!("expected query");
        };
        assert_eq!(filters.entity, "BswPersonas");
        assert!(matches!(filters.unknown_operator, Some(PolicyArg::Reject)));
        assert_eq!(database_url.as_deref(), Some("postgres://localhost/venture"));
    }

    #[test]
    fn inline_filters_are_parsed() {
        let filters = read_filters(r#"{"eq:id": 1, "nombre": "juan"}"#).unwrap();
        assert_eq!(filters.len(), 2);
        assert!(read_filters("[1, 2]").is_err());
    }
}
