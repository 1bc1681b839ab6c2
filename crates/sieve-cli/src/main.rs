//! Sieve CLI
//!
//! Resolve request URLs against a model file, generate follow-up URLs, and
//! print or run the compiled SQL.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::json;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sieve_core::{page_links, PaginationConfig, SieveConfig};
use sieve_db::{Database, DatabaseConfig, QueryExecutor, SqlRelation};
use sieve_queries::{active_chips, active_filter_count, FilterOptions, FilterValue, Filtered, SortDirection};

mod model;

use model::{params_from_url, parse_default_sort, ModelFile};

#[derive(Parser, Debug)]
#[command(name = "sieve", version, about = "Filter, sort and paginate from URL query state")]
struct Cli {
    /// Model file (YAML) describing the table, schema and SQL templates
    #[arg(long, short, global = true, value_name = "FILE", default_value = "model.yml")]
    model: PathBuf,

    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(flatten)]
    request: RequestArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct RequestArgs {
    /// Default sort override: a sort name or JSON like '["name","desc"]'
    #[arg(long, global = true)]
    default_sort: Option<String>,

    /// Pass-through parameter kept in every generated URL (repeatable)
    #[arg(long = "extra", global = true, value_name = "KEY=VALUE", value_parser = parse_key_value)]
    extra_params: Vec<(String, String)>,

    /// Return every match instead of one page
    #[arg(long, global = true)]
    no_paginate: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the normalized query state for a URL
    Resolve {
        url: String,
    },

    /// Generate a follow-up URL
    Url {
        url: String,

        #[command(subcommand)]
        op: UrlOp,
    },

    /// Print the compiled SQL and bind parameters
    Sql {
        url: String,

        /// Print the COUNT query instead
        #[arg(long)]
        count: bool,
    },

    /// Run the compiled query and print the rows
    Query {
        url: String,

        #[arg(long, env = "DATABASE_URL")]
        database_url: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum UrlOp {
    /// Make KEY the only active filter
    SetFilter {
        key: String,
        #[arg(required = true)]
        values: Vec<String>,
    },
    /// Set KEY, keeping other filters
    AddFilter {
        key: String,
        #[arg(required = true)]
        values: Vec<String>,
    },
    RemoveFilter {
        key: String,
    },
    /// Remove one VALUE from the list filter KEY
    RemoveSubFilter {
        key: String,
        value: String,
    },
    ClearFilters,
    ClearSort,
    ClearAll,
    /// Column header link for KEY
    Sort {
        key: String,
        #[arg(long, value_enum)]
        order: Option<OrderArg>,
        #[arg(long)]
        scope: Option<String>,
    },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OrderArg {
    Asc,
    Desc,
}

impl From<OrderArg> for SortDirection {
    fn from(order: OrderArg) -> Self {
        match order {
            OrderArg::Asc => SortDirection::Asc,
            OrderArg::Desc => SortDirection::Desc,
        }
    }
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))
}

/// One value stays scalar; several become a list
fn filter_value(mut values: Vec<String>) -> FilterValue {
    if values.len() == 1 {
        FilterValue::Single(values.remove(0))
    } else {
        FilterValue::Multiple(values)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = SieveConfig::from_env()?;
    let model = ModelFile::load(&cli.model)?;
    let filterable = model.filterable(config.pagination)?;

    let mut options = FilterOptions::new();
    if let Some(raw) = &cli.request.default_sort {
        options = options.with_default_sort_value(&parse_default_sort(raw))?;
    }
    if cli.request.no_paginate {
        options = options.without_pagination();
    }
    for (key, value) in &cli.request.extra_params {
        options = options.extra_param(key, value);
    }

    let url = match &cli.command {
        Command::Resolve { url }
        | Command::Url { url, .. }
        | Command::Sql { url, .. }
        | Command::Query { url, .. } => url.clone(),
    };
    let filtered = filterable.filter(&params_from_url(&url), model.base_relation(), options)?;

    match cli.command {
        Command::Resolve { .. } => {
            let state = filtered.state();
            let page = filtered.page().unwrap_or_else(|| state.page_request(filterable.pagination()));
            let output = json!({
                "state": state,
                "sort": filtered.sort_name(),
                "direction": filtered.direction(),
                "page": page,
                "active_filter_count": active_filter_count(state, &model.chips),
                "chips": active_chips(state, &model.chips),
            });
            print_json_or(cli.format, &output, || {
                let mut lines = vec![format!(
                    "sort: {} {}",
                    filtered.sort_name().unwrap_or("-"),
                    filtered.direction()
                )];
                for (key, value) in state.filters() {
                    lines.push(format!("filter {} = {}", key, value.as_strings().join(", ")));
                }
                lines.push(format!("page: {} (per {})", page.page, page.per_page));
                lines.join("\n")
            })?;
        }
        Command::Url { url, op } => {
            let (next, current) = run_url_op(&filtered, &url, op);
            let output = json!({ "url": next, "current": current });
            print_json_or(cli.format, &output, || next.clone())?;
        }
        Command::Sql { count, .. } => {
            let (sql, params) = if count {
                filtered.items.count_sql()
            } else {
                filtered.items.to_sql()
            };
            let output = json!({ "sql": sql, "params": params });
            print_json_or(cli.format, &output, || {
                let mut text = sql.clone();
                for (i, param) in params.iter().enumerate() {
                    text.push_str(&format!("\n  ${} = {:?}", i + 1, param));
                }
                text
            })?;
        }
        Command::Query { database_url, .. } => {
            let db_config = match database_url {
                Some(url) => DatabaseConfig::from_env().with_url(url),
                None => DatabaseConfig::from_env(),
            };
            run_query(&filtered, filterable.pagination(), &db_config, cli.format).await?;
        }
    }

    Ok(())
}

fn run_url_op(filtered: &Filtered<SqlRelation>, url: &str, op: UrlOp) -> (String, Option<SortDirection>) {
    match op {
        UrlOp::SetFilter { key, values } => (filtered.set_filter_url(url, &key, filter_value(values)), None),
        UrlOp::AddFilter { key, values } => (filtered.add_filter_url(url, &key, filter_value(values)), None),
        UrlOp::RemoveFilter { key } => (filtered.remove_filter_url(url, &key), None),
        UrlOp::RemoveSubFilter { key, value } => (filtered.remove_sub_filter_url(url, &key, &value), None),
        UrlOp::ClearFilters => (filtered.clear_filter_url(url), None),
        UrlOp::ClearSort => (filtered.clear_sort_url(url), None),
        UrlOp::ClearAll => (filtered.clear_all_url(url), None),
        UrlOp::Sort { key, order, scope } => {
            filtered.sort_url(url, &key, order.map(SortDirection::from), scope.as_deref())
        }
    }
}

async fn run_query(
    filtered: &Filtered<SqlRelation>,
    pagination: &PaginationConfig,
    db_config: &DatabaseConfig,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let db = Database::connect(db_config).await?;
    let result = QueryExecutor::new(db.pool())
        .fetch_json_page(&filtered.items, filtered.page())
        .await?;
    info!(total = result.total, returned = result.items.len(), "Query complete");

    let links = result.page.zip(result.total_pages()).map(|(page, total_pages)| {
        page_links(page.page, total_pages, pagination.window, pagination.outer_window)
    });

    let output = json!({
        "total": result.total,
        "rows": result.items,
        "page": result.page,
        "total_pages": result.total_pages(),
        "page_links": links,
    });
    print_json_or(format, &output, || {
        let mut lines: Vec<String> = result.items.iter().map(|row| row.to_string()).collect();
        lines.push(format!("{} matching", result.total));
        if let (Some(page), Some(total_pages)) = (result.page, result.total_pages()) {
            lines.push(format!("page {} of {} (per {})", page.page, total_pages, page.per_page));
        }
        lines.join("\n")
    })?;

    db.close().await;
    Ok(())
}

fn print_json_or<F>(format: OutputFormat, value: &serde_json::Value, text: F) -> anyhow::Result<()>
where
    F: FnOnce() -> String,
{
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Text => println!("{}", text()),
    }
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,sieve_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true).with_writer(std::io::stderr))
        .init();
}
