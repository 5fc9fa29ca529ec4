//! Inspection CLI: list and render statements from JSON statement-set files or directories.
#![forbid(unsafe_code)]

use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use sqlset::{Catalog, CatalogOptions, JsonDefinitionSource, Value};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "sqlset-inspect",
    version,
    about = "Inspect statement sets: list ids and render statements",
    disable_help_subcommand = true
)]
struct Cli {
    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = OutputFormat::Text,
        help = "Output format"
    )]
    format: OutputFormat,

    #[arg(
        long,
        global = true,
        value_name = "FILE",
        env = "SQLSET_CONFIG",
        help = "TOML file with a [catalog] table"
    )]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List statement and row-mapper ids.
    List {
        #[arg(value_name = "PATH", required = true, help = "Statement-set files or directories to scan")]
        files: Vec<PathBuf>,
    },
    /// Render one statement.
    Render {
        #[arg(value_name = "PATH", required = true, help = "Statement-set files or directories to scan")]
        files: Vec<PathBuf>,

        #[arg(long, help = "Qualified statement id (namespace.id)")]
        id: String,

        #[arg(long, value_name = "JSON", help = "Parameter object")]
        params: Option<String>,

        #[arg(long, value_name = "JSON", help = "Extra parameters")]
        extra: Option<String>,

        #[arg(long, help = "Render through the text cache under this key")]
        cache_key: Option<String>,
    },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Serialize)]
struct ListReport {
    resources: Vec<String>,
    statements: Vec<String>,
    row_mappers: Vec<String>,
}

#[derive(Serialize)]
struct BoundReport {
    name: String,
    value: serde_json::Value,
    resolved: bool,
}

#[derive(Serialize)]
struct RenderReport {
    id: String,
    kind: String,
    sql: String,
    values: Vec<BoundReport>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}

fn main() {
    init_tracing();
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let options = match &cli.config {
        Some(path) => CatalogOptions::from_toml_file(path)?,
        None => CatalogOptions::default(),
    };

    match cli.command {
        Command::List { files } => {
            let catalog = load_catalog(options, &files)?;
            let report = ListReport {
                resources: catalog.loaded_resources(),
                statements: catalog.statement_ids(),
                row_mappers: catalog.row_mapper_ids(),
            };
            emit(&cli.format, &report, || print_list_text(&report))?;
        }
        Command::Render {
            files,
            id,
            params,
            extra,
            cache_key,
        } => {
            let catalog = load_catalog(options, &files)?;
            let stmt = catalog.statement_by_qualified(&id)?;
            let params = parse_json_arg(params.as_deref())?;
            let extra = match extra.as_deref() {
                Some(raw) => Some(parse_json_arg(Some(raw))?),
                None => None,
            };
            let result = stmt.render_cached(&params, extra.as_ref(), cache_key.as_deref())?;
            let report = RenderReport {
                id: stmt.qualified_id().to_owned(),
                kind: stmt.kind().to_string(),
                sql: result.sql().to_owned(),
                values: result
                    .values()
                    .iter()
                    .map(|b| BoundReport {
                        name: b.name.clone(),
                        value: b.value.to_json(),
                        resolved: b.resolved,
                    })
                    .collect(),
            };
            emit(&cli.format, &report, || print_render_text(&report))?;
        }
    }
    Ok(())
}

fn load_catalog(options: CatalogOptions, files: &[PathBuf]) -> Result<Catalog, Box<dyn Error>> {
    let catalog = Catalog::new(options);
    for file in files {
        if file.is_dir() {
            catalog.load_directory(file)?;
        } else {
            catalog.load_source(&JsonDefinitionSource::open(file))?;
        }
    }
    catalog.seal();
    Ok(catalog)
}

fn parse_json_arg(raw: Option<&str>) -> Result<Value, Box<dyn Error>> {
    match raw {
        Some(raw) => Ok(Value::from_json(serde_json::from_str(raw)?)),
        None => Ok(Value::Null),
    }
}

fn emit<T, F>(format: &OutputFormat, value: &T, printer: F) -> Result<(), Box<dyn Error>>
where
    T: Serialize,
    F: Fn(),
{
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value)?;
            println!("{json}");
        }
        OutputFormat::Text => printer(),
    }
    Ok(())
}

fn print_list_text(report: &ListReport) {
    println!("Resources:");
    for resource in &report.resources {
        println!("  {resource}");
    }
    println!("Statements:");
    for id in &report.statements {
        println!("  {id}");
    }
    println!("Row mappers:");
    for id in &report.row_mappers {
        println!("  {id}");
    }
}

fn print_render_text(report: &RenderReport) {
    println!("-- {} ({})", report.id, report.kind);
    println!("{}", report.sql);
    for (idx, bound) in report.values.iter().enumerate() {
        let marker = if bound.resolved { "" } else { " (unresolved)" };
        println!("  ${} {} = {}{marker}", idx + 1, bound.name, bound.value);
    }
}
