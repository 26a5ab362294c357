//! CLI tool for table schemas, script checks and table cloning.
//!
//! Provides commands for:
//! - Deriving the runtime schema of a table definition
//! - Normalizing a table script
//! - Running a table script against a row
//! - Cloning a table out of a JSON fixture

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use tablekit_core::clone::CloneEngine;
use tablekit_core::config::PlatformConfig;
use tablekit_core::storage::{FieldStore, MemoryStore, Row};
use tablekit_core::table::{ExecutionMoment, UserAction};
use tablekit_core::{build_schema, Field, Schema};
use tablekit_script::{normalizer, ScriptContext, ScriptEngine, TracingEmailSender};

/// Command-line arguments for the table tool.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Script timeout in milliseconds, overriding the configuration
    #[arg(long)]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the runtime schema of a table definition
    Schema {
        /// JSON file holding a table document or a list of fields
        input: PathBuf,
    },
    /// Print a script with statement terminators added
    Normalize {
        /// Script file; reads stdin when omitted
        input: Option<PathBuf>,
    },
    /// Run a script against a row and print the outcome
    Run {
        /// Script file
        #[arg(long)]
        script: PathBuf,
        /// JSON file holding the row
        #[arg(long)]
        doc: PathBuf,
        /// Table slug used to name field variables
        #[arg(long, default_value = "")]
        table: String,
        /// Comma-separated field slugs
        #[arg(long, value_delimiter = ',')]
        fields: Vec<String>,
        /// Lifecycle moment exposed to the script
        #[arg(long, value_enum, default_value_t = Moment::BeforeSave)]
        moment: Moment,
        /// Acting user id
        #[arg(long)]
        user: Option<String>,
    },
    /// Clone a table out of a JSON fixture and print the copy
    Clone {
        /// JSON file with `tables` and `fields` lists
        #[arg(long)]
        fixture: PathBuf,
        /// Id of the table to clone
        #[arg(long)]
        table: String,
        /// Name of the copy
        #[arg(long)]
        name: String,
        /// Owner of the copy
        #[arg(long)]
        owner: String,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Moment {
    OnLoad,
    BeforeSave,
    AfterSave,
}

impl Moment {
    fn execution_moment(self) -> ExecutionMoment {
        match self {
            Moment::OnLoad => ExecutionMoment::OnLoad,
            Moment::BeforeSave => ExecutionMoment::BeforeSave,
            Moment::AfterSave => ExecutionMoment::AfterSave,
        }
    }

    fn user_action(self) -> UserAction {
        match self {
            Moment::OnLoad => UserAction::Load,
            Moment::BeforeSave | Moment::AfterSave => UserAction::Update,
        }
    }
}

/// Stores seeded before a clone.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Fixture {
    tables: Vec<Value>,
    fields: Vec<Field>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing();

    let config = load_config(args.config.as_deref(), args.timeout_ms)?;
    debug!("Loaded configuration: {:?}", config);

    match args.command {
        Command::Schema { input } => {
            let document = read_json(&input)?;
            let schema = schema_of(document)?;
            print_json(&schema.to_json())
        }
        Command::Normalize { input } => {
            let code = match input {
                Some(path) => read_text(&path)?,
                None => {
                    let mut code = String::new();
                    std::io::stdin()
                        .read_to_string(&mut code)
                        .context("Failed to read script from stdin")?;
                    code
                }
            };
            println!("{}", normalizer::normalize(&code));
            Ok(())
        }
        Command::Run {
            script,
            doc,
            table,
            fields,
            moment,
            user,
        } => {
            let code = read_text(&script)?;
            let doc: Row = serde_json::from_value(read_json(&doc)?)
                .context("Row document must be a JSON object")?;
            let engine = ScriptEngine::new(&config, Arc::new(TracingEmailSender));
            let context = ScriptContext {
                user_action: Some(moment.user_action()),
                execution_moment: Some(moment.execution_moment()),
                user_id: user,
                table_id: None,
            };

            let outcome = engine
                .run_table_script(&code, &doc, &table, &fields, context)
                .await;
            print_json(&serde_json::to_value(&outcome)?)?;
            if !outcome.success {
                bail!("Script failed");
            }
            Ok(())
        }
        Command::Clone {
            fixture,
            table,
            name,
            owner,
        } => {
            let fixture: Fixture = serde_json::from_value(read_json(&fixture)?)
                .context("Fixture must hold `tables` and `fields` lists")?;
            let store = seed_store(fixture).await?;
            let engine = CloneEngine::new(store.clone(), store);

            let cloned = engine
                .clone_table(&table, &name, &owner)
                .await
                .map_err(|e| anyhow::anyhow!("{} ({})", e, e.cause()))?;
            info!(
                "Cloned {} fields into '{}'",
                cloned.field_id_map.len(),
                cloned.table.slug
            );
            print_json(&serde_json::to_value(&cloned)?)
        }
    }
}

/// Logs go to stderr so command output stays machine readable.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_env("TABLEKIT_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// File values, then environment overrides, then flags.
fn load_config(path: Option<&Path>, timeout_ms: Option<u64>) -> Result<PlatformConfig> {
    let mut config = match path {
        Some(path) => PlatformConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => PlatformConfig::new(),
    };
    config
        .apply_env_overrides()
        .context("Invalid environment override")?;
    if let Some(timeout_ms) = timeout_ms {
        config.script.timeout_ms = timeout_ms;
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Schema of a table document or a bare field list. Trashed fields are left out.
fn schema_of(document: Value) -> Result<Schema> {
    let fields = match document {
        Value::Array(_) => document,
        Value::Object(mut table) => table
            .remove("fields")
            .context("Table document has no `fields` list")?,
        _ => bail!("Expected a table document or a list of fields"),
    };
    let fields: Vec<Field> = serde_json::from_value(fields).context("Invalid field list")?;
    let live: Vec<Field> = fields.into_iter().filter(|f| !f.trashed).collect();
    Ok(build_schema(&live))
}

async fn seed_store(fixture: Fixture) -> Result<Arc<MemoryStore>> {
    let store = Arc::new(MemoryStore::new());
    for field in fixture.fields {
        FieldStore::create(store.as_ref(), field)
            .await
            .context("Failed to seed field")?;
    }
    for document in fixture.tables {
        store
            .insert_table_document(document)
            .context("Failed to seed table")?;
    }
    Ok(store)
}

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn read_json(path: &Path) -> Result<Value> {
    let text = read_text(path)?;
    serde_json::from_str(&text).with_context(|| format!("Invalid JSON in {}", path.display()))
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
