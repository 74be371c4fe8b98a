//! `sharedesk` CLI: offline schema tools and a client for the sharedesk server.
//!
//! The schema commands (`validate`, `example`, `blank`, `extract`, `encode`,
//! `build`) run locally against a collection schema file. Everything else
//! talks to a running server over its REST API.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::fs;
use std::io::Read as _;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde_json::{Value, json};

use sharedesk_core::{CollectionSchema, FieldDefinition, build_collection_schema};
use sharedesk_store::{NetworkConfig, NetworkPreset};

// ── ANSI color helpers ───────────────────────────────────────────────

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const CYAN: &str = "\x1b[36m";
const WHITE: &str = "\x1b[37m";

/// Header carrying the per-request network configuration.
const NETWORK_HEADER: &str = "x-nillion-config";

// ── CLI structure ────────────────────────────────────────────────────

/// Sharedesk: manage secret-sharing collections and records.
#[derive(Parser)]
#[command(
    name = "sharedesk",
    version,
    about = "Sharedesk CLI: collection schema tools and record management",
    long_about = None,
    after_help = format!(
        "{DIM}Environment variables:{RESET}\n  \
         SHAREDESK_ADDR      Server address (default: http://127.0.0.1:3000)\n  \
         SHAREDESK_NETWORK   Network preset: testnet or mainnet\n  \
         SHAREDESK_API_KEY   Builder API key sent with remote commands\n\n\
         {DIM}Examples:{RESET}\n  \
         sharedesk validate schema.json\n  \
         sharedesk example schema.json\n  \
         sharedesk encode schema.json record.json\n  \
         sharedesk records list 3f2a... --filter '{{\"name\":\"Ada\"}}'"
    ),
)]
struct Cli {
    /// Sharedesk server address.
    #[arg(long, env = "SHAREDESK_ADDR", default_value = "http://127.0.0.1:3000")]
    addr: String,

    /// Network preset used with `--api-key`.
    #[arg(long, env = "SHAREDESK_NETWORK", default_value = "testnet")]
    network: String,

    /// Builder API key. When set, remote commands send an explicit network
    /// configuration instead of relying on the server default.
    #[arg(long, env = "SHAREDESK_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a collection schema document and list its fields.
    Validate {
        /// Path to the schema JSON file.
        schema: String,
    },
    /// Print a sample record for a collection schema.
    Example {
        /// Path to the schema JSON file.
        schema: String,
    },
    /// Print a blank form value for a collection schema.
    Blank {
        /// Path to the schema JSON file.
        schema: String,
    },
    /// Convert stored records into their editable plain form.
    Extract {
        /// Path to the schema JSON file.
        schema: String,
        /// Record JSON file (a record or an array of records). Reads stdin when omitted or `-`.
        records: Option<String>,
    },
    /// Convert plain records into their storage encoding.
    Encode {
        /// Path to the schema JSON file.
        schema: String,
        /// Record JSON file (a record or an array of records). Reads stdin when omitted or `-`.
        records: Option<String>,
    },
    /// Build a collection schema from a JSON array of field definitions.
    Build {
        /// Path to the field definitions file. Reads stdin when omitted or `-`.
        fields: Option<String>,
    },
    /// Show server health.
    Status,
    /// Register the builder on the selected network.
    Setup,
    /// Collection operations.
    Collections {
        #[command(subcommand)]
        action: CollectionCommands,
    },
    /// Record operations.
    Records {
        #[command(subcommand)]
        action: RecordCommands,
    },
}

#[derive(Subcommand)]
enum CollectionCommands {
    /// List collections.
    List,
    /// Create a collection from a schema file.
    Create {
        /// Collection name.
        name: String,
        /// Path to the schema JSON file.
        #[arg(long)]
        schema: String,
        /// Collection type.
        #[arg(long = "type", default_value = "standard", value_parser = ["standard", "owned"])]
        collection_type: String,
        /// Optional description.
        #[arg(long)]
        description: Option<String>,
    },
    /// Show a collection's metadata and schema.
    Show {
        /// Collection id.
        id: String,
    },
    /// Delete a collection.
    Delete {
        /// Collection id.
        id: String,
    },
}

#[derive(Subcommand)]
enum RecordCommands {
    /// List records in a collection.
    List {
        /// Collection id.
        collection: String,
        /// JSON filter object.
        #[arg(long)]
        filter: Option<String>,
        /// Maximum number of records.
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Add records from a JSON file (a record or an array of records).
    Add {
        /// Collection id.
        collection: String,
        /// Record JSON file. Reads stdin when omitted or `-`.
        records: Option<String>,
    },
    /// Update records matching a filter.
    Update {
        /// Collection id.
        collection: String,
        /// JSON filter object.
        #[arg(long)]
        filter: String,
        /// JSON update object (plain fields or `{"$set": {...}}`).
        #[arg(long)]
        update: String,
    },
    /// Delete records matching a filter.
    Delete {
        /// Collection id.
        collection: String,
        /// JSON filter object.
        #[arg(long)]
        filter: String,
    },
}

// ── Pretty output helpers ────────────────────────────────────────────

fn header(title: &str) {
    println!("{BOLD}{CYAN}{title}{RESET}");
    println!("{DIM}─────────────────────────────────────────{RESET}");
}

fn kv_line(key: &str, value: &str) {
    println!("  {DIM}{key:<20}{RESET} {WHITE}{value}{RESET}");
}

fn success(msg: &str) {
    println!("{GREEN}{BOLD}✓{RESET} {msg}");
}

fn print_json(value: &Value) {
    if value.is_null() {
        return;
    }
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("failed to format JSON: {e}"),
    }
}

fn print_collection_list(resp: &Value) {
    let collections = resp["collections"].as_array().map(Vec::as_slice).unwrap_or_default();
    header("Collections");
    if collections.is_empty() {
        println!("  {DIM}(none){RESET}");
        return;
    }
    for entry in collections {
        let id = entry["_id"].as_str().unwrap_or("?");
        let name = entry["name"].as_str().unwrap_or("");
        let kind = entry["type"].as_str().unwrap_or("");
        kv_line(id, &format!("{name} ({kind})"));
    }
}

// ── Input helpers ────────────────────────────────────────────────────

/// Read a file, or stdin when `path` is `None` or `-`.
fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        None | Some("-") => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("failed to read stdin")?;
            Ok(text)
        }
        Some(path) => fs::read_to_string(path).with_context(|| format!("failed to read {path}")),
    }
}

fn read_json(path: Option<&str>) -> Result<Value> {
    let text = read_input(path)?;
    serde_json::from_str(&text).with_context(|| format!("invalid JSON in {}", path.unwrap_or("stdin")))
}

fn load_schema(path: &str) -> Result<CollectionSchema> {
    let text = fs::read_to_string(path).with_context(|| format!("failed to read {path}"))?;
    text.parse::<CollectionSchema>()
        .with_context(|| format!("invalid collection schema in {path}"))
}

fn parse_json_arg(name: &str, raw: &str) -> Result<Value> {
    let value: Value = serde_json::from_str(raw).with_context(|| format!("--{name} is not valid JSON"))?;
    if !value.is_object() {
        bail!("--{name} must be a JSON object");
    }
    Ok(value)
}

/// Apply `f` to a single record or to each element of an array.
fn map_records(input: &Value, f: impl Fn(&Value) -> Value) -> Value {
    match input {
        Value::Array(items) => Value::Array(items.iter().map(&f).collect()),
        other => f(other),
    }
}

// ── HTTP client ──────────────────────────────────────────────────────

struct Client {
    http: reqwest::Client,
    addr: String,
    network: Option<NetworkConfig>,
}

impl Client {
    fn new(addr: &str, network: Option<NetworkConfig>) -> Self {
        Self {
            http: reqwest::Client::new(),
            addr: addr.trim_end_matches('/').to_owned(),
            network,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.addr)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> Result<reqwest::RequestBuilder> {
        let builder = self.http.request(method, self.url(path));
        match &self.network {
            Some(network) => {
                let header = serde_json::to_string(network).context("failed to encode network configuration")?;
                Ok(builder.header(NETWORK_HEADER, header))
            }
            None => Ok(builder),
        }
    }

    async fn send(builder: reqwest::RequestBuilder) -> Result<Value> {
        let resp = builder.send().await.context("request failed")?;
        handle_response(resp).await
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        Self::send(self.request(reqwest::Method::GET, path)?.query(query)).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        Self::send(self.request(reqwest::Method::POST, path)?.json(body)).await
    }

    async fn put(&self, path: &str, body: &Value) -> Result<Value> {
        Self::send(self.request(reqwest::Method::PUT, path)?.json(body)).await
    }

    async fn delete(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        Self::send(self.request(reqwest::Method::DELETE, path)?.query(query)).await
    }
}

async fn handle_response(resp: reqwest::Response) -> Result<Value> {
    let status = resp.status();
    let body = resp.text().await.context("failed to read response body")?;
    if !status.is_success() {
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| v["message"].as_str().map(str::to_owned))
            .unwrap_or(body);
        bail!("server returned {status}: {message}");
    }
    if body.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&body).context("failed to parse response JSON")
}

// ── Command dispatch ─────────────────────────────────────────────────

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!();
            eprintln!("  {RED}{BOLD}✗ Error:{RESET} {e:#}");
            eprintln!();
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Validate { schema } => cmd_validate(&schema),
        Commands::Example { schema } => {
            print_json(&load_schema(&schema)?.example_record());
            Ok(())
        }
        Commands::Blank { schema } => {
            print_json(&load_schema(&schema)?.blank_record());
            Ok(())
        }
        Commands::Extract { schema, records } => {
            let schema = load_schema(&schema)?;
            let input = read_json(records.as_deref())?;
            print_json(&map_records(&input, |r| schema.extract_record(r)));
            Ok(())
        }
        Commands::Encode { schema, records } => {
            let schema = load_schema(&schema)?;
            let input = read_json(records.as_deref())?;
            print_json(&map_records(&input, |r| schema.encode_record(r)));
            Ok(())
        }
        Commands::Build { fields } => cmd_build(fields.as_deref()),
        remote => {
            let network = match cli.api_key {
                Some(key) => {
                    let Some(preset) = NetworkPreset::parse(&cli.network) else {
                        bail!("unknown network '{}': expected testnet or mainnet", cli.network);
                    };
                    Some(NetworkConfig::preset(preset, key))
                }
                None => None,
            };
            let client = Client::new(&cli.addr, network);
            run_remote(&client, remote).await
        }
    }
}

async fn run_remote(client: &Client, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Status => cmd_status(client).await,
        Commands::Setup => cmd_setup(client).await,
        Commands::Collections { action } => cmd_collections(client, action).await,
        Commands::Records { action } => cmd_records(client, action).await,
        Commands::Validate { .. }
        | Commands::Example { .. }
        | Commands::Blank { .. }
        | Commands::Extract { .. }
        | Commands::Encode { .. }
        | Commands::Build { .. } => bail!("not a remote command"),
    }
}

// ── Schema commands ──────────────────────────────────────────────────

fn cmd_validate(path: &str) -> Result<()> {
    let schema = load_schema(path)?;
    success(&format!("{path} is a valid collection schema"));
    for (name, node) in schema.fields() {
        let required = if schema.record().required.iter().any(|r| r == name) {
            "required"
        } else {
            "optional"
        };
        kv_line(name, &format!("{} ({required})", node.type_name()));
    }
    Ok(())
}

fn cmd_build(path: Option<&str>) -> Result<()> {
    let input = read_json(path)?;
    let fields: Vec<FieldDefinition> =
        serde_json::from_value(input).context("field definitions must be a JSON array of fields")?;
    let schema = build_collection_schema(&fields).context("failed to build schema")?;
    print_json(&schema.to_value());
    Ok(())
}

// ── Remote commands ──────────────────────────────────────────────────

async fn cmd_status(client: &Client) -> Result<()> {
    let resp = client.get("/health", &[]).await?;
    header("Sharedesk server");
    kv_line("Address", &client.addr);
    kv_line("Status", resp["status"].as_str().unwrap_or("unknown"));
    kv_line("Version", resp["version"].as_str().unwrap_or("unknown"));
    Ok(())
}

async fn cmd_setup(client: &Client) -> Result<()> {
    let resp = client.post("/api/setup", &json!({})).await?;
    success(resp["message"].as_str().unwrap_or("Builder setup complete"));
    print_json(&resp["profile"]);
    Ok(())
}

async fn cmd_collections(client: &Client, action: CollectionCommands) -> Result<()> {
    match action {
        CollectionCommands::List => {
            let resp = client.get("/api/collections", &[]).await?;
            print_collection_list(&resp);
        }
        CollectionCommands::Create {
            name,
            schema,
            collection_type,
            description,
        } => {
            let document = read_json(Some(&schema))?;
            let mut body = json!({"name": name, "type": collection_type, "schema": document});
            if let Some(description) = description {
                body["description"] = Value::from(description);
            }
            let resp = client.post("/api/collections", &body).await?;
            success(&format!(
                "Created collection {}",
                resp["collection"]["_id"].as_str().unwrap_or("?")
            ));
        }
        CollectionCommands::Show { id } => {
            let resp = client.get(&format!("/api/collections/{id}"), &[]).await?;
            print_json(&resp);
        }
        CollectionCommands::Delete { id } => {
            let resp = client.delete(&format!("/api/collections/{id}"), &[]).await?;
            success(resp["message"].as_str().unwrap_or("Collection deleted"));
        }
    }
    Ok(())
}

async fn cmd_records(client: &Client, action: RecordCommands) -> Result<()> {
    match action {
        RecordCommands::List {
            collection,
            filter,
            limit,
        } => {
            let mut query = Vec::new();
            if let Some(filter) = filter {
                parse_json_arg("filter", &filter)?;
                query.push(("filter", filter));
            }
            if let Some(limit) = limit {
                query.push(("limit", limit.to_string()));
            }
            let resp = client.get(&format!("/api/data/{collection}"), &query).await?;
            print_json(&resp["data"]);
        }
        RecordCommands::Add { collection, records } => {
            let data = read_json(records.as_deref())?;
            let resp = client
                .post(&format!("/api/data/{collection}"), &json!({"data": data}))
                .await?;
            success(resp["message"].as_str().unwrap_or("Records added"));
            print_json(&resp["data"]);
        }
        RecordCommands::Update {
            collection,
            filter,
            update,
        } => {
            let body = json!({
                "filter": parse_json_arg("filter", &filter)?,
                "update": parse_json_arg("update", &update)?,
            });
            let resp = client.put(&format!("/api/data/{collection}"), &body).await?;
            success(resp["message"].as_str().unwrap_or("Data updated"));
        }
        RecordCommands::Delete { collection, filter } => {
            parse_json_arg("filter", &filter)?;
            let resp = client
                .delete(&format!("/api/data/{collection}"), &[("filter", filter)])
                .await?;
            success(resp["message"].as_str().unwrap_or("Data deleted"));
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn map_records_handles_single_and_array() {
        let upper = |v: &Value| Value::from(v.as_str().unwrap().to_uppercase());
        assert_eq!(map_records(&json!("a"), upper), json!("A"));
        assert_eq!(map_records(&json!(["a", "b"]), upper), json!(["A", "B"]));
    }

    #[test]
    fn json_args_must_be_objects() {
        assert!(parse_json_arg("filter", r#"{"name":"Ada"}"#).is_ok());
        assert!(parse_json_arg("filter", "[1]").is_err());
        assert!(parse_json_arg("filter", "{").is_err());
    }

    #[test]
    fn client_trims_trailing_slash() {
        let client = Client::new("http://localhost:3000/", None);
        assert_eq!(client.url("/health"), "http://localhost:3000/health");
    }
}
