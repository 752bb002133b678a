//! perm-check — declares the permission-check endpoint and runs one request
//! through it.
//!
//! The endpoint is resolved from an optional JSON config file overlaid with
//! the `--perm-check-*` options, declared into a root API set (plus any
//! `--subset` sets), and backed by a grant list. The reply status is printed
//! and decides the exit code.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use permcheck_core::{Data, ReplyStatus};
use permcheck_server::service::{
    declare, merge_documents, request_with_reply, ApiSet, EndpointConfig, ExtensionOptions, Grant,
    SpawnedOracle, StaticOracle,
};

#[derive(Debug, Parser)]
#[command(name = "perm-check", version, about = "Run one permission-check request")]
struct Cli {
    /// JSON configuration document.
    #[arg(long, env = "PERM_CHECK_CONFIG")]
    config: Option<PathBuf>,

    #[command(flatten)]
    extension: ExtensionOptions,

    /// API subset to create below the root set (repeatable).
    #[arg(long = "subset", value_name = "NAME")]
    subsets: Vec<String>,

    /// Granted combination, as client:user:session:permission (repeatable).
    #[arg(long = "grant", value_name = "GRANT")]
    grants: Vec<Grant>,

    /// API the request is addressed to. Defaults to the configured API.
    #[arg(long = "api", value_name = "NAME")]
    target_api: Option<String>,

    /// Verb of the request. Defaults to the configured verb.
    #[arg(long = "verb", value_name = "NAME")]
    request_verb: Option<String>,

    /// Send a single JSON document parameter instead of positional strings.
    #[arg(long, value_name = "DOC", conflicts_with = "params")]
    json: Option<String>,

    /// Positional string parameters: CLIENT USER SESSION PERMISSION.
    params: Vec<String>,

    /// Emit logs as JSON.
    #[arg(long)]
    log_json: bool,
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        let _ = builder.json().try_init();
    } else {
        let _ = builder.try_init();
    }
}

fn load_document(path: Option<&PathBuf>) -> anyhow::Result<Option<serde_json::Value>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let doc = serde_json::from_str(&text)
        .with_context(|| format!("parsing config {}", path.display()))?;
    Ok(Some(doc))
}

async fn run(cli: Cli) -> anyhow::Result<ReplyStatus> {
    let document = merge_documents(
        load_document(cli.config.as_ref())?,
        &cli.extension.to_document(),
    );
    let config = Arc::new(EndpointConfig::from_document(Some(&document)));

    let root = Arc::new(ApiSet::new("root"));
    for name in &cli.subsets {
        root.add_subset(Arc::new(ApiSet::new(name.clone())));
    }

    let oracle = SpawnedOracle::on_current_runtime(Arc::new(StaticOracle::new(cli.grants)))?;
    let registration = declare(&config, &root, Arc::new(oracle))?;
    if registration.is_none() {
        tracing::warn!("endpoint disabled, the request will not find it");
    }

    let params = match cli.json {
        Some(doc) => vec![Data::Json(doc)],
        None => cli.params.into_iter().map(Data::Stringz).collect(),
    };
    let api = cli.target_api.unwrap_or_else(|| config.api.clone());
    let verb = cli.request_verb.unwrap_or_else(|| config.verb.clone());

    let (req, reply) = request_with_reply(api, verb, params);
    root.call(&req);
    drop(req);

    reply.await.context("request dropped without a reply")
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let status = run(cli).await?;
    println!("{status}");
    Ok(if status.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
