mod register;
mod signals;
mod traders;
mod watch;

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use signalfeed_core::{
    Call, CallFilter, CallStatus, FeedConfig, Network, Strategy, TraderRoster, ValidationError,
};
use signalfeed_store::{DocumentStore, MemoryStore};
use tracing::info;

use crate::cli::{Cli, Command, FilterArgs};
use crate::error::CliError;

/// Shared collaborators for one command invocation.
pub struct Context {
    pub store: Arc<dyn DocumentStore>,
    pub roster: TraderRoster,
    pub pretty: bool,
}

impl Context {
    pub fn build(cli: &Cli, config: &FeedConfig) -> Result<Self, CliError> {
        let store = match &cli.store_file {
            Some(path) => load_store_file(path)?,
            None => config.build_store(),
        };

        Ok(Self {
            store,
            roster: config.load_roster()?,
            pretty: cli.pretty,
        })
    }
}

pub async fn run(cli: &Cli, config: &FeedConfig) -> Result<(), CliError> {
    let context = Context::build(cli, config)?;

    match &cli.command {
        Command::Signals(args) => signals::run(args, &context).await,
        Command::Watch(args) => watch::run(args, &context).await,
        Command::Register(args) => register::run(args, &context).await,
        Command::Traders => traders::run(&context),
    }
}

/// Call as printed by the CLI, with the trader's display name resolved.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallView<'a> {
    #[serde(flatten)]
    pub call: &'a Call,
    pub trader_name: &'a str,
}

pub fn call_views<'a>(calls: &'a [Call], roster: &'a TraderRoster) -> Vec<CallView<'a>> {
    calls
        .iter()
        .map(|call| CallView {
            call,
            trader_name: roster.display_name(&call.trader_id),
        })
        .collect()
}

pub fn build_filter(args: &FilterArgs) -> Result<CallFilter, ValidationError> {
    let mut filter = CallFilter::new();
    if let Some(trader) = args.trader.as_deref().map(str::trim) {
        if trader.is_empty() {
            return Err(ValidationError::EmptyTraderId);
        }
        filter = filter.trader(trader);
    }
    if let Some(network) = &args.network {
        filter = filter.network(network.parse::<Network>()?);
    }
    if let Some(strategy) = &args.strategy {
        filter = filter.strategy(strategy.parse::<Strategy>()?);
    }
    if let Some(status) = &args.status {
        filter = filter.status(status.parse::<CallStatus>()?);
    }
    if args.active_only {
        filter = filter.active_only();
    }
    Ok(filter)
}

/// Reads `{"<collection>": [documents...]}` into a fresh memory store.
fn load_store_file(path: &Path) -> Result<Arc<dyn DocumentStore>, CliError> {
    let payload = std::fs::read_to_string(path)?;
    let collections: serde_json::Map<String, Value> = serde_json::from_str(&payload)?;

    let store = MemoryStore::new();
    for (collection, documents) in &collections {
        if !documents.is_array() {
            return Err(CliError::StoreFile(format!(
                "collection '{collection}' must be an array of documents"
            )));
        }
        let seeded = store.seed_json(collection, &documents.to_string())?;
        info!(%collection, documents = seeded, "seeded memory store");
    }

    Ok(Arc::new(store))
}
