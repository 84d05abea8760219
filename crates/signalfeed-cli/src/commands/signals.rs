use signalfeed_core::SignalFeed;
use tracing::debug;

use crate::cli::FilterArgs;
use crate::error::CliError;
use crate::output;

use super::{build_filter, call_views, Context};

pub async fn run(args: &FilterArgs, context: &Context) -> Result<(), CliError> {
    let filter = build_filter(args)?;
    let feed = SignalFeed::new(context.store.clone());

    let calls = feed.fetch_signals(&filter).await?;
    debug!(count = calls.len(), "signals command complete");

    output::render(&call_views(&calls, &context.roster), context.pretty)
}
