use std::io;

use signalfeed_core::SignalFeed;
use tracing::{info, warn};

use crate::cli::WatchArgs;
use crate::error::CliError;
use crate::output::NdjsonWriter;

use super::{build_filter, call_views, Context};

/// Prints one line per snapshot until `--updates` is reached, the store
/// closes the channel, or the process is interrupted. A channel failure
/// prints an empty list before the error is returned.
pub async fn run(args: &WatchArgs, context: &Context) -> Result<(), CliError> {
    let filter = build_filter(&args.filter)?;
    let feed = SignalFeed::new(context.store.clone());
    let mut subscription = feed.watch(filter).await?;
    let mut writer = NdjsonWriter::new(io::stdout().lock());

    while args.updates.is_none_or(|limit| writer.written() < limit) {
        let next = tokio::select! {
            next = subscription.next() => next,
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
        };

        match next {
            Some(Ok(calls)) => writer.write_line(&call_views(&calls, &context.roster))?,
            Some(Err(error)) => {
                warn!(%error, "watch ended by store error");
                writer.write_line(&Vec::<()>::new())?;
                return Err(error.into());
            }
            None => break,
        }
    }

    subscription.cancel();
    Ok(())
}
