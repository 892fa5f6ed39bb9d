use std::sync::Arc;

use slotgrid_lock::LockStore;
use slotgrid_metrics::{MetricsCollector, SelectionObserver};
use slotgrid_selector::{SelectError, Selection};
use tracing::{info, warn};

use super::Context;
use crate::GlobalOpts;

/// Claim a role. A lock store that cannot be opened or fails mid-pass
/// degrades to a weighted random role; configuration errors do not.
pub fn select(opts: &GlobalOpts, format: &str) -> anyhow::Result<()> {
    let ctx = Context::load(opts)?;
    let metrics = ctx.collector();
    let result = claim(&ctx, &metrics);
    if let Ok(selection) = &result {
        info!(role = %selection.identifier(), outcome = ?selection.outcome, "role selected");
    }
    metrics.flush();
    print(&result?, format)
}

/// Pick a weighted random role with no lock traffic.
pub fn random(opts: &GlobalOpts, format: &str) -> anyhow::Result<()> {
    let ctx = Context::load(opts)?;
    let metrics = ctx.collector();
    let result = ctx
        .roster(None)
        .inspect_err(|_| metrics.role_error())
        .and_then(|roster| {
            let mut selector = ctx
                .selector(roster, None::<LockStore>)
                .with_observer(metrics.clone());
            Ok(selector.select_random()?)
        });
    metrics.flush();
    print(&result?, format)
}

fn claim(ctx: &Context, metrics: &Arc<MetricsCollector>) -> anyhow::Result<Selection> {
    let store = match ctx.open_store() {
        Ok(store) => Some(store),
        Err(e) => {
            warn!(error = %format!("{e:#}"), "lock store unavailable");
            None
        }
    };
    let roster = ctx.roster(store.as_ref()).inspect_err(|_| metrics.role_error())?;

    let mut selector = ctx.selector(roster, store).with_observer(metrics.clone());
    match selector.select() {
        Ok(selection) => Ok(selection),
        Err(e @ SelectError::LockBackend { .. }) => {
            warn!(error = %e, "error selecting an entry, selecting random entry");
            Ok(selector.select_random()?)
        }
        Err(e) => Err(e.into()),
    }
}

fn print(selection: &Selection, format: &str) -> anyhow::Result<()> {
    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(selection)?);
        }
        _ => match &selection.entry.definition {
            Some(serde_json::Value::String(s)) => println!("{s}"),
            Some(definition) => println!("{definition}"),
            None => println!("{}", selection.identifier()),
        },
    }
    Ok(())
}
