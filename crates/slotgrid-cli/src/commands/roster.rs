use anyhow::Context as _;
use tracing::info;

use super::Context;
use crate::GlobalOpts;

pub fn put(opts: &GlobalOpts, name: &str) -> anyhow::Result<()> {
    let ctx = Context::load(opts)?;
    let path = opts
        .roster
        .as_deref()
        .context("put-roster needs a roster file; pass --roster")?;
    let roster = slotgrid_core::load_roster(path)?;
    let store = ctx.open_store()?;
    store.put_roster(name, &roster)?;

    info!(%name, entries = roster.len(), total_weight = roster.total_weight(), "roster stored");
    println!("✓ Stored roster {name} ({} entries)", roster.len());
    Ok(())
}
