use tracing::info;

use super::Context;
use crate::GlobalOpts;

pub fn list(opts: &GlobalOpts) -> anyhow::Result<()> {
    let ctx = Context::load(opts)?;
    let store = ctx.open_store()?;
    let namespace = ctx.selector.namespace();
    let claims = store.list_claims(&namespace)?;

    for claim in &claims {
        println!("{}\t{}\t{}", claim.key, claim.holder, claim.acquired_at);
    }
    info!(%namespace, count = claims.len(), "claims listed");
    Ok(())
}

pub fn reset(opts: &GlobalOpts) -> anyhow::Result<()> {
    let ctx = Context::load(opts)?;
    let store = ctx.open_store()?;
    let namespace = ctx.selector.namespace();
    let released = store.reset_namespace(&namespace)?;

    println!("✓ Released {released} claim(s) in {namespace}");
    Ok(())
}
