//! Whoami command implementation.

use anyhow::{Context, Result, bail};

use crate::context::CliContext;
use crate::output;

pub async fn run(ctx: &CliContext) -> Result<()> {
    if !ctx.client.is_logged_in() {
        bail!("Not logged in. Run 'bazaar login' first.");
    }

    let profile = ctx
        .client
        .me()
        .await
        .context("Failed to fetch profile")?;

    if let Some(saved_at) = ctx.store.saved_at() {
        output::field("Saved", saved_at.to_rfc3339());
    }
    output::json_pretty(&profile)
}
