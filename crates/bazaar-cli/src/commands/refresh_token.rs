//! Refresh token command implementation.

use anyhow::{Context, Result, bail};

use crate::context::CliContext;
use crate::output;

pub async fn run(ctx: &CliContext) -> Result<()> {
    if !ctx.client.is_logged_in() {
        bail!("Not logged in. Run 'bazaar login' first.");
    }

    output::progress("Refreshing session...");

    ctx.client
        .refresh_now()
        .await
        .context("Failed to refresh session")?;

    output::success("Session refreshed successfully");
    Ok(())
}
