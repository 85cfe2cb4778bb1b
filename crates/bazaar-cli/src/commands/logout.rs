//! Logout command implementation.

use anyhow::{Context, Result};

use crate::context::CliContext;
use crate::output;

pub async fn run(ctx: &CliContext) -> Result<()> {
    if !ctx.client.is_logged_in() {
        output::success("Already logged out");
        return Ok(());
    }

    ctx.client.logout().await.context("Failed to logout")?;
    output::success("Logged out");
    Ok(())
}
