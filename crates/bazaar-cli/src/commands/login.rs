//! Login command implementation.

use anyhow::{Context, Result};
use clap::Args;

use bazaar_core::Credentials;

use crate::context::CliContext;
use crate::output;

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Account email address
    #[arg(long)]
    pub email: String,

    /// Account password
    #[arg(long, env = "BAZAAR_PASSWORD", hide_env_values = true)]
    pub password: String,
}

pub async fn run(ctx: &CliContext, args: LoginArgs) -> Result<()> {
    output::progress("Logging in...");

    ctx.client
        .login(Credentials::new(&args.email, &args.password))
        .await
        .context("Failed to login")?;

    output::success("Logged in successfully");
    output::field("Email", &args.email);
    output::field("Store", ctx.store.path().display());

    Ok(())
}
