//! Subcommand implementations.

pub mod browse;
pub mod get;
pub mod login;
mod logout;
mod refresh_token;
mod whoami;

use anyhow::Result;

use crate::cli::{Cli, Commands};
use crate::context::CliContext;

pub async fn handle(cli: Cli) -> Result<()> {
    let mut ctx = CliContext::new(&cli.global)?;

    let result = match cli.command {
        Commands::Login(args) => login::run(&ctx, args).await,
        Commands::Logout => logout::run(&ctx).await,
        Commands::Whoami => whoami::run(&ctx).await,
        Commands::RefreshToken => refresh_token::run(&ctx).await,
        Commands::Browse(args) => browse::run(&ctx, args).await,
        Commands::Get(args) => get::run(&ctx, args).await,
    };

    ctx.report_session_events();
    result
}
