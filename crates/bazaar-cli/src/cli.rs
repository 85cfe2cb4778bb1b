//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::commands::{browse, get, login};

/// Command-line client for the bazaar storefront API.
#[derive(Parser, Debug)]
#[command(name = "bazaar")]
#[command(author, version = env!("BAZAAR_VERSION"), about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// API origin, including any path prefix (e.g. https://shop.example.com/api)
    #[arg(long, env = "BAZAAR_API_ORIGIN", global = true)]
    pub origin: Option<String>,

    /// Credential file (defaults to the platform data directory)
    #[arg(long, env = "BAZAAR_STORE", global = true)]
    pub store: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 30, global = true)]
    pub timeout_secs: u64,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in and store the issued credentials
    Login(login::LoginArgs),

    /// Revoke and forget the stored credentials
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Exchange the refresh token for a new credential pair
    RefreshToken,

    /// Browse a paginated list
    Browse(browse::BrowseArgs),

    /// Send a GET request through the authenticated client
    Get(get::GetArgs),
}
