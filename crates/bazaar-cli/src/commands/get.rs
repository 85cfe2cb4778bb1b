//! Raw GET command implementation.

use anyhow::{Context, Result};
use clap::Args;

use bazaar_http::ApiRequest;

use crate::context::CliContext;
use crate::output;

#[derive(Args, Debug)]
pub struct GetArgs {
    /// Path relative to the API origin (a duplicated /api prefix is tolerated)
    pub path: String,

    /// Query parameters as key=value
    #[arg(long = "query", short = 'q', value_parser = parse_key_value)]
    pub query: Vec<(String, String)>,

    /// Send without credentials
    #[arg(long)]
    pub no_auth: bool,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", s))?;
    Ok((key.to_string(), value.to_string()))
}

pub async fn run(ctx: &CliContext, args: GetArgs) -> Result<()> {
    let mut request = ApiRequest::get(&args.path);
    for (key, value) in args.query {
        request = request.query_param(key, value);
    }
    if args.no_auth {
        request = request.without_auth();
    }

    let body: serde_json::Value = ctx
        .client
        .request_json(request)
        .await
        .with_context(|| format!("GET {} failed", args.path))?;

    if args.pretty {
        output::json_pretty(&body)
    } else {
        output::json_line(&body)
    }
}
