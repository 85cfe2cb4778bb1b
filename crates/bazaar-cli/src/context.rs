//! Shared command context: credential store and API client.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use tokio::sync::broadcast::Receiver;
use tracing::debug;

use bazaar_core::ApiOrigin;
use bazaar_file::FileCredentialStore;
use bazaar_http::{ApiClient, ClientConfig, SessionEvent};

use crate::cli::GlobalArgs;
use crate::output;

const STORE_FILE: &str = "credentials.json";

/// Everything a command needs to talk to the API.
pub struct CliContext {
    pub client: ApiClient,
    pub store: Arc<FileCredentialStore>,
    events: Receiver<SessionEvent>,
}

impl CliContext {
    pub fn new(global: &GlobalArgs) -> Result<Self> {
        let origin = global
            .origin
            .as_deref()
            .context("No API origin. Pass --origin or set BAZAAR_API_ORIGIN.")?;
        let origin = ApiOrigin::new(origin).context("Invalid API origin")?;

        let path = match &global.store {
            Some(path) => path.clone(),
            None => default_store_path()?,
        };
        debug!(path = %path.display(), "Using credential store");
        let store = Arc::new(FileCredentialStore::new(path));

        let config = ClientConfig::new(origin)
            .with_timeout(Duration::from_secs(global.timeout_secs))
            .with_user_agent(format!("bazaar-cli/{}", env!("BAZAAR_VERSION")));
        let client = ApiClient::new(config, store.clone()).context("Failed to build HTTP client")?;
        let events = client.session_events();

        Ok(Self {
            client,
            store,
            events,
        })
    }

    /// Report session changes that happened while the command ran.
    pub fn report_session_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            match event {
                SessionEvent::Refreshed => debug!("Credentials were refreshed"),
                SessionEvent::Terminated { reason } => {
                    output::error(&format!("Session terminated: {}", reason));
                }
                other => debug!(event = ?other, "Session event"),
            }
        }
    }
}

/// Default credential file under the platform data directory.
fn default_store_path() -> Result<PathBuf> {
    let dirs =
        ProjectDirs::from("", "", "bazaar").context("Could not determine data directory")?;

    let data_dir = dirs.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data directory")?;

    Ok(data_dir.join(STORE_FILE))
}
