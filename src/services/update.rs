//! Online version check.
//!
//! The check is optional and never fatal: a disabled check yields a notice
//! and a network failure yields the "unable to check" text from the Main
//! store. Everything it needs from the stores is captured up front in an
//! [`UpdateRequest`], so the check can run on its own task while the
//! diagnostic pipeline proceeds.

use super::DiagnosticError;
use crate::config::ConfigStore;
use crate::models::{DiagnosticMessage, YamlStore};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Latest release endpoint of the CLASSIC repository
pub const RELEASES_URL: &str = "https://api.github.com/repos/evildarkarchon/CLASSIC-Fallout4/releases/latest";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Source of the newest published version name
#[async_trait]
pub trait VersionSource: Send + Sync {
    async fn latest_version(&self) -> Result<String, DiagnosticError>;
}

/// GitHub releases API client.
pub struct GitHubReleases {
    client: Client,
    url: String,
}

#[derive(Debug, Deserialize)]
struct ReleaseResponse {
    name: Option<String>,
    tag_name: Option<String>,
}

impl GitHubReleases {
    pub fn new() -> Result<Self, DiagnosticError> {
        Self::with_url(RELEASES_URL)
    }

    pub fn with_url(url: impl Into<String>) -> Result<Self, DiagnosticError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("CLASSIC/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DiagnosticError::NetworkFailure(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl VersionSource for GitHubReleases {
    async fn latest_version(&self) -> Result<String, DiagnosticError> {
        let network = |e: reqwest::Error| DiagnosticError::NetworkFailure(e.to_string());

        let resp = self
            .client
            .get(&self.url)
            .header("Accept", "application/vnd.github+json")
            .send()
            .await
            .map_err(network)?
            .error_for_status()
            .map_err(network)?;
        let body = resp.text().await.map_err(network)?;

        let release: ReleaseResponse = serde_json::from_str(&body)
            .map_err(|e| DiagnosticError::NetworkFailure(format!("unexpected release payload: {}", e)))?;
        release
            .name
            .or(release.tag_name)
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| DiagnosticError::NetworkFailure("release has no name".to_string()))
    }
}

/// Store values the update check needs, captured before it is spawned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRequest {
    pub enabled: bool,
    pub local_version: Option<String>,
    pub outdated_text: String,
    pub unavailable_text: String,
}

impl UpdateRequest {
    /// Read the `Update Check` setting and the version texts for `game`.
    pub fn from_store(store: &ConfigStore, game: &str) -> Self {
        let text = |key: String, fallback: &str| {
            store
                .get::<String>(YamlStore::Main, &key)
                .filter(|text| !text.trim().is_empty())
                .unwrap_or_else(|| fallback.to_string())
        };
        Self {
            enabled: store.setting::<bool>("Update Check").unwrap_or(true),
            local_version: store.get::<String>(YamlStore::Main, "CLASSIC_Info.version"),
            outdated_text: text(
                format!("CLASSIC_Interface.update_warning_{}", game),
                "❌ WARNING : A new version of CLASSIC is available! Download it from the CLASSIC Nexus page.",
            ),
            unavailable_text: text(
                format!("CLASSIC_Interface.update_unable_{}", game),
                "❌ WARNING : CLASSIC was unable to check for updates. Check your internet connection.",
            ),
        }
    }

    /// Compare the local version against `source`.
    pub async fn run(self, source: &dyn VersionSource) -> Vec<DiagnosticMessage> {
        if !self.enabled {
            return vec![DiagnosticMessage::info(
                "❌ NOTICE: UPDATE CHECK IS DISABLED IN CLASSIC Settings.yaml",
            )];
        }

        tracing::info!("Checking for new CLASSIC versions");
        let latest = match source.latest_version().await {
            Ok(latest) => latest,
            Err(e) => {
                tracing::warn!("Update check failed: {}", e);
                return vec![DiagnosticMessage::from_text(self.unavailable_text)];
            }
        };

        let local = self.local_version.unwrap_or_default();
        tracing::info!("Local version: {} | Newest version: {}", local, latest);
        if latest.trim() == local.trim() {
            vec![DiagnosticMessage::success("You have the latest version of CLASSIC!")]
        } else {
            vec![
                DiagnosticMessage::info(format!(
                    "Your CLASSIC Version: {}\nNewest CLASSIC Version: {}",
                    local, latest
                )),
                DiagnosticMessage::from_text(self.outdated_text),
            ]
        }
    }
}
