//! Client for the remote metadata store (HPC Data Management Environment).

use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Result, SheetlintError};

use super::Attribute;

/// Environment variable pointing at the DME utilities checkout.
pub const UTILS_ENV: &str = "HPC_DM_UTILS";

static BEARER_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"Bearer\s+([^"'\s]+)"#).unwrap());

/// Read access to collection attributes.
pub trait RemoteStore {
    /// Self-metadata attributes of a collection, in store order.
    fn fetch_attributes(&self, collection_path: &str) -> Result<Vec<Attribute>>;
}

/// Blocking HTTP client for the DME REST API.
pub struct DmeClient {
    client: Client,
    url: String,
    token: String,
}

impl DmeClient {
    /// Create a client for a server URL and bearer token.
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| SheetlintError::Remote(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    /// Create from the `HPC_DM_UTILS` environment.
    pub fn from_env() -> Result<Self> {
        let dir = env::var(UTILS_ENV).map_err(|_| {
            SheetlintError::Config(format!("{} environment variable not set", UTILS_ENV))
        })?;
        Self::from_utils_dir(dir)
    }

    /// Read the server URL from `hpcdme.properties` and the token from
    /// `tokens/curl-conf` inside a DME utilities directory.
    pub fn from_utils_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();

        let properties_path = dir.join("hpcdme.properties");
        let properties = read_text(&properties_path)?;
        let url = server_url(&properties).ok_or_else(|| {
            SheetlintError::Config(format!(
                "no hpc.server.url entry in '{}'",
                properties_path.display()
            ))
        })?;

        let token_path = dir.join("tokens").join("curl-conf");
        let curl_conf = read_text(&token_path).map_err(|_| {
            SheetlintError::Config(format!(
                "token file '{}' not found; run dm_generate_token first",
                token_path.display()
            ))
        })?;
        let token = bearer_token(&curl_conf).ok_or_else(|| {
            SheetlintError::Config(format!("no bearer token in '{}'", token_path.display()))
        })?;

        Self::new(url, token)
    }

    /// Server URL in use.
    pub fn url(&self) -> &str {
        &self.url
    }

    fn build_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.token))
                .map_err(|e| SheetlintError::Config(format!("Invalid token: {}", e)))?,
        );
        Ok(headers)
    }
}

impl RemoteStore for DmeClient {
    fn fetch_attributes(&self, collection_path: &str) -> Result<Vec<Attribute>> {
        let endpoint = format!("{}/collection{}", self.url, collection_path);
        debug!(endpoint = %endpoint, "fetching collection metadata");

        let response = self
            .client
            .get(&endpoint)
            .headers(self.build_headers()?)
            .send()
            .map_err(|e| SheetlintError::Remote(format!("Request to '{}' failed: {}", endpoint, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().unwrap_or_default();
            return Err(SheetlintError::Remote(format!(
                "Response code: {}, Response message: {}",
                status, error_text
            )));
        }

        let body: CollectionResponse = response
            .json()
            .map_err(|e| SheetlintError::Remote(format!("Failed to parse response: {}", e)))?;

        body.collections
            .into_iter()
            .next()
            .map(|c| c.metadata_entries.self_metadata_entries)
            .ok_or_else(|| {
                SheetlintError::Remote(format!("No collection returned for '{}'", collection_path))
            })
    }
}

/// Fetch attributes, treating any failure as an empty remote set.
///
/// The second element describes the failure, if there was one.
pub fn fetch_or_empty(store: &dyn RemoteStore, collection_path: &str) -> (Vec<Attribute>, Option<String>) {
    match store.fetch_attributes(collection_path) {
        Ok(attributes) => (attributes, None),
        Err(e) => {
            let message = format!(
                "Could not read '{}' from the remote store ({}); comparing against an empty set",
                collection_path, e
            );
            warn!("{}", message);
            (Vec::new(), Some(message))
        }
    }
}

#[derive(Debug, Deserialize)]
struct CollectionResponse {
    #[serde(default)]
    collections: Vec<CollectionEntry>,
}

#[derive(Debug, Deserialize)]
struct CollectionEntry {
    #[serde(rename = "metadataEntries")]
    metadata_entries: SelfEntries,
}

#[derive(Debug, Deserialize)]
struct SelfEntries {
    #[serde(rename = "selfMetadataEntries", default)]
    self_metadata_entries: Vec<Attribute>,
}

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| SheetlintError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

/// `hpc.server.url` from a properties file, skipping comment lines.
fn server_url(properties: &str) -> Option<String> {
    properties
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#'))
        .find_map(|line| {
            let (key, value) = line.split_once('=')?;
            (key.trim() == "hpc.server.url").then(|| value.trim().to_string())
        })
        .filter(|url| !url.is_empty())
}

/// Bearer token from a curl config file.
fn bearer_token(curl_conf: &str) -> Option<String> {
    BEARER_TOKEN
        .captures(curl_conf)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
