//! # Resource Locator
//!
//! Resolves the configured site path (`{hostname}:/{server-relative-path}`)
//! to the opaque site id the list endpoints need.
//!
//! The resolved id is remembered together with the token that resolved it.
//! Tokens are issued fresh every cycle, so in practice the cache only saves
//! a round-trip when the same credential is reused.

use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::auth::Credential;
use crate::error::LookupError;

/// Resolved site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteHandle {
    pub id: String,
    pub web_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SiteResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    web_url: Option<String>,
}

pub struct ResourceLocator {
    client: reqwest::Client,
    graph_base_url: String,
    site_path: String,
    cached: RwLock<Option<(String, SiteHandle)>>,
}

impl ResourceLocator {
    pub fn new(client: reqwest::Client, graph_base_url: &str, site_path: &str) -> Self {
        ResourceLocator {
            client,
            graph_base_url: graph_base_url.trim_end_matches('/').to_string(),
            site_path: site_path.trim_start_matches('/').to_string(),
            cached: RwLock::new(None),
        }
    }

    /// Lookup URL for the configured site.
    pub fn site_url(&self) -> String {
        format!("{}/sites/{}", self.graph_base_url, self.site_path)
    }

    /// Resolves the site id, reusing the cached value for the same token.
    pub async fn resolve(&self, credential: &Credential) -> Result<SiteHandle, LookupError> {
        if let Some((token, handle)) = self.cached.read().await.as_ref() {
            if token == credential.token() {
                debug!(site_id = %handle.id, "Using cached site id");
                return Ok(handle.clone());
            }
        }

        let handle = self.lookup(credential).await?;
        *self.cached.write().await = Some((credential.token().to_string(), handle.clone()));
        Ok(handle)
    }

    async fn lookup(&self, credential: &Credential) -> Result<SiteHandle, LookupError> {
        let url = self.site_url();
        debug!(%url, "Resolving site");

        let response = self
            .client
            .get(&url)
            .bearer_auth(credential.token())
            .send()
            .await
            .map_err(|e| LookupError::new(None, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LookupError::new(Some(status.as_u16()), body.trim().to_string()));
        }

        let site: SiteResponse = response
            .json()
            .await
            .map_err(|e| LookupError::new(Some(status.as_u16()), format!("malformed site response: {}", e)))?;

        match site.id {
            Some(id) if !id.is_empty() => {
                info!(site_id = %id, "Site resolved");
                Ok(SiteHandle {
                    id,
                    web_url: site.web_url,
                })
            }
            _ => Err(LookupError::new(Some(status.as_u16()), "site response has no id")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_url() {
        let locator = ResourceLocator::new(
            reqwest::Client::new(),
            "https://graph.microsoft.com/v1.0/",
            "contoso.sharepoint.com:/sites/it",
        );
        assert_eq!(
            locator.site_url(),
            "https://graph.microsoft.com/v1.0/sites/contoso.sharepoint.com:/sites/it"
        );
    }

    #[test]
    fn test_site_response_parsing() {
        let site: SiteResponse = serde_json::from_str(
            r#"{"id":"contoso.sharepoint.com,abc,def","webUrl":"https://contoso.sharepoint.com/sites/it"}"#,
        )
        .unwrap();
        assert_eq!(site.id.as_deref(), Some("contoso.sharepoint.com,abc,def"));
        assert!(site.web_url.is_some());
    }
}
