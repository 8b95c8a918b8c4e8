//! # List Fetcher
//!
//! Reads the items of one provider list and normalizes them into
//! [`RawRecord`]s.
//!
//! ## Partial Failure
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         fetch_both (join)                               │
//! │                                                                         │
//! │   ┌──────────────────────┐            ┌──────────────────────┐          │
//! │   │  ticket list         │            │  asset list          │          │
//! │   │  GET .../items       │            │  GET .../items       │          │
//! │   └──────────┬───────────┘            └──────────┬───────────┘          │
//! │              │ Ok(items) / Err                   │ Ok(items) / Err      │
//! │              ▼                                   ▼                      │
//! │        items or []                         items or []                  │
//! │                                                                         │
//! │   A failed list never fails the cycle: it is logged and contributes     │
//! │   zero records. The other list is unaffected.                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Response Shapes
//! - Graph: `{"value": [{"id": ..., "fields": {...}}, ...]}`
//! - SharePoint REST verbose: `{"d": {"results": [...]}}`
//! - SharePoint REST (older): `{"d": [...]}`

use opsboard_core::RawRecord;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::auth::Credential;
use crate::config::{ListApi, ProviderSettings};
use crate::error::FetchError;
use crate::locator::SiteHandle;

/// `Accept` header for SharePoint REST verbose payloads.
const ODATA_VERBOSE: &str = "application/json;odata=verbose";

pub struct ListFetcher {
    client: reqwest::Client,
    api: ListApi,
    graph_base_url: String,
    sharepoint_site_url: Option<String>,
}

impl ListFetcher {
    pub fn new(client: reqwest::Client, provider: &ProviderSettings) -> Self {
        ListFetcher {
            client,
            api: provider.list_api,
            graph_base_url: provider.graph_base_url.clone(),
            sharepoint_site_url: provider.sharepoint_site_url.clone(),
        }
    }

    /// Fetches one list, substituting an empty list on any failure.
    pub async fn fetch_list(&self, credential: &Credential, site: &SiteHandle, list: &str) -> Vec<RawRecord> {
        match self.try_fetch_list(credential, site, list).await {
            Ok(records) => {
                debug!(list, count = records.len(), "List fetched");
                records
            }
            Err(e) => {
                if e.is_unauthorized() {
                    warn!(list, status = ?e.status, "Credential rejected by the list endpoint");
                }
                warn!(list, error = %e, "List fetch failed, treating as empty");
                Vec::new()
            }
        }
    }

    /// Fetches the ticket and asset lists concurrently.
    pub async fn fetch_both(
        &self,
        credential: &Credential,
        site: &SiteHandle,
        ticket_list: &str,
        asset_list: &str,
    ) -> (Vec<RawRecord>, Vec<RawRecord>) {
        tokio::join!(
            self.fetch_list(credential, site, ticket_list),
            self.fetch_list(credential, site, asset_list),
        )
    }

    /// Fetches one list, reporting failures.
    pub async fn try_fetch_list(
        &self,
        credential: &Credential,
        site: &SiteHandle,
        list: &str,
    ) -> Result<Vec<RawRecord>, FetchError> {
        let url = self.items_url(site, list)?;
        debug!(list, %url, "Fetching list");

        let mut request = self.client.get(url).bearer_auth(credential.token());
        if self.api == ListApi::SharepointRest {
            request = request.header(reqwest::header::ACCEPT, ODATA_VERBOSE);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::new(list, None, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::new(list, Some(status.as_u16()), body.trim().to_string()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| FetchError::new(list, Some(status.as_u16()), format!("malformed body: {}", e)))?;

        parse_items(body).map_err(|detail| FetchError::new(list, Some(status.as_u16()), detail))
    }

    /// Items endpoint for `list` under the configured API flavor.
    pub fn items_url(&self, site: &SiteHandle, list: &str) -> Result<Url, FetchError> {
        match self.api {
            ListApi::Graph => {
                let mut url = parse_base(&self.graph_base_url, list)?;
                url.path_segments_mut()
                    .map_err(|_| FetchError::new(list, None, "graph base URL cannot carry a path"))?
                    .pop_if_empty()
                    .extend(["sites", site.id.as_str(), "lists", list, "items"]);
                url.set_query(Some("$expand=fields"));
                Ok(url)
            }
            ListApi::SharepointRest => {
                let base = self
                    .sharepoint_site_url
                    .as_deref()
                    .ok_or_else(|| FetchError::new(list, None, "sharepoint_site_url is not configured"))?;
                let mut url = parse_base(base, list)?;
                let title = format!("getbytitle('{}')", list.replace('\'', "''"));
                url.path_segments_mut()
                    .map_err(|_| FetchError::new(list, None, "site URL cannot carry a path"))?
                    .pop_if_empty()
                    .extend(["_api", "web", "lists", title.as_str(), "items"]);
                Ok(url)
            }
        }
    }
}

fn parse_base(base: &str, list: &str) -> Result<Url, FetchError> {
    Url::parse(base).map_err(|e| FetchError::new(list, None, format!("invalid base URL: {}", e)))
}

/// Extracts list items from any supported response shape.
///
/// Items that are not JSON objects are skipped.
pub fn parse_items(body: Value) -> Result<Vec<RawRecord>, String> {
    let items = match body {
        Value::Object(mut map) => match (map.remove("value"), map.remove("d")) {
            (Some(Value::Array(items)), _) => items,
            (_, Some(Value::Array(items))) => items,
            (_, Some(Value::Object(mut d))) => match d.remove("results") {
                Some(Value::Array(items)) => items,
                _ => return Err("'d' payload has no results array".to_string()),
            },
            _ => return Err("response has neither 'value' nor 'd'".to_string()),
        },
        _ => return Err("response is not a JSON object".to_string()),
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match RawRecord::from_item(item) {
            Ok(record) => Some(record),
            Err(e) => {
                debug!(error = %e, "Skipping list item");
                None
            }
        })
        .collect())
}
