use async_trait::async_trait;
use loadplan_core::sync::RemoteFileHost;
use loadplan_domain::{LoadplanError, RemoteConfig, RemoteFile, Result};
use reqwest::Method;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::http::HttpClient;

const LIST_FIELDS: &str = "nextPageToken,files(id,name,mimeType,modifiedTime,size)";
const PAGE_SIZE: &str = "1000";
/// Hard stop for a listing that keeps returning page tokens
const MAX_PAGES: usize = 50;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileListPage {
    #[serde(default)]
    files: Vec<RemoteFile>,
    next_page_token: Option<String>,
}

/// Remote file host backed by the Drive v3 REST API with a static API key
#[derive(Debug, Clone)]
pub struct DriveFileHost {
    http: HttpClient,
    base_url: String,
    api_key: String,
    folder_id: String,
}

impl DriveFileHost {
    /// Build a host from configuration.
    ///
    /// # Errors
    /// Returns `LoadplanError::Config` when the API key or folder id is missing.
    pub fn new(config: &RemoteConfig, http: HttpClient) -> Result<Self> {
        let (api_key, folder_id) = config.credentials()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            folder_id: folder_id.to_string(),
        })
    }

    pub fn folder_id(&self) -> &str {
        &self.folder_id
    }

    fn listing_query(&self) -> String {
        format!("'{}' in parents and trashed=false", self.folder_id.replace('\'', "\\'"))
    }
}

#[async_trait]
impl RemoteFileHost for DriveFileHost {
    #[instrument(skip(self), fields(folder = %self.folder_id))]
    async fn list_files(&self) -> Result<Vec<RemoteFile>> {
        let url = format!("{}/files", self.base_url);
        let query = self.listing_query();
        let mut files = Vec::new();
        let mut page_token: Option<String> = None;

        for page in 0..MAX_PAGES {
            let mut request = self.http.request(Method::GET, &url).query(&[
                ("q", query.as_str()),
                ("fields", LIST_FIELDS),
                ("pageSize", PAGE_SIZE),
                ("key", self.api_key.as_str()),
            ]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let listing: FileListPage = self.http.get_json(request).await?;
            debug!(page, files = listing.files.len(), "listing page received");
            files.extend(listing.files);

            match listing.next_page_token.filter(|token| !token.is_empty()) {
                Some(token) => page_token = Some(token),
                None => return Ok(files),
            }
        }

        Err(LoadplanError::Network(format!(
            "file listing did not terminate after {MAX_PAGES} pages"
        )))
    }

    #[instrument(skip(self, file), fields(file = %file.name))]
    async fn download(&self, file: &RemoteFile) -> Result<Vec<u8>> {
        let url = format!("{}/files/{}", self.base_url, file.id);
        let request = self
            .http
            .request(Method::GET, url)
            .query(&[("alt", "media"), ("key", self.api_key.as_str())]);
        let bytes = self.http.get_bytes(request).await?;
        debug!(bytes = bytes.len(), "file downloaded");
        Ok(bytes)
    }
}
