// Search module: a small blocking client for the Pexels search API. It
// only knows how to turn a keyword into a list of image URLs.

use reqwest::blocking::{Client, Request};
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;

use crate::error::{PipelineError, Result};

/// One hit from the image search, consumed by rehosting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageResult {
    pub source_url: String,
}

/// Anything that can look up stock images for a keyword.
pub trait ImageSearch {
    fn search(&self, keyword: &str, count: usize) -> Result<Vec<ImageResult>>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    photos: Vec<Photo>,
}

#[derive(Debug, Deserialize)]
struct Photo {
    #[serde(default)]
    src: PhotoSources,
}

#[derive(Debug, Default, Deserialize)]
struct PhotoSources {
    large: Option<String>,
    original: Option<String>,
}

#[derive(Clone)]
pub struct PexelsClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl PexelsClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| PipelineError::Search(format!("failed to build HTTP client: {}", e)))?;
        Ok(PexelsClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn search_request(&self, keyword: &str, count: usize) -> Result<Request> {
        self.client
            .get(format!("{}/search", self.base_url))
            .header(AUTHORIZATION, &self.api_key)
            .query(&[("query", keyword.to_string()), ("per_page", count.to_string())])
            .build()
            .map_err(|e| PipelineError::Search(format!("invalid request: {}", e)))
    }
}

impl ImageSearch for PexelsClient {
    fn search(&self, keyword: &str, count: usize) -> Result<Vec<ImageResult>> {
        if keyword.trim().is_empty() {
            return Err(PipelineError::InvalidInput("keyword must not be empty".into()));
        }
        if count == 0 {
            return Err(PipelineError::InvalidInput("image count must be positive".into()));
        }

        let request = self.search_request(keyword, count)?;
        tracing::debug!(url = %request.url(), "searching images");
        let res = self
            .client
            .execute(request)
            .map_err(|e| PipelineError::Search(e.to_string()))?;
        if !res.status().is_success() {
            let status = res.status();
            let txt = res.text().unwrap_or_else(|_| "".into());
            return Err(PipelineError::Search(format!("{} - {}", status, txt)));
        }
        let body = res
            .text()
            .map_err(|e| PipelineError::Search(e.to_string()))?;
        parse_search_response(&body, count)
    }
}

/// Pull one URL per photo out of a search response, preferring the
/// `large` variant. At most `count` results are returned.
pub fn parse_search_response(body: &str, count: usize) -> Result<Vec<ImageResult>> {
    let parsed: SearchResponse = serde_json::from_str(body)?;
    Ok(parsed
        .photos
        .into_iter()
        .filter_map(|photo| photo.src.large.or(photo.src.original))
        .filter(|url| !url.is_empty())
        .take(count)
        .map(|source_url| ImageResult { source_url })
        .collect())
}
