// Storage module: rehosting. Images are downloaded into memory and put
// into our own S3 bucket with a public-read ACL so the post can link to
// a URL we control.

use reqwest::blocking::Client;
use s3::bucket::Bucket;
use s3::creds::Credentials;
use s3::Region;
use url::Url;
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::error::{PipelineError, Result};

pub const KEY_PREFIX: &str = "images/";
pub const FALLBACK_EXTENSION: &str = "jpg";
// Sent for every object, whatever the extension says.
pub const UPLOAD_CONTENT_TYPE: &str = "image/jpeg";

/// A stored copy of a search result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RehostedImage {
    pub key: String,
    pub public_url: String,
}

pub trait ImageFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Destination bucket. `put_public` stores the body world-readable and
/// returns the URL it can be read back from.
pub trait ObjectStore {
    fn put_public(&self, key: &str, body: &[u8], content_type: &str) -> Result<String>;
}

#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder().build().map_err(|e| PipelineError::Download {
            url: String::new(),
            reason: format!("failed to build HTTP client: {}", e),
        })?;
        Ok(HttpFetcher { client })
    }
}

impl ImageFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let download_error = |reason: String| PipelineError::Download {
            url: url.to_string(),
            reason,
        };
        let res = self
            .client
            .get(url)
            .send()
            .map_err(|e| download_error(e.to_string()))?;
        if !res.status().is_success() {
            return Err(download_error(format!("server answered {}", res.status())));
        }
        let bytes = res.bytes().map_err(|e| download_error(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

pub struct S3Store {
    bucket: Box<Bucket>,
    region: String,
    public_base_url: Option<String>,
}

impl S3Store {
    pub fn new(config: &StorageConfig) -> Result<Self> {
        let credentials = Credentials::new(
            Some(config.access_key.as_str()),
            Some(config.secret_key.as_str()),
            None,
            None,
            None,
        )
        .map_err(|e| PipelineError::Config(format!("invalid storage credentials: {}", e)))?;
        let region: Region = config
            .region
            .parse()
            .map_err(|e| PipelineError::Config(format!("invalid region {}: {}", config.region, e)))?;
        let mut bucket = Bucket::new(&config.bucket, region, credentials)
            .map_err(|e| PipelineError::Config(format!("invalid bucket {}: {}", config.bucket, e)))?;
        bucket.add_header("x-amz-acl", "public-read");

        Ok(S3Store {
            bucket,
            region: config.region.clone(),
            public_base_url: config.public_base_url.clone(),
        })
    }

    fn public_url(&self, key: &str) -> String {
        match &self.public_base_url {
            Some(base) => format!("{}/{}", base.trim_end_matches('/'), key),
            None => format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.bucket.name(),
                self.region,
                key
            ),
        }
    }
}

impl ObjectStore for S3Store {
    fn put_public(&self, key: &str, body: &[u8], content_type: &str) -> Result<String> {
        let response = self
            .bucket
            .put_object_with_content_type(key, body, content_type)
            .map_err(|e| PipelineError::Upload(e.to_string()))?;
        let status = response.status_code();
        if !(200..300).contains(&status) {
            let detail = String::from_utf8_lossy(response.bytes()).into_owned();
            return Err(PipelineError::Upload(format!("{} - {}", status, detail)));
        }
        Ok(self.public_url(key))
    }
}

/// Download `source_url` and put it into the store under a fresh key.
/// One attempt only.
pub fn rehost(
    fetcher: &dyn ImageFetcher,
    store: &dyn ObjectStore,
    source_url: &str,
) -> Result<RehostedImage> {
    let body = fetcher.fetch(source_url)?;
    if body.is_empty() {
        return Err(PipelineError::Download {
            url: source_url.to_string(),
            reason: "empty response body".into(),
        });
    }

    let key = object_key(&extension_for(source_url));
    tracing::debug!(%key, bytes = body.len(), "uploading image");
    let public_url = store.put_public(&key, &body, UPLOAD_CONTENT_TYPE)?;
    Ok(RehostedImage { key, public_url })
}

/// File extension taken from the URL path, `jpg` when there is none
/// usable.
pub fn extension_for(source_url: &str) -> String {
    let path = match Url::parse(source_url) {
        Ok(url) => url.path().to_string(),
        Err(_) => source_url
            .split(|c: char| c == '?' || c == '#')
            .next()
            .unwrap_or("")
            .to_string(),
    };
    let file_name = path.rsplit('/').next().unwrap_or("");
    match file_name.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && (1..=5).contains(&ext.len())
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            ext.to_ascii_lowercase()
        }
        _ => FALLBACK_EXTENSION.to_string(),
    }
}

/// `images/img_<uuid>.<ext>`; unique per call.
pub fn object_key(extension: &str) -> String {
    format!(
        "{}img_{}.{}",
        KEY_PREFIX,
        Uuid::new_v4().simple(),
        extension
    )
}
