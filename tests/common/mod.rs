#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::path::PathBuf;

use blogpub::auth::{ClientSecret, OAuthToken, TokenEndpoint, TokenResponse, TokenStore};
use blogpub::blogger::{NewPost, PostPublisher, PublishedPost};
use blogpub::search::{ImageResult, ImageSearch};
use blogpub::storage::{ImageFetcher, ObjectStore};
use blogpub::{PipelineError, Result};
use chrono::{Duration, Utc};
use tempfile::TempDir;

pub const FOUR_PARAGRAPHS: &str = "Television changed how people get news.\n\n\
Its roots go back to the 19th century.\nEarly sets were mechanical.\n\n\
Colour broadcasting arrived later.\n\n\
For more information, read on.";

pub struct FakeSearch {
    pub urls: Vec<String>,
    pub calls: Cell<usize>,
}

impl FakeSearch {
    pub fn with(urls: &[&str]) -> Self {
        FakeSearch {
            urls: urls.iter().map(|u| u.to_string()).collect(),
            calls: Cell::new(0),
        }
    }
}

impl ImageSearch for FakeSearch {
    fn search(&self, _keyword: &str, count: usize) -> Result<Vec<ImageResult>> {
        self.calls.set(self.calls.get() + 1);
        Ok(self
            .urls
            .iter()
            .take(count)
            .map(|u| ImageResult { source_url: u.clone() })
            .collect())
    }
}

#[derive(Default)]
pub struct FakeFetcher {
    pub fetched: RefCell<Vec<String>>,
}

impl ImageFetcher for FakeFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.fetched.borrow_mut().push(url.to_string());
        Ok(vec![0xff, 0xd8, 0xff, 0xe0])
    }
}

#[derive(Default)]
pub struct FakeStore {
    pub keys: RefCell<Vec<(String, String)>>,
}

impl ObjectStore for FakeStore {
    fn put_public(&self, key: &str, _body: &[u8], content_type: &str) -> Result<String> {
        self.keys
            .borrow_mut()
            .push((key.to_string(), content_type.to_string()));
        Ok(format!("https://my-bucket.s3.eu-central-1.amazonaws.com/{}", key))
    }
}

#[derive(Default)]
pub struct FakeEndpoint {
    pub exchanges: RefCell<Vec<String>>,
    pub refreshes: RefCell<Vec<String>>,
    pub fail: bool,
}

impl TokenEndpoint for FakeEndpoint {
    fn exchange_code(&self, code: &str) -> Result<TokenResponse> {
        self.exchanges.borrow_mut().push(code.to_string());
        if self.fail {
            return Err(PipelineError::OAuth("400 Bad Request - invalid_grant".into()));
        }
        Ok(TokenResponse {
            access_token: "fresh-access".into(),
            expires_in: Some(3599),
            refresh_token: Some("fresh-refresh".into()),
            scope: Some("https://www.googleapis.com/auth/blogger".into()),
            token_type: Some("Bearer".into()),
        })
    }

    fn refresh(&self, refresh_token: &str) -> Result<TokenResponse> {
        self.refreshes.borrow_mut().push(refresh_token.to_string());
        if self.fail {
            return Err(PipelineError::OAuth("400 Bad Request - invalid_grant".into()));
        }
        Ok(TokenResponse {
            access_token: "refreshed-access".into(),
            expires_in: Some(3599),
            refresh_token: None,
            scope: None,
            token_type: Some("Bearer".into()),
        })
    }
}

#[derive(Default)]
pub struct FakePublisher {
    pub posts: RefCell<Vec<(String, NewPost)>>,
}

impl PostPublisher for FakePublisher {
    fn publish(&self, access_token: &str, post: &NewPost) -> Result<PublishedPost> {
        self.posts
            .borrow_mut()
            .push((access_token.to_string(), post.clone()));
        Ok(PublishedPost {
            id: "7001".into(),
            url: "http://example.blogspot.com/2026/10/television.html".into(),
        })
    }
}

pub struct TokenDir {
    _tmp: TempDir,
    pub path: PathBuf,
}

impl TokenDir {
    pub fn new() -> Self {
        let tmp = TempDir::new().expect("create temp dir");
        let path = tmp.path().join("auth").join("token.json");
        Self { _tmp: tmp, path }
    }

    pub fn store(&self) -> TokenStore {
        TokenStore::new(&self.path)
    }

    pub fn write_token(&self, token: &OAuthToken) {
        self.store().save(token).expect("write token");
    }

    pub fn write_raw(&self, data: &str) {
        std::fs::create_dir_all(self.path.parent().unwrap()).expect("create token dir");
        std::fs::write(&self.path, data).expect("write raw token");
    }
}

pub fn secret() -> ClientSecret {
    ClientSecret::parse(
        r#"{"installed":{"client_id":"cid","client_secret":"shh","redirect_uris":["http://localhost"]}}"#,
    )
    .expect("parse client secret")
}

pub fn token(refresh: Option<&str>, expires_in_secs: i64) -> OAuthToken {
    OAuthToken {
        access_token: "stored-access".into(),
        refresh_token: refresh.map(String::from),
        expires_at: Some(Utc::now() + Duration::seconds(expires_in_secs)),
        scope: None,
        token_type: "Bearer".into(),
    }
}
