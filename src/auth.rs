// Auth module: the OAuth2 lifecycle for the Blogger API.
//
// A run either has a usable token (loaded, refreshed, or freshly
// exchanged from an authorization code) or it stops and waits for the
// user to approve access in a browser. Waiting is recorded on disk as a
// pending marker next to the token file, and the next run resumes by
// passing the code it received.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{PipelineError, Result};

pub const BLOGGER_SCOPE: &str = "https://www.googleapis.com/auth/blogger";
const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const DEFAULT_REDIRECT_URI: &str = "http://localhost";
const EXPIRY_LEEWAY_SECS: i64 = 30;

/// OAuth client registration, as found in the `client_secret.json` file
/// downloaded from the Google Cloud console.
#[derive(Clone, Debug, Deserialize)]
pub struct ClientSecret {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.into()
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.into()
}

#[derive(Deserialize)]
struct ClientSecretFile {
    installed: Option<ClientSecret>,
    web: Option<ClientSecret>,
}

impl ClientSecret {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
        Self::parse(&data)
    }

    pub fn parse(data: &str) -> Result<Self> {
        let file: ClientSecretFile = serde_json::from_str(data)?;
        file.installed.or(file.web).ok_or_else(|| {
            PipelineError::Config("client secret has neither an \"installed\" nor a \"web\" section".into())
        })
    }

    pub fn redirect_uri(&self) -> &str {
        self.redirect_uris
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_REDIRECT_URI)
    }

    /// Consent page URL for offline (refreshable) access to the blog.
    pub fn authorization_url(&self, state: &str) -> Result<String> {
        let url = Url::parse_with_params(
            &self.auth_uri,
            &[
                ("response_type", "code"),
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri()),
                ("scope", BLOGGER_SCOPE),
                ("access_type", "offline"),
                ("prompt", "select_account consent"),
                ("state", state),
            ],
        )
        .map_err(|e| PipelineError::Config(format!("invalid auth_uri {}: {}", self.auth_uri, e)))?;
        Ok(url.into())
    }
}

/// Stored credentials. `expires_at == None` means the server never told
/// us, and the token is used until a call fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthToken {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "Bearer".into()
}

impl OAuthToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(at) => now + Duration::seconds(EXPIRY_LEEWAY_SECS) >= at,
            None => false,
        }
    }

    pub fn has_refresh_token(&self) -> bool {
        self.refresh_token.as_deref().map_or(false, |t| !t.is_empty())
    }
}

/// Body of a successful answer from the token endpoint.
#[derive(Clone, Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
}

impl TokenResponse {
    /// Turn the response into a stored token. `previous_refresh` is kept
    /// when the server does not hand out a new refresh token.
    pub fn into_token(self, now: DateTime<Utc>, previous_refresh: Option<String>) -> OAuthToken {
        OAuthToken {
            access_token: self.access_token,
            refresh_token: self.refresh_token.or(previous_refresh),
            expires_at: self.expires_in.map(|secs| now + Duration::seconds(secs)),
            scope: self.scope,
            token_type: self.token_type.unwrap_or_else(default_token_type),
        }
    }
}

/// The two calls made against the OAuth token endpoint.
pub trait TokenEndpoint {
    fn exchange_code(&self, code: &str) -> Result<TokenResponse>;
    fn refresh(&self, refresh_token: &str) -> Result<TokenResponse>;
}

pub struct GoogleTokenEndpoint {
    client: Client,
    secret: ClientSecret,
}

impl GoogleTokenEndpoint {
    pub fn new(secret: ClientSecret) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| PipelineError::OAuth(format!("failed to build HTTP client: {}", e)))?;
        Ok(GoogleTokenEndpoint { client, secret })
    }

    fn post(&self, form: &[(&str, &str)]) -> Result<TokenResponse> {
        let res = self
            .client
            .post(&self.secret.token_uri)
            .form(form)
            .send()
            .map_err(|e| PipelineError::OAuth(e.to_string()))?;
        if !res.status().is_success() {
            let status = res.status();
            let txt = res.text().unwrap_or_else(|_| "".into());
            return Err(PipelineError::OAuth(format!("{} - {}", status, txt)));
        }
        res.json()
            .map_err(|e| PipelineError::OAuth(format!("unreadable token response: {}", e)))
    }
}

impl TokenEndpoint for GoogleTokenEndpoint {
    fn exchange_code(&self, code: &str) -> Result<TokenResponse> {
        self.post(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.secret.client_id.as_str()),
            ("client_secret", self.secret.client_secret.as_str()),
            ("redirect_uri", self.secret.redirect_uri()),
        ])
    }

    fn refresh(&self, refresh_token: &str) -> Result<TokenResponse> {
        self.post(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.secret.client_id.as_str()),
            ("client_secret", self.secret.client_secret.as_str()),
        ])
    }
}

/// Marker left behind when a run stops to wait for the user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAuthorization {
    pub state: String,
    pub authorization_url: String,
    pub created_at: DateTime<Utc>,
}

/// Token file plus its pending-authorization marker.
#[derive(Clone, Debug)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        TokenStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn pending_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".pending");
        PathBuf::from(name)
    }

    /// Load the token. A missing file gives `None`; so does a file that
    /// does not hold a usable token, which is logged and otherwise
    /// ignored so that authorization starts over.
    pub fn load(&self) -> Result<Option<OAuthToken>> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(PipelineError::io(&self.path, e)),
        };
        match serde_json::from_str::<OAuthToken>(&data) {
            Ok(token) if !token.access_token.is_empty() => Ok(Some(token)),
            Ok(_) => {
                tracing::warn!(path = %self.path.display(), "token file has an empty access token, ignoring it");
                Ok(None)
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "token file is not valid, ignoring it");
                Ok(None)
            }
        }
    }

    /// Overwrite the token file.
    pub fn save(&self, token: &OAuthToken) -> Result<()> {
        write_json(&self.path, token)
    }

    pub fn load_pending(&self) -> Result<Option<PendingAuthorization>> {
        let path = self.pending_path();
        let data = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(PipelineError::io(path, e)),
        };
        match serde_json::from_str(&data) {
            Ok(pending) => Ok(Some(pending)),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "pending authorization marker is not valid, ignoring it");
                Ok(None)
            }
        }
    }

    pub fn save_pending(&self, pending: &PendingAuthorization) -> Result<()> {
        write_json(&self.pending_path(), pending)
    }

    pub fn clear_pending(&self) -> Result<()> {
        let path = self.pending_path();
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PipelineError::io(path, e)),
        }
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| PipelineError::io(parent, e))?;
    }
    let data = serde_json::to_string_pretty(value)?;
    fs::write(path, data).map_err(|e| PipelineError::io(path, e))
}

/// What the token file says before any network call is made.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthState {
    Missing,
    Valid,
    Refreshable,
    ExpiredWithoutRefresh,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthOutcome {
    Authorized(OAuthToken),
    /// The user has to open the URL and come back with a code.
    Pending(PendingAuthorization),
}

pub struct Authorizer<'a> {
    endpoint: &'a dyn TokenEndpoint,
    secret: &'a ClientSecret,
    store: TokenStore,
}

impl<'a> Authorizer<'a> {
    pub fn new(endpoint: &'a dyn TokenEndpoint, secret: &'a ClientSecret, store: TokenStore) -> Self {
        Authorizer {
            endpoint,
            secret,
            store,
        }
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    pub fn state(&self) -> Result<AuthState> {
        Ok(classify(self.store.load()?.as_ref(), Utc::now()))
    }

    /// Produce a usable access token, or start (and record) the
    /// interactive authorization when there is no way to get one.
    pub fn authorize(&self, code: Option<&str>) -> Result<AuthOutcome> {
        if let Some(code) = code.map(str::trim).filter(|c| !c.is_empty()) {
            return self.exchange(code).map(AuthOutcome::Authorized);
        }

        let now = Utc::now();
        let token = self.store.load()?;
        match (classify(token.as_ref(), now), token) {
            (AuthState::Valid, Some(token)) => {
                tracing::debug!("using stored access token");
                Ok(AuthOutcome::Authorized(token))
            }
            (AuthState::Refreshable, Some(token)) => {
                tracing::info!("access token expired, refreshing");
                let refresh_token = token.refresh_token.unwrap_or_default();
                let response = self.endpoint.refresh(&refresh_token)?;
                let refreshed = response.into_token(now, Some(refresh_token));
                self.store.save(&refreshed)?;
                Ok(AuthOutcome::Authorized(refreshed))
            }
            (state, _) => {
                tracing::info!(?state, "no usable token, authorization required");
                self.begin().map(AuthOutcome::Pending)
            }
        }
    }

    /// Phase one: write the pending marker and hand back the consent URL.
    pub fn begin(&self) -> Result<PendingAuthorization> {
        let state: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();
        let pending = PendingAuthorization {
            authorization_url: self.secret.authorization_url(&state)?,
            state,
            created_at: Utc::now(),
        };
        self.store.save_pending(&pending)?;
        Ok(pending)
    }

    /// Phase two: trade the code for tokens and persist them.
    pub fn exchange(&self, code: &str) -> Result<OAuthToken> {
        if self.store.load_pending()?.is_none() {
            tracing::warn!("authorization code supplied without a pending authorization");
        }
        let response = self.endpoint.exchange_code(code)?;
        let previous = self.store.load()?.and_then(|t| t.refresh_token);
        let token = response.into_token(Utc::now(), previous);
        self.store.save(&token)?;
        self.store.clear_pending()?;
        tracing::info!(path = %self.store.path().display(), "authorization complete, token saved");
        Ok(token)
    }
}

fn classify(token: Option<&OAuthToken>, now: DateTime<Utc>) -> AuthState {
    match token {
        None => AuthState::Missing,
        Some(t) if !t.is_expired(now) => AuthState::Valid,
        Some(t) if t.has_refresh_token() => AuthState::Refreshable,
        Some(_) => AuthState::ExpiredWithoutRefresh,
    }
}
