//! REST backend client.
//!
//! Responses are JSON envelopes (`{"jobs": [...]}`, `{"applications": [...]}`).
//! Any non-2xx status is an error; callers decide how to degrade.

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ApiConfig;
use crate::models::{Application, Job, User};
use crate::source::JobBoardSource;

/// Records stay raw until [`decode_records`] takes them one at a time.
#[derive(Debug, Default, Deserialize)]
pub struct JobsEnvelope {
    #[serde(default)]
    pub jobs: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApplicationsEnvelope {
    #[serde(default)]
    pub applications: Vec<Value>,
}

/// Decodes each record on its own; a record that does not fit is logged and
/// dropped while the rest of the list is kept.
pub fn decode_records<T: DeserializeOwned>(kind: &str, values: Vec<Value>) -> Vec<T> {
    let total = values.len();
    let records: Vec<T> = values
        .into_iter()
        .enumerate()
        .filter_map(|(position, value)| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!("Skipping malformed {} at position {}: {}", kind, position, err);
                None
            }
        })
        .collect();

    if records.len() < total {
        warn!("Kept {} of {} {} records", records.len(), total, kind);
    }
    records
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurrentUserResponse {
    #[serde(default)]
    pub success: bool,
    pub user: User,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogoutResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .cookie_store(true)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await.context("Request to backend failed")?;
        let status = response.status();
        if !status.is_success() {
            bail!("HTTP error! status: {}", status.as_u16());
        }

        response
            .json::<T>()
            .await
            .context("Failed to decode backend response")
    }

    /// `/applications/job/{id}` with the id percent-encoded as one segment.
    pub fn job_applications_url(&self, job_id: &str) -> Result<Url> {
        let mut url = Url::parse(&self.endpoint_url("/applications/job"))
            .with_context(|| format!("Invalid backend URL: {}", self.base_url))?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("Backend URL cannot carry a path: {}", self.base_url))?
            .push(job_id);
        Ok(url)
    }

    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        debug!("GET {}", endpoint);
        self.send(self.http.get(self.endpoint_url(endpoint))).await
    }

    async fn get_url<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!("GET {}", url.path());
        self.send(self.http.get(url)).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T> {
        debug!("POST {}", endpoint);
        self.send(self.http.post(self.endpoint_url(endpoint)).json(body))
            .await
    }

    /// Signs in; the session cookie is kept by the client for later calls.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<LoginResponse> {
        let response: LoginResponse = self
            .post("/users/login", &Credentials { email, password })
            .await
            .context("Login failed")?;

        if !response.token.is_empty() {
            self.token = Some(response.token.clone());
        }
        Ok(response)
    }

    pub async fn logout(&mut self) -> Result<LogoutResponse> {
        let response = self
            .post("/users/logout", &serde_json::json!({}))
            .await
            .context("Logout failed")?;
        self.token = None;
        Ok(response)
    }

    /// `None` when nobody is signed in or the backend cannot be reached.
    pub async fn current_user(&self) -> Option<User> {
        match self.get::<CurrentUserResponse>("/users/me").await {
            Ok(response) if response.success => Some(response.user),
            Ok(_) => None,
            Err(err) => {
                debug!("No current user: {:#}", err);
                None
            }
        }
    }
}

impl JobBoardSource for ApiClient {
    async fn employer_jobs(&self) -> Result<Vec<Job>> {
        let envelope: JobsEnvelope = self.get("/jobs/employer").await?;
        Ok(decode_records("job", envelope.jobs))
    }

    async fn job_applications(&self, job_id: &str) -> Result<Vec<Application>> {
        let url = self.job_applications_url(job_id)?;
        let envelope: ApplicationsEnvelope = self.get_url(url).await?;
        Ok(decode_records("application", envelope.applications))
    }

    async fn user_applications(&self) -> Result<Vec<Application>> {
        let envelope: ApplicationsEnvelope = self.get("/applications/user").await?;
        Ok(decode_records("application", envelope.applications))
    }
}
