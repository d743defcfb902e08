//! Authenticated platform session
//!
//! This module handles the conversation with the course platform:
//! - Login through the csrf-protected login form
//! - Bearer token and client id headers on every later request
//! - Course id discovery from the course landing page
//! - Curriculum retrieval and decoding

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, REFERER};
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::Credentials;
use crate::curriculum::{decode_items, CurriculumItem};
use crate::downloader::config::DownloadConfig;
use crate::downloader::core::{DownloadError, Result};

static CSRF_INPUT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<input\b[^>]*\bname\s*=\s*["']csrf["'][^>]*>"#).expect("valid regex")
});

static INPUT_VALUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)\bvalue\s*=\s*["']([^"']*)["']"#).expect("valid regex")
});

static COURSE_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)data-courseid="(\d+)""#).expect("valid regex"));

const CURRICULUM_FIELDS: &str =
    "fields[lecture]=@min,completionRatio,progressStatus&fields[quiz]=@min,completionRatio";

/// Error payload of the login form
#[derive(Debug, Deserialize)]
struct LoginResponse {
    error: Option<LoginError>,
}

#[derive(Debug, Deserialize)]
struct LoginError {
    message: Option<String>,
}

#[derive(Debug, Clone)]
struct AuthTokens {
    access_token: String,
    client_id: Option<String>,
}

/// Authenticated client for the course platform
///
/// Cheap to clone: clones share the underlying connection pool and cookie
/// store.
#[derive(Debug, Clone)]
pub struct Session {
    client: Client,
    config: DownloadConfig,
    auth: Option<AuthTokens>,
}

impl Session {
    /// Create a session that has not logged in yet
    pub fn new(config: DownloadConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .cookie_store(true)
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| DownloadError::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
                field: None,
                suggestion: None,
            })?;

        Ok(Self {
            client,
            config,
            auth: None,
        })
    }

    /// Log in with username and password and return the authenticated session
    pub async fn login(config: DownloadConfig, credentials: &Credentials) -> Result<Self> {
        credentials.validate()?;
        let mut session = Self::new(config)?;
        session.authenticate(credentials).await?;
        Ok(session)
    }

    pub fn config(&self) -> &DownloadConfig {
        &self.config
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth.is_some()
    }

    async fn csrf_token(&self) -> Result<String> {
        let url = self.config.url("join/login-popup");
        let page = self.get(&url).await.map_err(auth_error)?;
        let html = page.text().await.map_err(|e| DownloadError::HttpRequest {
            url: url.clone(),
            source: e,
        })?;

        extract_csrf_token(&html).ok_or_else(|| DownloadError::Authentication {
            message: "Login page did not contain a csrf token".to_string(),
        })
    }

    async fn authenticate(&mut self, credentials: &Credentials) -> Result<()> {
        let csrf = self.csrf_token().await?;
        debug!("Obtained csrf token for login");

        let url = self.config.url("join/login-submit");
        let form = [
            ("isSubmitted", "1"),
            ("email", credentials.username.as_str()),
            ("password", credentials.password.as_str()),
            ("displayType", "json"),
            ("csrf", csrf.as_str()),
        ];
        // Rejections carry their reason in the body, even on a 4xx
        let request = self.authorize(self.client.post(&url)).form(&form);
        let response = self.send_request(&url, request).await.map_err(auth_error)?;
        let status = response.status();

        let mut access_token = None;
        let mut client_id = None;
        for cookie in response.cookies() {
            match cookie.name() {
                "access_token" => access_token = Some(cookie.value().to_string()),
                "client_id" => client_id = Some(cookie.value().to_string()),
                _ => {}
            }
        }

        let body = response.text().await.map_err(|e| DownloadError::HttpRequest {
            url: url.clone(),
            source: e,
        })?;
        if let Some(message) = login_error_message(&body) {
            return Err(DownloadError::Authentication { message });
        }
        if !status.is_success() {
            return Err(auth_error(DownloadError::UnexpectedStatus { url, status }));
        }

        let access_token = access_token.ok_or_else(|| DownloadError::Authentication {
            message: "Login response did not set an access token".to_string(),
        })?;

        info!("Logged in as {}", credentials.username);
        self.auth = Some(AuthTokens {
            access_token,
            client_id,
        });
        Ok(())
    }

    /// Create a request with the platform headers and, once logged in, the auth headers
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let mut headers = HeaderMap::new();
        headers.insert("X-Requested-With", HeaderValue::from_static("XMLHttpRequest"));
        if let Ok(referer) = HeaderValue::from_str(&format!("{}/", self.config.base_url)) {
            headers.insert(REFERER, referer);
        }

        if let Some(auth) = &self.auth {
            if let Ok(token) = HeaderValue::from_str(&auth.access_token) {
                headers.insert("X-Udemy-Bearer-Token", token);
            }
            if let Some(id) = auth
                .client_id
                .as_deref()
                .and_then(|id| HeaderValue::from_str(id).ok())
            {
                headers.insert("X-Udemy-Client-Id", id);
            }
        }

        request.headers(headers)
    }

    async fn send_request(&self, url: &str, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                DownloadError::NetworkTimeout {
                    url: url.to_string(),
                    duration_secs: self.config.request_timeout.as_secs(),
                }
            } else {
                DownloadError::HttpRequest {
                    url: url.to_string(),
                    source: e,
                }
            }
        })?;

        debug!("{} -> {}", url, response.status());
        Ok(response)
    }

    async fn execute_request(&self, url: &str, request: RequestBuilder) -> Result<Response> {
        let response = self.send_request(url, request).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::UnexpectedStatus {
                url: url.to_string(),
                status,
            });
        }
        Ok(response)
    }

    /// Authenticated GET
    pub async fn get(&self, url: &str) -> Result<Response> {
        let request = self.authorize(self.client.get(url));
        self.execute_request(url, request).await
    }

    /// Authenticated form POST
    pub async fn post(&self, url: &str, form: &[(&str, &str)]) -> Result<Response> {
        let request = self.authorize(self.client.post(url)).form(form);
        self.execute_request(url, request).await
    }

    async fn get_text(&self, url: &str) -> Result<String> {
        self.get(url)
            .await?
            .text()
            .await
            .map_err(|e| DownloadError::HttpRequest {
                url: url.to_string(),
                source: e,
            })
    }

    /// Numeric course id embedded in the course landing page
    pub async fn course_id(&self, course_link: &str) -> Result<String> {
        let html = self
            .get_text(course_link)
            .await
            .map_err(|e| e.into_discovery("Failed to get course ID"))?;

        let id = extract_course_id(&html)
            .ok_or_else(|| DownloadError::discovery("Failed to get course ID"))?;
        debug!("Course {} has id {}", course_link, id);
        Ok(id)
    }

    /// The course's ordered curriculum items
    pub async fn fetch_curriculum(&self, course_id: &str) -> Result<Vec<CurriculumItem>> {
        let url = self.config.url(&format!(
            "api-1.1/courses/{}/curriculum?{}",
            course_id, CURRICULUM_FIELDS
        ));

        let body = self
            .get_text(&url)
            .await
            .map_err(|e| e.into_discovery("Failed to fetch curriculum"))?;

        let values: Vec<serde_json::Value> = serde_json::from_str(&body).map_err(|e| {
            DownloadError::Parse {
                context: format!("curriculum of course {}", course_id),
                source: e,
            }
            .into_discovery("Failed to fetch curriculum")
        })?;

        let items = decode_items(values);
        info!("Curriculum of course {} has {} items", course_id, items.len());
        Ok(items)
    }

    /// End the platform session; failures are only logged
    pub async fn logout(&self) {
        let url = self.config.url("user/logout");
        match self.get(&url).await {
            Ok(_) => debug!("Logged out"),
            Err(e) => warn!("Logout failed: {}", e),
        }
    }
}

fn auth_error(error: DownloadError) -> DownloadError {
    DownloadError::Authentication {
        message: error.to_string(),
    }
}

fn extract_csrf_token(html: &str) -> Option<String> {
    let input = CSRF_INPUT.find(html)?;
    INPUT_VALUE
        .captures(input.as_str())
        .map(|caps| caps[1].to_string())
}

fn extract_course_id(html: &str) -> Option<String> {
    COURSE_ID.captures(html).map(|caps| caps[1].to_string())
}

/// Server-provided reason for a rejected login, if any
fn login_error_message(body: &str) -> Option<String> {
    let response: LoginResponse = serde_json::from_str(body).ok()?;
    let error = response.error?;
    Some(error.message.unwrap_or_else(|| "Login rejected".to_string()))
}
