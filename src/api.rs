use crate::error::{ErrorContext, HttpFailure, TmError};
use crate::store::Session;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE, COOKIE, SET_COOKIE};
use reqwest::{Client, Method, Response};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::debug;

const USER_AGENT: &str = concat!("tm/", env!("CARGO_PKG_VERSION"));

/// The single choke point for all outbound calls to the marketplace API.
///
/// Responsibilities per request: join the path onto the configured base URL,
/// attach the session cookie and (for state-changing methods) the CSRF token,
/// capture any refreshed session cookie from `Set-Cookie`, and normalize
/// non-2xx responses into [`TmError::Api`]. There is no retry and no
/// client-added timeout; a hung server call hangs the command.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    session: Session,
}

impl ApiClient {
    pub fn new(session: Session) -> Result<Self, TmError> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .tm_network_err("Failed to create HTTP client")?;
        Ok(Self { http, session })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub async fn get(&self, path: &str) -> Result<Value, TmError> {
        self.request(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> Result<Value, TmError> {
        self.request(Method::POST, path, Some(body)).await
    }

    pub async fn patch(&self, path: &str, body: &Value) -> Result<Value, TmError> {
        self.request(Method::PATCH, path, Some(body)).await
    }

    pub async fn put(&self, path: &str, body: &Value) -> Result<Value, TmError> {
        self.request(Method::PUT, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<Value, TmError> {
        self.request(Method::DELETE, path, None).await
    }

    /// Fire-and-forget POST for advisory records (purchase intents, click
    /// tracking). The primary command outcome never depends on these, so the
    /// signature returns nothing and failures are only logged.
    pub async fn post_advisory(&self, path: &str, body: &Value) {
        if let Err(err) = self.post(path, body).await {
            debug!("advisory call to {path} failed: {err}");
        }
    }

    /// Fetch and store a CSRF token for subsequent state-changing requests.
    pub async fn fetch_csrf_token(&self) -> Result<(), TmError> {
        let payload = self.get("/auth/csrf-token").await?;
        let token = payload
            .get("csrfToken")
            .or_else(|| payload.get("token"))
            .and_then(Value::as_str);
        match token {
            Some(token) => self.session.set_csrf_token(token),
            None => {
                debug!("csrf endpoint returned no recognizable token field");
                Ok(())
            }
        }
    }

    /// Raw streamed GET for binary payloads (library downloads). Writes the
    /// body to `dest` when given, otherwise to the server-suggested filename
    /// from `Content-Disposition`, otherwise to `fallback_name`. Returns the
    /// written path and byte count.
    pub async fn download(
        &self,
        path: &str,
        dest: Option<PathBuf>,
        fallback_name: &str,
    ) -> Result<(PathBuf, u64), TmError> {
        let url = Self::join_url(&self.session.api_base(), path);
        let request = self.prepare(Method::GET, &url);
        let mut response = request
            .send()
            .await
            .tm_network_err(format!("GET {url}"))?;

        self.capture_session_cookie(&response)?;

        if !response.status().is_success() {
            return Err(self.failure(Method::GET, &url, response).await);
        }

        let target = dest.unwrap_or_else(|| {
            response
                .headers()
                .get(CONTENT_DISPOSITION)
                .and_then(|v| v.to_str().ok())
                .and_then(parse_disposition_filename)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(fallback_name))
        });

        let mut file = tokio::fs::File::create(&target)
            .await
            .tm_config_err(format!("Failed to create {}", target.display()))?;
        let mut written: u64 = 0;
        while let Some(chunk) = response
            .chunk()
            .await
            .tm_network_err("Failed to read download body")?
        {
            file.write_all(&chunk)
                .await
                .tm_config_err(format!("Failed to write {}", target.display()))?;
            written += chunk.len() as u64;
        }
        file.flush()
            .await
            .tm_config_err(format!("Failed to write {}", target.display()))?;

        Ok((target, written))
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, TmError> {
        let url = Self::join_url(&self.session.api_base(), path);
        debug!("{method} {url}");

        let mut request = self.prepare(method.clone(), &url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .tm_network_err(format!("{method} {url}"))?;

        // Refreshed session state arrives on any response, success or not.
        self.capture_session_cookie(&response)?;

        if !response.status().is_success() {
            return Err(self.failure(method, &url, response).await);
        }

        let declares_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.contains("json"))
            .unwrap_or(false);

        let text = response
            .text()
            .await
            .tm_network_err("Failed to read response body")?;

        if declares_json && !text.trim().is_empty() {
            serde_json::from_str(&text)
                .tm_network_err(format!("Failed to decode JSON response from {url}"))
        } else {
            // Empty-body 204-style successes resolve to a generic sentinel.
            Ok(json!({ "ok": true }))
        }
    }

    fn prepare(&self, method: Method, url: &str) -> reqwest::RequestBuilder {
        let mut request = self.http.request(method.clone(), url);
        if let Some(cookie) = self.session.session_cookie() {
            request = request.header(COOKIE, cookie);
        }
        if !is_safe_method(&method) {
            if let Some(token) = self.session.csrf_token() {
                request = request.header("x-csrf-token", token);
            }
        }
        request
    }

    async fn failure(&self, method: Method, url: &str, response: Response) -> TmError {
        let status = response.status();
        let reason = status.canonical_reason().unwrap_or("").to_string();
        let body = response.text().await.unwrap_or_default().trim().to_string();
        TmError::Api(HttpFailure {
            method: method.to_string(),
            url: url.to_string(),
            status: status.as_u16(),
            reason,
            body,
        })
    }

    fn capture_session_cookie(&self, response: &Response) -> Result<(), TmError> {
        let wanted = self.session.cookie_name();
        for header in response.headers().get_all(SET_COOKIE) {
            let Ok(raw) = header.to_str() else { continue };
            // Only the name=value pair matters; attributes are dropped.
            let pair = raw.split(';').next().unwrap_or("").trim();
            let Some((name, _)) = pair.split_once('=') else {
                continue;
            };
            if name.trim() == wanted {
                self.session.set_session_cookie(pair)?;
            }
        }
        Ok(())
    }

    /// Join a server-relative path onto the base URL with exactly one slash
    /// at the seam, whatever either side already carries.
    pub fn join_url(base: &str, path: &str) -> String {
        let base = base.strip_suffix('/').unwrap_or(base);
        if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        }
    }
}

fn is_safe_method(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

fn parse_disposition_filename(value: &str) -> Option<String> {
    let lower = value.to_ascii_lowercase();
    let start = lower.find("filename=")? + "filename=".len();
    let rest = value[start..].trim();
    let name = rest
        .trim_start_matches('"')
        .split(['"', ';'])
        .next()?
        .trim();
    // The server suggests a name, never a directory.
    Path::new(name)
        .file_name()
        .and_then(|base| base.to_str())
        .map(|base| base.to_string())
}
