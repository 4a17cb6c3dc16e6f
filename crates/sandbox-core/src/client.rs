//! HTTP client for the sandbox control plane.
//!
//! Implements both collaborator traits: the file primitives map to
//! `POST /<operation>` with a JSON body, shell commands go to `POST /run`.
//! Calls block; the async facade moves them onto worker threads.
//!
//! reqwest's blocking client owns a private runtime that must be neither
//! built nor shut down on a thread driving async tasks. `SandboxClient`
//! builds and releases it on a plain thread whenever a tokio runtime is
//! current, so it can be created and dropped from async code.

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use sandbox_platform::{CommandExecutor, CommandResult, OperationResponse, SandboxApi};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, trace};

use crate::config::SandboxConfig;

/// Response body of `POST /run`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunResponse {
    #[serde(default)]
    pub stdout: String,
    #[serde(default)]
    pub stderr: String,
    #[serde(default)]
    pub exit_code: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<RunResponse> for CommandResult {
    fn from(resp: RunResponse) -> Self {
        match resp.error.filter(|e| !e.is_empty()) {
            Some(error) => CommandResult {
                success: false,
                stdout: resp.stdout,
                stderr: if resp.stderr.is_empty() { error } else { resp.stderr },
            },
            None => CommandResult {
                success: resp.exit_code == 0,
                stdout: resp.stdout,
                stderr: resp.stderr,
            },
        }
    }
}

#[derive(Debug)]
pub struct SandboxClient {
    // Only `None` while dropping.
    http: Option<Client>,
    config: SandboxConfig,
}

fn in_runtime() -> bool {
    tokio::runtime::Handle::try_current().is_ok()
}

fn build_http(timeout: Duration) -> Result<Client> {
    let build = move || {
        Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")
    };
    if !in_runtime() {
        return build();
    }
    std::thread::spawn(build)
        .join()
        .map_err(|_| anyhow!("HTTP client builder panicked"))?
}

impl SandboxClient {
    pub fn new(config: SandboxConfig) -> Result<Self> {
        if config.sandbox_url.trim().is_empty() {
            bail!("sandbox URL is required");
        }
        let http = build_http(config.request_timeout())?;
        Ok(Self {
            http: Some(http),
            config,
        })
    }

    fn post(&self, endpoint: &str, body: serde_json::Value) -> Result<(StatusCode, String)> {
        let http = self.http.as_ref().context("HTTP client already released")?;
        let url = self.config.endpoint(endpoint);
        debug!("POST {}", url);

        let mut request = http.post(&url).json(&body);
        if let Some(secret) = &self.config.secret {
            request = request.bearer_auth(secret);
        }
        let resp = request
            .send()
            .with_context(|| format!("request to {} failed", url))?;
        let status = resp.status();
        let text = resp.text().context("failed to read response body")?;
        Ok((status, text))
    }

    fn file_op(&self, endpoint: &str, body: serde_json::Value) -> Result<OperationResponse> {
        let (status, text) = self.post(endpoint, body)?;
        parse_operation_response(status, &text)
    }
}

impl Drop for SandboxClient {
    fn drop(&mut self) {
        if let Some(http) = self.http.take() {
            if in_runtime() {
                trace!("releasing HTTP client off the runtime thread");
                std::thread::spawn(move || drop(http));
            }
        }
    }
}

/// Interpret a control-plane reply. A non-2xx status carrying an `error`
/// field is a remote error; any other non-2xx status is a transport error.
pub fn parse_operation_response(status: StatusCode, body: &str) -> Result<OperationResponse> {
    if status.is_success() {
        if body.trim().is_empty() {
            return Ok(OperationResponse::ok());
        }
        return serde_json::from_str(body).context("invalid response from sandbox");
    }
    match serde_json::from_str::<OperationResponse>(body) {
        Ok(resp) if resp.error().is_some() => Ok(resp),
        _ => bail!("sandbox returned HTTP {}: {}", status, body.trim()),
    }
}

pub fn parse_run_response(status: StatusCode, body: &str) -> Result<CommandResult> {
    if !status.is_success() {
        bail!("sandbox returned HTTP {}: {}", status, body.trim());
    }
    let resp: RunResponse =
        serde_json::from_str(body).context("invalid run response from sandbox")?;
    Ok(resp.into())
}

impl SandboxApi for SandboxClient {
    fn write_file(&self, path: &str, content: &str) -> Result<OperationResponse> {
        self.file_op("write_file", json!({ "path": path, "content": content }))
    }

    fn read_file(&self, path: &str) -> Result<OperationResponse> {
        self.file_op("read_file", json!({ "path": path }))
    }

    fn make_dir(&self, path: &str) -> Result<OperationResponse> {
        self.file_op("make_dir", json!({ "path": path }))
    }

    fn list_dir(&self, path: &str) -> Result<OperationResponse> {
        self.file_op("list_dir", json!({ "path": path }))
    }

    fn delete_file(&self, path: &str) -> Result<OperationResponse> {
        self.file_op("delete_file", json!({ "path": path }))
    }

    fn delete_dir(&self, path: &str) -> Result<OperationResponse> {
        self.file_op("delete_dir", json!({ "path": path }))
    }
}

impl CommandExecutor for SandboxClient {
    fn execute(&self, command: &str) -> Result<CommandResult> {
        let (status, text) = self.post("run", json!({ "cmd": command }))?;
        parse_run_response(status, &text)
    }
}
