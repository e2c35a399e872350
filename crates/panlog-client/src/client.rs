//! Appliance HTTP client implementation

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

use panlog_core::xml::{first_text, read_entries, root_status};
use panlog_core::{LogKind, RawEntry, Session};

use crate::error::{ClientError, Result};

/// Default request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// Default connection timeout
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Opaque handle for an asynchronous log-retrieval job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle(String);

impl JobHandle {
    pub fn id(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of a single job status check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobPoll {
    /// Job is still running (`ACT`/`PEND`).
    Pending,
    /// Job finished; carries the decoded result entries.
    Completed(Vec<RawEntry>),
    /// Job failed on the appliance side, with its reported reason.
    Failed(String),
}

/// Client for the appliance XML log API.
///
/// Stateless between calls apart from the connection pool; all per-profile
/// state (token, identity) comes in through the [`Session`] argument.
#[derive(Debug, Clone)]
pub struct ApplianceClient {
    client: Client,
    api_url: Url,
}

impl ApplianceClient {
    /// Create a client for the given appliance host.
    ///
    /// `host` may be a bare hostname/IP (scheme defaults to `https`) or a
    /// full URL. TLS certificates are verified; appliances with self-signed
    /// certificates need [`ApplianceClient::insecure`].
    pub fn new(host: &str) -> Result<Self> {
        Self::with_config(host, DEFAULT_TIMEOUT, DEFAULT_CONNECT_TIMEOUT, false)
    }

    /// Create a client that accepts invalid TLS certificates.
    pub fn insecure(host: &str) -> Result<Self> {
        Self::with_config(host, DEFAULT_TIMEOUT, DEFAULT_CONNECT_TIMEOUT, true)
    }

    /// Create a client with custom timeouts and TLS behaviour.
    pub fn with_config(
        host: &str,
        timeout: Duration,
        connect_timeout: Duration,
        accept_invalid_certs: bool,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()?;

        let base = if host.contains("://") {
            host.to_string()
        } else {
            format!("https://{host}/")
        };
        let api_url = Url::parse(&base)?.join("api/")?;

        Ok(Self { client, api_url })
    }

    /// The API endpoint this client talks to.
    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    /// Exchange credentials for an API token.
    #[instrument(skip(self, password))]
    pub async fn keygen(&self, user: &str, password: &str) -> Result<String> {
        let url = self.build_url(&[
            ("type", "keygen".to_string()),
            ("user", user.to_string()),
            ("password", password.to_string()),
        ]);
        let body = self.fetch_text(url).await?;
        Self::check_api_status(&body, "authentication failed")?;

        match first_text(&body, "key")? {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(ClientError::MissingKey),
        }
    }

    /// Start an asynchronous log fetch and return its job handle.
    ///
    /// `max_count` of `None` requests the provider-side default window. The
    /// provider caps a single request at 5000 entries; larger fetches must be
    /// expressed by the caller as multiple requests with distinct `skip`
    /// offsets.
    #[instrument(skip(self, session), fields(profile = %session.profile))]
    pub async fn start_fetch(
        &self,
        session: &Session,
        kind: LogKind,
        max_count: Option<u32>,
        skip: u32,
    ) -> Result<JobHandle> {
        let mut pairs = vec![
            ("type", "log".to_string()),
            ("log-type", kind.as_str().to_string()),
        ];
        if let Some(count) = max_count {
            pairs.push(("nlogs", count.to_string()));
        }
        if skip > 0 {
            pairs.push(("skip", skip.to_string()));
        }
        pairs.push(("key", session.token.clone()));

        let url = self.build_url(&pairs);
        debug!(%kind, ?max_count, skip, "requesting log fetch job");
        let body = self.fetch_text(url).await?;
        Self::check_api_status(&body, "log query rejected")?;

        match first_text(&body, "job")? {
            Some(id) if !id.is_empty() => {
                debug!(job_id = %id, "log fetch job started");
                Ok(JobHandle(id))
            }
            _ => Err(ClientError::MissingJobId),
        }
    }

    /// Check a job's status exactly once.
    ///
    /// Never sleeps or retries; callers own the polling loop.
    #[instrument(skip(self, session), fields(profile = %session.profile, job_id = %job))]
    pub async fn poll_job(
        &self,
        session: &Session,
        kind: LogKind,
        job: &JobHandle,
    ) -> Result<JobPoll> {
        let url = self.build_url(&[
            ("type", "log".to_string()),
            ("log-type", kind.as_str().to_string()),
            ("action", "get".to_string()),
            ("job-id", job.id().to_string()),
            ("key", session.token.clone()),
        ]);
        let body = self.fetch_text(url).await?;
        Self::check_api_status(&body, "job status query rejected")?;

        let status = first_text(&body, "status")?
            .ok_or_else(|| ClientError::Protocol("poll response missing job status".into()))?;

        match status.as_str() {
            "FIN" => {
                let entries = read_entries(&body)?;
                debug!(count = entries.len(), "job finished");
                Ok(JobPoll::Completed(entries))
            }
            "FAIL" => {
                let reason = first_text(&body, "details")?
                    .filter(|text| !text.is_empty())
                    .or(first_text(&body, "msg")?)
                    .unwrap_or_else(|| "no failure details reported".to_string());
                Ok(JobPoll::Failed(reason))
            }
            "ACT" | "PEND" => Ok(JobPoll::Pending),
            other => Err(ClientError::Protocol(format!(
                "unexpected job status: {other}"
            ))),
        }
    }

    fn build_url(&self, pairs: &[(&str, String)]) -> Url {
        let mut url = self.api_url.clone();
        url.query_pairs_mut()
            .clear()
            .extend_pairs(pairs.iter().map(|(k, v)| (*k, v.as_str())));
        url
    }

    async fn fetch_text(&self, url: Url) -> Result<String> {
        let response = self.client.get(url).send().await?;
        Ok(response.text().await?)
    }

    /// Surface an explicit `status="error"` envelope as [`ClientError::Api`].
    fn check_api_status(body: &str, fallback: &str) -> Result<()> {
        if root_status(body)?.as_deref() == Some("error") {
            let message = first_text(body, "msg")?
                .filter(|text| !text.is_empty())
                .unwrap_or_else(|| fallback.to_string());
            return Err(ClientError::Api(message));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_host_gets_https_api_endpoint() {
        let client = ApplianceClient::new("panorama.example.net").unwrap();
        assert_eq!(
            client.api_url().as_str(),
            "https://panorama.example.net/api/"
        );
    }

    #[test]
    fn explicit_scheme_is_preserved() {
        let client = ApplianceClient::new("http://127.0.0.1:8443").unwrap();
        assert_eq!(client.api_url().as_str(), "http://127.0.0.1:8443/api/");
    }
}
