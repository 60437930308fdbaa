//! Client for the external judging service.
//!
//! The wire format is base64 on both directions. A verdict with a status id
//! of 1 (in queue) or 2 (processing) is still pending; polling is bounded so
//! a stuck submission surfaces as [`ServiceError::JudgeTimeout`] instead of
//! hanging the request forever.

use std::time::Duration;

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::debug;

use crate::error::ServiceError;

/// Highest status id the judging service still considers pending.
const LAST_PENDING_STATUS_ID: u32 = 2;
/// Status id of an accepted submission.
const ACCEPTED_STATUS_ID: u32 = 3;

/// One submission forwarded to the judging service.
#[derive(Debug, Clone)]
pub struct Submission {
    /// Source code to judge, UTF-8.
    pub source_code: String,
    /// Judging-service language identifier.
    pub language_id: u32,
    /// Optional stdin fed to the program.
    pub stdin: Option<String>,
    /// Optional expected output the judge compares against.
    pub expected_output: Option<String>,
}

/// Verdict state fetched for a submission token.
#[derive(Debug, Clone)]
pub struct Verdict {
    /// Numeric verdict status.
    pub status_id: u32,
    /// Human readable verdict.
    pub status_description: String,
    /// Program stdout, decoded.
    pub stdout: Option<String>,
    /// Program stderr, decoded.
    pub stderr: Option<String>,
    /// Compiler output, decoded.
    pub compile_output: Option<String>,
}

impl Verdict {
    /// Whether the judging service is still working on the submission.
    pub fn is_pending(&self) -> bool {
        self.status_id <= LAST_PENDING_STATUS_ID
    }

    /// Whether the submission was accepted.
    pub fn is_accepted(&self) -> bool {
        self.status_id == ACCEPTED_STATUS_ID
    }
}

/// Client talking to the judging service.
pub trait JudgeClient: Send + Sync {
    /// Queue a submission, returning the opaque token to poll with.
    fn submit(&self, submission: Submission) -> BoxFuture<'static, Result<String, ServiceError>>;

    /// Fetch the current verdict state for a token.
    fn fetch(&self, token: String) -> BoxFuture<'static, Result<Verdict, ServiceError>>;
}

/// Poll `client` until the verdict settles or the attempt budget runs out.
pub async fn await_verdict(
    client: &dyn JudgeClient,
    token: &str,
    attempts: u32,
    interval: Duration,
) -> Result<Verdict, ServiceError> {
    for attempt in 0..attempts {
        let verdict = client.fetch(token.to_owned()).await?;
        if !verdict.is_pending() {
            return Ok(verdict);
        }

        debug!(token, attempt, "verdict still pending");
        // No pause after the final fetch; the caller learns of the timeout
        // as soon as the last attempt comes back pending.
        if attempt + 1 < attempts {
            sleep(interval).await;
        }
    }

    Err(ServiceError::JudgeTimeout)
}

/// HTTP client for a judge0-compatible judging service.
pub struct HttpJudgeClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    api_host: Option<String>,
}

#[derive(Debug, Serialize)]
struct WireSubmission {
    source_code: String,
    language_id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    stdin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expected_output: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireToken {
    token: String,
}

#[derive(Debug, Deserialize)]
struct WireStatus {
    id: u32,
    description: String,
}

#[derive(Debug, Deserialize)]
struct WireVerdict {
    status: WireStatus,
    stdout: Option<String>,
    stderr: Option<String>,
    compile_output: Option<String>,
}

impl HttpJudgeClient {
    /// Judging client pointing at `base_url`, optionally authenticated with
    /// RapidAPI-style headers.
    pub fn new(
        client: reqwest::Client,
        base_url: String,
        api_key: Option<String>,
        api_host: Option<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            api_key,
            api_host,
        }
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let mut request = request;
        if let Some(key) = &self.api_key {
            request = request.header("X-RapidAPI-Key", key);
        }
        if let Some(host) = &self.api_host {
            request = request.header("X-RapidAPI-Host", host);
        }
        request
    }
}

fn decode_field(field: Option<String>) -> Option<String> {
    let raw = field?;
    let bytes = BASE64.decode(raw.trim()).ok()?;
    Some(String::from_utf8_lossy(&bytes).into_owned())
}

impl From<WireVerdict> for Verdict {
    fn from(wire: WireVerdict) -> Self {
        Self {
            status_id: wire.status.id,
            status_description: wire.status.description,
            stdout: decode_field(wire.stdout),
            stderr: decode_field(wire.stderr),
            compile_output: decode_field(wire.compile_output),
        }
    }
}

impl JudgeClient for HttpJudgeClient {
    fn submit(&self, submission: Submission) -> BoxFuture<'static, Result<String, ServiceError>> {
        let url = format!("{}/submissions?base64_encoded=true&wait=false", self.base_url);
        let payload = WireSubmission {
            source_code: BASE64.encode(submission.source_code),
            language_id: submission.language_id,
            stdin: submission.stdin.map(|value| BASE64.encode(value)),
            expected_output: submission.expected_output.map(|value| BASE64.encode(value)),
        };
        let request = self.authed(self.client.post(&url)).json(&payload);

        Box::pin(async move {
            let response = request
                .send()
                .await
                .map_err(|err| ServiceError::JudgeServiceError(err.to_string()))?
                .error_for_status()
                .map_err(|err| ServiceError::JudgeServiceError(err.to_string()))?;

            let token: WireToken = response
                .json()
                .await
                .map_err(|err| ServiceError::JudgeServiceError(err.to_string()))?;
            Ok(token.token)
        })
    }

    fn fetch(&self, token: String) -> BoxFuture<'static, Result<Verdict, ServiceError>> {
        let url = format!(
            "{}/submissions/{token}?base64_encoded=true&fields=status,stdout,stderr,compile_output",
            self.base_url
        );
        let request = self.authed(self.client.get(&url));

        Box::pin(async move {
            let response = request
                .send()
                .await
                .map_err(|err| ServiceError::JudgeServiceError(err.to_string()))?
                .error_for_status()
                .map_err(|err| ServiceError::JudgeServiceError(err.to_string()))?;

            let verdict: WireVerdict = response
                .json()
                .await
                .map_err(|err| ServiceError::JudgeServiceError(err.to_string()))?;
            Ok(verdict.into())
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    };

    use super::*;

    struct ScriptedJudge {
        pending_polls: u32,
        polls: AtomicU32,
        final_status: u32,
    }

    impl JudgeClient for ScriptedJudge {
        fn submit(&self, _submission: Submission) -> BoxFuture<'static, Result<String, ServiceError>> {
            Box::pin(async { Ok("token-1".to_owned()) })
        }

        fn fetch(&self, _token: String) -> BoxFuture<'static, Result<Verdict, ServiceError>> {
            let poll = self.polls.fetch_add(1, Ordering::SeqCst);
            let status_id = if poll < self.pending_polls {
                2
            } else {
                self.final_status
            };
            Box::pin(async move {
                Ok(Verdict {
                    status_id,
                    status_description: if status_id == 3 {
                        "Accepted".to_owned()
                    } else {
                        "Processing".to_owned()
                    },
                    stdout: None,
                    stderr: None,
                    compile_output: None,
                })
            })
        }
    }

    #[tokio::test]
    async fn settles_once_the_judge_stops_reporting_pending() {
        let judge = Arc::new(ScriptedJudge {
            pending_polls: 3,
            polls: AtomicU32::new(0),
            final_status: 3,
        });

        let verdict = await_verdict(judge.as_ref(), "token-1", 10, Duration::from_millis(1))
            .await
            .unwrap();

        assert!(verdict.is_accepted());
        assert_eq!(judge.polls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn exhausted_budget_times_out() {
        let judge = ScriptedJudge {
            pending_polls: u32::MAX,
            polls: AtomicU32::new(0),
            final_status: 3,
        };

        let err = await_verdict(&judge, "token-1", 3, Duration::from_millis(1))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::JudgeTimeout));
        assert_eq!(judge.polls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_waits_only_between_attempts() {
        let judge = ScriptedJudge {
            pending_polls: u32::MAX,
            polls: AtomicU32::new(0),
            final_status: 3,
        };

        let started = tokio::time::Instant::now();
        let err = await_verdict(&judge, "token-1", 3, Duration::from_secs(2))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::JudgeTimeout));
        // Three fetches are separated by two pauses; there is no pause after
        // the last one.
        assert_eq!(started.elapsed(), Duration::from_secs(4));
    }

    #[test]
    fn base64_fields_are_decoded() {
        let wire = WireVerdict {
            status: WireStatus {
                id: 4,
                description: "Wrong Answer".to_owned(),
            },
            stdout: Some(BASE64.encode("hello\n")),
            stderr: None,
            compile_output: None,
        };

        let verdict: Verdict = wire.into();
        assert_eq!(verdict.stdout.as_deref(), Some("hello\n"));
        assert!(!verdict.is_accepted());
        assert!(!verdict.is_pending());
    }
}
