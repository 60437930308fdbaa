use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::services::judge_service::Verdict;

/// Source code submission forwarded to the judging service.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SubmitCodeRequest {
    /// Source code to judge, UTF-8.
    #[validate(length(min = 1))]
    pub source_code: String,
    /// Judging-service language identifier.
    pub language_id: u32,
    /// Optional stdin fed to the program.
    #[serde(default)]
    pub stdin: Option<String>,
    /// Optional expected output the judge compares against.
    #[serde(default)]
    pub expected_output: Option<String>,
}

/// Final verdict returned once the judging service settles.
#[derive(Debug, Serialize, ToSchema)]
pub struct VerdictResponse {
    /// Opaque submission token issued by the judging service.
    pub token: String,
    /// Numeric verdict status.
    pub status_id: u32,
    /// Human readable verdict ("Accepted", "Wrong Answer", ...).
    pub status_description: String,
    /// Program stdout, decoded.
    pub stdout: Option<String>,
    /// Program stderr, decoded.
    pub stderr: Option<String>,
    /// Compiler output, decoded.
    pub compile_output: Option<String>,
    /// Whether the verdict is an acceptance.
    pub accepted: bool,
}

impl VerdictResponse {
    /// Pair a settled verdict with its submission token.
    pub fn from_verdict(token: String, verdict: Verdict) -> Self {
        let accepted = verdict.is_accepted();
        Self {
            token,
            status_id: verdict.status_id,
            status_description: verdict.status_description,
            stdout: verdict.stdout,
            stderr: verdict.stderr,
            compile_output: verdict.compile_output,
            accepted,
        }
    }
}
