use thiserror::Error;

/// Failures while filing a report with the ticketing service.
///
/// Each network operation surfaces one kind; the detail strings are for logs
/// and never shown to end users.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReportError {
    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("HTTP status {0}")]
    Http(u16),

    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Failed to create issue: {0}")]
    CreateIssueFailed(String),

    #[error("Issue {issue_key} was created but the screenshot could not be attached: {reason}")]
    AttachmentFailed { issue_key: String, reason: String },

    #[error("Failed to encode screenshot: {0}")]
    ImageConversionFailed(String),

    #[error("Failed to fetch project metadata: {0}")]
    ProjectMetadataFailed(String),

    #[error("Project has no issue types")]
    NoValidIssueTypes,
}

impl ReportError {
    /// The issue that exists despite the failure, if any
    pub fn created_issue(&self) -> Option<&str> {
        match self {
            ReportError::AttachmentFailed { issue_key, .. } => Some(issue_key),
            _ => None,
        }
    }
}

pub type ReportResult<T> = Result<T, ReportError>;
