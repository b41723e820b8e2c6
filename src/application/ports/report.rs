//! Handover service port interface

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::report::{Attachments, HandoverReport};

/// Handover service errors
#[derive(Debug, Clone, Error)]
pub enum ReportError {
    #[error("Handover service request failed: {0}")]
    RequestFailed(String),

    #[error("Handover service error: {0}")]
    ServiceError(String),

    #[error("Failed to parse handover response: {0}")]
    ParseError(String),

    #[error("No report stored for session {0}")]
    NotFound(String),
}

/// Port for the remote handover summarization service
#[async_trait]
pub trait ReportGateway: Send + Sync {
    /// Submit shift notes plus optional attachments; returns the rendered
    /// report and its structured summary.
    async fn generate(
        &self,
        shift_notes: &str,
        attachments: &Attachments,
    ) -> Result<HandoverReport, ReportError>;

    /// Retrieve a previously generated report by its session id
    async fn fetch(&self, session_id: &str) -> Result<HandoverReport, ReportError>;

    /// Probe service availability
    async fn health(&self) -> Result<(), ReportError>;
}
