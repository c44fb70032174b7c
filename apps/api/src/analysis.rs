#![allow(dead_code)]

//! Analysis backend — the interface to the remote AI analysis/chat service.
//!
//! The remote service is an external collaborator; only the trait lives
//! here. `AppState` holds an `Arc<dyn AnalysisBackend>`, swapped at the
//! integration boundary. Calls flow through the retry engine's analysis and
//! edit policies, so a backend only has to fail loudly to get retries.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// AI-generated review of an uploaded CV.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub summary: String,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    /// 0–100 overall quality estimate.
    pub overall_score: u32,
}

#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    async fn analyze(&self, document: &str) -> Result<AnalysisReport, AppError>;

    /// Applies a chat-driven edit instruction and returns the revised
    /// document.
    async fn apply_edit(&self, document: &str, instruction: &str) -> Result<String, AppError>;
}

/// Placeholder wired at startup until a real backend is integrated.
pub struct UnconfiguredBackend;

#[async_trait]
impl AnalysisBackend for UnconfiguredBackend {
    async fn analyze(&self, _document: &str) -> Result<AnalysisReport, AppError> {
        Err(AppError::NotImplemented)
    }

    async fn apply_edit(&self, _document: &str, _instruction: &str) -> Result<String, AppError> {
        Err(AppError::NotImplemented)
    }
}
