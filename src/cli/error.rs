use crate::error::{
    ArtifactError, ConfigError, DependencyError, ExtractionError, OrchestratorError, PromptError,
    ValidationError,
};
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InstallerError {
    #[error("Validation Error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Missing Dependency: {0}")]
    Dependency(#[from] DependencyError),

    #[error("Config Error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Prompt(#[from] PromptError),

    #[error("Artifact Error: {0}")]
    Artifact(#[from] ArtifactError),

    #[error("Extraction Error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Orchestrator Error: {0}")]
    Orchestrator(#[from] OrchestratorError),

    #[error("HTTP Client Error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO Error: {0}")]
    Io(#[from] io::Error),
}

impl InstallerError {
    /// The operator backed out of a prompt; not a failure
    pub fn is_user_abort(&self) -> bool {
        matches!(self, InstallerError::Prompt(PromptError::Cancelled))
    }
}
