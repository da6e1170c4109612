use inquire::InquireError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Unknown network '{0}'. Supported: mainnet, testnet, uat")]
    InvalidNetwork(String),
    #[error("Unknown variant '{0}'. Supported: full, light")]
    InvalidVariant(String),
    #[error("Invalid boolean for {key}: '{value}' (use true/false)")]
    InvalidBool { key: String, value: String },
}

#[derive(Error, Debug)]
pub enum DependencyError {
    #[error("Required tool '{tool}' was not found. {hint}")]
    Missing { tool: String, hint: String },
}

/// Soft failure of a size probe. Never aborts the run.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Reqwest Error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("HTTP Status {0}")]
    Status(reqwest::StatusCode),
    #[error("Missing or unparsable Content-Length header")]
    NoLength,
}

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("HTTP Status {status} while fetching {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("Reqwest Error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("IO Error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("No source for {} and no template at {template}", target.display())]
    TemplateMissing { target: PathBuf, template: String },
    #[error("Local source not found: {}", .0.display())]
    SourceMissing(PathBuf),
    #[error("Download Error: {0}")]
    Download(#[from] DownloadError),
    #[error("IO Error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("No zstd support available: {0}")]
    NoCapability(String),
    #[error("Archive not found: {}", .0.display())]
    ArchiveNotFound(PathBuf),
    #[error("{tool} failed (exit code {code:?}): {stderr}")]
    Command {
        tool: String,
        code: Option<i32>,
        stderr: String,
    },
    #[error("IO Error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("'{command}' failed (exit code {code:?}): {stderr}")]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
    #[error("IO Error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO Error: {0}")]
    Io(#[from] io::Error),
    #[error("Toml Deserialisation Error: {0}")]
    TomlDe(#[from] toml::de::Error),
    #[error("Settings file not found: {}", .0.display())]
    SettingsNotFound(PathBuf),
}

#[derive(Error, Debug)]
pub enum PromptError {
    /// The operator cancelled the prompt (Esc / Ctrl-C)
    #[error("Prompt cancelled")]
    Cancelled,
    #[error("Inquire Error: {0}")]
    Inquire(InquireError),
}

impl From<InquireError> for PromptError {
    fn from(error: InquireError) -> Self {
        match error {
            InquireError::OperationCanceled | InquireError::OperationInterrupted => {
                PromptError::Cancelled
            }
            other => PromptError::Inquire(other),
        }
    }
}
