use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("{0} must not be empty")]
    Empty(&'static str),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("store data is not valid JSON: {0}")]
    Serde(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("chapter counter write failed: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("language model request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("language model returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("language model returned no usable content")]
    EmptyResponse,
}

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("speech provider request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("speech credential check failed with status {status}: {message}")]
    CredentialCheck { status: u16, message: String },

    #[error("speech provider returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("speech provider returned no audio")]
    EmptyAudio,
}

#[derive(Debug, Error)]
pub enum CompositionError {
    #[error("missing required media asset: {}", .0.display())]
    MissingAsset(PathBuf),

    #[error("narration audio is empty")]
    EmptyAudio,

    #[error("failed to launch {tool}: {source}")]
    Spawn {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exited with status {status}: {stderr}")]
    Process {
        tool: &'static str,
        status: i32,
        stderr: String,
    },

    #[error("ffprobe returned an unparseable duration: {output:?}")]
    BadProbeOutput { output: String },

    #[error("scratch file I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("platform request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("platform returned status {status}: {message}")]
    Api {
        status: u16,
        code: Option<u64>,
        message: String,
    },
}

/// Stage-tagged failure of a single pipeline run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("chapter reservation failed: {0}")]
    Ledger(#[from] LedgerError),

    #[error("story generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("speech synthesis failed: {0}")]
    Synthesis(#[from] SynthesisError),

    #[error("media composition failed: {0}")]
    Composition(#[from] CompositionError),

    #[error("publish failed: {0}")]
    Publish(#[from] PublishError),

    #[error("post record write failed: {0}")]
    Record(#[from] StoreError),
}

impl RunError {
    pub fn stage(&self) -> &'static str {
        match self {
            RunError::Ledger(_) => "chapter reservation",
            RunError::Generation(_) => "story generation",
            RunError::Synthesis(_) => "speech synthesis",
            RunError::Composition(_) => "media composition",
            RunError::Publish(_) => "publish",
            RunError::Record(_) => "post recording",
        }
    }

    /// Platform error code when the failure carries one (e.g. a rate limit).
    pub fn code(&self) -> Option<u64> {
        match self {
            RunError::Publish(PublishError::Api { code, status, .. }) => {
                code.or(Some(u64::from(*status)))
            }
            _ => None,
        }
    }
}
