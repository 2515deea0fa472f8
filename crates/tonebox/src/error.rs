#![forbid(unsafe_code)]

//! Unified error type.

use std::fmt;

use tonebox_runtime::CommandError;
use tonebox_song::{ConfigError, DocumentError};
use tonebox_widgets::PromptError;

/// Any error a Tonebox operation can return.
#[derive(Debug)]
pub enum Error {
    /// A song edit refused to apply.
    Command(CommandError),
    /// The document rejected a change group.
    Document(DocumentError),
    /// A prompt operation failed.
    Prompt(PromptError),
    /// Channel bounds could not be loaded.
    Config(ConfigError),
    /// The global log subscriber could not be installed.
    Logging(String),
}

/// Result alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Command(e) => write!(f, "edit failed: {e}"),
            Self::Document(e) => write!(f, "document error: {e}"),
            Self::Prompt(e) => write!(f, "prompt error: {e}"),
            Self::Config(e) => write!(f, "config error: {e}"),
            Self::Logging(msg) => write!(f, "logging setup failed: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Command(e) => Some(e),
            Self::Document(e) => Some(e),
            Self::Prompt(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::Logging(_) => None,
        }
    }
}

impl From<CommandError> for Error {
    fn from(e: CommandError) -> Self {
        Self::Command(e)
    }
}

impl From<DocumentError> for Error {
    fn from(e: DocumentError) -> Self {
        Self::Document(e)
    }
}

impl From<PromptError> for Error {
    fn from(e: PromptError) -> Self {
        Self::Prompt(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}
