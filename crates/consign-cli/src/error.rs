//! CLI error type and exit-code mapping.

use std::fmt::{self, Display, Formatter};

/// Exit code for bad settings, package descriptions or result records.
pub(crate) const EXIT_INVALID_INPUT: i32 = 2;
/// Exit code for IO and other operational failures.
pub(crate) const EXIT_OPERATIONAL: i32 = 3;

/// Splits problems the caller can fix in their input from failures of the run itself.
#[derive(Debug)]
pub(crate) enum CliError {
    InvalidInput(String),
    Operational(anyhow::Error),
}

pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub(crate) fn operational(error: impl Into<anyhow::Error>) -> Self {
        Self::Operational(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidInput(_) => EXIT_INVALID_INPUT,
            Self::Operational(_) => EXIT_OPERATIONAL,
        }
    }

    /// Message printed to stderr; operational errors include their context chain.
    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::InvalidInput(message) => format!("invalid input: {message}"),
            Self::Operational(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput(_) => formatter.write_str("invalid input"),
            Self::Operational(_) => formatter.write_str("delivery command failed"),
        }
    }
}

impl std::error::Error for CliError {}
