//! Tokenize strategy: split a string on a delimiter and publish selected tokens as metadata.
//!
//! The input is the metadata value named by `source_key` when present and non-empty, otherwise the
//! source path. Token indices may be negative (counted from the end). Out-of-range indices are
//! logged and skipped. Tokenize never touches the filesystem, so it behaves the same under dry run
//! and later strategies in a chain can use the tokens in their templates.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{TransferError, TransferResult};
use crate::strategy::{
    StrategyOptions, TransferOutcome, TransferRequest, TransferStrategy, decode_options,
};

/// Kind name of the tokenize strategy.
pub const TOKENIZE_KIND: &str = "tokenize";

const DEFAULT_DELIMITER: &str = "/";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TokenizeOptions {
    #[serde(default)]
    source_key: Option<String>,
    #[serde(default = "default_delimiter")]
    delimiter: String,
    #[serde(default)]
    tokens: BTreeMap<String, Value>,
}

fn default_delimiter() -> String {
    DEFAULT_DELIMITER.to_string()
}

/// Splits a string and injects tokens into the per-file metadata.
#[derive(Debug, Clone)]
pub struct TokenizeStrategy {
    source_key: Option<String>,
    delimiter: String,
    tokens: Vec<(String, i64)>,
}

impl Default for TokenizeStrategy {
    fn default() -> Self {
        Self {
            source_key: None,
            delimiter: default_delimiter(),
            tokens: Vec::new(),
        }
    }
}

impl TokenizeStrategy {
    /// Tokenize the source path on `/` without extracting anything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the input from a metadata key instead of the source path.
    #[must_use]
    pub fn with_source_key(mut self, key: impl Into<String>) -> Self {
        self.source_key = Some(key.into());
        self
    }

    /// Split on `delimiter`.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::InvalidOption`] for an empty delimiter.
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> TransferResult<Self> {
        let delimiter = delimiter.into();
        if delimiter.is_empty() {
            return Err(TransferError::invalid_option(
                TOKENIZE_KIND,
                "delimiter",
                "empty",
                None,
            ));
        }
        self.delimiter = delimiter;
        Ok(self)
    }

    /// Publish the token at `index` under `name`.
    #[must_use]
    pub fn with_token(mut self, name: impl Into<String>, index: i64) -> Self {
        self.tokens.push((name.into(), index));
        self
    }

    /// Build an instance from settings options (`source_key`, `delimiter`, `tokens`).
    ///
    /// Token indices may be integers or integer strings.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::Options`] for unknown or mistyped options and
    /// [`TransferError::InvalidOption`] for an empty delimiter or a non-integer index.
    pub fn from_options(name: &str, options: &StrategyOptions) -> TransferResult<Self> {
        let options: TokenizeOptions = decode_options(name, options)?;
        if options.delimiter.is_empty() {
            return Err(TransferError::invalid_option(
                name,
                "delimiter",
                "empty",
                None,
            ));
        }
        let mut tokens = Vec::with_capacity(options.tokens.len());
        for (token, index) in options.tokens {
            let parsed = parse_index(&index).ok_or_else(|| {
                TransferError::invalid_option(
                    name,
                    "tokens",
                    "index_not_integer",
                    Some(index.to_string()),
                )
            })?;
            tokens.push((token, parsed));
        }
        Ok(Self {
            source_key: options.source_key.filter(|key| !key.trim().is_empty()),
            delimiter: options.delimiter,
            tokens,
        })
    }

    fn input(&self, request: &TransferRequest<'_>) -> String {
        self.source_key
            .as_deref()
            .and_then(|key| request.metadata.get(key))
            .filter(|value| !value.is_empty())
            .cloned()
            .unwrap_or_else(|| request.source.to_string_lossy().into_owned())
    }
}

impl TransferStrategy for TokenizeStrategy {
    fn kind(&self) -> &'static str {
        TOKENIZE_KIND
    }

    fn transfer(&self, request: TransferRequest<'_>) -> TransferResult<TransferOutcome> {
        let mut metadata = request.metadata.clone();
        let input = self.input(&request);
        if input.is_empty() {
            return Ok(TransferOutcome {
                destination: request.destination.to_path_buf(),
                metadata,
            });
        }

        let parts: Vec<&str> = input.split(self.delimiter.as_str()).collect();
        for (name, index) in &self.tokens {
            match select(&parts, *index) {
                Some(value) => {
                    if request.dry_run {
                        info!(token = %name, value, index, "dry run: token extracted");
                    } else {
                        debug!(token = %name, value, index, "token extracted");
                    }
                    metadata.insert(name.clone(), value.to_string());
                }
                None => warn!(
                    token = %name,
                    index,
                    input = %input,
                    parts = parts.len(),
                    "token index out of range"
                ),
            }
        }

        Ok(TransferOutcome {
            destination: request.destination.to_path_buf(),
            metadata,
        })
    }
}

fn parse_index(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn select<'a>(parts: &[&'a str], index: i64) -> Option<&'a str> {
    let len = i64::try_from(parts.len()).ok()?;
    let position = if index < 0 { len + index } else { index };
    if !(0..len).contains(&position) {
        return None;
    }
    usize::try_from(position)
        .ok()
        .and_then(|position| parts.get(position).copied())
}
