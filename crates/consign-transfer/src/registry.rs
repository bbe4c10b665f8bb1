//! Name-keyed registry of transfer strategies, built once at start-up.
//!
//! Kinds are factories (`copy`, `symlink`, `tokenize`); instances are named, configured strategies.
//! The built-in kinds are always available as instances under their own names with default
//! options. Lookups fail closed with [`TransferError::UnknownStrategy`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use consign_model::ProcessMethod;
use tracing::debug;

use crate::copy::{COPY_KIND, CopyStrategy};
use crate::error::{TransferError, TransferResult};
use crate::strategy::{StrategyOptions, TransferStrategy};
use crate::symlink::{SYMLINK_KIND, SymlinkStrategy};
use crate::tokenize::{TOKENIZE_KIND, TokenizeStrategy};

/// Shared handle to a strategy instance.
pub type SharedStrategy = Arc<dyn TransferStrategy>;

/// Builds a strategy instance from its name and options.
pub type StrategyFactory = fn(&str, &StrategyOptions) -> TransferResult<SharedStrategy>;

/// Registered instance name and the kind that implements it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyInfo {
    /// Instance name used in `process_method`.
    pub name: String,
    /// Kind backing the instance.
    pub kind: &'static str,
}

/// Registry of strategy kinds and named instances.
#[derive(Clone, Default)]
pub struct StrategyRegistry {
    kinds: BTreeMap<&'static str, StrategyFactory>,
    instances: BTreeMap<String, SharedStrategy>,
}

impl fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrategyRegistry")
            .field("kinds", &self.kinds.keys().collect::<Vec<_>>())
            .field("instances", &self.instances.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl StrategyRegistry {
    /// Registry with no kinds and no instances.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry with the built-in kinds and a default instance of each.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register_kind(COPY_KIND, |name, options| {
            Ok(Arc::new(CopyStrategy::from_options(name, options)?))
        });
        registry.register_kind(SYMLINK_KIND, |name, options| {
            Ok(Arc::new(SymlinkStrategy::from_options(name, options)?))
        });
        registry.register_kind(TOKENIZE_KIND, |name, options| {
            Ok(Arc::new(TokenizeStrategy::from_options(name, options)?))
        });
        registry.register(COPY_KIND, Arc::new(CopyStrategy::new()));
        registry.register(SYMLINK_KIND, Arc::new(SymlinkStrategy::new()));
        registry.register(TOKENIZE_KIND, Arc::new(TokenizeStrategy::new()));
        registry
    }

    /// Add or replace a kind factory.
    pub fn register_kind(&mut self, kind: &'static str, factory: StrategyFactory) {
        self.kinds.insert(kind, factory);
    }

    /// Add or replace a named instance.
    pub fn register(&mut self, name: impl Into<String>, strategy: SharedStrategy) {
        let name = name.into();
        debug!(strategy = %name, kind = strategy.kind(), "transfer strategy registered");
        self.instances.insert(name, strategy);
    }

    /// Build a named instance of `kind` from `options` and register it.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::UnknownKind`] when no factory exists for `kind`, or the factory's
    /// error when the options are malformed.
    pub fn configure(
        &mut self,
        name: &str,
        kind: &str,
        options: &StrategyOptions,
    ) -> TransferResult<()> {
        let factory = self
            .kinds
            .get(kind)
            .copied()
            .ok_or_else(|| TransferError::UnknownKind {
                name: name.to_string(),
                kind: kind.to_string(),
            })?;
        let strategy = factory(name, options)?;
        self.register(name, strategy);
        Ok(())
    }

    /// Look up a named instance.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::UnknownStrategy`] when `name` is not registered.
    pub fn resolve(&self, name: &str) -> TransferResult<SharedStrategy> {
        self.instances
            .get(name)
            .cloned()
            .ok_or_else(|| TransferError::UnknownStrategy {
                name: name.to_string(),
            })
    }

    /// Resolve every step of a chain, failing on the first unknown name.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::UnknownStrategy`] for the first unregistered step.
    pub fn resolve_chain(&self, method: &ProcessMethod) -> TransferResult<Vec<SharedStrategy>> {
        method
            .steps()
            .iter()
            .map(|name| self.resolve(name))
            .collect()
    }

    /// Whether `kind` has a factory.
    #[must_use]
    pub fn has_kind(&self, kind: &str) -> bool {
        self.kinds.contains_key(kind)
    }

    /// Registered instances in name order.
    #[must_use]
    pub fn describe(&self) -> Vec<StrategyInfo> {
        self.instances
            .iter()
            .map(|(name, strategy)| StrategyInfo {
                name: name.clone(),
                kind: strategy.kind(),
            })
            .collect()
    }
}
