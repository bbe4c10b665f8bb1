//! Command handlers, one module per subcommand.

pub(crate) mod deliver;
pub(crate) mod manifest;
pub(crate) mod strategies;
