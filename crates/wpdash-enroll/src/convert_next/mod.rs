//! Conversion internals: transport layer and key parsing.

pub(crate) mod parse;
pub(crate) mod transport;
