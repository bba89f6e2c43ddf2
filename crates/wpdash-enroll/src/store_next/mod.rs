//! File store internals.

pub(crate) mod file;
pub(crate) mod io;
