//! Filesystem connectors for Floe.

pub mod text;

pub use text::{TextLineIterator, TextLineSource};

pub type Result<T> = floe_common::Result<T>;
