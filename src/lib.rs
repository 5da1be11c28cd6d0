//! Facade over the mergecrab workspace crates.
//!
//! The binary lives in `crates/mergecrab-cli`; this crate only re-exports the
//! libraries so downstream users can depend on a single package.

pub use mergecrab_core as domain;
pub use mergecrab_github as github;
pub use mergecrab_store as store;
