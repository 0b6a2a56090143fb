//! # Project Companion Core
//!
//! Domain types, traits, and error definitions for the Project Companion
//! gateway. This crate has **zero framework dependencies** — it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator is defined as a trait here. Implementations
//! live in their respective crates. This enables:
//! - Swapping backends via configuration (Redis vs in-process cache, SQLite vs Postgres)
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod project;
pub mod cache;
pub mod store;
pub mod provider;
pub mod extract;
pub mod source;

// Re-export key types at crate root for ergonomics
pub use project::{PdfPayload, Project};
pub use cache::{CacheKey, CachedAnswer, VolatileCache};
pub use store::{ContextRecord, ContextStore};
pub use provider::Provider;
pub use extract::DocumentExtractor;
pub use source::ProjectSource;
