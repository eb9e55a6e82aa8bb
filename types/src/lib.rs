//! Shared types for the DuckDB-WASM explorer
//!
//! All types are exported to TypeScript via tsify.

pub mod config;
pub mod data;
pub mod editor;
pub mod error;
pub mod storage;

pub use config::*;
pub use data::*;
pub use editor::*;
pub use error::*;
pub use storage::*;
