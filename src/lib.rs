//! Workflow schema engine.
//!
//! A schema is a directed graph of typed steps (start, process, decision,
//! approval, end) joined by conditional connections. The crate covers editing
//! the graph through atomic intents, versioning and publishing schemas, laying
//! the graph out on a canvas, navigating a running application through it, and
//! persisting edits through an entity-management collaborator.

pub mod config;
pub mod core;
pub mod editor;
pub mod error;
pub mod layout;
pub mod runtime;
pub mod sync;
pub mod types;

pub use config::{load_config, EngineConfig};
pub use error::{Error, Result, StoreError};
