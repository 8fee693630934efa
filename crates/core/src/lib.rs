//! Core library for Prism: an in-memory codebase index, keyword search
//! engine, and watcher-driven incremental updater, with a single-writer
//! [`coordinator::Coordinator`] sitting in front of it all.
//!
//! Typical use:
//!
//! ```no_run
//! use std::sync::Arc;
//! use prism_core::config::PrismConfig;
//! use prism_core::coordinator::Coordinator;
//!
//! let config = PrismConfig::new("/path/to/project");
//! let coordinator = Arc::new(Coordinator::new(config));
//! coordinator.init()?;
//! coordinator.start_watcher()?;
//! let results = coordinator.engine().search("handleRequest", 10)?;
//! # Ok::<(), prism_core::error::PrismError>(())
//! ```

pub mod cache;
pub mod config;
pub mod coordinator;
pub mod delta;
pub mod error;
pub mod extract;
pub mod filter;
pub mod model;
pub mod scanner;
pub mod search;
pub mod snapshot;
pub mod store;
pub mod tokenize;
pub mod watcher;

pub use config::PrismConfig;
pub use coordinator::{Coordinator, ReindexSummary, Stats};
pub use error::{PrismError, PrismResult};
pub use model::{FileRecord, Language, LineRecord};
pub use search::{ContextLine, SearchEngine, SearchResult};
