//! Jumpgate Backend - route orchestration over pluggable collaborators
//!
//! This crate turns the synchronous graph search of `jumpgate-core` into a
//! route service:
//! - Cached loading of static and collection-scoped jump rows
//! - External route oracle with local breadth-first fallback
//! - Route result caching keyed by collections, endpoints and filter
//! - Batch requests with per-batch collection access checks
//!
//! ## Collaborators
//!
//! - [`DataSource`]: jump rows ([`SqliteDataSource`] in production)
//! - [`RouteOracle`]: external route search ([`EsiRouteClient`], [`DisabledOracle`])
//! - [`AccessControl`]: collection authorization ([`SqliteDataSource`])
//! - [`CacheStore`]: keyed JSON cache with lifetimes ([`MemoryCacheStore`])
//!
//! ## Example
//!
//! ```ignore
//! use jumpgate_backend::{Caller, RouteQuery, RouteService};
//! use jumpgate_config::JumpgateConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = JumpgateConfig::default();
//!     let service = RouteService::from_config(&config, std::path::Path::new("."))?;
//!
//!     let result = service
//!         .search(&RouteQuery { from: 30000142, to: 30002187, ..Default::default() })
//!         .await?;
//!     println!("{} jumps", result.jump_count);
//!
//!     Ok(())
//! }
//! ```

mod batch;
mod cache;
mod error;
mod loader;
mod oracle;
mod orchestrator;
mod service;
mod sqlite;
mod traits;
mod types;

pub use batch::{BatchSearcher, DEFAULT_BATCH_LIMIT};
pub use cache::{CacheMetrics, MemoryCacheStore, RouteCache, DEFAULT_CACHE_CAPACITY};
pub use error::{BackendError, OracleError};
pub use loader::{DataLoader, DEFAULT_DYNAMIC_TTL, DEFAULT_STATIC_TTL};
pub use oracle::{DisabledOracle, EsiRouteClient};
pub use orchestrator::{ExternalOutcome, RouteOrchestrator, DEFAULT_SEARCH_DEPTH};
pub use service::RouteService;
pub use sqlite::SqliteDataSource;
pub use traits::{AccessControl, CacheStore, DataSource, OracleOptions, RouteOracle};
pub use types::*;

/// Result type for backend operations.
pub type Result<T> = std::result::Result<T, BackendError>;
