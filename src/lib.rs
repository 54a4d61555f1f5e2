//! # storesync
//!
//! A synchronization library and CLI that mirrors a commerce store's
//! resources between the Admin API and a local directory tree.
//!
//! The crate is organized around two small cores and the plumbing that
//! feeds them:
//!
//! - [`resilience`] — retry with exponential backoff and jitter, plus the
//!   permanent-vs-transient error classification that decides what is
//!   worth retrying, and a rate limiter that keeps calls under the
//!   platform's per-second quota.
//! - [`pagination`] and [`reconcile`] — cursor-driven listing assembly
//!   and the mirror-mode set differences.
//! - [`client`], [`store`], [`resources`], [`sync`] — the HTTP transport,
//!   the local file layout with `.meta` sidecars, the per-resource wire
//!   mappings, and the pull/push orchestration.

pub mod client;
pub mod error;
pub mod pagination;
pub mod reconcile;
pub mod resilience;
pub mod resources;
pub mod store;
pub mod sync;

pub use client::StoreClient;
pub use error::SyncError;
pub use resilience::{execute, RateLimiter, RetryPolicy};
pub use store::LocalStore;
pub use sync::{SyncOptions, SyncReport};
