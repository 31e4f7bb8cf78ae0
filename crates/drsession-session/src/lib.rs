//! Mapping-style session handles over hash-structured stores.
//!
//! Provides:
//! - `Session` - Live mapping view over one remote session record
//! - `SessionStore` - Binds a store and naming convention to session ids
//! - Storage implementations (memory, Redis)
//! - An axum extractor for `Session` (feature: axum)

#[cfg(feature = "axum")]
mod extract;

pub mod session;
pub mod storage;
pub mod store;

pub use drsession_core::{Codec, HashStore, JsonCodec, StoreError, Value};
pub use session::{Session, SessionError};
pub use store::{SessionConfig, SessionStore};
