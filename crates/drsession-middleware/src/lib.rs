//! Tower middleware attaching store-backed sessions to requests.
//!
//! Provides:
//! - `SessionLayer` / `SessionService` - Per-request session attachment
//! - `SessionContext` - Sessions keyed by attribute name
//! - Cookie helpers for reading and minting the session cookie

pub mod context;
pub mod cookie;
pub mod layer;

pub use context::SessionContext;
pub use layer::{SessionLayer, SessionService};
