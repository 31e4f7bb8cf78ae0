//! Core abstractions for store-backed HTTP sessions.
//!
//! This crate provides the fundamental building blocks:
//! - `HashStore` - Per-field hash operations against a remote store
//! - `Codec` - Serializer/deserializer pair for field values
//! - `Value` - Tagged field value
//! - Session identifier generation

pub mod codec;
pub mod id;
pub mod traits;

pub use codec::{Codec, CodecError, JsonCodec, Value};
pub use id::{IdGenerator, generate_session_id};
pub use traits::{HashStore, StoreError};
