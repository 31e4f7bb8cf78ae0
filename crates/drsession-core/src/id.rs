//! Session identifier generation.

use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{RngCore, rngs::OsRng};

/// Number of random bytes in a generated session id.
const ID_BYTES: usize = 32;

/// Injectable session id generator.
pub type IdGenerator = Arc<dyn Fn() -> String + Send + Sync>;

/// Generate a fresh session id.
///
/// 32 bytes from the OS CSPRNG, URL-safe base64 with padding stripped.
#[must_use]
pub fn generate_session_id() -> String {
    let mut buf = [0u8; ID_BYTES];
    OsRng.fill_bytes(&mut buf);
    URL_SAFE_NO_PAD.encode(buf)
}
