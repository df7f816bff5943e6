//! Access token generation.

use uuid::Uuid;

/// Generate an opaque bearer token.
///
/// Tokens are random (UUID v4) and carry no timestamp.
#[must_use]
pub fn generate_token() -> String {
    Uuid::new_v4().simple().to_string()
}
