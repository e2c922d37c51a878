//! Session token utilities for GreenGrow services
//!
//! Reads and clears the locally persisted access/refresh token pair and
//! decodes the access token's claims for display. Token issuance and
//! signature validation belong to the backend; nothing here verifies
//! signatures.

pub mod claims;
pub mod error;
pub mod store;

pub use claims::{decode_claims, Claims};
pub use error::{AuthError, Result};
pub use store::{FileSessionStore, SessionStore};
