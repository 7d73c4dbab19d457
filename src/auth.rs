//! Credential models: redacted secrets, cached bearer credentials, and cache keys.

pub mod credential;
pub mod key;
pub mod secret;

pub use credential::*;
pub use key::*;
pub use secret::*;
