//! Session credential models: redacted secrets, storage slots, and token pairs.

pub mod credentials;
pub mod secret;

pub use credentials::*;
pub use secret::*;
