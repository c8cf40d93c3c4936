//! Identity-domain types: validated subject identifiers, the identity cache, and token secrets.

pub mod id;
pub mod identity;
pub mod secret;

pub use id::*;
pub use identity::*;
pub use secret::*;
