//! Identity domain: identifiers, redacted secrets, password hashing, and the identity
//! repository seam.

pub mod id;
pub mod identity;
pub mod password;
pub mod secret;

pub use id::*;
pub use identity::*;
pub use password::*;
pub use secret::*;
