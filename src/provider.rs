//! Provider descriptor: validated endpoints and client authentication preference of the external
//! OAuth provider.

pub mod descriptor;

pub use descriptor::*;
