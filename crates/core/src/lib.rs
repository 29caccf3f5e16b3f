//! Core contracts shared by every tillwerk crate: the response envelope and
//! the failure-code taxonomy.

pub mod envelope;
pub mod error;

pub use envelope::Envelope;
pub use error::ErrorCode;
