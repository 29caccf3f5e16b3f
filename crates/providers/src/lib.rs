//! External collaborator boundaries: authentication, billing, and mail.
//!
//! Every provider is constructed once at startup and injected by handle
//! (`Arc<dyn ...>`) into the procedures and handlers that need it. The
//! in-memory implementations double as development defaults and test doubles.

pub mod auth;
pub mod billing;
pub mod mail;

pub use auth::{AuthProvider, InMemoryAuthProvider, RevokeOutcome, Session};
pub use billing::{BillingProvider, Plan, PlanInterval, StaticBillingProvider};
pub use mail::{DeliveryInfo, MailMessage, MailProvider, RecordingMailProvider};
