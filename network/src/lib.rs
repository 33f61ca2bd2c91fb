//! Authority-facing network layer.
//!
//! The sync engine and the wallet only see [`AuthorityClient`]. [`HttpAuthority`] is the
//! production adapter; tests use the scripted authority from `tessera-nullables`.

pub mod client;
pub mod error;
pub mod http;
pub mod sse;

pub use client::{AuthorityClient, ChainNotification, NotificationStream};
pub use error::AuthorityError;
pub use http::{HttpAuthority, HttpAuthorityConfig};
pub use sse::{SseDecoder, SseEvent};
