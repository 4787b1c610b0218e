//! Business logic services.
//!
//! Services own the workflow between the local SQLite store and the
//! Google Business Profile API; the HTTP layer is a thin transport over
//! them.

pub mod google_auth;
pub mod google_client;
pub mod publisher;
pub mod replies;
pub mod sync;
pub mod template_engine;
