//! reply-desk - Human-in-the-loop reply assistant for Google Business
//! Profile reviews.
//!
//! Syncs locations and reviews into a local SQLite cache, suggests replies
//! from operator-defined templates, and publishes a reply only after an
//! explicit approval. Never replies on its own.

pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod models;
pub mod services;
