//! Networking modules for the REST backend and call provisioning.
//!
//! SYSTEM CONTEXT
//! ==============
//! `api` handles the community, counselor and voice-channel REST calls,
//! `media` provisions call sessions and connection tokens, `error` defines the
//! failure vocabulary and `types` the shared wire schema.

pub mod api;
pub mod error;
pub mod media;
pub mod types;
