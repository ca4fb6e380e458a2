//! Client-side stores.
//!
//! ARCHITECTURE
//! ============
//! Each store owns one slice of client state and talks to the outside world
//! only through a trait (`SessionProvisioner`, `MediaService`,
//! `CommentService`) or a `KeyValueStore`, so tests drive them with fakes.
//! [`crate::context::AppContext`] wires the real implementations together.

pub mod auth;
pub mod chat;
pub mod comments;
pub mod session;
