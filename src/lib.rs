//! 말랑 client core.
//!
//! SYSTEM CONTEXT
//! ==============
//! Client-side logic for an accessibility-focused counseling and community
//! service: the video call session, post comments and replies, the REST and
//! media provisioning clients, and speech recognition/synthesis adapters.
//! Rendering is left to the host; everything here is UI-independent state and
//! I/O.
//!
//! ARCHITECTURE
//! ============
//! - `config`: typed settings from `MALLANG_*` environment variables.
//! - `storage`: durable and session-scoped key/value stores, bearer tokens.
//! - `net`: REST client, media provisioning client, error vocabulary.
//! - `state`: session, comment, auth and chat stores.
//! - `speech`: recognition and synthesis over host-provided engines.
//! - `context`: wires all of the above into one `AppContext`.

pub mod config;
pub mod context;
pub mod net;
pub mod speech;
pub mod state;
pub mod storage;

/// Install the default `tracing` subscriber. Later calls are ignored.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt().try_init();
}
