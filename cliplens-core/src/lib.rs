//! Cliplens Core - state machines for the cliplens media-search client
//!
//! This crate holds the browser-free half of the client: the query-string
//! filter model, the incremental result-stream state machine, the drag
//! payload, and the shared video preview pool. Nothing here touches the
//! DOM; browser effects are expressed as data (rebuilt query strings,
//! [`preview::PoolCommand`] lists) that the `cliplens-wasm` driver
//! executes.
//!
//! # Example
//!
//! ```
//! use cliplens_core::{RawSearchResponse, StreamEvent, StreamMode, StreamSession};
//!
//! let mut session = StreamSession::new("red car", Vec::new(), StreamMode::Continuous);
//!
//! // The machine hands out at most one request at a time.
//! let request = session.begin_fetch().expect("query present");
//! assert_eq!(
//!     request.url(cliplens_core::SEARCH_ENDPOINT),
//!     "/api/search/?q=red+car"
//! );
//! assert!(session.begin_fetch().is_none());
//!
//! // Exhaustion on the very first call: render the "no clips found"
//! // placeholder and stop for good.
//! let raw: RawSearchResponse = serde_json::from_str(r#"{"done": true}"#).unwrap();
//! assert_eq!(session.complete_fetch(Ok(raw)), StreamEvent::ExhaustedEmpty);
//! assert!(session.begin_fetch().is_none());
//! ```

pub mod api;
pub mod drag;
pub mod error;
pub mod filter;
pub mod preview;
pub mod query;
pub mod store;
pub mod stream;

// Re-export main types for convenience
pub use api::{RawSearchResponse, ResultItem, SearchRequest, COLOR_ENDPOINT, SEARCH_ENDPOINT};
pub use drag::DragPayload;
pub use error::{CliplensError, Result};
pub use filter::{preview_cache_key, FilterKey, FilterKind, KeyframeId};
pub use preview::{
    format_time, ClipTiming, ContainerClip, ContainerId, PoolCommand, PreviewBinding, PreviewPool,
};
pub use query::QueryState;
pub use store::{FilterStateStore, MemoryPreviewCache, PreviewCache, SlotPreview};
pub use stream::{StreamEvent, StreamMode, StreamSession, StreamState};
