//! Incremental fetch-and-render of search results.
//!
//! [`StreamSession`] is a transport-free state machine: the driver asks it
//! for the next [`SearchRequest`], performs the fetch however it likes, and
//! feeds the outcome back through [`StreamSession::complete_fetch`]. The
//! machine is `Idle → Streaming → {Exhausted, Failed}`; the terminal states
//! absorb.

use std::collections::HashSet;

use crate::api::{RawSearchResponse, ResultItem, SearchRequest};
use crate::error::Result;
use crate::filter::{FilterKey, KeyframeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Idle,
    Streaming,
    Exhausted,
    Failed,
}

/// How results are pulled from the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamMode {
    /// One item per request, re-kicked immediately after each append. The
    /// load-more affordance is hidden.
    #[default]
    Continuous,
    /// A full page per request, pulled by a manual load-more trigger.
    Paged,
}

impl StreamMode {
    pub fn parse(s: &str) -> Self {
        if s == "paged" {
            StreamMode::Paged
        } else {
            StreamMode::Continuous
        }
    }
}

/// Outcome of one fetch cycle, for the driver to render.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Items accepted this cycle, in backend response order.
    Accepted(Vec<ResultItem>),
    /// Terminal: nothing was ever found for this session.
    ExhaustedEmpty,
    /// Terminal: the backend ran out after at least one accepted item.
    ExhaustedAfterResults,
    /// Terminal: transport or parse failure. Never retried.
    Failed,
}

pub struct StreamSession {
    query: String,
    filters: Vec<FilterKey>,
    mode: StreamMode,
    state: StreamState,
    seen: HashSet<KeyframeId>,
    rendered: Vec<ResultItem>,
    in_flight: bool,
    results_found: bool,
}

impl StreamSession {
    pub fn new(query: impl Into<String>, filters: Vec<FilterKey>, mode: StreamMode) -> Self {
        Self {
            query: query.into(),
            filters,
            mode,
            state: StreamState::Idle,
            seen: HashSet::new(),
            rendered: Vec::new(),
            in_flight: false,
            results_found: false,
        }
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    pub fn mode(&self) -> StreamMode {
        self.mode
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.state, StreamState::Exhausted | StreamState::Failed)
    }

    /// Every item accepted so far, in response order.
    pub fn rendered(&self) -> &[ResultItem] {
        &self.rendered
    }

    /// Identifiers excluded on the next request.
    pub fn seen(&self) -> &HashSet<KeyframeId> {
        &self.seen
    }

    /// Guard and build the next request. `None` while a request is in
    /// flight, after a terminal transition, or without a query — at most
    /// one outstanding request per session, never pipelined.
    pub fn begin_fetch(&mut self) -> Option<SearchRequest> {
        if self.query.is_empty() || self.in_flight || self.is_terminal() {
            return None;
        }
        self.in_flight = true;
        self.state = StreamState::Streaming;

        // Set iteration order is arbitrary; sort so requests are stable.
        let mut returned: Vec<KeyframeId> = self.seen.iter().copied().collect();
        returned.sort_unstable();

        Some(SearchRequest {
            query: self.query.clone(),
            returned,
            filters: self.filters.clone(),
        })
    }

    /// Feed the outstanding request's outcome back in. The in-flight flag
    /// is cleared before anything else: state may have moved while the
    /// fetch was pending.
    pub fn complete_fetch(&mut self, outcome: Result<RawSearchResponse>) -> StreamEvent {
        self.in_flight = false;

        if self.is_terminal() {
            return self.terminal_event();
        }

        let raw = match outcome {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(error = %err, "search fetch failed, halting stream");
                self.state = StreamState::Failed;
                return StreamEvent::Failed;
            }
        };

        let (items, done) = raw.into_batch();
        if done || items.is_empty() {
            self.state = StreamState::Exhausted;
            return self.terminal_event();
        }

        self.results_found = true;
        for item in &items {
            // Re-adding an id the server sent again is idempotent; the set
            // only feeds the next request's exclusion list.
            self.seen.insert(item.keyframe_id);
        }
        self.rendered.extend(items.iter().cloned());
        tracing::debug!(
            accepted = items.len(),
            total = self.rendered.len(),
            "accepted result batch"
        );
        StreamEvent::Accepted(items)
    }

    /// Whether the driver should immediately issue the next fetch after
    /// rendering (continuous pull, self-paced by round-trip latency).
    pub fn wants_refetch(&self) -> bool {
        self.mode == StreamMode::Continuous && self.state == StreamState::Streaming
    }

    fn terminal_event(&self) -> StreamEvent {
        match self.state {
            StreamState::Failed => StreamEvent::Failed,
            _ if self.results_found => StreamEvent::ExhaustedAfterResults,
            _ => StreamEvent::ExhaustedEmpty,
        }
    }
}
