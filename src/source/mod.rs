//! Live-event producer boundary.
//!
//! The transport/protocol client (authentication, connection handling, wire
//! frame decoding) is an external collaborator. It is modeled here only at
//! its boundary: something that yields one classified raw event at a time,
//! in arrival order. Everything downstream — normalization, aggregation,
//! persistence — is transport-agnostic.

use async_trait::async_trait;
use serde_json::Value;

pub mod simulator;

pub use simulator::SimulatedSource;

/// One classified event as delivered by the transport client. Timestamps
/// are assigned downstream at normalization time; upstream clocks are not
/// part of the boundary.
#[derive(Debug, Clone)]
pub struct RawEvent {
    /// Classified event type (`message`, `gift`, ...). Unrecognized values
    /// are carried through as-is and normalized to the unknown kind.
    pub kind: String,
    /// Attribute map, schema varying by type.
    pub fields: Value,
}

impl RawEvent {
    pub fn new(kind: impl Into<String>, fields: Value) -> Self {
        Self {
            kind: kind.into(),
            fields,
        }
    }
}

/// Black-box producer of classified live events.
///
/// Implementations deliver events one at a time, in arrival order, on one
/// logical thread of control. `Ok(None)` signals end of stream. Connection
/// timeouts and retries are owned by the implementation, not by this crate.
#[async_trait]
pub trait EventSource: Send {
    async fn next_event(&mut self) -> anyhow::Result<Option<RawEvent>>;
}
