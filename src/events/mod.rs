//! Event publishing seam for session lifecycle and chat events
//!
//! Distribution of events to other participants is a collaborator
//! concern; the core only announces what happened through the
//! `EventPublisher` trait. A broker-backed implementation can be slotted
//! in without touching the state machine.

pub mod publisher;

// Re-export commonly used types
pub use publisher::{EventPublisher, LoggingEventPublisher, MockEventPublisher};
