//! Messenger-provider plumbing: webhook payload parsing, subscription
//! verification, and the outbound Send API client. Thin by design; all
//! conversation semantics live behind the capability layer.

pub mod events;
pub mod send;
