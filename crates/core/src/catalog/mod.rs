//! Vehicle catalog: dataset loading, free-text filter extraction, and the
//! filter/rank/shortlist engine.
//!
//! The dataset is loaded once per engine instance and treated as read-only
//! afterwards, so concurrent reads across customers need no coordination.

pub mod dataset;
pub mod engine;
pub mod filter;
pub mod format;
