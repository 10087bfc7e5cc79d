//! Capability layer - the text-in/text-out surface the orchestration layer
//! drives.
//!
//! The orchestration layer itself (the natural-language router that decides
//! *which* capability to invoke) is an external collaborator; this crate
//! treats it as an opaque caller that supplies free text plus a customer id
//! and consumes free text back. What lives here:
//!
//! 1. **Capabilities** (`tools`) - `search_catalog`, `company_info`, and
//!    `financing_quote`, each composing the core engines and mutating the
//!    customer's session.
//! 2. **Runtime** (`runtime`) - capability registry, dispatch by name, and a
//!    deterministic keyword router standing in for the external
//!    orchestrator so the webhook path is runnable end to end.
//!
//! # Boundary principle
//!
//! Capabilities never raise past their own boundary. Extraction ambiguity
//! and empty results are ordinary replies; unexpected internal failures are
//! logged with context and converted into one generic apologetic reply.
//! Session mutations made before a failure are not rolled back.

pub mod runtime;
pub mod tools;
