//! Server-rendered browsing interface for a carnival-lyrics corpus.
//!
//! The heavy lifting (full-text search, aggregation, metrical analysis)
//! lives in a remote service consumed through [`api::CorpusClient`]; this
//! crate turns those JSON payloads into the tabbed HTML interface in
//! [`web`] and a handful of terminal lookups.

pub mod api;
pub mod cache;
pub mod model;
pub mod view;
pub mod web;
