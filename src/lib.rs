//! Urlshort - a URL shortener service
//!
//! Maps long URLs to deterministic short identifiers and resolves them back,
//! persisting the mapping across interchangeable storage backends.
//!
//! # Architecture
//! - `storage`: one capability contract, three backends (memory, append-only
//!   file, relational database)
//! - `services`: shortening orchestration and the batched deletion pipeline
//! - `api`: HTTP transport, identity cookies and status mapping
//! - `config`: CLI/env configuration and backend selection
//! - `utils`: short-ID derivation and URL validation

pub mod api;
pub mod config;
pub mod errors;
pub mod services;
pub mod storage;
pub mod utils;
