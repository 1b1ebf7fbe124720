//! Tollgate - Fixed-Window Rate Limiting Service
//!
//! This crate implements a single-process rate limiting service that guards
//! public write endpoints. Requests are partitioned by client and route into
//! rate keys and counted against fixed time windows; a background reaper
//! evicts expired windows so memory tracks active clients rather than every
//! client ever seen.

pub mod clock;
pub mod config;
pub mod error;
pub mod http;
pub mod ratelimit;
