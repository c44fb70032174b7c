//! Guard layer — rate limiting, retry with backoff, and the shared
//! sanitization helpers that protect every guarded endpoint.
//!
//! Session lifecycle and trust scoring live in `crate::session`; this module
//! covers the stateless-per-call pieces plus the sweep scheduling they share.

pub mod clock;
pub mod rate_limit;
pub mod retry;
pub mod sanitize;
pub mod sweeper;
