//! The library code for the `byline` blog generator. The architecture can
//! be generally broken down into two sequential phases over one pool of
//! worker threads:
//!
//! 1. Parsing posts from source files on disk ([`crate::discover`],
//!    [`crate::post`]) into the shared aggregate ([`crate::store`])
//! 2. Rendering the aggregate into output files on disk ([`crate::write`])
//!
//! The interesting part is the seam between them. Phase 1 fans one parse
//! job per source file out to the pool ([`crate::pool`]), and every worker
//! merges its results into the store under a single lock. A counting
//! barrier (one completion per job, success or failure) keeps phase 2 from
//! starting until phase 1 has fully drained, so the category pages and the
//! root index never observe a partially built store. Phase 2 then renders
//! one page per category on the workers while the dispatcher renders the
//! root index from the same, now-frozen store.
//!
//! [`crate::build`] stitches the phases together; everything around the
//! seam is mechanical I/O.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod config;
pub mod discover;
pub mod pool;
pub mod post;
pub mod store;
pub mod write;
