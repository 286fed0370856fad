//! # Postforge Store
//!
//! File-based persistence for the pipeline's three collections:
//! schedule settings, post records, and the bulk-title queue.
//!
//! ## Design
//! - Plain JSON documents — inspectable and hand-editable state
//! - Whole-file atomic replace (temp write + rename), so a crash mid-write
//!   never leaves a torn record
//! - Guarded compare-and-set on post state, so two racing workers cannot
//!   double-start the same record

mod file;

pub mod import;
pub mod posts;
pub mod schedule;
pub mod titles;

pub use posts::PostStore;
pub use schedule::ConfigStore;
pub use titles::TitleStore;
