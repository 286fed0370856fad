//! # Postforge Scheduler
//!
//! The post-scheduling and dispatch loop. On each tick it decides, given the
//! current schedule settings and the post record store, which posts (if any)
//! to advance right now, drives them through generation and publishing, and
//! persists every state transition — advancing state exactly once per post
//! and tolerating crashes without double-publishing.
//!
//! ## Architecture
//! ```text
//! SchedulerEngine (tokio interval, one tick a minute)
//!   ├── gate: allowed day? time reached? daily cap left?
//!   ├── select: due Pending records, oldest first, up to the cap
//!   ├── per record: Pending → Generating → ReadyToPublish   (CAS-guarded)
//!   │                 ContentGenerator + SEO analysis, with timeout
//!   └── per record: ReadyToPublish → Published | Failed     (CAS-guarded)
//!                     Publisher, with timeout
//! ```

pub mod engine;
pub mod plan;

pub use engine::{next_eligible, SchedulerEngine, SchedulerStatus};
pub use plan::plan_schedule;
