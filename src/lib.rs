//! ZwoForge - Structured Workout Toolkit
//!
//! Parses ZWO workout documents and ERG/MRC trainer files into a flat,
//! time-ordered segment model, samples power curves, computes TSS, supports
//! edits with undo, and exports back to ZWO, ERG and MRC.

pub mod storage;
pub mod workouts;

// Re-export commonly used types
pub use storage::config::AppConfig;
pub use workouts::engine::EditEngine;
pub use workouts::types::{Segment, SegmentKind, Workout};
