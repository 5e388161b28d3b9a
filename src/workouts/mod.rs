//! Workout module: parsing, editing and export of structured workouts.

pub mod curve;
pub mod datapoints;
pub mod engine;
pub mod exporter_erg;
pub mod exporter_mrc;
pub mod exporter_zwo;
pub mod generator;
pub mod history;
pub mod intervals;
pub mod parser_mrc;
pub mod parser_zwo;
pub mod tss;
pub mod types;

pub use engine::{EditEngine, SegmentEdit};
pub use exporter_erg::export_erg;
pub use exporter_mrc::export_mrc;
pub use exporter_zwo::export_zwo;
pub use generator::{generate_with_fallback, LocalGenerator, RemoteGenerator};
pub use intervals::{expand, IntervalSpec};
pub use parser_mrc::{parse_course_file, parse_erg, parse_mrc};
pub use parser_zwo::{parse_zwo, parse_zwo_file};
pub use tss::compute_tss;
pub use types::{
    CollaboratorError, EngineError, ExportError, FormatError, PowerSample, PowerShape, Segment,
    SegmentKind, Sport, ValidationError, Workout,
};
