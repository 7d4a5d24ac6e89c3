#![warn(clippy::all, rust_2018_idioms)]

pub mod config;
pub mod error;
pub mod feedback;
pub mod geometry;
pub mod jira;
pub mod record;
pub mod renderer;
pub mod report;
pub mod session;
pub mod shake;
pub mod stroke;
pub mod stroke_store;
pub mod surface;
pub mod tools;
mod util;

pub use config::{ConfigError, ReporterConfig};
pub use error::{ReportError, ReportResult};
pub use feedback::{ReportCycle, ShakeReporter, StartError, Submission, Toast};
pub use geometry::AspectFit;
pub use jira::IssueReporter;
pub use record::{AnnotationRecord, RecordFile, RecordPoint};
pub use renderer::Renderer;
pub use report::{AppInfo, DeviceMetadata, Report};
pub use session::{AnnotationOutcome, AnnotationSession, SessionError};
pub use shake::{ShakeListener, ShakeSource};
pub use stroke::{Stroke, StrokeRef, StrokeStyle};
pub use stroke_store::StrokeStore;
pub use surface::{DrawingSurface, PointerEvent};
pub use tools::ToolKind;

/// Initialise `env_logger` from `RUST_LOG`, defaulting to `info`.
/// Safe to call more than once.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .is_test(cfg!(test))
        .try_init();
}
