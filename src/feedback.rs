use egui::Vec2;
use futures::channel::oneshot;
use image::RgbaImage;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::{ConfigError, ReporterConfig};
use crate::error::ReportResult;
use crate::jira::{HttpTransport, IssueReporter, ReqwestTransport, TransportError};
use crate::record::{AnnotationRecord, RecordFile};
use crate::report::{AppInfo, MetadataSource, Report, SystemMetadata};
use crate::session::{AnnotationSession, SessionResult};
use crate::shake::ShakeSource;

/// How long either confirmation stays on screen
pub const TOAST_DURATION: Duration = Duration::from_millis(2500);

#[derive(Debug, Error)]
pub enum StartError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Transient confirmation shown once a send resolves
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Toast {
    Success { issue_key: String },
    Failure,
}

impl Toast {
    pub fn from_result(result: &ReportResult<String>) -> Self {
        match result {
            Ok(issue_key) => Toast::Success {
                issue_key: issue_key.clone(),
            },
            Err(_) => Toast::Failure,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Toast::Success { .. } => "Bug reported. Thank you!",
            Toast::Failure => "Could not send the bug report",
        }
    }

    pub fn duration(&self) -> Duration {
        TOAST_DURATION
    }
}

/// Entry point for a host application: one per process, passed to whatever
/// triggers reports.
#[derive(Clone)]
pub struct ShakeReporter {
    reporter: IssueReporter,
    metadata: Arc<dyn MetadataSource>,
}

impl std::fmt::Debug for ShakeReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShakeReporter")
            .field("reporter", &self.reporter)
            .finish_non_exhaustive()
    }
}

impl ShakeReporter {
    /// Validate `config` and connect to the ticketing service over HTTPS
    pub fn start(config: ReporterConfig, app: AppInfo) -> Result<Self, StartError> {
        let transport = ReqwestTransport::new()?;
        let reporter = Self::with_transport(config, transport, SystemMetadata { app })?;
        log::info!("Shake reporting started for project {}", reporter.reporter.config().project_key);
        Ok(reporter)
    }

    pub fn with_transport(
        config: ReporterConfig,
        transport: impl HttpTransport + 'static,
        metadata: impl MetadataSource + 'static,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            reporter: IssueReporter::new(config, transport),
            metadata: Arc::new(metadata),
        })
    }

    pub fn reporter(&self) -> &IssueReporter {
        &self.reporter
    }

    /// Start a report cycle over a freshly captured screenshot
    pub fn begin_cycle(&self, screenshot: RgbaImage, container_size: Vec2) -> SessionResult<ReportCycle> {
        self.resume_cycle(screenshot, container_size, &[])
    }

    /// Like [`ShakeReporter::begin_cycle`], continuing strokes from an earlier
    /// pass over the same screenshot
    pub fn resume_cycle(
        &self,
        screenshot: RgbaImage,
        container_size: Vec2,
        existing: &[AnnotationRecord],
    ) -> SessionResult<ReportCycle> {
        let session = AnnotationSession::open(screenshot, container_size, existing)?;
        Ok(ReportCycle {
            session,
            reporter: self.reporter.clone(),
            metadata: Arc::clone(&self.metadata),
        })
    }

    /// Begin a cycle on every shake raised through `source`.
    ///
    /// `capture` grabs the screenshot and the size it will be shown at;
    /// returning `None` skips that shake.
    pub fn subscribe<C, H>(&self, source: &ShakeSource, mut capture: C, mut on_cycle: H)
    where
        C: FnMut() -> Option<(RgbaImage, Vec2)> + Send + 'static,
        H: FnMut(ReportCycle) + Send + 'static,
    {
        let reporter = self.clone();
        source.subscribe(Box::new(move || {
            let Some((screenshot, container_size)) = capture() else {
                log::warn!("Shake ignored: no screenshot available");
                return;
            };
            match reporter.begin_cycle(screenshot, container_size) {
                Ok(cycle) => on_cycle(cycle),
                Err(err) => log::warn!("Shake ignored: {}", err),
            }
        }));
    }
}

/// A submitted cycle: the strokes for later resumption and the pending result
#[derive(Debug)]
pub struct Submission {
    pub records: RecordFile,
    pub result: oneshot::Receiver<ReportResult<String>>,
}

/// One shake: annotate the screenshot, then file it
pub struct ReportCycle {
    session: AnnotationSession,
    reporter: IssueReporter,
    metadata: Arc<dyn MetadataSource>,
}

impl std::fmt::Debug for ReportCycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportCycle")
            .field("session", &self.session)
            .field("reporter", &self.reporter)
            .finish_non_exhaustive()
    }
}

impl ReportCycle {
    pub fn session(&self) -> &AnnotationSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut AnnotationSession {
        &mut self.session
    }

    /// Finish annotating and send the report without blocking.
    ///
    /// `on_toast` runs on the send worker once the exchange completes; hosts
    /// hop back to their UI thread from there.
    pub fn submit<T>(mut self, note: impl Into<String>, on_toast: T) -> SessionResult<Submission>
    where
        T: FnOnce(Toast) + Send + 'static,
    {
        let outcome = self.session.finish()?;
        let records = outcome.record_file();
        let report = Report::new(note, outcome.image, self.metadata.device_metadata());
        log::info!("Submitting report {}", report.id());

        let result = self.reporter.send_in_background(
            report,
            Some(move |result: &ReportResult<String>| on_toast(Toast::from_result(result))),
        );
        Ok(Submission { records, result })
    }
}
