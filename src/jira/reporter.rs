use futures::channel::oneshot;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbaImage};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use url::Url;

use super::schema::{
    AdfDocument, CreateIssueRequest, CreateIssueResponse, CreateMetaResponse, IssueFields,
    IssueTypeEntry, IssueTypeRef, ProjectRef, ProjectResponse, summary_for,
};
use super::transport::{HttpRequest, HttpResponse, HttpTransport, Method, MultipartFile, RequestBody};
use crate::config::ReporterConfig;
use crate::error::{ReportError, ReportResult};
use crate::report::{DeviceMetadata, Report};

pub const JPEG_QUALITY: u8 = 80;
pub const ATTACHMENT_FILE_NAME: &str = "screenshot.jpg";

/// Issue type names tried in order before falling back to the first listed
const PREFERRED_ISSUE_TYPES: [&str; 3] = ["bug", "task", "story"];

/// Issue types available in the configured project
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IssueTypeCache {
    types: Vec<IssueTypeEntry>,
}

impl IssueTypeCache {
    pub fn new(types: Vec<IssueTypeEntry>) -> Self {
        Self { types }
    }

    pub fn id_for(&self, name: &str) -> Option<&str> {
        self.types
            .iter()
            .find(|entry| entry.name.eq_ignore_ascii_case(name))
            .map(|entry| entry.id.as_str())
    }

    /// "Bug", then "Task", then "Story", then whatever comes first
    pub fn preferred(&self) -> Option<&str> {
        PREFERRED_ISSUE_TYPES
            .iter()
            .find_map(|name| self.id_for(name))
            .or_else(|| self.types.first().map(|entry| entry.id.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[derive(Debug, Default)]
struct ReporterState {
    /// Issue type id in use, settled at most once
    issue_type: Option<String>,
    issue_types: Option<IssueTypeCache>,
}

struct Shared {
    config: ReporterConfig,
    transport: Box<dyn HttpTransport>,
    state: Mutex<ReporterState>,
}

/// Files reports as issues with a screenshot attachment.
///
/// All operations on one reporter (and its clones) run one at a time: a
/// `send` holds the reporter for its whole metadata/create/attach exchange
/// and other callers wait behind it.
#[derive(Clone)]
pub struct IssueReporter {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for IssueReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssueReporter")
            .field("config", &self.shared.config)
            .finish_non_exhaustive()
    }
}

impl IssueReporter {
    pub fn new(config: ReporterConfig, transport: impl HttpTransport + 'static) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                transport: Box::new(transport),
                state: Mutex::new(ReporterState::default()),
            }),
        }
    }

    pub fn config(&self) -> &ReporterConfig {
        &self.shared.config
    }

    /// Issue type id to file under. A pinned id wins; otherwise the project's
    /// types are looked up once and the preferred one is kept, falling back
    /// to the default id if the lookup fails.
    pub fn resolve_issue_type(&self) -> String {
        let mut state = self.shared.state.lock();
        self.resolve_locked(&mut state)
    }

    /// Issue types fetched so far, if a lookup happened
    pub fn cached_issue_types(&self) -> Option<IssueTypeCache> {
        self.shared.state.lock().issue_types.clone()
    }

    /// Create the issue without attaching anything. Returns its key.
    pub fn create_issue(&self, note: &str, metadata: &DeviceMetadata) -> ReportResult<String> {
        let mut state = self.shared.state.lock();
        let issue_type = self.resolve_locked(&mut state);
        self.create_issue_locked(note, metadata, &issue_type)
    }

    /// Upload `image` as a JPEG attachment of `issue_key`
    pub fn attach(&self, image: &RgbaImage, issue_key: &str) -> ReportResult<()> {
        let bytes = encode_jpeg(image, JPEG_QUALITY)?;
        let _state = self.shared.state.lock();
        self.attach_locked(bytes, issue_key)
    }

    /// Resolve the issue type, create the issue, then attach the screenshot.
    ///
    /// The screenshot is encoded first, so an unusable image fails before
    /// anything is created. If attaching fails the created issue is left as
    /// is and the error carries its key.
    pub fn send(&self, report: &Report) -> ReportResult<String> {
        let bytes = encode_jpeg(report.image(), JPEG_QUALITY)?;

        let mut state = self.shared.state.lock();
        log::info!("Sending report {} to project {}", report.id(), self.shared.config.project_key);

        let issue_type = self.resolve_locked(&mut state);
        let issue_key = self.create_issue_locked(report.note(), report.metadata(), &issue_type)?;
        self.attach_locked(bytes, &issue_key)?;

        log::info!("Report {} filed as {}", report.id(), issue_key);
        Ok(issue_key)
    }

    /// Send on a worker thread. The result is delivered through the returned
    /// receiver and, if given, to `on_done` on the worker thread.
    pub fn send_in_background<F>(
        &self,
        report: Report,
        on_done: Option<F>,
    ) -> oneshot::Receiver<ReportResult<String>>
    where
        F: FnOnce(&ReportResult<String>) + Send + 'static,
    {
        self.send_on_worker(report, on_done, |job| {
            std::thread::Builder::new()
                .name("shake-report-send".to_string())
                .spawn(job)
                .map(drop)
        })
    }

    /// `spawn` runs the job elsewhere. If it cannot, the result is still
    /// delivered, as a transport failure, so callers always hear back once.
    fn send_on_worker<F, S>(
        &self,
        report: Report,
        on_done: Option<F>,
        spawn: S,
    ) -> oneshot::Receiver<ReportResult<String>>
    where
        F: FnOnce(&ReportResult<String>) + Send + 'static,
        S: FnOnce(Box<dyn FnOnce() + Send>) -> std::io::Result<()>,
    {
        let (sender, receiver) = oneshot::channel();
        let pending = Arc::new(Mutex::new(Some(Completion { on_done, sender })));
        let reporter = self.clone();
        let worker_pending = Arc::clone(&pending);

        let spawned = spawn(Box::new(move || {
            let result = reporter.send(&report);
            drop(report);
            if let Err(err) = &result {
                log::error!("Report failed: {}", err);
            }
            complete(&worker_pending, result);
        }));

        if let Err(err) = spawned {
            log::error!("Failed to start report worker: {}", err);
            complete(
                &pending,
                Err(ReportError::Transport(format!("failed to start report worker: {err}"))),
            );
        }
        receiver
    }

    fn resolve_locked(&self, state: &mut ReporterState) -> String {
        if let Some(id) = self.shared.config.pinned_issue_type() {
            return id.to_string();
        }
        if let Some(id) = &state.issue_type {
            return id.clone();
        }

        let default_id = self.shared.config.default_issue_type_id().to_string();
        let resolved = match self.fetch_issue_types() {
            Ok(cache) => {
                let id = cache.preferred().map(str::to_string).unwrap_or(default_id);
                state.issue_types = Some(cache);
                id
            }
            Err(err) => {
                log::warn!("Issue type lookup failed ({}); using default {}", err, default_id);
                default_id
            }
        };

        log::debug!("Resolved issue type {}", resolved);
        state.issue_type = Some(resolved.clone());
        resolved
    }

    fn fetch_issue_types(&self) -> ReportResult<IssueTypeCache> {
        let project_url = self.endpoint(&["rest", "api", "3", "project", self.shared.config.project_key.as_str()])?;
        let project: ProjectResponse = self
            .get_json(project_url)
            .map_err(|err| ReportError::ProjectMetadataFailed(err.to_string()))?;

        let mut meta_url = self.endpoint(&["rest", "api", "3", "issue", "createmeta"])?;
        meta_url
            .query_pairs_mut()
            .append_pair("projectIds", &project.id)
            .append_pair("expand", "projects.issuetypes");
        let meta: CreateMetaResponse = self
            .get_json(meta_url)
            .map_err(|err| ReportError::ProjectMetadataFailed(err.to_string()))?;

        let types = meta
            .projects
            .into_iter()
            .next()
            .map(|project| project.issuetypes)
            .unwrap_or_default();
        if types.is_empty() {
            return Err(ReportError::NoValidIssueTypes);
        }
        Ok(IssueTypeCache::new(types))
    }

    fn create_issue_locked(
        &self,
        note: &str,
        metadata: &DeviceMetadata,
        issue_type: &str,
    ) -> ReportResult<String> {
        let url = self.endpoint(&["rest", "api", "3", "issue"])?;
        let payload = CreateIssueRequest {
            fields: IssueFields {
                project: ProjectRef {
                    key: self.shared.config.project_key.clone(),
                },
                issuetype: IssueTypeRef {
                    id: issue_type.to_string(),
                },
                summary: summary_for(note),
                description: AdfDocument::bug_report(note, metadata),
            },
        };
        let body = serde_json::to_vec(&payload)
            .map_err(|err| ReportError::CreateIssueFailed(err.to_string()))?;

        let request = self
            .request(Method::Post, url)
            .header("Accept", "application/json")
            .body(RequestBody::Json(body));
        let response = self
            .execute(&request)
            .and_then(require_success)
            .map_err(|err| ReportError::CreateIssueFailed(err.to_string()))?;

        let created: CreateIssueResponse = parse_json(&response)
            .map_err(|err| ReportError::CreateIssueFailed(err.to_string()))?;
        if created.key.is_empty() {
            return Err(ReportError::CreateIssueFailed("response has an empty key".to_string()));
        }

        log::debug!("Created issue {}", created.key);
        Ok(created.key)
    }

    fn attach_locked(&self, bytes: Vec<u8>, issue_key: &str) -> ReportResult<()> {
        let attachment_failed = |reason: String| ReportError::AttachmentFailed {
            issue_key: issue_key.to_string(),
            reason,
        };

        let url = self
            .endpoint(&["rest", "api", "3", "issue", issue_key, "attachments"])
            .map_err(|err| attachment_failed(err.to_string()))?;

        let request = self
            .request(Method::Post, url)
            .header("X-Atlassian-Token", "nocheck")
            .body(RequestBody::Multipart(MultipartFile {
                field: "file".to_string(),
                file_name: ATTACHMENT_FILE_NAME.to_string(),
                content_type: "image/jpeg".to_string(),
                bytes,
            }));
        self.execute(&request)
            .and_then(require_success)
            .map_err(|err| attachment_failed(err.to_string()))?;

        log::debug!("Attached screenshot to {}", issue_key);
        Ok(())
    }

    fn endpoint(&self, segments: &[&str]) -> ReportResult<Url> {
        let base = self.shared.config.base_url();
        let mut url = Url::parse(&base).map_err(|err| ReportError::InvalidUrl(format!("{base}: {err}")))?;
        url.path_segments_mut()
            .map_err(|_| ReportError::InvalidUrl(format!("{base} cannot be a base URL")))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> HttpRequest {
        HttpRequest::new(method, url.as_str()).header("Authorization", self.shared.config.auth_header())
    }

    fn execute(&self, request: &HttpRequest) -> ReportResult<HttpResponse> {
        log::debug!("{:?} {}", request.method, request.url);
        self.shared
            .transport
            .execute(request)
            .map_err(|err| ReportError::Transport(err.to_string()))
    }

    fn get_json<T: DeserializeOwned>(&self, url: Url) -> ReportResult<T> {
        let request = self.request(Method::Get, url).header("Accept", "application/json");
        let response = self.execute(&request).and_then(require_success)?;
        parse_json(&response)
    }
}

/// Where a background send reports back. Taken exactly once.
struct Completion<F> {
    on_done: Option<F>,
    sender: oneshot::Sender<ReportResult<String>>,
}

fn complete<F>(pending: &Mutex<Option<Completion<F>>>, result: ReportResult<String>)
where
    F: FnOnce(&ReportResult<String>),
{
    let Some(Completion { on_done, sender }) = pending.lock().take() else {
        return;
    };
    if let Some(on_done) = on_done {
        on_done(&result);
    }
    // Receiver may have been dropped by a fire-and-forget caller.
    let _ = sender.send(result);
}

fn require_success(response: HttpResponse) -> ReportResult<HttpResponse> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(ReportError::Http(response.status))
    }
}

fn parse_json<T: DeserializeOwned>(response: &HttpResponse) -> ReportResult<T> {
    serde_json::from_slice(&response.body).map_err(|err| ReportError::InvalidResponse(err.to_string()))
}

/// Encode as an RGB JPEG; alpha is dropped
pub fn encode_jpeg(image: &RgbaImage, quality: u8) -> ReportResult<Vec<u8>> {
    if image.width() == 0 || image.height() == 0 {
        return Err(ReportError::ImageConversionFailed("image is empty".to_string()));
    }

    let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality)
        .encode_image(&rgb)
        .map_err(|err| ReportError::ImageConversionFailed(err.to_string()))?;
    Ok(bytes)
}
