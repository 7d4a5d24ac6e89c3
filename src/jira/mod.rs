//! Client for the ticketing service's REST API.

mod reporter;
pub mod schema;
pub mod transport;

pub use reporter::{ATTACHMENT_FILE_NAME, IssueReporter, IssueTypeCache, JPEG_QUALITY, encode_jpeg};
pub use transport::{
    HttpRequest, HttpResponse, HttpTransport, Method, MultipartFile, ReqwestTransport, RequestBody,
    TransportError,
};
