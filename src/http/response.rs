use std::collections::HashMap;
use std::fs::File;

/// HTTP status codes produced by the server.
///
/// - `Ok` (200): File or listing served
/// - `MovedPermanently` (301): Directory requested without a trailing slash
/// - `NotModified` (304): Client copy is still fresh
/// - `BadRequest` (400): Malformed request
/// - `NotFound` (404): Missing, hidden or unlisted resource
/// - `MethodNotAllowed` (405): Anything other than GET or HEAD
/// - `InternalServerError` (500): Server fault while building the response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 301 Moved Permanently
    MovedPermanently,
    /// 304 Not Modified
    NotModified,
    /// 400 Bad Request
    BadRequest,
    /// 404 Not Found
    NotFound,
    /// 405 Method Not Allowed
    MethodNotAllowed,
    /// 500 Internal Server Error
    InternalServerError,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use staticd::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::NotModified.as_u16(), 304);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::MovedPermanently => 301,
            StatusCode::NotModified => 304,
            StatusCode::BadRequest => 400,
            StatusCode::NotFound => 404,
            StatusCode::MethodNotAllowed => 405,
            StatusCode::InternalServerError => 500,
        }
    }

    /// Returns the standard HTTP reason phrase for this status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use staticd::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.reason_phrase(), "OK");
    /// assert_eq!(StatusCode::NotFound.reason_phrase(), "Not Found");
    /// ```
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::MovedPermanently => "Moved Permanently",
            StatusCode::NotModified => "Not Modified",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::NotFound => "Not Found",
            StatusCode::MethodNotAllowed => "Method Not Allowed",
            StatusCode::InternalServerError => "Internal Server Error",
        }
    }

    /// Statuses whose responses never carry a body.
    pub fn is_bodiless(&self) -> bool {
        matches!(self, StatusCode::NotModified)
    }
}

/// Response payload.
///
/// Small generated bodies (errors, listings, gzip output) live in memory.
/// Plain files stay on disk and are copied to the socket by the writer.
#[derive(Debug)]
pub enum Body {
    Bytes(Vec<u8>),
    /// An open file and the number of bytes to send from it.
    File { file: File, len: u64 },
}

impl Body {
    pub fn len(&self) -> u64 {
        match self {
            Body::Bytes(bytes) => bytes.len() as u64,
            Body::File { len, .. } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Body {
    fn default() -> Self {
        Body::Bytes(Vec::new())
    }
}

/// Represents a complete HTTP response ready to be sent to a client.
///
/// Contains the HTTP status code, headers, and response body.
#[derive(Debug)]
pub struct Response {
    /// The HTTP status code
    pub status: StatusCode,
    /// HTTP headers as key-value pairs
    pub headers: HashMap<String, String>,
    /// Response payload
    pub body: Body,
}

/// Builder for constructing HTTP responses in a fluent style.
///
/// # Example
///
/// ```ignore
/// let response = ResponseBuilder::new(StatusCode::Ok)
///     .header("Content-Type", "text/css")
///     .body(css_bytes)
///     .build();
/// ```
pub struct ResponseBuilder {
    status: StatusCode,
    headers: HashMap<String, String>,
    body: Body,
    announce_length: bool,
}

impl ResponseBuilder {
    /// Creates a new response builder with the specified status code.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: Body::default(),
            announce_length: true,
        }
    }

    /// Replaces the status code, keeping headers set so far.
    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Adds or replaces a header.
    ///
    /// # Example
    ///
    /// ```ignore
    /// builder.header("Content-Type", "text/plain")
    ///     .header("Last-Modified", "Sun, 06 Nov 1994 08:49:37 GMT")
    /// ```
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Sets an in-memory response body.
    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = Body::Bytes(body);
        self
    }

    /// Streams `len` bytes of an open file as the body.
    pub fn file(mut self, file: File, len: u64) -> Self {
        self.body = Body::File { file, len };
        self
    }

    /// Leaves Content-Length off, for HEAD answers whose GET length is not
    /// known without producing the body.
    pub fn without_length(mut self) -> Self {
        self.announce_length = false;
        self
    }

    /// Builds the final Response.
    ///
    /// Adds a Content-Length header matching the body unless one is already
    /// present (HEAD responses announce the length of the body they omit),
    /// the status never carries a body, or `without_length` was called.
    pub fn build(mut self) -> Response {
        if self.announce_length && !self.status.is_bodiless() {
            self.headers
                .entry("Content-Length".to_string())
                .or_insert_with(|| self.body.len().to_string());
        }

        Response {
            status: self.status,
            headers: self.headers,
            body: self.body,
        }
    }
}

impl Response {
    /// Creates a 301 redirect to `location`.
    pub fn redirect(location: impl Into<String>) -> Self {
        ResponseBuilder::new(StatusCode::MovedPermanently)
            .header("Location", location)
            .build()
    }

    /// Creates a 400 Bad Request response.
    pub fn bad_request() -> Self {
        plain_text(StatusCode::BadRequest, "400 Bad Request")
    }

    /// Creates a 404 Not Found response.
    pub fn not_found() -> Self {
        plain_text(StatusCode::NotFound, "404 Not Found")
    }

    /// Creates a 405 response advertising the methods that are served.
    pub fn method_not_allowed() -> Self {
        ResponseBuilder::new(StatusCode::MethodNotAllowed)
            .header("Allow", "GET, HEAD")
            .header("Content-Type", "text/plain; charset=utf-8")
            .body(b"405 Method Not Allowed".to_vec())
            .build()
    }

    /// Creates a 500 Internal Server Error response.
    pub fn internal_error() -> Self {
        plain_text(StatusCode::InternalServerError, "500 Internal Server Error")
    }

    /// Looks up a header value, ignoring ASCII case.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

fn plain_text(status: StatusCode, body: &str) -> Response {
    ResponseBuilder::new(status)
        .header("Content-Type", "text/plain; charset=utf-8")
        .body(body.as_bytes().to_vec())
        .build()
}
