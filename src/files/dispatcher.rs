//! Per-request pipeline: method gate, resolution, freshness check, body.

use std::fs::File;
use std::path::{Path, PathBuf};

use crate::config::StaticFilesConfig;
use crate::error::{Result, ServeError};
use crate::files::compress::{compressor_pool, CompressionPolicy, CompressorPool, GZIP_ENCODING};
use crate::files::conditional;
use crate::files::listing;
use crate::files::resolve::{PathResolver, Resolution, ResourceMetadata};
use crate::http::mime::{self, MimeRegistry};
use crate::http::request::{Method, Request};
use crate::http::response::{Response, ResponseBuilder, StatusCode};

const LISTING_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Turns requests into responses for one server root.
///
/// Everything in here is read-only after construction except the compressor
/// pool, so one dispatcher is shared by all connections. `dispatch` does
/// blocking filesystem I/O and belongs on a blocking worker.
#[derive(Debug)]
pub struct Dispatcher {
    resolver: PathResolver,
    mimes: MimeRegistry,
    policy: CompressionPolicy,
    compressors: CompressorPool,
    list_directories: bool,
}

impl Dispatcher {
    pub fn new(root: impl Into<PathBuf>, list_directories: bool) -> Self {
        Self {
            resolver: PathResolver::new(root),
            mimes: MimeRegistry::default(),
            policy: CompressionPolicy::default(),
            compressors: compressor_pool(),
            list_directories,
        }
    }

    pub fn from_config(config: &StaticFilesConfig) -> Self {
        Self::new(config.root.clone(), config.list_directories)
    }

    pub fn root(&self) -> &Path {
        self.resolver.root()
    }

    /// Always produces a response; failures become 4xx/5xx responses.
    pub fn dispatch(&self, request: &Request) -> Response {
        self.try_dispatch(request)
            .unwrap_or_else(ServeError::into_response)
    }

    fn try_dispatch(&self, request: &Request) -> Result<Response> {
        if !request.method.is_read_only() {
            return Err(ServeError::MethodNotAllowed);
        }

        let url_path = request.url_path().ok_or(ServeError::NotFound)?;

        match self.resolver.resolve(&url_path, self.list_directories)? {
            Resolution::Redirect(location) => Ok(Response::redirect(location)),
            Resolution::Listing(dir) => self.serve_listing(&dir, &url_path),
            Resolution::File(resource) => self.serve_file(request, &resource),
        }
    }

    fn serve_file(&self, request: &Request, resource: &ResourceMetadata) -> Result<Response> {
        let extension = mime::extension(&resource.path);

        let mut response = ResponseBuilder::new(StatusCode::Ok)
            .header("Last-Modified", conditional::last_modified(resource.modified))
            .header("Content-Type", self.mimes.lookup(extension));

        if conditional::is_not_modified(resource.modified, request.header("If-Modified-Since")) {
            return Ok(response.status(StatusCode::NotModified).build());
        }

        let accept_encoding = request.header("Accept-Encoding");
        let gzip = self.policy.should_compress(resource.size, extension, accept_encoding);
        if gzip {
            response = response.header("Content-Encoding", GZIP_ENCODING);
        }

        if request.method == Method::HEAD {
            // The gzip length is only known after encoding.
            return Ok(if gzip {
                response.without_length().build()
            } else {
                response
                    .header("Content-Length", resource.size.to_string())
                    .build()
            });
        }

        let mut file = File::open(&resource.path).map_err(|_| ServeError::NotFound)?;

        if gzip {
            let mut body = Vec::new();
            self.compressors.acquire().encode(&mut file, &mut body)?;
            Ok(response.body(body).build())
        } else {
            Ok(response.file(file, resource.size).build())
        }
    }

    fn serve_listing(&self, dir: &Path, url_path: &str) -> Result<Response> {
        let html = listing::render_directory(dir, url_path)?;

        Ok(ResponseBuilder::new(StatusCode::Ok)
            .header("Content-Type", LISTING_CONTENT_TYPE)
            .body(html.into_bytes())
            .build())
    }
}
