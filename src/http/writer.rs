use std::time::SystemTime;

use anyhow::bail;
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::http::response::{Body, Response, StatusCode};

const HTTP_VERSION: &str = "HTTP/1.1";
const SERVER_NAME: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Status line and headers, up to and including the blank line.
fn serialize_head(resp: &Response, keep_alive: bool) -> Vec<u8> {
    let mut buf = Vec::with_capacity(256);

    // Status line
    let status_line = format!(
        "{} {} {}\r\n",
        HTTP_VERSION,
        resp.status.as_u16(),
        resp.status.reason_phrase()
    );
    buf.extend_from_slice(status_line.as_bytes());

    // Headers, sorted so the wire format is stable
    let mut headers: Vec<(&str, &str)> = resp
        .headers
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    headers.sort_unstable();

    let date = httpdate::fmt_http_date(SystemTime::now());
    let connection = if keep_alive { "keep-alive" } else { "close" };

    for (k, v) in headers
        .into_iter()
        .chain([("Date", date.as_str()), ("Server", SERVER_NAME), ("Connection", connection)])
    {
        buf.extend_from_slice(k.as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(v.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }

    // Header/body separator
    buf.extend_from_slice(b"\r\n");

    buf
}

/// Serialized head plus the body still to be sent.
///
/// The status is captured when the response is serialized so the access log
/// can read it back after the bytes are on the wire.
pub struct ResponseWriter {
    head: Vec<u8>,
    body: Option<Body>,
    written: u64,
    status: StatusCode,
}

impl ResponseWriter {
    /// `head_only` drops the body (HEAD requests); `keep_alive` selects the
    /// `Connection` header value.
    pub fn new(response: Response, head_only: bool, keep_alive: bool) -> Self {
        let head = serialize_head(&response, keep_alive);
        let body = if head_only || response.status.is_bodiless() {
            None
        } else {
            Some(response.body)
        };

        Self {
            head,
            body,
            written: 0,
            status: response.status,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    /// Sends the head, then the body. File bodies are copied in chunks. A
    /// file shorter than its announced length is an error.
    pub async fn write_to_stream<W>(&mut self, stream: &mut W) -> anyhow::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        stream.write_all(&self.head).await?;
        self.written += self.head.len() as u64;

        match self.body.take() {
            Some(Body::Bytes(bytes)) => {
                stream.write_all(&bytes).await?;
                self.written += bytes.len() as u64;
            }
            Some(Body::File { file, len }) => {
                let mut reader = tokio::fs::File::from_std(file).take(len);
                let copied = tokio::io::copy(&mut reader, stream).await?;
                self.written += copied;

                if copied < len {
                    bail!("file truncated after {copied} of {len} bytes");
                }
            }
            None => {}
        }

        stream.flush().await?;
        Ok(())
    }
}
