use std::net::SocketAddr;
use std::sync::Arc;

use bytes::{Buf, BytesMut};
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tracing::{debug, error, info};

use crate::files::Dispatcher;
use crate::http::parser::{parse_http_request, ParseError};
use crate::http::request::{Method, Request};
use crate::http::response::Response;
use crate::http::writer::ResponseWriter;

pub struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
    buffer: BytesMut,
    dispatcher: Arc<Dispatcher>,
    state: ConnectionState,
}

pub enum ConnectionState {
    Reading,
    Processing(Request),
    Writing(ResponseWriter, Request),
    /// Malformed input; answer once and close.
    Rejecting(ResponseWriter),
    Closed,
}

impl Connection {
    pub fn new(stream: TcpStream, peer: SocketAddr, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            stream,
            peer,
            buffer: BytesMut::with_capacity(4096),
            dispatcher,
            state: ConnectionState::Reading,
        }
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            match std::mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::Reading => {
                    self.state = match self.read_request().await? {
                        Ok(Some(req)) => ConnectionState::Processing(req),
                        Ok(None) => ConnectionState::Closed,
                        Err(e) => {
                            debug!(peer = %self.peer, error = ?e, "Rejecting malformed request");
                            ConnectionState::Rejecting(ResponseWriter::new(
                                Response::bad_request(),
                                false,
                                false,
                            ))
                        }
                    };
                }

                ConnectionState::Processing(req) => {
                    let response = self.handle_request(&req).await;
                    let writer = ResponseWriter::new(
                        response,
                        req.method == Method::HEAD,
                        req.keep_alive(),
                    );
                    self.state = ConnectionState::Writing(writer, req);
                }

                ConnectionState::Writing(mut writer, req) => {
                    writer.write_to_stream(&mut self.stream).await?;
                    self.log_access(&req, &writer);

                    if req.keep_alive() {
                        self.state = ConnectionState::Reading; // go back for next request
                    }
                }

                ConnectionState::Rejecting(mut writer) => {
                    writer.write_to_stream(&mut self.stream).await?;
                }

                ConnectionState::Closed => {
                    break;
                }
            }
        }

        Ok(())
    }

    /// Outer error: the socket failed. Inner error: the bytes are not HTTP.
    pub async fn read_request(&mut self) -> anyhow::Result<Result<Option<Request>, ParseError>> {
        loop {
            // Try parsing whatever we already have
            match parse_http_request(&self.buffer) {
                Ok((request, consumed)) => {
                    self.buffer.advance(consumed);
                    return Ok(Ok(Some(request)));
                }

                Err(ParseError::Incomplete) => {
                    // Need more data → fall through to read
                }

                Err(e) => return Ok(Err(e)),
            }

            let n = self.stream.read_buf(&mut self.buffer).await?;

            if n == 0 {
                // Client closed connection
                return Ok(Ok(None));
            }
        }
    }

    /// Runs the blocking file pipeline off the async workers.
    async fn handle_request(&self, req: &Request) -> Response {
        let dispatcher = Arc::clone(&self.dispatcher);
        let request = req.clone();

        respond_blocking(self.peer, &req.path, move || dispatcher.dispatch(&request)).await
    }

    fn log_access(&self, req: &Request, writer: &ResponseWriter) {
        info!(
            client = %self.peer.ip(),
            method = %req.method,
            path = %req.path,
            status = writer.status().as_u16(),
            bytes = writer.bytes_written(),
            referer = req.header("Referer").unwrap_or("-"),
            user_agent = req.header("User-Agent").unwrap_or("-"),
            "request"
        );
    }
}

/// Runs `task` on the blocking pool. A task that panics or is cancelled
/// becomes a 500 and the connection carries on.
async fn respond_blocking<F>(peer: SocketAddr, path: &str, task: F) -> Response
where
    F: FnOnce() -> Response + Send + 'static,
{
    match tokio::task::spawn_blocking(task).await {
        Ok(response) => response,
        Err(e) => {
            error!(peer = %peer, path = %path, "Request handler failed: {}", e);
            Response::internal_error()
        }
    }
}
