use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::content::generator;
use crate::content::resolver::{ResolvedSource, Resolver};
use crate::http::parser::{parse_http_request, ParseError};
use crate::http::request::{Method, Request};
use crate::http::response::{Response, StatusCode};
use crate::http::writer::ResponseWriter;

/// One accepted connection, serving exactly one request.
pub struct Connection<S> {
    stream: S,
    peer: String,
    buffer: Vec<u8>,
    state: ConnectionState,
    resolver: Arc<Resolver>,
    read_timeout: Duration,
}

pub enum ConnectionState {
    Reading,
    Received(Request),
    Resolving { path: String },
    Generating { path: String, source: ResolvedSource },
    Writing(ResponseWriter),
    Closed,
}

enum ReadOutcome {
    Request(Request),
    Malformed(ParseError),
    Eof,
    TimedOut,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// `read_timeout` bounds the whole wait for the request line and
    /// headers; a client that has not finished by then gets `408`.
    pub fn new(
        stream: S,
        peer: impl Into<String>,
        resolver: Arc<Resolver>,
        read_timeout: Duration,
    ) -> Self {
        Self {
            stream,
            peer: peer.into(),
            buffer: Vec::with_capacity(1024),
            state: ConnectionState::Reading,
            resolver,
            read_timeout,
        }
    }

    /// Drives the connection to `Closed`.
    ///
    /// Resolution and generation failures are answered with `500` here.
    /// Only read and write errors on the socket itself are returned.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            match std::mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::Reading => {
                    let outcome = match tokio::time::timeout(self.read_timeout, self.read_request()).await {
                        Ok(outcome) => outcome?,
                        Err(_) => ReadOutcome::TimedOut,
                    };
                    self.state = match outcome {
                        ReadOutcome::Request(req) => ConnectionState::Received(req),
                        ReadOutcome::Malformed(e) => {
                            tracing::warn!(peer = %self.peer, error = ?e, "Malformed request");
                            ConnectionState::Writing(ResponseWriter::new(&Response::bad_request()))
                        }
                        ReadOutcome::TimedOut => {
                            tracing::debug!(peer = %self.peer, timeout = ?self.read_timeout, "Request not received in time");
                            ConnectionState::Writing(ResponseWriter::new(&Response::empty(StatusCode::RequestTimeout)))
                        }
                        ReadOutcome::Eof => ConnectionState::Closed,
                    };
                }

                ConnectionState::Received(req) => {
                    self.state = if req.method != Method::GET {
                        tracing::debug!(peer = %self.peer, method = ?req.method, path = %req.path, "Ignoring non-GET request");
                        ConnectionState::Writing(ResponseWriter::new(&Response::empty(StatusCode::Ok)))
                    } else {
                        match req.target_path() {
                            Ok(path) => ConnectionState::Resolving { path },
                            Err(e) => {
                                tracing::warn!(peer = %self.peer, path = %req.path, error = %e, "Unusable request target");
                                ConnectionState::Writing(ResponseWriter::new(&Response::bad_request()))
                            }
                        }
                    };
                }

                ConnectionState::Resolving { path } => {
                    self.state = match self.resolver.resolve(&path).await {
                        Ok(source) => ConnectionState::Generating { path, source },
                        Err(e) => {
                            tracing::error!(peer = %self.peer, path = %path, error = %e, "Failed to resolve request");
                            let response = Response::from(generator::ResponsePayload::internal_error());
                            ConnectionState::Writing(ResponseWriter::new(&response))
                        }
                    };
                }

                ConnectionState::Generating { path, source } => {
                    let payload = generator::generate(source, self.resolver.random().as_ref()).await;
                    tracing::debug!(
                        peer = %self.peer,
                        path = %path,
                        status = payload.status.as_u16(),
                        bytes = payload.body.len(),
                        "Request handled"
                    );
                    let response = Response::from(payload);
                    self.state = ConnectionState::Writing(ResponseWriter::new(&response));
                }

                ConnectionState::Writing(mut writer) => {
                    writer.write_to_stream(&mut self.stream).await?;
                    self.state = ConnectionState::Closed;
                }

                ConnectionState::Closed => {
                    // Peer may already be gone; the socket is released on drop either way.
                    let _ = self.stream.shutdown().await;
                    break;
                }
            }
        }

        Ok(())
    }

    async fn read_request(&mut self) -> anyhow::Result<ReadOutcome> {
        loop {
            match parse_http_request(&self.buffer) {
                Ok((request, consumed)) => {
                    self.buffer.drain(..consumed);
                    return Ok(ReadOutcome::Request(request));
                }

                Err(ParseError::Incomplete) => {}

                Err(e) => return Ok(ReadOutcome::Malformed(e)),
            }

            let mut temp = [0u8; 1024];
            let n = self.stream.read(&mut temp).await?;

            if n == 0 {
                return Ok(ReadOutcome::Eof);
            }

            self.buffer.extend_from_slice(&temp[..n]);
        }
    }
}
