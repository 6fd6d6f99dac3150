//! Client for the MOSS submission socket protocol.
//!
//! A session is: `moss <id>`, `directory`, `X`, `maxmatches`, `show`,
//! `language` (answered with `yes`/`no`), one `file` record per upload
//! (base files use id 0, submissions ids 1..N), `query 0 <comment>`
//! (answered with the report URL) and finally `end`.

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::path::Path;
use std::time::Duration;

use log::{debug, info};

use super::error::MossError;
use super::types::SubmissionRequest;
use super::UrlGenerator;
use crate::config::MossConfig;

pub struct MossClient {
    server: String,
    port: u16,
    connect_timeout: Duration,
    read_timeout: Duration,
    experimental: bool,
}

impl MossClient {
    pub fn new(server: impl Into<String>, port: u16) -> Self {
        Self {
            server: server.into(),
            port,
            connect_timeout: Duration::from_secs(30),
            read_timeout: Duration::from_secs(600),
            experimental: false,
        }
    }

    pub fn from_config(config: &MossConfig) -> Self {
        Self {
            server: config.server.clone(),
            port: config.port,
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
            read_timeout: Duration::from_secs(config.read_timeout_secs),
            experimental: config.experimental,
        }
    }

    pub fn with_timeouts(mut self, connect: Duration, read: Duration) -> Self {
        self.connect_timeout = connect;
        self.read_timeout = read;
        self
    }

    fn connect(&self) -> Result<TcpStream, MossError> {
        let endpoint = format!("{}:{}", self.server, self.port);
        let addrs = (self.server.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| MossError::recoverable(format!("failed to resolve {}: {}", endpoint, e)))?;

        let mut last_error = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, self.connect_timeout) {
                Ok(stream) => {
                    stream
                        .set_read_timeout(Some(self.read_timeout))
                        .and_then(|_| stream.set_write_timeout(Some(self.read_timeout)))
                        .map_err(|e| MossError::from_socket("configure socket", &e))?;
                    return Ok(stream);
                }
                Err(e) => last_error = Some(e),
            }
        }

        Err(match last_error {
            Some(e) => MossError::recoverable(format!("connect to {} failed: {}", endpoint, e)),
            None => MossError::recoverable(format!("no address found for {}", endpoint)),
        })
    }

    fn run_session(
        &self,
        stream: &mut TcpStream,
        request: &SubmissionRequest,
    ) -> Result<String, MossError> {
        let reader = stream
            .try_clone()
            .map_err(|e| MossError::from_socket("clone socket", &e))?;
        let mut reader = BufReader::new(reader);

        let header = format!(
            "moss {}\ndirectory 0\nX {}\nmaxmatches {}\nshow {}\nlanguage {}\n",
            request.user_id,
            u8::from(self.experimental),
            request.max_until_ignored,
            request.max_displayed_matches,
            request.language,
        );
        send(stream, header.as_bytes())?;

        let answer = read_line(&mut reader, "language answer")?;
        match answer.as_str() {
            "yes" => {}
            "no" => {
                let _ = stream.write_all(b"end\n");
                return Err(MossError::fatal(format!(
                    "language '{}' not accepted by server",
                    request.language
                )));
            }
            "" => return Err(MossError::recoverable("server closed the session early")),
            other => {
                return Err(MossError::fatal(format!(
                    "unexpected answer to language: {}",
                    other
                )))
            }
        }

        for path in &request.base_files {
            self.upload_file(stream, path, 0, request)?;
        }
        for (index, path) in request.files.iter().enumerate() {
            self.upload_file(stream, path, index + 1, request)?;
        }

        send(stream, format!("query 0 {}\n", request.comment).as_bytes())?;
        info!(
            "Uploaded {} base files and {} submissions, waiting for MOSS",
            request.base_files.len(),
            request.files.len()
        );

        let url = read_line(&mut reader, "query answer")?;
        let _ = stream.write_all(b"end\n");

        if url.is_empty() {
            return Err(MossError::recoverable("empty response to query"));
        }
        if !url.starts_with("http") {
            return Err(MossError::fatal(format!("server answered: {}", url)));
        }
        Ok(url)
    }

    fn upload_file(
        &self,
        stream: &mut TcpStream,
        path: &Path,
        file_id: usize,
        request: &SubmissionRequest,
    ) -> Result<(), MossError> {
        let content = std::fs::read(path).map_err(|e| {
            MossError::fatal(format!("cannot read '{}': {}", path.display(), e))
        })?;
        let name = display_name(path, request.use_basename);

        debug!("Uploading {} as file {} ({} bytes)", name, file_id, content.len());

        let header = format!(
            "file {} {} {} {}\n",
            file_id,
            request.language,
            content.len(),
            name
        );
        send(stream, header.as_bytes())?;
        send(stream, &content)
    }
}

impl UrlGenerator for MossClient {
    fn generate_url(&self, request: &SubmissionRequest) -> Result<String, MossError> {
        if request.files.is_empty() {
            return Err(MossError::fatal("no submission files in request"));
        }
        let mut stream = self.connect()?;
        self.run_session(&mut stream, request)
    }
}

/// Name sent to MOSS for `path`.
pub fn display_name(path: &Path, use_basename: bool) -> String {
    let name = if use_basename {
        path.file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string())
    } else {
        path.to_string_lossy().to_string()
    };
    wire_name(&name)
}

/// MOSS splits headers on whitespace, so spaces in names become `_`.
/// Reports list files under this form.
pub fn wire_name(name: &str) -> String {
    name.replace(' ', "_")
}

fn send(stream: &mut TcpStream, bytes: &[u8]) -> Result<(), MossError> {
    stream
        .write_all(bytes)
        .map_err(|e| MossError::from_socket("write to MOSS", &e))
}

fn read_line(reader: &mut impl BufRead, what: &str) -> Result<String, MossError> {
    let mut line = String::new();
    reader
        .read_line(&mut line)
        .map_err(|e| MossError::from_socket(what, &e))?;
    Ok(line.trim().to_string())
}
