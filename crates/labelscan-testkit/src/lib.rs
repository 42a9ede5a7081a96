// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use labelscan_app::SelectedFile;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tiny_http::{Header, Response, Server};

/// A port nothing listens on; requests to it fail at connect time.
pub const CLOSED_ENDPOINT: &str = "http://127.0.0.1:1/analyze";

/// Smallest valid PNG: one transparent pixel.
pub const SAMPLE_PNG: [u8; 67] = [
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

pub fn sample_file(name: &str) -> SelectedFile {
    SelectedFile::new(name, "image/png", SAMPLE_PNG.to_vec())
}

pub fn write_sample_image(dir: &Path, name: &str) -> Result<PathBuf> {
    let path = dir.join(name);
    fs::write(&path, SAMPLE_PNG)
        .with_context(|| format!("write sample image {}", path.display()))?;
    Ok(path)
}

/// Temp dir holding `label.png`; keep the `TempDir` alive while using the path.
pub fn sample_image_dir() -> Result<(tempfile::TempDir, PathBuf)> {
    let temp = tempfile::tempdir().context("create temp dir")?;
    let path = write_sample_image(temp.path(), "label.png")?;
    Ok((temp, path))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockReply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
    /// Time the server waits after reading the request before answering.
    pub delay: Duration,
}

impl MockReply {
    pub fn json(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: body.to_owned(),
            delay: Duration::ZERO,
        }
    }

    pub fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: "text/plain",
            body: body.to_owned(),
            delay: Duration::ZERO,
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub url: String,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    /// `name="..."` values of every multipart part, in order.
    pub fn multipart_field_names(&self) -> Vec<String> {
        let text = String::from_utf8_lossy(&self.body);
        text.lines()
            .filter(|line| {
                line.to_ascii_lowercase()
                    .starts_with("content-disposition: form-data")
            })
            .filter_map(|line| quoted_attribute(line, "name"))
            .collect()
    }

    pub fn multipart_file_names(&self) -> Vec<String> {
        let text = String::from_utf8_lossy(&self.body);
        text.lines()
            .filter_map(|line| quoted_attribute(line, "filename"))
            .collect()
    }

    pub fn body_contains(&self, needle: &[u8]) -> bool {
        !needle.is_empty()
            && self
                .body
                .windows(needle.len())
                .any(|window| window == needle)
    }
}

fn quoted_attribute(line: &str, attribute: &str) -> Option<String> {
    line.split(';').map(str::trim).find_map(|segment| {
        let value = segment.strip_prefix(attribute)?.strip_prefix("=\"")?;
        value.strip_suffix('"').map(str::to_owned)
    })
}

/// Local HTTP server that answers with scripted replies, one per request,
/// and records what it received.
pub struct MockBackend {
    url: String,
    server: Arc<Server>,
    handle: Option<JoinHandle<Result<Vec<RecordedRequest>>>>,
}

impl MockBackend {
    pub fn start(replies: Vec<MockReply>) -> Result<Self> {
        let server = Server::http("127.0.0.1:0")
            .map_err(|error| anyhow!("start mock backend: {error}"))?;
        let server = Arc::new(server);
        let url = format!("http://{}/analyze", server.server_addr());

        let worker = Arc::clone(&server);
        let handle = thread::spawn(move || serve(&worker, replies));

        Ok(Self {
            url,
            server,
            handle: Some(handle),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Waits for every scripted reply to be served.
    pub fn finish(mut self) -> Result<Vec<RecordedRequest>> {
        let handle = self
            .handle
            .take()
            .ok_or_else(|| anyhow!("mock backend already finished"))?;
        handle
            .join()
            .map_err(|_| anyhow!("mock backend thread panicked"))?
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.server.unblock();
        }
    }
}

fn serve(server: &Server, replies: Vec<MockReply>) -> Result<Vec<RecordedRequest>> {
    let expected = replies.len();
    let mut recorded = Vec::with_capacity(expected);
    for reply in replies {
        let mut request = server.recv().with_context(|| {
            format!(
                "mock backend stopped after {} of {expected} requests",
                recorded.len()
            )
        })?;

        let mut body = Vec::new();
        request
            .as_reader()
            .read_to_end(&mut body)
            .context("read mock request body")?;
        let content_type = request
            .headers()
            .iter()
            .find(|header| header.field.equiv("Content-Type"))
            .map(|header| header.value.as_str().to_owned());
        recorded.push(RecordedRequest {
            method: request.method().to_string(),
            url: request.url().to_owned(),
            content_type,
            body,
        });

        if !reply.delay.is_zero() {
            thread::sleep(reply.delay);
        }

        let header = Header::from_bytes("Content-Type", reply.content_type)
            .map_err(|()| anyhow!("invalid content type {:?}", reply.content_type))?;
        let response = Response::from_string(reply.body)
            .with_status_code(reply.status)
            .with_header(header);
        request
            .respond(response)
            .context("send mock response")?;
    }
    Ok(recorded)
}
