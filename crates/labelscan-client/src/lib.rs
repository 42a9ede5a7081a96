// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use labelscan_app::{AnalysisError, AnalysisReport, AnalysisResult, SelectedFile};
use reqwest::StatusCode;
use reqwest::blocking::Client as HttpClient;
use reqwest::blocking::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Endpoint baked in at build time from `LABELSCAN_ENDPOINT`.
pub const DEFAULT_ENDPOINT: &str = env!("LABELSCAN_ENDPOINT");

/// Multipart field the analysis service reads the image from.
pub const IMAGE_FIELD: &str = "image_file";

#[derive(Debug, Clone)]
pub struct Client {
    endpoint: String,
    http: HttpClient,
}

impl Client {
    pub fn new(endpoint: &str) -> Result<Self> {
        let endpoint = validate_endpoint(endpoint)?.to_string();
        // Requests run to completion; the blocking client otherwise stops at 30s.
        let http = HttpClient::builder()
            .timeout(None::<Duration>)
            .build()
            .context("build HTTP client")?;

        Ok(Self { endpoint, http })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Sends one image and interprets the reply. Blocks until the transport
    /// delivers a response or fails; never retries.
    pub fn analyze(&self, file: &SelectedFile) -> AnalysisResult {
        let form = image_form(file)?;
        tracing::info!(
            endpoint = %self.endpoint,
            file = %file.name,
            bytes = file.size(),
            "sending image for analysis"
        );

        let response = self
            .http
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .map_err(|error| transport_error(&self.endpoint, &error))?;

        let status = response.status();
        tracing::debug!(status = status.as_u16(), "analysis response received");
        if !status.is_success() {
            let body = match response.text() {
                Ok(body) => body,
                Err(error) => {
                    tracing::debug!(%error, "failed to read error response body");
                    String::new()
                }
            };
            let error = remote_error_response(status, &body);
            tracing::warn!(status = status.as_u16(), %error, "analysis rejected by backend");
            return Err(error);
        }

        let body = response
            .text()
            .map_err(|error| transport_error(&self.endpoint, &error))?;
        parse_report(&body)
    }
}

pub fn validate_endpoint(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        bail!("backend.endpoint must not be empty");
    }

    let url = Url::parse(trimmed)
        .with_context(|| format!("backend.endpoint {trimmed:?} is not a valid URL"))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(anyhow!(
            "backend.endpoint {trimmed:?} must use http or https, got {}",
            url.scheme()
        ));
    }
    if url.host_str().is_none_or(str::is_empty) {
        bail!("backend.endpoint {trimmed:?} has no host");
    }
    Ok(url)
}

fn image_form(file: &SelectedFile) -> Result<Form, AnalysisError> {
    let part = Part::bytes(file.bytes.clone())
        .file_name(file.name.clone())
        .mime_str(&file.mime_type)
        .map_err(|error| {
            AnalysisError::Transport(format!("invalid MIME type {:?}: {error}", file.mime_type))
        })?;
    Ok(Form::new().part(IMAGE_FIELD, part))
}

fn transport_error(endpoint: &str, error: &reqwest::Error) -> AnalysisError {
    let cause = error_chain(error);
    tracing::error!(%endpoint, %cause, "analysis request failed");
    AnalysisError::Transport(cause)
}

fn error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut parts = vec![error.to_string()];
    let mut source = error.source();
    while let Some(next) = source {
        let text = next.to_string();
        if !parts.iter().any(|part| part.contains(&text)) {
            parts.push(text);
        }
        source = next.source();
    }
    parts.join(": ")
}

fn remote_error_response(status: StatusCode, body: &str) -> AnalysisError {
    if let Some(detail) = detail_message(body) {
        return AnalysisError::Remote(detail);
    }

    // reqwest exposes only the registered reason phrase; unregistered codes get none.
    let reason = status.canonical_reason().unwrap_or_default();
    AnalysisError::Remote(
        format!("HTTP Error: {} {reason}", status.as_u16())
            .trim_end()
            .to_owned(),
    )
}

fn detail_message(body: &str) -> Option<String> {
    let envelope: ErrorEnvelope = serde_json::from_str(body).ok()?;
    match envelope.detail? {
        Value::String(detail) if !detail.is_empty() => Some(detail),
        Value::Array(entries) => {
            let messages = entries
                .iter()
                .filter_map(|entry| entry.get("msg").and_then(Value::as_str))
                .filter(|message| !message.is_empty())
                .collect::<Vec<&str>>();
            if messages.is_empty() {
                None
            } else {
                Some(messages.join("; "))
            }
        }
        _ => None,
    }
}

fn parse_report(body: &str) -> AnalysisResult {
    let parsed: AnalysisBody = serde_json::from_str(body).map_err(|error| {
        tracing::error!(%error, "analysis response is not valid JSON");
        AnalysisError::Transport(format!("decode analysis response: {error}"))
    })?;
    Ok(AnalysisReport {
        summary: parsed.llm_analysis_summary,
    })
}

#[derive(Debug, Deserialize)]
struct AnalysisBody {
    #[serde(default)]
    llm_analysis_summary: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    detail: Option<Value>,
}
