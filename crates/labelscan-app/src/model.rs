// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use std::fmt;
use std::fs;
use std::path::Path;

pub const NO_FILE_SELECTED_MESSAGE: &str = "Please select an image file first to upload.";
pub const EMPTY_SUMMARY_MESSAGE: &str = "Analysis completed but no summary was generated.";
pub const PLACEHOLDER_MESSAGE: &str = "Upload an image of a nutritional fact panel to get started.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    Gif,
    Webp,
    Bmp,
    Heic,
    Tiff,
}

impl ImageKind {
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::Webp => "image/webp",
            Self::Bmp => "image/bmp",
            Self::Heic => "image/heic",
            Self::Tiff => "image/tiff",
        }
    }

    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "gif" => Some(Self::Gif),
            "webp" => Some(Self::Webp),
            "bmp" => Some(Self::Bmp),
            "heic" | "heif" => Some(Self::Heic),
            "tif" | "tiff" => Some(Self::Tiff),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|extension| extension.to_str())
            .and_then(Self::from_extension)
    }
}

/// A picked image: raw bytes plus the name and MIME type sent with them.
#[derive(Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Reads an image from disk, applying the picker's image-only filter.
    pub fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| anyhow!("{} has no usable file name", path.display()))?
            .to_owned();

        let Some(kind) = ImageKind::from_path(path) else {
            bail!(
                "{} is not an image -- pick a jpg, png, gif, webp, bmp, heic or tiff file",
                path.display()
            );
        };

        if path.is_dir() {
            bail!("{} is a directory -- pick an image file", path.display());
        }

        let bytes = fs::read(path).with_context(|| {
            format!(
                "read image {} -- check the path and file permissions",
                path.display()
            )
        })?;

        Ok(Self::new(name, kind.mime_type(), bytes))
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

impl fmt::Debug for SelectedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedFile")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AnalysisOutcome {
    #[default]
    Idle,
    Loading,
    Success(String),
    RemoteError(String),
}

impl AnalysisOutcome {
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub const fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Success(_) => "success",
            Self::RemoteError(_) => "remote error",
        }
    }
}

/// Decoded body of a successful analysis response.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AnalysisReport {
    pub summary: Option<String>,
}

impl AnalysisReport {
    pub fn with_summary(summary: impl Into<String>) -> Self {
        Self {
            summary: Some(summary.into()),
        }
    }

    /// Text to show for this report; an empty report still counts as success.
    pub fn summary_text(&self) -> String {
        match self.summary.as_deref() {
            Some(summary) if !summary.is_empty() => summary.to_owned(),
            _ => EMPTY_SUMMARY_MESSAGE.to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// The service answered with a failure status.
    Remote(String),
    /// No usable response: connection failure or undecodable body.
    Transport(String),
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote(message) => f.write_str(message),
            Self::Transport(cause) => {
                write!(
                    f,
                    "Failed to analyze image: {cause}. Ensure backend is running."
                )
            }
        }
    }
}

impl std::error::Error for AnalysisError {}

pub type AnalysisResult = std::result::Result<AnalysisReport, AnalysisError>;
