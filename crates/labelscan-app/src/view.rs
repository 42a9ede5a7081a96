// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{AnalysisOutcome, PLACEHOLDER_MESSAGE, UploadSession};

pub const SUBMIT_LABEL: &str = "2. Get AI Analysis";
pub const SUBMIT_LABEL_LOADING: &str = "Analyzing...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    Idle,
    FileSelected,
    Loading,
    Result,
}

/// What the results area shows. Exactly one at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultRegion {
    Placeholder(&'static str),
    ValidationError(String),
    Progress,
    RemoteError(String),
    Summary(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub mode: DisplayMode,
    pub region: ResultRegion,
    pub selected_file: Option<String>,
    pub submit_enabled: bool,
    pub submit_label: &'static str,
}

impl ViewState {
    pub fn project(session: &UploadSession, outcome: &AnalysisOutcome) -> Self {
        let file = session.file();

        let mode = match (outcome, file) {
            (AnalysisOutcome::Loading, _) => DisplayMode::Loading,
            (AnalysisOutcome::Success(_) | AnalysisOutcome::RemoteError(_), _) => {
                DisplayMode::Result
            }
            (AnalysisOutcome::Idle, Some(_)) => DisplayMode::FileSelected,
            (AnalysisOutcome::Idle, None) => DisplayMode::Idle,
        };

        let region = match (session.validation_error(), outcome) {
            (Some(message), _) => ResultRegion::ValidationError(message.to_owned()),
            (None, AnalysisOutcome::Loading) => ResultRegion::Progress,
            (None, AnalysisOutcome::RemoteError(message)) => {
                ResultRegion::RemoteError(message.clone())
            }
            (None, AnalysisOutcome::Success(summary)) => ResultRegion::Summary(summary.clone()),
            (None, AnalysisOutcome::Idle) => ResultRegion::Placeholder(PLACEHOLDER_MESSAGE),
        };

        let loading = outcome.is_loading();
        Self {
            mode,
            region,
            selected_file: file.map(|file| file.name.clone()),
            submit_enabled: file.is_some() && !loading,
            submit_label: if loading {
                SUBMIT_LABEL_LOADING
            } else {
                SUBMIT_LABEL
            },
        }
    }
}
