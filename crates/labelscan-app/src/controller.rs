// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{
    AnalysisOutcome, AnalysisResult, RequestId, RequestIdSequence, SelectedFile, UploadSession,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitDecision {
    /// A request is already outstanding.
    Ignored,
    /// No file selected; nothing was sent.
    Invalid(String),
    /// The caller must send `file` and report back under `request_id`.
    Issue {
        request_id: RequestId,
        file: SelectedFile,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Applied,
    Stale,
}

/// Owns the analysis outcome and the identity of the one in-flight request.
#[derive(Debug, Clone, Default)]
pub struct AnalysisController {
    outcome: AnalysisOutcome,
    in_flight: Option<RequestId>,
    ids: RequestIdSequence,
}

impl AnalysisController {
    pub fn outcome(&self) -> &AnalysisOutcome {
        &self.outcome
    }

    pub fn in_flight(&self) -> Option<RequestId> {
        self.in_flight
    }

    pub fn submit(&mut self, session: &mut UploadSession) -> SubmitDecision {
        if self.outcome.is_loading() {
            return SubmitDecision::Ignored;
        }

        let file = match session.validate_for_submit() {
            Ok(file) => file.clone(),
            Err(message) => {
                self.outcome = AnalysisOutcome::Idle;
                return SubmitDecision::Invalid(message.to_owned());
            }
        };

        let request_id = self.ids.next_id();
        self.outcome = AnalysisOutcome::Loading;
        self.in_flight = Some(request_id);
        SubmitDecision::Issue { request_id, file }
    }

    pub fn resolve(&mut self, request_id: RequestId, result: AnalysisResult) -> Resolution {
        if self.in_flight != Some(request_id) {
            return Resolution::Stale;
        }

        self.in_flight = None;
        self.outcome = match result {
            Ok(report) => AnalysisOutcome::Success(report.summary_text()),
            Err(error) => AnalysisOutcome::RemoteError(error.to_string()),
        };
        Resolution::Applied
    }

    /// Drops any result or pending request; returns the abandoned request.
    pub fn reset(&mut self) -> Option<RequestId> {
        self.outcome = AnalysisOutcome::Idle;
        self.in_flight.take()
    }
}
