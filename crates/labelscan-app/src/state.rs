// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{
    AnalysisController, AnalysisOutcome, AnalysisResult, RequestId, Resolution, SelectedFile,
    SubmitDecision, UploadSession, ViewState,
};

#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub session: UploadSession,
    pub controller: AnalysisController,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    SelectFile(SelectedFile),
    Submit,
    Resolve {
        request_id: RequestId,
        result: AnalysisResult,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    FileSelected { name: String },
    OutcomeReset,
    RequestAbandoned { request_id: RequestId },
    SubmitIgnored,
    ValidationFailed(String),
    RequestIssued {
        request_id: RequestId,
        file: SelectedFile,
    },
    OutcomeResolved(AnalysisOutcome),
    StaleResponseDiscarded { request_id: RequestId },
}

impl AppState {
    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::SelectFile(file) => self.select_file(file),
            AppCommand::Submit => self.submit(),
            AppCommand::Resolve { request_id, result } => self.resolve(request_id, result),
        }
    }

    pub fn outcome(&self) -> &AnalysisOutcome {
        self.controller.outcome()
    }

    pub fn view(&self) -> ViewState {
        ViewState::project(&self.session, self.controller.outcome())
    }

    fn select_file(&mut self, file: SelectedFile) -> Vec<AppEvent> {
        let mut events = vec![AppEvent::FileSelected {
            name: file.name.clone(),
        }];
        self.session.select_file(file);

        let had_outcome = *self.controller.outcome() != AnalysisOutcome::Idle;
        if let Some(request_id) = self.controller.reset() {
            events.push(AppEvent::RequestAbandoned { request_id });
        }
        if had_outcome {
            events.push(AppEvent::OutcomeReset);
        }
        events
    }

    fn submit(&mut self) -> Vec<AppEvent> {
        match self.controller.submit(&mut self.session) {
            SubmitDecision::Ignored => vec![AppEvent::SubmitIgnored],
            SubmitDecision::Invalid(message) => vec![AppEvent::ValidationFailed(message)],
            SubmitDecision::Issue { request_id, file } => {
                vec![AppEvent::RequestIssued { request_id, file }]
            }
        }
    }

    fn resolve(&mut self, request_id: RequestId, result: AnalysisResult) -> Vec<AppEvent> {
        match self.controller.resolve(request_id, result) {
            Resolution::Applied => vec![AppEvent::OutcomeResolved(
                self.controller.outcome().clone(),
            )],
            Resolution::Stale => vec![AppEvent::StaleResponseDiscarded { request_id }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AppCommand, AppEvent, AppState};
    use crate::{
        AnalysisError, AnalysisOutcome, AnalysisReport, NO_FILE_SELECTED_MESSAGE, RequestId,
        SelectedFile,
    };

    fn file(name: &str) -> SelectedFile {
        SelectedFile::new(name, "image/jpeg", vec![0xFF, 0xD8])
    }

    fn issued_id(events: &[AppEvent]) -> RequestId {
        events
            .iter()
            .find_map(|event| match event {
                AppEvent::RequestIssued { request_id, .. } => Some(*request_id),
                _ => None,
            })
            .expect("request should be issued")
    }

    #[test]
    fn select_file_from_idle_only_reports_selection() {
        let mut state = AppState::default();

        let events = state.dispatch(AppCommand::SelectFile(file("a.jpg")));
        assert_eq!(
            events,
            vec![AppEvent::FileSelected {
                name: "a.jpg".to_owned()
            }]
        );
        assert_eq!(state.outcome(), &AnalysisOutcome::Idle);
    }

    #[test]
    fn submit_without_file_reports_validation_and_issues_nothing() {
        let mut state = AppState::default();

        let events = state.dispatch(AppCommand::Submit);
        assert_eq!(
            events,
            vec![AppEvent::ValidationFailed(
                NO_FILE_SELECTED_MESSAGE.to_owned()
            )]
        );
        assert_eq!(state.outcome(), &AnalysisOutcome::Idle);
        assert_eq!(
            state.session.validation_error(),
            Some(NO_FILE_SELECTED_MESSAGE)
        );
    }

    #[test]
    fn full_round_trip_resolves_to_success() {
        let mut state = AppState::default();
        state.dispatch(AppCommand::SelectFile(file("label.jpg")));

        let events = state.dispatch(AppCommand::Submit);
        let request_id = issued_id(&events);
        assert_eq!(state.outcome(), &AnalysisOutcome::Loading);

        let events = state.dispatch(AppCommand::Resolve {
            request_id,
            result: Ok(AnalysisReport::with_summary("Low sugar")),
        });
        assert_eq!(
            events,
            vec![AppEvent::OutcomeResolved(AnalysisOutcome::Success(
                "Low sugar".to_owned()
            ))]
        );
    }

    #[test]
    fn second_submit_while_loading_is_ignored() {
        let mut state = AppState::default();
        state.dispatch(AppCommand::SelectFile(file("label.jpg")));
        state.dispatch(AppCommand::Submit);

        let events = state.dispatch(AppCommand::Submit);
        assert_eq!(events, vec![AppEvent::SubmitIgnored]);
    }

    #[test]
    fn new_pick_while_loading_abandons_request_and_discards_late_result() {
        let mut state = AppState::default();
        state.dispatch(AppCommand::SelectFile(file("old.jpg")));
        let request_id = issued_id(&state.dispatch(AppCommand::Submit));

        let events = state.dispatch(AppCommand::SelectFile(file("new.jpg")));
        assert_eq!(
            events,
            vec![
                AppEvent::FileSelected {
                    name: "new.jpg".to_owned()
                },
                AppEvent::RequestAbandoned { request_id },
                AppEvent::OutcomeReset,
            ]
        );

        let events = state.dispatch(AppCommand::Resolve {
            request_id,
            result: Ok(AnalysisReport::with_summary("for old.jpg")),
        });
        assert_eq!(events, vec![AppEvent::StaleResponseDiscarded { request_id }]);
        assert_eq!(state.outcome(), &AnalysisOutcome::Idle);
        assert_eq!(
            state.session.file().map(|file| file.name.as_str()),
            Some("new.jpg")
        );
    }

    #[test]
    fn new_pick_after_error_resets_outcome() {
        let mut state = AppState::default();
        state.dispatch(AppCommand::SelectFile(file("a.jpg")));
        let request_id = issued_id(&state.dispatch(AppCommand::Submit));
        state.dispatch(AppCommand::Resolve {
            request_id,
            result: Err(AnalysisError::Remote("invalid image".to_owned())),
        });

        let events = state.dispatch(AppCommand::SelectFile(file("b.jpg")));
        assert!(events.contains(&AppEvent::OutcomeReset));
        assert!(
            !events
                .iter()
                .any(|event| matches!(event, AppEvent::RequestAbandoned { .. }))
        );
        assert_eq!(state.outcome(), &AnalysisOutcome::Idle);
    }

    #[test]
    fn any_pick_sequence_keeps_latest_file_and_idle_outcome() {
        let mut state = AppState::default();
        let names = ["one.png", "two.png", "three.png", "four.png"];
        for (index, name) in names.iter().enumerate() {
            state.dispatch(AppCommand::SelectFile(file(name)));
            assert_eq!(state.session.file(), Some(&file(name)));
            assert_eq!(state.outcome(), &AnalysisOutcome::Idle);
            if index % 2 == 0 {
                state.dispatch(AppCommand::Submit);
            }
        }
    }
}
