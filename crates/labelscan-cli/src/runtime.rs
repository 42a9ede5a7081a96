// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use labelscan_app::{
    AnalysisOutcome, AnalysisResult, AppCommand, AppEvent, AppState, RequestId, SelectedFile,
};
use labelscan_client::Client;
use labelscan_tui::{AppRuntime, InternalEvent};
use std::path::Path;
use std::sync::mpsc::Sender;
use std::thread;

pub struct HttpRuntime {
    client: Client,
}

impl HttpRuntime {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl AppRuntime for HttpRuntime {
    fn load_file(&mut self, path: &Path) -> Result<SelectedFile> {
        SelectedFile::from_path(path)
    }

    fn analyze(&mut self, file: &SelectedFile) -> AnalysisResult {
        self.client.analyze(file)
    }

    fn spawn_analysis(
        &mut self,
        request_id: RequestId,
        file: SelectedFile,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let client = self.client.clone();
        thread::Builder::new()
            .name(format!("analysis-{}", request_id.get()))
            .spawn(move || {
                let result = client.analyze(&file);
                if tx
                    .send(InternalEvent::AnalysisFinished { request_id, result })
                    .is_err()
                {
                    tracing::debug!(%request_id, "ui closed before analysis finished");
                }
            })
            .context("spawn analysis worker")?;
        Ok(())
    }
}

/// Picks `path`, submits it and waits for the outcome on the calling thread.
/// Returns the summary text, or the user-facing error message as the error.
pub fn analyze_once<R: AppRuntime>(runtime: &mut R, path: &Path) -> Result<String> {
    let file = runtime.load_file(path)?;
    let mut state = AppState::default();
    state.dispatch(AppCommand::SelectFile(file));

    let events = state.dispatch(AppCommand::Submit);
    let Some((request_id, file)) = events.into_iter().find_map(|event| match event {
        AppEvent::RequestIssued { request_id, file } => Some((request_id, file)),
        _ => None,
    }) else {
        bail!("analysis was not started for {}", path.display());
    };

    let result = runtime.analyze(&file);
    state.dispatch(AppCommand::Resolve { request_id, result });
    match state.outcome() {
        AnalysisOutcome::Success(summary) => Ok(summary.clone()),
        AnalysisOutcome::RemoteError(message) => Err(anyhow!("{message}")),
        other => Err(anyhow!(
            "analysis ended in unexpected state {}",
            other.label()
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::{HttpRuntime, analyze_once};
    use anyhow::Result;
    use labelscan_app::{EMPTY_SUMMARY_MESSAGE, RequestId};
    use labelscan_client::Client;
    use labelscan_testkit::{
        CLOSED_ENDPOINT, MockBackend, MockReply, sample_file, sample_image_dir,
    };
    use labelscan_tui::{AppRuntime, InternalEvent};
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn load_file_reads_image_from_disk() -> Result<()> {
        let (_temp, path) = sample_image_dir()?;
        let mut runtime = HttpRuntime::new(Client::new(CLOSED_ENDPOINT)?);
        let file = runtime.load_file(&path)?;
        assert_eq!(file.name, "label.png");
        assert_eq!(file.mime_type, "image/png");
        Ok(())
    }

    #[test]
    fn load_file_rejects_non_images() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("notes.txt");
        std::fs::write(&path, "hello")?;
        let mut runtime = HttpRuntime::new(Client::new(CLOSED_ENDPOINT)?);
        let error = runtime.load_file(&path).expect_err("text file should fail");
        assert!(error.to_string().contains("is not an image"));
        Ok(())
    }

    #[test]
    fn spawned_analysis_reports_back_on_channel() -> Result<()> {
        let backend = MockBackend::start(vec![MockReply::json(
            200,
            r#"{"llm_analysis_summary":"Low sugar"}"#,
        )])?;
        let mut runtime = HttpRuntime::new(Client::new(backend.url())?);
        let (tx, rx) = mpsc::channel();

        runtime.spawn_analysis(RequestId::new(7), sample_file("label.png"), tx)?;
        let event = rx.recv_timeout(Duration::from_secs(10))?;
        let InternalEvent::AnalysisFinished { request_id, result } = event else {
            panic!("expected analysis result, got {event:?}");
        };
        assert_eq!(request_id, RequestId::new(7));
        assert_eq!(
            result.map(|report| report.summary_text()),
            Ok("Low sugar".to_owned())
        );

        backend.finish()?;
        Ok(())
    }

    #[test]
    fn spawned_analysis_tolerates_closed_receiver() -> Result<()> {
        let backend = MockBackend::start(vec![MockReply::json(200, "{}")])?;
        let mut runtime = HttpRuntime::new(Client::new(backend.url())?);
        let (tx, rx) = mpsc::channel();
        drop(rx);

        runtime.spawn_analysis(RequestId::new(1), sample_file("label.png"), tx)?;
        backend.finish()?;
        Ok(())
    }

    #[test]
    fn analyze_once_prints_summary_or_fallback() -> Result<()> {
        let (_temp, path) = sample_image_dir()?;
        let backend = MockBackend::start(vec![
            MockReply::json(200, r#"{"llm_analysis_summary":"High protein"}"#),
            MockReply::json(200, "{}"),
        ])?;
        let mut runtime = HttpRuntime::new(Client::new(backend.url())?);

        assert_eq!(analyze_once(&mut runtime, &path)?, "High protein");
        assert_eq!(analyze_once(&mut runtime, &path)?, EMPTY_SUMMARY_MESSAGE);

        backend.finish()?;
        Ok(())
    }

    #[test]
    fn analyze_once_surfaces_backend_and_transport_errors() -> Result<()> {
        let (_temp, path) = sample_image_dir()?;
        let backend =
            MockBackend::start(vec![MockReply::json(422, r#"{"detail":"invalid image"}"#)])?;
        let mut runtime = HttpRuntime::new(Client::new(backend.url())?);
        let error = analyze_once(&mut runtime, &path).expect_err("422 should fail");
        assert_eq!(error.to_string(), "invalid image");
        backend.finish()?;

        let mut closed = HttpRuntime::new(Client::new(CLOSED_ENDPOINT)?);
        let error = analyze_once(&mut closed, &path).expect_err("closed port should fail");
        assert!(error.to_string().ends_with("Ensure backend is running."));
        Ok(())
    }
}
