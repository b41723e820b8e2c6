//! Main app runners
//!
//! Wires the adapters to the dictation controller and drives it from an
//! interactive command loop: one `select!` multiplexes operator commands
//! from stdin with capability notifications, so the controller sees a
//! single serialized stream of inputs.

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::application::ports::{Clipboard, ConfigStore, ReportGateway};
use crate::application::{ControllerEvent, DictationController};
use crate::domain::config::AppConfig;
use crate::domain::report::{markdown::render_html, Attachments, HandoverReport};
use crate::domain::session::DictationStatus;
use crate::infrastructure::{
    ArboardClipboard, CpalCapture, GeminiTranscriber, HttpReportGateway, RodioPlayer,
    XdgConfigStore,
};

use super::args::ReportOptions;
use super::presenter::Presenter;

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

/// Load file config and apply CLI overrides on top
pub async fn load_merged_config(cli_config: AppConfig) -> AppConfig {
    let store = XdgConfigStore::new();
    let file_config = store.load().await.unwrap_or_else(|_| AppConfig::empty());
    file_config.merge(cli_config)
}

/// Get the transcription API key from environment or config.
/// A missing key is not fatal: dictation degrades to audio-only.
pub fn get_api_key(config: &AppConfig) -> Option<String> {
    if let Ok(key) = env::var("GEMINI_API_KEY") {
        if !key.is_empty() {
            return Some(key);
        }
    }
    config.api_key.clone()
}

/// Read and validate attachments from the option paths
async fn load_attachments(options: &ReportOptions) -> Result<Attachments, String> {
    let mut attachments = Attachments::default();

    if let Some(path) = &options.alarms {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read alarms file: {}", e))?;
        attachments.alarms = Some(
            serde_json::from_str(&text)
                .map_err(|e| format!("Alarms file contains invalid JSON: {}", e))?,
        );
    }

    if let Some(path) = &options.trends {
        attachments.trends_csv = Some(
            tokio::fs::read_to_string(path)
                .await
                .map_err(|e| format!("Failed to read trends file: {}", e))?,
        );
    }

    Ok(attachments)
}

/// Write the report to the requested export files
async fn export_report(
    report: &HandoverReport,
    options: &ReportOptions,
    presenter: &Presenter,
) -> Result<(), String> {
    if let Some(path) = &options.output {
        tokio::fs::write(path, &report.markdown)
            .await
            .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;
        presenter.success(&format!("Report written to {}", path.display()));
    }

    if let Some(path) = &options.html {
        tokio::fs::write(path, render_html(&report.markdown))
            .await
            .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;
        presenter.success(&format!("HTML written to {}", path.display()));
    }

    Ok(())
}

/// Generate, present, export, and optionally copy a report
async fn deliver_report(
    notes: &str,
    attachments: &Attachments,
    options: &ReportOptions,
    config: &AppConfig,
    presenter: &mut Presenter,
) -> Result<(), String> {
    let gateway = HttpReportGateway::new(config.backend_url_or_default());

    presenter.start_spinner("Generating handover report...");
    let report = match gateway.generate(notes, attachments).await {
        Ok(report) => {
            presenter.spinner_success("Handover report ready");
            report
        }
        Err(e) => {
            presenter.spinner_fail("Report generation failed");
            return Err(e.to_string());
        }
    };

    presenter.report(&report);
    export_report(&report, options, presenter).await?;

    if config.clipboard_or_default() {
        match ArboardClipboard::new().copy(&report.markdown).await {
            Ok(()) => presenter.info("Copied to clipboard"),
            Err(e) => presenter.warn(&format!("Clipboard copy failed: {}", e)),
        }
    }

    Ok(())
}

/// What the command loop decided to do next
enum Flow {
    Continue,
    Submit,
    Quit,
}

fn print_dictation_help(presenter: &Presenter) {
    presenter.info("Commands: start, stop, cancel, play, pause, seek <percent>, replay, confirm, clear, submit, quit");
}

/// Run the interactive dictation session
pub async fn run_dictation(
    notes_file: Option<PathBuf>,
    no_report: bool,
    options: ReportOptions,
    config: AppConfig,
) -> ExitCode {
    let mut presenter = Presenter::new();

    let initial_notes = match &notes_file {
        Some(path) => match tokio::fs::read_to_string(path).await {
            Ok(text) => text,
            Err(e) => {
                presenter.error(&format!("Failed to read notes file: {}", e));
                return ExitCode::from(EXIT_USAGE_ERROR);
            }
        },
        None => String::new(),
    };

    let attachments = match load_attachments(&options).await {
        Ok(attachments) => attachments,
        Err(e) => {
            presenter.error(&e);
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
    };

    let api_key = get_api_key(&config);
    if api_key.is_none() {
        presenter.warn(
            "No transcription API key configured; recording will run without live text",
        );
    }

    let (events_tx, mut events_rx) = mpsc::channel::<ControllerEvent>(64);
    let mut controller = DictationController::new(
        CpalCapture::new(),
        GeminiTranscriber::new(
            api_key.unwrap_or_default(),
            config.language_or_default().to_string(),
        ),
        RodioPlayer::new(),
        initial_notes,
        events_tx,
    );

    print_dictation_help(&presenter);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let flow = loop {
        tokio::select! {
            Some(event) = events_rx.recv() => {
                controller.handle_event(event);
                presenter.dictation_status(&controller.snapshot());
            }

            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    // stdin closed; abandon anything still running
                    Ok(None) | Err(_) => break Flow::Quit,
                };
                presenter.end_status_line();
                match handle_command(line.trim(), &mut controller, &presenter).await {
                    Flow::Continue => {
                        presenter.dictation_status(&controller.snapshot());
                    }
                    flow => break flow,
                }
            }
        }
    };

    presenter.end_status_line();

    match flow {
        Flow::Quit | Flow::Continue => {
            if controller.status() != DictationStatus::Idle
                && controller.status() != DictationStatus::Confirmed
            {
                let _ = controller.cancel_recording().await;
            }
            ExitCode::from(EXIT_SUCCESS)
        }
        Flow::Submit => {
            let notes = controller.notes_text().to_string();
            if no_report {
                presenter.output(&notes);
                return ExitCode::from(EXIT_SUCCESS);
            }
            match deliver_report(&notes, &attachments, &options, &config, &mut presenter).await
            {
                Ok(()) => ExitCode::from(EXIT_SUCCESS),
                Err(e) => {
                    presenter.error(&e);
                    ExitCode::from(EXIT_ERROR)
                }
            }
        }
    }
}

/// Apply one operator command to the controller
async fn handle_command(
    line: &str,
    controller: &mut DictationController<CpalCapture, GeminiTranscriber, RodioPlayer>,
    presenter: &Presenter,
) -> Flow {
    let mut parts = line.split_whitespace();
    let command = parts.next().unwrap_or("");
    let argument = parts.next();

    let result = match command {
        "" | "status" => Ok(()),
        "help" | "?" => {
            print_dictation_help(presenter);
            Ok(())
        }
        "start" => {
            let result = controller.start_recording().await;
            if result.is_ok() && controller.snapshot().degraded {
                presenter.warn("Live transcription unavailable; recording continues");
            }
            result
        }
        "stop" => controller.stop_recording().await,
        "cancel" => controller.cancel_recording().await,
        "play" => controller.play().await,
        "pause" => controller.pause().await,
        "toggle" => controller.toggle_play_pause().await,
        "replay" => controller.replay().await,
        "seek" => match argument.and_then(|a| a.parse::<f64>().ok()) {
            Some(percent) => controller.seek(percent / 100.0).await,
            None => {
                presenter.warn("Usage: seek <percent>");
                Ok(())
            }
        },
        "confirm" => controller.confirm().await,
        "clear" => controller.clear().await,
        "submit" | "done" => {
            match controller.status() {
                DictationStatus::Confirmed => return Flow::Submit,
                DictationStatus::Idle if !controller.notes_text().trim().is_empty() => {
                    return Flow::Submit
                }
                DictationStatus::Idle => {
                    presenter.warn("Nothing to submit; dictate or type notes first");
                    Ok(())
                }
                _ => {
                    presenter.warn("Confirm or cancel the recording before submitting");
                    Ok(())
                }
            }
        }
        "quit" | "q" | "exit" => return Flow::Quit,
        other => {
            presenter.warn(&format!("Unknown command: {}", other));
            Ok(())
        }
    };

    if let Err(e) = result {
        presenter.error(&e.to_string());
    }
    Flow::Continue
}

/// Submit notes from a file or stdin without recording
pub async fn run_submit(
    notes_file: Option<PathBuf>,
    options: ReportOptions,
    config: AppConfig,
) -> ExitCode {
    let mut presenter = Presenter::new();

    let notes = match notes_file {
        Some(path) => match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) => {
                presenter.error(&format!("Failed to read notes file: {}", e));
                return ExitCode::from(EXIT_USAGE_ERROR);
            }
        },
        None => {
            let mut text = String::new();
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                text.push_str(&line);
                text.push('\n');
            }
            text
        }
    };

    if notes.trim().is_empty() {
        presenter.error("No shift notes provided");
        return ExitCode::from(EXIT_USAGE_ERROR);
    }

    let attachments = match load_attachments(&options).await {
        Ok(attachments) => attachments,
        Err(e) => {
            presenter.error(&e);
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
    };

    match deliver_report(&notes, &attachments, &options, &config, &mut presenter).await {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(e) => {
            presenter.error(&e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Fetch a stored report by session id
pub async fn run_fetch(session_id: &str, options: ReportOptions, config: AppConfig) -> ExitCode {
    let mut presenter = Presenter::new();
    let gateway = HttpReportGateway::new(config.backend_url_or_default());

    match gateway.fetch(session_id).await {
        Ok(report) => {
            presenter.report(&report);
            if let Err(e) = export_report(&report, &options, &presenter).await {
                presenter.error(&e);
                return ExitCode::from(EXIT_ERROR);
            }
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            presenter.error(&e.to_string());
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Probe the handover service
pub async fn run_health(config: AppConfig) -> ExitCode {
    let presenter = Presenter::new();
    let gateway = HttpReportGateway::new(config.backend_url_or_default());

    match gateway.health().await {
        Ok(()) => {
            presenter.success(&format!(
                "Handover service reachable at {}",
                config.backend_url_or_default()
            ));
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            presenter.error(&format!("Handover service unavailable: {}", e));
            ExitCode::from(EXIT_ERROR)
        }
    }
}
