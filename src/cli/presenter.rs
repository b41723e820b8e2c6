//! CLI presenter for output formatting

use std::io::{self, Write};

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use crate::application::{ControllerSnapshot, PlaybackSnapshot};
use crate::domain::report::HandoverReport;
use crate::domain::session::DictationStatus;

/// Presenter for CLI output formatting
pub struct Presenter {
    spinner: Option<ProgressBar>,
}

impl Presenter {
    /// Create a new presenter
    pub fn new() -> Self {
        Self { spinner: None }
    }

    /// Start a spinner with message
    pub fn start_spinner(&mut self, message: &str) {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
                .template("{spinner:.cyan} {msg}")
                .unwrap(),
        );
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        self.spinner = Some(spinner);
    }

    /// Mark spinner as success and finish
    pub fn spinner_success(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_with_message(format!("{} {}", "✓".green(), message));
        }
    }

    /// Mark spinner as failed and finish
    pub fn spinner_fail(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_with_message(format!("{} {}", "✗".red(), message));
        }
    }

    /// Print info message to stderr
    pub fn info(&self, message: &str) {
        eprintln!("{} {}", "ℹ".cyan(), message);
    }

    /// Print success message to stderr
    pub fn success(&self, message: &str) {
        eprintln!("{} {}", "✓".green(), message);
    }

    /// Print warning message to stderr
    pub fn warn(&self, message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Print error message to stderr
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Output text to stdout (the actual report/notes output)
    pub fn output(&self, text: &str) {
        println!("{}", text);
    }

    /// Print a key-value pair (for config list)
    pub fn key_value(&self, key: &str, value: &str) {
        println!("{}: {}", key.cyan(), value);
    }

    /// Redraw the single-line dictation status
    pub fn dictation_status(&self, snapshot: &ControllerSnapshot) {
        let line = Self::format_status(snapshot);
        eprint!("\r\x1b[2K{}", line);
        let _ = io::stderr().flush();
    }

    /// Finish the status line so following output starts clean
    pub fn end_status_line(&self) {
        eprintln!();
    }

    /// Format the one-line dictation status
    pub fn format_status(snapshot: &ControllerSnapshot) -> String {
        match snapshot.status {
            DictationStatus::Recording => {
                let mut line = format!(
                    "{} rec {} | {}",
                    "●".red(),
                    Self::format_clock(snapshot.elapsed_seconds),
                    snapshot.captured_size,
                );
                if snapshot.degraded {
                    line.push_str(&format!(" | {}", "no live text".yellow()));
                } else if !snapshot.transcript_interim.is_empty() {
                    line.push_str(&format!(" | {}", snapshot.transcript_interim.dimmed()));
                }
                line
            }
            DictationStatus::Playing | DictationStatus::Paused => {
                match snapshot.playback.as_ref() {
                    Some(playback) => format!(
                        "{} {}",
                        if snapshot.status == DictationStatus::Playing {
                            "▶".cyan().to_string()
                        } else {
                            "⏸".to_string()
                        },
                        Self::format_playback(playback),
                    ),
                    None => snapshot.status.to_string(),
                }
            }
            status => status.to_string(),
        }
    }

    /// Format a playback transport bar
    pub fn format_playback(playback: &PlaybackSnapshot) -> String {
        if playback.is_preparing {
            return "preparing...".to_string();
        }

        let bar_width = 20usize;
        let filled = ((playback.progress_fraction * bar_width as f64) as usize).min(bar_width);
        let empty = bar_width - filled;

        format!(
            "[{}{}] {} / {}{}",
            "█".repeat(filled).cyan(),
            "░".repeat(empty),
            Self::format_clock(playback.position_seconds as u64),
            Self::format_clock(playback.duration_seconds as u64),
            if playback.completed { " (ended)" } else { "" },
        )
    }

    /// Format whole seconds as m:ss
    pub fn format_clock(total_seconds: u64) -> String {
        format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
    }

    /// Print a generated report: markdown to stdout, summary to stderr
    pub fn report(&self, report: &HandoverReport) {
        self.output(&report.markdown);

        if let Some(session_id) = &report.session_id {
            self.info(&format!("Session: {}", session_id));
        }
        if !report.summary.open_issues.is_empty() {
            self.info(&format!(
                "Open issues: {}",
                report
                    .summary
                    .open_issues
                    .iter()
                    .map(|issue| format!("{} ({})", issue.issue, issue.priority))
                    .collect::<Vec<_>>()
                    .join("; ")
            ));
        }
    }
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(status: DictationStatus) -> ControllerSnapshot {
        ControllerSnapshot {
            status,
            elapsed_seconds: 72,
            transcript_interim: String::new(),
            notes_text: String::new(),
            captured_size: "1.0 KB".to_string(),
            degraded: false,
            playback: None,
        }
    }

    #[test]
    fn format_clock_pads_seconds() {
        assert_eq!(Presenter::format_clock(0), "0:00");
        assert_eq!(Presenter::format_clock(72), "1:12");
        assert_eq!(Presenter::format_clock(600), "10:00");
    }

    #[test]
    fn recording_status_shows_elapsed_and_size() {
        let line = Presenter::format_status(&snapshot(DictationStatus::Recording));
        assert!(line.contains("1:12"));
        assert!(line.contains("1.0 KB"));
    }

    #[test]
    fn recording_status_shows_interim_text() {
        let mut snapshot = snapshot(DictationStatus::Recording);
        snapshot.transcript_interim = "pump is running".to_string();
        let line = Presenter::format_status(&snapshot);
        assert!(line.contains("pump is running"));
    }

    #[test]
    fn playback_bar_reflects_progress() {
        let playback = PlaybackSnapshot {
            position_seconds: 6.0,
            duration_seconds: 12.0,
            is_playing: true,
            is_preparing: false,
            completed: false,
            progress_fraction: 0.5,
        };
        let bar = Presenter::format_playback(&playback);
        assert!(bar.contains("0:06 / 0:12"));
        assert!(!bar.contains("ended"));
    }

    #[test]
    fn playback_bar_marks_completion() {
        let playback = PlaybackSnapshot {
            position_seconds: 12.0,
            duration_seconds: 12.0,
            is_playing: false,
            is_preparing: false,
            completed: true,
            progress_fraction: 1.0,
        };
        assert!(Presenter::format_playback(&playback).contains("ended"));
    }

    #[test]
    fn preparing_playback_has_no_bar() {
        let playback = PlaybackSnapshot {
            position_seconds: 0.0,
            duration_seconds: 0.0,
            is_playing: false,
            is_preparing: true,
            completed: false,
            progress_fraction: 0.0,
        };
        assert_eq!(Presenter::format_playback(&playback), "preparing...");
    }
}
