//! CLI argument definitions using Clap

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// ShiftScribe - voice-dictated shift notes with AI handover reports
#[derive(Parser, Debug)]
#[command(name = "shift-scribe")]
#[command(version = "1.0.0")]
#[command(about = "Dictate shift notes by voice and generate AI handover reports")]
#[command(long_about = None)]
pub struct Cli {
    /// Handover service base URL
    #[arg(long, value_name = "URL", global = true)]
    pub backend_url: Option<String>,

    /// Transcription language hint (e.g., en, de)
    #[arg(short = 'l', long, value_name = "LANG", global = true)]
    pub language: Option<String>,

    /// Copy the generated report markdown to the clipboard
    #[arg(short = 'c', long, global = true)]
    pub clipboard: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Attachment and export options shared by report-producing commands
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ReportOptions {
    /// Alarm system export (JSON) to attach
    #[arg(long, value_name = "FILE")]
    pub alarms: Option<PathBuf>,

    /// Historian trend export (CSV) to attach
    #[arg(long, value_name = "FILE")]
    pub trends: Option<PathBuf>,

    /// Write the report markdown to this file
    #[arg(short = 'o', long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Write the report rendered as HTML to this file
    #[arg(long, value_name = "FILE")]
    pub html: Option<PathBuf>,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Dictate shift notes interactively, then generate a handover report
    Dictate {
        /// Start from notes already written to a file
        #[arg(long, value_name = "FILE")]
        notes: Option<PathBuf>,

        /// Confirm notes without generating a report
        #[arg(long)]
        no_report: bool,

        #[command(flatten)]
        report: ReportOptions,
    },

    /// Submit written notes without recording
    Submit {
        /// Notes file; reads stdin when omitted
        #[arg(value_name = "FILE")]
        notes: Option<PathBuf>,

        #[command(flatten)]
        report: ReportOptions,
    },

    /// Fetch a stored report by its session id
    Fetch {
        /// Session id returned by a previous generate
        session_id: String,

        #[command(flatten)]
        report: ReportOptions,
    },

    /// Check handover service availability
    Health,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

/// Valid configuration keys
pub const VALID_CONFIG_KEYS: &[&str] = &["api_key", "backend_url", "language", "clipboard"];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_dictate_with_attachments() {
        let cli = Cli::try_parse_from([
            "shift-scribe",
            "dictate",
            "--alarms",
            "alarms.json",
            "--trends",
            "trends.csv",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::Dictate { report, .. }) => {
                assert_eq!(report.alarms, Some(PathBuf::from("alarms.json")));
                assert_eq!(report.trends, Some(PathBuf::from("trends.csv")));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn cli_parses_fetch() {
        let cli = Cli::try_parse_from(["shift-scribe", "fetch", "abc-123"]).unwrap();
        match cli.command {
            Some(Commands::Fetch { session_id, .. }) => assert_eq!(session_id, "abc-123"),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn config_key_validation() {
        assert!(is_valid_config_key("api_key"));
        assert!(is_valid_config_key("backend_url"));
        assert!(!is_valid_config_key("keystroke"));
    }
}
