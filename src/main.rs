//! ShiftScribe CLI entry point

use std::process::ExitCode;

use clap::Parser;

use shift_scribe::cli::{
    app::{load_merged_config, run_dictation, run_fetch, run_health, run_submit, EXIT_ERROR},
    args::{Cli, Commands},
    config_cmd::handle_config_command,
    presenter::Presenter,
};
use shift_scribe::domain::config::AppConfig;
use shift_scribe::infrastructure::XdgConfigStore;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let presenter = Presenter::new();

    // Build CLI config from args
    let cli_config = AppConfig {
        api_key: None, // API key comes from env/file only
        backend_url: cli.backend_url.clone(),
        language: cli.language.clone(),
        clipboard: if cli.clipboard { Some(true) } else { None },
    };

    match cli.command {
        // Config subcommand never needs the merged config
        Some(Commands::Config { action }) => {
            let store = XdgConfigStore::new();
            if let Err(e) = handle_config_command(action, &store, &presenter).await {
                presenter.error(&e.to_string());
                return ExitCode::from(EXIT_ERROR);
            }
            ExitCode::SUCCESS
        }
        command => {
            let config = load_merged_config(cli_config).await;
            match command {
                Some(Commands::Dictate {
                    notes,
                    no_report,
                    report,
                }) => run_dictation(notes, no_report, report, config).await,
                Some(Commands::Submit { notes, report }) => {
                    run_submit(notes, report, config).await
                }
                Some(Commands::Fetch { session_id, report }) => {
                    run_fetch(&session_id, report, config).await
                }
                Some(Commands::Health) => run_health(config).await,
                Some(Commands::Config { .. }) => unreachable!(),
                None => run_dictation(None, false, Default::default(), config).await,
            }
        }
    }
}
