//! Config command handler

use crate::application::ports::ConfigStore;
use crate::domain::error::ConfigError;

use super::args::{is_valid_config_key, ConfigAction, VALID_CONFIG_KEYS};
use super::presenter::Presenter;

/// Handle config subcommand
pub async fn handle_config_command<S: ConfigStore>(
    action: ConfigAction,
    store: &S,
    presenter: &Presenter,
) -> Result<(), ConfigError> {
    match action {
        ConfigAction::Init => handle_init(store, presenter).await,
        ConfigAction::Set { key, value } => handle_set(store, presenter, &key, &value).await,
        ConfigAction::Get { key } => handle_get(store, presenter, &key).await,
        ConfigAction::List => handle_list(store, presenter).await,
        ConfigAction::Path => handle_path(store, presenter),
    }
}

fn unknown_key(key: &str) -> ConfigError {
    ConfigError::ValidationError {
        key: key.to_string(),
        message: format!("Unknown key. Valid keys: {}", VALID_CONFIG_KEYS.join(", ")),
    }
}

async fn handle_init<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    store.init().await?;
    presenter.success(&format!(
        "Config file created at: {}",
        store.path().display()
    ));
    Ok(())
}

async fn handle_set<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    if !is_valid_config_key(key) {
        return Err(unknown_key(key));
    }

    let mut config = store.load().await?;

    match key {
        "api_key" => config.api_key = Some(value.to_string()),
        "backend_url" => {
            if !value.starts_with("http://") && !value.starts_with("https://") {
                return Err(ConfigError::ValidationError {
                    key: key.to_string(),
                    message: "Value must be an http(s) URL".to_string(),
                });
            }
            config.backend_url = Some(value.to_string());
        }
        "language" => config.language = Some(value.to_string()),
        "clipboard" => {
            config.clipboard = Some(parse_bool(value).map_err(|_| ConfigError::ValidationError {
                key: key.to_string(),
                message: "Value must be 'true' or 'false'".to_string(),
            })?)
        }
        _ => unreachable!(), // Already validated
    }

    store.save(&config).await?;
    presenter.success(&format!("{} = {}", key, value));

    Ok(())
}

async fn handle_get<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
) -> Result<(), ConfigError> {
    if !is_valid_config_key(key) {
        return Err(unknown_key(key));
    }

    let config = store.load().await?;

    let value = match key {
        "api_key" => config.api_key.map(|s| mask_api_key(&s)),
        "backend_url" => config.backend_url,
        "language" => config.language,
        "clipboard" => config.clipboard.map(|b| b.to_string()),
        _ => unreachable!(),
    };

    match value {
        Some(v) => presenter.output(&v),
        None => presenter.output("(not set)"),
    }

    Ok(())
}

async fn handle_list<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    let config = store.load().await?;

    presenter.key_value(
        "api_key",
        &config
            .api_key
            .map(|s| mask_api_key(&s))
            .unwrap_or_else(|| "(not set)".to_string()),
    );
    presenter.key_value(
        "backend_url",
        config.backend_url.as_deref().unwrap_or("(not set)"),
    );
    presenter.key_value(
        "language",
        config.language.as_deref().unwrap_or("(not set)"),
    );
    presenter.key_value(
        "clipboard",
        &config
            .clipboard
            .map(|b| b.to_string())
            .unwrap_or_else(|| "(not set)".to_string()),
    );

    Ok(())
}

fn handle_path<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    presenter.output(&store.path().display().to_string());
    Ok(())
}

/// Parse a boolean config value
fn parse_bool(value: &str) -> Result<bool, ()> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(()),
    }
}

/// Mask an API key for display, keeping only a short prefix
fn mask_api_key(key: &str) -> String {
    if key.len() <= 6 {
        "*".repeat(key.len())
    } else {
        format!("{}...{}", &key[..4], "*".repeat(4))
    }
}
