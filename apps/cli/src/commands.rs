//! CLI command implementations

use crate::output::{format_duration, print_output};
use crate::progress::DownloadSpinner;
use crate::{ConfigAction, OutputFormat};
use anyhow::{anyhow, bail, Result};
use chrono::DateTime;
use console::style;
use qnlink_core::{ConfigStore, QnlinkCore};
use qnlink_types::{Settings, Timestamp};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

// ============================================================================
// Link Commands
// ============================================================================

#[derive(Serialize)]
struct Link {
    url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    expires_in: Option<i64>,
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}

pub fn sign_url(
    core: &QnlinkCore,
    url: &str,
    expires: Option<i64>,
    format: OutputFormat,
) -> Result<()> {
    let expires_in = expires.unwrap_or(core.settings().default_expire_secs);
    let link = Link {
        url: core.sign_url(url, Some(expires_in))?,
        expires_in: Some(expires_in),
    };
    print_output(&link, format)
}

pub fn anti_leech_url(
    core: &QnlinkCore,
    url: &str,
    key: &str,
    expires: Option<i64>,
    deadline: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let link = match deadline {
        Some(deadline) => {
            let deadline = DateTime::parse_from_rfc3339(&deadline)
                .map_err(|e| anyhow!("Invalid deadline {:?}: {}", deadline, e))?;
            Link {
                url: core.anti_leech_url_until(url, key, &deadline)?,
                expires_in: None,
            }
        }
        None => {
            let expires_in = expires.unwrap_or(core.settings().default_expire_secs);
            Link {
                url: core.anti_leech_url(url, key, Some(expires_in))?,
                expires_in: Some(expires_in),
            }
        }
    };
    print_output(&link, format)
}

// ============================================================================
// Timestamp Commands
// ============================================================================

#[derive(Serialize)]
struct TimestampInfo {
    timestamp: i64,
    hex: String,
    local_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    seconds_from_now: Option<i64>,
}

impl fmt::Display for TimestampInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Timestamp:  {} (0x{})", self.timestamp, self.hex)?;
        write!(f, "Local time: {}", self.local_time)?;
        if let Some(seconds) = self.seconds_from_now {
            write!(f, "\nFrom now:   {}", format_duration(seconds))?;
        }
        Ok(())
    }
}

pub fn timestamp(
    core: &QnlinkCore,
    after: Option<i64>,
    decode: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let info = match decode {
        Some(raw) => {
            let timestamp: Timestamp = raw.parse()?;
            let local = core.decode_timestamp(timestamp)?;
            TimestampInfo {
                timestamp: timestamp.as_secs(),
                hex: timestamp.to_hex(),
                local_time: local.to_string(),
                seconds_from_now: Some(timestamp.as_secs() - core.expire_after(0).as_secs()),
            }
        }
        None => {
            let seconds = after.unwrap_or(core.settings().default_expire_secs);
            let timestamp = core.expire_after(seconds);
            TimestampInfo {
                timestamp: timestamp.as_secs(),
                hex: timestamp.to_hex(),
                local_time: core.decode_timestamp(timestamp)?.to_string(),
                seconds_from_now: Some(seconds),
            }
        }
    };
    print_output(&info, format)
}

// ============================================================================
// Download Commands
// ============================================================================

pub async fn download(
    core: &QnlinkCore,
    url: &str,
    output: PathBuf,
    sign: bool,
    expires: Option<i64>,
    format: OutputFormat,
) -> Result<()> {
    let url = if sign {
        core.sign_url(url, expires)?
    } else {
        url.to_string()
    };

    let spinner = match format {
        OutputFormat::Human => Some(DownloadSpinner::start(&output.display().to_string())),
        OutputFormat::Json => None,
    };

    let result = core.download(&url, &output).await?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        OutputFormat::Human => {
            if let Some(spinner) = spinner {
                spinner.finish(&result);
            }
            eprint!("{}", result.log);
        }
    }

    if !result.is_ok() {
        bail!("Download failed with code {}", result.code);
    }
    Ok(())
}

// ============================================================================
// Config Commands
// ============================================================================

fn mask(secret: &str) -> String {
    if secret.is_empty() {
        "(not set)".to_string()
    } else {
        format!("{}****", secret.chars().take(4).collect::<String>())
    }
}

pub async fn config_action(
    config_path: &Path,
    action: Option<ConfigAction>,
    format: OutputFormat,
) -> Result<()> {
    let store = ConfigStore::new(config_path);

    match action {
        None | Some(ConfigAction::Show) => {
            let settings = store.load().await?;

            match format {
                OutputFormat::Json => {
                    let masked = Settings {
                        secret_key: mask(&settings.secret_key),
                        ..settings
                    };
                    println!("{}", serde_json::to_string_pretty(&masked)?);
                }
                OutputFormat::Human => {
                    println!("qnlink Configuration ({}):", store.path().display());
                    println!();
                    println!("  Access key: {}", settings.access_key);
                    println!("  Secret key: {}", mask(&settings.secret_key));
                    println!(
                        "  Default expiry: {}",
                        format_duration(settings.default_expire_secs)
                    );
                    println!("  User agent: {}", settings.user_agent);
                    println!("  Connect timeout: {}s", settings.connect_timeout_secs);
                    println!("  Request timeout: {}s", settings.request_timeout_secs);
                }
            }
        }

        Some(ConfigAction::Get { key }) => {
            let settings = store.load().await?;
            let value = match key.as_str() {
                "access_key" => settings.access_key,
                "secret_key" => mask(&settings.secret_key),
                "default_expire_secs" => settings.default_expire_secs.to_string(),
                "user_agent" => settings.user_agent,
                "connect_timeout_secs" => settings.connect_timeout_secs.to_string(),
                "request_timeout_secs" => settings.request_timeout_secs.to_string(),
                _ => return Err(anyhow!("Unknown config key: {}", key)),
            };
            println!("{}", value);
        }

        Some(ConfigAction::Set { key, value }) => {
            let mut settings = store.load().await?;

            match key.as_str() {
                "access_key" => settings.access_key = value,
                "secret_key" => settings.secret_key = value,
                "default_expire_secs" => settings.default_expire_secs = value.parse()?,
                "user_agent" => settings.user_agent = value,
                "connect_timeout_secs" => settings.connect_timeout_secs = value.parse()?,
                "request_timeout_secs" => settings.request_timeout_secs = value.parse()?,
                _ => return Err(anyhow!("Unknown config key: {}", key)),
            }

            store.save(&settings).await?;
            println!("{} Config updated", style("✓").green().bold());
        }

        Some(ConfigAction::Reset) => {
            store.reset().await?;
            println!("{} Settings reset to defaults", style("✓").green().bold());
        }
    }

    Ok(())
}
