pub mod completions;
pub mod group;
pub mod layer;
pub mod man_pages;
pub mod query;
pub mod style;
pub mod workspace;

use geopub_core::{GeoError, GeoServerConfig};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_INPUT_ERROR: u8 = 2;
pub const EXIT_GUARD_FAILURE: u8 = 3;
pub const EXIT_TRANSPORT_ERROR: u8 = 4;

/// Connection settings given on the command line.
#[derive(Debug, Default)]
pub struct ConnectionArgs<'a> {
    pub config: Option<&'a Path>,
    pub url: Option<&'a str>,
    pub user: Option<&'a str>,
    pub password: Option<&'a str>,
}

/// Resolve the configuration: `--config`, else `--url` alone, else the default file.
/// Flags override what the file says.
pub fn load_config(args: &ConnectionArgs<'_>) -> Result<GeoServerConfig, String> {
    let mut config = match (args.config, args.url) {
        (Some(path), _) => GeoServerConfig::load(path),
        (None, Some(url)) => Ok(GeoServerConfig::new(url)),
        (None, None) => GeoServerConfig::load_default(),
    }
    .map_err(|e| format!("config error: {e}"))?;

    if let Some(url) = args.url {
        config.server.url = url.trim_end_matches('/').to_owned();
    }
    if let Some(user) = args.user {
        config.server.username = user.to_owned();
    }
    if let Some(password) = args.password {
        config.server.password = password.to_owned();
    }
    config.validate().map_err(|e| format!("config error: {e}"))?;
    Ok(config)
}

/// Exit code for an error message produced by a command.
pub fn exit_code_for(msg: &str) -> u8 {
    if msg.starts_with("invalid input:") || msg.starts_with("config error:") {
        EXIT_INPUT_ERROR
    } else if msg.starts_with("transport error:") {
        EXIT_TRANSPORT_ERROR
    } else if msg.contains(" not found: ") || msg.contains(" already exists: ") {
        EXIT_GUARD_FAILURE
    } else {
        EXIT_FAILURE
    }
}

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        pb.set_style(style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]));
    }
    pb.set_message(msg.to_owned());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn finish_style(pb: &ProgressBar) {
    if let Ok(style) = ProgressStyle::with_template("{msg}") {
        pb.set_style(style);
    }
}

pub fn spin_ok(pb: &ProgressBar, msg: &str) {
    finish_style(pb);
    pb.finish_with_message(format!("✓ {msg}"));
}

pub fn spin_fail(pb: &ProgressBar, msg: &str) {
    finish_style(pb);
    pb.finish_with_message(format!("✗ {msg}"));
}

pub fn colorize_bool(value: bool) -> String {
    use console::Style;
    if value {
        Style::new().green().apply_to("yes").to_string()
    } else {
        Style::new().yellow().apply_to("no").to_string()
    }
}

/// Run a mutating manager call behind a spinner and report its outcome.
///
/// `Ok(false)`, the server refusing the change, exits with `EXIT_FAILURE`.
pub fn run_mutation(
    action: &str,
    target: &str,
    json: bool,
    call: impl FnOnce() -> Result<bool, GeoError>,
) -> Result<u8, String> {
    let pb = spinner(&format!("{action} {target}…"));
    let accepted = call().map_err(|e| {
        spin_fail(&pb, &format!("{action} {target} failed"));
        e.to_string()
    })?;
    if accepted {
        spin_ok(&pb, &format!("{action} {target}"));
    } else {
        spin_fail(&pb, &format!("{action} {target}: rejected by server"));
    }

    if json {
        let payload = serde_json::json!({
            "action": action,
            "target": target,
            "accepted": accepted,
        });
        println!("{}", json_pretty(&payload)?);
    }
    Ok(if accepted { EXIT_SUCCESS } else { EXIT_FAILURE })
}
