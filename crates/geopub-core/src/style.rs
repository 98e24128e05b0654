//! Two-call style upload.
//!
//! GeoServer's single-call registration does not reliably keep the raw SLD
//! body, so an upload registers the style (`POST ...styles?name=<n>&raw=true`)
//! and then overwrites it with the same body (`PUT ...styles/<n>?raw=true`).
//! Only the registration answer decides the outcome.

use crate::GeoError;
use geopub_rest::{rest_path, RestRequest, RestTransport, SLD_MEDIA_TYPE};
use std::fmt;
use std::path::Path;
use tracing::{debug, info, warn};

const SLD_MARKER: &str = ".sld";

/// Where a style lives: the global catalog or one workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleScope {
    Global,
    Workspace(String),
}

impl StyleScope {
    pub fn collection_path(&self) -> String {
        match self {
            StyleScope::Global => "styles".to_owned(),
            StyleScope::Workspace(ws) => rest_path(&["workspaces", ws, "styles"]),
        }
    }

    pub fn style_path(&self, name: &str) -> String {
        match self {
            StyleScope::Global => rest_path(&["styles", name]),
            StyleScope::Workspace(ws) => rest_path(&["workspaces", ws, "styles", name]),
        }
    }
}

impl fmt::Display for StyleScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StyleScope::Global => f.write_str("global"),
            StyleScope::Workspace(ws) => write!(f, "workspace {ws}"),
        }
    }
}

/// Flatten an SLD document into the quoted body the upload sends.
///
/// Lines are joined without a separator, runs of four and then two spaces are
/// dropped, and double quotes are backslash-escaped.
pub fn format_sld_body(document: &str) -> String {
    let joined: String = document.lines().collect();
    let compact = joined.replace("    ", "").replace("  ", "");
    format!("\"{}\"", compact.replace('"', "\\\""))
}

/// Style name for an SLD file: the file name up to the first `.sld`.
///
/// `roads.sld` gives `roads`; `old.sld.backup.sld` gives `old`.
pub fn derive_style_name(path: &Path) -> Result<String, GeoError> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| GeoError::InputError(format!("no file name in {}", path.display())))?;
    let name = file_name
        .split(SLD_MARKER)
        .next()
        .unwrap_or_default()
        .to_owned();
    validate_style_name(&name)?;
    Ok(name)
}

/// Reject names that cannot be placed in a request path or query.
pub fn validate_style_name(name: &str) -> Result<(), GeoError> {
    if name.is_empty() {
        return Err(GeoError::InputError("style name is empty".to_owned()));
    }
    if let Some(c) = name
        .chars()
        .find(|c| matches!(c, '/' | '?' | '#' | '&') || c.is_whitespace())
    {
        return Err(GeoError::InputError(format!(
            "style name '{name}' contains '{c}'"
        )));
    }
    Ok(())
}

fn style_request(request: RestRequest, body: &str) -> RestRequest {
    request
        .query("raw", "true")
        .body(SLD_MEDIA_TYPE, body.as_bytes().to_vec())
}

/// Register `name` in `scope` with the given SLD document, then finalize it.
///
/// Returns `true` when registration answered 2xx with the style name as its
/// body. The finalize call is sent either way and its status is ignored.
pub fn upload_style(
    transport: &dyn RestTransport,
    scope: &StyleScope,
    name: &str,
    document: &str,
) -> Result<bool, GeoError> {
    validate_style_name(name)?;
    let body = format_sld_body(document);

    let register = style_request(
        RestRequest::post(scope.collection_path()).query("name", name),
        &body,
    );
    let resp = transport.execute(&register)?;
    let answer: String = resp.text().lines().collect();
    let registered = resp.is_success() && answer == name;

    let finalize = style_request(RestRequest::put(scope.style_path(name)), &body);
    let final_resp = transport.execute(&finalize)?;
    debug!("finalize style {name}: HTTP {}", final_resp.status);

    if registered {
        info!("registered style {name} ({scope})");
    } else {
        warn!(
            "style {name} ({scope}) not registered: HTTP {} {answer}",
            resp.status
        );
    }
    Ok(registered)
}
