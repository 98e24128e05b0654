//! Inbound publishing endpoint.
//!
//! `POST /geoserver` takes `zipFilePath`, `storeName`, `styleType` and
//! `coordinateSystem` as a form-encoded body or query string and publishes the
//! archive into the vector workspace through
//! [`GeoServerManager::publish_shp`]. The answer is a JSON boolean. Errors are
//! not translated: any failure is a plain 500 carrying the error text.
//!
//! The [`TestServer`] helper starts a server on a random port for integration testing.

use geopub_core::{GeoServerManager, ShpPublishRequest};
use std::sync::Arc;
use tiny_http::{Header, Method, Response, Server, StatusCode};
use tracing::{debug, error, info};

/// Fields of a publish request, as sent by the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishForm {
    pub zip_file_path: String,
    pub store_name: String,
    pub style_type: Option<String>,
    pub coordinate_system: Option<String>,
}

impl PublishForm {
    /// Build from decoded `key=value` pairs. Later pairs win.
    pub fn from_pairs(pairs: &[(String, String)]) -> Result<Self, String> {
        let field = |key: &str| {
            pairs
                .iter()
                .rev()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };
        Ok(Self {
            zip_file_path: field("zipFilePath").ok_or("missing zipFilePath")?,
            store_name: field("storeName").ok_or("missing storeName")?,
            style_type: field("styleType"),
            coordinate_system: field("coordinateSystem"),
        })
    }

    pub fn to_request(&self, workspace: &str) -> ShpPublishRequest {
        let mut request = ShpPublishRequest::new(workspace, &self.store_name, &self.zip_file_path);
        if let Some(ref style) = self.style_type {
            request = request.with_style(style);
        }
        if let Some(ref crs) = self.coordinate_system {
            request = request.with_crs(crs);
        }
        request
    }
}

/// Decode an `application/x-www-form-urlencoded` string into pairs.
pub fn parse_form(input: &str) -> Vec<(String, String)> {
    input
        .split('&')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let (key, value) = part.split_once('=').unwrap_or((part, ""));
            (decode_component(key), decode_component(value))
        })
        .collect()
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced,
    }
}

fn respond_err(req: tiny_http::Request, code: u16, msg: &str) {
    let _ = req.respond(Response::from_string(msg).with_status_code(StatusCode(code)));
}

fn respond_json(req: tiny_http::Request, json: impl Into<Vec<u8>>) {
    let Ok(header) = Header::from_bytes("Content-Type", "application/json") else {
        return;
    };
    let _ = req.respond(Response::from_data(json.into()).with_header(header));
}

fn read_body(req: &mut tiny_http::Request) -> Option<String> {
    let mut body = String::new();
    if req.as_reader().read_to_string(&mut body).is_ok() {
        Some(body)
    } else {
        None
    }
}

fn handle_publish(manager: &GeoServerManager, mut req: tiny_http::Request, query: &str) {
    let Some(body) = read_body(&mut req) else {
        respond_err(req, 400, "unreadable request body");
        return;
    };
    let mut pairs = parse_form(query);
    pairs.extend(parse_form(&body));

    let form = match PublishForm::from_pairs(&pairs) {
        Ok(form) => form,
        Err(msg) => {
            respond_err(req, 400, msg.as_str());
            return;
        }
    };

    let request = form.to_request(manager.config().vector_workspace());
    match manager.publish_shp(&request) {
        Ok(published) => {
            info!(
                "publish {} as {}/{}: {published}",
                form.zip_file_path, request.workspace, request.store
            );
            respond_json(req, published.to_string());
        }
        Err(e) => {
            error!("publish {}: {e}", form.zip_file_path);
            respond_err(req, 500, &e.to_string());
        }
    }
}

/// Handle a single HTTP request, dispatching to the appropriate route handler.
pub fn handle_request(manager: &GeoServerManager, req: tiny_http::Request) {
    let method = req.method().clone();
    let url = req.url().to_owned();
    debug!("{method} {url}");

    let (path, query) = url.split_once('?').unwrap_or((url.as_str(), ""));
    match (path, &method) {
        ("/geoserver", Method::Post) => handle_publish(manager, req, query),
        ("/geoserver", _) => respond_err(req, 405, "method not allowed"),
        ("/health", Method::Get) => respond_json(req, r#"{"status":"ok"}"#),
        _ => respond_err(req, 404, "not found"),
    }
}

/// Start the server loop, blocking the current thread.
pub fn run_server(
    manager: &Arc<GeoServerManager>,
    addr: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let server = Server::http(addr)?;
    for request in server.incoming_requests() {
        handle_request(manager, request);
    }
    Ok(())
}

/// A test helper that serves `manager` on a random port in a background thread.
///
/// The server listens on `127.0.0.1:{port}`.
pub struct TestServer {
    pub url: String,
    pub port: u16,
    _server: Arc<Server>,
    _handle: std::thread::JoinHandle<()>,
}

impl TestServer {
    pub fn start(manager: GeoServerManager) -> Self {
        let server =
            Arc::new(Server::http("127.0.0.1:0").expect("failed to bind test HTTP server"));
        let port = server.server_addr().to_ip().expect("not an IP addr").port();
        let url = format!("http://127.0.0.1:{port}");

        let manager = Arc::new(manager);
        let srv = Arc::clone(&server);
        let handle = std::thread::spawn(move || {
            for request in srv.incoming_requests() {
                handle_request(&manager, request);
            }
        });

        Self {
            url,
            port,
            _server: server,
            _handle: handle,
        }
    }
}
