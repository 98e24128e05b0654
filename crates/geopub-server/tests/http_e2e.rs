//! End-to-end tests of the publishing endpoint.
//!
//! A real server runs in-process on a random port, backed by a manager whose
//! transport is the in-memory admin API, and is driven over HTTP with `ureq`.

use geopub_core::{GeoServerConfig, GeoServerManager};
use geopub_rest::mock::MockTransport;
use geopub_rest::{Method, RestTransport};
use geopub_server::TestServer;
use std::sync::Arc;

fn start_server(mock: MockTransport) -> (TestServer, Arc<MockTransport>) {
    let mock = Arc::new(mock);
    let manager = GeoServerManager::with_transport(
        GeoServerConfig::new("http://localhost:8080/geoserver"),
        Arc::clone(&mock) as Arc<dyn RestTransport>,
    );
    (TestServer::start(manager), mock)
}

fn post_form(url: &str, form: &str) -> Result<String, ureq::Error> {
    let mut resp = ureq::post(format!("{url}/geoserver"))
        .header("Content-Type", "application/x-www-form-urlencoded")
        .send(form)?;
    resp.body_mut().read_to_string()
}

fn write_archive(dir: &std::path::Path) -> String {
    let path = dir.join("upload.zip");
    std::fs::write(&path, b"PK\x03\x04").unwrap();
    path.to_str().unwrap().to_owned()
}

// --- Tests ---

#[test]
fn health_reports_ok() {
    let (server, _) = start_server(MockTransport::new());
    let mut resp = ureq::get(format!("{}/health", server.url)).call().unwrap();
    assert_eq!(resp.body_mut().read_to_string().unwrap(), r#"{"status":"ok"}"#);
}

#[test]
fn publish_form_body() {
    let dir = tempfile::tempdir().unwrap();
    let archive = write_archive(dir.path());
    let (server, mock) = start_server(
        MockTransport::new()
            .with_workspace("shp")
            .with_style(None, "polygon"),
    );

    let form = format!(
        "zipFilePath={}&storeName=parcels&styleType=polygon&coordinateSystem=EPSG%3A3857",
        urlencoding::encode(&archive)
    );
    assert_eq!(post_form(&server.url, &form).unwrap(), "true");

    let layer = mock.layer("shp", "parcels").unwrap();
    assert_eq!(layer.srs.as_deref(), Some("EPSG:3857"));
    assert_eq!(layer.style.as_deref(), Some("polygon"));
}

#[test]
fn publish_via_query_string_uses_default_crs() {
    let dir = tempfile::tempdir().unwrap();
    let archive = write_archive(dir.path());
    let (server, mock) = start_server(MockTransport::new().with_workspace("shp"));

    let url = format!(
        "{}/geoserver?zipFilePath={}&storeName=roads",
        server.url,
        urlencoding::encode(&archive)
    );
    let mut resp = ureq::post(url).send_empty().unwrap();
    assert_eq!(resp.body_mut().read_to_string().unwrap(), "true");

    let layer = mock.layer("shp", "roads").unwrap();
    assert_eq!(layer.srs.as_deref(), Some("EPSG:4326"));
    let upload = &mock.mutating_requests()[0];
    assert_eq!(upload.method, Method::Put);
    assert_eq!(upload.path, "workspaces/shp/datastores/roads/file.shp");
}

#[test]
fn publish_rejected_by_server_is_false() {
    let dir = tempfile::tempdir().unwrap();
    let archive = write_archive(dir.path());
    // No workspace: the upload answers 404.
    let (server, _) = start_server(MockTransport::new());

    let form = format!("zipFilePath={}&storeName=roads", urlencoding::encode(&archive));
    assert_eq!(post_form(&server.url, &form).unwrap(), "false");
}

#[test]
fn publish_missing_fields_is_400() {
    let (server, mock) = start_server(MockTransport::new().with_workspace("shp"));
    let err = post_form(&server.url, "storeName=roads").unwrap_err();
    assert!(matches!(err, ureq::Error::StatusCode(400)));
    assert!(mock.requests().is_empty());
}

#[test]
fn publish_failure_is_500() {
    let (server, _) = start_server(MockTransport::new().with_workspace("shp"));
    let err = post_form(&server.url, "zipFilePath=%2Fnonexistent%2Fa.zip&storeName=a").unwrap_err();
    assert!(matches!(err, ureq::Error::StatusCode(500)));
}

#[test]
fn publish_requires_post() {
    let (server, _) = start_server(MockTransport::new());
    let err = ureq::get(format!("{}/geoserver", server.url))
        .call()
        .unwrap_err();
    assert!(matches!(err, ureq::Error::StatusCode(405)));
}

#[test]
fn unknown_route_is_404() {
    let (server, _) = start_server(MockTransport::new());
    let err = ureq::get(format!("{}/rest/workspaces", server.url))
        .call()
        .unwrap_err();
    assert!(matches!(err, ureq::Error::StatusCode(404)));
}
