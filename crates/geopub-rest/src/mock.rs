//! In-memory stand-in for the admin API.
//!
//! `MockTransport` keeps just enough server state (workspaces, stores,
//! layers, groups, styles) to answer the requests [`Publisher`](crate::Publisher)
//! and the existence queries issue, and records every request it sees.

use crate::{ListKind, Method, RestError, RestRequest, RestResponse, RestTransport};
use serde_json::{json, Value};
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockLayer {
    pub store: String,
    pub srs: Option<String>,
    pub style: Option<String>,
}

#[derive(Debug, Default)]
struct MockWorkspace {
    uri: Option<String>,
    datastores: BTreeSet<String>,
    coverage_stores: BTreeSet<String>,
    layers: BTreeMap<String, MockLayer>,
    layer_groups: BTreeMap<String, Vec<String>>,
    styles: BTreeMap<String, Vec<u8>>,
}

#[derive(Debug, Default)]
struct MockState {
    workspaces: BTreeMap<String, MockWorkspace>,
    styles: BTreeMap<String, Vec<u8>>,
    requests: Vec<RestRequest>,
    fail_store_creation: bool,
    offline: bool,
}

#[derive(Default)]
pub struct MockTransport {
    state: Mutex<MockState>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().expect("mock state lock poisoned")
    }

    #[must_use]
    pub fn with_workspace(self, name: &str) -> Self {
        self.state()
            .workspaces
            .entry(name.to_owned())
            .or_default();
        self
    }

    #[must_use]
    pub fn with_datastore(self, workspace: &str, name: &str) -> Self {
        self.state()
            .workspaces
            .entry(workspace.to_owned())
            .or_default()
            .datastores
            .insert(name.to_owned());
        self
    }

    #[must_use]
    pub fn with_coverage_store(self, workspace: &str, name: &str) -> Self {
        self.state()
            .workspaces
            .entry(workspace.to_owned())
            .or_default()
            .coverage_stores
            .insert(name.to_owned());
        self
    }

    /// Add a layer backed by a data store of the same name.
    #[must_use]
    pub fn with_layer(self, workspace: &str, name: &str) -> Self {
        {
            let mut state = self.state();
            let ws = state.workspaces.entry(workspace.to_owned()).or_default();
            ws.datastores.insert(name.to_owned());
            ws.layers.insert(
                name.to_owned(),
                MockLayer {
                    store: name.to_owned(),
                    ..MockLayer::default()
                },
            );
        }
        self
    }

    #[must_use]
    pub fn with_layer_group(self, workspace: &str, name: &str, layers: &[&str]) -> Self {
        self.state()
            .workspaces
            .entry(workspace.to_owned())
            .or_default()
            .layer_groups
            .insert(
                name.to_owned(),
                layers.iter().map(|l| (*l).to_owned()).collect(),
            );
        self
    }

    #[must_use]
    pub fn with_style(self, workspace: Option<&str>, name: &str) -> Self {
        {
            let mut state = self.state();
            let body = b"<StyledLayerDescriptor/>".to_vec();
            match workspace {
                Some(ws) => {
                    state
                        .workspaces
                        .entry(ws.to_owned())
                        .or_default()
                        .styles
                        .insert(name.to_owned(), body);
                }
                None => {
                    state.styles.insert(name.to_owned(), body);
                }
            }
        }
        self
    }

    /// Make every data-store creation fail with HTTP 500.
    #[must_use]
    pub fn failing_store_creation(self) -> Self {
        self.state().fail_store_creation = true;
        self
    }

    /// Make every request fail as if the server were unreachable.
    #[must_use]
    pub fn offline(self) -> Self {
        self.state().offline = true;
        self
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<RestRequest> {
        self.state().requests.clone()
    }

    /// Requests that change server state.
    pub fn mutating_requests(&self) -> Vec<RestRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method.is_mutating())
            .collect()
    }

    pub fn has_workspace(&self, name: &str) -> bool {
        self.state().workspaces.contains_key(name)
    }

    pub fn workspace_uri(&self, name: &str) -> Option<String> {
        self.state()
            .workspaces
            .get(name)
            .and_then(|ws| ws.uri.clone())
    }

    pub fn has_datastore(&self, workspace: &str, name: &str) -> bool {
        self.state()
            .workspaces
            .get(workspace)
            .is_some_and(|ws| ws.datastores.contains(name))
    }

    pub fn has_coverage_store(&self, workspace: &str, name: &str) -> bool {
        self.state()
            .workspaces
            .get(workspace)
            .is_some_and(|ws| ws.coverage_stores.contains(name))
    }

    pub fn layer(&self, workspace: &str, name: &str) -> Option<MockLayer> {
        self.state()
            .workspaces
            .get(workspace)
            .and_then(|ws| ws.layers.get(name).cloned())
    }

    pub fn layer_group(&self, workspace: &str, name: &str) -> Option<Vec<String>> {
        self.state()
            .workspaces
            .get(workspace)
            .and_then(|ws| ws.layer_groups.get(name).cloned())
    }

    pub fn has_style(&self, workspace: Option<&str>, name: &str) -> bool {
        self.style_body(workspace, name).is_some()
    }

    pub fn style_body(&self, workspace: Option<&str>, name: &str) -> Option<String> {
        let state = self.state();
        let body = match workspace {
            Some(ws) => state.workspaces.get(ws)?.styles.get(name),
            None => state.styles.get(name),
        };
        body.map(|b| String::from_utf8_lossy(b).into_owned())
    }
}

impl RestTransport for MockTransport {
    fn execute(&self, request: &RestRequest) -> Result<RestResponse, RestError> {
        let mut state = self.state();
        if state.offline {
            return Err(RestError::Http(format!(
                "{} {}: connection refused",
                request.method, request.path
            )));
        }
        state.requests.push(request.clone());

        let decoded: Vec<String> = request
            .path
            .split('/')
            .map(|s| urlencoding::decode(s).map_or_else(|_| s.to_owned(), Cow::into_owned))
            .collect();
        let segments: Vec<&str> = decoded.iter().map(String::as_str).collect();
        Ok(match request.method {
            Method::Get => handle_get(&state, &segments),
            Method::Post => handle_post(&mut state, &segments, request),
            Method::Put => handle_put(&mut state, &segments, request),
            Method::Delete => handle_delete(&mut state, &segments, request),
        })
    }
}

fn status(code: u16) -> RestResponse {
    RestResponse::new(code, Vec::new())
}

fn found(kind: &str, name: &str) -> RestResponse {
    RestResponse::new(200, json!({ kind: { "name": name } }).to_string())
}

fn presence(present: bool, kind: &str, name: &str) -> RestResponse {
    if present {
        found(kind, name)
    } else {
        status(404)
    }
}

fn list_body<I>(kind: ListKind, names: I) -> RestResponse
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let items: Vec<Value> = names
        .into_iter()
        .map(|n| json!({ "name": n.as_ref() }))
        .collect();
    let body = if items.is_empty() {
        json!({ kind.plural(): "" })
    } else {
        json!({ kind.plural(): { kind.singular(): items } })
    };
    RestResponse::new(200, body.to_string())
}

fn parse_body(request: &RestRequest) -> Option<Value> {
    serde_json::from_slice(request.body.as_deref()?).ok()
}

fn handle_get(state: &MockState, segments: &[&str]) -> RestResponse {
    match segments {
        ["workspaces"] => list_body(ListKind::Workspaces, state.workspaces.keys()),
        ["workspaces", ws] => presence(state.workspaces.contains_key(*ws), "workspace", ws),
        ["layers"] => list_body(
            ListKind::Layers,
            state
                .workspaces
                .iter()
                .flat_map(|(ws, w)| w.layers.keys().map(move |l| format!("{ws}:{l}"))),
        ),
        ["styles"] => list_body(ListKind::Styles, state.styles.keys()),
        ["styles", name] => presence(state.styles.contains_key(*name), "style", name),
        ["workspaces", ws, rest @ ..] => {
            let Some(w) = state.workspaces.get(*ws) else {
                return status(404);
            };
            match rest {
                ["datastores"] => list_body(ListKind::DataStores, &w.datastores),
                ["datastores", name] => {
                    presence(w.datastores.contains(*name), "dataStore", name)
                }
                ["coveragestores"] => list_body(ListKind::CoverageStores, &w.coverage_stores),
                ["coveragestores", name] => {
                    presence(w.coverage_stores.contains(*name), "coverageStore", name)
                }
                ["layers"] => list_body(ListKind::Layers, w.layers.keys()),
                ["layers", name] => presence(w.layers.contains_key(*name), "layer", name),
                ["layergroups"] => list_body(ListKind::LayerGroups, w.layer_groups.keys()),
                ["layergroups", name] => {
                    presence(w.layer_groups.contains_key(*name), "layerGroup", name)
                }
                ["styles"] => list_body(ListKind::Styles, w.styles.keys()),
                ["styles", name] => presence(w.styles.contains_key(*name), "style", name),
                _ => status(404),
            }
        }
        _ => status(404),
    }
}

fn handle_post(state: &mut MockState, segments: &[&str], request: &RestRequest) -> RestResponse {
    match segments {
        ["workspaces"] => {
            let Some(name) = parse_body(request)
                .and_then(|v| v["workspace"]["name"].as_str().map(str::to_owned))
            else {
                return status(400);
            };
            if state.workspaces.contains_key(&name) {
                return status(409);
            }
            state.workspaces.insert(name.clone(), MockWorkspace::default());
            RestResponse::new(201, name)
        }
        ["namespaces"] => {
            let Some(body) = parse_body(request) else {
                return status(400);
            };
            let (Some(prefix), Some(uri)) = (
                body["namespace"]["prefix"].as_str(),
                body["namespace"]["uri"].as_str(),
            ) else {
                return status(400);
            };
            if state.workspaces.contains_key(prefix) {
                return status(409);
            }
            state.workspaces.insert(
                prefix.to_owned(),
                MockWorkspace {
                    uri: Some(uri.to_owned()),
                    ..MockWorkspace::default()
                },
            );
            RestResponse::new(201, prefix.to_owned())
        }
        ["styles"] => register_style(&mut state.styles, request),
        ["workspaces", ws, rest @ ..] => {
            let fail_store_creation = state.fail_store_creation;
            let Some(w) = state.workspaces.get_mut(*ws) else {
                return status(404);
            };
            match rest {
                ["datastores"] => {
                    if fail_store_creation {
                        return status(500);
                    }
                    let Some(name) = parse_body(request)
                        .and_then(|v| v["dataStore"]["name"].as_str().map(str::to_owned))
                    else {
                        return status(400);
                    };
                    if !w.datastores.insert(name.clone()) {
                        return status(409);
                    }
                    RestResponse::new(201, name)
                }
                ["datastores", store, "featuretypes"] => {
                    if !w.datastores.contains(*store) {
                        return status(404);
                    }
                    let Some(body) = parse_body(request) else {
                        return status(400);
                    };
                    let Some(name) = body["featureType"]["name"].as_str() else {
                        return status(400);
                    };
                    if w.layers.contains_key(name) {
                        return status(409);
                    }
                    w.layers.insert(
                        name.to_owned(),
                        MockLayer {
                            store: (*store).to_owned(),
                            srs: body["featureType"]["srs"].as_str().map(str::to_owned),
                            style: None,
                        },
                    );
                    RestResponse::new(201, name.to_owned())
                }
                ["layergroups"] => {
                    let Some(body) = parse_body(request) else {
                        return status(400);
                    };
                    let Some(name) = body["layerGroup"]["name"].as_str() else {
                        return status(400);
                    };
                    if w.layer_groups.contains_key(name) {
                        return status(409);
                    }
                    let members: Vec<String> = body["layerGroup"]["publishables"]["published"]
                        .as_array()
                        .map(|items| {
                            items
                                .iter()
                                .filter_map(|p| p["name"].as_str().map(str::to_owned))
                                .collect()
                        })
                        .unwrap_or_default();
                    w.layer_groups.insert(name.to_owned(), members);
                    RestResponse::new(201, name.to_owned())
                }
                ["styles"] => register_style(&mut w.styles, request),
                _ => status(405),
            }
        }
        _ => status(405),
    }
}

fn register_style(styles: &mut BTreeMap<String, Vec<u8>>, request: &RestRequest) -> RestResponse {
    let Some(name) = request.query_value("name") else {
        return status(400);
    };
    if styles.contains_key(name) {
        return status(403);
    }
    styles.insert(name.to_owned(), request.body.clone().unwrap_or_default());
    RestResponse::new(201, name.to_owned())
}

fn update_style(styles: &mut BTreeMap<String, Vec<u8>>, name: &str, request: &RestRequest) -> RestResponse {
    match styles.get_mut(name) {
        Some(body) => {
            *body = request.body.clone().unwrap_or_default();
            status(200)
        }
        None => status(404),
    }
}

fn handle_put(state: &mut MockState, segments: &[&str], request: &RestRequest) -> RestResponse {
    match segments {
        ["styles", name] => update_style(&mut state.styles, name, request),
        ["workspaces", ws, rest @ ..] => {
            let Some(w) = state.workspaces.get_mut(*ws) else {
                return status(404);
            };
            match rest {
                ["datastores", store, "file.shp"] => {
                    w.datastores.insert((*store).to_owned());
                    w.layers.entry((*store).to_owned()).or_insert_with(|| MockLayer {
                        store: (*store).to_owned(),
                        ..MockLayer::default()
                    });
                    status(201)
                }
                ["datastores", store, "featuretypes", name] => {
                    let srs = parse_body(request)
                        .and_then(|v| v["featureType"]["srs"].as_str().map(str::to_owned));
                    match w.layers.get_mut(*name) {
                        Some(layer) if layer.store == *store => {
                            layer.srs = srs;
                            status(200)
                        }
                        _ => status(404),
                    }
                }
                ["coveragestores", store, "file.geotiff"] => {
                    let coverage = request.query_value("coverageName").unwrap_or(store);
                    w.coverage_stores.insert((*store).to_owned());
                    w.layers.insert(
                        coverage.to_owned(),
                        MockLayer {
                            store: (*store).to_owned(),
                            ..MockLayer::default()
                        },
                    );
                    status(201)
                }
                ["layers", name] => {
                    let style = parse_body(request).and_then(|v| {
                        let style = &v["layer"]["defaultStyle"];
                        let name = style["name"].as_str()?;
                        Some(match style["workspace"].as_str() {
                            Some(ws) => format!("{ws}:{name}"),
                            None => name.to_owned(),
                        })
                    });
                    match w.layers.get_mut(*name) {
                        Some(layer) => {
                            layer.style = style;
                            status(200)
                        }
                        None => status(404),
                    }
                }
                ["styles", name] => update_style(&mut w.styles, name, request),
                _ => status(405),
            }
        }
        _ => status(405),
    }
}

fn handle_delete(state: &mut MockState, segments: &[&str], request: &RestRequest) -> RestResponse {
    let recurse = request.query_value("recurse") == Some("true");
    match segments {
        ["styles", name] => match state.styles.remove(*name) {
            Some(_) => status(200),
            None => status(404),
        },
        ["workspaces", ws] => {
            let non_empty = state.workspaces.get(*ws).map(|w| {
                !(w.datastores.is_empty()
                    && w.coverage_stores.is_empty()
                    && w.layer_groups.is_empty()
                    && w.styles.is_empty())
            });
            match non_empty {
                None => status(404),
                Some(true) if !recurse => status(403),
                Some(_) => {
                    state.workspaces.remove(*ws);
                    status(200)
                }
            }
        }
        ["workspaces", ws, rest @ ..] => {
            let Some(w) = state.workspaces.get_mut(*ws) else {
                return status(404);
            };
            match rest {
                ["datastores", name] | ["coveragestores", name] => {
                    let removed = if rest[0] == "datastores" {
                        w.datastores.remove(*name)
                    } else {
                        w.coverage_stores.remove(*name)
                    };
                    if !removed {
                        return status(404);
                    }
                    w.layers.retain(|_, layer| layer.store != *name);
                    status(200)
                }
                ["layers", name] => match w.layers.remove(*name) {
                    Some(_) => status(200),
                    None => status(404),
                },
                ["layergroups", name] => match w.layer_groups.remove(*name) {
                    Some(_) => status(200),
                    None => status(404),
                },
                ["styles", name] => match w.styles.remove(*name) {
                    Some(_) => status(200),
                    None => status(404),
                },
                _ => status(405),
            }
        }
        _ => status(405),
    }
}
