use crate::RestError;
use serde::Deserialize;
use serde_json::Value;

/// A collection returned by one of the admin list endpoints.
///
/// GeoServer wraps lists as `{"<plural>": {"<singular>": [{"name": ..}, ..]}}`
/// and renders an empty collection as `{"<plural>": ""}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Workspaces,
    DataStores,
    CoverageStores,
    Layers,
    LayerGroups,
    Styles,
}

impl ListKind {
    pub fn plural(self) -> &'static str {
        match self {
            ListKind::Workspaces => "workspaces",
            ListKind::DataStores => "dataStores",
            ListKind::CoverageStores => "coverageStores",
            ListKind::Layers => "layers",
            ListKind::LayerGroups => "layerGroups",
            ListKind::Styles => "styles",
        }
    }

    pub fn singular(self) -> &'static str {
        match self {
            ListKind::Workspaces => "workspace",
            ListKind::DataStores => "dataStore",
            ListKind::CoverageStores => "coverageStore",
            ListKind::Layers => "layer",
            ListKind::LayerGroups => "layerGroup",
            ListKind::Styles => "style",
        }
    }
}

#[derive(Debug, Deserialize)]
struct NameLink {
    name: String,
}

/// Decode the member names of a list response, in server order.
pub fn decode_names(body: &[u8], kind: ListKind) -> Result<Vec<String>, RestError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| RestError::Serialization(format!("invalid {} list: {e}", kind.plural())))?;

    let outer = value.get(kind.plural()).ok_or_else(|| {
        RestError::Serialization(format!("missing '{}' in list response", kind.plural()))
    })?;

    let items = match outer {
        Value::String(s) if s.is_empty() => return Ok(Vec::new()),
        Value::Null => return Ok(Vec::new()),
        Value::Object(map) => match map.get(kind.singular()) {
            Some(items) => items.clone(),
            None => return Ok(Vec::new()),
        },
        other => {
            return Err(RestError::Serialization(format!(
                "unexpected '{}' value: {other}",
                kind.plural()
            )))
        }
    };

    // A single member may come back as a bare object instead of an array.
    let links: Vec<NameLink> = match items {
        Value::Array(_) => serde_json::from_value(items),
        Value::Object(_) => serde_json::from_value(items).map(|one| vec![one]),
        _ => return Ok(Vec::new()),
    }
    .map_err(|e| RestError::Serialization(format!("invalid {} entry: {e}", kind.singular())))?;

    Ok(links.into_iter().map(|link| link.name).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_workspace_list() {
        let body = br#"{"workspaces":{"workspace":[
            {"name":"topp","href":"http://gs/rest/workspaces/topp.json"},
            {"name":"sf","href":"http://gs/rest/workspaces/sf.json"}]}}"#;
        assert_eq!(
            decode_names(body, ListKind::Workspaces).unwrap(),
            vec!["topp", "sf"]
        );
    }

    #[test]
    fn decode_empty_list_rendered_as_string() {
        let body = br#"{"dataStores":""}"#;
        assert!(decode_names(body, ListKind::DataStores).unwrap().is_empty());
    }

    #[test]
    fn decode_single_member_object() {
        let body = br#"{"styles":{"style":{"name":"roads"}}}"#;
        assert_eq!(decode_names(body, ListKind::Styles).unwrap(), vec!["roads"]);
    }

    #[test]
    fn decode_rejects_wrong_wrapper() {
        let body = br#"{"layers":{"layer":[{"name":"a"}]}}"#;
        assert!(decode_names(body, ListKind::LayerGroups).is_err());
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(decode_names(b"<xml/>", ListKind::Layers).is_err());
    }
}
