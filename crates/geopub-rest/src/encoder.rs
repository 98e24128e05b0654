//! JSON request bodies for the admin API.
//!
//! Each type serializes to the exact wrapper object GeoServer expects
//! (`{"workspace": {...}}`, `{"dataStore": {...}}`, ...).

use crate::rest_path;
use serde::Serialize;
use serde_json::{json, Value};

/// Which family of stores a store belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKind {
    DataStores,
    CoverageStores,
}

impl StoreKind {
    pub fn path_segment(self) -> &'static str {
        match self {
            StoreKind::DataStores => "datastores",
            StoreKind::CoverageStores => "coveragestores",
        }
    }
}

/// A store named for deletion. Carries no type-specific settings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoreRef {
    pub kind: StoreKind,
    pub name: String,
}

impl StoreRef {
    pub fn data_store(name: &str) -> Self {
        Self {
            kind: StoreKind::DataStores,
            name: name.to_owned(),
        }
    }

    pub fn coverage_store(name: &str) -> Self {
        Self {
            kind: StoreKind::CoverageStores,
            name: name.to_owned(),
        }
    }

    /// Path of this store below `rest/`.
    pub fn path(&self, workspace: &str) -> String {
        rest_path(&["workspaces", workspace, self.kind.path_segment(), &self.name])
    }
}

pub fn workspace_body(name: &str) -> Value {
    json!({ "workspace": { "name": name } })
}

/// Creating a namespace also creates the workspace with the same prefix.
pub fn namespace_body(prefix: &str, uri: &str) -> Value {
    json!({ "namespace": { "prefix": prefix, "uri": uri } })
}

/// Connection settings of a PostGIS-backed data store.
///
/// The store name is not part of this value; callers choose it when the
/// store is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostGisDatastore {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub schema: Option<String>,
    pub expose_primary_keys: bool,
}

impl PostGisDatastore {
    pub fn new(host: &str, password: &str, database: &str) -> Self {
        Self {
            host: host.to_owned(),
            port: 5432,
            user: "postgres".to_owned(),
            password: password.to_owned(),
            database: database.to_owned(),
            schema: None,
            expose_primary_keys: true,
        }
    }

    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub fn with_user(mut self, user: &str) -> Self {
        self.user = user.to_owned();
        self
    }

    #[must_use]
    pub fn with_schema(mut self, schema: &str) -> Self {
        self.schema = Some(schema.to_owned());
        self
    }

    /// `{"dataStore": ...}` body registering this connection as store `name`.
    pub fn to_body(&self, name: &str) -> Value {
        let mut entries = vec![
            entry("dbtype", "postgis"),
            entry("host", &self.host),
            entry("port", &self.port.to_string()),
            entry("user", &self.user),
            entry("passwd", &self.password),
            entry("database", &self.database),
            entry(
                "Expose primary keys",
                if self.expose_primary_keys {
                    "true"
                } else {
                    "false"
                },
            ),
        ];
        if let Some(ref schema) = self.schema {
            entries.push(entry("schema", schema));
        }
        json!({
            "dataStore": {
                "name": name,
                "type": "PostGIS",
                "enabled": true,
                "connectionParameters": { "entry": entries },
            }
        })
    }
}

fn entry(key: &str, value: &str) -> Value {
    json!({ "@key": key, "$": value })
}

/// Feature type published from an existing table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureTypeInfo {
    pub name: String,
    pub native_name: String,
    pub title: String,
    pub srs: String,
    pub projection_policy: String,
    pub enabled: bool,
}

impl FeatureTypeInfo {
    /// Name, native name and title all set to `table`.
    pub fn for_table(table: &str, srs: &str) -> Self {
        Self {
            name: table.to_owned(),
            native_name: table.to_owned(),
            title: table.to_owned(),
            srs: srs.to_owned(),
            projection_policy: "FORCE_DECLARED".to_owned(),
            enabled: true,
        }
    }

    pub fn to_body(&self) -> Value {
        json!({ "featureType": self })
    }
}

/// Body that only re-declares the SRS of an uploaded feature type.
pub fn srs_body(srs: &str) -> Value {
    json!({ "featureType": { "srs": srs, "projectionPolicy": "FORCE_DECLARED" } })
}

/// Publishing settings of a layer; currently only its default style.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerSettings {
    pub default_style: Option<String>,
}

impl LayerSettings {
    pub fn with_default_style(style: &str) -> Self {
        Self {
            default_style: Some(style.to_owned()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.default_style.is_none()
    }

    /// `{"layer": ...}` body. A qualified `ws:name` style is split so the
    /// server resolves it inside its workspace.
    pub fn to_body(&self) -> Value {
        let style = self.default_style.as_deref().map(|style| match style.split_once(':') {
            Some((workspace, name)) => json!({ "name": name, "workspace": workspace }),
            None => json!({ "name": style }),
        });
        match style {
            Some(style) => json!({ "layer": { "defaultStyle": style } }),
            None => json!({ "layer": {} }),
        }
    }
}

/// An ordered layer group. Earlier entries render below later ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerGroupInfo {
    pub name: String,
    pub workspace: String,
    pub layers: Vec<String>,
}

impl LayerGroupInfo {
    pub fn new(workspace: &str, name: &str) -> Self {
        Self {
            name: name.to_owned(),
            workspace: workspace.to_owned(),
            layers: Vec::new(),
        }
    }

    pub fn add_layer(&mut self, qualified: &str) {
        self.layers.push(qualified.to_owned());
    }

    pub fn to_body(&self) -> Value {
        let published: Vec<Value> = self
            .layers
            .iter()
            .map(|layer| json!({ "@type": "layer", "name": layer }))
            .collect();
        json!({
            "layerGroup": {
                "name": self.name,
                "mode": "SINGLE",
                "workspace": { "name": self.workspace },
                "publishables": { "published": published },
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_ref_paths() {
        assert_eq!(
            StoreRef::data_store("roads").path("topp"),
            "workspaces/topp/datastores/roads"
        );
        assert_eq!(
            StoreRef::coverage_store("dem").path("image"),
            "workspaces/image/coveragestores/dem"
        );
    }

    #[test]
    fn postgis_defaults() {
        let ds = PostGisDatastore::new("db.local", "secret", "gis");
        assert_eq!(ds.port, 5432);
        assert_eq!(ds.user, "postgres");
        assert!(ds.expose_primary_keys);
    }

    #[test]
    fn postgis_body_carries_store_name_and_params() {
        let body = PostGisDatastore::new("db.local", "secret", "gis")
            .with_port(5433)
            .with_schema("public")
            .to_body("parcels");
        assert_eq!(body["dataStore"]["name"], "parcels");
        let entries = body["dataStore"]["connectionParameters"]["entry"]
            .as_array()
            .unwrap();
        let lookup = |key: &str| {
            entries
                .iter()
                .find(|e| e["@key"] == key)
                .map(|e| e["$"].as_str().unwrap().to_owned())
        };
        assert_eq!(lookup("port").as_deref(), Some("5433"));
        assert_eq!(lookup("schema").as_deref(), Some("public"));
        assert_eq!(lookup("Expose primary keys").as_deref(), Some("true"));
    }

    #[test]
    fn feature_type_uses_table_name_everywhere() {
        let body = FeatureTypeInfo::for_table("parcels", "EPSG:4326").to_body();
        let ft = &body["featureType"];
        assert_eq!(ft["name"], "parcels");
        assert_eq!(ft["nativeName"], "parcels");
        assert_eq!(ft["title"], "parcels");
        assert_eq!(ft["srs"], "EPSG:4326");
    }

    #[test]
    fn layer_settings_split_qualified_style() {
        let body = LayerSettings::with_default_style("styles:roads").to_body();
        assert_eq!(body["layer"]["defaultStyle"]["name"], "roads");
        assert_eq!(body["layer"]["defaultStyle"]["workspace"], "styles");

        let body = LayerSettings::with_default_style("roads").to_body();
        assert!(body["layer"]["defaultStyle"].get("workspace").is_none());
    }

    #[test]
    fn layer_group_preserves_order() {
        let mut group = LayerGroupInfo::new("topp", "base");
        group.add_layer("topp:water");
        group.add_layer("topp:roads");
        group.add_layer("topp:labels");
        let body = group.to_body();
        let names: Vec<&str> = body["layerGroup"]["publishables"]["published"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["topp:water", "topp:roads", "topp:labels"]);
    }
}
