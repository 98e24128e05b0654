use crate::encoder::{namespace_body, srs_body, workspace_body};
use crate::{
    FeatureTypeInfo, LayerGroupInfo, LayerSettings, PostGisDatastore, RestError, RestRequest,
    RestTransport, StoreRef, rest_path,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A shapefile archive upload.
///
/// The archive is stored as `store` and its feature type is published as a
/// layer of the same name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShpUpload {
    pub workspace: String,
    pub store: String,
    pub archive: PathBuf,
    pub srs: String,
    pub style: Option<String>,
    pub charset: Option<String>,
}

/// Admin verbs of the REST API.
///
/// Every method answers with the server's verdict as a `bool` (2xx or not);
/// `Err` is reserved for transport failures and unreadable local files.
pub struct Publisher<'a> {
    transport: &'a dyn RestTransport,
}

impl<'a> Publisher<'a> {
    pub fn new(transport: &'a dyn RestTransport) -> Self {
        Self { transport }
    }

    fn send(&self, request: &RestRequest) -> Result<bool, RestError> {
        let resp = self.transport.execute(request)?;
        if resp.is_success() {
            info!("{} {}: HTTP {}", request.method, request.path, resp.status);
            Ok(true)
        } else {
            warn!(
                "{} {} rejected: HTTP {} {}",
                request.method,
                request.path,
                resp.status,
                resp.text()
            );
            Ok(false)
        }
    }

    pub fn create_workspace(&self, name: &str) -> Result<bool, RestError> {
        self.send(&RestRequest::post("workspaces").json(&workspace_body(name))?)
    }

    /// Create a workspace together with its namespace URI.
    pub fn create_namespace(&self, prefix: &str, uri: &str) -> Result<bool, RestError> {
        self.send(&RestRequest::post("namespaces").json(&namespace_body(prefix, uri))?)
    }

    /// Delete a workspace and everything scoped under it.
    pub fn remove_workspace(&self, name: &str) -> Result<bool, RestError> {
        self.send(
            &RestRequest::delete(rest_path(&["workspaces", name])).query("recurse", "true"),
        )
    }

    /// Upload a zipped shapefile, declare its SRS and, if given, its style.
    pub fn publish_shp(&self, upload: &ShpUpload) -> Result<bool, RestError> {
        let data = read_file(&upload.archive)?;
        let store_path = rest_path(&["workspaces", &upload.workspace, "datastores", &upload.store]);

        let mut request = RestRequest::put(format!("{store_path}/file.shp"))
            .query("configure", "all")
            .query("target", "shp");
        if let Some(ref charset) = upload.charset {
            request = request.query("charset", charset);
        }
        if !self.send(&request.body("application/zip", data))? {
            return Ok(false);
        }

        let feature_type = RestRequest::put(format!(
            "{store_path}/featuretypes/{}",
            urlencoding::encode(&upload.store)
        ))
        .json(&srs_body(&upload.srs))?;
        if !self.send(&feature_type)? {
            return Ok(false);
        }

        match upload.style {
            Some(ref style) => self.configure_layer(
                &upload.workspace,
                &upload.store,
                &LayerSettings::with_default_style(style),
            ),
            None => Ok(true),
        }
    }

    /// Register a PostGIS connection as data store `name`.
    pub fn create_postgis_store(
        &self,
        workspace: &str,
        name: &str,
        datastore: &PostGisDatastore,
    ) -> Result<bool, RestError> {
        self.send(
            &RestRequest::post(rest_path(&["workspaces", workspace, "datastores"]))
                .json(&datastore.to_body(name))?,
        )
    }

    /// Publish a table of an existing data store, then apply layer settings.
    pub fn publish_db_layer(
        &self,
        workspace: &str,
        store: &str,
        feature_type: &FeatureTypeInfo,
        layer: &LayerSettings,
    ) -> Result<bool, RestError> {
        let request = RestRequest::post(rest_path(&[
            "workspaces",
            workspace,
            "datastores",
            store,
            "featuretypes",
        ]))
        .json(&feature_type.to_body())?;
        if !self.send(&request)? {
            return Ok(false);
        }
        if layer.is_empty() {
            return Ok(true);
        }
        self.configure_layer(workspace, &feature_type.name, layer)
    }

    pub fn configure_layer(
        &self,
        workspace: &str,
        layer: &str,
        settings: &LayerSettings,
    ) -> Result<bool, RestError> {
        self.send(
            &RestRequest::put(rest_path(&["workspaces", workspace, "layers", layer]))
                .json(&settings.to_body())?,
        )
    }

    /// Upload a GeoTIFF as coverage store and coverage, both named `name`.
    pub fn publish_geotiff(
        &self,
        workspace: &str,
        name: &str,
        raster: &Path,
    ) -> Result<bool, RestError> {
        let data = read_file(raster)?;
        let request = RestRequest::put(rest_path(&[
            "workspaces",
            workspace,
            "coveragestores",
            name,
            "file.geotiff",
        ]))
        .query("configure", "first")
        .query("coverageName", name)
        .body("image/tiff", data);
        self.send(&request)
    }

    pub fn create_layer_group(&self, group: &LayerGroupInfo) -> Result<bool, RestError> {
        self.send(
            &RestRequest::post(rest_path(&["workspaces", &group.workspace, "layergroups"]))
                .json(&group.to_body())?,
        )
    }

    /// Delete a store together with its resources and layers.
    pub fn remove_store(&self, workspace: &str, store: &StoreRef) -> Result<bool, RestError> {
        self.send(&RestRequest::delete(store.path(workspace)).query("recurse", "true"))
    }

    pub fn remove_layer(&self, workspace: &str, layer: &str) -> Result<bool, RestError> {
        self.send(
            &RestRequest::delete(rest_path(&["workspaces", workspace, "layers", layer]))
                .query("recurse", "true"),
        )
    }

    pub fn remove_layer_group(&self, workspace: &str, group: &str) -> Result<bool, RestError> {
        self.send(&RestRequest::delete(rest_path(&[
            "workspaces",
            workspace,
            "layergroups",
            group,
        ])))
    }

    /// Delete a style and purge its SLD document from the data directory.
    pub fn remove_style(&self, workspace: Option<&str>, name: &str) -> Result<bool, RestError> {
        let path = match workspace {
            Some(ws) => rest_path(&["workspaces", ws, "styles", name]),
            None => rest_path(&["styles", name]),
        };
        self.send(
            &RestRequest::delete(path)
                .query("purge", "true")
                .query("recurse", "true"),
        )
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, RestError> {
    debug!("reading {}", path.display());
    Ok(std::fs::read(path)?)
}
