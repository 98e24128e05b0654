use crate::config::GeoServerConfig;
use crate::reader::GeoServerReader;
use crate::style::{self, StyleScope};
use crate::{GeoError, ResourceKind};
use geopub_rest::http::HttpTransport;
use geopub_rest::{
    FeatureTypeInfo, LayerGroupInfo, LayerSettings, PostGisDatastore, Publisher, RestError,
    RestTransport, ShpUpload, StoreRef,
};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

const DEFAULT_CRS: &str = "EPSG:4326";

/// A style reference, optionally qualified by the style's own workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleRef {
    pub name: String,
    pub workspace: Option<String>,
}

impl StyleRef {
    pub fn global(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            workspace: None,
        }
    }

    pub fn in_workspace(workspace: &str, name: &str) -> Self {
        Self {
            name: name.to_owned(),
            workspace: Some(workspace.to_owned()),
        }
    }

    /// Parse `name` or `workspace:name`.
    pub fn parse(input: &str) -> Result<Self, GeoError> {
        match input.split_once(':') {
            Some((ws, name)) if !ws.is_empty() && !name.is_empty() => {
                Ok(Self::in_workspace(ws, name))
            }
            None if !input.is_empty() => Ok(Self::global(input)),
            _ => Err(GeoError::InputError(format!(
                "style reference '{input}' is not 'name' or 'workspace:name'"
            ))),
        }
    }

    /// `workspace:name` when scoped, else `name`.
    pub fn qualified(&self) -> String {
        match self.workspace {
            Some(ref ws) => format!("{ws}:{}", self.name),
            None => self.name.clone(),
        }
    }
}

impl fmt::Display for StyleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified())
    }
}

/// Unguarded shapefile publish with an explicit store name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShpPublishRequest {
    pub workspace: String,
    pub store: String,
    pub archive: PathBuf,
    pub style: Option<String>,
    pub crs: String,
    pub charset: Option<String>,
}

impl ShpPublishRequest {
    pub fn new(workspace: &str, store: &str, archive: impl Into<PathBuf>) -> Self {
        Self {
            workspace: workspace.to_owned(),
            store: store.to_owned(),
            archive: archive.into(),
            style: None,
            crs: DEFAULT_CRS.to_owned(),
            charset: None,
        }
    }

    #[must_use]
    pub fn with_style(mut self, style: &str) -> Self {
        self.style = Some(style.to_owned());
        self
    }

    #[must_use]
    pub fn with_crs(mut self, crs: &str) -> Self {
        self.crs = crs.to_owned();
        self
    }

    #[must_use]
    pub fn with_charset(mut self, charset: &str) -> Self {
        self.charset = Some(charset.to_owned());
        self
    }
}

/// Guarded create and remove operations.
///
/// Every create checks that its target is absent and every remove that its
/// target is present before anything is sent. `Ok(bool)` is the server's own
/// verdict on the mutating call; guard failures and bad input are `Err`.
pub struct GeoServerManager {
    config: GeoServerConfig,
    transport: Arc<dyn RestTransport>,
    reader: GeoServerReader,
}

impl GeoServerManager {
    /// Manager talking HTTP to the configured server.
    pub fn new(config: GeoServerConfig) -> Self {
        let transport = Arc::new(HttpTransport::new(config.endpoint()));
        Self::with_transport(config, transport)
    }

    pub fn with_transport(config: GeoServerConfig, transport: Arc<dyn RestTransport>) -> Self {
        let reader = GeoServerReader::new(Arc::clone(&transport));
        Self {
            config,
            transport,
            reader,
        }
    }

    pub fn config(&self) -> &GeoServerConfig {
        &self.config
    }

    pub fn reader(&self) -> &GeoServerReader {
        &self.reader
    }

    fn publisher(&self) -> Publisher<'_> {
        Publisher::new(self.transport.as_ref())
    }

    fn require_workspace(&self, workspace: &str) -> Result<(), GeoError> {
        present(self.reader.exists_workspace(workspace)?, || {
            GeoError::WorkspaceNotFound(workspace.to_owned())
        })
    }

    fn require_style(&self, style: &StyleRef) -> Result<(), GeoError> {
        let found = match style.workspace {
            Some(ref ws) => self.reader.exists_style_in_workspace(ws, &style.name)?,
            None => self.reader.exists_style(&style.name)?,
        };
        present(found, || GeoError::StyleServiceNotFound(style.qualified()))
    }

    // Workspaces

    /// Create a workspace, with a namespace URI when `uri` is given.
    pub fn create_workspace(&self, name: &str, uri: Option<&str>) -> Result<bool, GeoError> {
        absent(
            self.reader.exists_workspace(name)?,
            ResourceKind::Workspace,
            name,
        )?;
        let publisher = self.publisher();
        Ok(match uri {
            Some(uri) => publisher.create_namespace(name, uri)?,
            None => publisher.create_workspace(name)?,
        })
    }

    /// Remove a workspace and everything in it.
    pub fn remove_workspace(&self, name: &str) -> Result<bool, GeoError> {
        self.require_workspace(name)?;
        Ok(self.publisher().remove_workspace(name)?)
    }

    /// Create `name` if missing. `Ok(false)` when it already existed.
    pub fn ensure_workspace(&self, name: &str) -> Result<bool, GeoError> {
        if self.reader.exists_workspace(name)? {
            info!("workspace {name} already exists");
            return Ok(false);
        }
        let created = self.publisher().create_workspace(name)?;
        if created {
            info!("created workspace {name}");
        }
        Ok(created)
    }

    // Vector and raster layers

    /// Publish a zipped shapefile as store and layer named after the archive.
    pub fn create_shp_layer(
        &self,
        workspace: &str,
        archive: &Path,
        crs_code: u32,
        style: Option<&StyleRef>,
    ) -> Result<bool, GeoError> {
        let name = archive_stem(archive)?;
        self.require_workspace(workspace)?;
        absent(
            self.reader.exists_layer(workspace, &name)?,
            ResourceKind::Layer,
            &name,
        )?;
        if let Some(style) = style {
            self.require_style(style)?;
        }

        let upload = ShpUpload {
            workspace: workspace.to_owned(),
            store: name,
            archive: archive.to_path_buf(),
            srs: epsg(crs_code),
            style: style.map(StyleRef::qualified),
            charset: self.config.shapefile.charset.clone(),
        };
        self.publisher().publish_shp(&upload).map_err(lift)
    }

    /// Register a PostGIS table as store and layer, both named after `table`.
    pub fn create_postgis_layer(
        &self,
        datastore: &PostGisDatastore,
        workspace: &str,
        table: &str,
        crs_code: u32,
        style: Option<&StyleRef>,
    ) -> Result<bool, GeoError> {
        absent(
            self.reader.exists_datastore(workspace, table)?,
            ResourceKind::DataStore,
            table,
        )?;
        absent(
            self.reader.exists_layer(workspace, table)?,
            ResourceKind::Layer,
            table,
        )?;
        if let Some(style) = style {
            self.require_style(style)?;
        }

        let publisher = self.publisher();
        if !publisher.create_postgis_store(workspace, table, datastore)? {
            warn!("data store {table} was not created in {workspace}");
            return Err(GeoError::OperationFailed {
                kind: ResourceKind::DataStore,
                name: table.to_owned(),
                stage: "create store".to_owned(),
            });
        }

        let feature_type = FeatureTypeInfo::for_table(table, &epsg(crs_code));
        let settings = match style {
            Some(style) => LayerSettings::with_default_style(&style.qualified()),
            None => LayerSettings::default(),
        };
        Ok(publisher.publish_db_layer(workspace, table, &feature_type, &settings)?)
    }

    pub fn create_geotiff_layer(
        &self,
        workspace: &str,
        layer: &str,
        raster: &Path,
    ) -> Result<bool, GeoError> {
        absent(
            self.reader.exists_layer(workspace, layer)?,
            ResourceKind::Layer,
            layer,
        )?;
        self.publisher()
            .publish_geotiff(workspace, layer, raster)
            .map_err(lift)
    }

    /// Group existing layers, keeping the order of `refs`.
    ///
    /// Every ref must read `workspace:layer`. The first ref that does not
    /// resolve aborts the call before anything is created.
    pub fn create_layer_group(
        &self,
        workspace: &str,
        name: &str,
        refs: &[&str],
    ) -> Result<bool, GeoError> {
        if refs.is_empty() {
            return Err(GeoError::InputError(format!(
                "layer group {name} needs at least one layer"
            )));
        }
        let parsed = refs
            .iter()
            .copied()
            .map(parse_layer_ref)
            .collect::<Result<Vec<_>, _>>()?;

        absent(
            self.reader.exists_layer_group(workspace, name)?,
            ResourceKind::LayerGroup,
            name,
        )?;

        let mut group = LayerGroupInfo::new(workspace, name);
        for (layer_ws, layer) in parsed {
            let found = self.reader.exists_workspace(layer_ws)?
                && self.reader.exists_layer(layer_ws, layer)?;
            present(found, || GeoError::LayerNotFound(layer.to_owned()))?;
            group.add_layer(&format!("{layer_ws}:{layer}"));
        }
        Ok(self.publisher().create_layer_group(&group)?)
    }

    // Removal

    pub fn remove_data_store(&self, workspace: &str, name: &str) -> Result<bool, GeoError> {
        present(self.reader.exists_datastore(workspace, name)?, || {
            GeoError::DataSourceNotFound(name.to_owned())
        })?;
        Ok(self
            .publisher()
            .remove_store(workspace, &StoreRef::data_store(name))?)
    }

    pub fn remove_coverage_store(&self, workspace: &str, name: &str) -> Result<bool, GeoError> {
        present(self.reader.exists_coverage_store(workspace, name)?, || {
            GeoError::CoverageStoreNotFound(name.to_owned())
        })?;
        Ok(self
            .publisher()
            .remove_store(workspace, &StoreRef::coverage_store(name))?)
    }

    pub fn remove_layer(&self, workspace: &str, name: &str) -> Result<bool, GeoError> {
        present(self.reader.exists_layer(workspace, name)?, || {
            GeoError::LayerNotFound(name.to_owned())
        })?;
        Ok(self.publisher().remove_layer(workspace, name)?)
    }

    pub fn remove_layer_group(&self, workspace: &str, name: &str) -> Result<bool, GeoError> {
        present(self.reader.exists_layer_group(workspace, name)?, || {
            GeoError::LayerGroupNotFound(name.to_owned())
        })?;
        Ok(self.publisher().remove_layer_group(workspace, name)?)
    }

    /// Remove a store from one of the reserved workspaces.
    ///
    /// The vector workspace holds data stores and the raster workspace holds
    /// coverage stores; any other workspace is rejected.
    pub fn remove_store(&self, workspace: &str, store: &str) -> Result<bool, GeoError> {
        if workspace == self.config.vector_workspace() {
            self.remove_data_store(workspace, store)
        } else if workspace == self.config.raster_workspace() {
            self.remove_coverage_store(workspace, store)
        } else {
            Err(GeoError::InputError(format!(
                "{workspace} is neither the vector nor the raster workspace"
            )))
        }
    }

    // Styles

    /// Upload a global style. The name defaults to the file name up to `.sld`.
    pub fn create_style(&self, sld: &Path, name: Option<&str>) -> Result<bool, GeoError> {
        self.create_style_in(&StyleScope::Global, sld, name)
    }

    pub fn create_style_to_workspace(
        &self,
        workspace: &str,
        sld: &Path,
        name: Option<&str>,
    ) -> Result<bool, GeoError> {
        self.create_style_in(&StyleScope::Workspace(workspace.to_owned()), sld, name)
    }

    fn create_style_in(
        &self,
        scope: &StyleScope,
        sld: &Path,
        name: Option<&str>,
    ) -> Result<bool, GeoError> {
        let name = match name {
            Some(name) => {
                style::validate_style_name(name)?;
                name.to_owned()
            }
            None => style::derive_style_name(sld)?,
        };
        let found = match scope {
            StyleScope::Global => self.reader.exists_style(&name)?,
            StyleScope::Workspace(ws) => self.reader.exists_style_in_workspace(ws, &name)?,
        };
        absent(found, ResourceKind::Style, &name)?;

        let document = std::fs::read_to_string(sld)?;
        style::upload_style(self.transport.as_ref(), scope, &name, &document)
    }

    /// Remove a style and purge its SLD document.
    pub fn remove_style(&self, name: &str, workspace: Option<&str>) -> Result<bool, GeoError> {
        let found = match workspace {
            Some(ws) => self.reader.exists_style_in_workspace(ws, name)?,
            None => self.reader.exists_style(name)?,
        };
        present(found, || {
            let style = StyleRef {
                name: name.to_owned(),
                workspace: workspace.map(str::to_owned),
            };
            GeoError::StyleServiceNotFound(style.qualified())
        })?;
        Ok(self.publisher().remove_style(workspace, name)?)
    }

    // Reserved-workspace helpers

    /// Publish a shapefile as given, without existence guards.
    pub fn publish_shp(&self, request: &ShpPublishRequest) -> Result<bool, GeoError> {
        let upload = ShpUpload {
            workspace: request.workspace.clone(),
            store: request.store.clone(),
            archive: request.archive.clone(),
            srs: request.crs.clone(),
            style: request.style.clone(),
            charset: request
                .charset
                .clone()
                .or_else(|| self.config.shapefile.charset.clone()),
        };
        self.publisher().publish_shp(&upload).map_err(lift)
    }

    /// Upload `<style dir>/<style_type>.sld` into the vector workspace.
    ///
    /// `Ok(false)` when a style of that name is already there.
    pub fn publish_style_from_dir(&self, style_type: &str) -> Result<bool, GeoError> {
        style::validate_style_name(style_type)?;
        let workspace = self.config.vector_workspace();
        self.ensure_workspace(workspace)?;
        if self.reader.exists_style_in_workspace(workspace, style_type)? {
            info!("style {style_type} already published in {workspace}");
            return Ok(false);
        }
        let path = self.config.style_dir().join(format!("{style_type}.sld"));
        let document = std::fs::read_to_string(&path)?;
        style::upload_style(
            self.transport.as_ref(),
            &StyleScope::Workspace(workspace.to_owned()),
            style_type,
            &document,
        )
    }

    /// Publish a GeoTIFF into the raster workspace unless `store` exists there.
    pub fn release_tiff(&self, store: &str, raster: &Path) -> Result<bool, GeoError> {
        let workspace = self.config.raster_workspace();
        self.ensure_workspace(workspace)?;
        if self.reader.exists_coverage_store(workspace, store)? {
            info!("coverage store {store} already published in {workspace}");
            return Ok(false);
        }
        self.publisher()
            .publish_geotiff(workspace, store, raster)
            .map_err(lift)
    }
}

fn present(found: bool, missing: impl FnOnce() -> GeoError) -> Result<(), GeoError> {
    if found {
        Ok(())
    } else {
        let err = missing();
        warn!("{err}");
        Err(err)
    }
}

fn absent(found: bool, kind: ResourceKind, name: &str) -> Result<(), GeoError> {
    if found {
        let err = GeoError::exists(kind, name);
        warn!("{err}");
        Err(err)
    } else {
        Ok(())
    }
}

/// Local file errors surface as `Io`, everything else as `Transport`.
fn lift(err: RestError) -> GeoError {
    match err {
        RestError::Io(e) => GeoError::Io(e),
        other => GeoError::Transport(other),
    }
}

fn epsg(code: u32) -> String {
    format!("EPSG:{code}")
}

fn archive_stem(archive: &Path) -> Result<String, GeoError> {
    let file_name = archive
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    match file_name.strip_suffix(".zip") {
        Some(stem) if !stem.is_empty() => Ok(stem.to_owned()),
        _ => Err(GeoError::InputError(format!(
            "{} is not a .zip archive",
            archive.display()
        ))),
    }
}

fn parse_layer_ref(input: &str) -> Result<(&str, &str), GeoError> {
    match input.split_once(':') {
        Some((ws, layer)) if !ws.is_empty() && !layer.is_empty() && !layer.contains(':') => {
            Ok((ws, layer))
        }
        _ => Err(GeoError::InputError(format!(
            "layer reference '{input}' is not 'workspace:layer'"
        ))),
    }
}
