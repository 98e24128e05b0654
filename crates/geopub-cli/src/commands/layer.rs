use super::run_mutation;
use clap::{Args, ValueEnum};
use geopub_core::{GeoServerManager, PostGisDatastore, StyleRef};
use std::path::Path;

/// Connection of a PostGIS database to register as a data store.
#[derive(Debug, Args)]
pub struct PostGisArgs {
    /// Database host.
    #[arg(long)]
    pub host: String,
    /// Database port.
    #[arg(long, default_value_t = 5432)]
    pub port: u16,
    /// Database user.
    #[arg(long = "db-user", default_value = "postgres")]
    pub user: String,
    /// Database password.
    #[arg(long = "db-password")]
    pub password: String,
    /// Database name.
    #[arg(long)]
    pub database: String,
    /// Schema holding the table.
    #[arg(long)]
    pub schema: Option<String>,
}

impl PostGisArgs {
    pub fn to_datastore(&self) -> PostGisDatastore {
        let mut ds = PostGisDatastore::new(&self.host, &self.password, &self.database)
            .with_port(self.port)
            .with_user(&self.user);
        if let Some(ref schema) = self.schema {
            ds = ds.with_schema(schema);
        }
        ds
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RemovableArg {
    Datastore,
    Coveragestore,
    Layer,
    Layergroup,
}

fn parse_style(style: Option<&str>) -> Result<Option<StyleRef>, String> {
    style
        .map(StyleRef::parse)
        .transpose()
        .map_err(|e| e.to_string())
}

pub fn publish_shp(
    manager: &GeoServerManager,
    workspace: &str,
    archive: &Path,
    crs: u32,
    style: Option<&str>,
    json: bool,
) -> Result<u8, String> {
    let style = parse_style(style)?;
    let target = format!("{workspace}:{}", archive.display());
    run_mutation("publish shapefile", &target, json, || {
        manager.create_shp_layer(workspace, archive, crs, style.as_ref())
    })
}

pub fn publish_postgis(
    manager: &GeoServerManager,
    workspace: &str,
    table: &str,
    db: &PostGisArgs,
    crs: u32,
    style: Option<&str>,
    json: bool,
) -> Result<u8, String> {
    let style = parse_style(style)?;
    let datastore = db.to_datastore();
    run_mutation("publish table", &format!("{workspace}:{table}"), json, || {
        manager.create_postgis_layer(&datastore, workspace, table, crs, style.as_ref())
    })
}

pub fn publish_geotiff(
    manager: &GeoServerManager,
    workspace: &str,
    layer: &str,
    raster: &Path,
    json: bool,
) -> Result<u8, String> {
    run_mutation("publish raster", &format!("{workspace}:{layer}"), json, || {
        manager.create_geotiff_layer(workspace, layer, raster)
    })
}

pub fn release_tiff(
    manager: &GeoServerManager,
    store: &str,
    raster: &Path,
    json: bool,
) -> Result<u8, String> {
    let target = format!("{}:{store}", manager.config().raster_workspace());
    run_mutation("release raster", &target, json, || {
        manager.release_tiff(store, raster)
    })
}

pub fn remove(
    manager: &GeoServerManager,
    kind: RemovableArg,
    workspace: &str,
    name: &str,
    json: bool,
) -> Result<u8, String> {
    let target = format!("{workspace}:{name}");
    match kind {
        RemovableArg::Datastore => run_mutation("remove data store", &target, json, || {
            manager.remove_data_store(workspace, name)
        }),
        RemovableArg::Coveragestore => run_mutation("remove coverage store", &target, json, || {
            manager.remove_coverage_store(workspace, name)
        }),
        RemovableArg::Layer => run_mutation("remove layer", &target, json, || {
            manager.remove_layer(workspace, name)
        }),
        RemovableArg::Layergroup => run_mutation("remove layer group", &target, json, || {
            manager.remove_layer_group(workspace, name)
        }),
    }
}

/// Remove a store from the vector or raster workspace.
pub fn remove_store(
    manager: &GeoServerManager,
    workspace: &str,
    store: &str,
    json: bool,
) -> Result<u8, String> {
    run_mutation("remove store", &format!("{workspace}:{store}"), json, || {
        manager.remove_store(workspace, store)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::EXIT_SUCCESS;
    use geopub_core::GeoServerConfig;
    use geopub_rest::mock::MockTransport;
    use std::sync::Arc;

    fn manager(mock: MockTransport) -> GeoServerManager {
        GeoServerManager::with_transport(GeoServerConfig::new("http://gs"), Arc::new(mock))
    }

    #[test]
    fn postgis_args_map_to_datastore() {
        let args = PostGisArgs {
            host: "db".to_owned(),
            port: 5433,
            user: "gis".to_owned(),
            password: "pw".to_owned(),
            database: "maps".to_owned(),
            schema: Some("public".to_owned()),
        };
        let ds = args.to_datastore();
        assert_eq!(ds.port, 5433);
        assert_eq!(ds.user, "gis");
        assert_eq!(ds.schema.as_deref(), Some("public"));
    }

    #[test]
    fn bad_style_reference_is_input_error() {
        let mgr = manager(MockTransport::new());
        let err = publish_shp(&mgr, "topp", Path::new("a.zip"), 4326, Some(":x"), false)
            .unwrap_err();
        assert!(err.starts_with("invalid input:"));
    }

    #[test]
    fn shp_with_wrong_suffix_is_input_error() {
        let mgr = manager(MockTransport::new().with_workspace("topp"));
        let err = publish_shp(&mgr, "topp", Path::new("a.shp"), 4326, None, false).unwrap_err();
        assert!(err.starts_with("invalid input:"));
    }

    #[test]
    fn postgis_store_rejection_fails() {
        let mgr = manager(
            MockTransport::new()
                .with_workspace("topp")
                .failing_store_creation(),
        );
        let args = PostGisArgs {
            host: "db".to_owned(),
            port: 5432,
            user: "postgres".to_owned(),
            password: "pw".to_owned(),
            database: "maps".to_owned(),
            schema: None,
        };
        let err = publish_postgis(&mgr, "topp", "parcels", &args, 4326, None, false).unwrap_err();
        assert_eq!(err, "data store 'parcels' failed at create store");
    }

    #[test]
    fn remove_layer_by_kind() {
        let mgr = manager(MockTransport::new().with_layer("topp", "roads"));
        assert_eq!(
            remove(&mgr, RemovableArg::Layer, "topp", "roads", false).unwrap(),
            EXIT_SUCCESS
        );
        let err = remove(&mgr, RemovableArg::Layer, "topp", "roads", false).unwrap_err();
        assert_eq!(err, "layer not found: roads");
    }

    #[test]
    fn geotiff_publish_and_guard() {
        let dir = tempfile::tempdir().unwrap();
        let raster = dir.path().join("dem.tif");
        std::fs::write(&raster, b"II*\0").unwrap();
        let mgr = manager(MockTransport::new().with_workspace("image"));
        assert_eq!(
            publish_geotiff(&mgr, "image", "dem", &raster, false).unwrap(),
            EXIT_SUCCESS
        );
        let mgr = manager(MockTransport::new());
        let err = publish_geotiff(&mgr, "nowhere", "dem", &raster, false).unwrap_err();
        assert_eq!(err, "workspace not found: nowhere");
    }
}
