use super::run_mutation;
use geopub_core::{derive_style_name, GeoServerManager};
use std::path::Path;

pub fn create(
    manager: &GeoServerManager,
    sld: &Path,
    name: Option<&str>,
    workspace: Option<&str>,
    json: bool,
) -> Result<u8, String> {
    let style_name = match name {
        Some(n) => n.to_owned(),
        None => derive_style_name(sld).map_err(|e| e.to_string())?,
    };
    let target = match workspace {
        Some(ws) => format!("{ws}:{style_name}"),
        None => style_name,
    };
    run_mutation("upload style", &target, json, || match workspace {
        Some(ws) => manager.create_style_to_workspace(ws, sld, name),
        None => manager.create_style(sld, name),
    })
}

pub fn remove(
    manager: &GeoServerManager,
    name: &str,
    workspace: Option<&str>,
    json: bool,
) -> Result<u8, String> {
    let target = match workspace {
        Some(ws) => format!("{ws}:{name}"),
        None => name.to_owned(),
    };
    run_mutation("remove style", &target, json, || {
        manager.remove_style(name, workspace)
    })
}

/// Upload `<style dir>/<style_type>.sld` into the vector workspace.
pub fn publish_from_dir(
    manager: &GeoServerManager,
    style_type: &str,
    json: bool,
) -> Result<u8, String> {
    let target = format!("{}:{style_type}", manager.config().vector_workspace());
    run_mutation("publish style", &target, json, || {
        manager.publish_style_from_dir(style_type)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{EXIT_FAILURE, EXIT_SUCCESS};
    use geopub_core::GeoServerConfig;
    use geopub_rest::mock::MockTransport;
    use std::sync::Arc;

    #[test]
    fn upload_then_duplicate_then_remove() {
        let dir = tempfile::tempdir().unwrap();
        let sld = dir.path().join("roads.sld");
        std::fs::write(&sld, "<StyledLayerDescriptor/>").unwrap();
        let mgr = GeoServerManager::with_transport(
            GeoServerConfig::new("http://gs"),
            Arc::new(MockTransport::new()),
        );

        assert_eq!(create(&mgr, &sld, None, None, false).unwrap(), EXIT_SUCCESS);
        let err = create(&mgr, &sld, None, None, false).unwrap_err();
        assert_eq!(err, "style already exists: roads");
        assert_eq!(remove(&mgr, "roads", None, false).unwrap(), EXIT_SUCCESS);
    }

    #[test]
    fn publish_from_dir_twice_publishes_once() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("line.sld"), "<StyledLayerDescriptor/>").unwrap();
        let mgr = GeoServerManager::with_transport(
            GeoServerConfig::new("http://gs").with_style_dir(dir.path()),
            Arc::new(MockTransport::new()),
        );
        assert_eq!(publish_from_dir(&mgr, "line", false).unwrap(), EXIT_SUCCESS);
        assert_eq!(publish_from_dir(&mgr, "line", false).unwrap(), EXIT_FAILURE);
    }
}
