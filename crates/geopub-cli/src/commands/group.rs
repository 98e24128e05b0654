use super::run_mutation;
use geopub_core::GeoServerManager;

/// Create a layer group from `workspace:layer` refs, bottom layer first.
pub fn create(
    manager: &GeoServerManager,
    workspace: &str,
    name: &str,
    layers: &[String],
    json: bool,
) -> Result<u8, String> {
    let refs: Vec<&str> = layers.iter().map(String::as_str).collect();
    run_mutation("create layer group", &format!("{workspace}:{name}"), json, || {
        manager.create_layer_group(workspace, name, &refs)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::EXIT_SUCCESS;
    use geopub_core::GeoServerConfig;
    use geopub_rest::mock::MockTransport;
    use std::sync::Arc;

    #[test]
    fn group_reports_first_missing_layer() {
        let mgr = GeoServerManager::with_transport(
            GeoServerConfig::new("http://gs"),
            Arc::new(MockTransport::new().with_layer("topp", "roads")),
        );
        let layers = vec!["topp:roads".to_owned(), "topp:rivers".to_owned()];
        let err = create(&mgr, "topp", "base", &layers, false).unwrap_err();
        assert_eq!(err, "layer not found: rivers");

        let layers = vec!["topp:roads".to_owned()];
        assert_eq!(create(&mgr, "topp", "base", &layers, true).unwrap(), EXIT_SUCCESS);
    }
}
