use crate::GeoError;
use geopub_rest::{rest_path, ListKind, RestTransport};
use std::sync::Arc;

/// Read-only existence and listing queries.
///
/// Queries scoped to a workspace first check that the workspace exists and
/// fail with [`GeoError::WorkspaceNotFound`] otherwise. Nothing is cached.
#[derive(Clone)]
pub struct GeoServerReader {
    transport: Arc<dyn RestTransport>,
}

impl GeoServerReader {
    pub fn new(transport: Arc<dyn RestTransport>) -> Self {
        Self { transport }
    }

    fn require_workspace(&self, workspace: &str) -> Result<(), GeoError> {
        if self.exists_workspace(workspace)? {
            Ok(())
        } else {
            Err(GeoError::WorkspaceNotFound(workspace.to_owned()))
        }
    }

    fn scoped_exists(
        &self,
        workspace: &str,
        collection: &str,
        name: &str,
    ) -> Result<bool, GeoError> {
        self.require_workspace(workspace)?;
        let path = rest_path(&["workspaces", workspace, collection, name]);
        Ok(self.transport.exists(&path)?)
    }

    fn scoped_list(
        &self,
        workspace: &str,
        collection: &str,
        kind: ListKind,
    ) -> Result<Vec<String>, GeoError> {
        self.require_workspace(workspace)?;
        Ok(self
            .transport
            .list(&rest_path(&["workspaces", workspace, collection]), kind)?)
    }

    pub fn exists_workspace(&self, workspace: &str) -> Result<bool, GeoError> {
        Ok(self.transport.exists(&rest_path(&["workspaces", workspace]))?)
    }

    pub fn workspaces(&self) -> Result<Vec<String>, GeoError> {
        Ok(self.transport.list("workspaces", ListKind::Workspaces)?)
    }

    pub fn exists_datastore(&self, workspace: &str, datastore: &str) -> Result<bool, GeoError> {
        self.scoped_exists(workspace, "datastores", datastore)
    }

    pub fn datastores(&self, workspace: &str) -> Result<Vec<String>, GeoError> {
        self.scoped_list(workspace, "datastores", ListKind::DataStores)
    }

    pub fn exists_coverage_store(&self, workspace: &str, store: &str) -> Result<bool, GeoError> {
        self.scoped_exists(workspace, "coveragestores", store)
    }

    pub fn coverage_stores(&self, workspace: &str) -> Result<Vec<String>, GeoError> {
        self.scoped_list(workspace, "coveragestores", ListKind::CoverageStores)
    }

    pub fn exists_layer(&self, workspace: &str, layer: &str) -> Result<bool, GeoError> {
        self.scoped_exists(workspace, "layers", layer)
    }

    pub fn layers(&self, workspace: &str) -> Result<Vec<String>, GeoError> {
        self.scoped_list(workspace, "layers", ListKind::Layers)
    }

    /// Every layer on the server, as `workspace:layer`.
    pub fn all_layers(&self) -> Result<Vec<String>, GeoError> {
        Ok(self.transport.list("layers", ListKind::Layers)?)
    }

    pub fn exists_layer_group(&self, workspace: &str, group: &str) -> Result<bool, GeoError> {
        self.scoped_exists(workspace, "layergroups", group)
    }

    pub fn layer_groups(&self, workspace: &str) -> Result<Vec<String>, GeoError> {
        self.scoped_list(workspace, "layergroups", ListKind::LayerGroups)
    }

    /// Global styles only; workspace styles are not visible here.
    pub fn exists_style(&self, name: &str) -> Result<bool, GeoError> {
        Ok(self.transport.exists(&rest_path(&["styles", name]))?)
    }

    pub fn styles(&self) -> Result<Vec<String>, GeoError> {
        Ok(self.transport.list("styles", ListKind::Styles)?)
    }

    pub fn exists_style_in_workspace(&self, workspace: &str, name: &str) -> Result<bool, GeoError> {
        self.scoped_exists(workspace, "styles", name)
    }

    pub fn styles_in_workspace(&self, workspace: &str) -> Result<Vec<String>, GeoError> {
        self.scoped_list(workspace, "styles", ListKind::Styles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geopub_rest::mock::MockTransport;
    use geopub_rest::{RestError, RestRequest, RestResponse};

    fn reader(mock: MockTransport) -> (Arc<MockTransport>, GeoServerReader) {
        let mock = Arc::new(mock);
        let reader = GeoServerReader::new(Arc::clone(&mock) as Arc<dyn RestTransport>);
        (mock, reader)
    }

    #[test]
    fn workspace_existence() {
        let (_, r) = reader(MockTransport::new().with_workspace("topp"));
        assert!(r.exists_workspace("topp").unwrap());
        assert!(!r.exists_workspace("nurc").unwrap());
    }

    #[test]
    fn scoped_query_requires_workspace() {
        let (mock, r) = reader(MockTransport::new());
        let err = r.exists_datastore("topp", "roads").unwrap_err();
        assert!(matches!(err, GeoError::WorkspaceNotFound(ref ws) if ws == "topp"));
        // Only the workspace probe was sent.
        assert_eq!(mock.requests().len(), 1);
    }

    #[test]
    fn layer_and_store_queries() {
        let (_, r) = reader(
            MockTransport::new()
                .with_layer("topp", "roads")
                .with_coverage_store("topp", "dem"),
        );
        assert!(r.exists_layer("topp", "roads").unwrap());
        assert!(!r.exists_layer("topp", "rivers").unwrap());
        assert!(r.exists_datastore("topp", "roads").unwrap());
        assert!(r.exists_coverage_store("topp", "dem").unwrap());
        assert!(!r.exists_coverage_store("topp", "roads").unwrap());
    }

    #[test]
    fn listings_decode_names() {
        let (_, r) = reader(
            MockTransport::new()
                .with_layer("topp", "roads")
                .with_layer("topp", "rivers")
                .with_layer_group("topp", "base", &["topp:roads"]),
        );
        assert_eq!(r.workspaces().unwrap(), vec!["topp"]);
        assert_eq!(r.layers("topp").unwrap(), vec!["rivers", "roads"]);
        assert_eq!(r.layer_groups("topp").unwrap(), vec!["base"]);
        assert_eq!(r.all_layers().unwrap(), vec!["topp:rivers", "topp:roads"]);
        assert!(r.coverage_stores("topp").unwrap().is_empty());
    }

    #[test]
    fn style_scopes_are_separate() {
        let (_, r) = reader(
            MockTransport::new()
                .with_style(None, "line")
                .with_style(Some("topp"), "roads"),
        );
        assert!(r.exists_style("line").unwrap());
        assert!(!r.exists_style("roads").unwrap());
        assert!(r.exists_style_in_workspace("topp", "roads").unwrap());
        assert!(!r.exists_style_in_workspace("topp", "line").unwrap());
        assert_eq!(r.styles().unwrap(), vec!["line"]);
        assert_eq!(r.styles_in_workspace("topp").unwrap(), vec!["roads"]);
    }

    struct BrokenServer;

    impl RestTransport for BrokenServer {
        fn execute(&self, _request: &RestRequest) -> Result<RestResponse, RestError> {
            Ok(RestResponse::new(500, "boom"))
        }
    }

    #[test]
    fn unexpected_status_propagates() {
        let r = GeoServerReader::new(Arc::new(BrokenServer));
        let err = r.exists_workspace("topp").unwrap_err();
        assert!(matches!(
            err,
            GeoError::Transport(RestError::UnexpectedStatus { status: 500, .. })
        ));
    }

    #[test]
    fn transport_failure_propagates() {
        let (_, r) = reader(MockTransport::new().offline());
        assert!(matches!(
            r.workspaces().unwrap_err(),
            GeoError::Transport(RestError::Http(_))
        ));
    }
}
