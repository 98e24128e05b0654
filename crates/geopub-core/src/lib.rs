//! Guarded orchestration of map-publishing resources on a GeoServer instance.
//!
//! [`GeoServerManager`] creates and removes workspaces, stores, layers, layer
//! groups and styles. Every create first checks that the target is absent and
//! every remove that it is present, using [`GeoServerReader`], so each call ends
//! in either the server's verdict or exactly one [`GeoError`]. Styles go through
//! the two-call upload in [`style`]. Nothing is cached; every guard re-queries
//! the server.

pub mod config;
pub mod manager;
pub mod reader;
pub mod style;

pub use config::{ConfigError, GeoServerConfig};
pub use geopub_rest::{PostGisDatastore, RestError, StoreKind, StoreRef};
pub use manager::{GeoServerManager, ShpPublishRequest, StyleRef};
pub use reader::GeoServerReader;
pub use style::{derive_style_name, format_sld_body, StyleScope};

use std::fmt;
use thiserror::Error;

/// Kinds of resources named in errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Workspace,
    DataStore,
    CoverageStore,
    Layer,
    LayerGroup,
    Style,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResourceKind::Workspace => "workspace",
            ResourceKind::DataStore => "data store",
            ResourceKind::CoverageStore => "coverage store",
            ResourceKind::Layer => "layer",
            ResourceKind::LayerGroup => "layer group",
            ResourceKind::Style => "style",
        })
    }
}

#[derive(Debug, Error)]
pub enum GeoError {
    #[error("workspace not found: {0}")]
    WorkspaceNotFound(String),
    #[error("layer not found: {0}")]
    LayerNotFound(String),
    #[error("layer group not found: {0}")]
    LayerGroupNotFound(String),
    #[error("data store not found: {0}")]
    DataSourceNotFound(String),
    #[error("coverage store not found: {0}")]
    CoverageStoreNotFound(String),
    #[error("style not found: {0}")]
    StyleServiceNotFound(String),
    #[error("{kind} already exists: {name}")]
    AlreadyExists { kind: ResourceKind, name: String },
    #[error("invalid input: {0}")]
    InputError(String),
    #[error("{kind} '{name}' failed at {stage}")]
    OperationFailed {
        kind: ResourceKind,
        name: String,
        stage: String,
    },
    #[error("transport error: {0}")]
    Transport(#[from] RestError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GeoError {
    pub(crate) fn exists(kind: ResourceKind, name: &str) -> Self {
        GeoError::AlreadyExists {
            kind,
            name: name.to_owned(),
        }
    }
}
