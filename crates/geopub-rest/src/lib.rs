//! REST plumbing for a GeoServer-style administrative API.
//!
//! This crate provides the transport seam ([`RestTransport`]) with a blocking
//! HTTP implementation and an in-memory fake, JSON encoders and decoders for the
//! admin resources, and [`Publisher`], which maps admin verbs (create workspace,
//! upload a shapefile, delete a store, ...) onto REST requests. It performs no
//! existence checks of its own; guards live one layer up.

pub mod config;
pub mod decoder;
pub mod encoder;
pub mod http;
pub mod mock;
pub mod publisher;

pub use config::RestEndpoint;
pub use decoder::{decode_names, ListKind};
pub use encoder::{
    FeatureTypeInfo, LayerGroupInfo, LayerSettings, PostGisDatastore, StoreKind, StoreRef,
};
pub use publisher::{Publisher, ShpUpload};

use std::fmt;
use thiserror::Error;

/// Media type GeoServer expects for SLD 1.0 documents.
pub const SLD_MEDIA_TYPE: &str = "application/vnd.ogc.sld+xml";

#[derive(Debug, Error)]
pub enum RestError {
    #[error("rest I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("unauthorized: HTTP {status} for {url}")]
    Unauthorized { status: u16, url: String },
    #[error("unexpected HTTP {status} for {method} {path}")]
    UnexpectedStatus {
        method: Method,
        path: String,
        status: u16,
    },
    #[error("serialization error: {0}")]
    Serialization(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }

    /// Whether a request with this method changes server state.
    pub fn is_mutating(self) -> bool {
        !matches!(self, Method::Get)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Join path segments below `rest/`, percent-encoding each one.
///
/// Resource names are free text; a `#`, `?` or `/` inside a name must not
/// change which resource the path addresses.
pub fn rest_path(segments: &[&str]) -> String {
    segments
        .iter()
        .map(|s| urlencoding::encode(s))
        .collect::<Vec<_>>()
        .join("/")
}

/// One request against the admin API.
///
/// `path` is relative to the `rest/` root, e.g. `workspaces/topp/datastores`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl RestRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: vec![("Accept".to_owned(), "application/json".to_owned())],
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    #[must_use]
    pub fn query(mut self, key: &str, value: &str) -> Self {
        self.query.push((key.to_owned(), value.to_owned()));
        self
    }

    #[must_use]
    pub fn header(mut self, key: &str, value: &str) -> Self {
        self.headers.push((key.to_owned(), value.to_owned()));
        self
    }

    /// Attach a body and its `Content-type` header.
    #[must_use]
    pub fn body(self, content_type: &str, data: Vec<u8>) -> Self {
        let mut req = self.header("Content-type", content_type);
        req.body = Some(data);
        req
    }

    /// Attach a JSON body.
    pub fn json(self, value: &impl serde::Serialize) -> Result<Self, RestError> {
        let data =
            serde_json::to_vec(value).map_err(|e| RestError::Serialization(e.to_string()))?;
        Ok(self.body("application/json", data))
    }

    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn header_value(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .rev()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RestResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Transport for the admin API.
///
/// Implementations return every HTTP status as a [`RestResponse`] and reserve
/// `Err` for failures of the exchange itself (connection, authentication, I/O).
pub trait RestTransport: Send + Sync {
    fn execute(&self, request: &RestRequest) -> Result<RestResponse, RestError>;

    /// `GET` a resource: 200 means present, 404 absent, anything else is an error.
    fn exists(&self, path: &str) -> Result<bool, RestError> {
        let request = RestRequest::get(path);
        let resp = self.execute(&request)?;
        match resp.status {
            200 => Ok(true),
            404 => Ok(false),
            status => Err(RestError::UnexpectedStatus {
                method: Method::Get,
                path: path.to_owned(),
                status,
            }),
        }
    }

    /// `GET` a collection and decode its member names.
    fn list(&self, path: &str, kind: ListKind) -> Result<Vec<String>, RestError> {
        let request = RestRequest::get(path);
        let resp = self.execute(&request)?;
        if resp.status != 200 {
            return Err(RestError::UnexpectedStatus {
                method: Method::Get,
                path: path.to_owned(),
                status: resp.status,
            });
        }
        decode_names(&resp.body, kind)
    }
}
