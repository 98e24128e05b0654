use geopub_rest::RestEndpoint;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    ParseToml(#[from] toml::de::Error),
    #[error("server.url must start with http:// or https://, got '{0}'")]
    InvalidUrl(String),
    #[error("{0} must not be empty")]
    EmptyField(&'static str),
    #[error("HOME not set and GEOPUB_CONFIG not given")]
    NoHome,
}

/// Connection and naming settings, fixed for the lifetime of a manager.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct GeoServerConfig {
    pub server: ServerSection,
    #[serde(default)]
    pub workspaces: WorkspacesSection,
    #[serde(default)]
    pub styles: StylesSection,
    #[serde(default)]
    pub shapefile: ShapefileSection,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    pub url: String,
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default = "default_password")]
    pub password: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// Workspaces reserved for vector and raster uploads.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct WorkspacesSection {
    #[serde(default = "default_vector_workspace")]
    pub vector: String,
    #[serde(default = "default_raster_workspace")]
    pub raster: String,
}

impl Default for WorkspacesSection {
    fn default() -> Self {
        Self {
            vector: default_vector_workspace(),
            raster: default_raster_workspace(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct StylesSection {
    /// Local directory holding `<name>.sld` documents.
    #[serde(default = "default_style_dir")]
    pub dir: PathBuf,
}

impl Default for StylesSection {
    fn default() -> Self {
        Self {
            dir: default_style_dir(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ShapefileSection {
    /// Character set of shapefile attribute tables, e.g. `GBK`.
    #[serde(default)]
    pub charset: Option<String>,
}

fn default_username() -> String {
    "admin".to_owned()
}

fn default_password() -> String {
    "geoserver".to_owned()
}

fn default_timeout() -> u64 {
    30
}

fn default_vector_workspace() -> String {
    "shp".to_owned()
}

fn default_raster_workspace() -> String {
    "image".to_owned()
}

fn default_style_dir() -> PathBuf {
    PathBuf::from("styles")
}

impl GeoServerConfig {
    pub fn new(url: &str) -> Self {
        Self {
            server: ServerSection {
                url: url.trim_end_matches('/').to_owned(),
                username: default_username(),
                password: default_password(),
                timeout_secs: default_timeout(),
            },
            workspaces: WorkspacesSection::default(),
            styles: StylesSection::default(),
            shapefile: ShapefileSection::default(),
        }
    }

    #[must_use]
    pub fn with_credentials(mut self, username: &str, password: &str) -> Self {
        self.server.username = username.to_owned();
        self.server.password = password.to_owned();
        self
    }

    #[must_use]
    pub fn with_workspaces(mut self, vector: &str, raster: &str) -> Self {
        self.workspaces.vector = vector.to_owned();
        self.workspaces.raster = raster.to_owned();
        self
    }

    #[must_use]
    pub fn with_style_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.styles.dir = dir.into();
        self
    }

    #[must_use]
    pub fn with_charset(mut self, charset: &str) -> Self {
        self.shapefile.charset = Some(charset.to_owned());
        self
    }

    pub fn parse(input: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(input)?;
        config.server.url = config.server.url.trim_end_matches('/').to_owned();
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Load from `$GEOPUB_CONFIG`, else `~/.config/geopub/config.toml`.
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load(&default_config_path()?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = &self.server.url;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidUrl(url.clone()));
        }
        if self.server.username.is_empty() {
            return Err(ConfigError::EmptyField("server.username"));
        }
        if self.workspaces.vector.is_empty() {
            return Err(ConfigError::EmptyField("workspaces.vector"));
        }
        if self.workspaces.raster.is_empty() {
            return Err(ConfigError::EmptyField("workspaces.raster"));
        }
        Ok(())
    }

    pub fn endpoint(&self) -> RestEndpoint {
        RestEndpoint::new(&self.server.url)
            .with_credentials(&self.server.username, &self.server.password)
            .with_timeout(self.server.timeout_secs)
    }

    pub fn vector_workspace(&self) -> &str {
        &self.workspaces.vector
    }

    pub fn raster_workspace(&self) -> &str {
        &self.workspaces.raster
    }

    pub fn style_dir(&self) -> &Path {
        &self.styles.dir
    }
}

pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    if let Ok(path) = std::env::var("GEOPUB_CONFIG") {
        return Ok(PathBuf::from(path));
    }
    let home = std::env::var("HOME").map_err(|_| ConfigError::NoHome)?;
    Ok(PathBuf::from(home).join(".config/geopub/config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_config() {
        let config = GeoServerConfig::parse(
            r#"
[server]
url = "http://localhost:8080/geoserver/"
username = "ops"
password = "s3cret"
timeout_secs = 5

[workspaces]
vector = "vectors"
raster = "rasters"

[styles]
dir = "/srv/styles"

[shapefile]
charset = "GBK"
"#,
        )
        .unwrap();
        assert_eq!(config.server.url, "http://localhost:8080/geoserver");
        assert_eq!(config.vector_workspace(), "vectors");
        assert_eq!(config.raster_workspace(), "rasters");
        assert_eq!(config.style_dir(), Path::new("/srv/styles"));
        assert_eq!(config.shapefile.charset.as_deref(), Some("GBK"));

        let endpoint = config.endpoint();
        assert_eq!(endpoint.username, "ops");
        assert_eq!(endpoint.timeout_secs, 5);
    }

    #[test]
    fn parse_minimal_config_uses_defaults() {
        let config = GeoServerConfig::parse("[server]\nurl = \"https://gs.example.com\"\n").unwrap();
        assert_eq!(config.server.username, "admin");
        assert_eq!(config.server.password, "geoserver");
        assert_eq!(config.vector_workspace(), "shp");
        assert_eq!(config.raster_workspace(), "image");
        assert!(config.shapefile.charset.is_none());
    }

    #[test]
    fn reject_non_http_url() {
        let err = GeoServerConfig::parse("[server]\nurl = \"ftp://gs\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl(_)));
    }

    #[test]
    fn reject_unknown_fields() {
        let err = GeoServerConfig::parse("[server]\nurl = \"http://gs\"\nport = 1\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseToml(_)));
    }

    #[test]
    fn reject_empty_reserved_workspace() {
        let err = GeoServerConfig::parse(
            "[server]\nurl = \"http://gs\"\n[workspaces]\nvector = \"\"\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::EmptyField("workspaces.vector")));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nurl = \"http://gs:8080/geoserver\"\n").unwrap();
        let config = GeoServerConfig::load(&path).unwrap();
        assert_eq!(config.server.url, "http://gs:8080/geoserver");
    }

    #[test]
    fn builder_matches_parsed_defaults() {
        let built = GeoServerConfig::new("http://gs/");
        let parsed = GeoServerConfig::parse("[server]\nurl = \"http://gs\"\n").unwrap();
        assert_eq!(built, parsed);
    }
}
