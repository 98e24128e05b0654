use base64::Engine as _;
use serde::{Deserialize, Serialize};

/// Where the admin API lives and how to authenticate against it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestEndpoint {
    /// Base URL of the server, without the trailing `/rest`.
    pub url: String,
    pub username: String,
    pub password: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    30
}

impl RestEndpoint {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.trim_end_matches('/').to_owned(),
            username: "admin".to_owned(),
            password: "geoserver".to_owned(),
            timeout_secs: default_timeout(),
        }
    }

    #[must_use]
    pub fn with_credentials(mut self, username: &str, password: &str) -> Self {
        self.username = username.to_owned();
        self.password = password.to_owned();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Absolute URL of a path below `rest/`.
    pub fn rest_url(&self, path: &str) -> String {
        format!("{}/rest/{}", self.url, path.trim_start_matches('/'))
    }

    /// Value of the `Authorization` header for HTTP basic auth.
    pub fn basic_auth(&self) -> String {
        let token = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:{}", self.username, self.password));
        format!("Basic {token}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_strips_trailing_slash() {
        let endpoint = RestEndpoint::new("http://localhost:8080/geoserver/");
        assert_eq!(endpoint.url, "http://localhost:8080/geoserver");
        assert_eq!(
            endpoint.rest_url("workspaces/topp"),
            "http://localhost:8080/geoserver/rest/workspaces/topp"
        );
    }

    #[test]
    fn endpoint_defaults_to_stock_credentials() {
        let endpoint = RestEndpoint::new("http://gs");
        assert_eq!(endpoint.username, "admin");
        assert_eq!(endpoint.password, "geoserver");
        assert_eq!(endpoint.timeout_secs, 30);
    }

    #[test]
    fn basic_auth_header() {
        let endpoint = RestEndpoint::new("http://gs").with_credentials("admin", "geoserver");
        assert_eq!(endpoint.basic_auth(), "Basic YWRtaW46Z2Vvc2VydmVy");
    }
}
