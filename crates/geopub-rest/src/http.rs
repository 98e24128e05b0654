use crate::{Method, RestEndpoint, RestError, RestRequest, RestResponse, RestTransport};
use std::io::Read;
use std::time::Duration;

/// Blocking HTTP transport for the admin API.
///
/// Every request carries HTTP basic credentials. Non-2xx statuses are handed
/// back as responses for the caller to interpret, except `401`, which is
/// reported as [`RestError::Unauthorized`].
pub struct HttpTransport {
    endpoint: RestEndpoint,
    auth_header: String,
    agent: ureq::Agent,
}

impl HttpTransport {
    pub fn new(endpoint: RestEndpoint) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(endpoint.timeout_secs)))
            .http_status_as_error(false)
            .build()
            .into();
        let auth_header = endpoint.basic_auth();
        Self {
            endpoint,
            auth_header,
            agent,
        }
    }

    fn prepare<B>(
        &self,
        mut req: ureq::RequestBuilder<B>,
        request: &RestRequest,
    ) -> ureq::RequestBuilder<B> {
        req = req.header("Authorization", self.auth_header.as_str());
        for (key, value) in &request.query {
            req = req.query(key, value);
        }
        for (key, value) in &request.headers {
            req = req.header(key.as_str(), value.as_str());
        }
        req
    }
}

impl RestTransport for HttpTransport {
    fn execute(&self, request: &RestRequest) -> Result<RestResponse, RestError> {
        let url = self.endpoint.rest_url(&request.path);
        match request.body {
            Some(ref body) => tracing::debug!("{} {url} ({} bytes)", request.method, body.len()),
            None => tracing::debug!("{} {url}", request.method),
        }

        let body: &[u8] = request.body.as_deref().unwrap_or(&[]);
        let result = match request.method {
            Method::Get => self.prepare(self.agent.get(&url), request).call(),
            Method::Delete => self.prepare(self.agent.delete(&url), request).call(),
            Method::Post => self.prepare(self.agent.post(&url), request).send(body),
            Method::Put => self.prepare(self.agent.put(&url), request).send(body),
        };

        let resp = result.map_err(|e| RestError::Http(e.to_string()))?;
        let status = resp.status().as_u16();
        if status == 401 {
            return Err(RestError::Unauthorized { status, url });
        }

        let mut reader = resp.into_body().into_reader();
        let mut data = Vec::new();
        reader
            .read_to_end(&mut data)
            .map_err(|e| RestError::Http(e.to_string()))?;
        tracing::debug!("{} {url} -> HTTP {status}", request.method);
        Ok(RestResponse::new(status, data))
    }
}
