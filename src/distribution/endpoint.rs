use url::Url;

use crate::{
    distribution::Name,
    error::Result,
    transport::{Method, Request, Response},
};

/// One registry API call: its route, HTTP method, request construction,
/// and response parsing.
///
/// Each call site constructs an endpoint carrying its own operands (tag,
/// digest, manifest body) and hands it to the client's dispatch loop. The
/// route suffix is appended to the `/v2/<name>` base route unless the
/// dispatcher was given an explicit URL (a mid-upload Location or a
/// redirect target), which supersedes it.
pub trait RegistryEndpoint {
    /// Value produced from a successful response.
    type Output;

    /// Suffix appended to the `/v2/<name>` base route.
    fn route_suffix(&self) -> String;

    /// HTTP method of this endpoint.
    fn method(&self) -> Method;

    /// Populate headers and body of the outgoing request. No network I/O
    /// happens here.
    fn build_request(&self, _request: &mut Request) -> Result<()> {
        Ok(())
    }

    /// Parse a successful (2xx) response into the output value.
    fn handle_response(&self, response: Response) -> Result<Self::Output>;

    /// Describe the attempted action for error messages, e.g.
    /// `pull image manifest for registry.example.com/library/app:latest`.
    fn action_description(&self, registry: &Url, name: &Name) -> String;
}

/// `host[:port]` part of the registry URL, for action descriptions.
pub(crate) fn registry_authority(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authority() {
        let url = Url::parse("https://registry.example.com").unwrap();
        assert_eq!(registry_authority(&url), "registry.example.com");

        let url = Url::parse("http://localhost:5000").unwrap();
        assert_eq!(registry_authority(&url), "localhost:5000");
    }
}
