//! Transport seam between the registry client and the HTTP stack.
//!
//! A [Transport] opens a [Connection] scoped to a single request/response
//! round trip; `send` consumes the connection, so it is released on every
//! exit path. The default implementation is a blocking [ureq::Agent].

use std::fmt;
use std::io::Read;
use url::Url;

/// HTTP methods used by the registry API v2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outgoing request under construction: headers and an optional body.
///
/// Endpoint operations populate this before the connection sends it; the
/// method and URL are supplied by the dispatcher.
#[derive(Debug, Clone, Default)]
pub struct Request {
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Request {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a header, replacing an existing one with the same name.
    pub fn set_header(&mut self, name: &str, value: &str) {
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.to_string()));
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn headers(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.headers.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn set_body(&mut self, body: Vec<u8>) {
        self.body = body;
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

/// Response produced by a [Connection]: status, headers, and a body stream.
pub struct Response {
    status: u16,
    headers: Vec<(String, String)>,
    body: Box<dyn Read + Send>,
}

impl Response {
    pub fn new(
        status: u16,
        headers: Vec<(String, String)>,
        body: impl Read + Send + 'static,
    ) -> Self {
        Response {
            status,
            headers,
            body: Box::new(body),
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    /// `true` for any 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Consume the response, yielding the body stream.
    pub fn into_reader(self) -> Box<dyn Read + Send> {
        self.body
    }

    fn from_ureq(res: ureq::Response) -> Self {
        let status = res.status();
        let headers = res
            .headers_names()
            .into_iter()
            .map(|name| {
                let value = res.header(&name).unwrap_or_default().to_string();
                (name, value)
            })
            .collect();
        Response {
            status,
            headers,
            body: Box::new(res.into_reader()),
        }
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// The server never produced an HTTP response for the request.
#[derive(Debug, thiserror::Error)]
#[error("No HTTP response from server")]
pub struct NoResponse(#[source] pub Box<dyn std::error::Error + Send + Sync>);

/// Opens connections to registry servers.
pub trait Transport: Send + Sync {
    /// Acquire a connection scoped to one request against `url`.
    fn connect<'a>(&'a self, url: &Url) -> Result<Box<dyn Connection + 'a>, NoResponse>;
}

/// A connection scoped to a single request.
pub trait Connection {
    /// Send the request and wait for the response. Any status counts as a
    /// response; classification is the caller's job.
    fn send(self: Box<Self>, method: Method, request: Request) -> Result<Response, NoResponse>;
}

/// Default blocking transport backed by a [ureq::Agent].
///
/// The agent is built with automatic redirect following disabled; the
/// registry client follows temporary redirects itself.
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl Default for UreqTransport {
    fn default() -> Self {
        UreqTransport {
            agent: ureq::AgentBuilder::new().redirects(0).build(),
        }
    }
}

impl Transport for UreqTransport {
    fn connect<'a>(&'a self, url: &Url) -> Result<Box<dyn Connection + 'a>, NoResponse> {
        Ok(Box::new(UreqConnection {
            agent: &self.agent,
            url: url.clone(),
        }))
    }
}

struct UreqConnection<'a> {
    agent: &'a ureq::Agent,
    url: Url,
}

impl Connection for UreqConnection<'_> {
    fn send(self: Box<Self>, method: Method, request: Request) -> Result<Response, NoResponse> {
        let mut req = self.agent.request(method.as_str(), self.url.as_str());
        for (name, value) in request.headers() {
            req = req.set(name, value);
        }
        let result = if request.body().is_empty() {
            req.call()
        } else {
            req.send_bytes(request.body())
        };
        match result {
            Ok(res) => Ok(Response::from_ureq(res)),
            // A status error still carries a full HTTP response
            Err(ureq::Error::Status(_, res)) => Ok(Response::from_ureq(res)),
            Err(ureq::Error::Transport(e)) => Err(NoResponse(Box::new(e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn method_str() {
        assert_eq!(Method::Get.as_str(), "GET");
        assert_eq!(Method::Post.as_str(), "POST");
        assert_eq!(Method::Put.as_str(), "PUT");
        assert_eq!(Method::Patch.as_str(), "PATCH");
    }

    #[test]
    fn request_headers() {
        let mut request = Request::new();
        request.set_header("Content-Type", "application/json");
        assert_eq!(request.header("content-type"), Some("application/json"));

        // Setting again replaces instead of appending
        request.set_header("content-type", "application/octet-stream");
        assert_eq!(
            request.header("Content-Type"),
            Some("application/octet-stream")
        );
        assert_eq!(request.headers().count(), 1);
    }

    #[test]
    fn response_status() {
        let ok = Response::new(200, Vec::new(), io::empty());
        assert!(ok.is_success());
        let accepted = Response::new(202, Vec::new(), io::empty());
        assert!(accepted.is_success());
        let redirect = Response::new(307, Vec::new(), io::empty());
        assert!(!redirect.is_success());
        let not_found = Response::new(404, Vec::new(), io::empty());
        assert!(!not_found.is_success());
    }

    #[test]
    fn response_header_lookup() {
        let res = Response::new(
            307,
            vec![("location".to_string(), "https://mirror.example.com/".to_string())],
            io::empty(),
        );
        assert_eq!(res.header("Location"), Some("https://mirror.example.com/"));
        assert_eq!(res.header("Content-Type"), None);
    }
}
