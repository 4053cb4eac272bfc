use std::fmt;

/// Authorization attached verbatim to outgoing registry requests.
///
/// Acquiring and refreshing credentials is the caller's concern; a client
/// without one sends anonymous requests with no `Authorization` header.
#[derive(Clone, PartialEq, Eq)]
pub enum Authorization {
    /// `Basic` scheme carrying a base64-encoded `username:password` pair
    Basic(String),
    /// `Bearer` scheme carrying an opaque token
    Bearer(String),
}

impl Authorization {
    pub fn basic(username: &str, password: &str) -> Self {
        Authorization::Basic(base64::encode(format!("{}:{}", username, password)))
    }

    pub fn bearer(token: &str) -> Self {
        Authorization::Bearer(token.to_string())
    }

    /// Render as an `Authorization` header value.
    pub fn to_header_value(&self) -> String {
        match self {
            Authorization::Basic(octet) => format!("Basic {}", octet),
            Authorization::Bearer(token) => format!("Bearer {}", token),
        }
    }
}

// Credentials stay out of logs and error messages.
impl fmt::Debug for Authorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Authorization::Basic(_) => f.write_str("Authorization::Basic(..)"),
            Authorization::Bearer(_) => f.write_str("Authorization::Bearer(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_value() {
        let auth = Authorization::basic("user", "pass");
        assert_eq!(auth.to_header_value(), "Basic dXNlcjpwYXNz");

        let auth = Authorization::bearer("abc123");
        assert_eq!(auth.to_header_value(), "Bearer abc123");
    }

    #[test]
    fn debug_hides_credentials() {
        let auth = Authorization::basic("user", "hunter2");
        assert_eq!(format!("{:?}", auth), "Authorization::Basic(..)");
    }
}
