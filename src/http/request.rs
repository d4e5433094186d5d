use std::borrow::Cow;
use std::collections::HashMap;

use percent_encoding::percent_decode_str;
use url::Url;

/// HTTP request methods.
///
/// Only GET produces content. The rest are recognised so that they can be
/// answered without a body instead of being rejected as malformed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    GET,
    POST,
    PUT,
    DELETE,
    HEAD,
    OPTIONS,
    PATCH,
}

impl Method {
    /// Parses an HTTP method (case-sensitive).
    ///
    /// # Example
    ///
    /// ```
    /// # use csvpage::http::request::Method;
    /// assert_eq!(Method::from_str("GET"), Some(Method::GET));
    /// assert_eq!(Method::from_str("get"), None);
    /// ```
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "GET" => Some(Method::GET),
            "POST" => Some(Method::POST),
            "PUT" => Some(Method::PUT),
            "DELETE" => Some(Method::DELETE),
            "HEAD" => Some(Method::HEAD),
            "OPTIONS" => Some(Method::OPTIONS),
            "PATCH" => Some(Method::PATCH),
            _ => None,
        }
    }
}

/// A parsed request line and header block. Bodies are never read.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    /// Request target exactly as sent, e.g. `/docs/a%20b.html?x=1`.
    pub path: String,
    pub version: String,
    pub headers: HashMap<String, String>,
}

pub struct RequestBuilder {
    method: Option<Method>,
    path: Option<String>,
    version: Option<String>,
    headers: HashMap<String, String>,
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self {
            method: None,
            path: None,
            version: None,
            headers: HashMap::new(),
        }
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> Result<Request, &'static str> {
        Ok(Request {
            method: self.method.ok_or("method missing")?,
            path: self.path.ok_or("path missing")?,
            version: self.version.unwrap_or_else(|| "HTTP/1.1".to_string()),
            headers: self.headers,
        })
    }
}

impl Request {
    /// Retrieves a header value by exact name.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(|v| v.as_str())
    }

    /// The decoded absolute path of the request target.
    ///
    /// Dot segments are normalised, query and fragment dropped, and
    /// percent-escapes decoded. Absolute-form targets
    /// (`http://host/path`) are accepted too.
    ///
    /// # Example
    ///
    /// ```
    /// # use csvpage::http::request::{Method, RequestBuilder};
    /// let req = RequestBuilder::new()
    ///     .method(Method::GET)
    ///     .path("/a/../my%20page.html?x=1")
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(req.target_path().unwrap(), "/my page.html");
    /// ```
    pub fn target_path(&self) -> Result<String, url::ParseError> {
        let base = Url::parse("http://localhost/")?;
        let url = base.join(&self.path)?;
        let decoded: Cow<'_, str> = percent_decode_str(url.path()).decode_utf8_lossy();
        Ok(decoded.into_owned())
    }
}
