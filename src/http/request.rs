use bytes::Bytes;

/// Request methods the decoder recognises.
///
/// Only GET and POST are routed; the rest decode fine and get a 400.
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

/// One decoded request.
///
/// Besides the parsed header list the request keeps `raw_headers`, the exact
/// header block as it arrived, which `/echo` sends back verbatim.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    /// Request target exactly as sent, query string included.
    pub path: String,
    pub version: String,
    /// Headers in arrival order; duplicates are kept.
    pub headers: Vec<(String, String)>,
    /// Header block between the request line and the blank line
    pub raw_headers: Bytes,
    /// Request body, bounded by `Content-Length`
    pub body: Bytes,
}

/// Assembles a [`Request`] without going through the decoder.
pub struct RequestBuilder {
    method: Option<Method>,
    path: Option<String>,
    version: Option<String>,
    headers: Vec<(String, String)>,
    body: Bytes,
}

impl Method {
    /// Matches a request-line method token. Tokens are case-sensitive.
    ///
    /// ```
    /// # use beacon::http::request::Method;
    /// assert_eq!(Method::from_token("GET"), Some(Method::GET));
    /// assert_eq!(Method::from_token("get"), None);
    /// ```
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
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

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
            Method::HEAD => "HEAD",
            Method::OPTIONS => "OPTIONS",
            Method::PATCH => "PATCH",
        }
    }
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
            headers: Vec::new(),
            body: Bytes::new(),
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
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Builds the request, rendering `raw_headers` from the header list the
    /// same way they appear on the wire.
    pub fn build(self) -> Result<Request, &'static str> {
        let method = self.method.ok_or("request has no method")?;
        let path = self.path.ok_or("request has no target")?;
        let raw_headers = self
            .headers
            .iter()
            .map(|(k, v)| format!("{k}: {v}"))
            .collect::<Vec<_>>()
            .join("\r\n");

        Ok(Request {
            method,
            path,
            version: self.version.unwrap_or_else(|| String::from("HTTP/1.1")),
            headers: self.headers,
            raw_headers: Bytes::from(raw_headers),
            body: self.body,
        })
    }
}

impl Request {
    /// First header named `name`, ignoring ASCII case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// `None` when the header is absent or not a non-negative integer.
    pub fn content_length(&self) -> Option<usize> {
        self.header("content-length")
            .and_then(|v| v.trim().parse().ok())
    }
}
