use std::borrow::Cow;
use std::mem;
use std::str::FromStr;

use http::uri::Authority;
use http::uri::PathAndQuery;
use http::uri::Scheme;
use http::HeaderMap;
use http::HeaderValue;
use http::Method;
use http::Uri;

use crate::utils::uri_encode;
use crate::{Error, RequestMessage, Result};

/// Signing context for request.
///
/// Query pairs are kept decoded; [`SigningRequest::apply`] encodes them again
/// with the unreserved set.
#[derive(Debug)]
pub struct SigningRequest {
    /// HTTP method.
    pub method: Method,
    /// HTTP scheme.
    pub scheme: Scheme,
    /// HTTP authority.
    pub authority: Authority,
    /// HTTP path, as it appears on the wire.
    pub path: String,
    /// HTTP query parameters, decoded.
    pub query: Vec<(String, String)>,
    /// HTTP headers.
    pub headers: HeaderMap,
}

impl SigningRequest {
    /// Build a signing context from a request message.
    ///
    /// The uri and headers are taken out of `req` and must be returned with
    /// [`SigningRequest::apply`].
    pub fn build(req: &mut RequestMessage) -> Result<Self> {
        let uri = mem::take(&mut req.uri).into_parts();
        let paq = uri
            .path_and_query
            .unwrap_or_else(|| PathAndQuery::from_static("/"));

        Ok(SigningRequest {
            method: req.method.clone(),
            scheme: uri.scheme.unwrap_or(Scheme::HTTPS),
            authority: uri.authority.ok_or_else(|| {
                Error::request_invalid("request without authority is invalid for signing")
            })?,
            path: paq.path().to_string(),
            query: paq
                .query()
                .map(|v| {
                    form_urlencoded::parse(v.as_bytes())
                        .map(|(k, v)| (k.into_owned(), v.into_owned()))
                        .collect()
                })
                .unwrap_or_default(),

            // Take the headers out of the request to avoid copy.
            headers: mem::take(&mut req.headers),
        })
    }

    /// Apply the signing context back to the request message.
    pub fn apply(mut self, req: &mut RequestMessage) -> Result<()> {
        mem::swap(&mut req.headers, &mut self.headers);
        req.method = self.method;
        req.uri = {
            let mut uri_parts = mem::take(&mut req.uri).into_parts();
            uri_parts.scheme = Some(self.scheme);
            uri_parts.authority = Some(self.authority);
            uri_parts.path_and_query = {
                let mut s = self.path;
                if !self.query.is_empty() {
                    s.push('?');
                    s.push_str(&Self::query_to_encoded_string(&self.query));
                }
                Some(PathAndQuery::from_str(&s)?)
            };
            Uri::from_parts(uri_parts)?
        };

        Ok(())
    }

    /// Full url of this request.
    pub fn url(&self) -> String {
        let mut s = format!("{}://{}{}", self.scheme, self.authority, self.path);
        if !self.query.is_empty() {
            s.push('?');
            s.push_str(&Self::query_to_encoded_string(&self.query));
        }
        s
    }

    /// Get the path percent decoded.
    pub fn path_percent_decoded(&self) -> Cow<str> {
        percent_encoding::percent_decode_str(&self.path).decode_utf8_lossy()
    }

    /// Push a new query pair into query list.
    #[inline]
    pub fn query_push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.query.push((key.into(), value.into()));
    }

    /// Get the first query value of `key`.
    pub fn query_get(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Encode query pairs in their current order, omitting `=` for empty values.
    pub fn query_to_encoded_string(query: &[(String, String)]) -> String {
        let mut s = String::with_capacity(16);
        for (idx, (k, v)) in query.iter().enumerate() {
            if idx != 0 {
                s.push('&');
            }
            s.push_str(&uri_encode(k, false));
            if !v.is_empty() {
                s.push('=');
                s.push_str(&uri_encode(v, false));
            }
        }
        s
    }

    /// Get header value by name.
    ///
    /// Returns empty string if header not found.
    #[inline]
    pub fn header_get_or_default(&self, key: &str) -> Result<&str> {
        match self.headers.get(key) {
            Some(v) => Ok(v.to_str()?),
            None => Ok(""),
        }
    }

    /// Insert a header, replacing the previous value.
    pub fn header_insert(&mut self, key: &'static str, value: &str) -> Result<()> {
        self.headers.insert(key, HeaderValue::from_str(value)?);
        Ok(())
    }

    /// Collect headers accepted by `filter` as `(lowercase name, trimmed value)`.
    pub fn header_to_vec_with_filter(
        &self,
        filter: impl Fn(&str) -> bool,
    ) -> Result<Vec<(String, String)>> {
        let mut headers = Vec::new();
        for (k, v) in self.headers.iter() {
            let name = k.as_str();
            if !filter(name) {
                continue;
            }
            headers.push((name.to_lowercase(), v.to_str()?.trim().to_string()));
        }
        Ok(headers)
    }

    /// Convert sorted headers to string.
    ///
    /// ```shell
    /// [(a, b), (c, d)] => "a:b\nc:d\n"
    /// ```
    pub fn header_to_string(mut headers: Vec<(String, String)>, sep: &str, join: &str) -> String {
        let mut s = String::with_capacity(16);

        headers.sort();

        for (k, v) in headers {
            s.push_str(&k);
            s.push_str(sep);
            s.push_str(&v);
            s.push_str(join);
        }

        s
    }
}
