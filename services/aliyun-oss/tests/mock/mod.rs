use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri};
use ossreq_aliyun_oss::retry::FixedDelayBackoff;
use ossreq_aliyun_oss::{Client, ClientBuilder, Config, StandardRetryer, StaticCredentialProvider};
use ossreq_core::{Body, Context, HttpSend, Result};

/// A request as seen by the transport.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// MockHttpSend replays scripted responses and records every request.
///
/// The last response is repeated once the script runs out.
#[derive(Debug, Clone, Default)]
pub struct MockHttpSend {
    responses: Arc<Mutex<VecDeque<(StatusCode, HeaderMap, Bytes)>>>,
    requests: Arc<Mutex<Vec<Recorded>>>,
    delay: Option<Duration>,
}

impl MockHttpSend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn push(self, status: StatusCode, headers: &[(&str, &str)], body: &str) -> Self {
        let mut map = HeaderMap::new();
        for (k, v) in headers {
            map.insert(
                HeaderName::from_bytes(k.as_bytes()).expect("header name must be valid"),
                HeaderValue::from_str(v).expect("header value must be valid"),
            );
        }
        self.responses
            .lock()
            .unwrap()
            .push_back((status, map, Bytes::copy_from_slice(body.as_bytes())));
        self
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn next_response(&self) -> http::Response<Bytes> {
        let mut responses = self.responses.lock().unwrap();
        let next = if responses.len() > 1 {
            responses.pop_front()
        } else {
            responses.front().cloned()
        };
        let (status, headers, body) =
            next.unwrap_or_else(|| (StatusCode::OK, HeaderMap::new(), Bytes::new()));

        let mut resp = http::Response::new(body);
        *resp.status_mut() = status;
        *resp.headers_mut() = headers;
        resp
    }
}

#[async_trait]
impl HttpSend for MockHttpSend {
    async fn http_send(&self, req: http::Request<Body>) -> Result<http::Response<Bytes>> {
        let (parts, body) = req.into_parts();
        let body = match body {
            Body::Empty => Bytes::new(),
            Body::Bytes(bs) => bs,
            Body::File(path) => Bytes::from(tokio::fs::read(path).await?),
            Body::Stream(s) => {
                let mut buf = BytesMut::new();
                if let Some(mut stream) = s.take() {
                    while let Some(chunk) = stream.next().await {
                        buf.extend_from_slice(&chunk?);
                    }
                }
                buf.freeze()
            }
        };
        self.requests.lock().unwrap().push(Recorded {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
        });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.next_response())
    }
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// The default retryer without delays between attempts.
pub fn fast_retryer() -> StandardRetryer {
    StandardRetryer::new().with_backoff(FixedDelayBackoff::new(Duration::ZERO))
}

/// A V4 client talking to `mock` with `config`.
pub fn client_builder_with(mock: &MockHttpSend, config: Config) -> ClientBuilder {
    init_logger();
    Client::builder(config)
        .with_context(Context::new().with_http_send(mock.clone()))
        .with_credential_provider(StaticCredentialProvider::new("ak", "sk"))
        .with_retryer(fast_retryer())
}

/// A V4 client in `cn-hangzhou` talking to `mock`.
pub fn client_builder(mock: &MockHttpSend) -> ClientBuilder {
    client_builder_with(mock, Config::default().with_region("cn-hangzhou"))
}

pub fn error_xml(code: &str, message: &str, extra: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<Error>
  <Code>{code}</Code>
  <Message>{message}</Message>
  <RequestId>5C3D9175B6FC201293AD****</RequestId>
  <HostId>bucket.oss-cn-hangzhou.aliyuncs.com</HostId>
  <EC>0002-00000040</EC>{extra}
</Error>"#
    )
}
