use std::fmt::{Debug, Formatter};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use futures::stream::BoxStream;
use tokio::io::AsyncReadExt;

use crate::crc64::Crc64;
use crate::{Error, Result};

/// A stream of body chunks that can be read only once.
pub type ByteStream = BoxStream<'static, std::io::Result<Bytes>>;

const FILE_BLOCK_SIZE: usize = 64 * 1024;

/// Body of a request.
///
/// Everything except [`Body::Stream`] can be replayed, which is what allows
/// a request to be retried or checksummed before it is sent.
#[derive(Clone, Debug, Default)]
pub enum Body {
    /// No body.
    #[default]
    Empty,
    /// In memory bytes.
    Bytes(Bytes),
    /// A local file, read from the start on every attempt.
    File(PathBuf),
    /// A non-seekable stream.
    Stream(StreamBody),
}

/// StreamBody wraps a [`ByteStream`] that is handed out exactly once.
#[derive(Clone)]
pub struct StreamBody {
    inner: Arc<Mutex<Option<ByteStream>>>,
    content_length: Option<u64>,
}

impl StreamBody {
    /// Wrap a stream, optionally with its known length.
    pub fn new(stream: ByteStream, content_length: Option<u64>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Some(stream))),
            content_length,
        }
    }

    /// Take the stream out. Returns `None` once it has been consumed.
    pub fn take(&self) -> Option<ByteStream> {
        self.inner.lock().expect("lock poisoned").take()
    }

    /// Length declared at construction.
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }
}

impl Debug for StreamBody {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamBody")
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

impl Body {
    /// Whether the body can be read again from the beginning.
    pub fn is_seekable(&self) -> bool {
        !matches!(self, Body::Stream(_))
    }

    /// Size of the body if known.
    pub async fn content_length(&self) -> Result<Option<u64>> {
        match self {
            Body::Empty => Ok(Some(0)),
            Body::Bytes(bs) => Ok(Some(bs.len() as u64)),
            Body::File(path) => {
                let meta = tokio::fs::metadata(path).await.map_err(|e| {
                    Error::request_invalid(format!("read metadata of {} failed", path.display()))
                        .with_source(e)
                })?;
                Ok(Some(meta.len()))
            }
            Body::Stream(s) => Ok(s.content_length()),
        }
    }

    /// CRC64 of the whole body.
    ///
    /// Returns `None` for streams: they can't be read twice, so their checksum
    /// is unknown before sending.
    pub async fn crc64(&self) -> Result<Option<u64>> {
        match self {
            Body::Empty => Ok(Some(0)),
            Body::Bytes(bs) => Ok(Some(crate::crc64::checksum(bs))),
            Body::File(path) => {
                let mut f = tokio::fs::File::open(path).await.map_err(|e| {
                    Error::request_invalid(format!("open {} failed", path.display()))
                        .with_source(e)
                })?;
                let mut digest = Crc64::new();
                let mut buf = vec![0; FILE_BLOCK_SIZE];
                loop {
                    let n = f.read(&mut buf).await?;
                    if n == 0 {
                        break;
                    }
                    digest.update(&buf[..n]);
                }
                Ok(Some(digest.finish()))
            }
            Body::Stream(_) => Ok(None),
        }
    }
}

impl From<Bytes> for Body {
    fn from(bs: Bytes) -> Self {
        Body::Bytes(bs)
    }
}

impl From<Vec<u8>> for Body {
    fn from(bs: Vec<u8>) -> Self {
        Body::Bytes(bs.into())
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Body::Bytes(s.into())
    }
}

impl From<&'static str> for Body {
    fn from(s: &'static str) -> Self {
        Body::Bytes(Bytes::from_static(s.as_bytes()))
    }
}

impl From<StreamBody> for Body {
    fn from(s: StreamBody) -> Self {
        Body::Stream(s)
    }
}
