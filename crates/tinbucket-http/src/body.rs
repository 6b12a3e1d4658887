//! S3 response body supporting buffered, streaming, and empty modes.
//!
//! - **Buffered**: XML payloads, error bodies, small raw bytes.
//! - **Streaming**: object bodies read straight from disk, length-capped for
//!   range responses.
//! - **Empty**: 204 responses, DELETE confirmations, HEAD responses.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use http_body_util::Full;
use tokio::fs::File;
use tokio::io::Take;
use tokio_util::io::ReaderStream;

/// S3 response body.
///
/// Implements [`http_body::Body`] so it can be used directly with hyper
/// responses.
#[derive(Debug)]
pub enum S3ResponseBody {
    /// Buffered body for small responses.
    Buffered(Full<Bytes>),
    /// Streaming body for object reads: a length-capped file stream.
    Streaming {
        /// The chunked file reader.
        stream: ReaderStream<Take<File>>,
        /// Exact number of bytes the stream will deliver.
        len: u64,
    },
    /// Empty body.
    Empty,
}

impl Default for S3ResponseBody {
    fn default() -> Self {
        Self::Empty
    }
}

impl S3ResponseBody {
    /// Create a buffered body from bytes.
    #[must_use]
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        Self::Buffered(Full::new(data.into()))
    }

    /// Create a buffered body from a UTF-8 string.
    #[must_use]
    pub fn from_string(s: impl Into<String>) -> Self {
        Self::Buffered(Full::new(Bytes::from(s.into())))
    }

    /// Create a buffered body from an XML byte vector.
    #[must_use]
    pub fn from_xml(xml: Vec<u8>) -> Self {
        Self::Buffered(Full::new(Bytes::from(xml)))
    }

    /// Create a streaming body from a positioned file handle, delivering
    /// exactly `len` bytes.
    #[must_use]
    pub fn from_file(file: File, len: u64) -> Self {
        Self::Streaming {
            stream: ReaderStream::new(tokio::io::AsyncReadExt::take(file, len)),
            len,
        }
    }

    /// Create an empty body.
    #[must_use]
    pub fn empty() -> Self {
        Self::Empty
    }
}

impl http_body::Body for S3ResponseBody {
    type Data = Bytes;
    type Error = std::io::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<http_body::Frame<Self::Data>, Self::Error>>> {
        match self.get_mut() {
            Self::Buffered(full) => Pin::new(full)
                .poll_frame(cx)
                .map_err(|never| match never {}),
            Self::Streaming { stream, .. } => {
                match futures_core::Stream::poll_next(Pin::new(stream), cx) {
                    Poll::Ready(Some(Ok(chunk))) => {
                        Poll::Ready(Some(Ok(http_body::Frame::data(chunk))))
                    }
                    Poll::Ready(Some(Err(e))) => Poll::Ready(Some(Err(e))),
                    Poll::Ready(None) => Poll::Ready(None),
                    Poll::Pending => Poll::Pending,
                }
            }
            Self::Empty => Poll::Ready(None),
        }
    }

    fn is_end_stream(&self) -> bool {
        match self {
            Self::Buffered(full) => full.is_end_stream(),
            Self::Streaming { .. } => false,
            Self::Empty => true,
        }
    }

    fn size_hint(&self) -> http_body::SizeHint {
        match self {
            Self::Buffered(full) => full.size_hint(),
            Self::Streaming { len, .. } => http_body::SizeHint::with_exact(*len),
            Self::Empty => http_body::SizeHint::with_exact(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use http_body::Body;
    use http_body_util::BodyExt;

    use super::*;

    #[test]
    fn test_should_report_empty_body_as_end_of_stream() {
        let body = S3ResponseBody::empty();
        assert!(body.is_end_stream());
        assert_eq!(body.size_hint().exact(), Some(0));
    }

    #[test]
    fn test_should_create_buffered_body_from_bytes() {
        let body = S3ResponseBody::from_bytes(Bytes::from("hello"));
        assert!(!body.is_end_stream());
        assert_eq!(body.size_hint().exact(), Some(5));
    }

    #[tokio::test]
    async fn test_should_stream_file_body_with_exact_length() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("body.bin");
        tokio::fs::write(&path, b"Hello World!").await.expect("write");

        let file = tokio::fs::File::open(&path).await.expect("open");
        let body = S3ResponseBody::from_file(file, 12);
        assert_eq!(body.size_hint().exact(), Some(12));

        let collected = body.collect().await.expect("collect").to_bytes();
        assert_eq!(collected.as_ref(), b"Hello World!");
    }

    #[tokio::test]
    async fn test_should_cap_streamed_bytes_at_len() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("body.bin");
        tokio::fs::write(&path, b"Hello World!").await.expect("write");

        let mut file = tokio::fs::File::open(&path).await.expect("open");
        tokio::io::AsyncSeekExt::seek(&mut file, std::io::SeekFrom::Start(5))
            .await
            .expect("seek");

        let body = S3ResponseBody::from_file(file, 3);
        let collected = body.collect().await.expect("collect").to_bytes();
        assert_eq!(collected.as_ref(), b" Wo");
    }
}
