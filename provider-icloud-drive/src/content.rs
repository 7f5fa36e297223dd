//! File content handles
//!
//! A [`ContentStream`] is the transient result of opening a file node. It is
//! either a fully buffered body or an incremental reader over the live HTTP
//! response; both are consumed through `AsyncRead`. The handle owns the
//! underlying connection, so dropping it on any path releases it, and the
//! consuming helpers take `self` so one handle serves exactly one read.

use bytes::Bytes;
use std::fmt;
use std::io::Cursor;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, ReadBuf};

use crate::error::{DriveError, Result};
use crate::types::ContentBody;

enum ContentSource {
    Buffered(Cursor<Bytes>),
    Streamed(Box<dyn AsyncRead + Send + Unpin>),
}

/// Single-use readable handle over a file's bytes.
pub struct ContentStream {
    source: ContentSource,
    size: Option<u64>,
    content_type: Option<String>,
}

impl ContentStream {
    /// Handle for a zero-length file; performs no I/O.
    pub(crate) fn empty() -> Self {
        Self {
            source: ContentSource::Buffered(Cursor::new(Bytes::new())),
            size: Some(0),
            content_type: None,
        }
    }

    pub(crate) fn buffered(body: ContentBody) -> Self {
        Self {
            size: Some(body.bytes.len() as u64),
            content_type: body.content_type,
            source: ContentSource::Buffered(Cursor::new(body.bytes)),
        }
    }

    pub(crate) fn streamed(reader: Box<dyn AsyncRead + Send + Unpin>, size: Option<u64>) -> Self {
        Self {
            source: ContentSource::Streamed(reader),
            size,
            content_type: None,
        }
    }

    /// Expected length in bytes, when known.
    pub fn size(&self) -> Option<u64> {
        self.size
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Whether reads pull from the network incrementally.
    pub fn is_streamed(&self) -> bool {
        matches!(self.source, ContentSource::Streamed(_))
    }

    /// Read the remaining content into memory.
    pub async fn bytes(self) -> Result<Bytes> {
        match self.source {
            ContentSource::Buffered(cursor) => {
                let position = cursor.position() as usize;
                let bytes = cursor.into_inner();
                Ok(bytes.slice(position.min(bytes.len())..))
            }
            ContentSource::Streamed(mut reader) => {
                let capacity = self.size.unwrap_or(0).min(64 * 1024 * 1024) as usize;
                let mut buffer = Vec::with_capacity(capacity);
                reader
                    .read_to_end(&mut buffer)
                    .await
                    .map_err(|e| DriveError::DownloadUnavailable(e.to_string()))?;
                Ok(Bytes::from(buffer))
            }
        }
    }

    /// Copy the remaining content into `writer`, returning the number of bytes written.
    pub async fn copy_to<W>(mut self, writer: &mut W) -> Result<u64>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        tokio::io::copy(&mut self, writer)
            .await
            .map_err(|e| DriveError::DownloadUnavailable(e.to_string()))
    }
}

impl AsyncRead for ContentStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        match &mut self.get_mut().source {
            ContentSource::Buffered(cursor) => Pin::new(cursor).poll_read(cx, buf),
            ContentSource::Streamed(reader) => Pin::new(reader).poll_read(cx, buf),
        }
    }
}

impl fmt::Debug for ContentStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentStream")
            .field("streamed", &self.is_streamed())
            .field("size", &self.size)
            .field("content_type", &self.content_type)
            .finish()
    }
}
