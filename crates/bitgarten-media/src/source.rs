//! Client-side buffered media source.
//!
//! A [`MediaSource`] is handed to a playback element, which opens it once it
//! is attached. Payload is pushed through a [`SourceBuffer`]; every append
//! completes with an update-end notification that a player can react to.

use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::debug;

use crate::content_type::{ContentType, MediaKind};
use crate::error::{Error, Result};

/// Lifecycle of a [`MediaSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadyState {
    /// Not attached to a playback element yet.
    #[default]
    Closed,
    /// Attached and accepting buffers.
    Open,
    /// No further data will be appended.
    Ended,
}

#[derive(Debug)]
struct SourceInner {
    state: watch::Sender<ReadyState>,
    buffers: Mutex<Vec<SourceBuffer>>,
}

/// A buffered media source feeding a playback element.
#[derive(Debug, Clone)]
pub struct MediaSource {
    inner: Arc<SourceInner>,
}

impl Default for MediaSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaSource {
    /// Creates a closed media source.
    #[must_use]
    pub fn new() -> Self {
        let (state, _) = watch::channel(ReadyState::Closed);
        Self {
            inner: Arc::new(SourceInner {
                state,
                buffers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Current ready state.
    #[must_use]
    pub fn ready_state(&self) -> ReadyState {
        *self.inner.state.borrow()
    }

    /// Marks the source open. Called by the element it was attached to.
    pub fn open(&self) {
        self.inner.state.send_if_modified(|state| {
            if *state == ReadyState::Closed {
                *state = ReadyState::Open;
                true
            } else {
                false
            }
        });
        debug!("media source open");
    }

    /// Waits for the open event.
    ///
    /// Returns immediately if the source is already open.
    ///
    /// # Errors
    ///
    /// Returns an error if the source ended before it was opened.
    pub async fn opened(&self) -> Result<()> {
        let mut rx = self.inner.state.subscribe();
        let state = rx
            .wait_for(|s| *s != ReadyState::Closed)
            .await
            .map_err(|_| Error::InvalidState("media source dropped".to_string()))?;
        match *state {
            ReadyState::Open => Ok(()),
            other => Err(Error::InvalidState(format!("source is {other:?}, not open"))),
        }
    }

    /// Adds a buffer for the given codec-qualified video type.
    ///
    /// # Errors
    ///
    /// Returns an error if the source is not open or the type is not a video type.
    pub fn add_source_buffer(&self, mime_type: &str) -> Result<SourceBuffer> {
        if self.ready_state() != ReadyState::Open {
            return Err(Error::InvalidState(format!(
                "cannot add a source buffer while {:?}",
                self.ready_state()
            )));
        }
        let content_type = ContentType::parse(mime_type)?;
        if content_type.kind() != MediaKind::Video {
            return Err(Error::UnsupportedMime(mime_type.to_string()));
        }

        let buffer = SourceBuffer::new(content_type);
        self.inner.buffers.lock().push(buffer.clone());
        Ok(buffer)
    }

    /// Number of buffers added so far.
    #[must_use]
    pub fn buffer_count(&self) -> usize {
        self.inner.buffers.lock().len()
    }

    /// Signals that no more data will be appended.
    pub fn end_of_stream(&self) {
        self.inner.state.send_replace(ReadyState::Ended);
    }
}

#[derive(Debug)]
struct BufferInner {
    content_type: ContentType,
    data: Mutex<BytesMut>,
    updates: watch::Sender<u64>,
}

/// A byte buffer attached to a [`MediaSource`].
#[derive(Debug, Clone)]
pub struct SourceBuffer {
    inner: Arc<BufferInner>,
}

impl SourceBuffer {
    fn new(content_type: ContentType) -> Self {
        let (updates, _) = watch::channel(0);
        Self {
            inner: Arc::new(BufferInner {
                content_type,
                data: Mutex::new(BytesMut::new()),
                updates,
            }),
        }
    }

    /// Content type this buffer was created for.
    #[must_use]
    pub fn content_type(&self) -> &ContentType {
        &self.inner.content_type
    }

    /// Appends a chunk and fires update-end.
    pub fn append(&self, chunk: &[u8]) {
        self.inner.data.lock().extend_from_slice(chunk);
        self.inner.updates.send_modify(|n| *n += 1);
        debug!(len = chunk.len(), "source buffer append");
    }

    /// Number of completed appends.
    #[must_use]
    pub fn update_count(&self) -> u64 {
        *self.inner.updates.borrow()
    }

    /// Subscribes to update-end notifications (the value is the append count).
    #[must_use]
    pub fn update_end(&self) -> watch::Receiver<u64> {
        self.inner.updates.subscribe()
    }

    /// Total bytes buffered.
    #[must_use]
    pub fn buffered_len(&self) -> usize {
        self.inner.data.lock().len()
    }

    /// Copies out everything buffered so far.
    #[must_use]
    pub fn snapshot(&self) -> Bytes {
        Bytes::copy_from_slice(&self.inner.data.lock())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::content_type::VIDEO_MP4_AVC;

    #[test]
    fn test_buffer_requires_open_source() {
        let source = MediaSource::new();
        assert_eq!(source.ready_state(), ReadyState::Closed);
        assert!(source.add_source_buffer(VIDEO_MP4_AVC).is_err());

        source.open();
        let buffer = source.add_source_buffer(VIDEO_MP4_AVC).unwrap();
        assert_eq!(buffer.content_type().codecs(), Some("avc1.64002A, mp4a.40.2"));
        assert_eq!(source.buffer_count(), 1);
    }

    #[test]
    fn test_rejects_non_video_buffer() {
        let source = MediaSource::new();
        source.open();
        assert!(matches!(
            source.add_source_buffer("image/jpeg"),
            Err(Error::UnsupportedMime(_))
        ));
    }

    #[test]
    fn test_append_fires_update_end() {
        let source = MediaSource::new();
        source.open();
        let buffer = source.add_source_buffer(VIDEO_MP4_AVC).unwrap();
        let rx = buffer.update_end();

        buffer.append(b"abc");
        buffer.append(b"def");

        assert_eq!(*rx.borrow(), 2);
        assert_eq!(buffer.update_count(), 2);
        assert_eq!(buffer.buffered_len(), 6);
        assert_eq!(&buffer.snapshot()[..], b"abcdef");
    }

    #[tokio::test]
    async fn test_opened_waits_for_open() {
        let source = MediaSource::new();
        let waiter = {
            let source = source.clone();
            tokio::spawn(async move { source.opened().await })
        };
        tokio::task::yield_now().await;
        source.open();
        waiter.await.unwrap().unwrap();
        assert_eq!(source.ready_state(), ReadyState::Open);
    }

    #[tokio::test]
    async fn test_opened_fails_when_ended_first() {
        let source = MediaSource::new();
        source.end_of_stream();
        assert!(source.opened().await.is_err());
    }
}
