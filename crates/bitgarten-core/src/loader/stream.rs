//! Fetch-then-append video playback through a buffered media source.

use bitgarten_client::{AcceptKind, Transport, endpoints};
use bitgarten_media::{MediaSource, VIDEO_MP4_AVC};
use tracing::{debug, warn};

use super::Loader;
use crate::error::{Error, Result};

/// Something that plays a [`MediaSource`], such as a video widget.
pub trait PlaybackElement: Send + Sync {
    /// Points the element at `source`. The element opens the source once it
    /// is ready to receive data.
    fn attach(&self, source: &MediaSource);

    /// Starts playback.
    fn play(&self);
}

impl<T: Transport> Loader<T> {
    /// Streams a video into `element`.
    ///
    /// The whole video is fetched in one request and appended to the
    /// source buffer in a single chunk before `play()` is called. Returns
    /// false if the fetch failed, in which case playback never starts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StreamTimeout`] if the element does not open the
    /// source in time, and a media error if the buffer cannot be created.
    pub async fn stream_video<E>(&self, hash: &str, element: &E) -> Result<bool>
    where
        E: PlaybackElement + ?Sized,
    {
        let source = MediaSource::new();
        element.attach(&source);

        let timeout = self.options().source_open_timeout;
        tokio::time::timeout(timeout, source.opened())
            .await
            .map_err(|_| Error::StreamTimeout(timeout))??;

        let buffer = source.add_source_buffer(VIDEO_MP4_AVC)?;
        let path = endpoints::video_media(hash);
        let bytes = match self
            .gateway()
            .request_binary(&path, AcceptKind::VideoMp4)
            .await
        {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(hash, "Video stream failed: {e}");
                return Ok(false);
            }
        };

        buffer.append(&bytes);
        debug!(hash, len = bytes.len(), "Video buffered, starting playback");
        element.play();
        Ok(true)
    }
}
