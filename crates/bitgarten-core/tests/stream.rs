//! Fetch-then-append video playback.

#![allow(clippy::unwrap_used)]

mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use bitgarten_client::{HttpResponse, Method, endpoints};
use bitgarten_core::{Error, LoaderOptions, PlaybackElement};
use bitgarten_media::{MediaSource, ReadyState};
use common::harness;
use parking_lot::Mutex;

#[derive(Default)]
struct FakeVideo {
    opens_source: bool,
    source: Mutex<Option<MediaSource>>,
    played: AtomicBool,
}

impl FakeVideo {
    fn new(opens_source: bool) -> Self {
        Self {
            opens_source,
            ..Self::default()
        }
    }

    fn source(&self) -> MediaSource {
        self.source.lock().clone().unwrap()
    }
}

impl PlaybackElement for FakeVideo {
    fn attach(&self, source: &MediaSource) {
        *self.source.lock() = Some(source.clone());
        if self.opens_source {
            source.open();
        }
    }

    fn play(&self) {
        self.played.store(true, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn stream_appends_whole_video_then_plays() {
    let h = harness(LoaderOptions::default());
    let path = endpoints::video_media("v1");
    h.transport
        .on(Method::GET, &path, HttpResponse::new(200, vec![1_u8, 2, 3, 4]));
    let video = FakeVideo::new(true);

    assert!(h.loader.stream_video("v1", &video).await.unwrap());
    assert!(video.played.load(Ordering::SeqCst));

    let source = video.source();
    assert_eq!(source.ready_state(), ReadyState::Open);
    assert_eq!(source.buffer_count(), 1);

    let sent = h.transport.requests();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].accept, "video/mp4");
    assert_eq!(sent[0].authorization, "Bearer secret-token");
}

#[tokio::test]
async fn stream_fetch_failure_never_plays() {
    let h = harness(LoaderOptions::default());
    h.transport
        .fail(Method::GET, &endpoints::video_media("v1"), "connection reset");
    let video = FakeVideo::new(true);

    assert!(!h.loader.stream_video("v1", &video).await.unwrap());
    assert!(!video.played.load(Ordering::SeqCst));
}

#[tokio::test]
async fn stream_times_out_when_source_never_opens() {
    let h = harness(
        LoaderOptions::default().with_source_open_timeout(Duration::from_millis(20)),
    );
    let video = FakeVideo::new(false);

    let err = h.loader.stream_video("v1", &video).await.unwrap_err();
    assert!(matches!(err, Error::StreamTimeout(_)));
    assert!(h.transport.requests().is_empty());
    assert!(!video.played.load(Ordering::SeqCst));
}

#[tokio::test]
async fn stream_does_not_touch_media_cache() {
    let h = harness(LoaderOptions::default());
    h.transport.on(
        Method::GET,
        &endpoints::video_media("v1"),
        HttpResponse::new(200, "mp4"),
    );
    let video = FakeVideo::new(true);

    h.loader.stream_video("v1", &video).await.unwrap();
    assert_eq!(h.loader.cache().image_count(), 0);
}
