#![allow(dead_code, clippy::unwrap_used)]

use std::io::Cursor;
use std::sync::Arc;

use bitgarten_client::testing::ScriptedTransport;
use bitgarten_client::{ClientConfig, Gateway, ReloadSignal, Session, SessionContext};
use bitgarten_core::{Loader, LoaderOptions};

pub type TestLoader = Loader<Arc<ScriptedTransport>>;

pub struct Harness {
    pub loader: TestLoader,
    pub transport: Arc<ScriptedTransport>,
    pub reload: ReloadSignal,
}

pub fn harness(options: LoaderOptions) -> Harness {
    let transport = Arc::new(ScriptedTransport::new());
    let reload = ReloadSignal::new();
    let config = ClientConfig::new("http://gallery.test").unwrap();
    let session = SessionContext::in_memory();
    session.persist(&Session::with_token("secret-token")).unwrap();

    let gateway = Gateway::new(Arc::clone(&transport), config, session)
        .with_reload_handler(reload.clone());
    Harness {
        loader: Loader::new(gateway, options),
        transport,
        reload,
    }
}

pub fn png(width: u32, height: u32) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    image::RgbImage::new(width, height)
        .write_to(&mut out, image::ImageFormat::Png)
        .unwrap();
    out.into_inner()
}
