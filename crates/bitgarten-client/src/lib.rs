//! # bitgarten-client
//!
//! Session handling and the authenticated fetch gateway for the Bitgarten
//! gallery API.
//!
//! ## Features
//!
//! - **Session context**: persisted credential record, `Bearer` or `Basic`
//!   header derivation, teardown
//! - **Fetch gateway**: JSON and binary requests under one status policy
//! - **Reload signal**: 401/404 tears the session down and asks the shell to
//!   restart
//! - **Pluggable transport**: `reqwest` in production, a scripted table in
//!   tests (`test-util` feature)
//!
//! ## Quick Start
//!
//! ```ignore
//! use bitgarten_client::{
//!     CachedSessionStore, ClientConfig, Gateway, KeyringSessionStore, ReloadSignal,
//!     ReqwestTransport, SessionContext, endpoints,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::new("http://localhost:8130")?;
//!     let transport = ReqwestTransport::new(&config)?;
//!     let session = SessionContext::new(CachedSessionStore::new(KeyringSessionStore::new()));
//!     let reload = ReloadSignal::new();
//!
//!     let gateway = Gateway::new(transport, config, session).with_reload_handler(reload.clone());
//!     gateway.login("admin", "secret").await?;
//!
//!     let albums = gateway.get_json(endpoints::ALBUM_SUMMARIES).await?;
//!     println!("{albums}");
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod config;
pub mod endpoints;
mod error;
mod gateway;
pub mod session;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;
mod transport;

pub use config::{ClientConfig, ClientConfigBuilder, DEFAULT_BASE_URL};
pub use error::{BoxError, Error, Result};
pub use gateway::{Gateway, ReloadHandler, ReloadSignal};
pub use session::{
    AcceptKind, AuthHeader, CachedSessionStore, KeyringSessionStore, MemorySessionStore, Session,
    SessionContext, SessionStore, SessionStoreError,
};
pub use transport::{HttpRequest, HttpResponse, Method, ReqwestTransport, Transport};
