//! Command implementations.

use anyhow::Context;
use bitgarten_client::Transport;
use bitgarten_core::{AlbumId, Loader};
use tracing::info;

use crate::cli::Command;

/// Runs one command against the loader, printing results to stdout.
pub async fn run<T: Transport>(loader: &Loader<T>, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Login { username, password } => {
            loader
                .gateway()
                .login(&username, &password)
                .await
                .context("login failed")?;
            println!("Logged in as {username}");
        }
        Command::Logout => {
            loader.gateway().logout()?;
            println!("Logged out");
        }
        Command::Whoami => match loader.gateway().session().current() {
            Some(session) => println!(
                "{}",
                session.username.as_deref().unwrap_or("(token session)")
            ),
            None => println!("Not logged in"),
        },
        Command::Albums => {
            let dispatched = loader.load_album_summaries().await?;
            dispatched.settle().await?;
            for album in loader.list_albums() {
                println!(
                    "{:>6}  {}  {}",
                    album.isn,
                    album.date.format("%Y-%m-%d"),
                    album.title
                );
            }
        }
        Command::Album { id, eager } => {
            let id = AlbumId(id);
            let dispatched = loader.load_album_detail(id, eager).await?;
            let loads = dispatched.len();
            dispatched.settle().await?;

            let album = loader
                .album_by_id(id)
                .with_context(|| format!("album {id} not loaded"))?;
            println!("{} ({} pictures)", album.title, album.pictures.len());
            for picture in &album.pictures {
                let decoded = loader
                    .cache()
                    .get(picture.content_hash.as_str())
                    .map(|m| format!(" decoded {}x{}", m.width(), m.height()))
                    .unwrap_or_default();
                println!(
                    "{:>4}  {}  {:<10}  {}x{}{decoded}  {}",
                    picture.index,
                    picture.content_hash,
                    picture.mime_type,
                    picture.width,
                    picture.height,
                    picture.caption
                );
            }
            info!(loads, cached = loader.cache().image_count(), "Album done");
        }
        Command::Thumbnails { id } => {
            let dispatched = loader.load_album_thumbnails(AlbumId(id)).await?;
            dispatched.settle().await?;
            println!("{} thumbnails cached", loader.cache().thumbnail_count());
        }
        Command::Directories => {
            for directory in loader.list_picture_directories().await? {
                println!("{directory}");
            }
        }
        Command::Directory { name } => {
            for picture in loader.list_directory_pictures(&name).await? {
                println!(
                    "{:>8}  {}  {}",
                    picture.isn, picture.content_hash, picture.title
                );
            }
        }
    }
    Ok(())
}
