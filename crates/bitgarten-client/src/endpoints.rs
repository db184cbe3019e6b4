//! Paths of the gallery REST and binary API.
//!
//! Paths are relative to [`crate::ClientConfig::base_url`] and include their
//! query strings.

use url::form_urlencoded;

/// Login with a `Basic` header.
pub const LOGIN: &str = "/login";

/// Album collection; target of creates.
pub const ALBUMS: &str = "/rest/map/Album";

/// Bulk album summaries.
pub const ALBUM_SUMMARIES: &str = "/rest/map/Albums?fields=Title,Date,Thumbnail&limit=0";

/// Distinct picture directories.
pub const PICTURE_DIRECTORIES: &str =
    "/rest/map/PictureMetadata?limit=0&start=0&descriptor=true&fields=Directory";

/// One album with its picture records.
#[must_use]
pub fn album(isn: u64) -> String {
    format!("{ALBUMS}/{isn}")
}

/// Replaces an album record.
#[must_use]
pub fn album_update(isn: u64) -> String {
    format!("{ALBUMS}/{isn}?exchange=true")
}

/// Full-size image bytes by content hash.
#[must_use]
pub fn picture_media(hash: &str) -> String {
    format!("/binary/map/Picture/*/Media?search=Md5={hash}")
}

/// Video bytes by content hash, typed from the record's MIME field.
#[must_use]
pub fn video_media(hash: &str) -> String {
    format!("/video/map/PictureBinary/*/Media?mimetypeField=MIMEType&search=Md5={hash}")
}

/// Thumbnail bytes by content hash.
#[must_use]
pub fn picture_thumbnail(hash: &str) -> String {
    format!("/binary/map/Picture/*/Thumbnail?search=Md5={hash}")
}

/// Picture metadata records in one directory. The name is form-encoded.
#[must_use]
pub fn picture_directory(directory: &str) -> String {
    let directory: String = form_urlencoded::byte_serialize(directory.as_bytes()).collect();
    format!("/rest/map/PictureMetadata?limit=0&search=Directory={directory}")
}
