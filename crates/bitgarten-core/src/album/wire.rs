//! Record shapes returned by the album endpoints and their normalisation.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use super::model::{AlbumDetail, AlbumId, AlbumSummary, PictureRef, unix_seconds};
use crate::cache::Fill;
use crate::error::{Error, Result};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct RecordSet<T> {
    #[serde(default = "Vec::new")]
    pub records: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SummaryRecord {
    #[serde(rename = "ISN")]
    isn: u64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    date: i64,
    #[serde(default)]
    metadata: SummaryMetadata,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SummaryMetadata {
    #[serde(default)]
    thumbnail: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DetailRecord {
    #[serde(default)]
    title: String,
    #[serde(default)]
    date: i64,
    #[serde(default)]
    pictures: Vec<PictureRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PictureRecord {
    #[serde(default)]
    md5: String,
    #[serde(rename = "MIMEType", default)]
    mime_type: String,
    #[serde(default)]
    fill: String,
    #[serde(default)]
    size: SizeRecord,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SizeRecord {
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
}

/// Decodes a `{"Records": [...]}` payload.
pub(crate) fn records<T: DeserializeOwned>(payload: Value, what: &str) -> Result<Vec<T>> {
    if payload.is_null() {
        return Err(Error::Payload(format!("{what}: empty response")));
    }
    serde_json::from_value::<RecordSet<T>>(payload)
        .map(|set| set.records)
        .map_err(|e| Error::Payload(format!("{what}: {e}")))
}

/// Normalises the bulk summary payload, in response order.
pub(crate) fn summaries(payload: Value) -> Result<Vec<AlbumSummary>> {
    let records: Vec<SummaryRecord> = records(payload, "album summaries")?;
    Ok(records
        .into_iter()
        .map(|r| AlbumSummary::new(AlbumId(r.isn), r.title, r.date, r.metadata.thumbnail.into()))
        .collect())
}

/// Normalises the first record of an album payload.
pub(crate) fn detail(id: AlbumId, payload: Value) -> Result<AlbumDetail> {
    let record = records::<DetailRecord>(payload, "album detail")?
        .into_iter()
        .next()
        .ok_or_else(|| Error::Payload(format!("album {id} has no record")))?;

    let pictures = record
        .pictures
        .into_iter()
        .enumerate()
        .map(|(i, p)| PictureRef {
            index: i + 1,
            content_hash: p.md5.into(),
            mime_type: p.mime_type,
            fill: Fill::from_wire(&p.fill),
            width: p.size.width,
            height: p.size.height,
            caption: p.description,
        })
        .collect();

    Ok(AlbumDetail {
        id,
        title: record.title,
        date: unix_seconds(record.date),
        pictures,
    })
}

/// Wraps an album record for create and update calls.
pub(crate) fn store_body(record: &Value) -> Value {
    json!({ "Store": [record] })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_summaries_keep_response_order() {
        let payload = json!({"Records": [
            {"ISN": 2, "Title": "B", "Date": 300, "Metadata": {"Thumbnail": "t2"}},
            {"ISN": 1, "Title": "A", "Date": 100, "Metadata": {"Thumbnail": "t1"}},
        ]});
        let list = summaries(payload).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].isn, AlbumId(2));
        assert_eq!(list[0].thumbnail_hash.as_str(), "t2");
        assert_eq!(list[1].date_time_raw, 100);
    }

    #[test]
    fn test_summary_without_metadata() {
        let list = summaries(json!({"Records": [{"ISN": 7}]})).unwrap();
        assert!(list[0].thumbnail_hash.is_empty());
        assert_eq!(list[0].title, "");
    }

    #[test]
    fn test_detail_maps_pictures() {
        let payload = json!({"Records": [{
            "Title": "Holiday",
            "Date": 1_600_000_000,
            "Pictures": [
                {"Md5": "a", "MIMEType": "image/jpeg", "Fill": "fill",
                 "Size": {"Width": 800, "Height": 600}, "Description": "beach"},
                {"Md5": "b", "MIMEType": "video/mp4", "Fill": "fillHeight",
                 "Size": {"Width": 1920, "Height": 1080}},
            ]
        }]});
        let detail = detail(AlbumId(5), payload).unwrap();
        assert_eq!(detail.id, AlbumId(5));
        assert_eq!(detail.title, "Holiday");
        assert_eq!(detail.pictures.len(), 2);

        let first = &detail.pictures[0];
        assert_eq!(first.index, 1);
        assert_eq!(first.content_hash.as_str(), "a");
        assert_eq!((first.width, first.height), (800, 600));
        assert_eq!(first.caption, "beach");

        let second = &detail.pictures[1];
        assert_eq!(second.index, 2);
        assert_eq!(second.fill, Fill::FillHeight);
        assert_eq!(second.caption, "");
    }

    #[test]
    fn test_detail_without_records() {
        let err = detail(AlbumId(5), json!({"Records": []})).unwrap_err();
        assert!(matches!(err, Error::Payload(_)));
        assert!(matches!(detail(AlbumId(5), Value::Null), Err(Error::Payload(_))));
    }

    #[test]
    fn test_wrong_shape() {
        let err = summaries(json!({"Records": "nope"})).unwrap_err();
        assert!(matches!(err, Error::Payload(_)));
    }

    #[test]
    fn test_store_body() {
        let body = store_body(&json!({"Title": "New"}));
        assert_eq!(body, json!({"Store": [{"Title": "New"}]}));
    }
}
