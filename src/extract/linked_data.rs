//! Linked-data strategy.
//!
//! Reads `<script type="application/ld+json">` blocks. Two shapes are
//! understood: a `@graph` of typed entries, where `MusicRecording` entries
//! yield a name and primary artist, and a flat `itemListElement` array,
//! which yields names only.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::types::SourceTrack;

use super::text::clean_text;

static LD_JSON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<script[^>]*type="application/ld\+json"[^>]*>(.*?)</script>"#)
        .expect("ld+json regex")
});

const RECORDING_TYPE: &str = "MusicRecording";

/// Extracts tracks from every linked-data block on the page.
pub fn extract(markup: &str) -> Vec<SourceTrack> {
    let mut tracks = Vec::new();

    for block in LD_JSON.captures_iter(markup) {
        let data: Value = match serde_json::from_str(block[1].trim()) {
            Ok(data) => data,
            Err(e) => {
                tracing::debug!(error = %e, "skipping unparseable ld+json block");
                continue;
            }
        };

        if let Some(graph) = data.get("@graph").and_then(Value::as_array) {
            tracks.extend(graph.iter().filter(|e| is_recording(e)).map(recording));
        } else if let Some(items) = data.get("itemListElement").and_then(Value::as_array) {
            tracks.extend(items.iter().filter_map(list_item));
        }
    }

    tracks
}

fn is_recording(entry: &Value) -> bool {
    match entry.get("@type") {
        Some(Value::String(t)) => t == RECORDING_TYPE,
        Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some(RECORDING_TYPE)),
        _ => false,
    }
}

fn recording(entry: &Value) -> SourceTrack {
    // byArtist is either a single object or a list whose head is the primary artist
    let artist = match entry.get("byArtist") {
        Some(Value::Array(artists)) => artists.first().and_then(name_of),
        Some(artist) => name_of(artist),
        None => None,
    };

    SourceTrack {
        name: name_of(entry).unwrap_or_default(),
        artist: artist.unwrap_or_default(),
        ..Default::default()
    }
}

fn list_item(item: &Value) -> Option<SourceTrack> {
    let name = name_of(item).or_else(|| item.get("item").and_then(name_of))?;
    Some(SourceTrack {
        name,
        ..Default::default()
    })
}

fn name_of(value: &Value) -> Option<String> {
    value.get("name").and_then(Value::as_str).map(clean_text)
}
