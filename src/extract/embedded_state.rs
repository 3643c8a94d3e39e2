//! Embedded page-state strategy.
//!
//! The embed page assigns its initial state to a global before hydration:
//!
//! ```text
//! window.__spotify_initial_state = {"entities":{"tracks":{"data":{...}}}};
//! ```
//!
//! The object is parsed as JSON and each entry under `entities.tracks.data`
//! becomes a track. `data` is normally keyed by track id; a plain array is
//! accepted too.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::types::SourceTrack;

use super::text::clean_text;

static STATE_ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"window\.__spotify_initial_state\s*=\s*").expect("state assignment regex")
});

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct InitialState {
    #[serde(deserialize_with = "null_as_default")]
    entities: Entities,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Entities {
    #[serde(deserialize_with = "null_as_default")]
    tracks: TrackTable,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TrackTable {
    data: Value,
}

// Every field is optional and the page writes `null` for absent values.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StateTrack {
    #[serde(deserialize_with = "null_as_default")]
    name: String,
    #[serde(deserialize_with = "null_as_default")]
    artists: Vec<Option<NamedEntity>>,
    #[serde(deserialize_with = "null_as_default")]
    album: NamedEntity,
    #[serde(deserialize_with = "null_as_default")]
    duration_ms: u64,
    #[serde(deserialize_with = "null_as_default")]
    uri: String,
    #[serde(deserialize_with = "null_as_default")]
    id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NamedEntity {
    #[serde(deserialize_with = "null_as_default")]
    name: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Extracts tracks from the embedded initial-state object.
pub fn extract(markup: &str) -> Vec<SourceTrack> {
    let Some(assignment) = STATE_ASSIGNMENT.find(markup) else {
        return Vec::new();
    };

    // Parse exactly one JSON value starting after `=`; whatever follows
    // (`;`, more script) is ignored.
    let rest = &markup[assignment.end()..];
    let mut values = serde_json::Deserializer::from_str(rest).into_iter::<InitialState>();
    let state = match values.next() {
        Some(Ok(state)) => state,
        Some(Err(e)) => {
            tracing::debug!(error = %e, "embedded state present but not parseable");
            return Vec::new();
        }
        None => return Vec::new(),
    };

    let entries: Vec<Value> = match state.entities.tracks.data {
        Value::Object(map) => map.into_iter().map(|(_, v)| v).collect(),
        Value::Array(items) => items,
        _ => return Vec::new(),
    };

    entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value::<StateTrack>(entry).ok())
        .map(project)
        .collect()
}

fn project(track: StateTrack) -> SourceTrack {
    let external_id = if track.uri.is_empty() {
        track.id
    } else {
        track.uri
    };

    SourceTrack {
        name: clean_text(&track.name),
        artist: join_artists(&track.artists),
        album: clean_text(&track.album.name),
        duration_ms: track.duration_ms,
        external_id: clean_text(&external_id),
    }
}

/// Renders the artist credit as `"First ft. Second"`; further artists are dropped.
fn join_artists(artists: &[Option<NamedEntity>]) -> String {
    let names: Vec<String> = artists
        .iter()
        .flatten()
        .map(|a| clean_text(&a.name))
        .filter(|n| !n.is_empty())
        .take(2)
        .collect();
    names.join(" ft. ")
}
