//! Track-row strategy.
//!
//! Server-rendered pages list tracks as `<li data-testid="tracklist-row-N">`
//! blocks holding a title `<h3>`, an artist `<h4>` and a duration cell with
//! `M:SS` text. Rows missing any of the three are skipped.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::SourceTrack;

use super::text::clean_text;

static ROW_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<li[^>]*data-testid="tracklist-row-\d+"[^>]*>"#).expect("row regex")
});

static NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<h3[^>]*data-encore-id="text"[^>]*>([^<]+)</h3>"#).expect("name regex")
});

static ARTIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<h4[^>]*data-encore-id="text"[^>]*>([^<]+)</h4>"#).expect("artist regex")
});

static DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<div[^>]*data-testid="duration-cell"[^>]*>\s*(\d+:\d+)\s*</div>"#)
        .expect("duration regex")
});

/// Extracts tracks from tagged list rows.
pub fn extract(markup: &str) -> Vec<SourceTrack> {
    let starts: Vec<_> = ROW_START.find_iter(markup).collect();
    starts
        .iter()
        .enumerate()
        .filter_map(|(index, start)| {
            let next = starts.get(index + 1).map_or(markup.len(), |m| m.start());
            parse_row(row_body(&markup[start.end()..next]))
        })
        .collect()
}

/// A row ends at its `</li>`, or at the next row when the close tag is missing.
fn row_body(rest: &str) -> &str {
    rest.find("</li>").map_or(rest, |end| &rest[..end])
}

fn parse_row(row: &str) -> Option<SourceTrack> {
    let name = NAME.captures(row)?;
    let artist = ARTIST.captures(row)?;
    let duration = DURATION.captures(row)?;
    let duration_ms = parse_duration_ms(&duration[1])?;

    Some(SourceTrack {
        name: clean_text(&name[1]),
        artist: clean_text(&artist[1]),
        duration_ms,
        ..Default::default()
    })
}

/// Converts `MM:SS` text to milliseconds.
pub fn parse_duration_ms(text: &str) -> Option<u64> {
    let (minutes, seconds) = text.trim().split_once(':')?;
    let minutes: u64 = minutes.parse().ok()?;
    let seconds: u64 = seconds.parse().ok()?;
    minutes
        .checked_mul(60)?
        .checked_add(seconds)?
        .checked_mul(1000)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(index: usize, name: &str, artist: &str, duration: &str) -> String {
        format!(
            r#"<li class="row" data-testid="tracklist-row-{index}">
  <div><h3 class="title" data-encore-id="text">{name}</h3>
  <h4 data-encore-id="text">{artist}</h4></div>
  <div class="cell" data-testid="duration-cell">{duration}</div>
</li>"#
        )
    }

    #[test]
    fn converts_duration_to_millis() {
        assert_eq!(parse_duration_ms("3:45"), Some(225_000));
        assert_eq!(parse_duration_ms("0:07"), Some(7_000));
        assert_eq!(parse_duration_ms("12:00"), Some(720_000));
        assert_eq!(parse_duration_ms("abc"), None);
    }

    #[test]
    fn extracts_complete_rows() {
        let markup = format!(
            "<ol>{}{}</ol>",
            row(0, "Harder, Better, Faster, Stronger", "Daft Punk", "3:45"),
            row(1, "Tom&#39;s Diner", "Suzanne Vega", "2:09")
        );
        let tracks = extract(&markup);
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].name, "Harder, Better, Faster, Stronger");
        assert_eq!(tracks[0].artist, "Daft Punk");
        assert_eq!(tracks[0].duration_ms, 225_000);
        assert_eq!(tracks[1].name, "Tom's Diner");
        assert_eq!(tracks[1].duration_ms, 129_000);
    }

    #[test]
    fn rows_missing_a_field_are_skipped() {
        let no_duration = r#"<li data-testid="tracklist-row-0"><h3 data-encore-id="text">Song</h3><h4 data-encore-id="text">Artist</h4></li>"#;
        let no_artist = r#"<li data-testid="tracklist-row-1"><h3 data-encore-id="text">Song</h3><div data-testid="duration-cell">1:00</div></li>"#;
        let markup = format!(
            "{}{}{}",
            no_duration,
            no_artist,
            row(2, "Kept", "Someone", "4:01")
        );

        let tracks = extract(&markup);
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].name, "Kept");
    }

    #[test]
    fn unclosed_row_does_not_borrow_from_the_next() {
        let unclosed = r#"<li data-testid="tracklist-row-0"><h3 data-encore-id="text">Orphan</h3>"#;
        let markup = format!("<ol>{}{}</ol>", unclosed, row(1, "Second", "Band", "2:30"));

        let tracks = extract(&markup);
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].name, "Second");
        assert_eq!(tracks[0].artist, "Band");
        assert_eq!(tracks[0].duration_ms, 150_000);
    }

    #[test]
    fn untagged_markup_yields_nothing() {
        assert!(extract("<ul><li>Song</li></ul>").is_empty());
    }
}
