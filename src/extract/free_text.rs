//! Free-text strategy, the last resort.
//!
//! Any line shaped like `Artist - Title` is taken as a track: the line must
//! contain exactly one `" - "`, be longer than 10 and shorter than 200
//! characters, and neither side may be empty or contain `<`.

use crate::types::SourceTrack;

use super::text::clean_text;

const SEPARATOR: &str = " - ";
const MIN_LEN_EXCLUSIVE: usize = 10;
const MAX_LEN_EXCLUSIVE: usize = 200;

/// Extracts `Artist - Title` lines.
pub fn extract(markup: &str) -> Vec<SourceTrack> {
    markup.lines().filter_map(parse_line).collect()
}

fn parse_line(line: &str) -> Option<SourceTrack> {
    let line = line.trim();
    let len = line.chars().count();
    if len <= MIN_LEN_EXCLUSIVE || len >= MAX_LEN_EXCLUSIVE {
        return None;
    }

    let mut parts = line.split(SEPARATOR);
    let (artist, name) = (parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let (artist, name) = (artist.trim(), name.trim());
    if artist.is_empty() || name.is_empty() || artist.contains('<') || name.contains('<') {
        return None;
    }

    Some(SourceTrack::new(clean_text(name), clean_text(artist)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_artist_title_line() {
        let tracks = extract("Daft Punk - One More Time");
        assert_eq!(tracks, vec![SourceTrack::new("One More Time", "Daft Punk")]);
    }

    #[test]
    fn rejects_markup_lines() {
        assert!(extract("<div> - something</div>").is_empty());
        assert!(extract("Artist - <b>Title</b>").is_empty());
    }

    #[test]
    fn enforces_length_bounds() {
        // exactly 10 characters
        assert!(extract("Abc - Defg").is_empty());
        // 11 characters
        assert_eq!(extract("Abc - Defgh").len(), 1);
        let long = format!("{} - {}", "a".repeat(100), "b".repeat(100));
        assert!(extract(&long).is_empty());
    }

    #[test]
    fn rejects_multiple_separators() {
        assert!(extract("Artist - Title - Remastered 2011").is_empty());
    }

    #[test]
    fn collects_lines_in_order() {
        let markup = "Intro text without separator\n  Queen - Under Pressure  \nnoise\nToto - Africa Live";
        let tracks = extract(markup);
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].artist, "Queen");
        assert_eq!(tracks[0].name, "Under Pressure");
        assert_eq!(tracks[1].name, "Africa Live");
    }
}
