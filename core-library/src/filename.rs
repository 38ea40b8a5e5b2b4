//! Filename-to-metadata heuristic
//!
//! Object keys are expected to look like `Artist - Title.mp3`, possibly with
//! a decorative tag inserted by a capture tool (e.g. `(SPOTISAVER)`). The
//! parser is shared by the sync and upload paths so both derive identical
//! metadata for the same key.

use serde::{Deserialize, Serialize};

use crate::models::UNKNOWN_ARTIST;

/// Tag inserted into file names by the capture tool
pub const DEFAULT_DECORATIVE_MARKER: &str = "(SPOTISAVER)";

/// Separator between artist and title
pub const SEPARATOR: char = '-';

/// Title and artist derived from an object key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedName {
    pub title: String,
    pub artist: String,
}

/// Pure, total parser from object key to [`ParsedName`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenameParser {
    decorative_markers: Vec<String>,
    media_extensions: Vec<String>,
}

impl Default for FilenameParser {
    fn default() -> Self {
        Self {
            decorative_markers: vec![DEFAULT_DECORATIVE_MARKER.to_string()],
            media_extensions: vec!["mp3".to_string()],
        }
    }
}

impl FilenameParser {
    pub fn new(decorative_markers: Vec<String>, media_extensions: Vec<String>) -> Self {
        Self {
            decorative_markers: decorative_markers
                .into_iter()
                .filter(|m| !m.is_empty())
                .collect(),
            media_extensions: media_extensions
                .into_iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    /// Derive title and artist from a raw object key
    ///
    /// Splits on the first separator only, so `Artist - Song - Remix.mp3`
    /// yields artist `Artist` and title `Song - Remix`.
    pub fn parse(&self, raw_key: &str) -> ParsedName {
        let file_name = raw_key.rsplit('/').next().unwrap_or(raw_key);
        let cleaned = self.clean(file_name);

        if cleaned.is_empty() {
            return ParsedName {
                title: file_name.to_string(),
                artist: UNKNOWN_ARTIST.to_string(),
            };
        }

        if let Some((artist, title)) = cleaned.split_once(SEPARATOR) {
            let (artist, title) = (artist.trim(), title.trim());
            if !artist.is_empty() && !title.is_empty() {
                return ParsedName {
                    title: title.to_string(),
                    artist: artist.to_string(),
                };
            }
        }

        ParsedName {
            title: cleaned,
            artist: UNKNOWN_ARTIST.to_string(),
        }
    }

    fn clean(&self, file_name: &str) -> String {
        let mut name = file_name.to_string();
        for marker in &self.decorative_markers {
            name = name.replace(marker.as_str(), "");
        }

        let trimmed = name.trim_end();
        let without_extension = match trimmed.rsplit_once('.') {
            Some((stem, ext))
                if self
                    .media_extensions
                    .iter()
                    .any(|known| known.eq_ignore_ascii_case(ext)) =>
            {
                stem
            }
            _ => trimmed,
        };

        without_extension.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(key: &str) -> ParsedName {
        FilenameParser::default().parse(key)
    }

    #[test]
    fn test_splits_on_first_separator_only() {
        let parsed = parse("Artist - Song - Remix.mp3");
        assert_eq!(parsed.artist, "Artist");
        assert_eq!(parsed.title, "Song - Remix");
    }

    #[test]
    fn test_no_separator_uses_unknown_artist() {
        let parsed = parse("SoloTrack.mp3");
        assert_eq!(parsed.artist, UNKNOWN_ARTIST);
        assert_eq!(parsed.title, "SoloTrack");
    }

    #[test]
    fn test_strips_decorative_marker() {
        let parsed = parse("Daft Punk - One More Time (SPOTISAVER).mp3");
        assert_eq!(parsed.artist, "Daft Punk");
        assert_eq!(parsed.title, "One More Time");

        let parsed = parse("(SPOTISAVER)Intro(SPOTISAVER).mp3");
        assert_eq!(parsed.title, "Intro");
    }

    #[test]
    fn test_separator_without_spaces() {
        let parsed = parse("AC-DC.mp3");
        assert_eq!(parsed.artist, "AC");
        assert_eq!(parsed.title, "DC");
    }

    #[test]
    fn test_empty_side_falls_back_to_whole_name() {
        let parsed = parse("- Untitled.mp3");
        assert_eq!(parsed.artist, UNKNOWN_ARTIST);
        assert_eq!(parsed.title, "- Untitled");

        let parsed = parse("Artist -.mp3");
        assert_eq!(parsed.artist, UNKNOWN_ARTIST);
        assert_eq!(parsed.title, "Artist -");
    }

    #[test]
    fn test_only_marker_and_extension() {
        let parsed = parse("(SPOTISAVER).mp3");
        assert_eq!(parsed.artist, UNKNOWN_ARTIST);
        assert_eq!(parsed.title, "(SPOTISAVER).mp3");
    }

    #[test]
    fn test_keeps_dots_that_are_not_media_extensions() {
        let parsed = parse("The Killers - Mr. Brightside");
        assert_eq!(parsed.artist, "The Killers");
        assert_eq!(parsed.title, "Mr. Brightside");

        let parsed = parse("Song.MP3");
        assert_eq!(parsed.title, "Song");
    }

    #[test]
    fn test_uses_final_path_segment() {
        let parsed = parse("uploads/2024/Alice - Song1.mp3");
        assert_eq!(parsed.artist, "Alice");
        assert_eq!(parsed.title, "Song1");
    }

    #[test]
    fn test_unicode_names() {
        let parsed = parse("Sigur Rós - Hoppípolla.mp3");
        assert_eq!(parsed.artist, "Sigur Rós");
        assert_eq!(parsed.title, "Hoppípolla");
    }

    #[test]
    fn test_reparsing_title_terminates_and_shrinks() {
        let parser = FilenameParser::default();
        let mut title = parser.parse("A - B - C - D.mp3").title;
        let mut rounds = 0;

        loop {
            let next = parser.parse(&title);
            assert!(next.title.len() <= title.len());
            if next.title == title {
                break;
            }
            title = next.title;
            rounds += 1;
            assert!(rounds < 10);
        }

        assert_eq!(title, "D");
    }

    #[test]
    fn test_deterministic() {
        let parser = FilenameParser::default();
        let key = "Artist - Song (SPOTISAVER).mp3";
        assert_eq!(parser.parse(key), parser.parse(key));
    }

    #[test]
    fn test_custom_markers_and_extensions() {
        let parser = FilenameParser::new(
            vec!["[RIP]".to_string(), String::new()],
            vec![".flac".to_string()],
        );

        let parsed = parser.parse("Bonobo - Kerala [RIP].flac");
        assert_eq!(parsed.artist, "Bonobo");
        assert_eq!(parsed.title, "Kerala");

        let parsed = parser.parse("Bonobo - Kerala.mp3");
        assert_eq!(parsed.title, "Kerala.mp3");
    }
}
