//! Playable URL derivation
//!
//! A track's URL is `{public_base}/{percent-encoded key}`, encoded the way
//! browsers' `encodeURIComponent` does it: RFC 3986 unreserved characters and
//! the marks `! * ' ( )` stay literal, and everything else is encoded from
//! its UTF-8 bytes. That includes `/`, so the whole key is a single path
//! segment and decoding the segment recovers the key exactly.

use crate::error::{LibraryError, Result};
use crate::models::{PlayableTrack, Track};

/// Marks `encodeURIComponent` leaves unescaped, with their escaped forms
const LITERAL_MARKS: [(&str, &str); 5] = [
    ("%21", "!"),
    ("%2A", "*"),
    ("%27", "'"),
    ("%28", "("),
    ("%29", ")"),
];

/// Percent-encode one URL path segment
///
/// Every `%` in the encoder's output starts an escape triple, so restoring
/// the marks by substring cannot touch an encoded literal `%`.
fn encode_segment(key: &str) -> String {
    LITERAL_MARKS
        .iter()
        .fold(urlencoding::encode(key).into_owned(), |encoded, (escaped, mark)| {
            encoded.replace(escaped, mark)
        })
}

/// Builds playable URLs from a configured public base
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayableUrlBuilder {
    base: String,
}

impl PlayableUrlBuilder {
    /// Create a builder; trailing slashes on the base are dropped
    pub fn new(public_base: impl Into<String>) -> Result<Self> {
        let base = public_base.into().trim().trim_end_matches('/').to_string();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(LibraryError::invalid(
                "public_base_url",
                format!("must be an http(s) URL, got {:?}", base),
            ));
        }
        Ok(Self { base })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// URL for an object key
    pub fn url_for(&self, key: &str) -> String {
        format!("{}/{}", self.base, encode_segment(key))
    }

    /// Recover the object key from a URL produced by [`url_for`](Self::url_for)
    ///
    /// Returns `None` if the URL does not belong to this base or is not
    /// valid percent-encoded UTF-8.
    pub fn key_for(&self, url: &str) -> Option<String> {
        let segment = url.strip_prefix(&self.base)?.strip_prefix('/')?;
        urlencoding::decode(segment).ok().map(|k| k.into_owned())
    }

    /// Attach the derived URL to a track
    pub fn playable(&self, track: Track) -> PlayableTrack {
        let playable_url = self.url_for(&track.source_key);
        PlayableTrack {
            track,
            playable_url,
        }
    }
}
