//! Output file naming.
//!
//! Two tracks whose names sanitize to the same string land on the same
//! path; the later one overwrites the earlier file.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

const MAX_FILENAME_BYTES: usize = 255;

static ILLEGAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[/?<>\\:*|"\x00-\x1F\x80-\x9F]"#).expect("valid regex"));
static WINDOWS_RESERVED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(con|prn|aux|nul|com[0-9]|lpt[0-9])(\..*)?$").expect("valid regex")
});
static WINDOWS_TRAILING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[. ]+$").expect("valid regex"));

/// Makes `name` safe to use as a single path component.
pub fn sanitize(name: &str) -> String {
    let cleaned = ILLEGAL.replace_all(name, "");
    if cleaned == "." || cleaned == ".." {
        return String::new();
    }
    if WINDOWS_RESERVED.is_match(&cleaned) {
        return String::new();
    }
    let cleaned = WINDOWS_TRAILING.replace(&cleaned, "");
    truncate(&cleaned, MAX_FILENAME_BYTES).to_string()
}

fn truncate(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// `<root>/<playlist>/<track>.mp3`
pub fn destination(root: &Path, playlist_name: &str, track_name: &str) -> PathBuf {
    root.join(sanitize(playlist_name))
        .join(format!("{}.mp3", sanitize(track_name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_illegal_characters() {
        assert_eq!(sanitize("AC/DC: Live?"), "ACDC Live");
        assert_eq!(sanitize("a<b>c|d*e\"f\\g"), "abcdefg");
        assert_eq!(sanitize("tab\there"), "tabhere");
        assert_eq!(sanitize("Song A"), "Song A");
    }

    #[test]
    fn rejects_reserved_names_and_trailing_dots() {
        assert_eq!(sanitize(".."), "");
        assert_eq!(sanitize("CON"), "");
        assert_eq!(sanitize("lpt1.txt"), "");
        assert_eq!(sanitize("Hey Jude..."), "Hey Jude");
        assert_eq!(sanitize("Console"), "Console");
    }

    #[test]
    fn truncates_on_char_boundary() {
        let long = "é".repeat(200);
        let out = sanitize(&long);
        assert!(out.len() <= MAX_FILENAME_BYTES);
        assert_eq!(out.chars().count(), 127);
    }

    #[test]
    fn destination_is_deterministic_and_collides_on_equal_names() {
        let root = Path::new("music");
        assert_eq!(
            destination(root, "Test Mix", "Song A"),
            PathBuf::from("music/Test Mix/Song A.mp3")
        );
        assert_eq!(
            destination(root, "Test Mix", "Song: A"),
            destination(root, "Test Mix", "Song A")
        );
    }
}
