//! Utility functions for file naming

/// Map an arbitrary title to a directory name that is safe on every filesystem
///
/// Leading and trailing whitespace is trimmed first. Every remaining character
/// that is not alphanumeric, a space or an underscore is replaced by an
/// underscore, one for one, so the result has exactly as many characters as
/// the trimmed title.
///
/// # Examples
///
/// ```
/// use majdata_dl::utils::sanitize_title;
///
/// assert_eq!(sanitize_title("Song/B"), "Song_B");
/// assert_eq!(sanitize_title("  Song A  "), "Song A");
/// assert_eq!(sanitize_title("a:b*c?"), "a_b_c_");
/// ```
#[must_use]
pub fn sanitize_title(title: &str) -> String {
    title
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == ' ' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: &[&str] = &[
        "",
        "Song A",
        "Song/B",
        "..\\..\\etc/passwd",
        "CON:",
        "a\tb\nc",
        "mixed_Case 123",
        "Ünïcödé タイトル",
        "emoji 🎵 title",
        "trailing dot.",
        "<>:\"|?*",
    ];

    #[test]
    fn sanitize_preserves_character_count_of_trimmed_input() {
        for sample in SAMPLES {
            let out = sanitize_title(sample);
            assert_eq!(
                out.chars().count(),
                sample.trim().chars().count(),
                "length changed for {sample:?}"
            );
        }
    }

    #[test]
    fn sanitize_output_contains_only_allowed_characters() {
        for sample in SAMPLES {
            let out = sanitize_title(sample);
            assert!(
                out.chars()
                    .all(|c| c.is_alphanumeric() || c == ' ' || c == '_'),
                "disallowed character in {out:?} (from {sample:?})"
            );
        }
    }

    #[test]
    fn sanitize_leaves_allowed_characters_unchanged() {
        for sample in ["Song A", "abc_DEF 012", "タイトル", "Ünïcödé"] {
            assert_eq!(sanitize_title(sample), sample);
        }
    }

    #[test]
    fn sanitize_replaces_path_separators_and_dots() {
        assert_eq!(sanitize_title("Song/B"), "Song_B");
        assert_eq!(sanitize_title("..\\x"), "___x");
        assert_eq!(sanitize_title("a.b"), "a_b");
    }

    #[test]
    fn sanitize_trims_outer_whitespace_but_keeps_inner_spaces() {
        assert_eq!(sanitize_title("  Song  A \n"), "Song  A");
        assert_eq!(sanitize_title(" \t "), "");
    }

    #[test]
    fn sanitize_replaces_inner_tabs_and_newlines() {
        assert_eq!(sanitize_title("a\tb\nc"), "a_b_c");
    }
}
