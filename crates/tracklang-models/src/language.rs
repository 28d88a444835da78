//! ISO 639 language code mapping.
//!
//! Language identification models report ISO 639-1 (two-letter) codes while
//! containers usually carry ISO 639-2 tags, sometimes in the bibliographic
//! form (`fre`, `ger`). Comparisons are always made on the ISO 639-2/T
//! (terminologic) form.

use tracing::warn;

/// ISO 639-1 to ISO 639-2/T.
const ISO639_1_TO_2: &[(&str, &str)] = &[
    ("en", "eng"),
    ("es", "spa"),
    ("fr", "fra"),
    ("de", "deu"),
    ("it", "ita"),
    ("pt", "por"),
    ("ru", "rus"),
    ("ja", "jpn"),
    ("ko", "kor"),
    ("zh", "zho"),
    ("ar", "ara"),
    ("ca", "cat"),
    ("cs", "ces"),
    ("da", "dan"),
    ("nl", "nld"),
    ("fi", "fin"),
    ("el", "ell"),
    ("he", "heb"),
    ("hi", "hin"),
    ("hu", "hun"),
    ("id", "ind"),
    ("no", "nor"),
    ("pl", "pol"),
    ("ro", "ron"),
    ("sv", "swe"),
    ("th", "tha"),
    ("tr", "tur"),
    ("uk", "ukr"),
    ("vi", "vie"),
];

/// ISO 639-2/B codes and their ISO 639-2/T equivalents.
const BIBLIOGRAPHIC_TO_TERMINOLOGIC: &[(&str, &str)] = &[
    ("fre", "fra"),
    ("ger", "deu"),
    ("chi", "zho"),
    ("cze", "ces"),
    ("dut", "nld"),
    ("gre", "ell"),
    ("rum", "ron"),
];

/// Tags that mark a track as carrying no linguistic content.
const NO_LINGUISTIC_CONTENT: &[&str] = &["zxx", "und", "mis", "mul", "qaa"];

/// Map an ISO 639-1 code to ISO 639-2/T.
pub fn to_iso639_2(code: &str) -> Option<&'static str> {
    let code = code.trim().to_ascii_lowercase();
    ISO639_1_TO_2
        .iter()
        .find(|(two, _)| *two == code)
        .map(|(_, three)| *three)
}

/// Map an ISO 639-2 code (either form) back to ISO 639-1.
pub fn to_iso639_1(code: &str) -> Option<&'static str> {
    let lowered = code.trim().to_ascii_lowercase();
    let code = terminologic(&lowered);
    ISO639_1_TO_2
        .iter()
        .find(|(_, three)| *three == code)
        .map(|(two, _)| *two)
}

/// Whether a container tag means "no language" (music, effects, undefined).
pub fn is_no_linguistic_content(tag: &str) -> bool {
    NO_LINGUISTIC_CONTENT.contains(&tag.trim().to_ascii_lowercase().as_str())
}

/// ISO 639-2 form of a code reported by the language model.
///
/// Unmapped codes pass through unchanged.
pub fn detected_iso639_2(code: &str) -> String {
    match to_iso639_2(code) {
        Some(iso) => iso.to_string(),
        None => {
            warn!(code = %code, "No ISO 639-2 mapping for detected language, passing through");
            code.to_string()
        }
    }
}

/// Normalize a declared container tag to ISO 639-2/T.
///
/// Returns `None` when the track has no usable declared language
/// (missing, empty, or one of the no-linguistic-content codes).
pub fn normalize_declared(tag: &str) -> Option<String> {
    let tag = tag.trim().to_ascii_lowercase();
    // "en-US", "pt_BR"
    let primary = tag.split(['-', '_']).next().unwrap_or_default();

    if primary.is_empty() || is_no_linguistic_content(primary) {
        return None;
    }

    match primary.len() {
        2 => Some(detected_iso639_2(primary)),
        3 => Some(terminologic(primary).to_string()),
        _ => {
            warn!(tag = %tag, "Unrecognized declared language tag, passing through");
            Some(primary.to_string())
        }
    }
}

fn terminologic(code: &str) -> &str {
    BIBLIOGRAPHIC_TO_TERMINOLOGIC
        .iter()
        .find(|(bib, _)| *bib == code)
        .map(|(_, term)| *term)
        .unwrap_or(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_to_three() {
        assert_eq!(to_iso639_2("en"), Some("eng"));
        assert_eq!(to_iso639_2("FR"), Some("fra"));
        assert_eq!(to_iso639_2("xx"), None);
    }

    #[test]
    fn test_three_to_two_accepts_bibliographic() {
        assert_eq!(to_iso639_1("deu"), Some("de"));
        assert_eq!(to_iso639_1("ger"), Some("de"));
        assert_eq!(to_iso639_1("tlh"), None);
    }

    #[test]
    fn test_table_is_bijective() {
        for (two, three) in ISO639_1_TO_2 {
            assert_eq!(to_iso639_1(three), Some(*two));
            assert_eq!(to_iso639_2(two), Some(*three));
        }
    }

    #[test]
    fn test_detected_passthrough() {
        assert_eq!(detected_iso639_2("es"), "spa");
        assert_eq!(detected_iso639_2("haw"), "haw");
    }

    #[test]
    fn test_normalize_declared() {
        assert_eq!(normalize_declared("eng").as_deref(), Some("eng"));
        assert_eq!(normalize_declared("fre").as_deref(), Some("fra"));
        assert_eq!(normalize_declared("es").as_deref(), Some("spa"));
        assert_eq!(normalize_declared("en-US").as_deref(), Some("eng"));
        assert_eq!(normalize_declared("  GER ").as_deref(), Some("deu"));
        assert_eq!(normalize_declared("und"), None);
        assert_eq!(normalize_declared("zxx"), None);
        assert_eq!(normalize_declared(""), None);
    }
}
