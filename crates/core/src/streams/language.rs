//! Language tag normalization to ISO 639-2/T three-letter codes.

/// Code used when a stream has no usable language tag.
pub const UNDETERMINED: &str = "und";

/// Bibliographic codes and their terminological equivalents.
const BIBLIOGRAPHIC: &[(&str, &str)] = &[
    ("alb", "sqi"),
    ("arm", "hye"),
    ("baq", "eus"),
    ("bur", "mya"),
    ("chi", "zho"),
    ("cze", "ces"),
    ("dut", "nld"),
    ("fre", "fra"),
    ("geo", "kat"),
    ("ger", "deu"),
    ("gre", "ell"),
    ("ice", "isl"),
    ("mac", "mkd"),
    ("may", "msa"),
    ("per", "fas"),
    ("rum", "ron"),
    ("slo", "slk"),
    ("wel", "cym"),
];

/// ISO 639-1 to ISO 639-2/T.
const TWO_LETTER: &[(&str, &str)] = &[
    ("ar", "ara"),
    ("bg", "bul"),
    ("ca", "cat"),
    ("cs", "ces"),
    ("cy", "cym"),
    ("da", "dan"),
    ("de", "deu"),
    ("el", "ell"),
    ("en", "eng"),
    ("es", "spa"),
    ("et", "est"),
    ("eu", "eus"),
    ("fa", "fas"),
    ("fi", "fin"),
    ("fr", "fra"),
    ("ga", "gle"),
    ("gl", "glg"),
    ("he", "heb"),
    ("hi", "hin"),
    ("hr", "hrv"),
    ("hu", "hun"),
    ("hy", "hye"),
    ("id", "ind"),
    ("is", "isl"),
    ("it", "ita"),
    ("ja", "jpn"),
    ("ka", "kat"),
    ("ko", "kor"),
    ("lt", "lit"),
    ("lv", "lav"),
    ("mk", "mkd"),
    ("ms", "msa"),
    ("nb", "nob"),
    ("nl", "nld"),
    ("nn", "nno"),
    ("no", "nor"),
    ("pl", "pol"),
    ("pt", "por"),
    ("ro", "ron"),
    ("ru", "rus"),
    ("sk", "slk"),
    ("sl", "slv"),
    ("sq", "sqi"),
    ("sr", "srp"),
    ("sv", "swe"),
    ("ta", "tam"),
    ("th", "tha"),
    ("tr", "tur"),
    ("uk", "ukr"),
    ("vi", "vie"),
    ("zh", "zho"),
];

/// Normalizes a language tag to a three-letter code.
///
/// Accepts ISO 639-1, both ISO 639-2 variants and IETF tags such as `en-US`.
/// Unknown three-letter codes are passed through lowercased.
pub fn normalize_language_tag(tag: &str) -> Option<String> {
    let primary = tag
        .trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();

    if !primary.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }

    match primary.len() {
        2 => lookup(TWO_LETTER, &primary).map(String::from),
        3 => Some(
            lookup(BIBLIOGRAPHIC, &primary)
                .map(String::from)
                .unwrap_or(primary),
        ),
        _ => None,
    }
}

/// Normalized code for an optional tag, `und` when missing or unknown.
pub fn language_or_undetermined(tag: Option<&str>) -> String {
    tag.and_then(normalize_language_tag)
        .unwrap_or_else(|| UNDETERMINED.to_string())
}

/// ISO 639-1 code for a three-letter code, when one exists.
pub fn to_two_letter(code: &str) -> Option<&'static str> {
    let code = normalize_language_tag(code)?;
    TWO_LETTER
        .iter()
        .find(|(_, three)| *three == code)
        .map(|(two, _)| *two)
}

fn lookup(table: &'static [(&'static str, &'static str)], key: &str) -> Option<&'static str> {
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bibliographic_codes() {
        assert_eq!(normalize_language_tag("ger").as_deref(), Some("deu"));
        assert_eq!(normalize_language_tag("fre").as_deref(), Some("fra"));
        assert_eq!(normalize_language_tag("CHI").as_deref(), Some("zho"));
    }

    #[test]
    fn test_two_letter_codes() {
        assert_eq!(normalize_language_tag("en").as_deref(), Some("eng"));
        assert_eq!(normalize_language_tag("ja").as_deref(), Some("jpn"));
        assert_eq!(normalize_language_tag("pt-BR").as_deref(), Some("por"));
        assert_eq!(normalize_language_tag("xx"), None);
    }

    #[test]
    fn test_three_letter_passthrough() {
        assert_eq!(normalize_language_tag("eng").as_deref(), Some("eng"));
        assert_eq!(normalize_language_tag(" Spa ").as_deref(), Some("spa"));
        assert_eq!(normalize_language_tag("tlh").as_deref(), Some("tlh"));
    }

    #[test]
    fn test_invalid_tags() {
        assert_eq!(normalize_language_tag(""), None);
        assert_eq!(normalize_language_tag("english"), None);
        assert_eq!(normalize_language_tag("e1g"), None);
    }

    #[test]
    fn test_language_or_undetermined() {
        assert_eq!(language_or_undetermined(Some("en")), "eng");
        assert_eq!(language_or_undetermined(Some("???")), "und");
        assert_eq!(language_or_undetermined(None), "und");
    }

    #[test]
    fn test_to_two_letter() {
        assert_eq!(to_two_letter("deu"), Some("de"));
        assert_eq!(to_two_letter("ger"), Some("de"));
        assert_eq!(to_two_letter("und"), None);
    }
}
