//! Built-in filename patterns and the cleanup rules they share.
//!
//! `.`, `_`, space and `-` are interchangeable separators in every pattern.
//! All matching is case-insensitive.

use once_cell::sync::Lazy;
use regex_lite::Regex;

use super::types::{Metadata, PatternId, Provenance};

const SEP: &str = "[ ._-]";

static TV_DASH_TITLE: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)^(?P<series>.+?){SEP}+S(?P<season>\d{{1,2}})E(?P<episode>\d{{2}}){SEP}+(?P<title>.+)$"
    ))
    .ok()
});

static SEASON_EPISODE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?i)(?P<marker>S(?P<season>\d{1,2})E(?P<episode>\d{2}))").ok());

static CROSS_FORMAT: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|[^0-9])(?P<marker>(?P<season>\d{1,2})x(?P<episode>\d{2}))(?:$|[^0-9])")
        .ok()
});

static AIR_DATE: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?:^|[^0-9])(?P<date>(?P<y>\d{{4}}){SEP}(?P<m>\d{{2}}){SEP}(?P<d>\d{{2}}))(?:$|[^0-9])"
    ))
    .ok()
});

static MOVIE_PAREN_YEAR: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)^(?P<title>.+?){SEP}*\((?P<year>\d{{4}})\)(?:{SEP}+(?P<rest>.+))?$"
    ))
    .ok()
});

static MOVIE_DOTTED_YEAR: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)^(?P<title>.+){SEP}(?P<year>\d{{4}})(?:{SEP}+(?P<rest>.+))?$"
    ))
    .ok()
});

static DIGIT_RUN: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"\d+").ok());

static EDITION: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?i)\{edition-(?P<edition>[^}]+)\}").ok());

static BRACKETED: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"\[[^\]]*\]").ok());

static TRAILING_YEAR: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?:\((?P<paren>\d{4})\)|(?:^|[ ._-])(?P<bare>\d{4}))$").ok());

/// Tokens that mark the start of release noise in an episode title.
const QUALITY_BREAK_WORDS: &[&str] = &[
    "480P", "720P", "1080P", "2160P", "4K", "8K", "BLURAY", "BDRIP", "BRRIP", "WEB", "WEBRIP",
    "WEBDL", "HDR", "HDR10", "HDR10PLUS", "DOLBY", "DV", "ATMOS", "DDP5", "TRUEHD", "REMUX", "UHD",
    "IMAX", "AMZN", "HMAX", "MAX", "HULU", "NF", "NETFLIX", "H265", "X265", "H264", "X264", "AV1",
    "HEVC",
];

/// Tries one built-in pattern against a file name without extension.
pub(crate) fn match_auto(id: PatternId, stem: &str) -> Option<Metadata> {
    match id {
        PatternId::TvDashTitle => tv_dash_title(stem),
        PatternId::TvStandard => split_marker(stem, SEASON_EPISODE.as_ref()?, id),
        PatternId::TvCrossFormat => split_marker(stem, CROSS_FORMAT.as_ref()?, id),
        PatternId::TvAirDate => tv_air_date(stem),
        PatternId::MovieParenYear => movie_with_year(stem, MOVIE_PAREN_YEAR.as_ref()?, id),
        PatternId::MovieDottedYear => movie_with_year(stem, MOVIE_DOTTED_YEAR.as_ref()?, id),
        PatternId::TvThreeDigit => tv_three_digit(stem),
        PatternId::Override => None,
    }
}

fn tv_dash_title(stem: &str) -> Option<Metadata> {
    let caps = TV_DASH_TITLE.as_ref()?.captures(stem)?;
    let title = clean_episode_title(caps.name("title")?.as_str());
    if title.is_empty() {
        return None;
    }
    let mut meta = build_episode(
        caps.name("series")?.as_str(),
        PatternId::TvDashTitle,
    )?;
    meta.season_number = parse_number(caps.name("season"));
    meta.episode_number = parse_number(caps.name("episode"));
    meta.episode_title = Some(title);
    Some(meta)
}

/// Splits the name around the `marker` group: series before, title after.
fn split_marker(stem: &str, re: &Regex, id: PatternId) -> Option<Metadata> {
    let caps = re.captures(stem)?;
    let marker = caps.name("marker")?;

    let mut meta = build_episode(&stem[..marker.start()], id)?;
    meta.season_number = parse_number(caps.name("season"));
    meta.episode_number = parse_number(caps.name("episode"));
    fill_episode_title(&mut meta, &stem[marker.end()..]);
    Some(meta)
}

fn tv_air_date(stem: &str) -> Option<Metadata> {
    let caps = AIR_DATE.as_ref()?.captures(stem)?;
    let date = caps.name("date")?;
    let year: u16 = caps.name("y")?.as_str().parse().ok()?;
    let month: u8 = caps.name("m")?.as_str().parse().ok()?;
    let day: u8 = caps.name("d")?.as_str().parse().ok()?;
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) || !is_plausible_year(year) {
        return None;
    }

    let mut meta = build_episode(&stem[..date.start()], PatternId::TvAirDate)?;
    meta.air_date = Some(format!("{:04}-{:02}-{:02}", year, month, day));
    meta.year = Some(year);
    fill_episode_title(&mut meta, &stem[date.end()..]);
    Some(meta)
}

fn movie_with_year(stem: &str, re: &Regex, id: PatternId) -> Option<Metadata> {
    let caps = re.captures(stem)?;
    let year: u16 = caps.name("year")?.as_str().parse().ok()?;
    if !is_plausible_year(year) {
        return None;
    }
    let title = clean_component(caps.name("title")?.as_str());
    if title.is_empty() {
        return None;
    }

    let mut meta = Metadata::movie(title, Some(year), Provenance::MatchedPattern(id));
    meta.edition = caps.name("rest").and_then(|rest| edition(rest.as_str()));
    Some(meta)
}

/// `Series.305.1080p` means season 3, episode 5. Runs that look like codecs
/// (`x265`), resolutions (`720p`) or years are skipped.
fn tv_three_digit(stem: &str) -> Option<Metadata> {
    let bytes = stem.as_bytes();
    for run in DIGIT_RUN.as_ref()?.find_iter(stem) {
        if run.len() != 3 || run.as_str().starts_with('0') {
            continue;
        }
        let before = run
            .start()
            .checked_sub(1)
            .map(|i| bytes[i].to_ascii_uppercase());
        let after = bytes.get(run.end()).map(|b| b.to_ascii_uppercase());
        if matches!(before, Some(b'X') | Some(b'H')) || after == Some(b'P') {
            continue;
        }

        let digits = run.as_str();
        let Some(mut meta) = build_episode(&stem[..run.start()], PatternId::TvThreeDigit) else {
            continue;
        };
        meta.season_number = digits[..1].parse().ok();
        meta.episode_number = digits[1..].parse().ok();
        fill_episode_title(&mut meta, &stem[run.end()..]);
        return Some(meta);
    }
    None
}

/// Episode metadata with the series name (and any trailing year) taken from
/// `raw_series`. `None` if no name is left after cleanup.
fn build_episode(raw_series: &str, id: PatternId) -> Option<Metadata> {
    let (series, year) = split_trailing_year(raw_series);
    let series = clean_component(series);
    if series.is_empty() {
        return None;
    }
    let mut meta = Metadata::episode(series, Provenance::MatchedPattern(id));
    meta.year = year;
    Some(meta)
}

/// Sets the episode title from the text after the marker, falling back to
/// the series name.
fn fill_episode_title(meta: &mut Metadata, suffix: &str) {
    let title = clean_episode_title(suffix);
    meta.episode_title = if title.is_empty() {
        meta.series_name.clone()
    } else {
        Some(title)
    };
}

/// Removes bracketed tags, turns separators into spaces and trims.
pub(crate) fn clean_component(value: &str) -> String {
    let without_tags = match BRACKETED.as_ref() {
        Some(re) => re.replace_all(value, " ").into_owned(),
        None => value.to_string(),
    };
    without_tags
        .replace(['_', '.'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c: char| matches!(c, ' ' | '-' | '_' | '.'))
        .trim()
        .to_string()
}

/// Keeps the words of an episode title up to the first release token.
pub(crate) fn clean_episode_title(value: &str) -> String {
    let value = value.replace(['(', ')'], " ");
    let value = match BRACKETED.as_ref() {
        Some(re) => re.replace_all(&value, " ").into_owned(),
        None => value,
    };

    let mut kept = Vec::new();
    for token in value.split([' ', '.', '_', '-']).filter(|t| !t.is_empty()) {
        let upper = token.to_ascii_uppercase();
        if QUALITY_BREAK_WORDS.contains(&upper.as_str()) || is_resolution(&upper) {
            break;
        }
        kept.push(token);
    }
    kept.join(" ")
}

/// Splits `Name (2005)` or `Name 2005` into name and year.
pub(crate) fn split_trailing_year(value: &str) -> (&str, Option<u16>) {
    let trimmed = value.trim_end_matches([' ', '.', '_', '-']);
    let Some(caps) = TRAILING_YEAR.as_ref().and_then(|re| re.captures(trimmed)) else {
        return (value, None);
    };
    let Some(year) = caps
        .name("paren")
        .or_else(|| caps.name("bare"))
        .and_then(|m| m.as_str().parse::<u16>().ok())
        .filter(|y| is_plausible_year(*y))
    else {
        return (value, None);
    };
    let start = caps.get(0).map(|m| m.start()).unwrap_or(trimmed.len());
    let name = trimmed[..start].trim_end_matches([' ', '.', '_', '-']);
    if name.is_empty() {
        return (value, None);
    }
    (name, Some(year))
}

fn edition(rest: &str) -> Option<String> {
    EDITION
        .as_ref()?
        .captures(rest)?
        .name("edition")
        .map(|m| m.as_str().trim().to_string())
        .filter(|e| !e.is_empty())
}

fn is_resolution(upper: &str) -> bool {
    upper
        .strip_suffix('P')
        .map(|digits| (3..=4).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(false)
}

pub(crate) fn is_plausible_year(year: u16) -> bool {
    (1900..=2099).contains(&year)
}

fn parse_number(m: Option<regex_lite::Match<'_>>) -> Option<u32> {
    m?.as_str().parse().ok()
}
