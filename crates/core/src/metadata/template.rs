//! User-supplied filename templates.
//!
//! A template such as
//! `<Series Name> (<Year>) - S<season:2 digits>E<episode:2 digits> - <Episode Name>.mkv`
//! is compiled to a regex that must match the whole file name. Text outside
//! tokens is literal, except that `.`, `_`, space and `-` match each other.

use regex_lite::Regex;
use thiserror::Error;

use super::patterns::{clean_component, is_plausible_year};
use super::types::{Category, Metadata, PatternId, Provenance};

/// Errors from compiling a template.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unknown token '{0}' in filename pattern")]
    UnknownToken(String),

    #[error("unterminated token in filename pattern near '{0}'")]
    Unterminated(String),

    #[error("filename pattern needs a <Series Name> or <Movie Name> token")]
    MissingName,

    #[error("filename pattern does not compile: {0}")]
    InvalidRegex(String),
}

const TOKENS: &[(&str, &str)] = &[
    ("<Series Name>", r"(?P<series>.+?)"),
    ("<Movie Name>", r"(?P<movie>.+?)"),
    ("<Episode Name>", r"(?P<title>.+?)"),
    ("<Year>", r"(?P<year>\d{4})"),
    ("<season:2 digits>", r"(?P<season>\d{2})"),
    ("<season:1-2 digits>", r"(?P<season>\d{1,2})"),
    ("<episode:2 digits>", r"(?P<episode>\d{2})"),
    ("<episode:1-2 digits>", r"(?P<episode>\d{1,2})"),
    ("<Air Date>", r"(?P<air_date>\d{4}[ ._-]\d{2}[ ._-]\d{2})"),
    ("<video specs>", r"(?P<specs>.+?)"),
];

/// A compiled override template.
#[derive(Debug, Clone)]
pub struct FilenameTemplate {
    source: String,
    regex: Regex,
}

impl FilenameTemplate {
    pub fn compile(template: &str) -> Result<Self, TemplateError> {
        let mut pattern = String::from("(?i)^");
        let mut has_name = false;
        let mut rest = template;

        while let Some(c) = rest.chars().next() {
            if c == '<' {
                let end = rest
                    .find('>')
                    .ok_or_else(|| TemplateError::Unterminated(rest.to_string()))?;
                let token = &rest[..=end];
                let (_, fragment) = TOKENS
                    .iter()
                    .find(|(name, _)| *name == token)
                    .ok_or_else(|| TemplateError::UnknownToken(token.to_string()))?;
                has_name |= matches!(token, "<Series Name>" | "<Movie Name>");
                pattern.push_str(fragment);
                rest = &rest[end + 1..];
            } else {
                if matches!(c, '.' | '_' | ' ' | '-') {
                    pattern.push_str("[ ._-]");
                } else {
                    pattern.push_str(&regex_lite::escape(c.encode_utf8(&mut [0; 4])));
                }
                rest = &rest[c.len_utf8()..];
            }
        }
        pattern.push('$');

        if !has_name {
            return Err(TemplateError::MissingName);
        }

        let regex = Regex::new(&pattern).map_err(|e| TemplateError::InvalidRegex(e.to_string()))?;
        Ok(Self {
            source: template.to_string(),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Matches a full file name (with extension). `None` when the template
    /// does not match or no name could be resolved.
    pub fn apply(&self, file_name: &str) -> Option<Metadata> {
        let caps = self.regex.captures(file_name)?;
        let group = |name: &str| caps.name(name).map(|m| m.as_str());
        let provenance = Provenance::MatchedPattern(PatternId::Override);

        let air_date = group("air_date").map(normalize_air_date);
        let year = group("year")
            .or_else(|| group("air_date").map(|d| &d[..4]))
            .and_then(|y| y.parse::<u16>().ok())
            .filter(|y| is_plausible_year(*y));
        let season = group("season").and_then(|s| s.parse::<u32>().ok());
        let episode = group("episode").and_then(|e| e.parse::<u32>().ok());
        let title = group("title").map(clean_component).filter(|t| !t.is_empty());

        let is_episode = episode.is_some()
            || air_date.is_some()
            || (title.is_some() && group("movie").is_none());

        let mut meta = if is_episode {
            let series = clean_component(group("series").or(group("movie"))?);
            if series.is_empty() {
                return None;
            }
            let mut meta = Metadata::episode(series.clone(), provenance);
            meta.season_number = season;
            meta.episode_number = episode;
            meta.air_date = air_date;
            meta.episode_title = title.or(Some(series));
            meta
        } else {
            let name = clean_component(group("movie").or(group("series"))?);
            if name.is_empty() {
                return None;
            }
            Metadata::movie(name, None, provenance)
        };
        meta.year = year;

        debug_assert!(meta.category == Category::Movie || meta.series_name.is_some());
        Some(meta)
    }
}

fn normalize_air_date(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_ascii_digit() { c } else { '-' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULT_TEMPLATE: &str =
        "<Series Name> (<Year>) - S<season:2 digits>E<episode:2 digits> - <Episode Name> (<video specs>).mkv";

    #[test]
    fn test_default_template_matches() {
        let template = FilenameTemplate::compile(DEFAULT_TEMPLATE).unwrap();
        let meta = template
            .apply("Prison Break (2005) - S01E01 - Pilot (1080p BluRay x265 Silence).mkv")
            .unwrap();
        assert_eq!(meta.category, Category::TvShow);
        assert_eq!(meta.series_name.as_deref(), Some("Prison Break"));
        assert_eq!(meta.episode_title.as_deref(), Some("Pilot"));
        assert_eq!(meta.year, Some(2005));
        assert_eq!(meta.season_number, Some(1));
        assert_eq!(meta.episode_number, Some(1));
    }

    #[test]
    fn test_separators_interchangeable() {
        let template = FilenameTemplate::compile(DEFAULT_TEMPLATE).unwrap();
        assert!(template
            .apply("Prison_Break_(2005)_-_S01E01_-_Pilot_(1080p).mkv")
            .is_some());
    }

    #[test]
    fn test_movie_template() {
        let template = FilenameTemplate::compile("<Movie Name> (<Year>) - <Episode Name>.mkv").unwrap();
        let meta = template
            .apply("Test Movie (2020) - Director Commentary.mkv")
            .unwrap();
        assert_eq!(meta.category, Category::Movie);
        assert_eq!(meta.movie_title.as_deref(), Some("Test Movie"));
        assert_eq!(meta.year, Some(2020));
    }

    #[test]
    fn test_case_insensitive() {
        let template = FilenameTemplate::compile("<Series Name> S<season:2 digits>E<episode:2 digits>.MKV").unwrap();
        let meta = template.apply("show s02e03.mkv").unwrap();
        assert_eq!(meta.season_number, Some(2));
        assert_eq!(meta.episode_number, Some(3));
    }

    #[test]
    fn test_air_date_template() {
        let template = FilenameTemplate::compile("<Series Name> <Air Date>.mkv").unwrap();
        let meta = template.apply("Late Show 2024.03.05.mkv").unwrap();
        assert_eq!(meta.air_date.as_deref(), Some("2024-03-05"));
        assert_eq!(meta.year, Some(2024));
        assert_eq!(meta.category, Category::TvShow);
    }

    #[test]
    fn test_no_match() {
        let template = FilenameTemplate::compile(DEFAULT_TEMPLATE).unwrap();
        assert!(template.apply("randomfile.mkv").is_none());
    }

    #[test]
    fn test_compile_errors() {
        assert_eq!(
            FilenameTemplate::compile("<Series Name> <Bogus>").unwrap_err(),
            TemplateError::UnknownToken("<Bogus>".to_string())
        );
        assert!(matches!(
            FilenameTemplate::compile("<Series Name"),
            Err(TemplateError::Unterminated(_))
        ));
        assert_eq!(
            FilenameTemplate::compile("<Year>.mkv").unwrap_err(),
            TemplateError::MissingName
        );
    }

    #[test]
    fn test_literal_regex_characters_escaped() {
        let template = FilenameTemplate::compile("[Fansub] <Series Name> + <episode:2 digits>.mkv").unwrap();
        let meta = template.apply("[Fansub] Show + 07.mkv").unwrap();
        assert_eq!(meta.series_name.as_deref(), Some("Show"));
        assert_eq!(meta.episode_number, Some(7));
        assert_eq!(meta.season_number, None);
        assert_eq!(meta.category, Category::TvShow);
    }
}
