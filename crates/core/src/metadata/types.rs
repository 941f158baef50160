//! Metadata extracted from file names.

use serde::{Deserialize, Serialize};

/// Whether a file is a movie or an episode of a show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Movie,
    TvShow,
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "movie" => Ok(Self::Movie),
            "tv_show" | "tv" | "show" => Ok(Self::TvShow),
            other => Err(format!("unknown media type '{}'", other)),
        }
    }
}

/// The naming conventions understood by the extractor, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternId {
    /// User-supplied template, tried before everything else.
    Override,
    /// `Series - S01E02 - Title`
    TvDashTitle,
    /// `Series.S01E02...`
    TvStandard,
    /// `Series.1x02...`
    TvCrossFormat,
    /// `Show - 2025-11-20 - Title`
    TvAirDate,
    /// `Title (2024)`
    MovieParenYear,
    /// `Title.2024.1080p...`
    MovieDottedYear,
    /// `Series.305...` meaning S3E05.
    TvThreeDigit,
}

impl PatternId {
    /// Built-in patterns, most specific first.
    pub const AUTO: [PatternId; 7] = [
        PatternId::TvDashTitle,
        PatternId::TvStandard,
        PatternId::TvCrossFormat,
        PatternId::TvAirDate,
        PatternId::MovieParenYear,
        PatternId::MovieDottedYear,
        PatternId::TvThreeDigit,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Override => "override",
            Self::TvDashTitle => "tv_dash_title",
            Self::TvStandard => "tv_standard",
            Self::TvCrossFormat => "tv_cross_format",
            Self::TvAirDate => "tv_air_date",
            Self::MovieParenYear => "movie_paren_year",
            Self::MovieDottedYear => "movie_dotted_year",
            Self::TvThreeDigit => "tv_three_digit",
        }
    }
}

/// Where the metadata came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "source", content = "pattern")]
pub enum Provenance {
    MatchedPattern(PatternId),
    /// Nothing matched; the file name was used as a movie title.
    Fallback,
}

/// Structured episode or movie metadata for one input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub category: Category,
    pub series_name: Option<String>,
    pub episode_title: Option<String>,
    pub movie_title: Option<String>,
    pub year: Option<u16>,
    pub season_number: Option<u32>,
    pub episode_number: Option<u32>,
    /// `YYYY-MM-DD` for daily shows.
    pub air_date: Option<String>,
    /// Edition name from a `{edition-...}` block.
    pub edition: Option<String>,
    pub provenance: Provenance,
}

impl Metadata {
    pub fn movie(title: impl Into<String>, year: Option<u16>, provenance: Provenance) -> Self {
        Self {
            category: Category::Movie,
            series_name: None,
            episode_title: None,
            movie_title: Some(title.into()),
            year,
            season_number: None,
            episode_number: None,
            air_date: None,
            edition: None,
            provenance,
        }
    }

    pub fn episode(series: impl Into<String>, provenance: Provenance) -> Self {
        Self {
            category: Category::TvShow,
            series_name: Some(series.into()),
            episode_title: None,
            movie_title: None,
            year: None,
            season_number: None,
            episode_number: None,
            air_date: None,
            edition: None,
            provenance,
        }
    }

    /// Fallback metadata for an unrecognized file name.
    pub fn fallback(stem: &str) -> Self {
        Self::movie(stem, None, Provenance::Fallback)
    }

    pub fn is_fallback(&self) -> bool {
        self.provenance == Provenance::Fallback
    }

    /// `S01E02` when both numbers are known.
    pub fn episode_id(&self) -> Option<String> {
        match (self.season_number, self.episode_number) {
            (Some(s), Some(e)) => Some(format!("S{:02}E{:02}", s, e)),
            _ => None,
        }
    }

    /// Value for the `title` tag.
    pub fn display_title(&self) -> Option<&str> {
        match self.category {
            Category::Movie => self.movie_title.as_deref(),
            Category::TvShow => self
                .episode_title
                .as_deref()
                .or(self.series_name.as_deref()),
        }
    }

    /// Converts to the forced category, moving the name across.
    pub fn into_category(mut self, category: Category) -> Self {
        if self.category == category {
            return self;
        }
        match category {
            Category::Movie => {
                self.movie_title = self.series_name.take();
                self.episode_title = None;
                self.season_number = None;
                self.episode_number = None;
                self.air_date = None;
            }
            Category::TvShow => {
                let name = self.movie_title.take();
                self.episode_title = name.clone();
                self.series_name = name;
                self.edition = None;
            }
        }
        self.category = category;
        self
    }

    /// Container tags as ffmpeg `-metadata` arguments.
    pub fn to_ffmpeg_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        let mut push = |key: &str, value: &str| {
            args.push("-metadata".to_string());
            args.push(format!("{}={}", key, value));
        };

        if let Some(title) = self.display_title() {
            push("title", title);
        }

        match self.category {
            Category::TvShow => {
                if let Some(ref show) = self.series_name {
                    push("show", show);
                }
                if let Some(season) = self.season_number {
                    push("season_number", &season.to_string());
                }
                if let Some(episode) = self.episode_number {
                    push("episode_sort", &episode.to_string());
                }
                if let Some(id) = self.episode_id() {
                    push("episode_id", &id);
                }
                if let Some(ref date) = self.air_date {
                    push("date", date);
                } else if let Some(year) = self.year {
                    push("date", &year.to_string());
                }
            }
            Category::Movie => {
                if let Some(year) = self.year {
                    push("date", &year.to_string());
                }
            }
        }

        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn episode() -> Metadata {
        let mut meta = Metadata::episode(
            "Prison Break",
            Provenance::MatchedPattern(PatternId::TvDashTitle),
        );
        meta.episode_title = Some("Pilot".to_string());
        meta.year = Some(2005);
        meta.season_number = Some(1);
        meta.episode_number = Some(1);
        meta
    }

    #[test]
    fn test_episode_args() {
        let args = episode().to_ffmpeg_args();
        assert_eq!(
            args,
            vec![
                "-metadata",
                "title=Pilot",
                "-metadata",
                "show=Prison Break",
                "-metadata",
                "season_number=1",
                "-metadata",
                "episode_sort=1",
                "-metadata",
                "episode_id=S01E01",
                "-metadata",
                "date=2005",
            ]
        );
    }

    #[test]
    fn test_movie_args() {
        let meta = Metadata::movie(
            "Dune Part Two",
            Some(2024),
            Provenance::MatchedPattern(PatternId::MovieParenYear),
        );
        assert_eq!(
            meta.to_ffmpeg_args(),
            vec!["-metadata", "title=Dune Part Two", "-metadata", "date=2024"]
        );
    }

    #[test]
    fn test_fallback() {
        let meta = Metadata::fallback("randomfile");
        assert!(meta.is_fallback());
        assert_eq!(meta.category, Category::Movie);
        assert_eq!(meta.movie_title.as_deref(), Some("randomfile"));
    }

    #[test]
    fn test_into_category() {
        let movie = episode().into_category(Category::Movie);
        assert_eq!(movie.movie_title.as_deref(), Some("Prison Break"));
        assert_eq!(movie.season_number, None);
        assert_eq!(movie.year, Some(2005));

        let show = Metadata::fallback("clip").into_category(Category::TvShow);
        assert_eq!(show.series_name.as_deref(), Some("clip"));
        assert_eq!(show.episode_title.as_deref(), Some("clip"));
        assert!(show.is_fallback());
    }

    #[test]
    fn test_category_from_str() {
        assert_eq!("movie".parse::<Category>(), Ok(Category::Movie));
        assert_eq!("show".parse::<Category>(), Ok(Category::TvShow));
        assert_eq!("TV_SHOW".parse::<Category>(), Ok(Category::TvShow));
        assert!("music".parse::<Category>().is_err());
    }

    #[test]
    fn test_provenance_serialization() {
        let json =
            serde_json::to_string(&Provenance::MatchedPattern(PatternId::TvStandard)).unwrap();
        assert_eq!(json, r#"{"source":"matched_pattern","pattern":"tv_standard"}"#);
        let json = serde_json::to_string(&Provenance::Fallback).unwrap();
        assert_eq!(json, r#"{"source":"fallback"}"#);
    }
}
