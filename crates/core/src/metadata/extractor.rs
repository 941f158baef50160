//! Metadata extraction from file names.

use std::path::Path;

use tracing::debug;

use super::patterns::match_auto;
use super::template::{FilenameTemplate, TemplateError};
use super::types::{Category, Metadata, PatternId};
use crate::diagnostics::{DiagnosticKind, Diagnostics};

/// Matches file names against the override template (if any) and then the
/// built-in patterns in [`PatternId::AUTO`] order.
#[derive(Debug, Clone, Default)]
pub struct MetadataExtractor {
    template: Option<FilenameTemplate>,
    category_override: Option<Category>,
}

impl MetadataExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a user template tried before the built-in patterns.
    pub fn with_template(mut self, template: &str) -> Result<Self, TemplateError> {
        self.template = Some(FilenameTemplate::compile(template)?);
        Ok(self)
    }

    /// Forces every result into `category`.
    pub fn with_category_override(mut self, category: Option<Category>) -> Self {
        self.category_override = category;
        self
    }

    pub fn template(&self) -> Option<&FilenameTemplate> {
        self.template.as_ref()
    }

    /// Extracts metadata for `file_name`, which may be a bare name or a path.
    ///
    /// Never fails: an unmatched name becomes a movie titled after the file
    /// stem and a single `PatternMatchFailure` diagnostic is recorded.
    pub fn extract(&self, file_name: &str, diagnostics: &mut Diagnostics) -> Metadata {
        let name = Path::new(file_name)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(file_name);
        let stem = strip_extension(name);

        let meta = self
            .match_template(name, stem)
            .or_else(|| {
                PatternId::AUTO.iter().find_map(|id| {
                    let meta = match_auto(*id, stem)?;
                    debug!(file = %name, pattern = id.name(), "Matched filename pattern");
                    Some(meta)
                })
            })
            .unwrap_or_else(|| {
                diagnostics.emit(
                    DiagnosticKind::PatternMatchFailure,
                    format!("no filename pattern matched '{}', using it as a movie title", name),
                );
                Metadata::fallback(stem)
            });

        match self.category_override {
            Some(category) => meta.into_category(category),
            None => meta,
        }
    }

    fn match_template(&self, name: &str, stem: &str) -> Option<Metadata> {
        let template = self.template.as_ref()?;
        let meta = template.apply(name).or_else(|| template.apply(stem));
        match meta {
            Some(_) => debug!(file = %name, "Matched override pattern"),
            None => debug!(
                file = %name,
                pattern = template.as_str(),
                "Override pattern did not match, trying built-in patterns"
            ),
        }
        meta
    }
}

/// Drops a trailing extension. Only short alphanumeric suffixes count, so
/// `Show.S01E02` and `Movie.2024` keep their last component.
pub fn strip_extension(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && !ext.is_empty()
                && ext.len() <= 4
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
                && !ext.chars().all(|c| c.is_ascii_digit())
                && !is_episode_marker(ext) =>
        {
            stem
        }
        _ => name,
    }
}

fn is_episode_marker(ext: &str) -> bool {
    let upper = ext.to_ascii_uppercase();
    upper
        .strip_prefix('S')
        .and_then(|rest| rest.split_once('E'))
        .map(|(s, e)| {
            !s.is_empty()
                && !e.is_empty()
                && s.chars().all(|c| c.is_ascii_digit())
                && e.chars().all(|c| c.is_ascii_digit())
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::Provenance;

    #[test]
    fn test_strip_extension() {
        assert_eq!(strip_extension("movie.mkv"), "movie");
        assert_eq!(strip_extension("Movie.2024"), "Movie.2024");
        assert_eq!(strip_extension("Show.S1E2"), "Show.S1E2");
        assert_eq!(strip_extension("noext"), "noext");
        assert_eq!(strip_extension(".hidden"), ".hidden");
        assert_eq!(strip_extension("clip.m2ts"), "clip");
    }

    #[test]
    fn test_fallback_emits_one_diagnostic() {
        let mut diags = Diagnostics::new();
        let meta = MetadataExtractor::new().extract("randomfile.mkv", &mut diags);
        assert_eq!(meta.movie_title.as_deref(), Some("randomfile"));
        assert_eq!(meta.provenance, Provenance::Fallback);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags.count(DiagnosticKind::PatternMatchFailure), 1);
    }

    #[test]
    fn test_path_input_uses_file_name() {
        let mut diags = Diagnostics::new();
        let meta = MetadataExtractor::new().extract("/media/in/Dune (2021).mkv", &mut diags);
        assert_eq!(meta.movie_title.as_deref(), Some("Dune"));
        assert_eq!(meta.year, Some(2021));
        assert!(diags.is_empty());
    }

    #[test]
    fn test_template_falls_through_when_unmatched() {
        let extractor = MetadataExtractor::new()
            .with_template("<Movie Name> [<Year>].mkv")
            .unwrap();
        let mut diags = Diagnostics::new();
        let meta = extractor.extract("Show.S02E03.720p.mkv", &mut diags);
        assert_eq!(
            meta.provenance,
            Provenance::MatchedPattern(PatternId::TvStandard)
        );
        assert!(diags.is_empty());
    }

    #[test]
    fn test_template_wins_when_matched() {
        let extractor = MetadataExtractor::new()
            .with_template("<Movie Name> (<Year>) - <Episode Name>.mkv")
            .unwrap();
        let mut diags = Diagnostics::new();
        let meta = extractor.extract("Test Movie (2020) - Director Commentary.mkv", &mut diags);
        assert_eq!(meta.provenance, Provenance::MatchedPattern(PatternId::Override));
        assert_eq!(meta.category, Category::Movie);
        assert_eq!(meta.movie_title.as_deref(), Some("Test Movie"));
    }

    #[test]
    fn test_category_override() {
        let extractor = MetadataExtractor::new().with_category_override(Some(Category::TvShow));
        let mut diags = Diagnostics::new();
        let meta = extractor.extract("Home Video (2019).mp4", &mut diags);
        assert_eq!(meta.category, Category::TvShow);
        assert_eq!(meta.series_name.as_deref(), Some("Home Video"));
    }
}
