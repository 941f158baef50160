//! Filename conventions recognized by the metadata extractor.

use oneshot_core::diagnostics::{DiagnosticKind, Diagnostics};
use oneshot_core::metadata::{Category, Metadata, MetadataExtractor, PatternId, Provenance};

fn extract(name: &str) -> (Metadata, Diagnostics) {
    let mut diags = Diagnostics::new();
    let meta = MetadataExtractor::new().extract(name, &mut diags);
    (meta, diags)
}

fn matched(meta: &Metadata) -> PatternId {
    match meta.provenance {
        Provenance::MatchedPattern(id) => id,
        Provenance::Fallback => panic!("expected a pattern match, got fallback: {:?}", meta),
    }
}

#[test]
fn test_episode_with_title_and_specs() {
    let (meta, diags) =
        extract("Prison Break (2005) - S01E01 - Pilot (1080p BluRay x265 Silence).mkv");

    assert_eq!(meta.category, Category::TvShow);
    assert_eq!(meta.series_name.as_deref(), Some("Prison Break"));
    assert_eq!(meta.year, Some(2005));
    assert_eq!(meta.season_number, Some(1));
    assert_eq!(meta.episode_number, Some(1));
    assert_eq!(meta.episode_title.as_deref(), Some("Pilot"));
    assert_eq!(matched(&meta), PatternId::TvDashTitle);
    assert!(diags.is_empty());
}

#[test]
fn test_scene_style_episode() {
    let (meta, _) = extract("Show.Name.S02E05.1080p.WEB-DL.mkv");

    assert_eq!(meta.category, Category::TvShow);
    assert_eq!(meta.series_name.as_deref(), Some("Show Name"));
    assert_eq!(meta.season_number, Some(2));
    assert_eq!(meta.episode_number, Some(5));
    // no title in the name, so the series name stands in
    assert_eq!(meta.episode_title.as_deref(), Some("Show Name"));
    assert_eq!(matched(&meta), PatternId::TvStandard);
}

#[test]
fn test_episode_without_title() {
    let (meta, _) = extract("Show Name - S01E02.mkv");

    assert_eq!(meta.series_name.as_deref(), Some("Show Name"));
    assert_eq!(meta.season_number, Some(1));
    assert_eq!(meta.episode_number, Some(2));
    assert_eq!(matched(&meta), PatternId::TvStandard);
}

#[test]
fn test_lowercase_marker_and_underscores() {
    let (meta, _) = extract("the_office_s03e07_the_convict.mp4");

    assert_eq!(meta.series_name.as_deref(), Some("the office"));
    assert_eq!(meta.season_number, Some(3));
    assert_eq!(meta.episode_number, Some(7));
    assert_eq!(meta.episode_title.as_deref(), Some("the convict"));
}

#[test]
fn test_cross_format_episode() {
    let (meta, _) = extract("Series 1x02 Title.mkv");

    assert_eq!(meta.series_name.as_deref(), Some("Series"));
    assert_eq!(meta.season_number, Some(1));
    assert_eq!(meta.episode_number, Some(2));
    assert_eq!(meta.episode_title.as_deref(), Some("Title"));
    assert_eq!(matched(&meta), PatternId::TvCrossFormat);
}

#[test]
fn test_daily_show() {
    let (meta, _) = extract("The Daily Show - 2025-11-20 - Guest Name.mkv");

    assert_eq!(meta.category, Category::TvShow);
    assert_eq!(meta.series_name.as_deref(), Some("The Daily Show"));
    assert_eq!(meta.air_date.as_deref(), Some("2025-11-20"));
    assert_eq!(meta.year, Some(2025));
    assert_eq!(meta.episode_title.as_deref(), Some("Guest Name"));
    assert_eq!(matched(&meta), PatternId::TvAirDate);
}

#[test]
fn test_movie_with_parenthesized_year() {
    let (meta, _) = extract("Dune Part Two (2024).mkv");

    assert_eq!(meta.category, Category::Movie);
    assert_eq!(meta.movie_title.as_deref(), Some("Dune Part Two"));
    assert_eq!(meta.year, Some(2024));
    assert_eq!(matched(&meta), PatternId::MovieParenYear);
}

#[test]
fn test_movie_with_dotted_year_keeps_numeric_title() {
    let (meta, _) = extract("Blade.Runner.2049.2017.1080p.mkv");

    assert_eq!(meta.category, Category::Movie);
    assert_eq!(meta.movie_title.as_deref(), Some("Blade Runner 2049"));
    assert_eq!(meta.year, Some(2017));
    assert_eq!(matched(&meta), PatternId::MovieDottedYear);
}

#[test]
fn test_movie_number_is_not_an_episode() {
    let (meta, _) = extract("Movie 300 (2006).mkv");

    assert_eq!(meta.category, Category::Movie);
    assert_eq!(meta.movie_title.as_deref(), Some("Movie 300"));
    assert_eq!(meta.year, Some(2006));
}

#[test]
fn test_movie_edition() {
    let (meta, _) = extract("Alien (1979) {edition-Directors Cut}.mkv");

    assert_eq!(meta.movie_title.as_deref(), Some("Alien"));
    assert_eq!(meta.edition.as_deref(), Some("Directors Cut"));
}

#[test]
fn test_season_marker_beats_year() {
    let (meta, _) = extract("Show.2019.S01E01.mkv");

    assert_eq!(meta.category, Category::TvShow);
    assert_eq!(meta.series_name.as_deref(), Some("Show"));
    assert_eq!(meta.year, Some(2019));
    assert_eq!(meta.season_number, Some(1));
}

#[test]
fn test_three_digit_episode() {
    let (meta, _) = extract("The.Simpsons.305.720p.mkv");

    assert_eq!(meta.series_name.as_deref(), Some("The Simpsons"));
    assert_eq!(meta.season_number, Some(3));
    assert_eq!(meta.episode_number, Some(5));
    assert_eq!(matched(&meta), PatternId::TvThreeDigit);
}

#[test]
fn test_codec_token_is_not_an_episode() {
    let (meta, diags) = extract("Show.x265.HEVC.mkv");

    assert!(meta.is_fallback());
    assert_eq!(meta.movie_title.as_deref(), Some("Show.x265.HEVC"));
    assert_eq!(diags.count(DiagnosticKind::PatternMatchFailure), 1);
}

#[test]
fn test_unmatched_name_falls_back() {
    let (meta, diags) = extract("randomfile.mkv");

    assert_eq!(meta.category, Category::Movie);
    assert_eq!(meta.movie_title.as_deref(), Some("randomfile"));
    assert_eq!(meta.provenance, Provenance::Fallback);
    assert_eq!(diags.len(), 1);
}

#[test]
fn test_override_template() {
    let extractor = MetadataExtractor::new()
        .with_template("<Movie Name> (<Year>) - <Episode Name>.mkv")
        .unwrap();
    let mut diags = Diagnostics::new();
    let meta = extractor.extract("Test Movie (2020) - Extended Scene.mkv", &mut diags);

    assert_eq!(meta.category, Category::Movie);
    assert_eq!(meta.movie_title.as_deref(), Some("Test Movie"));
    assert_eq!(meta.year, Some(2020));
    assert_eq!(meta.provenance, Provenance::MatchedPattern(PatternId::Override));
    assert!(diags.is_empty());
}

#[test]
fn test_override_disagreeing_with_auto_detection_wins() {
    // auto-detection would call this an episode
    let extractor = MetadataExtractor::new()
        .with_template("<Movie Name>.S<season:2 digits>E<episode:2 digits>.mkv")
        .unwrap();
    let mut diags = Diagnostics::new();
    let meta = extractor.extract("Concert.S01E01.mkv", &mut diags);

    assert_eq!(meta.provenance, Provenance::MatchedPattern(PatternId::Override));
    assert_eq!(meta.category, Category::TvShow);
    assert_eq!(meta.series_name.as_deref(), Some("Concert"));
}

#[test]
fn test_forced_media_type() {
    let extractor = MetadataExtractor::new().with_category_override(Some(Category::Movie));
    let mut diags = Diagnostics::new();
    let meta = extractor.extract("Show.Name.S01E01.mkv", &mut diags);

    assert_eq!(meta.category, Category::Movie);
    assert_eq!(meta.movie_title.as_deref(), Some("Show Name"));
    assert_eq!(meta.season_number, None);
}
