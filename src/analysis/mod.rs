//! Content analysis against the external scoring engine.
//!
//! The engine itself is opaque: it receives a [`Paper`] and answers with raw
//! assessments for the keyword (SEO) and readability analyses. This module owns the
//! session around it, the conversion of its answers into [`AnalysisResult`]s and
//! their grouping for display.

pub mod classify;
pub mod remote;
pub mod session;
pub mod width;
pub mod worker;

use crate::translations::Translations;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use classify::{GroupedResults, ScoreSummary, group_by_rating, parse_results};
pub use session::{AnalysisEngine, AnalysisSession, EngineFactory};

/// Message shown in place of results when the engine fails
pub const ENGINE_ERROR_TEXT: &str = "An error occurred while analyzing the page!";

/// Identifier of the synthetic result standing in for an engine failure
pub const ENGINE_ERROR_ID: &str = "analysisError";

/// Coarse classification of an assessment score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RatingBucket {
    Bad,
    Ok,
    Good,
    Feedback,
    Error,
}

impl RatingBucket {
    pub fn as_str(self) -> &'static str {
        match self {
            RatingBucket::Bad => "bad",
            RatingBucket::Ok => "ok",
            RatingBucket::Good => "good",
            RatingBucket::Feedback => "feedback",
            RatingBucket::Error => "error",
        }
    }
}

impl fmt::Display for RatingBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A passage of the content an assessment points at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextMarker {
    /// The passage as it appears in the content
    #[serde(default)]
    pub original: String,
    /// The passage with the engine's highlight markup applied
    #[serde(default)]
    pub marked: String,
}

/// One assessment as the engine reports it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawAssessment {
    #[serde(rename = "_identifier", alias = "identifier")]
    pub identifier: String,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub text: String,
    #[serde(rename = "_hasMarks", alias = "hasMarks", default)]
    pub has_marks: bool,
    #[serde(default)]
    pub marks: Vec<TextMarker>,
}

/// Overall score and assessments of one analysis as the engine reports them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawResultSet {
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub results: Vec<RawAssessment>,
}

/// The engine's answer to one [`Paper`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineResponse {
    pub seo: RawResultSet,
    pub readability: RawResultSet,
}

/// An assessment ready for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub identifier: String,
    pub score: Option<f64>,
    pub rating: RatingBucket,
    /// HTML
    pub text: String,
    pub has_marks: bool,
    pub marks: Vec<TextMarker>,
}

impl AnalysisResult {
    /// Synthetic result reported when the engine fails
    pub fn engine_error() -> Self {
        Self {
            identifier: ENGINE_ERROR_ID.to_string(),
            score: None,
            rating: RatingBucket::Error,
            text: ENGINE_ERROR_TEXT.to_string(),
            has_marks: false,
            marks: Vec::new(),
        }
    }
}

/// Overall score and results of one analysis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    pub score: Option<f64>,
    pub results: Vec<AnalysisResult>,
}

impl ResultSet {
    fn from_raw(raw: &RawResultSet) -> Self {
        Self {
            score: raw.score.filter(|s| s.is_finite()),
            results: parse_results(&raw.results),
        }
    }

    fn engine_error() -> Self {
        Self {
            score: None,
            results: vec![AnalysisResult::engine_error()],
        }
    }

    pub fn is_engine_error(&self) -> bool {
        self.results.iter().any(|r| r.rating == RatingBucket::Error)
    }
}

/// Both result sets of one analysis run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    pub seo: ResultSet,
    pub readability: ResultSet,
}

impl AnalysisOutcome {
    pub fn from_response(response: &EngineResponse) -> Self {
        Self {
            seo: ResultSet::from_raw(&response.seo),
            readability: ResultSet::from_raw(&response.readability),
        }
    }

    /// Degraded outcome carrying the synthetic error result in both sets
    pub fn engine_error() -> Self {
        Self {
            seo: ResultSet::engine_error(),
            readability: ResultSet::engine_error(),
        }
    }
}

/// Engine configuration applied before every analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Cornerstone content gets the stricter assessment variant
    pub use_heavy_analysis_variant: bool,
    pub locale: String,
    pub content_analysis_enabled: bool,
    pub keyword_analysis_enabled: bool,
    pub log_level: String,
    pub translations: Translations,
}

impl EngineConfig {
    pub fn new(
        use_heavy_analysis_variant: bool,
        locale: &str,
        log_level: &str,
        translations: Translations,
    ) -> Self {
        Self {
            use_heavy_analysis_variant,
            locale: locale.to_string(),
            content_analysis_enabled: true,
            keyword_analysis_enabled: true,
            log_level: log_level.to_string(),
            translations,
        }
    }
}

/// Content package submitted for one scoring run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paper {
    pub raw_content: String,
    pub focus_keyword: String,
    pub description: String,
    pub title: String,
    pub title_render_width: f64,
    /// Path of the public URL
    pub url: String,
    pub locale: String,
}
