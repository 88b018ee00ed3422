use crate::analysis::{AnalysisResult, RatingBucket, RawAssessment, ResultSet};
use serde::{Deserialize, Serialize};

impl RatingBucket {
    /// Bucket for an assessment score on the engine's 0–10 scale
    pub fn from_score(score: Option<f64>) -> Self {
        match score.filter(|s| s.is_finite()) {
            None => RatingBucket::Feedback,
            Some(s) if s < 3.0 => RatingBucket::Bad,
            Some(s) if s < 7.0 => RatingBucket::Ok,
            Some(_) => RatingBucket::Good,
        }
    }

    /// Bucket for an overall score on the 0–100 scale, `None` when it is not numeric
    pub fn from_overall_score(score: Option<f64>) -> Option<Self> {
        score
            .filter(|s| s.is_finite())
            .map(|s| RatingBucket::from_score(Some(s / 10.0)))
    }
}

/// Converts raw assessments into display results, dropping those without text
pub fn parse_results(raw: &[RawAssessment]) -> Vec<AnalysisResult> {
    raw.iter()
        .filter(|assessment| !assessment.text.is_empty())
        .map(|assessment| AnalysisResult {
            identifier: assessment.identifier.clone(),
            score: assessment.score,
            rating: RatingBucket::from_score(assessment.score),
            text: assessment.text.clone(),
            has_marks: assessment.has_marks,
            marks: assessment.marks.clone(),
        })
        .collect()
}

/// Results grouped by rating, each group in input order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupedResults {
    pub bad: Vec<AnalysisResult>,
    pub ok: Vec<AnalysisResult>,
    pub good: Vec<AnalysisResult>,
    pub feedback: Vec<AnalysisResult>,
    pub error: Vec<AnalysisResult>,
}

impl GroupedResults {
    pub fn get(&self, bucket: RatingBucket) -> &[AnalysisResult] {
        match bucket {
            RatingBucket::Bad => &self.bad,
            RatingBucket::Ok => &self.ok,
            RatingBucket::Good => &self.good,
            RatingBucket::Feedback => &self.feedback,
            RatingBucket::Error => &self.error,
        }
    }

    fn bucket_mut(&mut self, bucket: RatingBucket) -> &mut Vec<AnalysisResult> {
        match bucket {
            RatingBucket::Bad => &mut self.bad,
            RatingBucket::Ok => &mut self.ok,
            RatingBucket::Good => &mut self.good,
            RatingBucket::Feedback => &mut self.feedback,
            RatingBucket::Error => &mut self.error,
        }
    }

    pub fn len(&self) -> usize {
        self.bad.len() + self.ok.len() + self.good.len() + self.feedback.len() + self.error.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Groups results by rating, leaving out the identifiers in `exclude`
pub fn group_by_rating(results: &[AnalysisResult], exclude: &[String]) -> GroupedResults {
    let mut grouped = GroupedResults::default();
    for result in results {
        if exclude.iter().any(|id| *id == result.identifier) {
            continue;
        }
        grouped.bucket_mut(result.rating).push(result.clone());
    }
    grouped
}

/// What the panel shows for one analysis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub score: Option<f64>,
    /// `None` while there is no numeric overall score
    pub rating: Option<RatingBucket>,
    pub results: GroupedResults,
}

impl ScoreSummary {
    pub fn from_result_set(set: &ResultSet, exclude: &[String]) -> Self {
        Self {
            score: set.score,
            rating: RatingBucket::from_overall_score(set.score),
            results: group_by_rating(&set.results, exclude),
        }
    }
}
