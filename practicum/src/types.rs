//! Core types for the practicum record.
//!
//! These types model one pharmacy student's practicum: settings, the daily
//! journal, AI analysis artifacts, growth triggers, insights, and weekly
//! review rollups. The serialized shape matches the persisted root document
//! consumed by the dashboard.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Stable student identifier derived from the student's name.
///
/// Generated ids are always `>= 100_000`; the range below that is reserved
/// for manually assigned legacy ids.
pub type StudentId = u32;

/// Journal identifier, derived from the creation timestamp (ms since epoch).
pub type JournalId = i64;

/// 1-based practicum week index.
pub type WeekNumber = u32;

/// One student's full practicum record.
///
/// The student owns all nested collections; nothing is shared across
/// students. Students are created on registration and never deleted by the
/// engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub name: String,
    pub settings: PracticumSettings,
    /// Journals in insertion order. At most one per calendar date.
    #[serde(default)]
    pub journals: Vec<Journal>,
    #[serde(default)]
    pub growth_triggers: Vec<GrowthTrigger>,
    #[serde(default)]
    pub insights: Vec<Insight>,
    /// Weekly rollups keyed by week number. Replaced wholesale on
    /// regeneration.
    #[serde(default)]
    pub weekly_reviews: BTreeMap<WeekNumber, WeeklyReview>,
}

/// Practicum period and personal goals for one student.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PracticumSettings {
    /// First day of the practicum. Week computation treats a missing start
    /// date as "everything is week 1".
    #[serde(rename = "startDate")]
    pub start_date: Option<NaiveDate>,
    #[serde(rename = "endDate")]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub goal: String,
    #[serde(default)]
    pub interests: String,
}

impl PracticumSettings {
    /// Whether both practicum dates are set.
    ///
    /// `start_date <= end_date` is the caller's responsibility; the engine
    /// only requires presence.
    pub fn has_period(&self) -> bool {
        self.start_date.is_some() && self.end_date.is_some()
    }
}

/// A single day's journal entry.
///
/// `week_number` is computed once at creation from the entry date and the
/// student's start date. It is deliberately not recomputed if the start date
/// is edited later; existing entries keep their original week.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Journal {
    pub id: JournalId,
    pub date: NaiveDate,
    pub week_number: WeekNumber,
    /// What the student did and achieved. Accepts the legacy `content` key
    /// on input.
    #[serde(default, alias = "content")]
    pub practical_content: String,
    /// What the student could not achieve; reflections.
    #[serde(default)]
    pub unachieved_point: String,
    /// The instructor's observation memo for the day.
    #[serde(default)]
    pub instructor_notes: String,
    /// Instructor feedback written after the mentoring conversation.
    #[serde(default)]
    pub feedback: String,
    /// The mentoring seed the instructor selected for continuity. At most
    /// one per journal; saving again overwrites.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_seed: Option<String>,
    /// Raw analysis result as returned by the AI collaborator, persisted so
    /// the briefing (or SOS alert) survives a reload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_analysis: Option<AnalysisResult>,
    /// Human-confirmed Step0 judgments. Captured atomically; replaces any
    /// prior set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step0_judgments: Option<Vec<Judgment>>,
}

/// Text fields captured by the daily input form.
#[derive(Debug, Clone, Default)]
pub struct DailyEntry {
    pub practical_content: String,
    pub unachieved_point: String,
    pub instructor_notes: String,
}

impl DailyEntry {
    /// True when neither journal text field has content.
    pub fn is_empty(&self) -> bool {
        self.practical_content.is_empty() && self.unachieved_point.is_empty()
    }
}

/// A recorded milestone event, tied to a practicum week.
///
/// The week link is a weak, human-authored association carried as an
/// explicit field rather than re-derived from the description text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrowthTrigger {
    pub description: String,
    #[serde(default)]
    pub week_number: WeekNumber,
}

/// A curated observation extracted from a journal.
///
/// Associated to its week transitively through the journal's `week_number`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Insight {
    pub journal_id: JournalId,
    #[serde(rename = "type")]
    pub kind: String,
    pub snippet: String,
    pub reason: String,
}

/// Result of one daily AI analysis.
///
/// The wire format is shape-discriminated: an error payload, an SOS alert,
/// or a full briefing report. Deserialization tries the variants in that
/// order, so the marker fields (`error`, `sos_alert`) are required booleans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnalysisResult {
    Error(ErrorReport),
    Sos(SosAlert),
    Report(BriefingReport),
}

impl AnalysisResult {
    /// Mentoring seed candidates offered by this analysis.
    ///
    /// Empty for error and SOS results: an alert must never surface seeds.
    pub fn offered_seeds(&self) -> &[String] {
        match self {
            AnalysisResult::Report(report) => &report.mentoring_seeds,
            _ => &[],
        }
    }

    /// Step0 judgment drafts offered by this analysis.
    ///
    /// Empty for error and SOS results.
    pub fn drafts(&self) -> &[JudgmentDraft] {
        match self {
            AnalysisResult::Report(report) => &report.step0_drafts,
            _ => &[],
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, AnalysisResult::Error(_))
    }

    pub fn is_sos(&self) -> bool {
        matches!(self, AnalysisResult::Sos(_))
    }
}

/// Error payload from the AI collaborator (or from the call itself failing).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub error: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl ErrorReport {
    pub fn new(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self {
            error: true,
            message: message.into(),
            suggestion: Some(suggestion.into()),
        }
    }
}

/// Crisis alert emitted instead of a report when the analysis detects acute
/// distress. Persisted like a report, but never contributes seeds or drafts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SosAlert {
    pub sos_alert: bool,
    #[serde(default)]
    pub alert_reason: String,
    #[serde(default)]
    pub suggested_action: String,
}

/// Full daily briefing produced by a successful analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BriefingReport {
    pub translation_for_instructor: InstructorTranslation,
    pub mentoring_support: MentoringSupport,
    /// Candidate discussion topics to carry into the next day. Required in
    /// a well-formed report.
    pub mentoring_seeds: Vec<String>,
    #[serde(default)]
    pub step0_drafts: Vec<JudgmentDraft>,
}

/// The "five lenses" translation of the student's writing for the
/// instructor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstructorTranslation {
    #[serde(default)]
    pub professional_insight: String,
    #[serde(default)]
    pub growth_evidence: String,
    #[serde(default)]
    pub attention_points: String,
}

/// Concrete conversation support for today's mentoring session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MentoringSupport {
    #[serde(default)]
    pub praise_points: String,
    #[serde(default)]
    pub suggested_questions: Vec<String>,
}

/// AI-drafted Step0 judgment, pending human confirmation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgmentDraft {
    /// The extracted evidence sentence. Identifies the draft during
    /// confirmation.
    pub evidence: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<DepthLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concept_source: Option<ConceptSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Human-confirmed Step0 judgment, used for downstream research coding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Judgment {
    pub evidence: String,
    pub level: DepthLevel,
    pub concept_source: ConceptSource,
}

/// Conceptualization depth of a student observation.
///
/// Serialized as the bare integers 1-3 used by the research coding scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum DepthLevel {
    /// Surface description of facts.
    Fact = 1,
    /// Contextual understanding; the student assigns meaning.
    Context = 2,
    /// Functional generalization; a principle about the profession.
    Generalization = 3,
}

/// Error for a depth level outside the 1-3 coding range.
#[derive(Debug, thiserror::Error)]
#[error("depth level must be 1-3, got {0}")]
pub struct DepthLevelError(u8);

impl TryFrom<u8> for DepthLevel {
    type Error = DepthLevelError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(DepthLevel::Fact),
            2 => Ok(DepthLevel::Context),
            3 => Ok(DepthLevel::Generalization),
            other => Err(DepthLevelError(other)),
        }
    }
}

impl From<DepthLevel> for u8 {
    fn from(level: DepthLevel) -> Self {
        level as u8
    }
}

/// Authorship source of a student observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConceptSource {
    /// The student's own framing and experience.
    #[serde(rename = "SELF")]
    Original,
    /// A restatement of what the instructor said.
    #[serde(rename = "ECHO")]
    Echo,
    /// Instructor input blended with the student's own interpretation.
    #[serde(rename = "MIXED")]
    Mixed,
}

impl ConceptSource {
    /// The wire name, as it appears in prompts and payloads.
    pub fn code(&self) -> &'static str {
        match self {
            ConceptSource::Original => "SELF",
            ConceptSource::Echo => "ECHO",
            ConceptSource::Mixed => "MIXED",
        }
    }
}

/// Aggregated weekly rollup: narrative review plus internal scores.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeeklyReview {
    pub weekly_review: WeeklyNarrative,
    pub internal_scores: InternalScores,
}

/// Narrative portion of the weekly review, shown to the instructor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeeklyNarrative {
    #[serde(default)]
    pub growth_story: String,
    #[serde(default)]
    pub key_achievements: String,
    #[serde(default)]
    pub habitual_patterns: String,
    #[serde(default)]
    pub next_week_goals: String,
}

/// Instructor-only numeric scores for the week.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InternalScores {
    pub lenses: LensScores,
    /// Weighted average of confirmed Step0 depth levels.
    #[serde(default)]
    pub conceptualization_avg: f32,
    /// SELF / (SELF + ECHO + MIXED), in `[0, 1]`.
    #[serde(default)]
    pub self_reliance_ratio: f32,
    #[serde(default)]
    pub instructor_notes_summary: String,
}

/// Scores for the five translation lenses, each in `[0, 5]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LensScores {
    #[serde(default)]
    pub insight_on_lifestyle: f32,
    #[serde(default)]
    pub non_verbal_clues: f32,
    #[serde(default)]
    pub continuous_relationship: f32,
    #[serde(default)]
    pub community_resources: f32,
    #[serde(default)]
    pub professional_proactivity: f32,
}

/// Outcome of a weekly rollup request: either an error payload or a review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WeeklyOutcome {
    Error(ErrorReport),
    Review(WeeklyReview),
}

/// Shared program configuration: the pharmacy slogan and focus keywords.
///
/// Passed explicitly into prompt assembly; there is no process-wide
/// settings variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramConfig {
    pub slogan: String,
    pub keywords: String,
}

impl Default for ProgramConfig {
    fn default() -> Self {
        Self {
            slogan: "Caring for the neighborhood, one patient at a time".to_string(),
            keywords: "community care, home-visit medicine, attentive counseling".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_result_discriminates_error() {
        let json = r#"{"error": true, "message": "boom", "suggestion": "retry"}"#;
        let result: AnalysisResult = serde_json::from_str(json).unwrap();
        assert!(result.is_error());
        assert!(result.offered_seeds().is_empty());
    }

    #[test]
    fn analysis_result_discriminates_sos() {
        let json = r#"{"sos_alert": true, "alert_reason": "strong helplessness", "suggested_action": "talk first"}"#;
        let result: AnalysisResult = serde_json::from_str(json).unwrap();
        assert!(result.is_sos());
        assert!(result.offered_seeds().is_empty());
        assert!(result.drafts().is_empty());
    }

    #[test]
    fn analysis_result_discriminates_report() {
        let json = r#"{
            "translation_for_instructor": {
                "professional_insight": "a",
                "growth_evidence": "b",
                "attention_points": "c"
            },
            "mentoring_support": {
                "praise_points": "d",
                "suggested_questions": ["q1", "q2"]
            },
            "mentoring_seeds": ["s1", "s2"],
            "step0_drafts": [
                {"evidence": "e1", "level": 2, "concept_source": "MIXED", "notes": "n"}
            ]
        }"#;
        let result: AnalysisResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.offered_seeds(), ["s1", "s2"]);
        assert_eq!(result.drafts()[0].level, Some(DepthLevel::Context));
        assert_eq!(result.drafts()[0].concept_source, Some(ConceptSource::Mixed));
    }

    #[test]
    fn report_without_seeds_is_rejected() {
        let json = r#"{
            "translation_for_instructor": {},
            "mentoring_support": {}
        }"#;
        assert!(serde_json::from_str::<AnalysisResult>(json).is_err());
    }

    #[test]
    fn depth_level_round_trips_as_integer() {
        let level: DepthLevel = serde_json::from_str("3").unwrap();
        assert_eq!(level, DepthLevel::Generalization);
        assert_eq!(serde_json::to_string(&level).unwrap(), "3");

        let err = serde_json::from_str::<DepthLevel>("4").unwrap_err();
        assert!(err.to_string().contains("depth level must be 1-3"));

        let err = DepthLevel::try_from(0).unwrap_err();
        assert_eq!(err.to_string(), "depth level must be 1-3, got 0");
    }

    #[test]
    fn journal_accepts_legacy_content_key() {
        let json = r#"{
            "id": 1748000000000,
            "date": "2025-05-19",
            "week_number": 1,
            "content": "dispensing desk duty"
        }"#;
        let journal: Journal = serde_json::from_str(json).unwrap();
        assert_eq!(journal.practical_content, "dispensing desk duty");
    }

    #[test]
    fn weekly_outcome_discriminates() {
        let err: WeeklyOutcome =
            serde_json::from_str(r#"{"error": true, "message": "quota"}"#).unwrap();
        assert!(matches!(err, WeeklyOutcome::Error(_)));

        let review: WeeklyOutcome = serde_json::from_str(
            r#"{"weekly_review": {"growth_story": "g"}, "internal_scores": {"lenses": {}}}"#,
        )
        .unwrap();
        assert!(matches!(review, WeeklyOutcome::Review(_)));
    }
}
