//! MentorService - entry point for AI analysis calls.
//!
//! Selects a provider backend, assembles prompts, applies the rate-limit
//! fallback, and parses the provider's JSON answer into the shape-tagged
//! result unions. External failures never escape as errors: they are
//! folded into the `Error` variant so the caller always has something to
//! render and persist decisions against.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use practicum::prompt::PromptAssembler;
use practicum::types::{AnalysisResult, ErrorReport, ProgramConfig, WeeklyOutcome};

use crate::backend::traits::{strip_json_fences, BackendError, ChatBackend, ChatRequest};
use crate::request::{AnalysisRequest, WeeklyRequest};

const ANALYSIS_TEMPERATURE: f32 = 0.7;

/// Entry point for mentor AI invocations.
pub struct MentorService {
    backends: HashMap<String, Arc<dyn ChatBackend>>,
    default_provider: String,
    fallback_provider: Option<String>,
    program: ProgramConfig,
}

impl MentorService {
    pub fn new(program: ProgramConfig) -> Self {
        Self {
            backends: HashMap::new(),
            default_provider: "gemini".to_string(),
            fallback_provider: None,
            program,
        }
    }

    /// Register a backend under a provider name ("gemini", "openai", ...).
    pub fn with_backend(mut self, provider: impl Into<String>, backend: Arc<dyn ChatBackend>) -> Self {
        self.backends.insert(provider.into(), backend);
        self
    }

    /// Set the provider used when a request does not name one.
    pub fn with_default_provider(mut self, provider: impl Into<String>) -> Self {
        self.default_provider = provider.into();
        self
    }

    /// Set the provider tried when the primary is rate limited.
    pub fn with_fallback_provider(mut self, provider: impl Into<String>) -> Self {
        self.fallback_provider = Some(provider.into());
        self
    }

    /// Replace the program context included in analysis prompts.
    pub fn with_program(mut self, program: ProgramConfig) -> Self {
        self.program = program;
        self
    }

    pub fn program(&self) -> &ProgramConfig {
        &self.program
    }

    /// Analyze one day's journal.
    ///
    /// Infallible by design: backend and parse failures come back as the
    /// `Error` variant, mirroring the wire contract.
    pub async fn analyze(&self, request: &AnalysisRequest) -> AnalysisResult {
        let request_id = uuid::Uuid::new_v4();
        debug!(%request_id, week = request.week, provider = %request.provider, "analysis requested");

        let system = PromptAssembler::daily_system_prompt(&self.program);
        let user = PromptAssembler::build_daily_prompt(
            request.week,
            &request.log_achieved,
            &request.log_unachieved,
            &request.previous_triggers,
            &request.instructor_notes,
        );

        let content = match self.call_provider(&request.provider, system, user).await {
            Ok(content) => content,
            Err(err) => return AnalysisResult::Error(analysis_error_report(&err)),
        };

        match serde_json::from_str::<AnalysisResult>(strip_json_fences(&content)) {
            Ok(result) => result,
            Err(err) => AnalysisResult::Error(ErrorReport::new(
                format!("JSON parse error: {}", err),
                "The AI response was malformed. Please try again.",
            )),
        }
    }

    /// Produce the weekly rollup for one week's journals.
    pub async fn review_week(&self, request: &WeeklyRequest) -> WeeklyOutcome {
        let request_id = uuid::Uuid::new_v4();
        debug!(
            %request_id,
            week = request.week_number,
            journals = request.journals.len(),
            "weekly review requested"
        );

        let system = PromptAssembler::weekly_system_prompt().to_string();
        let user = PromptAssembler::build_weekly_prompt(request.week_number, &request.journals);

        let content = match self.call_provider(&request.provider, system, user).await {
            Ok(content) => content,
            Err(err) => return WeeklyOutcome::Error(weekly_error_report(&err)),
        };

        match serde_json::from_str::<WeeklyOutcome>(strip_json_fences(&content)) {
            Ok(outcome) => outcome,
            Err(err) => WeeklyOutcome::Error(ErrorReport::new(
                format!("Weekly review parse error: {}", err),
                "The AI response was malformed. Please try again.",
            )),
        }
    }

    /// Lightweight connectivity probe for a provider, used by the UI's
    /// connection-test control.
    pub async fn ping(&self, provider: &str) -> AnalysisResult {
        let request = AnalysisRequest::new(1, "connection test", "connection test")
            .with_provider(provider);
        self.analyze(&request).await
    }

    async fn call_provider(
        &self,
        provider: &str,
        system: String,
        user: String,
    ) -> Result<String, BackendError> {
        let provider = if provider.is_empty() {
            self.default_provider.as_str()
        } else {
            provider
        };

        let backend = self.backend(provider)?;
        let request = ChatRequest::user(user)
            .with_system(system)
            .with_temperature(ANALYSIS_TEMPERATURE)
            .with_json_output();

        match backend.complete(request.clone()).await {
            Ok(response) => Ok(response.content),
            Err(BackendError::RateLimited { .. }) => {
                let Some(fallback) = self.fallback_provider.as_deref().filter(|f| *f != provider)
                else {
                    return Err(BackendError::RateLimited {
                        retry_after_ms: None,
                    });
                };
                warn!(provider, fallback, "provider rate limited, falling back");
                let backend = self.backend(fallback)?;
                backend.complete(request).await.map(|r| r.content)
            }
            Err(err) => Err(err),
        }
    }

    fn backend(&self, provider: &str) -> Result<&Arc<dyn ChatBackend>, BackendError> {
        self.backends
            .get(provider)
            .ok_or_else(|| BackendError::Unavailable(format!("no backend for provider '{provider}'")))
    }
}

fn analysis_error_report(err: &BackendError) -> ErrorReport {
    match err {
        BackendError::RateLimited { .. } => ErrorReport::new(
            "API quota exhausted (429)",
            "Wait a moment, or switch to another provider.",
        ),
        BackendError::NetworkError(m) => ErrorReport::new(
            format!("Connection error: {}", m),
            "Check your internet connection.",
        ),
        BackendError::ParseError(m) => ErrorReport::new(
            format!("JSON parse error: {}", m),
            "The AI response was malformed. Please try again.",
        ),
        BackendError::Unavailable(m) | BackendError::RequestFailed(m) => ErrorReport::new(
            format!("API error: {}", m),
            "Check the API key configuration and account balance.",
        ),
    }
}

fn weekly_error_report(err: &BackendError) -> ErrorReport {
    match err {
        BackendError::RateLimited { .. } => ErrorReport::new(
            "API quota exhausted (429)",
            "Wait a while, or try another provider for the weekly review.",
        ),
        other => ErrorReport::new(
            format!("Weekly review error: {}", other),
            "With a lot of journal data the provider limit may have been reached.",
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;
    use practicum::types::DepthLevel;

    const REPORT_JSON: &str = r#"{
        "translation_for_instructor": {
            "professional_insight": "insight",
            "growth_evidence": "evidence",
            "attention_points": "points"
        },
        "mentoring_support": {
            "praise_points": "praise",
            "suggested_questions": ["q1"]
        },
        "mentoring_seeds": ["seed-a", "seed-b"],
        "step0_drafts": [
            {"evidence": "e1", "level": 1, "concept_source": "SELF"}
        ]
    }"#;

    fn service_with(backend: MockBackend) -> MentorService {
        MentorService::new(ProgramConfig::default())
            .with_backend("mock", Arc::new(backend))
            .with_default_provider("mock")
    }

    #[tokio::test]
    async fn parses_a_full_report() {
        let service = service_with(MockBackend::default().with_response(REPORT_JSON));
        let result = service.analyze(&AnalysisRequest::new(1, "a", "b")).await;

        assert_eq!(result.offered_seeds(), ["seed-a", "seed-b"]);
        assert_eq!(result.drafts()[0].level, Some(DepthLevel::Fact));
    }

    #[tokio::test]
    async fn parses_a_fenced_report() {
        let fenced = format!("```json\n{}\n```", REPORT_JSON);
        let service = service_with(MockBackend::default().with_response(fenced));
        let result = service.analyze(&AnalysisRequest::new(1, "a", "b")).await;

        assert!(!result.is_error());
        assert_eq!(result.offered_seeds().len(), 2);
    }

    #[tokio::test]
    async fn sos_alert_passes_through() {
        let service = service_with(MockBackend::default().with_response(
            r#"{"sos_alert": true, "alert_reason": "burnout signs", "suggested_action": "talk today"}"#,
        ));
        let result = service.analyze(&AnalysisRequest::new(4, "a", "b")).await;

        assert!(result.is_sos());
        assert!(result.offered_seeds().is_empty());
    }

    #[tokio::test]
    async fn malformed_answer_becomes_an_error_report() {
        let service = service_with(MockBackend::default().with_response("not json at all"));
        let result = service.analyze(&AnalysisRequest::new(1, "a", "b")).await;
        assert!(result.is_error());
    }

    #[tokio::test]
    async fn report_missing_required_keys_becomes_an_error_report() {
        let service = service_with(
            MockBackend::default()
                .with_response(r#"{"translation_for_instructor": {}, "mentoring_support": {}}"#),
        );
        let result = service.analyze(&AnalysisRequest::new(1, "a", "b")).await;
        assert!(result.is_error());
    }

    #[tokio::test]
    async fn unknown_provider_becomes_an_error_report() {
        let service = service_with(MockBackend::default());
        let result = service
            .analyze(&AnalysisRequest::new(1, "a", "b").with_provider("nope"))
            .await;
        assert!(result.is_error());
    }

    #[tokio::test]
    async fn rate_limited_primary_falls_back() {
        let primary = Arc::new(MockBackend::new("primary").with_rate_limited(true));
        let fallback = Arc::new(MockBackend::new("fallback").with_response(REPORT_JSON));

        let service = MentorService::new(ProgramConfig::default())
            .with_backend("gemini", primary.clone())
            .with_backend("groq", fallback.clone())
            .with_default_provider("gemini")
            .with_fallback_provider("groq");

        let result = service.analyze(&AnalysisRequest::new(2, "a", "b")).await;

        assert!(!result.is_error());
        assert_eq!(primary.call_count(), 1);
        assert_eq!(fallback.call_count(), 1);
    }

    #[tokio::test]
    async fn rate_limited_without_fallback_is_an_error_report() {
        let service = service_with(MockBackend::default().with_rate_limited(true));
        let result = service.analyze(&AnalysisRequest::new(2, "a", "b")).await;
        match result {
            AnalysisResult::Error(report) => assert!(report.message.contains("429")),
            other => panic!("expected error report, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn weekly_review_parses_and_errors() {
        let review_json = r#"{
            "weekly_review": {
                "growth_story": "story",
                "key_achievements": "aha",
                "habitual_patterns": "patterns",
                "next_week_goals": "goals"
            },
            "internal_scores": {
                "lenses": {"insight_on_lifestyle": 3.0},
                "conceptualization_avg": 1.8,
                "self_reliance_ratio": 0.4,
                "instructor_notes_summary": "summary"
            }
        }"#;
        let service = service_with(MockBackend::default().with_response(review_json));
        let outcome = service
            .review_week(&WeeklyRequest {
                week_number: 2,
                journals: vec![],
                provider: String::new(),
            })
            .await;
        assert!(matches!(outcome, WeeklyOutcome::Review(_)));

        let service = service_with(MockBackend::default().with_response("garbage"));
        let outcome = service
            .review_week(&WeeklyRequest {
                week_number: 2,
                journals: vec![],
                provider: String::new(),
            })
            .await;
        assert!(matches!(outcome, WeeklyOutcome::Error(_)));
    }

    #[test]
    fn with_program_replaces_the_prompt_context() {
        let service = MentorService::new(ProgramConfig::default()).with_program(ProgramConfig {
            slogan: "new slogan".to_string(),
            keywords: "new keywords".to_string(),
        });
        assert_eq!(service.program().slogan, "new slogan");
    }

    #[tokio::test]
    async fn ping_uses_the_named_provider() {
        let backend = Arc::new(MockBackend::new("m").with_response(REPORT_JSON));
        let service = MentorService::new(ProgramConfig::default())
            .with_backend("openai", backend.clone());

        let result = service.ping("openai").await;
        assert!(!result.is_error());
        assert_eq!(backend.call_count(), 1);
    }
}
