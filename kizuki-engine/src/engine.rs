//! The journal and mentoring-continuity engine.
//!
//! `Engine` owns the roster, the persistence collaborator, and the mentor
//! service, and drives the daily analysis pipeline: validate the entry,
//! upsert the journal, persist, carry the previous seed forward, call the
//! AI collaborator, and merge the result back into the journal.
//!
//! Writes for one student are serialized behind a per-student lock so two
//! concurrent saves for the same date cannot interleave; different
//! students proceed in parallel.

use std::sync::Arc;

use chrono::NaiveDate;
use dashmap::DashMap;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use mentor_agent::{AnalysisRequest, MentorService, WeeklyRequest};
use practicum::latest_selected_seed;
use practicum::roster::Roster;
use practicum::types::{
    AnalysisResult, DailyEntry, Judgment, PracticumSettings, StudentId, WeekNumber, WeeklyOutcome,
    WeeklyReview,
};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::store::StateStore;

/// Outcome of one daily analysis run.
#[derive(Debug, Clone)]
pub struct AnalysisRun {
    /// Practicum week the journal landed in.
    pub week_number: WeekNumber,
    /// The seed carried into the prompt, empty if none was available.
    pub previous_seed: String,
    /// The analysis payload: briefing, SOS alert, or error.
    pub result: AnalysisResult,
    /// False when the merged result could not be written to the store.
    /// The in-memory journal still holds it.
    pub persisted: bool,
}

/// Outcome of one weekly review run.
#[derive(Debug, Clone)]
pub struct WeeklyRun {
    pub week_number: WeekNumber,
    pub review: WeeklyReview,
    /// False when the stored rollup could not be written to the store.
    pub persisted: bool,
}

pub struct Engine {
    roster: Arc<RwLock<Roster>>,
    store: Arc<dyn StateStore>,
    mentor: Arc<MentorService>,
    config: EngineConfig,
    /// Per-student write locks. Entries are created on first use and kept
    /// for the lifetime of the engine.
    student_locks: DashMap<StudentId, Arc<Mutex<()>>>,
}

impl Engine {
    /// Build an engine around a store and a mentor service.
    ///
    /// The config is the single source of truth for the program context
    /// and the provider selection: it is applied to the mentor service
    /// here, overriding whatever the service was constructed with.
    pub fn new(store: Arc<dyn StateStore>, mentor: MentorService, config: EngineConfig) -> Self {
        let mut mentor = mentor
            .with_program(config.program.clone())
            .with_default_provider(config.provider.clone());
        if let Some(fallback) = &config.fallback_provider {
            mentor = mentor.with_fallback_provider(fallback.clone());
        }

        Self {
            roster: Arc::new(RwLock::new(Roster::default())),
            store,
            mentor: Arc::new(mentor),
            config,
            student_locks: DashMap::new(),
        }
    }

    /// Replace the in-memory roster with the stored state.
    pub async fn load(&self) -> Result<(), EngineError> {
        let roster = self.store.load().await?;
        info!(students = roster.students.len(), "roster loaded");
        *self.roster.write().await = roster;
        Ok(())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Snapshot of the current roster, for read-side consumers.
    pub async fn snapshot(&self) -> Roster {
        self.roster.read().await.clone()
    }

    /// Register a student, or update the settings of an existing one with
    /// the same name.
    pub async fn register_student(
        &self,
        name: &str,
        settings: PracticumSettings,
    ) -> Result<StudentId, EngineError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(EngineError::MissingField("student name"));
        }
        if !settings.has_period() {
            return Err(EngineError::MissingField("practicum period"));
        }

        let id = {
            let mut roster = self.roster.write().await;
            roster.register(name, settings)
        };
        self.save_snapshot().await?;
        Ok(id)
    }

    /// Run the daily analysis pipeline for one student and date.
    ///
    /// The journal is upserted and persisted before the AI call, so the
    /// saved text is exactly what the analysis saw. A store failure at
    /// that point aborts the run; the upsert stays in memory and the call
    /// is never made. An `Error` result is returned to the caller but
    /// never merged into the journal, so a previously stored briefing
    /// survives a failed re-run.
    pub async fn run_analysis(
        &self,
        student_id: StudentId,
        date: NaiveDate,
        entry: DailyEntry,
        provider: Option<&str>,
    ) -> Result<AnalysisRun, EngineError> {
        if entry.is_empty() {
            return Err(EngineError::MissingField("journal text"));
        }

        let lock = self.student_lock(student_id);
        let _guard = lock.lock().await;

        let log_achieved = entry.practical_content.clone();
        let log_unachieved = entry.unachieved_point.clone();
        let instructor_notes = entry.instructor_notes.clone();

        let (week, previous_seed) = {
            let mut roster = self.roster.write().await;
            let student = roster
                .student_mut(student_id)
                .ok_or(EngineError::StudentNotFound(student_id))?;
            let week = student.upsert_journal(date, entry).week_number;
            let seed = latest_selected_seed(student, date);
            (week, seed)
        };

        // The text must be durable before the analysis runs against it.
        self.save_snapshot().await?;

        let request = AnalysisRequest::new(week, log_achieved, log_unachieved)
            .with_previous_triggers(previous_seed.clone())
            .with_instructor_notes(instructor_notes)
            .with_provider(provider.unwrap_or(&self.config.provider));
        let result = self.mentor.analyze(&request).await;

        let mut persisted = true;
        if result.is_error() {
            debug!(student = student_id, %date, "analysis failed, journal left untouched");
        } else {
            {
                let mut roster = self.roster.write().await;
                let student = roster
                    .student_mut(student_id)
                    .ok_or(EngineError::StudentNotFound(student_id))?;
                if let Some(journal) = student.journal_for_mut(date) {
                    journal.ai_analysis = Some(result.clone());
                }
            }
            if let Err(err) = self.save_snapshot().await {
                warn!(student = student_id, %date, %err, "analysis merged but not persisted");
                persisted = false;
            }
        }

        Ok(AnalysisRun {
            week_number: week,
            previous_seed,
            result,
            persisted,
        })
    }

    /// Record the seed the instructor picked from the day's briefing.
    ///
    /// The seed must be one the analysis actually offered; SOS and error
    /// results offer none.
    pub async fn confirm_seed(
        &self,
        student_id: StudentId,
        date: NaiveDate,
        seed: &str,
    ) -> Result<(), EngineError> {
        if seed.trim().is_empty() {
            return Err(EngineError::MissingField("mentoring seed"));
        }

        let lock = self.student_lock(student_id);
        let _guard = lock.lock().await;

        {
            let mut roster = self.roster.write().await;
            let student = roster
                .student_mut(student_id)
                .ok_or(EngineError::StudentNotFound(student_id))?;
            let journal = student
                .journal_for_mut(date)
                .ok_or(EngineError::JournalMissing(date))?;
            let offered = journal
                .ai_analysis
                .as_ref()
                .map(|analysis| analysis.offered_seeds())
                .filter(|seeds| !seeds.is_empty())
                .ok_or(EngineError::AnalysisMissing(date))?;
            if !offered.iter().any(|candidate| candidate == seed) {
                return Err(EngineError::SeedNotOffered);
            }
            journal.selected_seed = Some(seed.to_string());
        }
        self.save_snapshot().await?;
        info!(student = student_id, %date, "mentoring seed confirmed");
        Ok(())
    }

    /// Capture the instructor's confirmed Step0 judgments for the date,
    /// replacing any prior set.
    pub async fn confirm_step0(
        &self,
        student_id: StudentId,
        date: NaiveDate,
        judgments: Vec<Judgment>,
    ) -> Result<(), EngineError> {
        let lock = self.student_lock(student_id);
        let _guard = lock.lock().await;

        {
            let mut roster = self.roster.write().await;
            let student = roster
                .student_mut(student_id)
                .ok_or(EngineError::StudentNotFound(student_id))?;
            let journal = student
                .journal_for_mut(date)
                .ok_or(EngineError::JournalMissing(date))?;
            let has_drafts = journal
                .ai_analysis
                .as_ref()
                .is_some_and(|analysis| !analysis.drafts().is_empty());
            if !has_drafts {
                return Err(EngineError::AnalysisMissing(date));
            }
            journal.step0_judgments = Some(judgments);
        }
        self.save_snapshot().await?;
        info!(student = student_id, %date, "step0 judgments confirmed");
        Ok(())
    }

    /// Save the instructor's post-conversation feedback for the date.
    pub async fn save_feedback(
        &self,
        student_id: StudentId,
        date: NaiveDate,
        text: &str,
    ) -> Result<(), EngineError> {
        if text.trim().is_empty() {
            return Err(EngineError::MissingField("feedback text"));
        }

        let lock = self.student_lock(student_id);
        let _guard = lock.lock().await;

        {
            let mut roster = self.roster.write().await;
            let student = roster
                .student_mut(student_id)
                .ok_or(EngineError::StudentNotFound(student_id))?;
            let journal = student
                .journal_for_mut(date)
                .ok_or(EngineError::JournalMissing(date))?;
            journal.feedback = text.to_string();
        }
        self.save_snapshot().await?;
        Ok(())
    }

    /// Run the weekly rollup for one student.
    ///
    /// When `week` is not given, the week of the most recent journal is
    /// reviewed. An error payload from the collaborator is surfaced as an
    /// error and nothing is mutated; a successful review replaces any
    /// prior rollup for that week.
    pub async fn run_weekly_review(
        &self,
        student_id: StudentId,
        week: Option<WeekNumber>,
        provider: Option<&str>,
    ) -> Result<WeeklyRun, EngineError> {
        let lock = self.student_lock(student_id);
        let _guard = lock.lock().await;

        let (target, journals) = {
            let roster = self.roster.read().await;
            let student = roster
                .student(student_id)
                .ok_or(EngineError::StudentNotFound(student_id))?;
            if student.journals.is_empty() {
                return Err(EngineError::NoJournals);
            }
            let target = match week {
                Some(week) => week,
                None => student
                    .latest_journal()
                    .map(|journal| journal.week_number)
                    .unwrap_or(1),
            };
            let journals = student
                .journals_for_week(target)
                .into_iter()
                .cloned()
                .collect::<Vec<_>>();
            (target, journals)
        };

        let request = WeeklyRequest {
            week_number: target,
            journals,
            provider: provider.unwrap_or(&self.config.provider).to_string(),
        };

        let review = match self.mentor.review_week(&request).await {
            WeeklyOutcome::Review(review) => review,
            WeeklyOutcome::Error(report) => {
                return Err(EngineError::External {
                    message: report.message,
                    suggestion: report.suggestion,
                });
            }
        };

        {
            let mut roster = self.roster.write().await;
            let student = roster
                .student_mut(student_id)
                .ok_or(EngineError::StudentNotFound(student_id))?;
            student.weekly_reviews.insert(target, review.clone());
        }

        let mut persisted = true;
        if let Err(err) = self.save_snapshot().await {
            warn!(student = student_id, week = target, %err, "weekly review stored but not persisted");
            persisted = false;
        }

        Ok(WeeklyRun {
            week_number: target,
            review,
            persisted,
        })
    }

    fn student_lock(&self, student_id: StudentId) -> Arc<Mutex<()>> {
        self.student_locks
            .entry(student_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn save_snapshot(&self) -> Result<(), EngineError> {
        let roster = self.roster.read().await;
        self.store.save(&roster).await?;
        Ok(())
    }
}
