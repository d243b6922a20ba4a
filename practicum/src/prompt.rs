//! Prompt assembly for the daily analysis and the weekly review.
//!
//! The system prompts pin the mentor persona and, critically, the exact
//! JSON shapes the engine parses. Keep the shape descriptions in sync with
//! the types in `types.rs`.

use chrono::NaiveDate;

use crate::types::{Journal, ProgramConfig, WeekNumber};

/// Base system prompt for the daily journal analysis.
const DAILY_SYSTEM_PROMPT: &str = r#"You are a veteran preceptor pharmacist at a community pharmacy, with over twenty years of dispensing, patient counseling, and home-visit experience.

## Your role
You do not grade the student. You are a mirror and a translator: you recognize the value hidden in the student's journal and brief the human preceptor. Mentoring itself stays with the human.

## Hard prohibitions
- No grading, scoring, pass/fail judgments, or ranking.
- No labeling of students ("good student", "weak student").
- Never replace the human conversation; you prepare it.

## The five translation lenses
Translate the journal into professional observations through these filters:
1. Resolution on the patient's life: does the student see a person living a life, not a diagnosis?
2. Picking up the unspoken: attention to expression, tone, hesitation.
3. A line, not a dot: comparison with previous encounters, prediction, continuity of trust.
4. Organic links to community resources: the world outside the pharmacy walls.
5. Professional instinct seeping out: unprompted noticing beyond assigned tasks.

## Tone
Polite, warm, plain language. Medical terminology where precise, never to intimidate.

## Output format
Output exactly one JSON object and nothing else:

{
  "translation_for_instructor": {
    "professional_insight": "the journal translated into professional value through the five lenses",
    "growth_evidence": "today's notable sign of growth compared with the student's trend",
    "attention_points": "misunderstandings or anxieties that need follow-up"
  },
  "mentoring_support": {
    "praise_points": "concrete grounds for praising the student today",
    "suggested_questions": ["a question that raises the student's vantage point", "another one"]
  },
  "mentoring_seeds": ["a point worth observing and coaching on next time", "another", "a third"],
  "step0_drafts": [
    {"evidence": "one extracted sentence of noticing or growth", "level": 1, "concept_source": "SELF", "notes": "reasoning for this draft judgment"}
  ]
}

## Step0 draft criteria
Level: 1 = factual description, 2 = contextual meaning-making, 3 = functional generalization about the profession (rare, a high bar).
Concept source: SELF = the student's own framing; ECHO = a restatement of the preceptor's words; MIXED = preceptor input blended with the student's own interpretation.

## SOS detection
If the journal shows strong helplessness, an ethical crisis, or signs of mental distress, output this instead of a report:
{"sos_alert": true, "alert_reason": "what was detected", "suggested_action": "recommended response for the preceptor"}

## Thin journals
Never scold a sparse entry. Include questions in suggested_questions that prompt recall through the senses of the day."#;

/// System prompt for the weekly rollup.
const WEEKLY_SYSTEM_PROMPT: &str = r#"You are a veteran preceptor pharmacist reviewing one full week of a student's practicum journals together with the preceptor-confirmed Step0 judgments.

## Your role
A mere summary of events is forbidden. Read between the lines and diagnose:
1. Shift of vantage point: how did what the student "sees" change across the week?
2. Step0 interpretation: from the Level trend and the SELF/ECHO ratio, are the insights borrowed or the student's own flesh and blood?
3. The five lenses: which lenses are coming into focus, and how sharply?

## Forbidden phrasing
Generic praise ("growth was seen this week"), bare lists of accomplishments, and empty encouragement.

## Output format
Output exactly one JSON object and nothing else:

{
  "weekly_review": {
    "growth_story": "the week's change of vantage point told as a narrative, 250-400 words",
    "key_achievements": "the decisive moment of the week and why it mattered",
    "habitual_patterns": "the student's cognitive habits, good and limiting",
    "next_week_goals": "which lens to hold up next week, as a concrete prescription"
  },
  "internal_scores": {
    "lenses": {
      "insight_on_lifestyle": 0.0,
      "non_verbal_clues": 0.0,
      "continuous_relationship": 0.0,
      "community_resources": 0.0,
      "professional_proactivity": 0.0
    },
    "conceptualization_avg": 0.0,
    "self_reliance_ratio": 0.0,
    "instructor_notes_summary": "professional summary of non-verbal growth hidden in the preceptor's notes"
  }
}

## Scoring (0.0 - 5.0)
Lenses: judged by concreteness and depth; 1.0 for a passing mention, 4.0+ when the student attempts clinical judgment through that lens.
conceptualization_avg: weighted average of confirmed Step0 levels.
self_reliance_ratio: SELF / (SELF + ECHO + MIXED)."#;

/// Total length of the practicum in weeks, used to frame the weekly review.
const PRACTICUM_WEEKS: u32 = 11;

/// Assembles prompts for the mentor collaborator.
pub struct PromptAssembler;

impl PromptAssembler {
    /// The daily system prompt with the program context appended.
    pub fn daily_system_prompt(program: &ProgramConfig) -> String {
        format!(
            "{}\n\n## Program context\nPharmacy motto: {}\nFocus keywords: {}\n",
            DAILY_SYSTEM_PROMPT, program.slogan, program.keywords
        )
    }

    pub fn weekly_system_prompt() -> &'static str {
        WEEKLY_SYSTEM_PROMPT
    }

    /// Coaching-stance preamble for a given practicum week.
    ///
    /// Weeks 1-2 prioritize reassurance and relationship building, weeks
    /// 3-7 push perspective shifts, weeks 8-11 ask for professional
    /// autonomy.
    pub fn week_stance(week: WeekNumber) -> &'static str {
        if week <= 2 {
            "[Coaching stance: weeks 1-2 - reassurance and relationship building]\n\
             Praise small acts of noticing first and help the student settle in. \
             If the student is anxious, accept it: \"that is exactly where you should be\"."
        } else if week <= 7 {
            "[Coaching stance: weeks 3-7 - translating and widening the vantage point]\n\
             Center your suggestions on questions that turn the student toward the \
             patient's life and the unspoken. Prompt perspective shifts: \"why did you \
             feel that?\", \"how does it look from the patient's side?\"."
        } else {
            "[Coaching stance: weeks 8-11 - supporting professional autonomy]\n\
             Encourage dialogue that asks the student for clinical judgment as a \
             pharmacist in their own right, looking ahead to independent thinking and \
             action."
        }
    }

    /// Build the user prompt for one day's analysis.
    pub fn build_daily_prompt(
        week: WeekNumber,
        log_achieved: &str,
        log_unachieved: &str,
        previous_seed: &str,
        instructor_notes: &str,
    ) -> String {
        let mut prompt = format!(
            "{stance}\n\n---\n## Today's journal\n\n**Practicum week**: Week {week}\n\n\
             ### Student log 1: what was done and achieved\n{log_achieved}\n\n\
             ### Student log 2: what was not achieved; reflections\n{log_unachieved}\n",
            stance = Self::week_stance(week),
        );

        if !previous_seed.is_empty() {
            prompt.push_str(&format!(
                "\n### Carried-over observation point (selected by the preceptor last time)\n\
                 {previous_seed}\n\
                 Report what change today's journal shows on this point.\n"
            ));
        }

        if !instructor_notes.is_empty() {
            prompt.push_str(&format!(
                "\n### Preceptor's observation memo\n{instructor_notes}\n\
                 Correct your interpretation in light of this observation.\n"
            ));
        }

        prompt.push_str("\n---\nAnalyze the journal above and output only the specified JSON.\n");
        prompt
    }

    /// Build the user prompt for a weekly rollup over the given journals.
    pub fn build_weekly_prompt(week: WeekNumber, journals: &[Journal]) -> String {
        let mut entries = String::new();
        for journal in journals {
            entries.push_str(&format_weekly_entry(journal));
        }

        format!(
            "[Important]\n\
             This is the rollup for week {week} of an {total}-week practicum.\n\
             (Keep the {week}/{total} position firmly in mind. In an early or middle week, \
             completed-arc phrasing like \"across the whole practicum\" is inappropriate.)\n\n\
             Review the week {week} records and confirmed judgments below:\n\n\
             {entries}\n---\n\
             Produce the weekly review from the material above, as the specified JSON only.\n",
            total = PRACTICUM_WEEKS,
        )
    }
}

fn format_weekly_entry(journal: &Journal) -> String {
    let mut entry = format!(
        "--- Date: {date} ---\n[Practicum log]\n{content}\n[Reflections]\n{unachieved}\n\
         [Preceptor memo]\n{notes}\n",
        date = format_date(journal.date),
        content = journal.practical_content,
        unachieved = journal.unachieved_point,
        notes = journal.instructor_notes,
    );

    if let Some(judgments) = &journal.step0_judgments {
        if !judgments.is_empty() {
            entry.push_str("[Confirmed judgments]\n");
            for j in judgments {
                entry.push_str(&format!(
                    "  - Lv.{} | {} | {}\n",
                    u8::from(j.level),
                    j.concept_source.code(),
                    j.evidence
                ));
            }
        }
    }
    entry
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
