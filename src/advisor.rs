//! Prompt construction and response validation around the model.

use std::fmt::Write;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::gemini::schema::analysis_schema;
use crate::gemini::{GeminiError, GenerateContent, GenerateRequest};
use crate::models::{AiStudentAnalysis, InterventionStep, Student, WeakTopic};
use crate::stats;
use crate::store;

pub const SYSTEM_INSTRUCTION: &str =
    "You are an expert academic advisor and data scientist. Analyze student performance data to prevent dropout.";
pub const ANALYSIS_FAILED_MESSAGE: &str = "Failed to generate AI insights. Please check API key.";
pub const INSIGHTS_FALLBACK: &str = "Unable to generate cohort insights.";

#[derive(Debug, thiserror::Error)]
pub enum AdvisorError {
    #[error(transparent)]
    Model(#[from] GeminiError),

    /// The model answered, but not in the requested shape.
    #[error("analysis did not match schema: {0}")]
    InvalidAnalysis(String),
}

pub fn build_student_prompt(student: &Student) -> String {
    let mut prompt = String::new();
    let _ = writeln!(prompt, "Analyze the following student data for an EdTech dashboard.");
    let _ = writeln!(prompt, "Student Name: {}", student.name);
    let _ = writeln!(
        prompt,
        "Current Risk Tier: {} (Score: {})",
        student.risk_tier, student.risk_score
    );
    let _ = writeln!(prompt, "Attendance: {}%", student.attendance_rate);
    let _ = writeln!(prompt, "Overall Grade: {}%", student.overall_grade);
    let _ = writeln!(prompt);
    let _ = writeln!(prompt, "Assessments:");
    if student.assessments.is_empty() {
        let _ = writeln!(prompt, "- none recorded");
    }
    for a in &student.assessments {
        let _ = writeln!(
            prompt,
            "- {} ({}): {}/{} (Topic: {})",
            a.name, a.kind, a.score, a.max_score, a.topic
        );
    }
    let _ = writeln!(prompt);
    let _ = writeln!(prompt, "Engagement:");
    let _ = writeln!(prompt, "- LMS Logins/Week: {}", student.engagement.lms_login_frequency);
    let _ = writeln!(prompt, "- Video Watch %: {}", student.engagement.video_watch_percentage);
    let _ = writeln!(
        prompt,
        "- Missing Assignments: {}",
        student.engagement.missing_assignments()
    );
    let _ = writeln!(prompt);
    let _ = writeln!(prompt, "Task:");
    let _ = writeln!(
        prompt,
        "1. Identify specific risk drivers (e.g., declining quiz scores, low attendance)."
    );
    let _ = writeln!(prompt, "2. Diagnose weak topics based on assessment data.");
    let _ = writeln!(
        prompt,
        "3. Create a personalized intervention plan with specific resources (videos, exercises, meetings)."
    );
    let _ = writeln!(prompt, "4. Predict the outcome if no intervention occurs.");
    prompt
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalysisPayload {
    risk_drivers: Vec<String>,
    weak_topics: Vec<WeakTopic>,
    intervention_plan: Vec<InterventionStep>,
    predicted_outcome: String,
}

/// Validates model output against the analysis shape and stamps it with `now`.
pub fn parse_analysis(text: &str, now: DateTime<Utc>) -> Result<AiStudentAnalysis, AdvisorError> {
    let payload: AnalysisPayload = serde_json::from_str(strip_code_fence(text))
        .map_err(|e| AdvisorError::InvalidAnalysis(e.to_string()))?;

    let weak_topics = payload
        .weak_topics
        .into_iter()
        .map(|topic| WeakTopic {
            confidence: normalize_confidence(topic.confidence),
            ..topic
        })
        .collect();

    Ok(AiStudentAnalysis {
        risk_drivers: payload.risk_drivers,
        weak_topics,
        intervention_plan: payload.intervention_plan,
        predicted_outcome: payload.predicted_outcome,
        generated_at: now,
    })
}

/// Fractions in [0, 1] are read as probabilities; everything ends up on 0-100.
fn normalize_confidence(raw: f64) -> f64 {
    if !raw.is_finite() {
        return 0.0;
    }
    let scaled = if (0.0..=1.0).contains(&raw) { raw * 100.0 } else { raw };
    scaled.clamp(0.0, 100.0)
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

pub async fn analyze_student_risk(
    model: &dyn GenerateContent,
    student: &Student,
) -> Result<AiStudentAnalysis, AdvisorError> {
    let request = GenerateRequest::new(build_student_prompt(student))
        .with_system_instruction(SYSTEM_INSTRUCTION)
        .with_json_schema(analysis_schema());

    let result = match model.generate(&request).await {
        Ok(text) => parse_analysis(&text, Utc::now()),
        Err(e) => Err(AdvisorError::from(e)),
    };

    match &result {
        Ok(analysis) => info!(
            student = %student.id,
            drivers = analysis.risk_drivers.len(),
            steps = analysis.intervention_plan.len(),
            "student analysis generated"
        ),
        Err(e) => error!(student = %student.id, error = %e, "error analyzing student"),
    }
    result
}

pub fn build_cohort_prompt(students: &[Student]) -> String {
    let at_risk = students.iter().filter(|s| s.risk_tier.is_at_risk()).count();
    format!(
        "Given a cohort of {} students with an average grade of {:.1}% and {} students flagged as high risk.\n\
         Generate a concise, 2-sentence executive summary for the University Dean regarding the health of this cohort.\n\
         Focus on urgency and general sentiment.\n",
        students.len(),
        stats::average_grade(students),
        at_risk
    )
}

pub async fn generate_cohort_insights(
    model: &dyn GenerateContent,
    students: &[Student],
) -> Result<String, AdvisorError> {
    let request = GenerateRequest::new(build_cohort_prompt(students));
    match model.generate(&request).await {
        Ok(text) => Ok(text.trim().to_string()),
        Err(GeminiError::EmptyResponse) => Ok(INSIGHTS_FALLBACK.to_string()),
        Err(e) => {
            error!(error = %e, "error generating cohort insights");
            Err(e.into())
        }
    }
}

/// Whether [`analyze_cached`] answered from the stored record or the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisSource {
    Stored,
    Generated,
}

/// Runs the student analysis unless one is already stored and `force` is off.
///
/// Model and validation failures are logged and collapse into
/// [`ANALYSIS_FAILED_MESSAGE`]; an unknown `id` is reported as such.
pub async fn analyze_cached(
    model: &dyn GenerateContent,
    students: Vec<Student>,
    id: &str,
    force: bool,
) -> anyhow::Result<(Vec<Student>, AnalysisSource)> {
    let student = store::find_student(&students, id)?;

    if student.ai_analysis.is_some() && !force {
        info!(student = %id, "using stored analysis");
        return Ok((students, AnalysisSource::Stored));
    }

    let analysis = match analyze_student_risk(model, student).await {
        Ok(analysis) => analysis,
        Err(e) => {
            warn!(student = %id, error = %e, "analysis failed");
            anyhow::bail!(ANALYSIS_FAILED_MESSAGE);
        }
    };

    let students = store::update_analysis(students, id, analysis)?;
    Ok((students, AnalysisSource::Generated))
}

/// Cohort summary for display; `None` means the caller shows its placeholder.
pub async fn cohort_insights_or_none(model: &dyn GenerateContent, students: &[Student]) -> Option<String> {
    if students.is_empty() {
        return None;
    }
    match generate_cohort_insights(model, students).await {
        Ok(text) => Some(text),
        Err(e) => {
            warn!(error = %e, "cohort insights unavailable");
            None
        }
    }
}
