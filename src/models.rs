use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskTier {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskTier {
    pub const ALL: [RiskTier; 4] = [
        RiskTier::Low,
        RiskTier::Medium,
        RiskTier::High,
        RiskTier::Critical,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RiskTier::Low => "Low",
            RiskTier::Medium => "Medium",
            RiskTier::High => "High",
            RiskTier::Critical => "Critical",
        }
    }

    pub fn is_at_risk(self) -> bool {
        matches!(self, RiskTier::High | RiskTier::Critical)
    }

    pub fn parse(raw: &str) -> Option<Self> {
        RiskTier::ALL
            .into_iter()
            .find(|tier| tier.as_str().eq_ignore_ascii_case(raw.trim()))
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssessmentKind {
    Assignment,
    Quiz,
    Exam,
    Project,
}

impl fmt::Display for AssessmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AssessmentKind::Assignment => "Assignment",
            AssessmentKind::Quiz => "Quiz",
            AssessmentKind::Exam => "Exam",
            AssessmentKind::Project => "Project",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AssessmentKind,
    pub score: f64,
    pub max_score: f64,
    pub topic: String,
    pub date: NaiveDate,
}

impl Assessment {
    /// Score as a percentage of the maximum; zero when the maximum is zero.
    pub fn percent(&self) -> f64 {
        if self.max_score <= 0.0 {
            0.0
        } else {
            self.score / self.max_score * 100.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementMetric {
    /// Logins per week.
    pub lms_login_frequency: u32,
    /// Minutes.
    pub avg_session_duration: f64,
    pub assignments_submitted: u32,
    pub assignments_total: u32,
    pub video_watch_percentage: f64,
}

impl EngagementMetric {
    pub fn missing_assignments(&self) -> u32 {
        self.assignments_total
            .saturating_sub(self.assignments_submitted)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub name: String,
    pub email: String,
    pub cohort: String,
    pub attendance_rate: f64,
    pub overall_grade: f64,
    pub risk_tier: RiskTier,
    pub risk_score: f64,
    pub assessments: Vec<Assessment>,
    pub engagement: EngagementMetric,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_analysis: Option<AiStudentAnalysis>,
}

impl Student {
    pub fn with_analysis(self, analysis: AiStudentAnalysis) -> Self {
        Student {
            ai_analysis: Some(analysis),
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeakTopic {
    pub topic: String,
    /// 0-100.
    pub confidence: f64,
    pub reasoning: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterventionKind {
    Academic,
    Behavioral,
    Administrative,
}

impl fmt::Display for InterventionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            InterventionKind::Academic => "Academic",
            InterventionKind::Behavioral => "Behavioral",
            InterventionKind::Administrative => "Administrative",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterventionStep {
    #[serde(rename = "type")]
    pub kind: InterventionKind,
    pub description: String,
    #[serde(default)]
    pub resources: Vec<String>,
    pub priority: Priority,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiStudentAnalysis {
    pub risk_drivers: Vec<String>,
    pub weak_topics: Vec<WeakTopic>,
    pub intervention_plan: Vec<InterventionStep>,
    pub predicted_outcome: String,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct TierCount {
    pub tier: RiskTier,
    pub count: usize,
}

#[derive(Debug, Clone)]
pub struct CohortStats {
    pub total_students: usize,
    pub risk_distribution: Vec<TierCount>,
    pub at_risk_count: usize,
    pub avg_attendance: f64,
    pub avg_grade: f64,
    pub weakest_topics: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PerformancePoint {
    pub name: String,
    pub date: NaiveDate,
    pub percent: f64,
}
