use std::fmt::Write;

use chrono::NaiveDate;

use crate::models::{AiStudentAnalysis, Student};
use crate::stats;

pub fn build_report(
    cohort: Option<&str>,
    generated_on: NaiveDate,
    students: &[Student],
    insights: Option<&str>,
) -> String {
    let summary = stats::cohort_stats(students);

    let mut output = String::new();
    let cohort_label = cohort.unwrap_or("all cohorts");

    let _ = writeln!(output, "# Cohort Risk Report");
    let _ = writeln!(output, "Generated for {} on {}", cohort_label, generated_on);
    let _ = writeln!(output);

    if students.is_empty() {
        let _ = writeln!(output, "No student records loaded.");
        return output;
    }

    let _ = writeln!(output, "## Overview");
    let _ = writeln!(output, "- Total students: {}", summary.total_students);
    let _ = writeln!(
        output,
        "- At-risk (High/Critical): {} ({:.1}% of cohort)",
        summary.at_risk_count,
        stats::at_risk_share(&summary)
    );
    let _ = writeln!(output, "- Avg. attendance: {:.1}%", summary.avg_attendance);
    let _ = writeln!(output, "- Avg. grade: {:.1}%", summary.avg_grade);
    if let Some(text) = insights {
        let _ = writeln!(output);
        let _ = writeln!(output, "> {text}");
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Risk Distribution");
    for entry in &summary.risk_distribution {
        let _ = writeln!(output, "- {}: {}", entry.tier, entry.count);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Weakest Topics");
    if summary.weakest_topics.is_empty() {
        let _ = writeln!(output, "No assessments recorded.");
    } else {
        for topic in &summary.weakest_topics {
            let _ = writeln!(output, "- {topic}");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Priority Intervention List");
    let _ = writeln!(output, "| Student | Risk Tier | Grade | Missed Classes |");
    let _ = writeln!(output, "|---|---|---|---|");
    for student in stats::priority_list(students, stats::PRIORITY_LIST_LEN) {
        let _ = writeln!(
            output,
            "| {} | {} ({:.1}%) | {:.1}% | {} |",
            student.name,
            student.risk_tier,
            student.risk_score,
            student.overall_grade,
            stats::missed_classes(student)
        );
    }

    let analyzed: Vec<(&Student, &AiStudentAnalysis)> = students
        .iter()
        .filter_map(|s| s.ai_analysis.as_ref().map(|a| (s, a)))
        .collect();

    let _ = writeln!(output);
    let _ = writeln!(output, "## AI Intervention Plans");
    if analyzed.is_empty() {
        let _ = writeln!(output, "No students have been analyzed yet.");
    }
    for (student, analysis) in analyzed {
        let _ = writeln!(output);
        let _ = write!(output, "{}", render_analysis(student, analysis));
    }

    output
}

pub fn render_analysis(student: &Student, analysis: &AiStudentAnalysis) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "### {} ({})", student.name, student.id);
    let _ = writeln!(
        output,
        "_Generated {}_",
        analysis.generated_at.format("%Y-%m-%d %H:%M UTC")
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "Risk drivers:");
    for driver in &analysis.risk_drivers {
        let _ = writeln!(output, "- {driver}");
    }
    let _ = writeln!(output);
    let _ = writeln!(output, "Topic-level diagnostics:");
    for topic in &analysis.weak_topics {
        let _ = writeln!(
            output,
            "- {} ({:.0}% conf): {}",
            topic.topic, topic.confidence, topic.reasoning
        );
    }
    let _ = writeln!(output);
    let _ = writeln!(output, "Intervention plan:");
    for step in &analysis.intervention_plan {
        let _ = writeln!(
            output,
            "- [{} / {} priority] {}",
            step.kind, step.priority, step.description
        );
        if !step.resources.is_empty() {
            let _ = writeln!(output, "  Resources: {}", step.resources.join(", "));
        }
    }
    let _ = writeln!(output);
    let _ = writeln!(output, "Predicted outcome: {}", analysis.predicted_outcome);
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{InterventionKind, InterventionStep, Priority, RiskTier, WeakTopic};
    use crate::stats::tests::sample_student;
    use chrono::Utc;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    #[test]
    fn empty_cohort_reports_no_records() {
        let report = build_report(None, date(), &[], None);
        assert!(report.contains("Generated for all cohorts on 2026-10-16"));
        assert!(report.contains("No student records loaded."));
        assert!(!report.contains("## Overview"));
    }

    #[test]
    fn report_orders_priority_list_by_risk() {
        let students = vec![
            sample_student("low", RiskTier::Low, 12.0),
            sample_student("crit", RiskTier::Critical, 93.0),
        ];
        let report = build_report(Some("CS-2025-A"), date(), &students, Some("Stable cohort."));
        assert!(report.contains("- At-risk (High/Critical): 1 (50.0% of cohort)"));
        assert!(report.contains("> Stable cohort."));
        assert!(report.contains("- Medium: 0"));
        let crit = report.find("| Student crit |").unwrap();
        let low = report.find("| Student low |").unwrap();
        assert!(crit < low);
        assert!(report.contains("No students have been analyzed yet."));
    }

    #[test]
    fn report_includes_cached_analysis() {
        let analysis = AiStudentAnalysis {
            risk_drivers: vec!["Low attendance".to_string()],
            weak_topics: vec![WeakTopic {
                topic: "Calculus II".to_string(),
                confidence: 82.0,
                reasoning: "Midterm at 45%".to_string(),
            }],
            intervention_plan: vec![InterventionStep {
                kind: InterventionKind::Academic,
                description: "Weekly tutoring".to_string(),
                resources: vec!["Office hours".to_string(), "Khan Academy".to_string()],
                priority: Priority::High,
            }],
            predicted_outcome: "At risk of failing.".to_string(),
            generated_at: Utc::now(),
        };
        let students = vec![sample_student("a", RiskTier::High, 70.0).with_analysis(analysis)];
        let report = build_report(None, date(), &students, None);
        assert!(report.contains("### Student a (a)"));
        assert!(report.contains("- Calculus II (82% conf): Midterm at 45%"));
        assert!(report.contains("- [Academic / High priority] Weekly tutoring"));
        assert!(report.contains("  Resources: Office hours, Khan Academy"));
        assert!(report.contains("Predicted outcome: At risk of failing."));
    }
}
