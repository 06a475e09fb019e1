use std::fmt::Write;

use crate::models::Student;
use crate::report::render_analysis;
use crate::stats;

pub const INSIGHT_PLACEHOLDER: &str = "Analyzing cohort patterns...";

pub fn render_dashboard(students: &[Student], insights: Option<&str>, limit: usize) -> String {
    let mut output = String::new();

    if students.is_empty() {
        let _ = writeln!(output, "No Data Loaded");
        let _ = writeln!(
            output,
            "Run `edpulse generate` for the demo dataset or `edpulse import --csv <file>` to load student records."
        );
        return output;
    }

    let summary = stats::cohort_stats(students);
    let _ = writeln!(output, "Performance Overview");
    let _ = writeln!(output, "  Total students:          {}", summary.total_students);
    let _ = writeln!(
        output,
        "  At-risk (High/Critical): {} ({:.1}% of cohort)",
        summary.at_risk_count,
        stats::at_risk_share(&summary)
    );
    let _ = writeln!(output, "  Avg. attendance:         {:.1}%", summary.avg_attendance);
    let _ = writeln!(
        output,
        "  AI cohort insight:       {}",
        insights.unwrap_or(INSIGHT_PLACEHOLDER)
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "Risk Distribution");
    for entry in &summary.risk_distribution {
        let _ = writeln!(output, "  {:<8} {:>3} {}", entry.tier.as_str(), entry.count, "#".repeat(entry.count));
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "Priority Intervention List");
    let _ = writeln!(
        output,
        "  {:<14} {:<20} {:<18} {:>7} {:>7}",
        "ID", "Student", "Risk Tier", "Grade", "Missed"
    );
    for student in stats::priority_list(students, limit) {
        let tier = format!("{} ({:.1}%)", student.risk_tier, student.risk_score);
        let _ = writeln!(
            output,
            "  {:<14} {:<20} {:<18} {:>6.1}% {:>7}",
            student.id,
            student.name,
            tier,
            student.overall_grade,
            stats::missed_classes(student)
        );
    }

    output
}

pub fn render_profile(student: &Student) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "{}", student.name);
    let _ = writeln!(output, "ID: {} | {} | Risk: {}", student.id, student.cohort, student.risk_tier);

    let _ = writeln!(output);
    let _ = writeln!(output, "Quick Stats");
    let _ = writeln!(output, "  Attendance:     {}%", student.attendance_rate);
    let _ = writeln!(output, "  Assignment Avg: {}%", student.overall_grade);
    let _ = writeln!(output, "  LMS Logins:     {}/wk", student.engagement.lms_login_frequency);
    let _ = writeln!(output, "  Missing Tasks:  {}", student.engagement.missing_assignments());

    let _ = writeln!(output);
    let _ = writeln!(output, "Performance Velocity");
    let series = stats::performance_series(student);
    if series.is_empty() {
        let _ = writeln!(output, "  No assessments recorded.");
    }
    for point in series {
        let _ = writeln!(output, "  {} {:<16} {:>5.1}%", point.date, point.name, point.percent);
    }

    let _ = writeln!(output);
    match &student.ai_analysis {
        Some(analysis) => {
            let _ = write!(output, "{}", render_analysis(student, analysis));
        }
        None => {
            let _ = writeln!(output, "No AI analysis yet. Run `edpulse analyze --id {}`.", student.id);
        }
    }
    output
}
