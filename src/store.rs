use std::path::Path;

use anyhow::{bail, Context};
use serde::Deserialize;

use crate::models::{AiStudentAnalysis, EngagementMetric, RiskTier, Student};

pub fn load_cohort(path: &Path) -> anyhow::Result<Vec<Student>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let students = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a valid cohort file", path.display()))?;
    Ok(students)
}

pub fn save_cohort(path: &Path, students: &[Student]) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(students)?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

pub fn import_csv(csv_path: &Path) -> anyhow::Result<Vec<Student>> {
    let reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    read_students(reader)
}

fn read_students<R: std::io::Read>(mut reader: csv::Reader<R>) -> anyhow::Result<Vec<Student>> {
    #[derive(Deserialize)]
    struct CsvRow {
        id: String,
        name: String,
        email: String,
        cohort: String,
        attendance_rate: f64,
        overall_grade: f64,
        risk_tier: String,
        risk_score: f64,
        lms_login_frequency: u32,
        avg_session_duration: f64,
        assignments_submitted: u32,
        assignments_total: u32,
        video_watch_percentage: f64,
    }

    let mut students = Vec::new();

    for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
        let line = index + 2;
        let row = result.with_context(|| format!("invalid student row at line {line}"))?;
        let Some(risk_tier) = RiskTier::parse(&row.risk_tier) else {
            bail!("unknown risk tier '{}' at line {line}", row.risk_tier);
        };

        for (field, value) in [
            ("attendance_rate", row.attendance_rate),
            ("overall_grade", row.overall_grade),
            ("risk_score", row.risk_score),
            ("video_watch_percentage", row.video_watch_percentage),
        ] {
            if !(0.0..=100.0).contains(&value) {
                bail!("{field} must be between 0 and 100, got {value} at line {line}");
            }
        }
        if !row.avg_session_duration.is_finite() || row.avg_session_duration < 0.0 {
            bail!(
                "avg_session_duration must be a non-negative number, got {} at line {line}",
                row.avg_session_duration
            );
        }

        students.push(Student {
            id: row.id,
            name: row.name,
            email: row.email,
            cohort: row.cohort,
            attendance_rate: row.attendance_rate,
            overall_grade: row.overall_grade,
            risk_tier,
            risk_score: row.risk_score,
            assessments: Vec::new(),
            engagement: EngagementMetric {
                lms_login_frequency: row.lms_login_frequency,
                avg_session_duration: row.avg_session_duration,
                assignments_submitted: row.assignments_submitted,
                assignments_total: row.assignments_total,
                video_watch_percentage: row.video_watch_percentage,
            },
            ai_analysis: None,
        });
    }

    Ok(students)
}

pub fn find_student<'a>(students: &'a [Student], id: &str) -> anyhow::Result<&'a Student> {
    students
        .iter()
        .find(|s| s.id == id)
        .with_context(|| format!("no student with id {id}"))
}

/// Replaces the stored analysis for `id` wholesale.
pub fn update_analysis(
    students: Vec<Student>,
    id: &str,
    analysis: AiStudentAnalysis,
) -> anyhow::Result<Vec<Student>> {
    if !students.iter().any(|s| s.id == id) {
        bail!("no student with id {id}");
    }

    Ok(students
        .into_iter()
        .map(|s| {
            if s.id == id {
                s.with_analysis(analysis.clone())
            } else {
                s
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::tests::sample_student;
    use chrono::Utc;

    const HEADER: &str = "id,name,email,cohort,attendance_rate,overall_grade,risk_tier,risk_score,\
lms_login_frequency,avg_session_duration,assignments_submitted,assignments_total,video_watch_percentage\n";

    fn analysis(outcome: &str) -> AiStudentAnalysis {
        AiStudentAnalysis {
            risk_drivers: vec!["Low attendance".to_string()],
            weak_topics: Vec::new(),
            intervention_plan: Vec::new(),
            predicted_outcome: outcome.to_string(),
            generated_at: Utc::now(),
        }
    }

    #[test]
    fn reads_students_from_csv() {
        let data = format!(
            "{HEADER}STD-1,Avery Lee,avery@university.edu,CS-2025-A,71.5,64.0,high,72.0,4,30,6,10,55\n"
        );
        let students = read_students(csv::Reader::from_reader(data.as_bytes())).unwrap();
        assert_eq!(students.len(), 1);
        let student = &students[0];
        assert_eq!(student.risk_tier, RiskTier::High);
        assert_eq!(student.engagement.missing_assignments(), 4);
        assert!(student.assessments.is_empty());
    }

    #[test]
    fn rejects_unknown_tier_with_line_number() {
        let data = format!("{HEADER}STD-1,Avery,a@u.edu,CS,71,64,Severe,72,4,30,6,10,55\n");
        let err = read_students(csv::Reader::from_reader(data.as_bytes())).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Severe"));
        assert!(message.contains("line 2"));
    }

    #[test]
    fn rejects_non_finite_and_out_of_range_numbers() {
        let cases = [
            ("NaN,64,High,72,30,55", "attendance_rate"),
            ("71,250,High,72,30,55", "overall_grade"),
            ("71,64,High,inf,30,55", "risk_score"),
            ("71,64,High,72,30,-5", "video_watch_percentage"),
            ("71,64,High,72,NaN,55", "avg_session_duration"),
        ];
        for (values, field) in cases {
            let v: Vec<&str> = values.split(',').collect();
            let data = format!(
                "{HEADER}STD-1,Avery,a@u.edu,CS,{},{},{},{},4,{},6,10,{}\n",
                v[0], v[1], v[2], v[3], v[4], v[5]
            );
            let err = read_students(csv::Reader::from_reader(data.as_bytes())).unwrap_err();
            let message = err.to_string();
            assert!(message.contains(field), "{message}");
            assert!(message.contains("line 2"), "{message}");
        }
    }

    #[test]
    fn accepts_boundary_percentages() {
        let data = format!("{HEADER}STD-1,Avery,a@u.edu,CS,100,0,Low,0,0,0,10,10,100\n");
        let students = read_students(csv::Reader::from_reader(data.as_bytes())).unwrap();
        assert_eq!(crate::stats::missed_classes(&students[0]), 0);
    }

    #[test]
    fn update_replaces_analysis_wholesale() {
        let students = vec![
            sample_student("a", RiskTier::Low, 10.0).with_analysis(analysis("old")),
            sample_student("b", RiskTier::High, 70.0),
        ];
        let updated = update_analysis(students, "a", analysis("new")).unwrap();
        let a = find_student(&updated, "a").unwrap();
        assert_eq!(a.ai_analysis.as_ref().unwrap().predicted_outcome, "new");
        assert!(find_student(&updated, "b").unwrap().ai_analysis.is_none());
    }

    #[test]
    fn update_unknown_student_fails() {
        let students = vec![sample_student("a", RiskTier::Low, 10.0)];
        assert!(update_analysis(students, "zzz", analysis("x")).is_err());
    }

    #[test]
    fn cohort_file_round_trips_and_missing_file_is_empty() {
        let dir = std::env::temp_dir().join(format!("edpulse-store-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("cohort.json");
        let _ = std::fs::remove_file(&path);

        assert!(load_cohort(&path).unwrap().is_empty());

        let students = vec![sample_student("a", RiskTier::Critical, 91.0)];
        save_cohort(&path, &students).unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"riskTier\": \"Critical\""));
        assert!(raw.contains("\"maxScore\""));
        assert_eq!(load_cohort(&path).unwrap(), students);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
