use anyhow::Context;
use chrono::NaiveDate;
use rand::Rng;

use crate::models::{Assessment, AssessmentKind, EngagementMetric, RiskTier, Student};

pub const DEFAULT_COHORT: &str = "CS-2025-A";
pub const DEFAULT_COUNT: usize = 25;

const ID_BASE: usize = 2_024_000;

pub fn generate_mock_data<R: Rng + ?Sized>(rng: &mut R, count: usize) -> anyhow::Result<Vec<Student>> {
    (0..count).map(|i| mock_student(rng, i)).collect()
}

fn mock_student<R: Rng + ?Sized>(rng: &mut R, i: usize) -> anyhow::Result<Student> {
    let is_risk = rng.random_bool(0.3);
    let is_critical = is_risk && rng.random_bool(0.4);
    let base: f64 = if is_critical {
        45.0
    } else if is_risk {
        62.0
    } else {
        85.0
    };

    let attendance_rate = (base + rng.random_range(-10.0..10.0)).clamp(40.0, 100.0);
    let overall_grade = (base + rng.random_range(-7.0..8.0)).clamp(30.0, 100.0);

    let risk_tier = if is_critical {
        RiskTier::Critical
    } else if is_risk {
        RiskTier::High
    } else if rng.random_bool(0.5) {
        RiskTier::Medium
    } else {
        RiskTier::Low
    };

    let risk_score = if is_critical {
        rng.random_range(85.0..=100.0)
    } else if is_risk {
        rng.random_range(65.0..85.0)
    } else {
        rng.random_range(0.0..30.0)
    };

    let letter = char::from(b'A' + (i % 26) as u8);

    let assessments = vec![
        Assessment {
            id: format!("A1-{i}"),
            name: "Midterm Exam".to_string(),
            kind: AssessmentKind::Exam,
            score: (base * 0.9).floor(),
            max_score: 100.0,
            topic: "Calculus II".to_string(),
            date: date(2024, 3, 15)?,
        },
        Assessment {
            id: format!("A2-{i}"),
            name: "SQL Project".to_string(),
            kind: AssessmentKind::Project,
            score: (base * 1.1).floor(),
            max_score: 100.0,
            topic: "Database Systems".to_string(),
            date: date(2024, 4, 2)?,
        },
        Assessment {
            id: format!("A3-{i}"),
            name: "Quiz 3".to_string(),
            kind: AssessmentKind::Quiz,
            score: (base * 0.85).floor(),
            max_score: 20.0,
            topic: "Data Structures".to_string(),
            date: date(2024, 4, 10)?,
        },
    ];

    Ok(Student {
        id: format!("STD-{}", ID_BASE + i),
        name: format!("Student {letter}{i}"),
        email: format!("student{i}@university.edu"),
        cohort: DEFAULT_COHORT.to_string(),
        attendance_rate: round1(attendance_rate),
        overall_grade: round1(overall_grade),
        risk_tier,
        risk_score: round1(risk_score),
        assessments,
        engagement: EngagementMetric {
            lms_login_frequency: (base / 10.0).floor() as u32,
            avg_session_duration: 45.0,
            assignments_submitted: 8,
            assignments_total: 10,
            video_watch_percentage: base,
        },
        ai_analysis: None,
    })
}

fn date(year: i32, month: u32, day: u32) -> anyhow::Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).context("invalid date")
}

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn generates_requested_count_with_stable_identity() {
        let mut rng = StdRng::seed_from_u64(7);
        let students = generate_mock_data(&mut rng, 25).unwrap();
        assert_eq!(students.len(), 25);
        assert_eq!(students[0].id, "STD-2024000");
        assert_eq!(students[0].name, "Student A0");
        assert_eq!(students[24].name, "Student Y24");
        assert_eq!(students[3].email, "student3@university.edu");
        assert!(students.iter().all(|s| s.cohort == DEFAULT_COHORT));
        assert!(students.iter().all(|s| s.ai_analysis.is_none()));
    }

    #[test]
    fn names_wrap_after_twenty_six() {
        let mut rng = StdRng::seed_from_u64(1);
        let students = generate_mock_data(&mut rng, 28).unwrap();
        assert_eq!(students[26].name, "Student A26");
        assert_eq!(students[27].name, "Student B27");
    }

    #[test]
    fn values_stay_within_bounds() {
        let mut rng = StdRng::seed_from_u64(42);
        for student in generate_mock_data(&mut rng, 200).unwrap() {
            assert!((40.0..=100.0).contains(&student.attendance_rate));
            assert!((30.0..=100.0).contains(&student.overall_grade));
            assert!((0.0..=100.0).contains(&student.risk_score));
            match student.risk_tier {
                RiskTier::Critical => assert!(student.risk_score >= 85.0),
                RiskTier::High => assert!((65.0..=85.0).contains(&student.risk_score)),
                RiskTier::Medium | RiskTier::Low => assert!(student.risk_score <= 30.0),
            }
            assert_eq!(student.assessments.len(), 3);
            assert_eq!(student.engagement.missing_assignments(), 2);
        }
    }

    #[test]
    fn assessments_follow_base_score() {
        let mut rng = StdRng::seed_from_u64(3);
        for student in generate_mock_data(&mut rng, 50).unwrap() {
            let base = student.engagement.video_watch_percentage;
            assert!([45.0, 62.0, 85.0].contains(&base));
            assert_eq!(student.assessments[0].score, (base * 0.9).floor());
            assert_eq!(student.assessments[2].max_score, 20.0);
            assert_eq!(
                student.engagement.lms_login_frequency,
                (base / 10.0).floor() as u32
            );
        }
    }

    #[test]
    fn seeded_generation_is_reproducible() {
        let a = generate_mock_data(&mut StdRng::seed_from_u64(99), 10).unwrap();
        let b = generate_mock_data(&mut StdRng::seed_from_u64(99), 10).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn round1_keeps_one_decimal() {
        assert_eq!(round1(72.349), 72.3);
        assert_eq!(round1(72.35000001), 72.4);
    }
}
