use std::collections::HashMap;

use crate::models::{CohortStats, PerformancePoint, RiskTier, Student, TierCount};

pub const PRIORITY_LIST_LEN: usize = 10;
pub const WEAKEST_TOPIC_LEN: usize = 3;

pub fn cohort_stats(students: &[Student]) -> CohortStats {
    let mut counts: HashMap<RiskTier, usize> = HashMap::new();
    for student in students {
        *counts.entry(student.risk_tier).or_insert(0) += 1;
    }

    let risk_distribution: Vec<TierCount> = RiskTier::ALL
        .into_iter()
        .map(|tier| TierCount {
            tier,
            count: counts.get(&tier).copied().unwrap_or(0),
        })
        .collect();

    let at_risk_count = risk_distribution
        .iter()
        .filter(|entry| entry.tier.is_at_risk())
        .map(|entry| entry.count)
        .sum();

    let total = students.len();
    let divisor = total.max(1) as f64;
    let avg_attendance = students.iter().map(|s| s.attendance_rate).sum::<f64>() / divisor;

    CohortStats {
        total_students: total,
        risk_distribution,
        at_risk_count,
        avg_attendance,
        avg_grade: average_grade(students),
        weakest_topics: weakest_topics(students, WEAKEST_TOPIC_LEN),
    }
}

pub fn average_grade(students: &[Student]) -> f64 {
    let divisor = students.len().max(1) as f64;
    students.iter().map(|s| s.overall_grade).sum::<f64>() / divisor
}

pub fn at_risk_share(stats: &CohortStats) -> f64 {
    if stats.total_students == 0 {
        0.0
    } else {
        stats.at_risk_count as f64 / stats.total_students as f64 * 100.0
    }
}

/// Highest risk score first.
pub fn priority_list(students: &[Student], limit: usize) -> Vec<&Student> {
    let mut sorted: Vec<&Student> = students.iter().collect();
    sorted.sort_by(|a, b| {
        b.risk_score
            .partial_cmp(&a.risk_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    sorted.truncate(limit);
    sorted
}

pub fn missed_classes(student: &Student) -> i64 {
    ((100.0 - student.attendance_rate.clamp(0.0, 100.0)) / 5.0).round() as i64
}

/// Topics ranked by mean assessment percentage, lowest first.
pub fn weakest_topics(students: &[Student], limit: usize) -> Vec<String> {
    let mut map: HashMap<&str, (usize, f64)> = HashMap::new();

    for assessment in students.iter().flat_map(|s| s.assessments.iter()) {
        let entry = map.entry(assessment.topic.as_str()).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += assessment.percent();
    }

    let mut averages: Vec<(&str, f64)> = map
        .into_iter()
        .map(|(topic, (count, total))| (topic, total / count as f64))
        .collect();

    averages.sort_by(|a, b| {
        a.1.partial_cmp(&b.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(b.0))
    });

    averages
        .into_iter()
        .take(limit)
        .map(|(topic, _)| topic.to_string())
        .collect()
}

pub fn performance_series(student: &Student) -> Vec<PerformancePoint> {
    let mut assessments: Vec<_> = student.assessments.iter().collect();
    assessments.sort_by_key(|a| a.date);
    assessments
        .into_iter()
        .map(|a| PerformancePoint {
            name: a.name.clone(),
            date: a.date,
            percent: a.percent(),
        })
        .collect()
}
