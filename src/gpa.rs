use std::collections::BTreeMap;

use crate::grading;
use crate::models::{AcademicStatus, GpaCalculation, GradeRecord, TermSummary};

/// Credit hours required to graduate.
pub const PROGRAM_TOTAL_HOURS: u32 = 130;

#[derive(Debug, Default, Clone, Copy)]
struct Totals {
    weighted_points: f64,
    hours: u32,
    passed: u32,
    failed: u32,
    courses: usize,
}

impl Totals {
    fn add(&mut self, record: &GradeRecord) {
        let points = grading::letter_grade_to_points(record.letter_grade);
        self.weighted_points += points * f64::from(record.credit_hours);
        // saturate so oversized input still yields a result
        self.hours = self.hours.saturating_add(record.credit_hours);
        if record.letter_grade.is_passing() {
            self.passed = self.passed.saturating_add(record.credit_hours);
        } else {
            self.failed = self.failed.saturating_add(record.credit_hours);
        }
        self.courses += 1;
    }

    fn gpa(&self) -> f64 {
        if self.hours == 0 {
            0.0
        } else {
            round2(self.weighted_points / f64::from(self.hours))
        }
    }
}

pub fn calculate_gpa(grades: &[GradeRecord]) -> GpaCalculation {
    let mut totals = Totals::default();
    for record in grades {
        totals.add(record);
    }

    if totals.hours == 0 {
        return empty_calculation();
    }

    let gpa = totals.gpa();
    let semester_gpa = latest_term(grades)
        .map(|term| {
            let mut term_totals = Totals::default();
            for record in grades.iter().filter(|record| record.term() == term) {
                term_totals.add(record);
            }
            term_totals.gpa()
        })
        .unwrap_or(gpa);

    GpaCalculation {
        gpa,
        semester_gpa,
        total_hours_registered: totals.hours,
        total_hours_passed: totals.passed,
        total_hours_failed: totals.failed,
        total_points: round2(totals.weighted_points),
        academic_status: academic_status(gpa),
        completion_percentage: completion_percentage(totals.passed),
        remaining_hours: PROGRAM_TOTAL_HOURS.saturating_sub(totals.passed),
    }
}

fn empty_calculation() -> GpaCalculation {
    GpaCalculation {
        gpa: 0.0,
        semester_gpa: 0.0,
        total_hours_registered: 0,
        total_hours_passed: 0,
        total_hours_failed: 0,
        total_points: 0.0,
        academic_status: AcademicStatus::NoData,
        completion_percentage: 0.0,
        remaining_hours: PROGRAM_TOTAL_HOURS,
    }
}

pub fn academic_status(gpa: f64) -> AcademicStatus {
    match gpa {
        g if g >= 4.5 => AcademicStatus::Excellent,
        g if g >= 4.0 => AcademicStatus::VeryGood,
        g if g >= 3.5 => AcademicStatus::GoodPlus,
        g if g >= 3.0 => AcademicStatus::Good,
        g if g >= 2.5 => AcademicStatus::AcceptablePlus,
        g if g >= 2.0 => AcademicStatus::Acceptable,
        g if g >= 1.5 => AcademicStatus::Weak,
        _ => AcademicStatus::AcademicWarning,
    }
}

/// Passed hours as a share of the program, clamped to [0, 100].
pub fn completion_percentage(passed_hours: u32) -> f64 {
    let raw = f64::from(passed_hours) / f64::from(PROGRAM_TOTAL_HOURS) * 100.0;
    round2(raw).clamp(0.0, 100.0)
}

/// Per-term GPA rows ordered by academic year then semester.
pub fn term_summaries(grades: &[GradeRecord]) -> Vec<TermSummary> {
    let mut terms: BTreeMap<(String, String), Totals> = BTreeMap::new();
    for record in grades {
        terms
            .entry((record.academic_year.clone(), record.semester.clone()))
            .or_default()
            .add(record);
    }

    terms
        .into_iter()
        .map(|((academic_year, semester), totals)| TermSummary {
            academic_year,
            semester,
            gpa: totals.gpa(),
            hours_registered: totals.hours,
            hours_passed: totals.passed,
            course_count: totals.courses,
        })
        .collect()
}

fn latest_term(grades: &[GradeRecord]) -> Option<(&str, &str)> {
    grades.iter().map(GradeRecord::term).max()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LetterGrade, LocalizedText};
    use uuid::Uuid;

    fn record(code: &str, hours: u32, letter_grade: LetterGrade, year: &str, semester: &str) -> GradeRecord {
        GradeRecord {
            course_id: Uuid::new_v4(),
            course_code: code.to_string(),
            course_name: LocalizedText::new(code, code),
            credit_hours: hours,
            letter_grade,
            percentage: None,
            points: grading::letter_grade_to_points(letter_grade),
            semester: semester.to_string(),
            academic_year: year.to_string(),
            level: 1,
        }
    }

    #[test]
    fn empty_input_is_no_data() {
        let result = calculate_gpa(&[]);
        assert_eq!(result.gpa, 0.0);
        assert_eq!(result.remaining_hours, 130);
        assert_eq!(result.academic_status, AcademicStatus::NoData);
        assert_eq!(result.academic_status_ar(), "لا توجد بيانات");
    }

    #[test]
    fn single_a_record() {
        let result = calculate_gpa(&[record("CIS 101", 3, LetterGrade::A, "2024-2025", "1")]);
        assert_eq!(result.gpa, 4.75);
        assert_eq!(result.total_hours_passed, 3);
        assert_eq!(result.total_hours_failed, 0);
        assert_eq!(result.remaining_hours, 127);
        assert_eq!(result.academic_status, AcademicStatus::Excellent);
    }

    #[test]
    fn single_f_record() {
        let result = calculate_gpa(&[record("MGT 201", 3, LetterGrade::F, "2024-2025", "1")]);
        assert_eq!(result.gpa, 1.0);
        assert_eq!(result.total_hours_failed, 3);
        assert_eq!(result.total_hours_passed, 0);
        assert_eq!(result.academic_status, AcademicStatus::AcademicWarning);
    }

    #[test]
    fn weighted_average_rounds_to_two_places() {
        let grades = vec![
            record("CIS 101", 3, LetterGrade::A, "2024-2025", "1"),
            record("MKT 110", 2, LetterGrade::C, "2024-2025", "1"),
            record("FIN 120", 1, LetterGrade::BPlus, "2024-2025", "1"),
        ];
        // (14.25 + 6.0 + 4.5) / 6 = 4.125
        let result = calculate_gpa(&grades);
        assert_eq!(result.gpa, 4.13);
        assert_eq!(result.total_points, 24.75);
        assert_eq!(result.total_hours_registered, 6);
        assert_eq!(result.academic_status, AcademicStatus::VeryGood);
    }

    #[test]
    fn zero_credit_hours_do_not_produce_nan() {
        let result = calculate_gpa(&[record("IS 100", 0, LetterGrade::B, "2024-2025", "1")]);
        assert_eq!(result.gpa, 0.0);
        assert_eq!(result.academic_status, AcademicStatus::NoData);
    }

    #[test]
    fn oversized_credit_hours_do_not_overflow() {
        let grades = vec![
            record("CIS 101", u32::MAX, LetterGrade::A, "2024-2025", "1"),
            record("CIS 102", 3, LetterGrade::B, "2024-2025", "1"),
            record("CIS 103", 3, LetterGrade::F, "2024-2025", "1"),
        ];
        let result = calculate_gpa(&grades);
        assert_eq!(result.total_hours_registered, u32::MAX);
        assert_eq!(result.total_hours_passed, u32::MAX);
        assert_eq!(result.total_hours_failed, 3);
        assert_eq!(result.completion_percentage, 100.0);
        assert_eq!(result.remaining_hours, 0);
        assert!(result.gpa.is_finite());
    }

    #[test]
    fn json_carries_both_status_labels() {
        let json = serde_json::to_value(calculate_gpa(&[])).unwrap();
        assert_eq!(json["academic_status"]["en"], "No Data");
        assert_eq!(json["academic_status"]["ar"], "لا توجد بيانات");
        assert_eq!(json["remaining_hours"], 130);
    }

    #[test]
    fn semester_gpa_uses_latest_term() {
        let grades = vec![
            record("CIS 101", 3, LetterGrade::APlus, "2023-2024", "2"),
            record("CIS 102", 3, LetterGrade::D, "2024-2025", "1"),
        ];
        let result = calculate_gpa(&grades);
        assert_eq!(result.gpa, 3.5);
        assert_eq!(result.semester_gpa, 2.0);
    }

    #[test]
    fn completion_percentage_values() {
        assert_eq!(completion_percentage(130), 100.0);
        assert_eq!(completion_percentage(65), 50.0);
        assert_eq!(completion_percentage(0), 0.0);
    }

    #[test]
    fn completion_percentage_is_clamped() {
        assert_eq!(completion_percentage(160), 100.0);
        let grades: Vec<GradeRecord> = (0..50)
            .map(|i| record(&format!("ACCT {i}"), 3, LetterGrade::B, "2024-2025", "1"))
            .collect();
        let result = calculate_gpa(&grades);
        assert_eq!(result.total_hours_passed, 150);
        assert_eq!(result.completion_percentage, 100.0);
        assert_eq!(result.remaining_hours, 0);
    }

    #[test]
    fn status_thresholds() {
        assert_eq!(academic_status(5.0), AcademicStatus::Excellent);
        assert_eq!(academic_status(4.5), AcademicStatus::Excellent);
        assert_eq!(academic_status(4.49), AcademicStatus::VeryGood);
        assert_eq!(academic_status(3.5), AcademicStatus::GoodPlus);
        assert_eq!(academic_status(3.0), AcademicStatus::Good);
        assert_eq!(academic_status(2.5), AcademicStatus::AcceptablePlus);
        assert_eq!(academic_status(2.0), AcademicStatus::Acceptable);
        assert_eq!(academic_status(1.5), AcademicStatus::Weak);
        assert_eq!(academic_status(1.49), AcademicStatus::AcademicWarning);
    }

    #[test]
    fn term_summaries_are_ordered() {
        let grades = vec![
            record("CIS 201", 3, LetterGrade::B, "2024-2025", "1"),
            record("CIS 101", 3, LetterGrade::A, "2023-2024", "1"),
            record("CIS 102", 2, LetterGrade::F, "2023-2024", "1"),
        ];
        let terms = term_summaries(&grades);
        assert_eq!(terms.len(), 2);
        assert_eq!(terms[0].academic_year, "2023-2024");
        assert_eq!(terms[0].course_count, 2);
        assert_eq!(terms[0].hours_passed, 3);
        assert_eq!(terms[0].gpa, 3.25);
        assert_eq!(terms[1].gpa, 4.0);
    }
}
