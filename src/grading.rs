//! Percentage bands, letter grades and grade points on the 5.0 scale.

use crate::models::LetterGrade;

/// Percentage band mapped to a letter grade.
///
/// `max` is exclusive except for the top band, which includes 100.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradeBand {
    pub letter_grade: LetterGrade,
    pub min: f64,
    pub max: f64,
    pub points: f64,
}

impl GradeBand {
    pub fn contains(&self, percentage: f64) -> bool {
        if self.max >= 100.0 {
            percentage >= self.min && percentage <= self.max
        } else {
            percentage >= self.min && percentage < self.max
        }
    }
}

/// Ordered from A+ down to F.
pub const GRADE_SCALE: [GradeBand; 9] = [
    GradeBand { letter_grade: LetterGrade::APlus, min: 95.0, max: 100.0, points: 5.0 },
    GradeBand { letter_grade: LetterGrade::A, min: 90.0, max: 95.0, points: 4.75 },
    GradeBand { letter_grade: LetterGrade::BPlus, min: 85.0, max: 90.0, points: 4.5 },
    GradeBand { letter_grade: LetterGrade::B, min: 80.0, max: 85.0, points: 4.0 },
    GradeBand { letter_grade: LetterGrade::CPlus, min: 75.0, max: 80.0, points: 3.5 },
    GradeBand { letter_grade: LetterGrade::C, min: 70.0, max: 75.0, points: 3.0 },
    GradeBand { letter_grade: LetterGrade::DPlus, min: 65.0, max: 70.0, points: 2.5 },
    GradeBand { letter_grade: LetterGrade::D, min: 60.0, max: 65.0, points: 2.0 },
    GradeBand { letter_grade: LetterGrade::F, min: 0.0, max: 60.0, points: 1.0 },
];

pub const FAILING_POINTS: f64 = 1.0;

/// First band containing `percentage`; anything unmatched (negative, above
/// 100, NaN) is an F.
pub fn percentage_to_letter_grade(percentage: f64) -> LetterGrade {
    GRADE_SCALE
        .iter()
        .find(|band| band.contains(percentage))
        .map(|band| band.letter_grade)
        .unwrap_or(LetterGrade::F)
}

pub fn letter_grade_to_points(letter_grade: LetterGrade) -> f64 {
    band_for(letter_grade).points
}

/// Points for a raw grade code. Unknown codes score as an F.
pub fn points_for_code(code: &str) -> f64 {
    match code.parse::<LetterGrade>() {
        Ok(letter_grade) => letter_grade_to_points(letter_grade),
        Err(err) => {
            tracing::debug!(%err, "scoring unknown grade code as failing");
            FAILING_POINTS
        }
    }
}

pub fn band_for(letter_grade: LetterGrade) -> &'static GradeBand {
    // GRADE_SCALE is declared in LetterGrade::ALL order.
    let index = LetterGrade::ALL
        .iter()
        .position(|grade| *grade == letter_grade)
        .unwrap_or(GRADE_SCALE.len() - 1);
    &GRADE_SCALE[index]
}
