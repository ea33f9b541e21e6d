/// Data-integrity problems found in a stored grade record.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    #[error("unknown letter grade: {0:?}")]
    UnknownLetterGrade(String),
    #[error("course {course_code}: points {points} do not match {letter_grade} ({expected})")]
    PointsMismatch {
        course_code: String,
        letter_grade: String,
        points: f64,
        expected: f64,
    },
    #[error("course {course_code}: {percentage}% is outside the {letter_grade} band")]
    PercentageOutOfBand {
        course_code: String,
        letter_grade: String,
        percentage: f64,
    },
    #[error("course {0}: credit hours must be positive")]
    ZeroCreditHours(String),
    #[error("course {course_code}: {credit_hours} credit hours exceeds the maximum of {max}")]
    CreditHoursOutOfRange {
        course_code: String,
        credit_hours: u32,
        max: u32,
    },
    #[error("course {course_code}: level {level} is outside 1-8")]
    LevelOutOfRange { course_code: String, level: i32 },
}

/// Failures while reading CSV input.
#[derive(thiserror::Error, Debug)]
pub enum IngestError {
    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse csv: {0}")]
    Csv(#[from] csv::Error),
}
