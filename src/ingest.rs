use std::fs::File;
use std::path::Path;

use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use crate::error::{IngestError, RecordError};
use crate::grading;
use crate::models::{Course, GradeRecord, LetterGrade, LocalizedText, RegistrationStatus};

/// One row of a grade export.
#[derive(Debug, Clone, Deserialize)]
pub struct GradeRow {
    pub student_number: String,
    pub course_code: String,
    pub course_name_ar: String,
    pub course_name_en: String,
    pub credit_hours: u32,
    pub letter_grade: String,
    #[serde(deserialize_with = "csv::invalid_option")]
    pub percentage: Option<f64>,
    pub semester: String,
    pub academic_year: String,
    pub level: i32,
    pub source_key: Option<String>,
}

impl GradeRow {
    pub fn to_record(&self, course_id: Uuid) -> Result<GradeRecord, RecordError> {
        let letter_grade: LetterGrade = self.letter_grade.parse()?;
        let record = GradeRecord {
            course_id,
            course_code: self.course_code.trim().to_string(),
            course_name: LocalizedText::new(self.course_name_ar.trim(), self.course_name_en.trim()),
            credit_hours: self.credit_hours,
            letter_grade,
            percentage: self.percentage,
            points: grading::letter_grade_to_points(letter_grade),
            semester: self.semester.trim().to_string(),
            academic_year: self.academic_year.trim().to_string(),
            level: self.level,
        };
        record.validate()?;
        Ok(record)
    }
}

/// One row of a course registration export.
#[derive(Debug, Clone, Deserialize)]
pub struct CourseRow {
    pub course_code: String,
    pub course_name_ar: String,
    pub course_name_en: String,
    pub credit_hours: u32,
    pub status: Option<String>,
}

/// Records accepted from a file plus the rows that failed validation.
#[derive(Debug, Default)]
pub struct GradeImport {
    pub records: Vec<GradeRecord>,
    pub rejected: Vec<(usize, RecordError)>,
}

pub fn read_grade_rows(path: &Path) -> Result<Vec<GradeRow>, IngestError> {
    let mut reader = csv::Reader::from_reader(File::open(path)?);
    let mut rows = Vec::new();
    for result in reader.deserialize::<GradeRow>() {
        rows.push(result?);
    }
    Ok(rows)
}

/// Reads a grade export for offline use. Rows are numbered from 1, header
/// excluded; invalid rows are kept out of `records`.
pub fn read_grade_records(path: &Path) -> Result<GradeImport, IngestError> {
    let mut import = GradeImport::default();
    for (index, row) in read_grade_rows(path)?.into_iter().enumerate() {
        match row.to_record(Uuid::new_v4()) {
            Ok(record) => import.records.push(record),
            Err(err) => {
                warn!(row = index + 1, %err, "skipping grade row");
                import.rejected.push((index + 1, err));
            }
        }
    }
    Ok(import)
}

/// Reads approved courses from a registration export. A missing status
/// counts as approved; unknown statuses are skipped.
pub fn read_courses(path: &Path) -> Result<Vec<Course>, IngestError> {
    let mut reader = csv::Reader::from_reader(File::open(path)?);
    let mut courses = Vec::new();

    for (index, result) in reader.deserialize::<CourseRow>().enumerate() {
        let row = result?;
        let status = match row.status.as_deref().map(str::parse::<RegistrationStatus>) {
            None => RegistrationStatus::Approved,
            Some(Ok(status)) => status,
            Some(Err(err)) => {
                warn!(row = index + 1, %err, "skipping registration row");
                continue;
            }
        };
        if status != RegistrationStatus::Approved {
            continue;
        }
        courses.push(Course {
            course_id: Uuid::new_v4(),
            course_code: row.course_code.trim().to_string(),
            course_name: LocalizedText::new(row.course_name_ar.trim(), row.course_name_en.trim()),
            credit_hours: row.credit_hours,
        });
    }

    Ok(courses)
}
