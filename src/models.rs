use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::RecordError;
use crate::grading;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LetterGrade {
    #[serde(rename = "A+")]
    APlus,
    A,
    #[serde(rename = "B+")]
    BPlus,
    B,
    #[serde(rename = "C+")]
    CPlus,
    C,
    #[serde(rename = "D+")]
    DPlus,
    D,
    F,
}

impl LetterGrade {
    pub const ALL: [LetterGrade; 9] = [
        LetterGrade::APlus,
        LetterGrade::A,
        LetterGrade::BPlus,
        LetterGrade::B,
        LetterGrade::CPlus,
        LetterGrade::C,
        LetterGrade::DPlus,
        LetterGrade::D,
        LetterGrade::F,
    ];

    pub fn code(self) -> &'static str {
        match self {
            LetterGrade::APlus => "A+",
            LetterGrade::A => "A",
            LetterGrade::BPlus => "B+",
            LetterGrade::B => "B",
            LetterGrade::CPlus => "C+",
            LetterGrade::C => "C",
            LetterGrade::DPlus => "D+",
            LetterGrade::D => "D",
            LetterGrade::F => "F",
        }
    }

    pub fn is_passing(self) -> bool {
        self != LetterGrade::F
    }
}

impl fmt::Display for LetterGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for LetterGrade {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        LetterGrade::ALL
            .into_iter()
            .find(|grade| grade.code() == wanted)
            .ok_or_else(|| RecordError::UnknownLetterGrade(s.to_string()))
    }
}

/// Arabic/English label pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedText {
    pub ar: String,
    pub en: String,
}

impl LocalizedText {
    pub fn new(ar: impl Into<String>, en: impl Into<String>) -> Self {
        Self {
            ar: ar.into(),
            en: en.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Student {
    pub id: Uuid,
    pub student_number: String,
    pub full_name: String,
    pub level: i32,
}

/// Largest credit-hour load a single course may carry.
pub const MAX_CREDIT_HOURS: u32 = 12;

/// One completed course attempt from a student's academic history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeRecord {
    pub course_id: Uuid,
    pub course_code: String,
    pub course_name: LocalizedText,
    pub credit_hours: u32,
    pub letter_grade: LetterGrade,
    pub percentage: Option<f64>,
    pub points: f64,
    pub semester: String,
    pub academic_year: String,
    pub level: i32,
}

impl GradeRecord {
    /// Checks the record against the grade scale.
    pub fn validate(&self) -> Result<(), RecordError> {
        if self.credit_hours == 0 {
            return Err(RecordError::ZeroCreditHours(self.course_code.clone()));
        }
        if self.credit_hours > MAX_CREDIT_HOURS {
            return Err(RecordError::CreditHoursOutOfRange {
                course_code: self.course_code.clone(),
                credit_hours: self.credit_hours,
                max: MAX_CREDIT_HOURS,
            });
        }
        if !(1..=8).contains(&self.level) {
            return Err(RecordError::LevelOutOfRange {
                course_code: self.course_code.clone(),
                level: self.level,
            });
        }

        let expected = grading::letter_grade_to_points(self.letter_grade);
        if (self.points - expected).abs() > f64::EPSILON {
            return Err(RecordError::PointsMismatch {
                course_code: self.course_code.clone(),
                letter_grade: self.letter_grade.to_string(),
                points: self.points,
                expected,
            });
        }

        if let Some(percentage) = self.percentage {
            if !grading::band_for(self.letter_grade).contains(percentage) {
                return Err(RecordError::PercentageOutOfBand {
                    course_code: self.course_code.clone(),
                    letter_grade: self.letter_grade.to_string(),
                    percentage,
                });
            }
        }

        Ok(())
    }

    /// `(academic_year, semester)` key used to group records by term.
    pub fn term(&self) -> (&str, &str) {
        (&self.academic_year, &self.semester)
    }
}

/// Serialized as its `{ "ar", "en" }` label pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "LocalizedText", try_from = "LocalizedText")]
pub enum AcademicStatus {
    NoData,
    Excellent,
    VeryGood,
    GoodPlus,
    Good,
    AcceptablePlus,
    Acceptable,
    Weak,
    AcademicWarning,
}

impl AcademicStatus {
    pub const ALL: [AcademicStatus; 9] = [
        AcademicStatus::NoData,
        AcademicStatus::Excellent,
        AcademicStatus::VeryGood,
        AcademicStatus::GoodPlus,
        AcademicStatus::Good,
        AcademicStatus::AcceptablePlus,
        AcademicStatus::Acceptable,
        AcademicStatus::Weak,
        AcademicStatus::AcademicWarning,
    ];

    pub fn label_en(self) -> &'static str {
        match self {
            AcademicStatus::NoData => "No Data",
            AcademicStatus::Excellent => "Excellent",
            AcademicStatus::VeryGood => "Very Good",
            AcademicStatus::GoodPlus => "Good Plus",
            AcademicStatus::Good => "Good",
            AcademicStatus::AcceptablePlus => "Acceptable Plus",
            AcademicStatus::Acceptable => "Acceptable",
            AcademicStatus::Weak => "Weak",
            AcademicStatus::AcademicWarning => "Academic Warning",
        }
    }

    pub fn label_ar(self) -> &'static str {
        match self {
            AcademicStatus::NoData => "لا توجد بيانات",
            AcademicStatus::Excellent => "ممتاز",
            AcademicStatus::VeryGood => "جيد جداً",
            AcademicStatus::GoodPlus => "جيد مرتفع",
            AcademicStatus::Good => "جيد",
            AcademicStatus::AcceptablePlus => "مقبول مرتفع",
            AcademicStatus::Acceptable => "مقبول",
            AcademicStatus::Weak => "ضعيف",
            AcademicStatus::AcademicWarning => "إنذار أكاديمي",
        }
    }
}

impl From<AcademicStatus> for LocalizedText {
    fn from(status: AcademicStatus) -> Self {
        LocalizedText::new(status.label_ar(), status.label_en())
    }
}

impl TryFrom<LocalizedText> for AcademicStatus {
    type Error = String;

    fn try_from(text: LocalizedText) -> Result<Self, Self::Error> {
        AcademicStatus::ALL
            .into_iter()
            .find(|status| status.label_en() == text.en || status.label_ar() == text.ar)
            .ok_or_else(|| format!("unknown academic status: {}", text.en))
    }
}

impl fmt::Display for AcademicStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label_en())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GpaCalculation {
    pub gpa: f64,
    pub semester_gpa: f64,
    pub total_hours_registered: u32,
    pub total_hours_passed: u32,
    pub total_hours_failed: u32,
    pub total_points: f64,
    pub academic_status: AcademicStatus,
    pub completion_percentage: f64,
    pub remaining_hours: u32,
}

impl GpaCalculation {
    pub fn academic_status_ar(&self) -> &'static str {
        self.academic_status.label_ar()
    }
}

/// Per-term row of a transcript.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TermSummary {
    pub academic_year: String,
    pub semester: String,
    pub gpa: f64,
    pub hours_registered: u32,
    pub hours_passed: u32,
    pub course_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    Pending,
    Approved,
    Rejected,
}

impl RegistrationStatus {
    /// Value stored in the `registrations.status` column.
    pub fn label(self) -> &'static str {
        match self {
            RegistrationStatus::Pending => "pending",
            RegistrationStatus::Approved => "approved",
            RegistrationStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for RegistrationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(RegistrationStatus::Pending),
            "approved" => Ok(RegistrationStatus::Approved),
            "rejected" => Ok(RegistrationStatus::Rejected),
            other => Err(format!("unknown registration status: {other}")),
        }
    }
}

/// A course the student is registered in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub course_id: Uuid,
    pub course_code: String,
    pub course_name: LocalizedText,
    pub credit_hours: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Weekday {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
}

impl Weekday {
    pub const ALL: [Weekday; 5] = [
        Weekday::Sunday,
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
    ];

    pub fn label(self) -> LocalizedText {
        let (ar, en) = match self {
            Weekday::Sunday => ("الأحد", "Sunday"),
            Weekday::Monday => ("الاثنين", "Monday"),
            Weekday::Tuesday => ("الثلاثاء", "Tuesday"),
            Weekday::Wednesday => ("الأربعاء", "Wednesday"),
            Weekday::Thursday => ("الخميس", "Thursday"),
        };
        LocalizedText::new(ar, en)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TimeSlot {
    #[serde(rename = "08:00-09:30")]
    First,
    #[serde(rename = "09:45-11:15")]
    Second,
    #[serde(rename = "11:30-13:00")]
    Third,
    #[serde(rename = "13:15-14:45")]
    Fourth,
    #[serde(rename = "15:00-16:30")]
    Fifth,
}

impl TimeSlot {
    pub const ALL: [TimeSlot; 5] = [
        TimeSlot::First,
        TimeSlot::Second,
        TimeSlot::Third,
        TimeSlot::Fourth,
        TimeSlot::Fifth,
    ];

    pub fn range(self) -> &'static str {
        match self {
            TimeSlot::First => "08:00-09:30",
            TimeSlot::Second => "09:45-11:15",
            TimeSlot::Third => "11:30-13:00",
            TimeSlot::Fourth => "13:15-14:45",
            TimeSlot::Fifth => "15:00-16:30",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleSlot {
    pub day: Weekday,
    pub time: TimeSlot,
    pub course_code: String,
    pub course_name: LocalizedText,
    pub building: String,
    pub room: String,
    pub color: &'static str,
    pub credit_hours: u32,
}

/// Sessions of a course that found no free slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnplacedSession {
    pub course_code: String,
    pub missing_sessions: u32,
}
