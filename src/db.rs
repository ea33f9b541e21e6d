use std::path::Path;

use anyhow::Context;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::error::RecordError;
use crate::grading;
use crate::ingest;
use crate::models::{Course, GradeRecord, LetterGrade, LocalizedText, RegistrationStatus, Student};

/// Opens the pool, retrying with a linearly growing delay.
pub async fn connect_with_retry(config: &Config) -> anyhow::Result<PgPool> {
    let database_url = config.database_url()?;
    let attempts = config.connect_retries.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        match PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
        {
            Ok(pool) => {
                info!(attempt, "connected to registration database");
                return Ok(pool);
            }
            Err(err) if attempt < attempts => {
                let delay = config.retry_delay_for(attempt);
                warn!(attempt, attempts, %err, ?delay, "database connection failed, retrying");
                tokio::time::sleep(delay).await;
            }
            Err(err) => {
                error!(attempts, %err, "giving up on database connection");
                return Err(err).context("failed to connect to Postgres");
            }
        }
    }
}

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let students = vec![
        (
            Uuid::parse_str("6f1c2b8e-0d2a-4a55-9a43-1f7c3d2e9b10")?,
            "441100231",
            "Sara Al-Qahtani",
            3,
        ),
        (
            Uuid::parse_str("b24e7a91-5c3f-4d1e-8f0a-7e6d5c4b3a21")?,
            "441100457",
            "Faisal Al-Harbi",
            5,
        ),
    ];

    for (id, number, name, level) in students {
        sqlx::query(
            r#"
            INSERT INTO course_registration.students (id, student_number, full_name, level)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (student_number) DO UPDATE
            SET full_name = EXCLUDED.full_name, level = EXCLUDED.level
            "#,
        )
        .bind(id)
        .bind(number)
        .bind(name)
        .bind(level)
        .execute(pool)
        .await?;
    }

    let courses = vec![
        ("CIS 101", "مقدمة في نظم المعلومات", "Introduction to Information Systems", 3),
        ("MIS 210", "قواعد البيانات", "Database Systems", 3),
        ("MGT 101", "مبادئ الإدارة", "Principles of Management", 3),
        ("ACCT 101", "مبادئ المحاسبة", "Principles of Accounting", 3),
        ("ENG 102", "اللغة الإنجليزية", "English Language", 2),
    ];
    for (code, name_ar, name_en, hours) in courses {
        upsert_course(pool, code, name_ar, name_en, hours).await?;
    }

    let grades = vec![
        ("seed-g-001", "441100231", "CIS 101", "A", Some(91.0), "1", "2024-2025", 1),
        ("seed-g-002", "441100231", "MGT 101", "B+", Some(86.5), "1", "2024-2025", 1),
        ("seed-g-003", "441100231", "ENG 102", "C", None, "2", "2024-2025", 2),
        ("seed-g-004", "441100457", "ACCT 101", "F", Some(48.0), "1", "2024-2025", 1),
        ("seed-g-005", "441100457", "CIS 101", "D+", Some(66.0), "2", "2024-2025", 2),
    ];
    for (source_key, number, code, letter, percentage, semester, year, level) in grades {
        sqlx::query(
            r#"
            INSERT INTO course_registration.grade_records
            (id, student_id, course_id, letter_grade, percentage, semester, academic_year, level, source_key)
            SELECT $1, s.id, c.id, $4, $5, $6, $7, $8, $9
            FROM course_registration.students s, course_registration.courses c
            WHERE s.student_number = $2 AND c.code = $3
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(number)
        .bind(code)
        .bind(letter)
        .bind(percentage)
        .bind(semester)
        .bind(year)
        .bind(level)
        .bind(source_key)
        .execute(pool)
        .await?;
    }

    let registrations = vec![
        ("441100231", "MIS 210", RegistrationStatus::Approved),
        ("441100231", "ACCT 101", RegistrationStatus::Approved),
        ("441100231", "ENG 102", RegistrationStatus::Pending),
        ("441100457", "MGT 101", RegistrationStatus::Approved),
    ];
    for (number, code, status) in registrations {
        sqlx::query(
            r#"
            INSERT INTO course_registration.registrations (id, student_id, course_id, status)
            SELECT $1, s.id, c.id, $4
            FROM course_registration.students s, course_registration.courses c
            WHERE s.student_number = $2 AND c.code = $3
            ON CONFLICT (student_id, course_id) DO UPDATE SET status = EXCLUDED.status
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(number)
        .bind(code)
        .bind(status.label())
        .execute(pool)
        .await?;
    }

    Ok(())
}

async fn upsert_course(
    pool: &PgPool,
    code: &str,
    name_ar: &str,
    name_en: &str,
    credit_hours: i32,
) -> anyhow::Result<Uuid> {
    let id: Uuid = sqlx::query(
        r#"
        INSERT INTO course_registration.courses (id, code, name_ar, name_en, credit_hours)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (code) DO UPDATE
        SET name_ar = EXCLUDED.name_ar, name_en = EXCLUDED.name_en,
            credit_hours = EXCLUDED.credit_hours
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(code)
    .bind(name_ar)
    .bind(name_en)
    .bind(credit_hours)
    .fetch_one(pool)
    .await?
    .get("id");
    Ok(id)
}

/// Outcome of a grade import.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub inserted: usize,
    pub rejected: usize,
}

pub async fn import_grades_csv(pool: &PgPool, csv_path: &Path) -> anyhow::Result<ImportSummary> {
    let rows = ingest::read_grade_rows(csv_path)
        .with_context(|| format!("failed to read {}", csv_path.display()))?;
    let mut summary = ImportSummary::default();

    for (index, row) in rows.into_iter().enumerate() {
        // validate before touching the database
        if let Err(err) = row.to_record(Uuid::nil()) {
            warn!(row = index + 1, %err, "rejecting grade row");
            summary.rejected += 1;
            continue;
        }

        let student_id: Uuid = sqlx::query(
            r#"
            INSERT INTO course_registration.students (id, student_number, full_name, level)
            VALUES ($1, $2, $2, $3)
            ON CONFLICT (student_number) DO UPDATE
            SET level = GREATEST(course_registration.students.level, EXCLUDED.level)
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(row.student_number.trim())
        .bind(row.level)
        .fetch_one(pool)
        .await?
        .get("id");

        let course_id = upsert_course(
            pool,
            row.course_code.trim(),
            row.course_name_ar.trim(),
            row.course_name_en.trim(),
            i32::try_from(row.credit_hours).context("credit hours out of range")?,
        )
        .await?;

        let source_key = row
            .source_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        let result = sqlx::query(
            r#"
            INSERT INTO course_registration.grade_records
            (id, student_id, course_id, letter_grade, percentage, semester, academic_year, level, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(student_id)
        .bind(course_id)
        .bind(row.letter_grade.trim().to_ascii_uppercase())
        .bind(row.percentage)
        .bind(row.semester.trim())
        .bind(row.academic_year.trim())
        .bind(row.level)
        .bind(source_key)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            summary.inserted += 1;
        }
    }

    info!(inserted = summary.inserted, rejected = summary.rejected, "grade import finished");
    Ok(summary)
}

pub async fn fetch_student(pool: &PgPool, student_number: &str) -> anyhow::Result<Student> {
    let row = sqlx::query(
        "SELECT id, student_number, full_name, level \
         FROM course_registration.students WHERE student_number = $1",
    )
    .bind(student_number)
    .fetch_optional(pool)
    .await?
    .with_context(|| format!("no student with number {student_number}"))?;

    Ok(Student {
        id: row.get("id"),
        student_number: row.get("student_number"),
        full_name: row.get("full_name"),
        level: row.get("level"),
    })
}

/// Stored grade history for a student. Rows that fail validation are logged
/// and left out of the result.
pub async fn fetch_grade_records(
    pool: &PgPool,
    student_number: &str,
) -> anyhow::Result<Vec<GradeRecord>> {
    let rows = sqlx::query(
        "SELECT c.id AS course_id, c.code, c.name_ar, c.name_en, c.credit_hours, \
         g.letter_grade, g.percentage, g.semester, g.academic_year, g.level \
         FROM course_registration.grade_records g \
         JOIN course_registration.students s ON s.id = g.student_id \
         JOIN course_registration.courses c ON c.id = g.course_id \
         WHERE s.student_number = $1 \
         ORDER BY g.academic_year, g.semester, c.code",
    )
    .bind(student_number)
    .fetch_all(pool)
    .await?;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        match grade_record_from_row(&row) {
            Ok(record) => records.push(record),
            Err(err) => warn!(student = student_number, %err, "skipping stored grade record"),
        }
    }

    Ok(records)
}

fn grade_record_from_row(row: &PgRow) -> Result<GradeRecord, RecordError> {
    let code: String = row.get("code");
    let letter_grade: LetterGrade = row.get::<String, _>("letter_grade").parse()?;
    let credit_hours: i32 = row.get("credit_hours");

    let record = GradeRecord {
        course_id: row.get("course_id"),
        course_name: LocalizedText::new(row.get::<String, _>("name_ar"), row.get::<String, _>("name_en")),
        credit_hours: u32::try_from(credit_hours).unwrap_or(0),
        letter_grade,
        percentage: row.get("percentage"),
        points: grading::letter_grade_to_points(letter_grade),
        semester: row.get("semester"),
        academic_year: row.get("academic_year"),
        level: row.get("level"),
        course_code: code,
    };
    record.validate()?;
    Ok(record)
}

/// Approved registrations for one student, filtered in SQL so the
/// `(student_id, status)` index applies.
const APPROVED_COURSES_QUERY: &str = "SELECT c.id, c.code, c.name_ar, c.name_en, c.credit_hours \
     FROM course_registration.registrations r \
     JOIN course_registration.students s ON s.id = r.student_id \
     JOIN course_registration.courses c ON c.id = r.course_id \
     WHERE s.student_number = $1 AND r.status = $2 \
     ORDER BY r.requested_at, c.code";

/// Approved registrations in a stable order, so the generated schedule does
/// not change between runs.
pub async fn fetch_approved_courses(
    pool: &PgPool,
    student_number: &str,
) -> anyhow::Result<Vec<Course>> {
    let rows = sqlx::query(APPROVED_COURSES_QUERY)
        .bind(student_number)
        .bind(RegistrationStatus::Approved.label())
        .fetch_all(pool)
        .await?;

    let courses = rows
        .iter()
        .map(|row| {
            let credit_hours: i32 = row.get("credit_hours");
            Course {
                course_id: row.get("id"),
                course_code: row.get("code"),
                course_name: LocalizedText::new(row.get::<String, _>("name_ar"), row.get::<String, _>("name_en")),
                credit_hours: u32::try_from(credit_hours).unwrap_or(0),
            }
        })
        .collect();

    Ok(courses)
}
