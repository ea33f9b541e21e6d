use std::collections::HashSet;

use proptest::prelude::*;
use registration_academics::grading;
use registration_academics::models::{Course, GradeRecord, LetterGrade, LocalizedText};
use registration_academics::schedule::{sessions_per_week, SLOT_UNITS};
use registration_academics::{calculate_gpa, generate_schedule};
use uuid::Uuid;

fn letter_grade() -> impl Strategy<Value = LetterGrade> {
    prop::sample::select(LetterGrade::ALL.to_vec())
}

fn course_code() -> impl Strategy<Value = String> {
    (
        prop::sample::select(vec!["CIS", "MIS", "IS", "MGT", "MKT", "ACCT", "FIN", "ENG", "MATH"]),
        100u32..500,
    )
        .prop_map(|(prefix, number)| format!("{prefix} {number}"))
}

fn courses() -> impl Strategy<Value = Vec<Course>> {
    prop::collection::vec((course_code(), 1u32..=4), 0..20).prop_map(|rows| {
        rows.into_iter()
            .map(|(code, credit_hours)| Course {
                course_id: Uuid::new_v4(),
                course_name: LocalizedText::new(code.clone(), code.clone()),
                course_code: code,
                credit_hours,
            })
            .collect()
    })
}

fn grade_records() -> impl Strategy<Value = Vec<GradeRecord>> {
    prop::collection::vec((letter_grade(), 1u32..=4, 1i32..=8), 1..40).prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (letter_grade, credit_hours, level))| GradeRecord {
                course_id: Uuid::new_v4(),
                course_code: format!("CIS {i}"),
                course_name: LocalizedText::new("مقرر", "Course"),
                credit_hours,
                letter_grade,
                percentage: None,
                points: grading::letter_grade_to_points(letter_grade),
                semester: "1".to_string(),
                academic_year: "2024-2025".to_string(),
                level,
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn percentage_maps_to_its_band(percentage in 0.0f64..=100.0) {
        let (expected, points) = match percentage.floor() as u32 {
            95..=100 => (LetterGrade::APlus, 5.0),
            90..=94 => (LetterGrade::A, 4.75),
            85..=89 => (LetterGrade::BPlus, 4.5),
            80..=84 => (LetterGrade::B, 4.0),
            75..=79 => (LetterGrade::CPlus, 3.5),
            70..=74 => (LetterGrade::C, 3.0),
            65..=69 => (LetterGrade::DPlus, 2.5),
            60..=64 => (LetterGrade::D, 2.0),
            _ => (LetterGrade::F, 1.0),
        };
        let letter_grade = grading::percentage_to_letter_grade(percentage);
        prop_assert_eq!(letter_grade, expected);
        prop_assert_eq!(grading::letter_grade_to_points(letter_grade), points);
    }

    #[test]
    fn out_of_range_percentage_is_failing(percentage in prop_oneof![-1000.0f64..-0.001, 100.001f64..1000.0]) {
        prop_assert_eq!(grading::percentage_to_letter_grade(percentage), LetterGrade::F);
    }

    #[test]
    fn gpa_stays_on_scale(grades in grade_records()) {
        let result = calculate_gpa(&grades);
        prop_assert!(result.gpa >= 1.0 && result.gpa <= 5.0);
        prop_assert_eq!(
            result.total_hours_passed + result.total_hours_failed,
            result.total_hours_registered
        );
        prop_assert!(result.completion_percentage >= 0.0 && result.completion_percentage <= 100.0);
        prop_assert_eq!(result.remaining_hours, 130u32.saturating_sub(result.total_hours_passed));
    }

    #[test]
    fn schedule_never_double_books(courses in courses()) {
        let outcome = generate_schedule(&courses);
        let slots = outcome.slots();
        prop_assert!(slots.len() <= SLOT_UNITS);

        let cells: HashSet<_> = slots.iter().map(|slot| (slot.day, slot.time)).collect();
        prop_assert_eq!(cells.len(), slots.len());

        let requested: u32 = courses.iter().map(|c| sessions_per_week(c.credit_hours)).sum();
        let missing: u32 = outcome.unplaced().iter().map(|u| u.missing_sessions).sum();
        prop_assert_eq!(slots.len() as u32 + missing, requested);
        prop_assert_eq!(outcome.is_complete(), missing == 0);
    }

    #[test]
    fn schedule_places_every_session_when_room_remains(courses in courses()) {
        let requested: u32 = courses.iter().map(|c| sessions_per_week(c.credit_hours)).sum();
        prop_assume!(requested as usize <= SLOT_UNITS);

        let outcome = generate_schedule(&courses);
        prop_assert!(outcome.is_complete());
        for (index, course) in courses.iter().enumerate() {
            let placed = outcome
                .slots()
                .iter()
                .filter(|slot| slot.course_code == course.course_code)
                .count();
            // duplicate codes share a count, so only check unique ones
            if courses.iter().filter(|c| c.course_code == course.course_code).count() == 1 {
                prop_assert_eq!(placed as u32, sessions_per_week(course.credit_hours), "course {}", index);
            }
        }
    }
}
