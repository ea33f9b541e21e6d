use std::fmt::Write;

use chrono::NaiveDate;

use crate::models::{GpaCalculation, ScheduleSlot, TermSummary, TimeSlot, Weekday};
use crate::schedule::ScheduleOutcome;

/// Markdown academic report for one student.
pub fn build_report(
    student_label: &str,
    generated_on: NaiveDate,
    gpa: &GpaCalculation,
    terms: &[TermSummary],
    schedule: &ScheduleOutcome,
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Academic Report");
    let _ = writeln!(output, "Generated for {} on {}", student_label, generated_on);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Standing");
    let _ = writeln!(
        output,
        "- Cumulative GPA: {:.2} / 5.00 ({} / {})",
        gpa.gpa,
        gpa.academic_status.label_en(),
        gpa.academic_status.label_ar()
    );
    let _ = writeln!(output, "- Semester GPA: {:.2}", gpa.semester_gpa);
    let _ = writeln!(
        output,
        "- Hours: {} registered, {} passed, {} failed",
        gpa.total_hours_registered, gpa.total_hours_passed, gpa.total_hours_failed
    );
    let _ = writeln!(
        output,
        "- Progress: {:.2}% complete, {} hours remaining",
        gpa.completion_percentage, gpa.remaining_hours
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Terms");

    if terms.is_empty() {
        let _ = writeln!(output, "No grade records on file.");
    } else {
        let _ = writeln!(output, "| Year | Semester | Courses | Hours | Passed | GPA |");
        let _ = writeln!(output, "|---|---|---|---|---|---|");
        for term in terms {
            let _ = writeln!(
                output,
                "| {} | {} | {} | {} | {} | {:.2} |",
                term.academic_year,
                term.semester,
                term.course_count,
                term.hours_registered,
                term.hours_passed,
                term.gpa
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Weekly Schedule");

    if schedule.slots().is_empty() {
        let _ = writeln!(output, "No approved registrations.");
    } else {
        output.push_str(&schedule_grid(schedule.slots()));
    }

    if !schedule.unplaced().is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Unplaced Sessions");
        for session in schedule.unplaced() {
            let _ = writeln!(
                output,
                "- {}: {} session(s) without a free slot",
                session.course_code, session.missing_sessions
            );
        }
    }

    output
}

/// Markdown table with one row per time range and one column per day.
pub fn schedule_grid(slots: &[ScheduleSlot]) -> String {
    let mut output = String::new();

    let _ = write!(output, "| Time |");
    for day in Weekday::ALL {
        let _ = write!(output, " {} |", day.label().en);
    }
    let _ = writeln!(output);
    let _ = writeln!(output, "|---|{}", "---|".repeat(Weekday::ALL.len()));

    for time in TimeSlot::ALL {
        let _ = write!(output, "| {} |", time.range());
        for day in Weekday::ALL {
            match slots.iter().find(|slot| slot.day == day && slot.time == time) {
                Some(slot) => {
                    let _ = write!(output, " {} ({}) |", slot.course_code, slot.room);
                }
                None => {
                    let _ = write!(output, " |");
                }
            }
        }
        let _ = writeln!(output);
    }

    output
}
