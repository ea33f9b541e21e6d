//! Greedy placement of registered courses into the weekly grid.
//!
//! Each course gets one session per week, or two when it carries three or
//! more credit hours. Courses start on a round-robin day and take the first
//! free time on that day, moving to the following day for their next
//! session. No two placed sessions share a `(day, time)` cell. Sessions that
//! find no free cell are reported instead of silently dropped.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, warn};

use crate::models::{Course, ScheduleSlot, TimeSlot, UnplacedSession, Weekday};

pub const SLOT_UNITS: usize = Weekday::ALL.len() * TimeSlot::ALL.len();

pub const PALETTE: [&str; 12] = [
    "#3B82F6", "#10B981", "#F59E0B", "#EF4444", "#8B5CF6", "#EC4899", "#14B8A6", "#F97316",
    "#6366F1", "#84CC16", "#06B6D4", "#A855F7",
];

pub struct Building {
    pub name: &'static str,
    pub rooms: &'static [&'static str],
}

pub const IT_BUILDING: Building = Building {
    name: "IT Building",
    rooms: &["IT-101", "IT-102", "IT-201", "IT-202", "IT-Lab1", "IT-Lab2"],
};
pub const BUILDING_A: Building = Building {
    name: "Building A",
    rooms: &["A-101", "A-102", "A-103", "A-201", "A-202"],
};
pub const BUILDING_B: Building = Building {
    name: "Building B",
    rooms: &["B-101", "B-102", "B-201", "B-202"],
};
pub const BUILDING_C: Building = Building {
    name: "Building C",
    rooms: &["C-101", "C-102", "C-103", "C-201"],
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ScheduleOutcome {
    Scheduled { placed: Vec<ScheduleSlot> },
    PartiallyScheduled {
        placed: Vec<ScheduleSlot>,
        unplaced: Vec<UnplacedSession>,
    },
}

impl ScheduleOutcome {
    pub fn slots(&self) -> &[ScheduleSlot] {
        match self {
            ScheduleOutcome::Scheduled { placed } => placed,
            ScheduleOutcome::PartiallyScheduled { placed, .. } => placed,
        }
    }

    pub fn unplaced(&self) -> &[UnplacedSession] {
        match self {
            ScheduleOutcome::Scheduled { .. } => &[],
            ScheduleOutcome::PartiallyScheduled { unplaced, .. } => unplaced,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, ScheduleOutcome::Scheduled { .. })
    }
}

pub fn sessions_per_week(credit_hours: u32) -> u32 {
    if credit_hours >= 3 {
        2
    } else {
        1
    }
}

/// Leading letters of a course code, uppercased: `"cis 101"` -> `"CIS"`.
pub fn course_prefix(course_code: &str) -> String {
    course_code
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

pub fn building_for(course_code: &str) -> &'static Building {
    match course_prefix(course_code).as_str() {
        "CIS" | "MIS" | "IS" => &IT_BUILDING,
        "MGT" | "MKT" => &BUILDING_A,
        "ACCT" | "FIN" => &BUILDING_B,
        _ => &BUILDING_C,
    }
}

pub fn generate_schedule(courses: &[Course]) -> ScheduleOutcome {
    let mut used: HashSet<(Weekday, TimeSlot)> = HashSet::with_capacity(SLOT_UNITS);
    let mut placed = Vec::new();
    let mut unplaced = Vec::new();

    for (course_index, course) in courses.iter().enumerate() {
        let needed = sessions_per_week(course.credit_hours);

        if used.len() >= SLOT_UNITS {
            unplaced.push(UnplacedSession {
                course_code: course.course_code.clone(),
                missing_sessions: needed,
            });
            continue;
        }

        let building = building_for(&course.course_code);
        let room = building.rooms[course_index % building.rooms.len()];
        let color = PALETTE[course_index % PALETTE.len()];
        let mut day_index = course_index % Weekday::ALL.len();
        let mut missing = 0;

        for _ in 0..needed {
            match claim_next_free(&mut used, day_index) {
                Some((claimed_day, time)) => {
                    placed.push(ScheduleSlot {
                        day: Weekday::ALL[claimed_day],
                        time,
                        course_code: course.course_code.clone(),
                        course_name: course.course_name.clone(),
                        building: building.name.to_string(),
                        room: room.to_string(),
                        color,
                        credit_hours: course.credit_hours,
                    });
                    day_index = (claimed_day + 1) % Weekday::ALL.len();
                }
                None => missing += 1,
            }
        }

        if missing > 0 {
            warn!(course = %course.course_code, missing, "no free slot for session");
            unplaced.push(UnplacedSession {
                course_code: course.course_code.clone(),
                missing_sessions: missing,
            });
        }
    }

    debug!(placed = placed.len(), unplaced = unplaced.len(), "schedule generated");

    if unplaced.is_empty() {
        ScheduleOutcome::Scheduled { placed }
    } else {
        ScheduleOutcome::PartiallyScheduled { placed, unplaced }
    }
}

/// Scans days from `start_day`, wrapping around, and claims the first free
/// time on the first day that has one. Returns the claimed day index.
fn claim_next_free(
    used: &mut HashSet<(Weekday, TimeSlot)>,
    start_day: usize,
) -> Option<(usize, TimeSlot)> {
    for offset in 0..Weekday::ALL.len() {
        let day_index = (start_day + offset) % Weekday::ALL.len();
        let day = Weekday::ALL[day_index];
        for time in TimeSlot::ALL {
            if used.insert((day, time)) {
                return Some((day_index, time));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LocalizedText;
    use uuid::Uuid;

    fn course(code: &str, credit_hours: u32) -> Course {
        Course {
            course_id: Uuid::new_v4(),
            course_code: code.to_string(),
            course_name: LocalizedText::new(code, code),
            credit_hours,
        }
    }

    fn slots_for<'a>(outcome: &'a ScheduleOutcome, code: &str) -> Vec<&'a ScheduleSlot> {
        outcome
            .slots()
            .iter()
            .filter(|slot| slot.course_code == code)
            .collect()
    }

    #[test]
    fn empty_input_yields_empty_schedule() {
        let outcome = generate_schedule(&[]);
        assert!(outcome.is_complete());
        assert!(outcome.slots().is_empty());
    }

    #[test]
    fn session_count_follows_credit_hours() {
        let outcome = generate_schedule(&[course("CIS 101", 3), course("MKT 110", 2)]);
        assert!(outcome.is_complete());
        assert_eq!(slots_for(&outcome, "CIS 101").len(), 2);
        assert_eq!(slots_for(&outcome, "MKT 110").len(), 1);
    }

    #[test]
    fn two_sessions_land_on_consecutive_days() {
        let outcome = generate_schedule(&[course("FIN 301", 4)]);
        let slots = slots_for(&outcome, "FIN 301");
        assert_eq!(slots[0].day, Weekday::Sunday);
        assert_eq!(slots[0].time, TimeSlot::First);
        assert_eq!(slots[1].day, Weekday::Monday);
        assert_eq!(slots[1].time, TimeSlot::First);
    }

    #[test]
    fn start_day_round_robins_across_courses() {
        let outcome = generate_schedule(&[course("IS 100", 1), course("IS 110", 1)]);
        assert_eq!(outcome.slots()[0].day, Weekday::Sunday);
        assert_eq!(outcome.slots()[1].day, Weekday::Monday);
    }

    #[test]
    fn building_and_room_follow_prefix() {
        assert_eq!(building_for("cis101").name, "IT Building");
        assert_eq!(building_for("MGT 210").name, "Building A");
        assert_eq!(building_for("ACCT 201").name, "Building B");
        assert_eq!(building_for("ENG 101").name, "Building C");
        assert_eq!(building_for("ISE 300").name, "Building C");

        let outcome = generate_schedule(&[course("ENG 101", 1), course("ACCT 201", 1)]);
        assert_eq!(outcome.slots()[0].room, "C-101");
        assert_eq!(outcome.slots()[1].building, "Building B");
        assert_eq!(outcome.slots()[1].room, "B-102");
    }

    #[test]
    fn colors_cycle_through_palette() {
        let courses: Vec<Course> = (0..13).map(|i| course(&format!("ENG {i}"), 1)).collect();
        let outcome = generate_schedule(&courses);
        assert_eq!(outcome.slots()[0].color, PALETTE[0]);
        assert_eq!(outcome.slots()[12].color, PALETTE[0]);
    }

    #[test]
    fn overflow_is_reported_not_dropped() {
        let courses: Vec<Course> = (0..15).map(|i| course(&format!("CIS {i}"), 3)).collect();
        let outcome = generate_schedule(&courses);
        assert!(!outcome.is_complete());
        assert_eq!(outcome.slots().len(), SLOT_UNITS);

        let missing: u32 = outcome.unplaced().iter().map(|u| u.missing_sessions).sum();
        assert_eq!(missing, 30 - SLOT_UNITS as u32);

        let cells: HashSet<_> = outcome.slots().iter().map(|s| (s.day, s.time)).collect();
        assert_eq!(cells.len(), outcome.slots().len());
    }

    #[test]
    fn course_prefix_strips_digits_and_spaces() {
        assert_eq!(course_prefix(" mis310 "), "MIS");
        assert_eq!(course_prefix("101"), "");
    }
}
