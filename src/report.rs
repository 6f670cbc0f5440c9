use std::fmt::Write;

use chrono::NaiveDateTime;

use crate::models::{ClassTour, PeakHours, SignInViewModel};
use crate::peak_hours;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

fn counted(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {plural}")
    }
}

pub fn tours_in_window<'a>(
    tours: &'a [ClassTour],
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Vec<&'a ClassTour> {
    let mut tours: Vec<&ClassTour> = tours
        .iter()
        .filter(|t| t.day_visited >= start.date() && t.day_visited <= end.date())
        .collect();
    tours.sort_by(|a, b| a.day_visited.cmp(&b.day_visited).then(a.id.cmp(&b.id)));
    tours
}

pub fn build_report(
    start: NaiveDateTime,
    end: NaiveDateTime,
    hours: &[PeakHours],
    visits: &[SignInViewModel],
    tours: &[ClassTour],
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Tutoring Center Report");
    let _ = writeln!(
        output,
        "Visits from {} to {}",
        start.format(TIME_FORMAT),
        end.format(TIME_FORMAT)
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Peak Hours");

    if hours.is_empty() {
        let _ = writeln!(output, "No visits recorded for this window.");
    } else {
        let _ = writeln!(output, "| Hour | Visits |");
        let _ = writeln!(output, "|------|--------|");
        for bucket in hours.iter() {
            if !bucket.is_recognized() {
                tracing::warn!(count = bucket.count, "skipping unrecognized hour bucket");
                continue;
            }
            let _ = writeln!(output, "| {} | {} |", bucket.label(), bucket.count);
        }
        if let Some(top) = peak_hours::busiest(hours) {
            let _ = writeln!(output);
            let _ = writeln!(
                output,
                "Busiest hour: {} ({})",
                top.label(),
                counted(top.count, "visit", "visits")
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Visits");

    // Hour buckets cover the whole window; `visits` may be a single page.
    let total: usize = hours.iter().map(|h| h.count).sum::<usize>().max(visits.len());
    if total == 0 {
        let _ = writeln!(output, "No visits recorded for this window.");
    } else {
        let tutoring = visits.iter().filter(|v| v.tutoring).count();
        if visits.len() < total {
            let _ = writeln!(
                output,
                "Showing {} of {} visits ({} listed for tutoring).",
                visits.len(),
                total,
                tutoring
            );
        } else {
            let _ = writeln!(
                output,
                "{}, {} for tutoring.",
                counted(total, "visit", "visits"),
                tutoring
            );
        }
        for visit in visits.iter() {
            let out_time = visit
                .out_time
                .map(|t| t.format(TIME_FORMAT).to_string())
                .unwrap_or_else(|| "still signed in".to_string());
            let _ = writeln!(
                output,
                "- {} ({}, {}) in {} out {}{}",
                visit.full_name,
                visit.email,
                visit.semester_name,
                visit.in_time.format(TIME_FORMAT),
                out_time,
                if visit.tutoring { " [tutoring]" } else { "" }
            );
        }
    }

    let tours = tours_in_window(tours, start, end);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Class Tours");

    if tours.is_empty() {
        let _ = writeln!(output, "No class tours recorded for this window.");
    } else {
        let students: i32 = tours.iter().map(|t| t.number_of_students).sum();
        let _ = writeln!(
            output,
            "{} brought {}.",
            counted(tours.len(), "tour", "tours"),
            counted(students.max(0) as usize, "student", "students")
        );
        for tour in tours.iter() {
            let _ = writeln!(
                output,
                "- {} on {}: {}",
                tour.name,
                tour.day_visited,
                counted(tour.number_of_students.max(0) as usize, "student", "students")
            );
        }
    }

    output
}
