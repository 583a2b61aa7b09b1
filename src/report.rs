use std::fmt::Write;

use chrono::NaiveDate;

use crate::models::{DashboardStats, GradeAverage, PerformanceAnalysis, Student};
use crate::state::{Dashboard, Overlay};
use crate::stats::{self, AttendanceBand, GpaBand};

pub const EMPTY_DIRECTORY: &str = "No students found matching your search.";

pub fn stat_cards(stats: &DashboardStats) -> Vec<(&'static str, String)> {
    vec![
        ("Total Students", stats.total_students.to_string()),
        ("Avg. GPA", format!("{:.2}", stats.average_gpa)),
        ("Avg. Attendance", format!("{:.1}%", stats.average_attendance)),
        ("Active Status", stats.active_students.to_string()),
    ]
}

fn gpa_label(gpa: f64) -> String {
    match stats::gpa_band(gpa) {
        GpaBand::High => format!("{gpa:.2} (high)"),
        GpaBand::Standard => format!("{gpa:.2}"),
        GpaBand::Low => format!("{gpa:.2} (low)"),
    }
}

fn attendance_label(attendance: u8) -> String {
    let band = match stats::attendance_band(attendance) {
        AttendanceBand::Good => "good",
        AttendanceBand::Fair => "fair",
        AttendanceBand::Poor => "poor",
    };
    format!("{attendance}% ({band})")
}

pub fn directory_table(rows: &[&Student]) -> String {
    let mut output = String::new();

    if rows.is_empty() {
        let _ = writeln!(output, "{EMPTY_DIRECTORY}");
        return output;
    }

    let _ = writeln!(output, "| Student | Email | Grade | GPA | Attendance | Status |");
    let _ = writeln!(output, "|---|---|---|---|---|---|");
    for student in rows {
        let _ = writeln!(
            output,
            "| {} | {} | Grade {} | {} | {} | {} |",
            student.name,
            student.email,
            student.grade_level,
            gpa_label(student.gpa),
            attendance_label(student.attendance),
            student.status
        );
    }
    output
}

pub fn grade_section(grades: &[GradeAverage]) -> String {
    let mut output = String::new();
    if grades.is_empty() {
        let _ = writeln!(output, "No students enrolled.");
        return output;
    }
    for grade in grades {
        let _ = writeln!(
            output,
            "- Grade {}: {:.2} across {} students",
            grade.grade_level, grade.average_gpa, grade.student_count
        );
    }
    output
}

fn analysis_section(output: &mut String, analysis: &PerformanceAnalysis) {
    let _ = writeln!(output, "### Assessment Summary");
    let _ = writeln!(output, "{}", analysis.summary);
    let _ = writeln!(output);

    let _ = writeln!(output, "### Key Strengths");
    for item in &analysis.strengths {
        let _ = writeln!(output, "- {item}");
    }
    let _ = writeln!(output);

    let _ = writeln!(output, "### Improvements");
    for item in &analysis.areas_for_improvement {
        let _ = writeln!(output, "- {item}");
    }
    let _ = writeln!(output);

    let _ = writeln!(output, "### Educator Recommendations");
    for (i, rec) in analysis.recommendations.iter().enumerate() {
        let _ = writeln!(output, "{}. {}", i + 1, rec);
    }
}

pub fn overlay_section(overlay: &Overlay) -> Option<String> {
    let student = match overlay {
        Overlay::Closed => return None,
        Overlay::Loading { student, .. }
        | Overlay::Ready { student, .. }
        | Overlay::Failed { student } => student,
    };

    let mut output = String::new();
    let _ = writeln!(output, "## AI Performance Insight");
    let _ = writeln!(
        output,
        "{} (Grade {} • GPA {})",
        student.name, student.grade_level, student.gpa
    );
    let _ = writeln!(output);

    match overlay {
        Overlay::Loading { .. } => {
            let _ = writeln!(output, "Analysis in progress...");
        }
        Overlay::Ready { analysis, .. } => analysis_section(&mut output, analysis),
        Overlay::Failed { .. } => {
            let _ = writeln!(output, "Failed to generate analysis. Please try again.");
        }
        Overlay::Closed => {}
    }
    Some(output)
}

pub fn build_report(dashboard: &Dashboard, generated_on: NaiveDate) -> String {
    let mut output = String::new();
    let query = dashboard.query();

    let _ = writeln!(output, "# Student Dashboard Report");
    let _ = writeln!(output, "Generated on {generated_on}");
    let _ = writeln!(output);
    let _ = writeln!(output, "## Overview");
    for (label, value) in stat_cards(&dashboard.stats()) {
        let _ = writeln!(output, "- {label}: {value}");
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Avg GPA by Grade");
    output.push_str(&grade_section(&dashboard.grade_averages()));

    let _ = writeln!(output);
    if query.is_empty() {
        let _ = writeln!(output, "## Student Directory");
    } else {
        let _ = writeln!(output, "## Student Directory (matching \"{query}\")");
    }
    output.push_str(&directory_table(&dashboard.visible()));

    if let Some(section) = overlay_section(dashboard.overlay()) {
        let _ = writeln!(output);
        output.push_str(&section);
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster;
    use crate::state::{Action, SystemClock};

    fn dashboard() -> Dashboard {
        Dashboard::new(roster::seed().unwrap(), Box::new(SystemClock))
    }

    #[test]
    fn stat_cards_use_dashboard_formatting() {
        let cards = stat_cards(&dashboard().stats());
        assert_eq!(
            cards,
            vec![
                ("Total Students", "6".to_string()),
                ("Avg. GPA", "3.22".to_string()),
                ("Avg. Attendance", "88.5%".to_string()),
                ("Active Status", "5".to_string()),
            ]
        );
    }

    #[test]
    fn directory_rows_carry_bands() {
        let students = roster::seed().unwrap();
        let rows: Vec<&Student> = students.iter().collect();
        let table = directory_table(&rows);
        assert!(table.contains(
            "| Elena Rodriguez | elena.r@school.edu | Grade 10 | 1.85 (low) | 65% (poor) | Inactive |"
        ));
        assert!(table.contains("| James Wilson | james.w@school.edu | Grade 11 | 2.90 | 84% (fair) | Active |"));
        assert_eq!(directory_table(&[]), format!("{EMPTY_DIRECTORY}\n"));
    }

    #[test]
    fn report_includes_filter_and_insight() {
        let mut dash = dashboard();
        dash.dispatch(Action::FilterChanged("elena".into())).unwrap();
        dash.dispatch(Action::AnalysisRequested {
            student_id: "5".into(),
        })
        .unwrap();
        dash.dispatch(Action::AnalysisResolved {
            seq: 1,
            analysis: PerformanceAnalysis {
                summary: "Attendance is the main risk.".into(),
                strengths: vec!["Engaged in class".into()],
                areas_for_improvement: vec!["Attendance".into()],
                recommendations: vec!["Weekly check-in".into(), "Family meeting".into()],
            },
        })
        .unwrap();

        let date = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
        let report = build_report(&dash, date);

        assert!(report.starts_with("# Student Dashboard Report\nGenerated on 2026-10-17\n"));
        assert!(report.contains("- Avg. GPA: 3.22\n"));
        assert!(report.contains("- Grade 12: 4.00 across 1 students\n"));
        assert!(report.contains("## Student Directory (matching \"elena\")"));
        assert!(!report.contains("Alice Thompson"));
        assert!(report.contains("Elena Rodriguez (Grade 10 • GPA 1.85)"));
        assert!(report.contains("### Key Strengths\n- Engaged in class\n"));
        assert!(report.contains("1. Weekly check-in\n2. Family meeting\n"));
    }

    #[test]
    fn failed_overlay_renders_notice() {
        let mut dash = dashboard();
        dash.dispatch(Action::AnalysisRequested {
            student_id: "2".into(),
        })
        .unwrap();
        dash.dispatch(Action::AnalysisFailed { seq: 1 }).unwrap();

        let section = overlay_section(dash.overlay()).unwrap();
        assert!(section.contains("Failed to generate analysis. Please try again."));

        dash.dispatch(Action::OverlayClosed).unwrap();
        assert_eq!(overlay_section(dash.overlay()), None);
    }
}
