use std::collections::BTreeMap;

use crate::models::{DashboardStats, GradeAverage, Student, StudentStatus};

pub fn compute_stats(students: &[Student]) -> DashboardStats {
    let total = students.len();
    let active = students
        .iter()
        .filter(|s| s.status == StudentStatus::Active)
        .count();

    DashboardStats {
        total_students: total,
        average_gpa: mean(students.iter().map(|s| s.gpa), total),
        average_attendance: mean(students.iter().map(|s| f64::from(s.attendance)), total),
        active_students: active,
    }
}

pub fn grade_averages(students: &[Student]) -> Vec<GradeAverage> {
    let mut map: BTreeMap<u8, (usize, f64)> = BTreeMap::new();

    for student in students {
        let entry = map.entry(student.grade_level).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += student.gpa;
    }

    map.into_iter()
        .map(|(grade_level, (count, total_gpa))| GradeAverage {
            grade_level,
            student_count: count,
            average_gpa: total_gpa / count as f64,
        })
        .collect()
}

fn mean(values: impl Iterator<Item = f64>, count: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }
    values.sum::<f64>() / count as f64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpaBand {
    High,
    Standard,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttendanceBand {
    Good,
    Fair,
    Poor,
}

pub fn gpa_band(gpa: f64) -> GpaBand {
    if gpa >= 3.5 {
        GpaBand::High
    } else if gpa < 2.0 {
        GpaBand::Low
    } else {
        GpaBand::Standard
    }
}

pub fn attendance_band(attendance: u8) -> AttendanceBand {
    if attendance >= 90 {
        AttendanceBand::Good
    } else if attendance >= 75 {
        AttendanceBand::Fair
    } else {
        AttendanceBand::Poor
    }
}
