use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum StudentStatus {
    Active,
    Inactive,
}

impl fmt::Display for StudentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StudentStatus::Active => write!(f, "Active"),
            StudentStatus::Inactive => write!(f, "Inactive"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Student {
    pub id: String,
    pub name: String,
    pub email: String,
    pub grade_level: u8,
    pub gpa: f64,
    pub attendance: u8,
    pub status: StudentStatus,
    pub enrollment_date: NaiveDate,
    pub avatar: String,
    pub notes: String,
}

/// Form payload for creating or editing a record. Identifier, enrollment
/// date and avatar are owned by the store and never come from the form.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentDraft {
    pub name: String,
    pub email: String,
    pub grade_level: u8,
    pub gpa: f64,
    pub attendance: u8,
    pub status: StudentStatus,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardStats {
    pub total_students: usize,
    pub average_gpa: f64,
    pub average_attendance: f64,
    pub active_students: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GradeAverage {
    pub grade_level: u8,
    pub student_count: usize,
    pub average_gpa: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceAnalysis {
    pub summary: String,
    pub strengths: Vec<String>,
    pub areas_for_improvement: Vec<String>,
    pub recommendations: Vec<String>,
}
