use std::collections::HashSet;
use std::io::Write;

use anyhow::Context;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::editor;
use crate::models::{Student, StudentStatus};

pub fn seed() -> anyhow::Result<Vec<Student>> {
    let fixtures = vec![
        (
            "1",
            "Alice Thompson",
            "alice.t@school.edu",
            10,
            3.85,
            96,
            StudentStatus::Active,
            "2023-09-01",
            "alice",
            "Excellent in math, needs slight help in literature.",
        ),
        (
            "2",
            "James Wilson",
            "james.w@school.edu",
            11,
            2.90,
            84,
            StudentStatus::Active,
            "2022-09-01",
            "james",
            "Showing improvement in science subjects.",
        ),
        (
            "3",
            "Sarah Parker",
            "sarah.p@school.edu",
            12,
            4.00,
            99,
            StudentStatus::Active,
            "2021-09-01",
            "sarah",
            "Valedictorian candidate. Active in student council.",
        ),
        (
            "4",
            "Marcus Chen",
            "marcus.c@school.edu",
            9,
            3.20,
            92,
            StudentStatus::Active,
            "2024-09-01",
            "marcus",
            "New student, adapting well to the curriculum.",
        ),
        (
            "5",
            "Elena Rodriguez",
            "elena.r@school.edu",
            10,
            1.85,
            65,
            StudentStatus::Inactive,
            "2023-09-01",
            "elena",
            "Struggling with attendance. Intervention required.",
        ),
        (
            "6",
            "David Kim",
            "david.k@school.edu",
            11,
            3.50,
            95,
            StudentStatus::Active,
            "2022-09-01",
            "david",
            "Interested in computer science club.",
        ),
    ];

    let mut students = Vec::with_capacity(fixtures.len());
    for (id, name, email, grade_level, gpa, attendance, status, enrolled, avatar_seed, notes) in
        fixtures
    {
        students.push(Student {
            id: id.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            grade_level,
            gpa,
            attendance,
            status,
            enrollment_date: NaiveDate::parse_from_str(enrolled, "%Y-%m-%d")
                .context("invalid fixture date")?,
            avatar: editor::default_avatar(avatar_seed),
            notes: notes.to_string(),
        });
    }

    Ok(students)
}

#[derive(Debug, Deserialize, Serialize)]
struct CsvRow {
    id: Option<String>,
    name: String,
    email: String,
    grade_level: u8,
    gpa: f64,
    attendance: u8,
    status: StudentStatus,
    enrollment_date: Option<NaiveDate>,
    avatar: Option<String>,
    notes: Option<String>,
}

/// Loads a roster in file order. Blank identifiers and avatars are generated
/// the same way the editor does; a blank enrollment date becomes `today`.
/// Explicit identifiers must be unique across the file.
pub fn import_csv(csv_path: &std::path::Path, today: NaiveDate) -> anyhow::Result<Vec<Student>> {
    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut students = Vec::new();
    let mut seen = HashSet::new();

    for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result.with_context(|| format!("bad roster row {}", index + 1))?;
        let id = row
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(editor::generate_id);
        if !seen.insert(id.clone()) {
            anyhow::bail!("duplicate student id {id} on roster row {}", index + 1);
        }
        let avatar = row
            .avatar
            .filter(|a| !a.trim().is_empty())
            .unwrap_or_else(|| editor::default_avatar(&id));

        students.push(Student {
            id,
            name: row.name,
            email: row.email,
            grade_level: row.grade_level,
            gpa: row.gpa,
            attendance: row.attendance,
            status: row.status,
            enrollment_date: row.enrollment_date.unwrap_or(today),
            avatar,
            notes: row.notes.unwrap_or_default(),
        });
    }

    tracing::info!(count = students.len(), path = %csv_path.display(), "roster imported");
    Ok(students)
}

pub fn write_csv<W: Write>(writer: W, students: &[&Student]) -> anyhow::Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    for student in students {
        out.serialize(CsvRow {
            id: Some(student.id.clone()),
            name: student.name.clone(),
            email: student.email.clone(),
            grade_level: student.grade_level,
            gpa: student.gpa,
            attendance: student.attendance,
            status: student.status,
            enrollment_date: Some(student.enrollment_date),
            avatar: Some(student.avatar.clone()),
            notes: Some(student.notes.clone()),
        })?;
    }
    out.flush()?;
    Ok(())
}
