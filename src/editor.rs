use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Student, StudentDraft, StudentStatus};

pub const GRADE_LEVELS: std::ops::RangeInclusive<u8> = 9..=12;
pub const MAX_GPA: f64 = 4.0;
pub const MAX_ATTENDANCE: u8 = 100;

#[derive(Error, Debug, PartialEq)]
pub enum FormError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("email must look like name@domain, got {0:?}")]
    InvalidEmail(String),

    #[error("grade level must be between 9 and 12, got {0}")]
    GradeLevel(u8),

    #[error("GPA must be between 0.00 and 4.00, got {0}")]
    Gpa(f64),

    #[error("attendance must be between 0 and 100, got {0}")]
    Attendance(u8),

    #[error("invalid value for {field}: {value:?}")]
    Unparseable { field: &'static str, value: String },

    #[error("unknown form field {0:?}")]
    UnknownField(String),
}

/// Input-layer constraints, mirroring what the form widgets allow. The store
/// itself accepts any draft.
pub fn check_draft(draft: &StudentDraft) -> Result<(), FormError> {
    if draft.name.trim().is_empty() {
        return Err(FormError::Missing("name"));
    }
    if draft.email.trim().is_empty() {
        return Err(FormError::Missing("email"));
    }
    if !draft.email.contains('@') {
        return Err(FormError::InvalidEmail(draft.email.clone()));
    }
    if !GRADE_LEVELS.contains(&draft.grade_level) {
        return Err(FormError::GradeLevel(draft.grade_level));
    }
    if !(0.0..=MAX_GPA).contains(&draft.gpa) {
        return Err(FormError::Gpa(draft.gpa));
    }
    if draft.attendance > MAX_ATTENDANCE {
        return Err(FormError::Attendance(draft.attendance));
    }
    Ok(())
}

pub fn generate_id() -> String {
    Uuid::new_v4().simple().to_string()
}

pub fn default_avatar(seed: &str) -> String {
    format!("https://picsum.photos/seed/{seed}/100/100")
}

pub fn create_record(draft: StudentDraft, today: NaiveDate) -> Student {
    let id = generate_id();
    let avatar = default_avatar(&id);
    Student {
        id,
        name: draft.name,
        email: draft.email,
        grade_level: draft.grade_level,
        gpa: draft.gpa,
        attendance: draft.attendance,
        status: draft.status,
        enrollment_date: today,
        avatar,
        notes: draft.notes,
    }
}

pub fn apply_edit(existing: &Student, draft: StudentDraft) -> Student {
    Student {
        id: existing.id.clone(),
        name: draft.name,
        email: draft.email,
        grade_level: draft.grade_level,
        gpa: draft.gpa,
        attendance: draft.attendance,
        status: draft.status,
        enrollment_date: existing.enrollment_date,
        avatar: existing.avatar.clone(),
        notes: draft.notes,
    }
}

/// Starting values for the edit form.
pub fn draft_from(student: &Student) -> StudentDraft {
    StudentDraft {
        name: student.name.clone(),
        email: student.email.clone(),
        grade_level: student.grade_level,
        gpa: student.gpa,
        attendance: student.attendance,
        status: student.status,
        notes: student.notes.clone(),
    }
}

pub fn parse_gpa(value: &str) -> Result<f64, FormError> {
    let gpa: f64 = value.trim().parse().map_err(|_| FormError::Unparseable {
        field: "gpa",
        value: value.to_string(),
    })?;
    if !(0.0..=MAX_GPA).contains(&gpa) {
        return Err(FormError::Gpa(gpa));
    }
    Ok(gpa)
}

/// Collects `key=value` form input. Unset grade, status and notes fall back
/// to the form defaults (grade 9, Active, empty).
#[derive(Debug, Default)]
pub struct DraftBuilder {
    name: Option<String>,
    email: Option<String>,
    grade_level: Option<u8>,
    gpa: Option<f64>,
    attendance: Option<u8>,
    status: Option<StudentStatus>,
    notes: Option<String>,
}

impl DraftBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_draft(draft: StudentDraft) -> Self {
        Self {
            name: Some(draft.name),
            email: Some(draft.email),
            grade_level: Some(draft.grade_level),
            gpa: Some(draft.gpa),
            attendance: Some(draft.attendance),
            status: Some(draft.status),
            notes: Some(draft.notes),
        }
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<(), FormError> {
        match key {
            "name" => self.name = Some(value.to_string()),
            "email" => self.email = Some(value.to_string()),
            "grade" | "grade_level" => {
                self.grade_level = Some(parse_number("grade", value)?);
            }
            "gpa" => self.gpa = Some(parse_gpa(value)?),
            "attendance" => {
                self.attendance = Some(parse_number("attendance", value)?);
            }
            "status" => {
                let status = <StudentStatus as clap::ValueEnum>::from_str(value.trim(), true)
                    .map_err(|_| FormError::Unparseable {
                        field: "status",
                        value: value.to_string(),
                    })?;
                self.status = Some(status);
            }
            "notes" => self.notes = Some(value.to_string()),
            other => return Err(FormError::UnknownField(other.to_string())),
        }
        Ok(())
    }

    pub fn build(self) -> Result<StudentDraft, FormError> {
        let draft = StudentDraft {
            name: self.name.ok_or(FormError::Missing("name"))?,
            email: self.email.ok_or(FormError::Missing("email"))?,
            grade_level: self.grade_level.unwrap_or(*GRADE_LEVELS.start()),
            gpa: self.gpa.ok_or(FormError::Missing("gpa"))?,
            attendance: self.attendance.ok_or(FormError::Missing("attendance"))?,
            status: self.status.unwrap_or(StudentStatus::Active),
            notes: self.notes.unwrap_or_default(),
        };
        check_draft(&draft)?;
        Ok(draft)
    }
}

fn parse_number(field: &'static str, value: &str) -> Result<u8, FormError> {
    value.trim().parse().map_err(|_| FormError::Unparseable {
        field,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> StudentDraft {
        StudentDraft {
            name: "Priya Nair".to_string(),
            email: "priya.n@school.edu".to_string(),
            grade_level: 11,
            gpa: 3.4,
            attendance: 91,
            status: StudentStatus::Active,
            notes: String::new(),
        }
    }

    #[test]
    fn create_assigns_identity_and_today() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        let student = create_record(draft(), today);

        assert_eq!(student.name, "Priya Nair");
        assert_eq!(student.enrollment_date, today);
        assert_eq!(student.id.len(), 32);
        assert_eq!(student.avatar, default_avatar(&student.id));

        let other = create_record(draft(), today);
        assert_ne!(student.id, other.id);
    }

    #[test]
    fn edit_keeps_identity_fields() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        let original = create_record(draft(), today);

        let mut changed = draft();
        changed.name = "Priya N. Nair".to_string();
        changed.gpa = 3.9;
        changed.status = StudentStatus::Inactive;
        changed.notes = "Transferred to evening classes.".to_string();

        let edited = apply_edit(&original, changed.clone());
        assert_eq!(edited.id, original.id);
        assert_eq!(edited.enrollment_date, original.enrollment_date);
        assert_eq!(edited.avatar, original.avatar);
        assert_eq!(draft_from(&edited), changed);
    }

    #[test]
    fn form_rejects_out_of_range_values() {
        assert_eq!(check_draft(&draft()), Ok(()));

        let mut bad = draft();
        bad.gpa = 4.01;
        assert_eq!(check_draft(&bad), Err(FormError::Gpa(4.01)));

        let mut bad = draft();
        bad.attendance = 101;
        assert_eq!(check_draft(&bad), Err(FormError::Attendance(101)));

        let mut bad = draft();
        bad.grade_level = 8;
        assert_eq!(check_draft(&bad), Err(FormError::GradeLevel(8)));

        let mut bad = draft();
        bad.name = "  ".to_string();
        assert_eq!(check_draft(&bad), Err(FormError::Missing("name")));

        let mut bad = draft();
        bad.email = "priya".to_string();
        assert!(matches!(check_draft(&bad), Err(FormError::InvalidEmail(_))));
    }

    #[test]
    fn gpa_parser_enforces_range() {
        assert_eq!(parse_gpa("3.25"), Ok(3.25));
        assert_eq!(parse_gpa("0"), Ok(0.0));
        assert_eq!(parse_gpa("4.5"), Err(FormError::Gpa(4.5)));
        assert!(matches!(parse_gpa("abc"), Err(FormError::Unparseable { .. })));
    }

    #[test]
    fn builder_applies_form_defaults() {
        let mut builder = DraftBuilder::new();
        builder.set("name", "Lena Fox").unwrap();
        builder.set("email", "lena.f@school.edu").unwrap();
        builder.set("gpa", "2.75").unwrap();
        builder.set("attendance", "88").unwrap();
        let draft = builder.build().unwrap();

        assert_eq!(draft.grade_level, 9);
        assert_eq!(draft.status, StudentStatus::Active);
        assert_eq!(draft.notes, "");
    }

    #[test]
    fn builder_requires_core_fields() {
        let mut builder = DraftBuilder::new();
        builder.set("name", "Lena Fox").unwrap();
        builder.set("email", "lena.f@school.edu").unwrap();
        builder.set("attendance", "88").unwrap();
        assert_eq!(builder.build(), Err(FormError::Missing("gpa")));
    }

    #[test]
    fn builder_overrides_existing_values() {
        let mut builder = DraftBuilder::from_draft(draft());
        builder.set("status", "inactive").unwrap();
        builder.set("grade", "12").unwrap();
        let updated = builder.build().unwrap();

        assert_eq!(updated.status, StudentStatus::Inactive);
        assert_eq!(updated.grade_level, 12);
        assert_eq!(updated.name, "Priya Nair");
    }

    #[test]
    fn builder_rejects_bad_input() {
        let mut builder = DraftBuilder::new();
        assert_eq!(
            builder.set("age", "15"),
            Err(FormError::UnknownField("age".to_string()))
        );
        assert!(matches!(
            builder.set("attendance", "300"),
            Err(FormError::Unparseable { field: "attendance", .. })
        ));
        assert!(matches!(
            builder.set("status", "graduated"),
            Err(FormError::Unparseable { field: "status", .. })
        ));

        let mut builder = DraftBuilder::from_draft(draft());
        builder.set("grade", "7").unwrap();
        assert_eq!(builder.build(), Err(FormError::GradeLevel(7)));
    }
}
