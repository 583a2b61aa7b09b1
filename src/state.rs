use chrono::{NaiveDate, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::directory;
use crate::editor;
use crate::models::{DashboardStats, GradeAverage, PerformanceAnalysis, Student, StudentDraft};
use crate::stats;

pub trait Clock: Send {
    fn today(&self) -> NaiveDate;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum StoreError {
    #[error("no student with id {0}")]
    NotFound(String),
}

#[derive(Debug, Clone)]
pub enum Action {
    FilterChanged(String),
    RecordCreated(StudentDraft),
    RecordUpdated { id: String, draft: StudentDraft },
    AnalysisRequested { student_id: String },
    AnalysisResolved { seq: u64, analysis: PerformanceAnalysis },
    AnalysisFailed { seq: u64 },
    OverlayClosed,
}

/// Handed out by `AnalysisRequested`. The caller runs the request for
/// `student` and reports back with `seq`.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisTicket {
    pub seq: u64,
    pub student: Student,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    None,
    Created(String),
    Updated(String),
    StartAnalysis(AnalysisTicket),
    /// A completion arrived for a request that is no longer the latest.
    Stale(u64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Overlay {
    Closed,
    Loading {
        seq: u64,
        student: Student,
    },
    Ready {
        student: Student,
        analysis: PerformanceAnalysis,
    },
    Failed {
        student: Student,
    },
}

pub struct Dashboard {
    students: Vec<Student>,
    query: String,
    overlay: Overlay,
    last_seq: u64,
    clock: Box<dyn Clock>,
}

impl Dashboard {
    pub fn new(students: Vec<Student>, clock: Box<dyn Clock>) -> Self {
        Self {
            students,
            query: String::new(),
            overlay: Overlay::Closed,
            last_seq: 0,
            clock,
        }
    }

    pub fn students(&self) -> &[Student] {
        &self.students
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn visible(&self) -> Vec<&Student> {
        directory::filter(&self.students, &self.query)
    }

    pub fn stats(&self) -> DashboardStats {
        stats::compute_stats(&self.students)
    }

    pub fn grade_averages(&self) -> Vec<GradeAverage> {
        stats::grade_averages(&self.students)
    }

    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn find(&self, id: &str) -> Option<&Student> {
        self.students.iter().find(|s| s.id == id)
    }

    pub fn dispatch(&mut self, action: Action) -> Result<Effect, StoreError> {
        match action {
            Action::FilterChanged(query) => {
                debug!(query = %query, "filter changed");
                self.query = query;
                Ok(Effect::None)
            }
            Action::RecordCreated(draft) => {
                let student = editor::create_record(draft, self.clock.today());
                let id = student.id.clone();
                info!(id = %id, name = %student.name, "student created");
                self.students.insert(0, student);
                Ok(Effect::Created(id))
            }
            Action::RecordUpdated { id, draft } => {
                let slot = self
                    .students
                    .iter_mut()
                    .find(|s| s.id == id)
                    .ok_or_else(|| StoreError::NotFound(id.clone()))?;
                *slot = editor::apply_edit(slot, draft);
                info!(id = %id, "student updated");
                Ok(Effect::Updated(id))
            }
            Action::AnalysisRequested { student_id } => {
                let student = self
                    .find(&student_id)
                    .cloned()
                    .ok_or(StoreError::NotFound(student_id))?;
                self.last_seq += 1;
                let seq = self.last_seq;
                info!(seq, id = %student.id, "analysis requested");
                self.overlay = Overlay::Loading {
                    seq,
                    student: student.clone(),
                };
                Ok(Effect::StartAnalysis(AnalysisTicket { seq, student }))
            }
            Action::AnalysisResolved { seq, analysis } => match self.pending_student(seq) {
                Some(student) => {
                    self.overlay = Overlay::Ready { student, analysis };
                    Ok(Effect::None)
                }
                None => Ok(Effect::Stale(seq)),
            },
            Action::AnalysisFailed { seq } => match self.pending_student(seq) {
                Some(student) => {
                    self.overlay = Overlay::Failed { student };
                    Ok(Effect::None)
                }
                None => Ok(Effect::Stale(seq)),
            },
            Action::OverlayClosed => {
                self.overlay = Overlay::Closed;
                Ok(Effect::None)
            }
        }
    }

    /// Returns the student under analysis if `seq` is the request the
    /// overlay is still waiting on.
    fn pending_student(&self, seq: u64) -> Option<Student> {
        match &self.overlay {
            Overlay::Loading {
                seq: pending,
                student,
            } if *pending == seq && seq == self.last_seq => Some(student.clone()),
            _ => {
                warn!(seq, latest = self.last_seq, "discarding stale analysis result");
                None
            }
        }
    }
}
