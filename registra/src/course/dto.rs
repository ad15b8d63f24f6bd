//! Projection types for the bespoke course queries
//!
//! These are read shapes, not entities: each one mirrors the column list of
//! one hand-written query. JSON-aggregated columns decode through
//! [`sqlx::types::Json`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use super::models::{EventStatus, TaskStudentStatus, TaskType};
use crate::institution::SemesterName;
use crate::user::{LecturerDegree, LecturerRank, LecturerTitle, Status};

/// One offering row joined with its course, semester and session names
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OfferingDetail {
    pub id: Uuid,
    pub course_id: Uuid,
    pub semester_id: Uuid,
    pub session_id: Uuid,
    pub is_active: bool,
    pub class_completed: i32,
    pub course_name: String,
    pub course_code: String,
    pub semester: SemesterName,
    pub session: String,
}

/// A lecturer as embedded in JSON-aggregated assignment lists
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LecturerBrief {
    pub id: Uuid,
    pub user_id: Uuid,
    pub rank: LecturerRank,
    pub title: LecturerTitle,
    pub degree: LecturerDegree,
    pub status: Status,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// An offering with its assigned lecturers aggregated in
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OfferingSummary {
    pub course_offering_id: Uuid,
    pub semester_id: Uuid,
    pub session_id: Uuid,
    pub course_code: String,
    pub course_name: String,
    pub total_class_session: i32,
    pub session: String,
    pub semester: SemesterName,
    pub course_lecturers: Json<Vec<LecturerBrief>>,
}

/// A task the student has not yet completed, as embedded JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingTask {
    pub id: Uuid,
    pub course_offering_id: Uuid,
    pub lecturer_id: Uuid,
    pub task_type: TaskType,
    pub title: Option<String>,
    pub details: Option<String>,
    pub status: EventStatus,
    pub deadline: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One registered offering from the student's point of view
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StudentOffering {
    pub course_offering_id: Uuid,
    pub semester_id: Uuid,
    pub session_id: Uuid,
    pub course_code: String,
    pub course_name: String,
    pub total_class_session: i32,
    pub session: String,
    pub semester: SemesterName,
    pub class_session_attended: i32,
    pub pending_tasks: Json<Vec<PendingTask>>,
    pub course_lecturers: Json<Vec<LecturerBrief>>,
}

/// One assigned offering from the lecturer's point of view
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LecturerOffering {
    pub course_offering_id: Uuid,
    pub semester_id: Uuid,
    pub session_id: Uuid,
    pub course_code: String,
    pub course_name: String,
    pub total_class_session: i32,
    pub session: String,
    pub semester: SemesterName,
    pub lecture_completed: i32,
    pub assigned_at: DateTime<Utc>,
    pub course_lecturers: Json<Vec<LecturerBrief>>,
}

/// An announcement with the read flag coalesced from the per-student row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StudentMessage {
    pub id: Uuid,
    pub course_offering_id: Uuid,
    pub lecturer_id: Uuid,
    pub title: Option<String>,
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub read: bool,
}

/// A task joined with the student's own completion row, flattened
///
/// `task_student_status` coalesces to [`TaskStudentStatus::Pending`] when
/// the student has no row yet; `task_student_id` and `grade` stay absent.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StudentTask {
    pub task_id: Uuid,
    pub course_offering_id: Uuid,
    pub lecturer_id: Uuid,
    pub task_type: TaskType,
    pub title: Option<String>,
    pub details: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub task_status: EventStatus,
    pub task_student_status: TaskStudentStatus,
    pub grade: Option<i32>,
    pub task_student_id: Option<Uuid>,
}

/// One class session of a registered offering with the student's
/// attendance outcome
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AttendanceRecord {
    pub student_id: Uuid,
    pub class_session_id: Uuid,
    pub attended: bool,
    pub marked_at: Option<DateTime<Utc>>,
    pub class_session_time: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offering_summary_decodes_aggregated_lecturers() {
        let json = r#"{
            "course_offering_id": "00000000-0000-0000-0000-000000000001",
            "semester_id": "00000000-0000-0000-0000-000000000002",
            "session_id": "00000000-0000-0000-0000-000000000003",
            "course_code": "CSC301",
            "course_name": "Operating Systems",
            "total_class_session": 12,
            "session": "2024/2025",
            "semester": "FIRST",
            "course_lecturers": [{
                "id": "00000000-0000-0000-0000-000000000004",
                "user_id": "00000000-0000-0000-0000-000000000005",
                "rank": "LECTURER_2",
                "title": "DR",
                "degree": "PHD",
                "status": "ACTIVE",
                "first_name": "Ada",
                "last_name": "Obi",
                "email": "ada@example.edu"
            }]
        }"#;
        let summary: OfferingSummary = serde_json::from_str(json).unwrap();
        assert_eq!(summary.semester, SemesterName::First);
        assert_eq!(summary.course_lecturers.0.len(), 1);
        assert_eq!(summary.course_lecturers.0[0].rank, LecturerRank::LecturerII);
    }

    #[test]
    fn test_pending_task_decodes_from_json_agg_shape() {
        // json_build_object renders timestamptz in RFC 3339 form
        let json = r#"{
            "id": "00000000-0000-0000-0000-000000000001",
            "course_offering_id": "00000000-0000-0000-0000-000000000002",
            "lecturer_id": "00000000-0000-0000-0000-000000000003",
            "task_type": "ASSIGNMENT",
            "title": "Lab 3",
            "details": "Paging exercises",
            "status": "ONGOING",
            "deadline": null,
            "created_at": "2025-03-01T09:00:00+00:00",
            "updated_at": "2025-03-01T09:00:00+00:00"
        }"#;
        let task: PendingTask = serde_json::from_str(json).unwrap();
        assert_eq!(task.task_type, TaskType::Assignment);
        assert_eq!(task.status, EventStatus::Ongoing);
        assert!(task.deadline.is_none());
    }

    #[test]
    fn test_student_task_defaults_absent_row_fields() {
        let json = r#"{
            "task_id": "00000000-0000-0000-0000-000000000001",
            "course_offering_id": "00000000-0000-0000-0000-000000000002",
            "lecturer_id": "00000000-0000-0000-0000-000000000003",
            "task_type": "PROJECT",
            "title": null,
            "details": null,
            "deadline": null,
            "created_at": "2025-03-01T09:00:00+00:00",
            "task_status": "UPCOMING",
            "task_student_status": "PENDING",
            "grade": null,
            "task_student_id": null
        }"#;
        let task: StudentTask = serde_json::from_str(json).unwrap();
        assert_eq!(task.task_student_status, TaskStudentStatus::Pending);
        assert!(task.grade.is_none());
        assert!(task.task_student_id.is_none());
    }
}
