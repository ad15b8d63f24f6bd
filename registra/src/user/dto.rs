//! Composite inputs and projection types for the user queries

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use super::models::{LecturerDegree, LecturerRank, LecturerTitle, Status, UserType};
use crate::course::{LecturerOffering, StudentOffering, TaskType};
use crate::institution::SemesterName;

/// Account plus student profile, created together in one transaction
#[derive(Debug, Clone, Deserialize)]
pub struct NewStudent {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub password: String,
    pub user_type: UserType,
    pub department_id: Option<Uuid>,
    pub matric_number: String,
    pub admission_session_id: Uuid,
    pub status: Status,
}

/// Account plus lecturer profile, created together in one transaction
#[derive(Debug, Clone, Deserialize)]
pub struct NewLecturer {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub password: String,
    pub user_type: UserType,
    pub department_id: Option<Uuid>,
    pub rank: LecturerRank,
    pub title: LecturerTitle,
    pub degree: LecturerDegree,
    pub status: Status,
}

/// An offering as embedded in JSON-aggregated per-person listings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferingBrief {
    pub id: Uuid,
    pub course_id: Uuid,
    pub semester_id: Uuid,
    pub session_id: Uuid,
    pub is_active: bool,
    pub class_completed: i32,
    pub semester: SemesterName,
    pub course_code: String,
    pub course_name: String,
}

/// A lecturer joined with account, department and offering list
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LecturerDetails {
    pub id: Uuid,
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub department_id: Option<Uuid>,
    pub rank: LecturerRank,
    pub title: LecturerTitle,
    pub degree: LecturerDegree,
    pub status: Status,
    pub department: String,
    pub course_offerings: Json<Vec<OfferingBrief>>,
}

/// A student joined with account, department and offering list
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StudentDetails {
    pub id: Uuid,
    pub matric_number: String,
    pub admission_session_id: Uuid,
    pub status: Status,
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub department_id: Option<Uuid>,
    pub department: String,
    pub course_offerings: Json<Vec<OfferingBrief>>,
}

/// Aggregates a lecturer's assigned offerings into headline numbers
#[derive(Debug, Clone, Serialize)]
pub struct LecturerDashboard {
    pub total_course: usize,
    pub total_lectures_completed: i64,
    pub courses: Vec<LecturerOffering>,
}

impl LecturerDashboard {
    pub fn from_courses(courses: Vec<LecturerOffering>) -> Self {
        let total_lectures_completed = courses
            .iter()
            .map(|course| i64::from(course.lecture_completed))
            .sum();
        Self {
            total_course: courses.len(),
            total_lectures_completed,
            courses,
        }
    }
}

/// Aggregates a student's registered offerings into headline numbers
///
/// Only assignment-type pending tasks count towards
/// `pending_assignments`; projects and actions do not.
#[derive(Debug, Clone, Serialize)]
pub struct StudentDashboard {
    pub total_course_offering: usize,
    pub total_lectures_completed: i64,
    pub pending_assignments: usize,
    pub courses: Vec<StudentOffering>,
}

impl StudentDashboard {
    pub fn from_courses(courses: Vec<StudentOffering>) -> Self {
        let total_lectures_completed = courses
            .iter()
            .map(|course| i64::from(course.class_session_attended))
            .sum();
        let pending_assignments = courses
            .iter()
            .flat_map(|course| course.pending_tasks.0.iter())
            .filter(|task| task.task_type == TaskType::Assignment)
            .count();
        Self {
            total_course_offering: courses.len(),
            total_lectures_completed,
            pending_assignments,
            courses,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::course::{EventStatus, PendingTask};

    fn offering(attended: i32, pending: Vec<PendingTask>) -> StudentOffering {
        StudentOffering {
            course_offering_id: Uuid::new_v4(),
            semester_id: Uuid::new_v4(),
            session_id: Uuid::new_v4(),
            course_code: "CSC301".to_string(),
            course_name: "Operating Systems".to_string(),
            total_class_session: 12,
            session: "2024/2025".to_string(),
            semester: SemesterName::First,
            class_session_attended: attended,
            pending_tasks: Json(pending),
            course_lecturers: Json(Vec::new()),
        }
    }

    fn pending_task(task_type: TaskType) -> PendingTask {
        PendingTask {
            id: Uuid::new_v4(),
            course_offering_id: Uuid::new_v4(),
            lecturer_id: Uuid::new_v4(),
            task_type,
            title: None,
            details: None,
            status: EventStatus::Ongoing,
            deadline: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_student_dashboard_counts_only_assignments() {
        let courses = vec![
            offering(
                3,
                vec![
                    pending_task(TaskType::Assignment),
                    pending_task(TaskType::Project),
                ],
            ),
            offering(5, vec![pending_task(TaskType::Assignment)]),
        ];
        let dashboard = StudentDashboard::from_courses(courses);
        assert_eq!(dashboard.total_course_offering, 2);
        assert_eq!(dashboard.total_lectures_completed, 8);
        assert_eq!(dashboard.pending_assignments, 2);
    }

    #[test]
    fn test_empty_student_dashboard() {
        let dashboard = StudentDashboard::from_courses(Vec::new());
        assert_eq!(dashboard.total_course_offering, 0);
        assert_eq!(dashboard.total_lectures_completed, 0);
        assert_eq!(dashboard.pending_assignments, 0);
    }

    #[test]
    fn test_lecturer_dashboard_sums_completed_lectures() {
        let course = |completed| LecturerOffering {
            course_offering_id: Uuid::new_v4(),
            semester_id: Uuid::new_v4(),
            session_id: Uuid::new_v4(),
            course_code: "CSC301".to_string(),
            course_name: "Operating Systems".to_string(),
            total_class_session: 12,
            session: "2024/2025".to_string(),
            semester: SemesterName::First,
            lecture_completed: completed,
            assigned_at: Utc::now(),
            course_lecturers: Json(Vec::new()),
        };
        let dashboard = LecturerDashboard::from_courses(vec![course(4), course(6)]);
        assert_eq!(dashboard.total_course, 2);
        assert_eq!(dashboard.total_lectures_completed, 10);
    }
}
