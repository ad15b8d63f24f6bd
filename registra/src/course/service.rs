//! Course service: catalogue, offerings, registration, teaching records
//!
//! The write paths here follow one shape: open a transaction, run any
//! existence gate the operation needs, perform the write, classify
//! constraint violations. Listings borrow a pool connection and delegate
//! to the projection queries in the repository layer.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use super::dto::{
    AttendanceRecord, LecturerOffering, OfferingDetail, OfferingSummary, StudentMessage,
    StudentOffering, StudentTask,
};
use super::models::{
    Attendance, AttendanceCreate, ClassSession, ClassSessionCreate, Course, CourseCreate,
    CourseLecturer, CourseLecturerCreate, CourseOffering, CourseOfferingCreate, CourseStudent,
    CourseStudentCreate, EventStatus, Message, MessageCreate, MessageStudent, Task, TaskCreate,
    TaskStatusFilter, TaskStudent, TaskStudentStatus,
};
use super::repository::{
    AttendanceRepo, ClassSessionRepo, CourseLecturerRepo, CourseOfferingRepo, CourseRepo,
    CourseStudentRepo, MessageRepo, TaskRepo,
};
use crate::db::transaction;
use crate::error::{DatabaseError, Error, Result};
use crate::institution::SessionRepo;
use crate::repo::{EntityRepo, Filter, Page};
use crate::user::LecturerProfileRepo;

/// Text label of an [`EventStatus`], for enum-typed filter columns
fn event_status_label(status: EventStatus) -> &'static str {
    match status {
        EventStatus::Upcoming => "UPCOMING",
        EventStatus::Ongoing => "ONGOING",
        EventStatus::Concluded => "CONCLUDED",
        EventStatus::Cancelled => "CANCELLED",
        EventStatus::Unknown => "UNKNOWN",
    }
}

/// Operations on the course catalogue and everything taught through it
#[derive(Debug, Clone)]
pub struct CourseService {
    pool: PgPool,
    courses: CourseRepo,
    offerings: CourseOfferingRepo,
    course_students: CourseStudentRepo,
    course_lecturers: CourseLecturerRepo,
    class_sessions: ClassSessionRepo,
    attendance: AttendanceRepo,
    messages: MessageRepo,
    tasks: TaskRepo,
    sessions: SessionRepo,
    lecturers: LecturerProfileRepo,
}

impl CourseService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            courses: CourseRepo,
            offerings: CourseOfferingRepo,
            course_students: CourseStudentRepo,
            course_lecturers: CourseLecturerRepo,
            class_sessions: ClassSessionRepo,
            attendance: AttendanceRepo,
            messages: MessageRepo,
            tasks: TaskRepo,
            sessions: SessionRepo,
            lecturers: LecturerProfileRepo,
        }
    }

    pub async fn create_course(&self, input: CourseCreate) -> Result<Course> {
        let courses = self.courses;
        let course = transaction(&self.pool, move |conn| {
            Box::pin(async move {
                courses
                    .create_one(conn, input)
                    .await
                    .map_err(|e| Error::from_write(e, "course", "department"))
            })
        })
        .await?;
        tracing::info!(course_id = %course.id, code = %course.code, "course created");
        Ok(course)
    }

    /// Fetch a course with its department and offerings loaded
    pub async fn get_course(&self, id: Uuid) -> Result<Course> {
        let mut conn = self.pool.acquire().await.map_err(DatabaseError::from)?;
        self.courses
            .get_one_by_id(&mut conn, id, 1)
            .await?
            .ok_or_else(|| Error::NotFound("course".to_string()))
    }

    pub async fn get_courses(
        &self,
        department_id: Option<Uuid>,
        level: Option<i32>,
        page: Page,
    ) -> Result<Vec<Course>> {
        let mut conn = self.pool.acquire().await.map_err(DatabaseError::from)?;
        let mut filter = Filter::new();
        if let Some(department_id) = department_id {
            filter = filter.eq("department_id", department_id);
        }
        if let Some(level) = level {
            filter = filter.eq("level", level);
        }
        let courses = self.courses.get_all(&mut conn, &filter, page, 0).await?;
        Ok(courses)
    }

    /// Offer a course in a semester
    ///
    /// The owning session is resolved from the semester, so callers never
    /// pass an inconsistent (semester, session) pair.
    pub async fn create_offering(
        &self,
        course_id: Uuid,
        semester_id: Uuid,
        is_active: bool,
    ) -> Result<CourseOffering> {
        let offerings = self.offerings;
        let sessions = self.sessions;
        let offering = transaction(&self.pool, move |conn| {
            Box::pin(async move {
                let session_id = sessions
                    .session_id_for_semester(conn, semester_id)
                    .await?
                    .ok_or_else(|| Error::NotFound("semester".to_string()))?;
                offerings
                    .create_one(
                        conn,
                        CourseOfferingCreate {
                            course_id,
                            semester_id,
                            session_id,
                            is_active,
                        },
                    )
                    .await
                    .map_err(|e| Error::from_write(e, "course offering", "course"))
            })
        })
        .await?;
        tracing::info!(offering_id = %offering.id, %course_id, "course offering created");
        Ok(offering)
    }

    /// Fetch an offering with its course, term and rosters loaded
    pub async fn get_offering(&self, id: Uuid) -> Result<CourseOffering> {
        let mut conn = self.pool.acquire().await.map_err(DatabaseError::from)?;
        self.offerings
            .get_one_by_id(&mut conn, id, 1)
            .await?
            .ok_or_else(|| Error::NotFound("course offering".to_string()))
    }

    /// Offerings of a session, or of the currently running semesters when
    /// no session is given
    pub async fn get_session_offerings(
        &self,
        semester_id: Option<Uuid>,
        session_id: Option<Uuid>,
        is_active: Option<bool>,
        page: Page,
    ) -> Result<Vec<OfferingDetail>> {
        let mut conn = self.pool.acquire().await.map_err(DatabaseError::from)?;
        let today = Utc::now().date_naive();
        let offerings = self
            .offerings
            .get_session_offerings(&mut conn, semester_id, session_id, is_active, today, page)
            .await?;
        Ok(offerings)
    }

    pub async fn get_offering_summaries(
        &self,
        session_id: Uuid,
        semester_id: Option<Uuid>,
        department_id: Option<Uuid>,
        page: Page,
    ) -> Result<Vec<OfferingSummary>> {
        let mut conn = self.pool.acquire().await.map_err(DatabaseError::from)?;
        let offerings = self
            .offerings
            .get_offering_summaries(&mut conn, session_id, semester_id, department_id, page)
            .await?;
        Ok(offerings)
    }

    /// Register a student in an offering
    pub async fn register_student(
        &self,
        student_id: Uuid,
        course_offering_id: Uuid,
    ) -> Result<CourseStudent> {
        let course_students = self.course_students;
        let registration = transaction(&self.pool, move |conn| {
            Box::pin(async move {
                course_students
                    .create_one(
                        conn,
                        CourseStudentCreate {
                            student_id,
                            course_offering_id,
                        },
                    )
                    .await
                    .map_err(|e| Error::from_write(e, "course registration", "course offering"))
            })
        })
        .await?;
        tracing::info!(%student_id, %course_offering_id, "student registered");
        Ok(registration)
    }

    /// Assign a lecturer to an offering
    pub async fn assign_lecturer(
        &self,
        lecturer_id: Uuid,
        course_offering_id: Uuid,
    ) -> Result<CourseLecturer> {
        let course_lecturers = self.course_lecturers;
        let lecturers = self.lecturers;
        let assignment = transaction(&self.pool, move |conn| {
            Box::pin(async move {
                if !lecturers.exists(conn, lecturer_id).await? {
                    return Err(Error::NotFound("lecturer".to_string()));
                }
                course_lecturers
                    .create_one(
                        conn,
                        CourseLecturerCreate {
                            lecturer_id,
                            course_offering_id,
                        },
                    )
                    .await
                    .map_err(|e| Error::from_write(e, "lecturer assignment", "course offering"))
            })
        })
        .await?;
        tracing::info!(%lecturer_id, %course_offering_id, "lecturer assigned");
        Ok(assignment)
    }

    pub async fn get_student_offerings(&self, student_id: Uuid) -> Result<Vec<StudentOffering>> {
        let mut conn = self.pool.acquire().await.map_err(DatabaseError::from)?;
        let offerings = self
            .course_students
            .get_student_offerings(&mut conn, student_id)
            .await?;
        Ok(offerings)
    }

    pub async fn get_lecturer_offerings(&self, lecturer_id: Uuid) -> Result<Vec<LecturerOffering>> {
        let mut conn = self.pool.acquire().await.map_err(DatabaseError::from)?;
        let offerings = self
            .course_lecturers
            .get_lecturer_offerings(&mut conn, lecturer_id)
            .await?;
        Ok(offerings)
    }

    /// Create a task on an offering
    ///
    /// Only a lecturer assigned to the offering may post tasks to it.
    pub async fn create_task(&self, input: TaskCreate) -> Result<Task> {
        let tasks = self.tasks;
        let course_lecturers = self.course_lecturers;
        let task = transaction(&self.pool, move |conn| {
            Box::pin(async move {
                let assigned = course_lecturers
                    .is_assigned(conn, input.lecturer_id, input.course_offering_id)
                    .await?;
                if !assigned {
                    return Err(Error::Dependency("lecturer assignment".to_string()));
                }
                tasks
                    .create_one(conn, input)
                    .await
                    .map_err(|e| Error::from_write(e, "task", "course offering"))
            })
        })
        .await?;
        tracing::info!(task_id = %task.id, "task created");
        Ok(task)
    }

    /// Fetch a task with its per-student completion rows loaded
    pub async fn get_task(&self, id: Uuid) -> Result<Task> {
        let mut conn = self.pool.acquire().await.map_err(DatabaseError::from)?;
        self.tasks
            .get_one_by_id(&mut conn, id, 1)
            .await?
            .ok_or_else(|| Error::NotFound("task".to_string()))
    }

    pub async fn get_offering_tasks(
        &self,
        course_offering_id: Uuid,
        status: Option<EventStatus>,
        page: Page,
    ) -> Result<Vec<Task>> {
        let mut conn = self.pool.acquire().await.map_err(DatabaseError::from)?;
        let mut filter = Filter::new().eq("course_offering_id", course_offering_id);
        if let Some(status) = status {
            filter = filter.eq("status::text", event_status_label(status));
        }
        let tasks = self.tasks.get_all(&mut conn, &filter, page, 0).await?;
        Ok(tasks)
    }

    pub async fn get_lecturer_tasks(&self, lecturer_id: Uuid, page: Page) -> Result<Vec<Task>> {
        let mut conn = self.pool.acquire().await.map_err(DatabaseError::from)?;
        let filter = Filter::new().eq("lecturer_id", lecturer_id);
        let tasks = self.tasks.get_all(&mut conn, &filter, page, 0).await?;
        Ok(tasks)
    }

    pub async fn get_student_tasks(
        &self,
        student_id: Uuid,
        course_offering_id: Option<Uuid>,
        status: Option<TaskStatusFilter>,
        page: Page,
    ) -> Result<Vec<StudentTask>> {
        let mut conn = self.pool.acquire().await.map_err(DatabaseError::from)?;
        let tasks = self
            .tasks
            .get_student_tasks(&mut conn, student_id, course_offering_id, status, page)
            .await?;
        Ok(tasks)
    }

    /// Record that a student completed a task
    ///
    /// The task must belong to an offering the student is registered in.
    /// Completion after the deadline is recorded as
    /// [`TaskStudentStatus::CompletedLate`]. Repeating the call updates the
    /// existing row rather than failing.
    pub async fn complete_task(&self, task_id: Uuid, student_id: Uuid) -> Result<TaskStudent> {
        let tasks = self.tasks;
        let now = Utc::now();
        let completion = transaction(&self.pool, move |conn| {
            Box::pin(async move {
                let task = tasks
                    .get_one_by_id(conn, task_id, 0)
                    .await?
                    .ok_or_else(|| Error::NotFound("task".to_string()))?;
                let open = tasks.is_open_to_student(conn, task_id, student_id).await?;
                if !open {
                    return Err(Error::NotFound("task".to_string()));
                }
                let status = match task.deadline {
                    Some(deadline) if now > deadline => TaskStudentStatus::CompletedLate,
                    _ => TaskStudentStatus::Completed,
                };
                let completion = tasks
                    .upsert_completion(conn, task_id, student_id, status)
                    .await?;
                Ok::<_, Error>(completion)
            })
        })
        .await?;
        tracing::info!(%task_id, %student_id, status = ?completion.status, "task completed");
        Ok(completion)
    }

    /// Record a grade on a student's task completion
    ///
    /// With a `lecturer_id`, grading is restricted to the task's author.
    pub async fn grade_task(
        &self,
        task_id: Uuid,
        student_id: Uuid,
        grade: i32,
        lecturer_id: Option<Uuid>,
    ) -> Result<TaskStudent> {
        let tasks = self.tasks;
        let graded = transaction(&self.pool, move |conn| {
            Box::pin(async move {
                tasks
                    .grade(conn, task_id, student_id, grade, lecturer_id)
                    .await?
                    .ok_or_else(|| Error::NotFound("task submission".to_string()))
            })
        })
        .await?;
        tracing::info!(%task_id, %student_id, grade, "task graded");
        Ok(graded)
    }

    /// Post an announcement to an offering
    pub async fn create_message(&self, input: MessageCreate) -> Result<Message> {
        let messages = self.messages;
        let message = transaction(&self.pool, move |conn| {
            Box::pin(async move {
                messages
                    .create_one(conn, input)
                    .await
                    .map_err(|e| Error::from_write(e, "message", "course offering"))
            })
        })
        .await?;
        tracing::info!(message_id = %message.id, "message created");
        Ok(message)
    }

    pub async fn get_lecturer_messages(
        &self,
        lecturer_id: Uuid,
        course_offering_id: Option<Uuid>,
        page: Page,
    ) -> Result<Vec<Message>> {
        let mut conn = self.pool.acquire().await.map_err(DatabaseError::from)?;
        let mut filter = Filter::new().eq("lecturer_id", lecturer_id);
        if let Some(course_offering_id) = course_offering_id {
            filter = filter.eq("course_offering_id", course_offering_id);
        }
        let messages = self.messages.get_all(&mut conn, &filter, page, 0).await?;
        Ok(messages)
    }

    pub async fn get_student_messages(
        &self,
        student_id: Uuid,
        read: Option<bool>,
        course_offering_id: Option<Uuid>,
        page: Page,
    ) -> Result<Vec<StudentMessage>> {
        let mut conn = self.pool.acquire().await.map_err(DatabaseError::from)?;
        let messages = self
            .messages
            .get_student_messages(&mut conn, student_id, read, course_offering_id, page)
            .await?;
        Ok(messages)
    }

    /// Mark an announcement read (or unread) for a student
    ///
    /// Idempotent: repeating the call updates the existing receipt row.
    pub async fn mark_message_read(
        &self,
        student_id: Uuid,
        message_id: Uuid,
        read: bool,
    ) -> Result<MessageStudent> {
        let messages = self.messages;
        let receipt = transaction(&self.pool, move |conn| {
            Box::pin(async move {
                if !messages.exists(conn, message_id).await? {
                    return Err(Error::NotFound("message".to_string()));
                }
                messages
                    .mark_read(conn, student_id, message_id, read)
                    .await
                    .map_err(|e| Error::from_write(e, "message receipt", "student"))
            })
        })
        .await?;
        Ok(receipt)
    }

    /// Schedule a class session on an offering
    pub async fn create_class_session(&self, input: ClassSessionCreate) -> Result<ClassSession> {
        let class_sessions = self.class_sessions;
        let session = transaction(&self.pool, move |conn| {
            Box::pin(async move {
                class_sessions
                    .create_one(conn, input)
                    .await
                    .map_err(|e| Error::from_write(e, "class session", "course offering"))
            })
        })
        .await?;
        tracing::info!(class_session_id = %session.id, "class session created");
        Ok(session)
    }

    /// Fetch a class session with its attendance rows loaded
    pub async fn get_class_session(&self, id: Uuid) -> Result<ClassSession> {
        let mut conn = self.pool.acquire().await.map_err(DatabaseError::from)?;
        self.class_sessions
            .get_one_by_id(&mut conn, id, 1)
            .await?
            .ok_or_else(|| Error::NotFound("class session".to_string()))
    }

    /// Class sessions of an offering; `detail` also loads attendance rows
    pub async fn get_class_sessions(
        &self,
        course_offering_id: Uuid,
        detail: bool,
        page: Page,
    ) -> Result<Vec<ClassSession>> {
        let mut conn = self.pool.acquire().await.map_err(DatabaseError::from)?;
        let filter = Filter::new().eq("course_offering_id", course_offering_id);
        let depth = if detail { 1 } else { 0 };
        let sessions = self
            .class_sessions
            .get_all(&mut conn, &filter, page, depth)
            .await?;
        Ok(sessions)
    }

    /// Record a student's attendance for a class session
    pub async fn mark_attendance(&self, input: AttendanceCreate) -> Result<Attendance> {
        let attendance = self.attendance;
        let record = transaction(&self.pool, move |conn| {
            Box::pin(async move {
                attendance
                    .create_one(conn, input)
                    .await
                    .map_err(|e| Error::from_write(e, "attendance", "class session"))
            })
        })
        .await?;
        Ok(record)
    }

    pub async fn get_class_attendance(
        &self,
        class_session_id: Uuid,
        page: Page,
    ) -> Result<Vec<Attendance>> {
        let mut conn = self.pool.acquire().await.map_err(DatabaseError::from)?;
        let filter = Filter::new().eq("class_session_id", class_session_id);
        let records = self.attendance.get_all(&mut conn, &filter, page, 0).await?;
        Ok(records)
    }

    /// A student's attendance outcome per scheduled class session
    pub async fn get_attendance_history(
        &self,
        student_id: Uuid,
        class_session_id: Option<Uuid>,
        page: Page,
    ) -> Result<Vec<AttendanceRecord>> {
        let mut conn = self.pool.acquire().await.map_err(DatabaseError::from)?;
        let records = self
            .course_students
            .get_attendance_history(&mut conn, student_id, class_session_id, page)
            .await?;
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_status_labels_match_database_values() {
        assert_eq!(event_status_label(EventStatus::Upcoming), "UPCOMING");
        assert_eq!(event_status_label(EventStatus::Concluded), "CONCLUDED");
        assert_eq!(event_status_label(EventStatus::Cancelled), "CANCELLED");
    }
}
