//! Course catalogue and everything that happens inside an offering:
//! registrations, lecturer assignments, class sessions, attendance,
//! announcements and tasks.

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use sqlx::{query_builder::Separated, FromRow, PgConnection, Postgres};
use uuid::Uuid;

use crate::error::DbResult;
use crate::institution::{Department, Semester, Session};
use crate::repo::{
    load_many_to_one, load_one_to_many, Entity, InsertModel, LoadNode, PatchModel,
};
use crate::schema::EntityKind;
use crate::user::{LecturerProfile, StudentProfile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "class_session_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClassSessionStatus {
    Completed,
    Ongoing,
    Upcoming,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "event_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    Upcoming,
    Ongoing,
    Concluded,
    Cancelled,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskType {
    Assignment,
    Project,
    Action,
}

/// Completion state recorded per (task, student); a missing row reads as
/// [`TaskStudentStatus::Pending`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_student_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStudentStatus {
    Completed,
    Pending,
    CompletedLate,
    Unknown,
}

/// Filter vocabulary for student task listings; extends
/// [`TaskStudentStatus`] with a grade-based variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatusFilter {
    Graded,
    Completed,
    Pending,
    CompletedLate,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "attendance_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Excused,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Course {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub overview: Option<String>,
    pub level: i32,
    pub department_id: Uuid,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_offerings: Option<Vec<CourseOffering>>,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<Box<Department>>,
}

impl Entity for Course {
    type Create = CourseCreate;
    type Patch = CoursePatch;

    const KIND: EntityKind = EntityKind::Course;

    fn id(&self) -> Uuid {
        self.id
    }

    fn load_relation<'a>(
        conn: &'a mut PgConnection,
        rows: &'a mut [Self],
        node: &'a LoadNode,
    ) -> BoxFuture<'a, DbResult<()>> {
        Box::pin(async move {
            match node.relation.name {
                "course_offerings" => {
                    load_one_to_many(conn, rows, node, |o: &CourseOffering| o.course_id, |c| {
                        &mut c.course_offerings
                    })
                    .await
                }
                "department" => {
                    load_many_to_one(conn, rows, node, |c: &Self| Some(c.department_id), |c| {
                        &mut c.department
                    })
                    .await
                }
                _ => Ok(()),
            }
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CourseCreate {
    pub name: String,
    pub code: String,
    pub overview: Option<String>,
    pub level: i32,
    pub department_id: Uuid,
}

impl InsertModel for CourseCreate {
    const COLUMNS: &'static [&'static str] =
        &["name", "code", "overview", "level", "department_id"];

    fn bind(self, row: &mut Separated<'_, '_, Postgres, &'static str>) {
        row.push_bind(self.name);
        row.push_bind(self.code);
        row.push_bind(self.overview);
        row.push_bind(self.level);
        row.push_bind(self.department_id);
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CoursePatch {
    pub name: Option<String>,
    pub code: Option<String>,
    pub overview: Option<String>,
    pub level: Option<i32>,
}

impl PatchModel for CoursePatch {
    fn is_empty(&self) -> bool {
        self.name.is_none() && self.code.is_none() && self.overview.is_none() && self.level.is_none()
    }

    fn bind(self, assignments: &mut Separated<'_, '_, Postgres, &'static str>) {
        if let Some(name) = self.name {
            assignments.push("name = ");
            assignments.push_bind_unseparated(name);
        }
        if let Some(code) = self.code {
            assignments.push("code = ");
            assignments.push_bind_unseparated(code);
        }
        if let Some(overview) = self.overview {
            assignments.push("overview = ");
            assignments.push_bind_unseparated(overview);
        }
        if let Some(level) = self.level {
            assignments.push("level = ");
            assignments.push_bind_unseparated(level);
        }
    }
}

/// A course taught in a specific (semester, session) pair; unique on that
/// triple.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CourseOffering {
    pub id: Uuid,
    pub course_id: Uuid,
    pub semester_id: Uuid,
    pub session_id: Uuid,
    pub is_active: bool,
    pub class_completed: i32,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course: Option<Box<Course>>,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_lecturers: Option<Vec<CourseLecturer>>,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_students: Option<Vec<CourseStudent>>,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semester: Option<Box<Semester>>,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<Box<Session>>,
}

impl Entity for CourseOffering {
    type Create = CourseOfferingCreate;
    type Patch = CourseOfferingPatch;

    const KIND: EntityKind = EntityKind::CourseOffering;

    fn id(&self) -> Uuid {
        self.id
    }

    fn load_relation<'a>(
        conn: &'a mut PgConnection,
        rows: &'a mut [Self],
        node: &'a LoadNode,
    ) -> BoxFuture<'a, DbResult<()>> {
        Box::pin(async move {
            match node.relation.name {
                "course" => {
                    load_many_to_one(conn, rows, node, |o: &Self| Some(o.course_id), |o| {
                        &mut o.course
                    })
                    .await
                }
                "course_lecturers" => {
                    load_one_to_many(
                        conn,
                        rows,
                        node,
                        |l: &CourseLecturer| l.course_offering_id,
                        |o| &mut o.course_lecturers,
                    )
                    .await
                }
                "course_students" => {
                    load_one_to_many(
                        conn,
                        rows,
                        node,
                        |s: &CourseStudent| s.course_offering_id,
                        |o| &mut o.course_students,
                    )
                    .await
                }
                "semester" => {
                    load_many_to_one(conn, rows, node, |o: &Self| Some(o.semester_id), |o| {
                        &mut o.semester
                    })
                    .await
                }
                "session" => {
                    load_many_to_one(conn, rows, node, |o: &Self| Some(o.session_id), |o| {
                        &mut o.session
                    })
                    .await
                }
                _ => Ok(()),
            }
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CourseOfferingCreate {
    pub course_id: Uuid,
    pub semester_id: Uuid,
    pub session_id: Uuid,
    pub is_active: bool,
}

impl InsertModel for CourseOfferingCreate {
    const COLUMNS: &'static [&'static str] =
        &["course_id", "semester_id", "session_id", "is_active"];

    fn bind(self, row: &mut Separated<'_, '_, Postgres, &'static str>) {
        row.push_bind(self.course_id);
        row.push_bind(self.semester_id);
        row.push_bind(self.session_id);
        row.push_bind(self.is_active);
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CourseOfferingPatch {
    pub is_active: Option<bool>,
    pub class_completed: Option<i32>,
}

impl PatchModel for CourseOfferingPatch {
    fn is_empty(&self) -> bool {
        self.is_active.is_none() && self.class_completed.is_none()
    }

    fn bind(self, assignments: &mut Separated<'_, '_, Postgres, &'static str>) {
        if let Some(is_active) = self.is_active {
            assignments.push("is_active = ");
            assignments.push_bind_unseparated(is_active);
        }
        if let Some(class_completed) = self.class_completed {
            assignments.push("class_completed = ");
            assignments.push_bind_unseparated(class_completed);
        }
    }
}

/// A lecturer's assignment to an offering; unique per (offering, lecturer)
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CourseLecturer {
    pub id: Uuid,
    pub lecturer_id: Uuid,
    pub course_offering_id: Uuid,
    pub class_completed: i32,
    pub status: Option<String>,
    pub assigned_at: DateTime<Utc>,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lecturer: Option<Box<LecturerProfile>>,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_offering: Option<Box<CourseOffering>>,
}

impl Entity for CourseLecturer {
    type Create = CourseLecturerCreate;
    type Patch = CourseLecturerPatch;

    const KIND: EntityKind = EntityKind::CourseLecturer;

    fn id(&self) -> Uuid {
        self.id
    }

    fn load_relation<'a>(
        conn: &'a mut PgConnection,
        rows: &'a mut [Self],
        node: &'a LoadNode,
    ) -> BoxFuture<'a, DbResult<()>> {
        Box::pin(async move {
            match node.relation.name {
                "lecturer" => {
                    load_many_to_one(conn, rows, node, |l: &Self| Some(l.lecturer_id), |l| {
                        &mut l.lecturer
                    })
                    .await
                }
                "course_offering" => {
                    load_many_to_one(
                        conn,
                        rows,
                        node,
                        |l: &Self| Some(l.course_offering_id),
                        |l| &mut l.course_offering,
                    )
                    .await
                }
                _ => Ok(()),
            }
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CourseLecturerCreate {
    pub lecturer_id: Uuid,
    pub course_offering_id: Uuid,
}

impl InsertModel for CourseLecturerCreate {
    const COLUMNS: &'static [&'static str] = &["lecturer_id", "course_offering_id"];

    fn bind(self, row: &mut Separated<'_, '_, Postgres, &'static str>) {
        row.push_bind(self.lecturer_id);
        row.push_bind(self.course_offering_id);
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CourseLecturerPatch {
    pub class_completed: Option<i32>,
    pub status: Option<String>,
}

impl PatchModel for CourseLecturerPatch {
    fn is_empty(&self) -> bool {
        self.class_completed.is_none() && self.status.is_none()
    }

    fn bind(self, assignments: &mut Separated<'_, '_, Postgres, &'static str>) {
        if let Some(class_completed) = self.class_completed {
            assignments.push("class_completed = ");
            assignments.push_bind_unseparated(class_completed);
        }
        if let Some(status) = self.status {
            assignments.push("status = ");
            assignments.push_bind_unseparated(status);
        }
    }
}

/// A student's registration in an offering; unique per (offering, student)
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CourseStudent {
    pub id: Uuid,
    pub student_id: Uuid,
    pub course_offering_id: Uuid,
    pub class_completed: i32,
    pub registered_at: DateTime<Utc>,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student: Option<Box<StudentProfile>>,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_offering: Option<Box<CourseOffering>>,
}

impl Entity for CourseStudent {
    type Create = CourseStudentCreate;
    type Patch = CourseStudentPatch;

    const KIND: EntityKind = EntityKind::CourseStudent;

    fn id(&self) -> Uuid {
        self.id
    }

    fn load_relation<'a>(
        conn: &'a mut PgConnection,
        rows: &'a mut [Self],
        node: &'a LoadNode,
    ) -> BoxFuture<'a, DbResult<()>> {
        Box::pin(async move {
            match node.relation.name {
                "student" => {
                    load_many_to_one(conn, rows, node, |s: &Self| Some(s.student_id), |s| {
                        &mut s.student
                    })
                    .await
                }
                "course_offering" => {
                    load_many_to_one(
                        conn,
                        rows,
                        node,
                        |s: &Self| Some(s.course_offering_id),
                        |s| &mut s.course_offering,
                    )
                    .await
                }
                _ => Ok(()),
            }
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CourseStudentCreate {
    pub student_id: Uuid,
    pub course_offering_id: Uuid,
}

impl InsertModel for CourseStudentCreate {
    const COLUMNS: &'static [&'static str] = &["student_id", "course_offering_id"];

    fn bind(self, row: &mut Separated<'_, '_, Postgres, &'static str>) {
        row.push_bind(self.student_id);
        row.push_bind(self.course_offering_id);
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CourseStudentPatch {
    pub class_completed: Option<i32>,
}

impl PatchModel for CourseStudentPatch {
    fn is_empty(&self) -> bool {
        self.class_completed.is_none()
    }

    fn bind(self, assignments: &mut Separated<'_, '_, Postgres, &'static str>) {
        if let Some(class_completed) = self.class_completed {
            assignments.push("class_completed = ");
            assignments.push_bind_unseparated(class_completed);
        }
    }
}

/// One held (or scheduled) lecture of an offering
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ClassSession {
    pub id: Uuid,
    pub course_offering_id: Uuid,
    pub lecturer_id: Uuid,
    pub status: ClassSessionStatus,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attendance: Option<Vec<Attendance>>,
}

impl Entity for ClassSession {
    type Create = ClassSessionCreate;
    type Patch = ClassSessionPatch;

    const KIND: EntityKind = EntityKind::ClassSession;

    fn id(&self) -> Uuid {
        self.id
    }

    fn load_relation<'a>(
        conn: &'a mut PgConnection,
        rows: &'a mut [Self],
        node: &'a LoadNode,
    ) -> BoxFuture<'a, DbResult<()>> {
        Box::pin(async move {
            match node.relation.name {
                "attendance" => {
                    load_one_to_many(conn, rows, node, |a: &Attendance| a.class_session_id, |s| {
                        &mut s.attendance
                    })
                    .await
                }
                _ => Ok(()),
            }
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClassSessionCreate {
    pub course_offering_id: Uuid,
    pub lecturer_id: Uuid,
    pub status: ClassSessionStatus,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
}

impl InsertModel for ClassSessionCreate {
    // "end" collides with a SQL keyword, so it stays quoted.
    const COLUMNS: &'static [&'static str] =
        &["course_offering_id", "lecturer_id", "status", "start", "\"end\""];

    fn bind(self, row: &mut Separated<'_, '_, Postgres, &'static str>) {
        row.push_bind(self.course_offering_id);
        row.push_bind(self.lecturer_id);
        row.push_bind(self.status);
        row.push_bind(self.start);
        row.push_bind(self.end);
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClassSessionPatch {
    pub status: Option<ClassSessionStatus>,
    pub end: Option<DateTime<Utc>>,
}

impl PatchModel for ClassSessionPatch {
    fn is_empty(&self) -> bool {
        self.status.is_none() && self.end.is_none()
    }

    fn bind(self, assignments: &mut Separated<'_, '_, Postgres, &'static str>) {
        if let Some(status) = self.status {
            assignments.push("status = ");
            assignments.push_bind_unseparated(status);
        }
        if let Some(end) = self.end {
            assignments.push("\"end\" = ");
            assignments.push_bind_unseparated(end);
        }
    }
}

/// A student's attendance record for one class session; a missing row
/// reads as not attended.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Attendance {
    pub id: Uuid,
    pub class_session_id: Uuid,
    pub student_id: Uuid,
    pub marked_at: DateTime<Utc>,
    pub status: AttendanceStatus,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_session: Option<Box<ClassSession>>,
}

impl Entity for Attendance {
    type Create = AttendanceCreate;
    type Patch = AttendancePatch;

    const KIND: EntityKind = EntityKind::Attendance;

    fn id(&self) -> Uuid {
        self.id
    }

    fn load_relation<'a>(
        conn: &'a mut PgConnection,
        rows: &'a mut [Self],
        node: &'a LoadNode,
    ) -> BoxFuture<'a, DbResult<()>> {
        Box::pin(async move {
            match node.relation.name {
                "class_session" => {
                    load_many_to_one(
                        conn,
                        rows,
                        node,
                        |a: &Self| Some(a.class_session_id),
                        |a| &mut a.class_session,
                    )
                    .await
                }
                _ => Ok(()),
            }
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttendanceCreate {
    pub class_session_id: Uuid,
    pub student_id: Uuid,
    pub status: AttendanceStatus,
}

impl InsertModel for AttendanceCreate {
    const COLUMNS: &'static [&'static str] = &["class_session_id", "student_id", "status"];

    fn bind(self, row: &mut Separated<'_, '_, Postgres, &'static str>) {
        row.push_bind(self.class_session_id);
        row.push_bind(self.student_id);
        row.push_bind(self.status);
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttendancePatch {
    pub status: Option<AttendanceStatus>,
}

impl PatchModel for AttendancePatch {
    fn is_empty(&self) -> bool {
        self.status.is_none()
    }

    fn bind(self, assignments: &mut Separated<'_, '_, Postgres, &'static str>) {
        if let Some(status) = self.status {
            assignments.push("status = ");
            assignments.push_bind_unseparated(status);
        }
    }
}

/// A lecturer's announcement to everyone registered in an offering
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Message {
    pub id: Uuid,
    pub course_offering_id: Uuid,
    pub lecturer_id: Uuid,
    pub title: Option<String>,
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_students: Option<Vec<MessageStudent>>,
}

impl Entity for Message {
    type Create = MessageCreate;
    type Patch = MessagePatch;

    const KIND: EntityKind = EntityKind::Message;

    fn id(&self) -> Uuid {
        self.id
    }

    fn load_relation<'a>(
        conn: &'a mut PgConnection,
        rows: &'a mut [Self],
        node: &'a LoadNode,
    ) -> BoxFuture<'a, DbResult<()>> {
        Box::pin(async move {
            match node.relation.name {
                "message_students" => {
                    load_one_to_many(conn, rows, node, |m: &MessageStudent| m.message_id, |m| {
                        &mut m.message_students
                    })
                    .await
                }
                _ => Ok(()),
            }
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageCreate {
    pub course_offering_id: Uuid,
    pub lecturer_id: Uuid,
    pub title: String,
    pub details: String,
}

impl InsertModel for MessageCreate {
    const COLUMNS: &'static [&'static str] =
        &["course_offering_id", "lecturer_id", "title", "details"];

    fn bind(self, row: &mut Separated<'_, '_, Postgres, &'static str>) {
        row.push_bind(self.course_offering_id);
        row.push_bind(self.lecturer_id);
        row.push_bind(self.title);
        row.push_bind(self.details);
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessagePatch {
    pub title: Option<String>,
    pub details: Option<String>,
}

impl PatchModel for MessagePatch {
    const TOUCH_UPDATED_AT: bool = true;

    fn is_empty(&self) -> bool {
        self.title.is_none() && self.details.is_none()
    }

    fn bind(self, assignments: &mut Separated<'_, '_, Postgres, &'static str>) {
        if let Some(title) = self.title {
            assignments.push("title = ");
            assignments.push_bind_unseparated(title);
        }
        if let Some(details) = self.details {
            assignments.push("details = ");
            assignments.push_bind_unseparated(details);
        }
    }
}

/// Per-student read marker for an announcement; unique per
/// (student, message)
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MessageStudent {
    pub id: Uuid,
    pub student_id: Uuid,
    pub message_id: Uuid,
    pub read: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<Box<Message>>,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student: Option<Box<StudentProfile>>,
}

impl Entity for MessageStudent {
    type Create = MessageStudentCreate;
    type Patch = MessageStudentPatch;

    const KIND: EntityKind = EntityKind::MessageStudent;

    fn id(&self) -> Uuid {
        self.id
    }

    fn load_relation<'a>(
        conn: &'a mut PgConnection,
        rows: &'a mut [Self],
        node: &'a LoadNode,
    ) -> BoxFuture<'a, DbResult<()>> {
        Box::pin(async move {
            match node.relation.name {
                "message" => {
                    load_many_to_one(conn, rows, node, |m: &Self| Some(m.message_id), |m| {
                        &mut m.message
                    })
                    .await
                }
                "student" => {
                    load_many_to_one(conn, rows, node, |m: &Self| Some(m.student_id), |m| {
                        &mut m.student
                    })
                    .await
                }
                _ => Ok(()),
            }
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageStudentCreate {
    pub student_id: Uuid,
    pub message_id: Uuid,
    pub read: bool,
}

impl InsertModel for MessageStudentCreate {
    const COLUMNS: &'static [&'static str] = &["student_id", "message_id", "read"];

    fn bind(self, row: &mut Separated<'_, '_, Postgres, &'static str>) {
        row.push_bind(self.student_id);
        row.push_bind(self.message_id);
        row.push_bind(self.read);
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageStudentPatch {
    pub read: Option<bool>,
}

impl PatchModel for MessageStudentPatch {
    const TOUCH_UPDATED_AT: bool = true;

    fn is_empty(&self) -> bool {
        self.read.is_none()
    }

    fn bind(self, assignments: &mut Separated<'_, '_, Postgres, &'static str>) {
        if let Some(read) = self.read {
            assignments.push("read = ");
            assignments.push_bind_unseparated(read);
        }
    }
}

/// Work assigned to everyone registered in an offering
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Task {
    pub id: Uuid,
    pub course_offering_id: Uuid,
    pub task_type: TaskType,
    pub lecturer_id: Uuid,
    pub title: Option<String>,
    pub details: Option<String>,
    pub status: EventStatus,
    pub deadline: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_students: Option<Vec<TaskStudent>>,
}

impl Entity for Task {
    type Create = TaskCreate;
    type Patch = TaskPatch;

    const KIND: EntityKind = EntityKind::Task;

    fn id(&self) -> Uuid {
        self.id
    }

    fn load_relation<'a>(
        conn: &'a mut PgConnection,
        rows: &'a mut [Self],
        node: &'a LoadNode,
    ) -> BoxFuture<'a, DbResult<()>> {
        Box::pin(async move {
            match node.relation.name {
                "task_students" => {
                    load_one_to_many(conn, rows, node, |t: &TaskStudent| t.task_id, |t| {
                        &mut t.task_students
                    })
                    .await
                }
                _ => Ok(()),
            }
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskCreate {
    pub course_offering_id: Uuid,
    pub task_type: TaskType,
    pub lecturer_id: Uuid,
    pub title: String,
    pub details: String,
    pub deadline: Option<DateTime<Utc>>,
}

impl InsertModel for TaskCreate {
    const COLUMNS: &'static [&'static str] = &[
        "course_offering_id",
        "task_type",
        "lecturer_id",
        "title",
        "details",
        "deadline",
    ];

    fn bind(self, row: &mut Separated<'_, '_, Postgres, &'static str>) {
        row.push_bind(self.course_offering_id);
        row.push_bind(self.task_type);
        row.push_bind(self.lecturer_id);
        row.push_bind(self.title);
        row.push_bind(self.details);
        row.push_bind(self.deadline);
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub details: Option<String>,
    pub status: Option<EventStatus>,
    pub deadline: Option<DateTime<Utc>>,
}

impl PatchModel for TaskPatch {
    const TOUCH_UPDATED_AT: bool = true;

    fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.details.is_none()
            && self.status.is_none()
            && self.deadline.is_none()
    }

    fn bind(self, assignments: &mut Separated<'_, '_, Postgres, &'static str>) {
        if let Some(title) = self.title {
            assignments.push("title = ");
            assignments.push_bind_unseparated(title);
        }
        if let Some(details) = self.details {
            assignments.push("details = ");
            assignments.push_bind_unseparated(details);
        }
        if let Some(status) = self.status {
            assignments.push("status = ");
            assignments.push_bind_unseparated(status);
        }
        if let Some(deadline) = self.deadline {
            assignments.push("deadline = ");
            assignments.push_bind_unseparated(deadline);
        }
    }
}

/// A student's completion record for a task; rows exist only once the
/// student acts, unique per (task, student).
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TaskStudent {
    pub id: Uuid,
    pub task_id: Uuid,
    pub student_id: Uuid,
    pub status: TaskStudentStatus,
    pub grade: Option<i32>,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<Box<Task>>,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student: Option<Box<StudentProfile>>,
}

impl Entity for TaskStudent {
    type Create = TaskStudentCreate;
    type Patch = TaskStudentPatch;

    const KIND: EntityKind = EntityKind::TaskStudent;

    fn id(&self) -> Uuid {
        self.id
    }

    fn load_relation<'a>(
        conn: &'a mut PgConnection,
        rows: &'a mut [Self],
        node: &'a LoadNode,
    ) -> BoxFuture<'a, DbResult<()>> {
        Box::pin(async move {
            match node.relation.name {
                "task" => {
                    load_many_to_one(conn, rows, node, |t: &Self| Some(t.task_id), |t| {
                        &mut t.task
                    })
                    .await
                }
                "student" => {
                    load_many_to_one(conn, rows, node, |t: &Self| Some(t.student_id), |t| {
                        &mut t.student
                    })
                    .await
                }
                _ => Ok(()),
            }
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskStudentCreate {
    pub task_id: Uuid,
    pub student_id: Uuid,
    pub status: TaskStudentStatus,
}

impl InsertModel for TaskStudentCreate {
    const COLUMNS: &'static [&'static str] = &["task_id", "student_id", "status"];

    fn bind(self, row: &mut Separated<'_, '_, Postgres, &'static str>) {
        row.push_bind(self.task_id);
        row.push_bind(self.student_id);
        row.push_bind(self.status);
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskStudentPatch {
    pub status: Option<TaskStudentStatus>,
    pub grade: Option<i32>,
}

impl PatchModel for TaskStudentPatch {
    fn is_empty(&self) -> bool {
        self.status.is_none() && self.grade.is_none()
    }

    fn bind(self, assignments: &mut Separated<'_, '_, Postgres, &'static str>) {
        if let Some(status) = self.status {
            assignments.push("status = ");
            assignments.push_bind_unseparated(status);
        }
        if let Some(grade) = self.grade {
            assignments.push("grade = ");
            assignments.push_bind_unseparated(grade);
        }
    }
}

#[cfg(test)]
mod tests {
    use sqlx::QueryBuilder;

    use super::*;

    #[test]
    fn test_status_enum_labels() {
        assert_eq!(
            serde_json::to_string(&TaskStudentStatus::CompletedLate).unwrap(),
            "\"COMPLETED_LATE\""
        );
        assert_eq!(
            serde_json::to_string(&EventStatus::Concluded).unwrap(),
            "\"CONCLUDED\""
        );
        assert_eq!(
            serde_json::from_str::<AttendanceStatus>("\"EXCUSED\"").unwrap(),
            AttendanceStatus::Excused
        );
        assert_eq!(
            serde_json::from_str::<TaskStatusFilter>("\"GRADED\"").unwrap(),
            TaskStatusFilter::Graded
        );
    }

    #[test]
    fn test_class_session_end_column_stays_quoted() {
        assert_eq!(ClassSessionCreate::COLUMNS[4], "\"end\"");

        let patch = ClassSessionPatch {
            end: Some(Utc::now()),
            ..Default::default()
        };
        let mut qb = QueryBuilder::new("UPDATE class_session SET ");
        {
            let mut assignments = qb.separated(", ");
            patch.bind(&mut assignments);
        }
        assert_eq!(qb.sql(), "UPDATE class_session SET \"end\" = $1");
    }

    #[test]
    fn test_task_patch_touches_updated_at() {
        assert!(TaskPatch::TOUCH_UPDATED_AT);
        assert!(MessagePatch::TOUCH_UPDATED_AT);
        assert!(MessageStudentPatch::TOUCH_UPDATED_AT);
        assert!(!TaskStudentPatch::TOUCH_UPDATED_AT);
    }

    #[test]
    fn test_task_student_patch_sql() {
        let patch = TaskStudentPatch {
            status: Some(TaskStudentStatus::Completed),
            grade: Some(85),
        };
        let mut qb = QueryBuilder::new("UPDATE task_student SET ");
        {
            let mut assignments = qb.separated(", ");
            patch.bind(&mut assignments);
        }
        assert_eq!(qb.sql(), "UPDATE task_student SET status = $1, grade = $2");
    }

    #[test]
    fn test_offering_create_has_no_generated_columns() {
        // id and class_completed come back from the database
        assert!(!CourseOfferingCreate::COLUMNS.contains(&"id"));
        assert!(!CourseOfferingCreate::COLUMNS.contains(&"class_completed"));
    }
}
