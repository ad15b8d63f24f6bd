//! Repositories for the course domain
//!
//! The offering listings are projection queries: joins over the catalogue
//! plus JSON-aggregated lecturer and task lists, one row per offering. The
//! completion paths (task done, announcement read) are idempotent upserts
//! keyed on their unique pairs.

use chrono::NaiveDate;
use sqlx::{PgConnection, Postgres, QueryBuilder};
use uuid::Uuid;

use super::dto::{
    AttendanceRecord, LecturerOffering, OfferingDetail, OfferingSummary, StudentMessage,
    StudentOffering, StudentTask,
};
use super::models::{
    Attendance, ClassSession, Course, CourseLecturer, CourseOffering, CourseStudent, Message,
    MessageStudent, Task, TaskStatusFilter, TaskStudent, TaskStudentStatus,
};
use crate::error::DbResult;
use crate::repo::{EntityRepo, Page};

/// Assigned lecturers of the outer `co` offering row, as a JSON array
const COURSE_LECTURERS_JSON: &str = "(SELECT COALESCE(json_agg(json_build_object(\
 'id', lp.id, 'rank', lp.rank, 'title', lp.title, 'degree', lp.degree,\
 'status', lp.status, 'user_id', lp.user_id, 'first_name', u.first_name,\
 'last_name', u.last_name, 'email', u.email)), '[]'::json)\
 FROM lecturer_profile lp\
 JOIN \"user\" u ON u.id = lp.user_id\
 JOIN course_lecturer cl2 ON cl2.lecturer_id = lp.id\
 WHERE cl2.course_offering_id = co.id)";

const OFFERING_JOINS: &str = " FROM course_offering co\
 JOIN course c ON co.course_id = c.id\
 JOIN semester m ON co.semester_id = m.id\
 JOIN session s ON co.session_id = s.id";

#[derive(Debug, Clone, Copy, Default)]
pub struct CourseRepo;

impl EntityRepo for CourseRepo {
    type Entity = Course;
}

fn offerings_query(
    semester_id: Option<Uuid>,
    session_id: Option<Uuid>,
    is_active: Option<bool>,
    today: NaiveDate,
    page: Page,
) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(
        "SELECT co.id, co.course_id, co.semester_id, co.session_id, co.is_active,\
         co.class_completed, c.name AS course_name, c.code AS course_code,\
         m.name AS semester, s.name AS session",
    );
    qb.push(OFFERING_JOINS);
    match session_id {
        Some(session_id) => {
            qb.push(" WHERE co.session_id = ");
            qb.push_bind(session_id);
        }
        None => {
            // No session given: restrict to semesters currently running.
            qb.push(" WHERE m.start_date <= ");
            qb.push_bind(today);
            qb.push(" AND (m.end_date >= ");
            qb.push_bind(today);
            qb.push(" OR m.end_date IS NULL)");
        }
    }
    if let Some(is_active) = is_active {
        qb.push(" AND co.is_active = ");
        qb.push_bind(is_active);
    }
    if let Some(semester_id) = semester_id {
        qb.push(" AND co.semester_id = ");
        qb.push_bind(semester_id);
    }
    page.push_sql(&mut qb);
    qb
}

fn offering_summaries_query(
    session_id: Uuid,
    semester_id: Option<Uuid>,
    department_id: Option<Uuid>,
    page: Page,
) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(
        "SELECT co.id AS course_offering_id, c.name AS course_name, m.name AS semester,\
         s.name AS session, c.code AS course_code, m.id AS semester_id, s.id AS session_id,\
         co.class_completed AS total_class_session, ",
    );
    qb.push(COURSE_LECTURERS_JSON);
    qb.push(" AS course_lecturers");
    qb.push(OFFERING_JOINS);
    qb.push(" WHERE co.session_id = ");
    qb.push_bind(session_id);
    if let Some(semester_id) = semester_id {
        qb.push(" AND co.semester_id = ");
        qb.push_bind(semester_id);
    }
    if let Some(department_id) = department_id {
        qb.push(" AND c.department_id = ");
        qb.push_bind(department_id);
    }
    page.push_sql(&mut qb);
    qb
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CourseOfferingRepo;

impl EntityRepo for CourseOfferingRepo {
    type Entity = CourseOffering;
}

impl CourseOfferingRepo {
    /// Offerings of one session, or of every currently running semester
    /// when no session is given
    pub async fn get_session_offerings(
        &self,
        conn: &mut PgConnection,
        semester_id: Option<Uuid>,
        session_id: Option<Uuid>,
        is_active: Option<bool>,
        today: NaiveDate,
        page: Page,
    ) -> DbResult<Vec<OfferingDetail>> {
        let mut qb = offerings_query(semester_id, session_id, is_active, today, page);
        let offerings = qb.build_query_as().fetch_all(&mut *conn).await?;
        Ok(offerings)
    }

    /// Offerings of a session with their lecturers aggregated in
    pub async fn get_offering_summaries(
        &self,
        conn: &mut PgConnection,
        session_id: Uuid,
        semester_id: Option<Uuid>,
        department_id: Option<Uuid>,
        page: Page,
    ) -> DbResult<Vec<OfferingSummary>> {
        let mut qb = offering_summaries_query(session_id, semester_id, department_id, page);
        let offerings = qb.build_query_as().fetch_all(&mut *conn).await?;
        Ok(offerings)
    }
}

fn student_offerings_query(student_id: Uuid) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(
        "SELECT cs.class_completed AS class_session_attended, co.id AS course_offering_id,\
         co.class_completed AS total_class_session, c.name AS course_name,\
         m.name AS semester, s.name AS session, c.code AS course_code,\
         m.id AS semester_id, s.id AS session_id, ",
    );
    // Tasks the student has not completed yet, correlated per offering.
    qb.push(
        "(SELECT COALESCE(json_agg(json_build_object(\
         'id', t.id, 'title', t.title, 'task_type', t.task_type, 'deadline', t.deadline,\
         'created_at', t.created_at, 'status', t.status, 'details', t.details,\
         'updated_at', t.updated_at, 'lecturer_id', t.lecturer_id,\
         'course_offering_id', t.course_offering_id)), '[]'::json)\
         FROM task t\
         LEFT JOIN task_student ts ON t.id = ts.task_id AND ts.student_id = ",
    );
    qb.push_bind(student_id);
    qb.push(
        " WHERE t.course_offering_id = co.id\
         AND (ts.status IS NULL OR ts.status NOT IN ('COMPLETED', 'COMPLETED_LATE')))\
         AS pending_tasks, ",
    );
    qb.push(COURSE_LECTURERS_JSON);
    qb.push(" AS course_lecturers");
    qb.push(
        " FROM course_student cs\
         JOIN course_offering co ON cs.course_offering_id = co.id\
         JOIN course c ON co.course_id = c.id\
         JOIN semester m ON co.semester_id = m.id\
         JOIN session s ON co.session_id = s.id\
         WHERE cs.student_id = ",
    );
    qb.push_bind(student_id);
    qb
}

fn attendance_history_query(
    student_id: Uuid,
    class_session_id: Option<Uuid>,
    page: Page,
) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(
        "SELECT cs.student_id, k.id AS class_session_id,\
         COALESCE(a.status = 'PRESENT', FALSE) AS attended,\
         a.marked_at, k.start AS class_session_time\
         FROM course_student cs\
         JOIN course_offering co ON cs.course_offering_id = co.id\
         JOIN class_session k ON k.course_offering_id = co.id\
         LEFT JOIN attendance a ON a.class_session_id = k.id\
         AND a.student_id = cs.student_id\
         WHERE cs.student_id = ",
    );
    qb.push_bind(student_id);
    if let Some(class_session_id) = class_session_id {
        qb.push(" AND k.id = ");
        qb.push_bind(class_session_id);
    }
    page.push_sql(&mut qb);
    qb
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CourseStudentRepo;

impl EntityRepo for CourseStudentRepo {
    type Entity = CourseStudent;
}

impl CourseStudentRepo {
    /// Every offering the student is registered in, with pending tasks and
    /// lecturers aggregated in
    pub async fn get_student_offerings(
        &self,
        conn: &mut PgConnection,
        student_id: Uuid,
    ) -> DbResult<Vec<StudentOffering>> {
        let mut qb = student_offerings_query(student_id);
        let offerings = qb.build_query_as().fetch_all(&mut *conn).await?;
        Ok(offerings)
    }

    /// The student's per-class-session attendance outcomes
    pub async fn get_attendance_history(
        &self,
        conn: &mut PgConnection,
        student_id: Uuid,
        class_session_id: Option<Uuid>,
        page: Page,
    ) -> DbResult<Vec<AttendanceRecord>> {
        let mut qb = attendance_history_query(student_id, class_session_id, page);
        let records = qb.build_query_as().fetch_all(&mut *conn).await?;
        Ok(records)
    }
}

fn lecturer_offerings_query(lecturer_id: Uuid) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(
        "SELECT cl.class_completed AS lecture_completed, co.id AS course_offering_id,\
         c.name AS course_name, c.code AS course_code, m.name AS semester,\
         s.name AS session, m.id AS semester_id, s.id AS session_id, cl.assigned_at,\
         co.class_completed AS total_class_session, ",
    );
    qb.push(COURSE_LECTURERS_JSON);
    qb.push(" AS course_lecturers");
    qb.push(
        " FROM course_lecturer cl\
         JOIN course_offering co ON cl.course_offering_id = co.id\
         JOIN course c ON co.course_id = c.id\
         JOIN semester m ON co.semester_id = m.id\
         JOIN session s ON co.session_id = s.id\
         WHERE cl.lecturer_id = ",
    );
    qb.push_bind(lecturer_id);
    qb
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CourseLecturerRepo;

impl EntityRepo for CourseLecturerRepo {
    type Entity = CourseLecturer;
}

impl CourseLecturerRepo {
    /// Whether the lecturer is assigned to the offering
    pub async fn is_assigned(
        &self,
        conn: &mut PgConnection,
        lecturer_id: Uuid,
        course_offering_id: Uuid,
    ) -> DbResult<bool> {
        let mut qb = QueryBuilder::new(
            "SELECT EXISTS (SELECT 1 FROM course_lecturer WHERE lecturer_id = ",
        );
        qb.push_bind(lecturer_id);
        qb.push(" AND course_offering_id = ");
        qb.push_bind(course_offering_id);
        qb.push(")");
        let assigned: bool = qb.build_query_scalar().fetch_one(&mut *conn).await?;
        Ok(assigned)
    }

    /// Every offering the lecturer is assigned to, with co-lecturers
    /// aggregated in
    pub async fn get_lecturer_offerings(
        &self,
        conn: &mut PgConnection,
        lecturer_id: Uuid,
    ) -> DbResult<Vec<LecturerOffering>> {
        let mut qb = lecturer_offerings_query(lecturer_id);
        let offerings = qb.build_query_as().fetch_all(&mut *conn).await?;
        Ok(offerings)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ClassSessionRepo;

impl EntityRepo for ClassSessionRepo {
    type Entity = ClassSession;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AttendanceRepo;

impl EntityRepo for AttendanceRepo {
    type Entity = Attendance;
}

fn student_messages_query(
    student_id: Uuid,
    read: Option<bool>,
    course_offering_id: Option<Uuid>,
    page: Page,
) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(
        "SELECT msg.id, msg.course_offering_id, msg.lecturer_id, msg.title, msg.details,\
         msg.created_at, msg.updated_at, COALESCE(ms.read, FALSE) AS read\
         FROM message msg\
         LEFT JOIN message_student ms ON msg.id = ms.message_id AND ms.student_id = ",
    );
    qb.push_bind(student_id);
    // Only announcements of offerings the student is registered in.
    qb.push(
        " JOIN course_student cs ON cs.course_offering_id = msg.course_offering_id\
         AND cs.student_id = ",
    );
    qb.push_bind(student_id);
    match read {
        Some(true) => {
            qb.push(" WHERE ms.read IS TRUE");
        }
        Some(false) => {
            qb.push(" WHERE COALESCE(ms.read, FALSE) IS FALSE");
        }
        None => {
            qb.push(" WHERE TRUE");
        }
    }
    if let Some(course_offering_id) = course_offering_id {
        qb.push(" AND msg.course_offering_id = ");
        qb.push_bind(course_offering_id);
    }
    page.push_sql(&mut qb);
    qb
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MessageRepo;

impl EntityRepo for MessageRepo {
    type Entity = Message;
}

impl MessageRepo {
    /// Announcements visible to the student, read flag coalesced in
    pub async fn get_student_messages(
        &self,
        conn: &mut PgConnection,
        student_id: Uuid,
        read: Option<bool>,
        course_offering_id: Option<Uuid>,
        page: Page,
    ) -> DbResult<Vec<StudentMessage>> {
        let mut qb = student_messages_query(student_id, read, course_offering_id, page);
        let messages = qb.build_query_as().fetch_all(&mut *conn).await?;
        Ok(messages)
    }

    /// Upsert the student's read marker for an announcement
    pub async fn mark_read(
        &self,
        conn: &mut PgConnection,
        student_id: Uuid,
        message_id: Uuid,
        read: bool,
    ) -> DbResult<MessageStudent> {
        let mut qb =
            QueryBuilder::new("INSERT INTO message_student (student_id, message_id, read) VALUES (");
        let mut row = qb.separated(", ");
        row.push_bind(student_id);
        row.push_bind(message_id);
        row.push_bind(read);
        qb.push(
            ") ON CONFLICT (student_id, message_id)\
             DO UPDATE SET read = EXCLUDED.read, updated_at = now() RETURNING *",
        );
        let marker = qb.build_query_as().fetch_one(&mut *conn).await?;
        Ok(marker)
    }
}

fn student_tasks_query(
    student_id: Uuid,
    course_offering_id: Option<Uuid>,
    status: Option<TaskStatusFilter>,
    page: Page,
) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(
        "SELECT t.id AS task_id, t.course_offering_id, t.task_type, t.lecturer_id,\
         t.title, t.details, t.deadline, t.created_at, t.status AS task_status,\
         COALESCE(ts.status, 'PENDING') AS task_student_status,\
         ts.grade, ts.id AS task_student_id\
         FROM task t\
         LEFT JOIN task_student ts ON t.id = ts.task_id AND ts.student_id = ",
    );
    qb.push_bind(student_id);
    qb.push(" JOIN course_student cs ON cs.course_offering_id = t.course_offering_id");
    qb.push(" WHERE cs.student_id = ");
    qb.push_bind(student_id);
    if let Some(course_offering_id) = course_offering_id {
        qb.push(" AND t.course_offering_id = ");
        qb.push_bind(course_offering_id);
    }
    match status {
        Some(TaskStatusFilter::Graded) => {
            qb.push(" AND ts.grade IS NOT NULL");
        }
        Some(TaskStatusFilter::Pending) => {
            qb.push(" AND (ts.status IS NULL OR ts.status = 'PENDING')");
        }
        Some(TaskStatusFilter::Completed) => {
            qb.push(" AND ts.status = 'COMPLETED'");
        }
        Some(TaskStatusFilter::CompletedLate) => {
            qb.push(" AND ts.status = 'COMPLETED_LATE'");
        }
        Some(TaskStatusFilter::Unknown) => {
            qb.push(" AND ts.status = 'UNKNOWN'");
        }
        None => {}
    }
    page.push_sql(&mut qb);
    qb
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TaskRepo;

impl EntityRepo for TaskRepo {
    type Entity = Task;
}

impl TaskRepo {
    /// Tasks of every offering the student is registered in, joined with
    /// the student's own completion rows
    pub async fn get_student_tasks(
        &self,
        conn: &mut PgConnection,
        student_id: Uuid,
        course_offering_id: Option<Uuid>,
        status: Option<TaskStatusFilter>,
        page: Page,
    ) -> DbResult<Vec<StudentTask>> {
        let mut qb = student_tasks_query(student_id, course_offering_id, status, page);
        let tasks = qb.build_query_as().fetch_all(&mut *conn).await?;
        Ok(tasks)
    }

    /// Whether the task belongs to an offering the student is registered in
    pub async fn is_open_to_student(
        &self,
        conn: &mut PgConnection,
        task_id: Uuid,
        student_id: Uuid,
    ) -> DbResult<bool> {
        let mut qb = QueryBuilder::new(
            "SELECT EXISTS (SELECT 1 FROM task t\
             JOIN course_student cs ON cs.course_offering_id = t.course_offering_id\
             WHERE t.id = ",
        );
        qb.push_bind(task_id);
        qb.push(" AND cs.student_id = ");
        qb.push_bind(student_id);
        qb.push(")");
        let open: bool = qb.build_query_scalar().fetch_one(&mut *conn).await?;
        Ok(open)
    }

    /// Upsert the student's completion row for a task
    pub async fn upsert_completion(
        &self,
        conn: &mut PgConnection,
        task_id: Uuid,
        student_id: Uuid,
        status: TaskStudentStatus,
    ) -> DbResult<TaskStudent> {
        let mut qb =
            QueryBuilder::new("INSERT INTO task_student (task_id, student_id, status) VALUES (");
        let mut row = qb.separated(", ");
        row.push_bind(task_id);
        row.push_bind(student_id);
        row.push_bind(status);
        qb.push(
            ") ON CONFLICT (task_id, student_id)\
             DO UPDATE SET status = EXCLUDED.status RETURNING *",
        );
        let completion = qb.build_query_as().fetch_one(&mut *conn).await?;
        Ok(completion)
    }

    /// Record a grade on the student's completion row
    ///
    /// With a `lecturer_id`, only that lecturer's task qualifies. Returns
    /// `None` when no completion row matches.
    pub async fn grade(
        &self,
        conn: &mut PgConnection,
        task_id: Uuid,
        student_id: Uuid,
        grade: i32,
        lecturer_id: Option<Uuid>,
    ) -> DbResult<Option<TaskStudent>> {
        let mut qb = QueryBuilder::new("UPDATE task_student ts SET grade = ");
        qb.push_bind(grade);
        qb.push(" FROM task t WHERE t.id = ts.task_id AND ts.task_id = ");
        qb.push_bind(task_id);
        qb.push(" AND ts.student_id = ");
        qb.push_bind(student_id);
        if let Some(lecturer_id) = lecturer_id {
            qb.push(" AND t.lecturer_id = ");
            qb.push_bind(lecturer_id);
        }
        qb.push(" RETURNING ts.*");
        let graded = qb.build_query_as().fetch_optional(&mut *conn).await?;
        Ok(graded)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TaskStudentRepo;

impl EntityRepo for TaskStudentRepo {
    type Entity = TaskStudent;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    #[test]
    fn test_offerings_query_by_session() {
        let qb = offerings_query(None, Some(Uuid::nil()), None, today(), Page::all());
        let sql = qb.sql();
        assert!(sql.contains(" WHERE co.session_id = $1"));
        assert!(!sql.contains("start_date"));
    }

    #[test]
    fn test_offerings_query_defaults_to_current_window() {
        let qb = offerings_query(None, None, None, today(), Page::all());
        let sql = qb.sql();
        assert!(sql.contains("m.start_date <= $1"));
        assert!(sql.contains("(m.end_date >= $2 OR m.end_date IS NULL)"));
    }

    #[test]
    fn test_offerings_query_stacks_filters() {
        let qb = offerings_query(
            Some(Uuid::nil()),
            Some(Uuid::nil()),
            Some(true),
            today(),
            Page::window(0, 20),
        );
        let sql = qb.sql();
        assert!(sql.contains("co.session_id = $1"));
        assert!(sql.contains("co.is_active = $2"));
        assert!(sql.contains("co.semester_id = $3"));
        assert!(sql.ends_with(" LIMIT $4 OFFSET $5"));
    }

    #[test]
    fn test_offering_summaries_query_correlates_lecturers() {
        let qb = offering_summaries_query(Uuid::nil(), None, Some(Uuid::nil()), Page::all());
        let sql = qb.sql();
        assert!(sql.contains("WHERE cl2.course_offering_id = co.id"));
        assert!(sql.contains("c.department_id = $2"));
    }

    #[test]
    fn test_student_offerings_query_excludes_completed_tasks() {
        let qb = student_offerings_query(Uuid::nil());
        let sql = qb.sql();
        assert!(sql.contains("ts.status IS NULL OR ts.status NOT IN ('COMPLETED', 'COMPLETED_LATE')"));
        assert!(sql.contains("WHERE cs.student_id = $2"));
    }

    #[test]
    fn test_student_messages_query_read_filters() {
        let sql_all = student_messages_query(Uuid::nil(), None, None, Page::all());
        assert!(sql_all.sql().contains("COALESCE(ms.read, FALSE) AS read"));

        let sql_read = student_messages_query(Uuid::nil(), Some(true), None, Page::all());
        assert!(sql_read.sql().contains("ms.read IS TRUE"));

        let sql_unread = student_messages_query(Uuid::nil(), Some(false), None, Page::all());
        assert!(sql_unread.sql().contains("COALESCE(ms.read, FALSE) IS FALSE"));
    }

    #[test]
    fn test_student_messages_query_gated_on_registration() {
        let qb = student_messages_query(Uuid::nil(), None, Some(Uuid::nil()), Page::all());
        let sql = qb.sql();
        assert!(sql.contains("JOIN course_student cs ON cs.course_offering_id = msg.course_offering_id"));
        assert!(sql.contains("msg.course_offering_id = $3"));
    }

    #[test]
    fn test_student_tasks_query_status_filters() {
        let graded = student_tasks_query(Uuid::nil(), None, Some(TaskStatusFilter::Graded), Page::all());
        assert!(graded.sql().contains("ts.grade IS NOT NULL"));

        let pending =
            student_tasks_query(Uuid::nil(), None, Some(TaskStatusFilter::Pending), Page::all());
        assert!(pending
            .sql()
            .contains("(ts.status IS NULL OR ts.status = 'PENDING')"));

        let late = student_tasks_query(
            Uuid::nil(),
            None,
            Some(TaskStatusFilter::CompletedLate),
            Page::all(),
        );
        assert!(late.sql().contains("ts.status = 'COMPLETED_LATE'"));
    }

    #[test]
    fn test_student_tasks_query_coalesces_missing_rows_to_pending() {
        let qb = student_tasks_query(Uuid::nil(), None, None, Page::all());
        assert!(qb
            .sql()
            .contains("COALESCE(ts.status, 'PENDING') AS task_student_status"));
    }

    #[test]
    fn test_attendance_history_query_marks_present_as_attended() {
        let qb = attendance_history_query(Uuid::nil(), Some(Uuid::nil()), Page::all());
        let sql = qb.sql();
        assert!(sql.contains("COALESCE(a.status = 'PRESENT', FALSE) AS attended"));
        assert!(sql.contains("k.id = $2"));
    }
}
