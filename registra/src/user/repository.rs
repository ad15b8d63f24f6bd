//! Repositories for accounts and role profiles
//!
//! The detail listings join profile, account and department and aggregate
//! each person's course offerings into a JSON column, so one row carries
//! the whole read shape.

use sqlx::{PgConnection, Postgres, QueryBuilder};
use uuid::Uuid;

use super::dto::{LecturerDetails, StudentDetails};
use super::models::{LecturerProfile, StudentProfile, User};
use crate::error::DbResult;
use crate::repo::{EntityRepo, Page, PaginatedResult};

#[derive(Debug, Clone, Copy, Default)]
pub struct UserRepo;

impl EntityRepo for UserRepo {
    type Entity = User;
}

const LECTURER_OFFERINGS_JSON: &str = "(SELECT COALESCE(json_agg(json_build_object(\
 'id', co2.id, 'course_id', c2.id, 'semester_id', m2.id, 'session_id', s2.id,\
 'is_active', co2.is_active, 'class_completed', co2.class_completed,\
 'semester', m2.name, 'course_code', c2.code, 'course_name', c2.name)), '[]'::json)\
 FROM course_offering co2\
 JOIN course c2 ON co2.course_id = c2.id\
 JOIN semester m2 ON co2.semester_id = m2.id\
 JOIN session s2 ON co2.session_id = s2.id\
 JOIN course_lecturer cl2 ON cl2.course_offering_id = co2.id\
 WHERE cl2.lecturer_id = lp.id)";

const STUDENT_OFFERINGS_JSON: &str = "(SELECT COALESCE(json_agg(json_build_object(\
 'id', co2.id, 'course_id', c2.id, 'semester_id', m2.id, 'session_id', s2.id,\
 'is_active', co2.is_active, 'class_completed', co2.class_completed,\
 'semester', m2.name, 'course_code', c2.code, 'course_name', c2.name)), '[]'::json)\
 FROM course_offering co2\
 JOIN course c2 ON co2.course_id = c2.id\
 JOIN semester m2 ON co2.semester_id = m2.id\
 JOIN session s2 ON co2.session_id = s2.id\
 JOIN course_student cs2 ON cs2.course_offering_id = co2.id\
 WHERE cs2.student_id = sp.id)";

fn lecturers_query(
    department_id: Option<Uuid>,
    session_id: Option<Uuid>,
    course_offering_id: Option<Uuid>,
    count: bool,
    page: Page,
) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("SELECT ");
    if count {
        qb.push("COUNT(*)");
    } else {
        qb.push(
            "lp.id, lp.user_id, u.first_name, u.last_name, u.email, u.department_id,\
             lp.rank, lp.title, lp.degree, lp.status, d.name AS department, ",
        );
        qb.push(LECTURER_OFFERINGS_JSON);
        qb.push(" AS course_offerings");
    }
    qb.push(
        " FROM lecturer_profile lp\
         JOIN \"user\" u ON lp.user_id = u.id\
         JOIN department d ON u.department_id = d.id\
         JOIN course_lecturer cl ON cl.lecturer_id = lp.id\
         JOIN course_offering co ON co.id = cl.course_offering_id\
         JOIN session s ON co.session_id = s.id",
    );
    let mut clause = " WHERE ";
    if let Some(department_id) = department_id {
        qb.push(clause);
        qb.push("d.id = ");
        qb.push_bind(department_id);
        clause = " AND ";
    }
    if let Some(session_id) = session_id {
        qb.push(clause);
        qb.push("s.id = ");
        qb.push_bind(session_id);
        clause = " AND ";
    }
    if let Some(course_offering_id) = course_offering_id {
        qb.push(clause);
        qb.push("cl.course_offering_id = ");
        qb.push_bind(course_offering_id);
    }
    if !count {
        page.push_sql(&mut qb);
    }
    qb
}

fn students_query(
    department_id: Option<Uuid>,
    session_id: Option<Uuid>,
    admission_session_id: Option<Uuid>,
    course_offering_id: Option<Uuid>,
    count: bool,
    page: Page,
) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("SELECT ");
    if count {
        qb.push("COUNT(*)");
    } else {
        qb.push(
            "sp.id, sp.matric_number, sp.admission_session_id, sp.status,\
             u.id AS user_id, u.first_name, u.last_name, u.email, u.department_id,\
             d.name AS department, ",
        );
        qb.push(STUDENT_OFFERINGS_JSON);
        qb.push(" AS course_offerings");
    }
    qb.push(
        " FROM student_profile sp\
         JOIN \"user\" u ON sp.user_id = u.id\
         JOIN department d ON u.department_id = d.id\
         JOIN course_student cs ON cs.student_id = sp.id\
         JOIN course_offering co ON co.id = cs.course_offering_id\
         JOIN session s ON co.session_id = s.id",
    );
    let mut clause = " WHERE ";
    if let Some(department_id) = department_id {
        qb.push(clause);
        qb.push("d.id = ");
        qb.push_bind(department_id);
        clause = " AND ";
    }
    if let Some(session_id) = session_id {
        qb.push(clause);
        qb.push("s.id = ");
        qb.push_bind(session_id);
        clause = " AND ";
    }
    if let Some(admission_session_id) = admission_session_id {
        qb.push(clause);
        qb.push("sp.admission_session_id = ");
        qb.push_bind(admission_session_id);
        clause = " AND ";
    }
    if let Some(course_offering_id) = course_offering_id {
        qb.push(clause);
        qb.push("cs.course_offering_id = ");
        qb.push_bind(course_offering_id);
    }
    if !count {
        page.push_sql(&mut qb);
    }
    qb
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LecturerProfileRepo;

impl EntityRepo for LecturerProfileRepo {
    type Entity = LecturerProfile;
}

impl LecturerProfileRepo {
    /// Lecturer detail listing, filtered by department, session or offering
    pub async fn get_lecturers_with_details(
        &self,
        conn: &mut PgConnection,
        department_id: Option<Uuid>,
        session_id: Option<Uuid>,
        course_offering_id: Option<Uuid>,
        page: Page,
    ) -> DbResult<Vec<LecturerDetails>> {
        let mut qb = lecturers_query(department_id, session_id, course_offering_id, false, page);
        let lecturers = qb.build_query_as().fetch_all(&mut *conn).await?;
        Ok(lecturers)
    }

    /// [`LecturerProfileRepo::get_lecturers_with_details`] with page metadata
    pub async fn get_lecturers_with_details_paginated(
        &self,
        conn: &mut PgConnection,
        department_id: Option<Uuid>,
        session_id: Option<Uuid>,
        course_offering_id: Option<Uuid>,
        skip: Option<i64>,
        limit: i64,
    ) -> DbResult<PaginatedResult<LecturerDetails>> {
        let mut count_qb =
            lecturers_query(department_id, session_id, course_offering_id, true, Page::all());
        let total: i64 = count_qb.build_query_scalar().fetch_one(&mut *conn).await?;
        let items = self
            .get_lecturers_with_details(
                conn,
                department_id,
                session_id,
                course_offering_id,
                Page::new(skip, Some(limit)),
            )
            .await?;
        Ok(PaginatedResult::new(total, skip, limit, items))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StudentProfileRepo;

impl EntityRepo for StudentProfileRepo {
    type Entity = StudentProfile;
}

impl StudentProfileRepo {
    /// Student detail listing, filtered by department, session, admission
    /// session or offering
    pub async fn get_students_with_details(
        &self,
        conn: &mut PgConnection,
        department_id: Option<Uuid>,
        session_id: Option<Uuid>,
        admission_session_id: Option<Uuid>,
        course_offering_id: Option<Uuid>,
        page: Page,
    ) -> DbResult<Vec<StudentDetails>> {
        let mut qb = students_query(
            department_id,
            session_id,
            admission_session_id,
            course_offering_id,
            false,
            page,
        );
        let students = qb.build_query_as().fetch_all(&mut *conn).await?;
        Ok(students)
    }

    /// [`StudentProfileRepo::get_students_with_details`] with page metadata
    pub async fn get_students_with_details_paginated(
        &self,
        conn: &mut PgConnection,
        department_id: Option<Uuid>,
        session_id: Option<Uuid>,
        admission_session_id: Option<Uuid>,
        course_offering_id: Option<Uuid>,
        skip: Option<i64>,
        limit: i64,
    ) -> DbResult<PaginatedResult<StudentDetails>> {
        let mut count_qb = students_query(
            department_id,
            session_id,
            admission_session_id,
            course_offering_id,
            true,
            Page::all(),
        );
        let total: i64 = count_qb.build_query_scalar().fetch_one(&mut *conn).await?;
        let items = self
            .get_students_with_details(
                conn,
                department_id,
                session_id,
                admission_session_id,
                course_offering_id,
                Page::new(skip, Some(limit)),
            )
            .await?;
        Ok(PaginatedResult::new(total, skip, limit, items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lecturers_query_unfiltered_shape() {
        let qb = lecturers_query(None, None, None, false, Page::all());
        let sql = qb.sql();
        assert!(sql.starts_with("SELECT lp.id, lp.user_id"));
        assert!(sql.contains("json_agg(json_build_object("));
        assert!(sql.contains("WHERE cl2.lecturer_id = lp.id"));
        assert!(!sql.contains(" WHERE d.id"));
    }

    #[test]
    fn test_lecturers_query_filters_in_order() {
        let qb = lecturers_query(
            Some(Uuid::nil()),
            Some(Uuid::nil()),
            Some(Uuid::nil()),
            false,
            Page::all(),
        );
        let sql = qb.sql();
        assert!(sql.contains(" WHERE d.id = $1 AND s.id = $2 AND cl.course_offering_id = $3"));
    }

    #[test]
    fn test_lecturers_count_query_drops_projection_and_window() {
        let qb = lecturers_query(None, Some(Uuid::nil()), None, true, Page::all());
        let sql = qb.sql();
        assert!(sql.starts_with("SELECT COUNT(*) FROM lecturer_profile lp"));
        assert!(!sql.contains("json_agg"));
        assert!(!sql.contains("LIMIT"));
        assert!(sql.contains(" WHERE s.id = $1"));
    }

    #[test]
    fn test_students_query_admission_filter() {
        let qb = students_query(None, None, Some(Uuid::nil()), None, false, Page::all());
        assert!(qb.sql().contains(" WHERE sp.admission_session_id = $1"));
    }

    #[test]
    fn test_students_query_aggregates_over_registrations() {
        let qb = students_query(None, None, None, None, false, Page::window(0, 20));
        let sql = qb.sql();
        assert!(sql.contains("WHERE cs2.student_id = sp.id"));
        assert!(sql.ends_with(" LIMIT $1 OFFSET $2"));
    }
}
