//! Repositories for the institutional entities
//!
//! Most of these are plain [`EntityRepo`] unit structs; the department and
//! session repositories add the joins the generic filter cannot express.

use sqlx::{PgConnection, Postgres, QueryBuilder};
use uuid::Uuid;

use super::models::{Department, Faculty, School, Semester, Session};
use crate::error::DbResult;
use crate::repo::{EntityRepo, Filter, Page, PaginatedResult};

#[derive(Debug, Clone, Copy, Default)]
pub struct SchoolRepo;

impl EntityRepo for SchoolRepo {
    type Entity = School;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FacultyRepo;

impl EntityRepo for FacultyRepo {
    type Entity = Faculty;
}

impl FacultyRepo {
    /// List faculties, optionally restricted to one school
    pub async fn get_faculties(
        &self,
        conn: &mut PgConnection,
        school_id: Option<Uuid>,
        page: Page,
    ) -> DbResult<Vec<Faculty>> {
        let filter = match school_id {
            Some(school_id) => Filter::new().eq("school_id", school_id),
            None => Filter::new(),
        };
        self.get_all(conn, &filter, page, 0).await
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SemesterRepo;

impl EntityRepo for SemesterRepo {
    type Entity = Semester;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SessionRepo;

impl EntityRepo for SessionRepo {
    type Entity = Session;
}

impl SessionRepo {
    /// Resolve the session a semester belongs to
    pub async fn session_id_for_semester(
        &self,
        conn: &mut PgConnection,
        semester_id: Uuid,
    ) -> DbResult<Option<Uuid>> {
        let mut qb = QueryBuilder::new(
            "SELECT s.id FROM semester m JOIN session s ON m.session_id = s.id WHERE m.id = ",
        );
        qb.push_bind(semester_id);
        let id = qb.build_query_scalar().fetch_optional(&mut *conn).await?;
        Ok(id)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DepartmentRepo;

impl EntityRepo for DepartmentRepo {
    type Entity = Department;
}

fn departments_query(
    faculty_id: Option<Uuid>,
    school_id: Option<Uuid>,
    count: bool,
    page: Page,
) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(if count {
        "SELECT COUNT(*)"
    } else {
        "SELECT d.*"
    });
    qb.push(" FROM department d JOIN faculty f ON d.faculty_id = f.id");
    let mut clause = " WHERE ";
    if let Some(faculty_id) = faculty_id {
        qb.push(clause);
        qb.push("f.id = ");
        qb.push_bind(faculty_id);
        clause = " AND ";
    }
    if let Some(school_id) = school_id {
        qb.push(clause);
        qb.push("f.school_id = ");
        qb.push_bind(school_id);
    }
    if !count {
        page.push_sql(&mut qb);
    }
    qb
}

impl DepartmentRepo {
    /// List departments, optionally restricted by faculty or school
    pub async fn get_departments(
        &self,
        conn: &mut PgConnection,
        faculty_id: Option<Uuid>,
        school_id: Option<Uuid>,
        page: Page,
    ) -> DbResult<Vec<Department>> {
        let mut qb = departments_query(faculty_id, school_id, false, page);
        let departments = qb.build_query_as().fetch_all(&mut *conn).await?;
        Ok(departments)
    }

    /// [`DepartmentRepo::get_departments`] with page metadata
    pub async fn get_departments_paginated(
        &self,
        conn: &mut PgConnection,
        faculty_id: Option<Uuid>,
        school_id: Option<Uuid>,
        skip: Option<i64>,
        limit: i64,
    ) -> DbResult<PaginatedResult<Department>> {
        let mut count_qb = departments_query(faculty_id, school_id, true, Page::all());
        let total: i64 = count_qb.build_query_scalar().fetch_one(&mut *conn).await?;
        let items = self
            .get_departments(conn, faculty_id, school_id, Page::new(skip, Some(limit)))
            .await?;
        Ok(PaginatedResult::new(total, skip, limit, items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_departments_query_unfiltered() {
        let qb = departments_query(None, None, false, Page::all());
        assert_eq!(
            qb.sql(),
            "SELECT d.* FROM department d JOIN faculty f ON d.faculty_id = f.id"
        );
    }

    #[test]
    fn test_departments_query_filters_join_with_and() {
        let qb = departments_query(Some(Uuid::nil()), Some(Uuid::nil()), false, Page::all());
        assert_eq!(
            qb.sql(),
            "SELECT d.* FROM department d JOIN faculty f ON d.faculty_id = f.id \
             WHERE f.id = $1 AND f.school_id = $2"
        );
    }

    #[test]
    fn test_departments_query_school_filter_uses_faculty_fk() {
        let qb = departments_query(None, Some(Uuid::nil()), false, Page::all());
        assert!(qb.sql().contains("f.school_id = $1"));
    }

    #[test]
    fn test_departments_count_query_ignores_window() {
        let qb = departments_query(None, None, true, Page::all());
        assert_eq!(
            qb.sql(),
            "SELECT COUNT(*) FROM department d JOIN faculty f ON d.faculty_id = f.id"
        );
    }

    #[test]
    fn test_departments_query_appends_window() {
        let qb = departments_query(None, None, false, Page::window(20, 10));
        assert!(qb.sql().ends_with(" LIMIT $1 OFFSET $2"));
    }
}
