//! Institution service: schools, faculties, departments and academic terms
//!
//! Each write runs in its own transaction and classifies constraint
//! violations into [`Error::Duplicate`] or [`Error::Dependency`]. Reads
//! borrow a pool connection directly.

use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use super::models::{
    Department, DepartmentCreate, Faculty, FacultyCreate, School, SchoolCreate, Semester,
    SemesterCreate, SemesterName, Session, SessionCreate,
};
use super::repository::{DepartmentRepo, FacultyRepo, SchoolRepo, SemesterRepo, SessionRepo};
use crate::config::RepositoryConfig;
use crate::db::transaction;
use crate::error::{DatabaseError, Error, Result};
use crate::repo::{EntityRepo, Filter, Page, PaginatedResult};

/// An academic year together with its two semesters, created in one call
///
/// The session spans from the first semester's start to the second
/// semester's end; activity flags are derived from today's date.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionTermsCreate {
    pub name: String,
    pub school_id: Uuid,
    pub first_semester_start: NaiveDate,
    pub first_semester_end: NaiveDate,
    pub second_semester_start: NaiveDate,
    pub second_semester_end: NaiveDate,
}

/// True when `today` falls inside the `[start, end]` window
///
/// An absent end date leaves the window open on the right.
fn active_within(start: NaiveDate, end: Option<NaiveDate>, today: NaiveDate) -> bool {
    start <= today && end.is_none_or(|end| today <= end)
}

/// Operations on the institutional hierarchy
#[derive(Debug, Clone)]
pub struct InstitutionService {
    pool: PgPool,
    defaults: RepositoryConfig,
    schools: SchoolRepo,
    faculties: FacultyRepo,
    departments: DepartmentRepo,
    sessions: SessionRepo,
    semesters: SemesterRepo,
}

impl InstitutionService {
    pub fn new(pool: PgPool) -> Self {
        Self::with_defaults(pool, RepositoryConfig::default())
    }

    pub fn with_defaults(pool: PgPool, defaults: RepositoryConfig) -> Self {
        Self {
            pool,
            defaults,
            schools: SchoolRepo,
            faculties: FacultyRepo,
            departments: DepartmentRepo,
            sessions: SessionRepo,
            semesters: SemesterRepo,
        }
    }

    pub async fn create_school(&self, input: SchoolCreate) -> Result<School> {
        let schools = self.schools;
        let school = transaction(&self.pool, move |conn| {
            Box::pin(async move {
                schools
                    .create_one(conn, input)
                    .await
                    .map_err(|e| Error::from_write(e, "school", "school"))
            })
        })
        .await?;
        tracing::info!(school_id = %school.id, "school created");
        Ok(school)
    }

    /// Fetch a school with its faculties and their departments loaded
    pub async fn get_school(&self, id: Uuid) -> Result<School> {
        let mut conn = self.pool.acquire().await.map_err(DatabaseError::from)?;
        self.schools
            .get_one_by_id(&mut conn, id, self.defaults.default_load_depth)
            .await?
            .ok_or_else(|| Error::NotFound("school".to_string()))
    }

    pub async fn get_schools(&self, page: Page) -> Result<Vec<School>> {
        let mut conn = self.pool.acquire().await.map_err(DatabaseError::from)?;
        let schools = self.schools.get_all(&mut conn, &Filter::new(), page, 0).await?;
        Ok(schools)
    }

    pub async fn create_faculty(&self, input: FacultyCreate) -> Result<Faculty> {
        let faculties = self.faculties;
        let faculty = transaction(&self.pool, move |conn| {
            Box::pin(async move {
                faculties
                    .create_one(conn, input)
                    .await
                    .map_err(|e| Error::from_write(e, "faculty", "school"))
            })
        })
        .await?;
        tracing::info!(faculty_id = %faculty.id, "faculty created");
        Ok(faculty)
    }

    /// Fetch a faculty with its school and departments loaded
    pub async fn get_faculty(&self, id: Uuid) -> Result<Faculty> {
        let mut conn = self.pool.acquire().await.map_err(DatabaseError::from)?;
        self.faculties
            .get_one_by_id(&mut conn, id, self.defaults.default_load_depth)
            .await?
            .ok_or_else(|| Error::NotFound("faculty".to_string()))
    }

    pub async fn get_faculties(&self, school_id: Option<Uuid>, page: Page) -> Result<Vec<Faculty>> {
        let mut conn = self.pool.acquire().await.map_err(DatabaseError::from)?;
        let faculties = self.faculties.get_faculties(&mut conn, school_id, page).await?;
        Ok(faculties)
    }

    pub async fn create_department(&self, input: DepartmentCreate) -> Result<Department> {
        let departments = self.departments;
        let department = transaction(&self.pool, move |conn| {
            Box::pin(async move {
                departments
                    .create_one(conn, input)
                    .await
                    .map_err(|e| Error::from_write(e, "department", "faculty"))
            })
        })
        .await?;
        tracing::info!(department_id = %department.id, "department created");
        Ok(department)
    }

    /// Fetch a department with its faculty, members and courses loaded
    pub async fn get_department(&self, id: Uuid) -> Result<Department> {
        let mut conn = self.pool.acquire().await.map_err(DatabaseError::from)?;
        self.departments
            .get_one_by_id(&mut conn, id, self.defaults.default_load_depth)
            .await?
            .ok_or_else(|| Error::NotFound("department".to_string()))
    }

    pub async fn get_departments(
        &self,
        faculty_id: Option<Uuid>,
        school_id: Option<Uuid>,
        page: Page,
    ) -> Result<Vec<Department>> {
        let mut conn = self.pool.acquire().await.map_err(DatabaseError::from)?;
        let departments = self
            .departments
            .get_departments(&mut conn, faculty_id, school_id, page)
            .await?;
        Ok(departments)
    }

    pub async fn get_departments_paginated(
        &self,
        faculty_id: Option<Uuid>,
        school_id: Option<Uuid>,
        skip: Option<i64>,
        limit: Option<i64>,
    ) -> Result<PaginatedResult<Department>> {
        let mut conn = self.pool.acquire().await.map_err(DatabaseError::from)?;
        let limit = limit.unwrap_or(self.defaults.default_page_size);
        let page = self
            .departments
            .get_departments_paginated(&mut conn, faculty_id, school_id, skip, limit)
            .await?;
        Ok(page)
    }

    /// Create an academic year with its first and second semesters
    ///
    /// All three rows land in one transaction; the returned session carries
    /// the created semesters.
    pub async fn create_session(&self, input: SessionTermsCreate) -> Result<Session> {
        let sessions = self.sessions;
        let semesters = self.semesters;
        let today = Utc::now().date_naive();
        let session = transaction(&self.pool, move |conn| {
            Box::pin(async move {
                let mut session = sessions
                    .create_one(
                        conn,
                        SessionCreate {
                            name: input.name,
                            school_id: input.school_id,
                            start_date: input.first_semester_start,
                            end_date: Some(input.second_semester_end),
                            is_active: active_within(
                                input.first_semester_start,
                                Some(input.second_semester_end),
                                today,
                            ),
                        },
                    )
                    .await
                    .map_err(|e| Error::from_write(e, "session", "school"))?;
                let terms = semesters
                    .create_multiple(
                        conn,
                        vec![
                            SemesterCreate {
                                session_id: session.id,
                                name: SemesterName::First,
                                start_date: input.first_semester_start,
                                end_date: Some(input.first_semester_end),
                                is_active: active_within(
                                    input.first_semester_start,
                                    Some(input.first_semester_end),
                                    today,
                                ),
                            },
                            SemesterCreate {
                                session_id: session.id,
                                name: SemesterName::Second,
                                start_date: input.second_semester_start,
                                end_date: Some(input.second_semester_end),
                                is_active: active_within(
                                    input.second_semester_start,
                                    Some(input.second_semester_end),
                                    today,
                                ),
                            },
                        ],
                    )
                    .await
                    .map_err(|e| Error::from_write(e, "semester", "session"))?;
                session.semesters = Some(terms);
                Ok::<_, Error>(session)
            })
        })
        .await?;
        tracing::info!(session_id = %session.id, name = %session.name, "session created");
        Ok(session)
    }

    /// Fetch a session with its semesters and offerings loaded
    pub async fn get_session(&self, id: Uuid) -> Result<Session> {
        let mut conn = self.pool.acquire().await.map_err(DatabaseError::from)?;
        self.sessions
            .get_one_by_id(&mut conn, id, 1)
            .await?
            .ok_or_else(|| Error::NotFound("session".to_string()))
    }

    pub async fn get_sessions(&self, school_id: Option<Uuid>, page: Page) -> Result<Vec<Session>> {
        let mut conn = self.pool.acquire().await.map_err(DatabaseError::from)?;
        let filter = match school_id {
            Some(school_id) => Filter::new().eq("school_id", school_id),
            None => Filter::new(),
        };
        let sessions = self.sessions.get_all(&mut conn, &filter, page, 0).await?;
        Ok(sessions)
    }

    /// Fetch a semester with its session loaded
    pub async fn get_semester(&self, id: Uuid) -> Result<Semester> {
        let mut conn = self.pool.acquire().await.map_err(DatabaseError::from)?;
        self.semesters
            .get_one_by_id(&mut conn, id, 1)
            .await?
            .ok_or_else(|| Error::NotFound("semester".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_active_within_inside_window() {
        assert!(active_within(
            date(2025, 1, 10),
            Some(date(2025, 5, 30)),
            date(2025, 3, 1)
        ));
    }

    #[test]
    fn test_active_within_boundaries_inclusive() {
        let start = date(2025, 1, 10);
        let end = date(2025, 5, 30);
        assert!(active_within(start, Some(end), start));
        assert!(active_within(start, Some(end), end));
    }

    #[test]
    fn test_active_within_outside_window() {
        let start = date(2025, 1, 10);
        let end = date(2025, 5, 30);
        assert!(!active_within(start, Some(end), date(2025, 1, 9)));
        assert!(!active_within(start, Some(end), date(2025, 5, 31)));
    }

    #[test]
    fn test_active_within_open_ended() {
        assert!(active_within(date(2025, 1, 10), None, date(2030, 1, 1)));
        assert!(!active_within(date(2025, 1, 10), None, date(2024, 12, 31)));
    }

    #[test]
    fn test_session_terms_create_deserializes() {
        let input: SessionTermsCreate = serde_json::from_value(serde_json::json!({
            "name": "2024/2025",
            "school_id": "00000000-0000-0000-0000-000000000001",
            "first_semester_start": "2024-09-16",
            "first_semester_end": "2025-01-31",
            "second_semester_start": "2025-02-17",
            "second_semester_end": "2025-06-27",
        }))
        .unwrap();
        assert_eq!(input.name, "2024/2025");
        assert_eq!(input.second_semester_end, date(2025, 6, 27));
    }
}
