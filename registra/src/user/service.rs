//! User service: accounts, student/lecturer profiles and dashboards
//!
//! Student and lecturer creation write the account row and the profile row
//! in one transaction, so a rejected profile never leaves an orphaned
//! account behind.

use sqlx::PgPool;
use uuid::Uuid;

use super::dto::{
    LecturerDashboard, LecturerDetails, NewLecturer, NewStudent, StudentDashboard, StudentDetails,
};
use super::models::{
    LecturerProfile, LecturerProfileCreate, StudentProfile, StudentProfileCreate, User, UserCreate,
};
use super::repository::{LecturerProfileRepo, StudentProfileRepo, UserRepo};
use crate::config::RepositoryConfig;
use crate::course::{CourseLecturerRepo, CourseStudentRepo};
use crate::db::transaction;
use crate::error::{DatabaseError, Error, Result};
use crate::repo::{EntityRepo, Filter, Page, PaginatedResult};

/// Operations on accounts and their role profiles
#[derive(Debug, Clone)]
pub struct UserService {
    pool: PgPool,
    defaults: RepositoryConfig,
    users: UserRepo,
    students: StudentProfileRepo,
    lecturers: LecturerProfileRepo,
    course_students: CourseStudentRepo,
    course_lecturers: CourseLecturerRepo,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self::with_defaults(pool, RepositoryConfig::default())
    }

    pub fn with_defaults(pool: PgPool, defaults: RepositoryConfig) -> Self {
        Self {
            pool,
            defaults,
            users: UserRepo,
            students: StudentProfileRepo,
            lecturers: LecturerProfileRepo,
            course_students: CourseStudentRepo,
            course_lecturers: CourseLecturerRepo,
        }
    }

    /// Create a bare account with no role profile
    pub async fn create_user(&self, input: UserCreate) -> Result<User> {
        let users = self.users;
        let user = transaction(&self.pool, move |conn| {
            Box::pin(async move {
                users
                    .create_one(conn, input)
                    .await
                    .map_err(|e| Error::from_write(e, "user", "department"))
            })
        })
        .await?;
        tracing::info!(user_id = %user.id, user_type = ?user.user_type, "user created");
        Ok(user)
    }

    /// Create a student: account row plus student profile, atomically
    ///
    /// A duplicate email or matric number reports [`Error::Duplicate`]; a
    /// missing department or admission session reports [`Error::Dependency`].
    pub async fn create_student(&self, input: NewStudent) -> Result<User> {
        let users = self.users;
        let students = self.students;
        let user = transaction(&self.pool, move |conn| {
            Box::pin(async move {
                let mut user = users
                    .create_one(
                        conn,
                        UserCreate {
                            first_name: input.first_name,
                            last_name: input.last_name,
                            email: input.email,
                            phone_number: input.phone_number,
                            password: input.password,
                            user_type: input.user_type,
                            department_id: input.department_id,
                        },
                    )
                    .await
                    .map_err(|e| Error::from_write(e, "user", "department"))?;
                let profile = students
                    .create_one(
                        conn,
                        StudentProfileCreate {
                            user_id: user.id,
                            matric_number: input.matric_number,
                            admission_session_id: input.admission_session_id,
                            status: input.status,
                        },
                    )
                    .await
                    .map_err(|e| Error::from_write(e, "student", "session"))?;
                user.student_profile = Some(Box::new(profile));
                Ok::<_, Error>(user)
            })
        })
        .await?;
        tracing::info!(user_id = %user.id, "student created");
        Ok(user)
    }

    /// Create a lecturer: account row plus lecturer profile, atomically
    pub async fn create_lecturer(&self, input: NewLecturer) -> Result<User> {
        let users = self.users;
        let lecturers = self.lecturers;
        let user = transaction(&self.pool, move |conn| {
            Box::pin(async move {
                let mut user = users
                    .create_one(
                        conn,
                        UserCreate {
                            first_name: input.first_name,
                            last_name: input.last_name,
                            email: input.email,
                            phone_number: input.phone_number,
                            password: input.password,
                            user_type: input.user_type,
                            department_id: input.department_id,
                        },
                    )
                    .await
                    .map_err(|e| Error::from_write(e, "user", "department"))?;
                let profile = lecturers
                    .create_one(
                        conn,
                        LecturerProfileCreate {
                            user_id: user.id,
                            rank: input.rank,
                            title: input.title,
                            degree: input.degree,
                            status: input.status,
                        },
                    )
                    .await
                    .map_err(|e| Error::from_write(e, "lecturer", "user"))?;
                user.lecturer_profile = Some(Box::new(profile));
                Ok::<_, Error>(user)
            })
        })
        .await?;
        tracing::info!(user_id = %user.id, "lecturer created");
        Ok(user)
    }

    /// Fetch an account with its department and role profile loaded
    pub async fn get_user(&self, id: Uuid) -> Result<User> {
        let mut conn = self.pool.acquire().await.map_err(DatabaseError::from)?;
        self.users
            .get_one_by_id(&mut conn, id, 1)
            .await?
            .ok_or_else(|| Error::NotFound("user".to_string()))
    }

    pub async fn get_users(&self, department_id: Option<Uuid>, page: Page) -> Result<Vec<User>> {
        let mut conn = self.pool.acquire().await.map_err(DatabaseError::from)?;
        let filter = match department_id {
            Some(department_id) => Filter::new().eq("department_id", department_id),
            None => Filter::new(),
        };
        let users = self.users.get_all(&mut conn, &filter, page, 0).await?;
        Ok(users)
    }

    /// Fetch a student profile with its account loaded
    pub async fn get_student(&self, id: Uuid) -> Result<StudentProfile> {
        let mut conn = self.pool.acquire().await.map_err(DatabaseError::from)?;
        self.students
            .get_one_by_id(&mut conn, id, 1)
            .await?
            .ok_or_else(|| Error::NotFound("student".to_string()))
    }

    /// Fetch a lecturer profile with its account loaded
    pub async fn get_lecturer(&self, id: Uuid) -> Result<LecturerProfile> {
        let mut conn = self.pool.acquire().await.map_err(DatabaseError::from)?;
        self.lecturers
            .get_one_by_id(&mut conn, id, 1)
            .await?
            .ok_or_else(|| Error::NotFound("lecturer".to_string()))
    }

    pub async fn get_lecturers(
        &self,
        department_id: Option<Uuid>,
        session_id: Option<Uuid>,
        course_offering_id: Option<Uuid>,
        page: Page,
    ) -> Result<Vec<LecturerDetails>> {
        let mut conn = self.pool.acquire().await.map_err(DatabaseError::from)?;
        let lecturers = self
            .lecturers
            .get_lecturers_with_details(&mut conn, department_id, session_id, course_offering_id, page)
            .await?;
        Ok(lecturers)
    }

    pub async fn get_lecturers_paginated(
        &self,
        department_id: Option<Uuid>,
        session_id: Option<Uuid>,
        course_offering_id: Option<Uuid>,
        skip: Option<i64>,
        limit: Option<i64>,
    ) -> Result<PaginatedResult<LecturerDetails>> {
        let mut conn = self.pool.acquire().await.map_err(DatabaseError::from)?;
        let limit = limit.unwrap_or(self.defaults.default_page_size);
        let page = self
            .lecturers
            .get_lecturers_with_details_paginated(
                &mut conn,
                department_id,
                session_id,
                course_offering_id,
                skip,
                limit,
            )
            .await?;
        Ok(page)
    }

    pub async fn get_students(
        &self,
        department_id: Option<Uuid>,
        session_id: Option<Uuid>,
        admission_session_id: Option<Uuid>,
        course_offering_id: Option<Uuid>,
        page: Page,
    ) -> Result<Vec<StudentDetails>> {
        let mut conn = self.pool.acquire().await.map_err(DatabaseError::from)?;
        let students = self
            .students
            .get_students_with_details(
                &mut conn,
                department_id,
                session_id,
                admission_session_id,
                course_offering_id,
                page,
            )
            .await?;
        Ok(students)
    }

    pub async fn get_students_paginated(
        &self,
        department_id: Option<Uuid>,
        session_id: Option<Uuid>,
        admission_session_id: Option<Uuid>,
        course_offering_id: Option<Uuid>,
        skip: Option<i64>,
        limit: Option<i64>,
    ) -> Result<PaginatedResult<StudentDetails>> {
        let mut conn = self.pool.acquire().await.map_err(DatabaseError::from)?;
        let limit = limit.unwrap_or(self.defaults.default_page_size);
        let page = self
            .students
            .get_students_with_details_paginated(
                &mut conn,
                department_id,
                session_id,
                admission_session_id,
                course_offering_id,
                skip,
                limit,
            )
            .await?;
        Ok(page)
    }

    /// Headline numbers for a lecturer's front page
    pub async fn lecturer_dashboard(&self, lecturer_id: Uuid) -> Result<LecturerDashboard> {
        let mut conn = self.pool.acquire().await.map_err(DatabaseError::from)?;
        if !self.lecturers.exists(&mut conn, lecturer_id).await? {
            return Err(Error::NotFound("lecturer".to_string()));
        }
        let courses = self
            .course_lecturers
            .get_lecturer_offerings(&mut conn, lecturer_id)
            .await?;
        Ok(LecturerDashboard::from_courses(courses))
    }

    /// Headline numbers for a student's front page
    pub async fn student_dashboard(&self, student_id: Uuid) -> Result<StudentDashboard> {
        let mut conn = self.pool.acquire().await.map_err(DatabaseError::from)?;
        if !self.students.exists(&mut conn, student_id).await? {
            return Err(Error::NotFound("student".to_string()));
        }
        let courses = self
            .course_students
            .get_student_offerings(&mut conn, student_id)
            .await?;
        Ok(StudentDashboard::from_courses(courses))
    }
}
