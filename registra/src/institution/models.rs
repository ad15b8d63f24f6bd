//! Institutional structure: schools, faculties, departments, academic
//! sessions and their semesters.

use chrono::NaiveDate;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use sqlx::{query_builder::Separated, FromRow, PgConnection, Postgres};
use uuid::Uuid;

use crate::course::CourseOffering;
use crate::error::DbResult;
use crate::repo::{
    load_many_to_one, load_one_to_many, Entity, InsertModel, LoadNode, PatchModel,
};
use crate::schema::EntityKind;
use crate::user::User;

/// First or second semester of an academic session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "semester_name", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SemesterName {
    First,
    Second,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct School {
    pub id: Uuid,
    pub name: String,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub faculties: Option<Vec<Faculty>>,
}

impl Entity for School {
    type Create = SchoolCreate;
    type Patch = SchoolPatch;

    const KIND: EntityKind = EntityKind::School;

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
                "faculties" => {
                    load_one_to_many(conn, rows, node, |f: &Faculty| f.school_id, |s| {
                        &mut s.faculties
                    })
                    .await
                }
                _ => Ok(()),
            }
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchoolCreate {
    pub name: String,
}

impl InsertModel for SchoolCreate {
    const COLUMNS: &'static [&'static str] = &["name"];

    fn bind(self, row: &mut Separated<'_, '_, Postgres, &'static str>) {
        row.push_bind(self.name);
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchoolPatch {
    pub name: Option<String>,
}

impl PatchModel for SchoolPatch {
    fn is_empty(&self) -> bool {
        self.name.is_none()
    }

    fn bind(self, assignments: &mut Separated<'_, '_, Postgres, &'static str>) {
        if let Some(name) = self.name {
            assignments.push("name = ");
            assignments.push_bind_unseparated(name);
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Faculty {
    pub id: Uuid,
    pub name: String,
    pub school_id: Uuid,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub school: Option<Box<School>>,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub departments: Option<Vec<Department>>,
}

impl Entity for Faculty {
    type Create = FacultyCreate;
    type Patch = FacultyPatch;

    const KIND: EntityKind = EntityKind::Faculty;

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
                "school" => {
                    load_many_to_one(conn, rows, node, |f: &Self| Some(f.school_id), |f| {
                        &mut f.school
                    })
                    .await
                }
                "departments" => {
                    load_one_to_many(conn, rows, node, |d: &Department| d.faculty_id, |f| {
                        &mut f.departments
                    })
                    .await
                }
                _ => Ok(()),
            }
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FacultyCreate {
    pub name: String,
    pub school_id: Uuid,
}

impl InsertModel for FacultyCreate {
    const COLUMNS: &'static [&'static str] = &["name", "school_id"];

    fn bind(self, row: &mut Separated<'_, '_, Postgres, &'static str>) {
        row.push_bind(self.name);
        row.push_bind(self.school_id);
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FacultyPatch {
    pub name: Option<String>,
    pub school_id: Option<Uuid>,
}

impl PatchModel for FacultyPatch {
    fn is_empty(&self) -> bool {
        self.name.is_none() && self.school_id.is_none()
    }

    fn bind(self, assignments: &mut Separated<'_, '_, Postgres, &'static str>) {
        if let Some(name) = self.name {
            assignments.push("name = ");
            assignments.push_bind_unseparated(name);
        }
        if let Some(school_id) = self.school_id {
            assignments.push("school_id = ");
            assignments.push_bind_unseparated(school_id);
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Department {
    pub id: Uuid,
    pub name: String,
    pub faculty_id: Uuid,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub faculty: Option<Box<Faculty>>,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users: Option<Vec<User>>,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub courses: Option<Vec<crate::course::Course>>,
}

impl Entity for Department {
    type Create = DepartmentCreate;
    type Patch = DepartmentPatch;

    const KIND: EntityKind = EntityKind::Department;

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
                "faculty" => {
                    load_many_to_one(conn, rows, node, |d: &Self| Some(d.faculty_id), |d| {
                        &mut d.faculty
                    })
                    .await
                }
                "users" => {
                    load_one_to_many(
                        conn,
                        rows,
                        node,
                        |u: &User| u.department_id.unwrap_or_default(),
                        |d| &mut d.users,
                    )
                    .await
                }
                "courses" => {
                    load_one_to_many(
                        conn,
                        rows,
                        node,
                        |c: &crate::course::Course| c.department_id,
                        |d| &mut d.courses,
                    )
                    .await
                }
                _ => Ok(()),
            }
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DepartmentCreate {
    pub name: String,
    pub faculty_id: Uuid,
}

impl InsertModel for DepartmentCreate {
    const COLUMNS: &'static [&'static str] = &["name", "faculty_id"];

    fn bind(self, row: &mut Separated<'_, '_, Postgres, &'static str>) {
        row.push_bind(self.name);
        row.push_bind(self.faculty_id);
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DepartmentPatch {
    pub name: Option<String>,
    pub faculty_id: Option<Uuid>,
}

impl PatchModel for DepartmentPatch {
    fn is_empty(&self) -> bool {
        self.name.is_none() && self.faculty_id.is_none()
    }

    fn bind(self, assignments: &mut Separated<'_, '_, Postgres, &'static str>) {
        if let Some(name) = self.name {
            assignments.push("name = ");
            assignments.push_bind_unseparated(name);
        }
        if let Some(faculty_id) = self.faculty_id {
            assignments.push("faculty_id = ");
            assignments.push_bind_unseparated(faculty_id);
        }
    }
}

/// An academic year (e.g. "2024/2025") scoped to a school
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Session {
    pub id: Uuid,
    pub name: String,
    pub school_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_active: bool,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_offerings: Option<Vec<CourseOffering>>,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semesters: Option<Vec<Semester>>,
}

impl Entity for Session {
    type Create = SessionCreate;
    type Patch = SessionPatch;

    const KIND: EntityKind = EntityKind::Session;

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
                    load_one_to_many(
                        conn,
                        rows,
                        node,
                        |o: &CourseOffering| o.session_id,
                        |s| &mut s.course_offerings,
                    )
                    .await
                }
                "semesters" => {
                    load_one_to_many(conn, rows, node, |m: &Semester| m.session_id, |s| {
                        &mut s.semesters
                    })
                    .await
                }
                _ => Ok(()),
            }
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionCreate {
    pub name: String,
    pub school_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_active: bool,
}

impl InsertModel for SessionCreate {
    const COLUMNS: &'static [&'static str] =
        &["name", "school_id", "start_date", "end_date", "is_active"];

    fn bind(self, row: &mut Separated<'_, '_, Postgres, &'static str>) {
        row.push_bind(self.name);
        row.push_bind(self.school_id);
        row.push_bind(self.start_date);
        row.push_bind(self.end_date);
        row.push_bind(self.is_active);
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionPatch {
    pub name: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub is_active: Option<bool>,
}

impl PatchModel for SessionPatch {
    fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && self.is_active.is_none()
    }

    fn bind(self, assignments: &mut Separated<'_, '_, Postgres, &'static str>) {
        if let Some(name) = self.name {
            assignments.push("name = ");
            assignments.push_bind_unseparated(name);
        }
        if let Some(start_date) = self.start_date {
            assignments.push("start_date = ");
            assignments.push_bind_unseparated(start_date);
        }
        if let Some(end_date) = self.end_date {
            assignments.push("end_date = ");
            assignments.push_bind_unseparated(end_date);
        }
        if let Some(is_active) = self.is_active {
            assignments.push("is_active = ");
            assignments.push_bind_unseparated(is_active);
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Semester {
    pub id: Uuid,
    pub session_id: Uuid,
    pub name: SemesterName,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_active: bool,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_offerings: Option<Vec<CourseOffering>>,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<Box<Session>>,
}

impl Entity for Semester {
    type Create = SemesterCreate;
    type Patch = SemesterPatch;

    const KIND: EntityKind = EntityKind::Semester;

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
                    load_one_to_many(
                        conn,
                        rows,
                        node,
                        |o: &CourseOffering| o.semester_id,
                        |m| &mut m.course_offerings,
                    )
                    .await
                }
                "session" => {
                    load_many_to_one(conn, rows, node, |m: &Self| Some(m.session_id), |m| {
                        &mut m.session
                    })
                    .await
                }
                _ => Ok(()),
            }
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SemesterCreate {
    pub session_id: Uuid,
    pub name: SemesterName,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_active: bool,
}

impl InsertModel for SemesterCreate {
    const COLUMNS: &'static [&'static str] =
        &["session_id", "name", "start_date", "end_date", "is_active"];

    fn bind(self, row: &mut Separated<'_, '_, Postgres, &'static str>) {
        row.push_bind(self.session_id);
        row.push_bind(self.name);
        row.push_bind(self.start_date);
        row.push_bind(self.end_date);
        row.push_bind(self.is_active);
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SemesterPatch {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub is_active: Option<bool>,
}

impl PatchModel for SemesterPatch {
    fn is_empty(&self) -> bool {
        self.start_date.is_none() && self.end_date.is_none() && self.is_active.is_none()
    }

    fn bind(self, assignments: &mut Separated<'_, '_, Postgres, &'static str>) {
        if let Some(start_date) = self.start_date {
            assignments.push("start_date = ");
            assignments.push_bind_unseparated(start_date);
        }
        if let Some(end_date) = self.end_date {
            assignments.push("end_date = ");
            assignments.push_bind_unseparated(end_date);
        }
        if let Some(is_active) = self.is_active {
            assignments.push("is_active = ");
            assignments.push_bind_unseparated(is_active);
        }
    }
}

#[cfg(test)]
mod tests {
    use sqlx::QueryBuilder;

    use super::*;

    #[test]
    fn test_semester_name_labels() {
        assert_eq!(
            serde_json::to_string(&SemesterName::First).unwrap(),
            "\"FIRST\""
        );
        assert_eq!(
            serde_json::from_str::<SemesterName>("\"SECOND\"").unwrap(),
            SemesterName::Second
        );
    }

    #[test]
    fn test_session_create_columns_match_bind_order() {
        assert_eq!(
            SessionCreate::COLUMNS,
            &["name", "school_id", "start_date", "end_date", "is_active"]
        );
    }

    #[test]
    fn test_school_patch_sql() {
        let patch = SchoolPatch {
            name: Some("Unilag".to_string()),
        };
        assert!(!patch.is_empty());

        let mut qb = QueryBuilder::new("UPDATE school SET ");
        {
            let mut assignments = qb.separated(", ");
            patch.bind(&mut assignments);
        }
        assert_eq!(qb.sql(), "UPDATE school SET name = $1");
    }

    #[test]
    fn test_session_patch_joins_assignments() {
        let patch = SessionPatch {
            end_date: Some(NaiveDate::from_ymd_opt(2025, 9, 30).unwrap()),
            is_active: Some(false),
            ..Default::default()
        };
        let mut qb = QueryBuilder::new("UPDATE session SET ");
        {
            let mut assignments = qb.separated(", ");
            patch.bind(&mut assignments);
        }
        assert_eq!(qb.sql(), "UPDATE session SET end_date = $1, is_active = $2");
    }

    #[test]
    fn test_empty_patch_is_empty() {
        assert!(SchoolPatch::default().is_empty());
        assert!(SemesterPatch::default().is_empty());
        assert!(!SemesterPatch {
            is_active: Some(true),
            ..Default::default()
        }
        .is_empty());
    }
}
