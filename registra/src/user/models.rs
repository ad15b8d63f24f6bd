//! Accounts and their role profiles
//!
//! A [`User`] row carries the shared account fields; students and lecturers
//! get an extra profile row keyed one-to-one on `user_id`.

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use sqlx::{query_builder::Separated, FromRow, PgConnection, Postgres};
use uuid::Uuid;

use crate::course::{CourseLecturer, CourseStudent, MessageStudent, TaskStudent};
use crate::error::DbResult;
use crate::institution::Department;
use crate::repo::{
    load_many_to_one, load_one_to_many, load_one_to_one, Entity, InsertModel, LoadNode, PatchModel,
};
use crate::schema::EntityKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserType {
    Student,
    CourseRep,
    Lecturer,
    Hod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Active,
    Inactive,
}

/// Academic rank ladder; the two numbered ranks use arabic numerals in
/// their stored labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "rank", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LecturerRank {
    GraduateAssistant,
    AssistantLecturer,
    #[sqlx(rename = "LECTURER_2")]
    #[serde(rename = "LECTURER_2")]
    LecturerII,
    #[sqlx(rename = "LECTURER_1")]
    #[serde(rename = "LECTURER_1")]
    LecturerI,
    SeniorLecturer,
    AssociateProfessor,
    Professor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "title", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LecturerTitle {
    Mr,
    Mrs,
    Dr,
    Engr,
    Arc,
    Barr,
    Prof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "degree", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LecturerDegree {
    Bachelor,
    Master,
    Phd,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    #[serde(skip_serializing)]
    pub password: String,
    pub user_type: UserType,
    pub department_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<Box<Department>>,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_profile: Option<Box<StudentProfile>>,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lecturer_profile: Option<Box<LecturerProfile>>,
}

impl Entity for User {
    type Create = UserCreate;
    type Patch = UserPatch;

    const KIND: EntityKind = EntityKind::User;

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
                "department" => {
                    load_many_to_one(conn, rows, node, |u: &Self| u.department_id, |u| {
                        &mut u.department
                    })
                    .await
                }
                "student_profile" => {
                    load_one_to_one(conn, rows, node, |p: &StudentProfile| p.user_id, |u| {
                        &mut u.student_profile
                    })
                    .await
                }
                "lecturer_profile" => {
                    load_one_to_one(conn, rows, node, |p: &LecturerProfile| p.user_id, |u| {
                        &mut u.lecturer_profile
                    })
                    .await
                }
                _ => Ok(()),
            }
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserCreate {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub password: String,
    pub user_type: UserType,
    pub department_id: Option<Uuid>,
}

impl InsertModel for UserCreate {
    const COLUMNS: &'static [&'static str] = &[
        "first_name",
        "last_name",
        "email",
        "phone_number",
        "password",
        "user_type",
        "department_id",
    ];

    fn bind(self, row: &mut Separated<'_, '_, Postgres, &'static str>) {
        row.push_bind(self.first_name);
        row.push_bind(self.last_name);
        row.push_bind(self.email);
        row.push_bind(self.phone_number);
        row.push_bind(self.password);
        row.push_bind(self.user_type);
        row.push_bind(self.department_id);
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub department_id: Option<Uuid>,
}

impl PatchModel for UserPatch {
    const TOUCH_UPDATED_AT: bool = true;

    fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.phone_number.is_none()
            && self.department_id.is_none()
    }

    fn bind(self, assignments: &mut Separated<'_, '_, Postgres, &'static str>) {
        if let Some(first_name) = self.first_name {
            assignments.push("first_name = ");
            assignments.push_bind_unseparated(first_name);
        }
        if let Some(last_name) = self.last_name {
            assignments.push("last_name = ");
            assignments.push_bind_unseparated(last_name);
        }
        if let Some(phone_number) = self.phone_number {
            assignments.push("phone_number = ");
            assignments.push_bind_unseparated(phone_number);
        }
        if let Some(department_id) = self.department_id {
            assignments.push("department_id = ");
            assignments.push_bind_unseparated(department_id);
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StudentProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub matric_number: String,
    pub admission_session_id: Uuid,
    pub status: Status,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<Box<User>>,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub courses: Option<Vec<CourseStudent>>,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_students: Option<Vec<MessageStudent>>,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_students: Option<Vec<TaskStudent>>,
}

impl Entity for StudentProfile {
    type Create = StudentProfileCreate;
    type Patch = StudentProfilePatch;

    const KIND: EntityKind = EntityKind::StudentProfile;

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
                "user" => {
                    load_many_to_one(conn, rows, node, |p: &Self| Some(p.user_id), |p| {
                        &mut p.user
                    })
                    .await
                }
                "courses" => {
                    load_one_to_many(conn, rows, node, |c: &CourseStudent| c.student_id, |p| {
                        &mut p.courses
                    })
                    .await
                }
                "message_students" => {
                    load_one_to_many(conn, rows, node, |m: &MessageStudent| m.student_id, |p| {
                        &mut p.message_students
                    })
                    .await
                }
                "task_students" => {
                    load_one_to_many(conn, rows, node, |t: &TaskStudent| t.student_id, |p| {
                        &mut p.task_students
                    })
                    .await
                }
                _ => Ok(()),
            }
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StudentProfileCreate {
    pub user_id: Uuid,
    pub matric_number: String,
    pub admission_session_id: Uuid,
    pub status: Status,
}

impl InsertModel for StudentProfileCreate {
    const COLUMNS: &'static [&'static str] =
        &["user_id", "matric_number", "admission_session_id", "status"];

    fn bind(self, row: &mut Separated<'_, '_, Postgres, &'static str>) {
        row.push_bind(self.user_id);
        row.push_bind(self.matric_number);
        row.push_bind(self.admission_session_id);
        row.push_bind(self.status);
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentProfilePatch {
    pub matric_number: Option<String>,
    pub admission_session_id: Option<Uuid>,
    pub status: Option<Status>,
}

impl PatchModel for StudentProfilePatch {
    fn is_empty(&self) -> bool {
        self.matric_number.is_none()
            && self.admission_session_id.is_none()
            && self.status.is_none()
    }

    fn bind(self, assignments: &mut Separated<'_, '_, Postgres, &'static str>) {
        if let Some(matric_number) = self.matric_number {
            assignments.push("matric_number = ");
            assignments.push_bind_unseparated(matric_number);
        }
        if let Some(admission_session_id) = self.admission_session_id {
            assignments.push("admission_session_id = ");
            assignments.push_bind_unseparated(admission_session_id);
        }
        if let Some(status) = self.status {
            assignments.push("status = ");
            assignments.push_bind_unseparated(status);
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LecturerProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub rank: LecturerRank,
    pub title: LecturerTitle,
    pub degree: LecturerDegree,
    pub status: Status,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<Box<User>>,
    #[sqlx(skip)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub courses: Option<Vec<CourseLecturer>>,
}

impl Entity for LecturerProfile {
    type Create = LecturerProfileCreate;
    type Patch = LecturerProfilePatch;

    const KIND: EntityKind = EntityKind::LecturerProfile;

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
                "user" => {
                    load_many_to_one(conn, rows, node, |p: &Self| Some(p.user_id), |p| {
                        &mut p.user
                    })
                    .await
                }
                "courses" => {
                    load_one_to_many(conn, rows, node, |c: &CourseLecturer| c.lecturer_id, |p| {
                        &mut p.courses
                    })
                    .await
                }
                _ => Ok(()),
            }
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LecturerProfileCreate {
    pub user_id: Uuid,
    pub rank: LecturerRank,
    pub title: LecturerTitle,
    pub degree: LecturerDegree,
    pub status: Status,
}

impl InsertModel for LecturerProfileCreate {
    const COLUMNS: &'static [&'static str] = &["user_id", "rank", "title", "degree", "status"];

    fn bind(self, row: &mut Separated<'_, '_, Postgres, &'static str>) {
        row.push_bind(self.user_id);
        row.push_bind(self.rank);
        row.push_bind(self.title);
        row.push_bind(self.degree);
        row.push_bind(self.status);
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LecturerProfilePatch {
    pub rank: Option<LecturerRank>,
    pub title: Option<LecturerTitle>,
    pub degree: Option<LecturerDegree>,
    pub status: Option<Status>,
}

impl PatchModel for LecturerProfilePatch {
    fn is_empty(&self) -> bool {
        self.rank.is_none() && self.title.is_none() && self.degree.is_none() && self.status.is_none()
    }

    fn bind(self, assignments: &mut Separated<'_, '_, Postgres, &'static str>) {
        if let Some(rank) = self.rank {
            assignments.push("rank = ");
            assignments.push_bind_unseparated(rank);
        }
        if let Some(title) = self.title {
            assignments.push("title = ");
            assignments.push_bind_unseparated(title);
        }
        if let Some(degree) = self.degree {
            assignments.push("degree = ");
            assignments.push_bind_unseparated(degree);
        }
        if let Some(status) = self.status {
            assignments.push("status = ");
            assignments.push_bind_unseparated(status);
        }
    }
}

#[cfg(test)]
mod tests {
    use sqlx::QueryBuilder;

    use super::*;

    #[test]
    fn test_numbered_ranks_use_numeric_labels() {
        assert_eq!(
            serde_json::to_string(&LecturerRank::LecturerII).unwrap(),
            "\"LECTURER_2\""
        );
        assert_eq!(
            serde_json::to_string(&LecturerRank::LecturerI).unwrap(),
            "\"LECTURER_1\""
        );
        assert_eq!(
            serde_json::from_str::<LecturerRank>("\"SENIOR_LECTURER\"").unwrap(),
            LecturerRank::SeniorLecturer
        );
    }

    #[test]
    fn test_user_type_labels() {
        assert_eq!(
            serde_json::to_string(&UserType::CourseRep).unwrap(),
            "\"COURSE_REP\""
        );
        assert_eq!(
            serde_json::from_str::<UserType>("\"HOD\"").unwrap(),
            UserType::Hod
        );
    }

    #[test]
    fn test_user_patch_touches_updated_at() {
        assert!(UserPatch::TOUCH_UPDATED_AT);
        assert!(!StudentProfilePatch::TOUCH_UPDATED_AT);
    }

    #[test]
    fn test_user_patch_sql() {
        let patch = UserPatch {
            first_name: Some("Ada".to_string()),
            department_id: Some(Uuid::nil()),
            ..Default::default()
        };
        let mut qb = QueryBuilder::new("UPDATE \"user\" SET ");
        {
            let mut assignments = qb.separated(", ");
            patch.bind(&mut assignments);
        }
        assert_eq!(
            qb.sql(),
            "UPDATE \"user\" SET first_name = $1, department_id = $2"
        );
    }

    #[test]
    fn test_password_is_not_serialized() {
        let user = User {
            id: Uuid::nil(),
            first_name: "Ada".to_string(),
            last_name: "Obi".to_string(),
            email: "ada@example.edu".to_string(),
            phone_number: None,
            password: "secret".to_string(),
            user_type: UserType::Student,
            department_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            department: None,
            student_profile: None,
            lecturer_profile: None,
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret"));
        assert!(!json.contains("password"));
    }
}
