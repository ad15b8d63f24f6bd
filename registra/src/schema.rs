//! Static description of the entity graph
//!
//! Each table-backed type is named by an [`EntityKind`], and the
//! relationships between them are recorded once in [`relations_of`]. The
//! load planner walks this registry instead of reflecting over structs, so
//! the traversal rules can be tested without touching a database.

use std::fmt;

/// Every table-backed type in the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    School,
    Faculty,
    Department,
    Session,
    Semester,
    User,
    StudentProfile,
    LecturerProfile,
    Course,
    CourseOffering,
    CourseLecturer,
    CourseStudent,
    ClassSession,
    Attendance,
    Message,
    MessageStudent,
    Task,
    TaskStudent,
}

impl EntityKind {
    /// All kinds, in registry order
    pub const ALL: [EntityKind; 18] = [
        Self::School,
        Self::Faculty,
        Self::Department,
        Self::Session,
        Self::Semester,
        Self::User,
        Self::StudentProfile,
        Self::LecturerProfile,
        Self::Course,
        Self::CourseOffering,
        Self::CourseLecturer,
        Self::CourseStudent,
        Self::ClassSession,
        Self::Attendance,
        Self::Message,
        Self::MessageStudent,
        Self::Task,
        Self::TaskStudent,
    ];

    /// Table name, quoted where it collides with a SQL keyword
    pub const fn table(self) -> &'static str {
        match self {
            Self::School => "school",
            Self::Faculty => "faculty",
            Self::Department => "department",
            Self::Session => "session",
            Self::Semester => "semester",
            Self::User => "\"user\"",
            Self::StudentProfile => "student_profile",
            Self::LecturerProfile => "lecturer_profile",
            Self::Course => "course",
            Self::CourseOffering => "course_offering",
            Self::CourseLecturer => "course_lecturer",
            Self::CourseStudent => "course_student",
            Self::ClassSession => "class_session",
            Self::Attendance => "attendance",
            Self::Message => "message",
            Self::MessageStudent => "message_student",
            Self::Task => "task",
            Self::TaskStudent => "task_student",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.table())
    }
}

/// Shape of a relationship between two entity kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    /// Source's primary key appears as a foreign key on many target rows
    OneToMany,
    /// Source carries a foreign key to a single target row
    ManyToOne,
    /// Source's primary key appears as a foreign key on at most one target row
    OneToOne,
}

/// A single named relationship in the registry
///
/// `fk_column` is the column holding the join key: for [`RelationKind::OneToMany`]
/// and [`RelationKind::OneToOne`] it lives on the target table and references
/// the source's id, for [`RelationKind::ManyToOne`] it lives on the source
/// table and references the target's id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationDef {
    /// Field name on the source struct
    pub name: &'static str,
    pub kind: RelationKind,
    pub source: EntityKind,
    pub target: EntityKind,
    pub fk_column: &'static str,
}

const fn rel(
    name: &'static str,
    kind: RelationKind,
    source: EntityKind,
    target: EntityKind,
    fk_column: &'static str,
) -> RelationDef {
    RelationDef {
        name,
        kind,
        source,
        target,
        fk_column,
    }
}

use EntityKind as K;
use RelationKind::{ManyToOne, OneToMany, OneToOne};

static SCHOOL: [RelationDef; 1] = [rel("faculties", OneToMany, K::School, K::Faculty, "school_id")];

static FACULTY: [RelationDef; 2] = [
    rel("school", ManyToOne, K::Faculty, K::School, "school_id"),
    rel("departments", OneToMany, K::Faculty, K::Department, "faculty_id"),
];

static DEPARTMENT: [RelationDef; 3] = [
    rel("faculty", ManyToOne, K::Department, K::Faculty, "faculty_id"),
    rel("users", OneToMany, K::Department, K::User, "department_id"),
    rel("courses", OneToMany, K::Department, K::Course, "department_id"),
];

static SESSION: [RelationDef; 2] = [
    rel(
        "course_offerings",
        OneToMany,
        K::Session,
        K::CourseOffering,
        "session_id",
    ),
    rel("semesters", OneToMany, K::Session, K::Semester, "session_id"),
];

static SEMESTER: [RelationDef; 2] = [
    rel(
        "course_offerings",
        OneToMany,
        K::Semester,
        K::CourseOffering,
        "semester_id",
    ),
    rel("session", ManyToOne, K::Semester, K::Session, "session_id"),
];

static USER: [RelationDef; 3] = [
    rel("department", ManyToOne, K::User, K::Department, "department_id"),
    rel(
        "student_profile",
        OneToOne,
        K::User,
        K::StudentProfile,
        "user_id",
    ),
    rel(
        "lecturer_profile",
        OneToOne,
        K::User,
        K::LecturerProfile,
        "user_id",
    ),
];

static STUDENT_PROFILE: [RelationDef; 4] = [
    rel("user", ManyToOne, K::StudentProfile, K::User, "user_id"),
    rel(
        "courses",
        OneToMany,
        K::StudentProfile,
        K::CourseStudent,
        "student_id",
    ),
    rel(
        "message_students",
        OneToMany,
        K::StudentProfile,
        K::MessageStudent,
        "student_id",
    ),
    rel(
        "task_students",
        OneToMany,
        K::StudentProfile,
        K::TaskStudent,
        "student_id",
    ),
];

static LECTURER_PROFILE: [RelationDef; 2] = [
    rel("user", ManyToOne, K::LecturerProfile, K::User, "user_id"),
    rel(
        "courses",
        OneToMany,
        K::LecturerProfile,
        K::CourseLecturer,
        "lecturer_id",
    ),
];

static COURSE: [RelationDef; 2] = [
    rel(
        "course_offerings",
        OneToMany,
        K::Course,
        K::CourseOffering,
        "course_id",
    ),
    rel("department", ManyToOne, K::Course, K::Department, "department_id"),
];

static COURSE_OFFERING: [RelationDef; 5] = [
    rel("course", ManyToOne, K::CourseOffering, K::Course, "course_id"),
    rel(
        "course_lecturers",
        OneToMany,
        K::CourseOffering,
        K::CourseLecturer,
        "course_offering_id",
    ),
    rel(
        "course_students",
        OneToMany,
        K::CourseOffering,
        K::CourseStudent,
        "course_offering_id",
    ),
    rel("semester", ManyToOne, K::CourseOffering, K::Semester, "semester_id"),
    rel("session", ManyToOne, K::CourseOffering, K::Session, "session_id"),
];

static COURSE_LECTURER: [RelationDef; 2] = [
    rel(
        "lecturer",
        ManyToOne,
        K::CourseLecturer,
        K::LecturerProfile,
        "lecturer_id",
    ),
    rel(
        "course_offering",
        ManyToOne,
        K::CourseLecturer,
        K::CourseOffering,
        "course_offering_id",
    ),
];

static COURSE_STUDENT: [RelationDef; 2] = [
    rel(
        "student",
        ManyToOne,
        K::CourseStudent,
        K::StudentProfile,
        "student_id",
    ),
    rel(
        "course_offering",
        ManyToOne,
        K::CourseStudent,
        K::CourseOffering,
        "course_offering_id",
    ),
];

static CLASS_SESSION: [RelationDef; 1] = [rel(
    "attendance",
    OneToMany,
    K::ClassSession,
    K::Attendance,
    "class_session_id",
)];

static ATTENDANCE: [RelationDef; 1] = [rel(
    "class_session",
    ManyToOne,
    K::Attendance,
    K::ClassSession,
    "class_session_id",
)];

static MESSAGE: [RelationDef; 1] = [rel(
    "message_students",
    OneToMany,
    K::Message,
    K::MessageStudent,
    "message_id",
)];

static MESSAGE_STUDENT: [RelationDef; 2] = [
    rel("message", ManyToOne, K::MessageStudent, K::Message, "message_id"),
    rel(
        "student",
        ManyToOne,
        K::MessageStudent,
        K::StudentProfile,
        "student_id",
    ),
];

static TASK: [RelationDef; 1] = [rel(
    "task_students",
    OneToMany,
    K::Task,
    K::TaskStudent,
    "task_id",
)];

static TASK_STUDENT: [RelationDef; 2] = [
    rel("task", ManyToOne, K::TaskStudent, K::Task, "task_id"),
    rel(
        "student",
        ManyToOne,
        K::TaskStudent,
        K::StudentProfile,
        "student_id",
    ),
];

/// Relationships declared on `kind`, in declaration order
pub fn relations_of(kind: EntityKind) -> &'static [RelationDef] {
    match kind {
        K::School => &SCHOOL,
        K::Faculty => &FACULTY,
        K::Department => &DEPARTMENT,
        K::Session => &SESSION,
        K::Semester => &SEMESTER,
        K::User => &USER,
        K::StudentProfile => &STUDENT_PROFILE,
        K::LecturerProfile => &LECTURER_PROFILE,
        K::Course => &COURSE,
        K::CourseOffering => &COURSE_OFFERING,
        K::CourseLecturer => &COURSE_LECTURER,
        K::CourseStudent => &COURSE_STUDENT,
        K::ClassSession => &CLASS_SESSION,
        K::Attendance => &ATTENDANCE,
        K::Message => &MESSAGE,
        K::MessageStudent => &MESSAGE_STUDENT,
        K::Task => &TASK,
        K::TaskStudent => &TASK_STUDENT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_has_a_registry_entry() {
        for kind in EntityKind::ALL {
            // Every kind resolves; leaf tables may still declare relations.
            let _ = relations_of(kind);
        }
    }

    #[test]
    fn test_relation_sources_match_owner() {
        for kind in EntityKind::ALL {
            for relation in relations_of(kind) {
                assert_eq!(relation.source, kind, "relation {}", relation.name);
            }
        }
    }

    #[test]
    fn test_relation_names_unique_per_kind() {
        for kind in EntityKind::ALL {
            let relations = relations_of(kind);
            for (i, a) in relations.iter().enumerate() {
                for b in &relations[i + 1..] {
                    assert_ne!(a.name, b.name, "duplicate relation on {}", kind);
                }
            }
        }
    }

    #[test]
    fn test_every_relation_has_an_inverse() {
        // Each edge is declared from both ends with the same join column.
        for kind in EntityKind::ALL {
            for relation in relations_of(kind) {
                let inverse = relations_of(relation.target).iter().find(|candidate| {
                    candidate.target == kind && candidate.fk_column == relation.fk_column
                });
                assert!(
                    inverse.is_some(),
                    "{} -> {} ({}) has no inverse",
                    kind,
                    relation.target,
                    relation.name
                );
            }
        }
    }

    #[test]
    fn test_table_names() {
        assert_eq!(EntityKind::User.table(), "\"user\"");
        assert_eq!(EntityKind::CourseOffering.table(), "course_offering");
        assert_eq!(EntityKind::School.table(), "school");
    }
}
