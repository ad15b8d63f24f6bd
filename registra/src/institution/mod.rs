//! Institutional hierarchy: schools, faculties, departments, academic terms

pub mod models;
pub mod repository;
pub mod service;

pub use models::{
    Department, DepartmentCreate, DepartmentPatch, Faculty, FacultyCreate, FacultyPatch, School,
    SchoolCreate, SchoolPatch, Semester, SemesterCreate, SemesterName, SemesterPatch, Session,
    SessionCreate, SessionPatch,
};
pub use repository::{DepartmentRepo, FacultyRepo, SchoolRepo, SemesterRepo, SessionRepo};
pub use service::{InstitutionService, SessionTermsCreate};
