//! Accounts and role profiles: users, students, lecturers

pub mod dto;
pub mod models;
pub mod repository;
pub mod service;

pub use dto::{
    LecturerDashboard, LecturerDetails, NewLecturer, NewStudent, OfferingBrief, StudentDashboard,
    StudentDetails,
};
pub use models::{
    LecturerDegree, LecturerProfile, LecturerProfileCreate, LecturerProfilePatch, LecturerRank,
    LecturerTitle, Status, StudentProfile, StudentProfileCreate, StudentProfilePatch, User,
    UserCreate, UserPatch, UserType,
};
pub use repository::{LecturerProfileRepo, StudentProfileRepo, UserRepo};
pub use service::UserService;
