//! Course catalogue and teaching records: offerings, rosters, class
//! sessions, attendance, announcements and tasks

pub mod dto;
pub mod models;
pub mod repository;
pub mod service;

pub use dto::{
    AttendanceRecord, LecturerBrief, LecturerOffering, OfferingDetail, OfferingSummary,
    PendingTask, StudentMessage, StudentOffering, StudentTask,
};
pub use models::{
    Attendance, AttendanceCreate, AttendancePatch, AttendanceStatus, ClassSession,
    ClassSessionCreate, ClassSessionPatch, ClassSessionStatus, Course, CourseCreate,
    CourseLecturer, CourseLecturerCreate, CourseLecturerPatch, CourseOffering,
    CourseOfferingCreate, CourseOfferingPatch, CoursePatch, CourseStudent, CourseStudentCreate,
    CourseStudentPatch, EventStatus, Message, MessageCreate, MessagePatch, MessageStudent,
    MessageStudentCreate, MessageStudentPatch, Task, TaskCreate, TaskPatch, TaskStatusFilter,
    TaskStudent, TaskStudentCreate, TaskStudentPatch, TaskStudentStatus, TaskType,
};
pub use repository::{
    AttendanceRepo, ClassSessionRepo, CourseLecturerRepo, CourseOfferingRepo, CourseRepo,
    CourseStudentRepo, MessageRepo, TaskRepo, TaskStudentRepo,
};
pub use service::CourseService;
