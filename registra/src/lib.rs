//! # registra
//!
//! Persistence core for university academic records: institutions,
//! accounts, the course catalogue and everything taught through it.
//!
//! The crate is built around a generic entity repository. Every
//! table-backed type implements [`repo::Entity`] against a static
//! relationship registry ([`schema::EntityKind`]), which buys it the full
//! CRUD surface of [`repo::EntityRepo`] plus bounded-depth eager loading
//! over the cyclic relationship graph. Services compose repository calls
//! inside per-operation transactions and classify constraint violations
//! into the crate's [`Error`] taxonomy.
//!
//! ## Example
//!
//! ```rust,no_run
//! use registra::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::load()?;
//!     init_tracing(&config)?;
//!
//!     let pool = registra::db::create_pool(&config.database).await?;
//!     let institutions = InstitutionService::new(pool.clone());
//!
//!     let school = institutions
//!         .get_schools(Page::window(0, 20))
//!         .await?;
//!     println!("{} schools", school.len());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod course;
pub mod db;
pub mod error;
pub mod institution;
pub mod observability;
pub mod repo;
pub mod schema;
pub mod user;

pub use error::{Error, Result};

/// Common imports for applications built on the crate
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::course::CourseService;
    pub use crate::error::{DatabaseError, DatabaseErrorKind, DatabaseOperation, Error, Result};
    pub use crate::institution::InstitutionService;
    pub use crate::observability::init_tracing;
    pub use crate::repo::{Entity, EntityRepo, Filter, Page, PaginatedResult};
    pub use crate::user::UserService;
}
