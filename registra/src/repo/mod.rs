//! Generic entity repository
//!
//! Every table-backed type in the crate goes through the same machinery:
//!
//! - [`EntityRepo`]: CRUD operations shared by all repositories, implemented
//!   once as provided trait methods over [`Entity`]
//! - [`Filter`]: equality filter composition for WHERE clauses
//! - [`Page`] / [`PaginatedResult`]: result windowing and page metadata
//! - [`build_load_plan`]: bounded-depth relationship traversal planning
//!
//! Repository methods never classify storage failures; they surface
//! [`DatabaseError`](crate::error::DatabaseError) values and leave it to the
//! service layer to decide what a constraint violation means for the caller.

pub mod base;
pub mod filter;
pub mod load;
pub mod pagination;
pub mod relations;

pub use base::{Entity, EntityRepo, InsertModel, PatchModel};
pub use filter::{Filter, FilterValue};
pub use load::{build_load_plan, LoadNode};
pub use pagination::{Page, PaginatedResult};
pub use relations::{hydrate, load_many_to_one, load_one_to_many, load_one_to_one};
