//! Entity contract and the shared repository operations
//!
//! [`EntityRepo`] carries every CRUD operation as a provided method, written
//! once against the [`Entity`] contract. Concrete repositories are unit
//! structs that pick an entity type and add their bespoke queries on top.
//! All methods borrow the caller's connection, so a service can run several
//! repository calls inside one transaction.
//!
//! Methods use RPITIT (Return Position Impl Trait In Traits, Rust 1.75+)
//! rather than `async_trait`.

use std::future::Future;

use futures::future::BoxFuture;
use sqlx::{postgres::PgRow, query_builder::Separated, PgConnection, Postgres, QueryBuilder};
use uuid::Uuid;

use super::filter::Filter;
use super::load::{build_load_plan, LoadNode};
use super::pagination::{Page, PaginatedResult};
use super::relations::hydrate;
use crate::error::DbResult;
use crate::schema::EntityKind;

/// A table-backed type the generic repository can operate on
pub trait Entity:
    Sized + for<'r> sqlx::FromRow<'r, PgRow> + Clone + Send + Sync + Unpin + 'static
{
    /// Insert payload for this entity
    type Create: InsertModel;
    /// Partial-update payload for this entity
    type Patch: PatchModel;

    /// The registry kind this entity maps to
    const KIND: EntityKind;

    /// Primary key
    fn id(&self) -> Uuid;

    /// Table name, from the registry
    fn table() -> &'static str {
        Self::KIND.table()
    }

    /// Fetch one relationship (by registry name) into a batch of rows
    ///
    /// Implementations match on `node.relation.name` and dispatch to the
    /// generic loaders in [`super::relations`], passing fn-pointer accessors
    /// for the foreign key and the relation slot.
    fn load_relation<'a>(
        conn: &'a mut PgConnection,
        rows: &'a mut [Self],
        node: &'a LoadNode,
    ) -> BoxFuture<'a, DbResult<()>>;
}

/// Insert payload: a fixed column list plus one row of binds
pub trait InsertModel: Send {
    /// Column list for the INSERT, in bind order
    const COLUMNS: &'static [&'static str];

    /// Bind one row of values, in column order
    fn bind(self, row: &mut Separated<'_, '_, Postgres, &'static str>);
}

/// Partial-update payload: only present fields become assignments
pub trait PatchModel: Send {
    /// Whether an UPDATE through this patch refreshes `updated_at`
    const TOUCH_UPDATED_AT: bool = false;

    /// True when no field was provided
    fn is_empty(&self) -> bool;

    /// Append `column = value` assignments for the fields that are present
    fn bind(self, assignments: &mut Separated<'_, '_, Postgres, &'static str>);
}

/// Shared CRUD operations over an [`Entity`]
///
/// Every method takes `&mut PgConnection` so calls compose inside a caller's
/// transaction. Reads accept a traversal `depth` controlling how far the
/// relationship graph is eagerly loaded; writes return the stored row as the
/// database produced it (`RETURNING *`), including generated defaults.
///
/// # Example
///
/// ```rust,ignore
/// struct SchoolRepo;
/// impl EntityRepo for SchoolRepo {
///     type Entity = School;
/// }
///
/// let school = SchoolRepo.get_one_by_id(&mut conn, id, 2).await?;
/// ```
pub trait EntityRepo: Send + Sync {
    /// The entity this repository operates on
    type Entity: Entity;

    /// Fetch a single row by primary key, relationships loaded to `depth`
    fn get_one_by_id(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
        depth: u32,
    ) -> impl Future<Output = DbResult<Option<Self::Entity>>> + Send {
        async move {
            let mut qb = QueryBuilder::new(format!(
                "SELECT * FROM {} WHERE id = ",
                <Self::Entity as Entity>::table()
            ));
            qb.push_bind(id);
            let row: Option<Self::Entity> = qb.build_query_as().fetch_optional(&mut *conn).await?;
            match row {
                Some(mut entity) => {
                    let plan = build_load_plan(<Self::Entity as Entity>::KIND, depth);
                    hydrate(conn, std::slice::from_mut(&mut entity), &plan).await?;
                    Ok(Some(entity))
                }
                None => Ok(None),
            }
        }
    }

    /// Fetch all rows matching `filter`, windowed by `page`
    fn get_all(
        &self,
        conn: &mut PgConnection,
        filter: &Filter,
        page: Page,
        depth: u32,
    ) -> impl Future<Output = DbResult<Vec<Self::Entity>>> + Send {
        async move {
            let mut qb = QueryBuilder::new(format!(
                "SELECT * FROM {}",
                <Self::Entity as Entity>::table()
            ));
            filter.push_where(&mut qb);
            page.push_sql(&mut qb);
            let mut rows: Vec<Self::Entity> = qb.build_query_as().fetch_all(&mut *conn).await?;
            let plan = build_load_plan(<Self::Entity as Entity>::KIND, depth);
            hydrate(conn, &mut rows, &plan).await?;
            Ok(rows)
        }
    }

    /// List-shaped fetch by primary key
    ///
    /// Returns zero or one rows in a `Vec` so callers that treat "get by id"
    /// as a filtered list keep a uniform shape with [`EntityRepo::get_all`].
    fn get_by_id(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
        page: Page,
        depth: u32,
    ) -> impl Future<Output = DbResult<Vec<Self::Entity>>> + Send {
        async move {
            let filter = Filter::new().eq("id", id);
            self.get_all(conn, &filter, page, depth).await
        }
    }

    /// Count rows matching `filter`
    fn count(
        &self,
        conn: &mut PgConnection,
        filter: &Filter,
    ) -> impl Future<Output = DbResult<i64>> + Send {
        async move {
            let mut qb = QueryBuilder::new(format!(
                "SELECT COUNT(*) FROM {}",
                <Self::Entity as Entity>::table()
            ));
            filter.push_where(&mut qb);
            let total: i64 = qb.build_query_scalar().fetch_one(&mut *conn).await?;
            Ok(total)
        }
    }

    /// Fetch a page of rows matching `filter`, with page metadata
    fn get_all_paginated(
        &self,
        conn: &mut PgConnection,
        filter: &Filter,
        skip: Option<i64>,
        limit: i64,
        depth: u32,
    ) -> impl Future<Output = DbResult<PaginatedResult<Self::Entity>>> + Send {
        async move {
            let total = self.count(&mut *conn, filter).await?;
            let items = self
                .get_all(&mut *conn, filter, Page::new(skip, Some(limit)), depth)
                .await?;
            Ok(PaginatedResult::new(total, skip, limit, items))
        }
    }

    /// Paginated fetch by primary key, same shape as [`EntityRepo::get_all_paginated`]
    fn get_by_id_paginated(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
        skip: Option<i64>,
        limit: i64,
        depth: u32,
    ) -> impl Future<Output = DbResult<PaginatedResult<Self::Entity>>> + Send {
        async move {
            let filter = Filter::new().eq("id", id);
            self.get_all_paginated(conn, &filter, skip, limit, depth)
                .await
        }
    }

    /// Insert one row and return it as stored
    fn create_one(
        &self,
        conn: &mut PgConnection,
        input: <Self::Entity as Entity>::Create,
    ) -> impl Future<Output = DbResult<Self::Entity>> + Send {
        async move {
            let mut qb = QueryBuilder::new(format!(
                "INSERT INTO {} (",
                <Self::Entity as Entity>::table()
            ));
            {
                let mut cols = qb.separated(", ");
                for col in <<Self::Entity as Entity>::Create as InsertModel>::COLUMNS {
                    cols.push(*col);
                }
            }
            qb.push(") ");
            qb.push_values([input], |mut row, input| input.bind(&mut row));
            qb.push(" RETURNING *");
            let created = qb
                .build_query_as::<Self::Entity>()
                .fetch_one(&mut *conn)
                .await?;
            Ok(created)
        }
    }

    /// Insert several rows in one statement and return them as stored
    ///
    /// An empty input is a no-op returning an empty list.
    fn create_multiple(
        &self,
        conn: &mut PgConnection,
        inputs: Vec<<Self::Entity as Entity>::Create>,
    ) -> impl Future<Output = DbResult<Vec<Self::Entity>>> + Send {
        async move {
            if inputs.is_empty() {
                return Ok(Vec::new());
            }
            let mut qb = QueryBuilder::new(format!(
                "INSERT INTO {} (",
                <Self::Entity as Entity>::table()
            ));
            {
                let mut cols = qb.separated(", ");
                for col in <<Self::Entity as Entity>::Create as InsertModel>::COLUMNS {
                    cols.push(*col);
                }
            }
            qb.push(") ");
            qb.push_values(inputs, |mut row, input| input.bind(&mut row));
            qb.push(" RETURNING *");
            let created = qb
                .build_query_as::<Self::Entity>()
                .fetch_all(&mut *conn)
                .await?;
            Ok(created)
        }
    }

    /// Apply a partial update and return the stored row
    ///
    /// Absent fields are untouched. An empty patch issues no UPDATE and
    /// returns the current row. Returns `None` when the id does not exist.
    fn update(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
        patch: <Self::Entity as Entity>::Patch,
    ) -> impl Future<Output = DbResult<Option<Self::Entity>>> + Send {
        async move {
            if patch.is_empty() {
                return self.get_one_by_id(conn, id, 0).await;
            }
            let mut qb = QueryBuilder::new(format!(
                "UPDATE {} SET ",
                <Self::Entity as Entity>::table()
            ));
            {
                let mut assignments = qb.separated(", ");
                patch.bind(&mut assignments);
                if <<Self::Entity as Entity>::Patch as PatchModel>::TOUCH_UPDATED_AT {
                    assignments.push("updated_at = now()");
                }
            }
            qb.push(" WHERE id = ");
            qb.push_bind(id);
            qb.push(" RETURNING *");
            let row: Option<Self::Entity> = qb.build_query_as().fetch_optional(&mut *conn).await?;
            Ok(row)
        }
    }

    /// Delete by primary key; `false` when the id did not exist
    fn delete(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
    ) -> impl Future<Output = DbResult<bool>> + Send {
        async move {
            let mut qb = QueryBuilder::new(format!(
                "DELETE FROM {} WHERE id = ",
                <Self::Entity as Entity>::table()
            ));
            qb.push_bind(id);
            qb.push(" RETURNING id");
            let deleted: Option<Uuid> = qb
                .build_query_scalar()
                .fetch_optional(&mut *conn)
                .await?;
            Ok(deleted.is_some())
        }
    }

    /// Existence check by primary key
    fn exists(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
    ) -> impl Future<Output = DbResult<bool>> + Send {
        async move {
            let mut qb = QueryBuilder::new(format!(
                "SELECT EXISTS (SELECT 1 FROM {} WHERE id = ",
                <Self::Entity as Entity>::table()
            ));
            qb.push_bind(id);
            qb.push(")");
            let found: bool = qb.build_query_scalar().fetch_one(&mut *conn).await?;
            Ok(found)
        }
    }
}
