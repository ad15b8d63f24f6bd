//! Executing load plans against a connection
//!
//! Each relationship in a plan is fetched with a single batched query over
//! the collected parent keys, then recursed into for the node's children.
//! Accessors are plain fn pointers supplied by each entity's
//! [`Entity::load_relation`] implementation, which keeps this module free of
//! per-entity knowledge.

use std::collections::{HashMap, HashSet};

use sqlx::{PgConnection, QueryBuilder};
use uuid::Uuid;

use super::base::Entity;
use super::load::LoadNode;
use crate::error::DbResult;

/// Apply every node of a load plan to the given rows
pub async fn hydrate<E: Entity>(
    conn: &mut PgConnection,
    rows: &mut [E],
    plan: &[LoadNode],
) -> DbResult<()> {
    if rows.is_empty() {
        return Ok(());
    }
    for node in plan {
        E::load_relation(conn, rows, node).await?;
    }
    Ok(())
}

/// Load a one-to-many relationship into `slot` on each parent
///
/// Children are fetched in one query over all parent ids and bucketed by
/// `child_fk`. Parents with no children get `Some(vec![])`, distinguishing
/// "loaded and empty" from "never loaded".
pub async fn load_one_to_many<P, C>(
    conn: &mut PgConnection,
    parents: &mut [P],
    node: &LoadNode,
    child_fk: fn(&C) -> Uuid,
    slot: fn(&mut P) -> &mut Option<Vec<C>>,
) -> DbResult<()>
where
    P: Entity,
    C: Entity,
{
    let ids: Vec<Uuid> = parents.iter().map(|p| p.id()).collect();

    let mut qb = QueryBuilder::new(format!(
        "SELECT * FROM {} WHERE {} = ANY(",
        C::KIND.table(),
        node.relation.fk_column
    ));
    qb.push_bind(ids);
    qb.push(")");

    let mut children: Vec<C> = qb.build_query_as().fetch_all(&mut *conn).await?;
    hydrate(conn, &mut children, &node.children).await?;

    let mut grouped: HashMap<Uuid, Vec<C>> = HashMap::new();
    for child in children {
        grouped.entry(child_fk(&child)).or_default().push(child);
    }
    for parent in parents {
        *slot(parent) = Some(grouped.remove(&parent.id()).unwrap_or_default());
    }
    Ok(())
}

/// Load a one-to-one relationship into `slot` on each parent
///
/// Same shape as [`load_one_to_many`] but each parent keeps at most one row.
pub async fn load_one_to_one<P, C>(
    conn: &mut PgConnection,
    parents: &mut [P],
    node: &LoadNode,
    child_fk: fn(&C) -> Uuid,
    slot: fn(&mut P) -> &mut Option<Box<C>>,
) -> DbResult<()>
where
    P: Entity,
    C: Entity,
{
    let ids: Vec<Uuid> = parents.iter().map(|p| p.id()).collect();

    let mut qb = QueryBuilder::new(format!(
        "SELECT * FROM {} WHERE {} = ANY(",
        C::KIND.table(),
        node.relation.fk_column
    ));
    qb.push_bind(ids);
    qb.push(")");

    let mut children: Vec<C> = qb.build_query_as().fetch_all(&mut *conn).await?;
    hydrate(conn, &mut children, &node.children).await?;

    let mut by_parent: HashMap<Uuid, C> = HashMap::new();
    for child in children {
        let key = child_fk(&child);
        by_parent.entry(key).or_insert(child);
    }
    for parent in parents {
        *slot(parent) = by_parent.remove(&parent.id()).map(Box::new);
    }
    Ok(())
}

/// Load a many-to-one relationship into `slot` on each parent
///
/// `parent_fk` reads the referencing column off the parent; targets are
/// fetched by primary key in one query over the distinct keys.
pub async fn load_many_to_one<P, C>(
    conn: &mut PgConnection,
    parents: &mut [P],
    node: &LoadNode,
    parent_fk: fn(&P) -> Option<Uuid>,
    slot: fn(&mut P) -> &mut Option<Box<C>>,
) -> DbResult<()>
where
    P: Entity,
    C: Entity,
{
    let distinct: HashSet<Uuid> = parents.iter().filter_map(|p| parent_fk(p)).collect();
    if distinct.is_empty() {
        return Ok(());
    }
    let ids: Vec<Uuid> = distinct.into_iter().collect();

    let mut qb = QueryBuilder::new(format!(
        "SELECT * FROM {} WHERE id = ANY(",
        C::KIND.table()
    ));
    qb.push_bind(ids);
    qb.push(")");

    let mut targets: Vec<C> = qb.build_query_as().fetch_all(&mut *conn).await?;
    hydrate(conn, &mut targets, &node.children).await?;

    let by_id: HashMap<Uuid, C> = targets.into_iter().map(|t| (t.id(), t)).collect();
    for parent in parents {
        if let Some(fk) = parent_fk(parent) {
            *slot(parent) = by_id.get(&fk).cloned().map(Box::new);
        }
    }
    Ok(())
}
