//! Equality filter composition for repository queries
//!
//! Filters map field names to values and render as an `AND`-joined WHERE
//! clause with bound parameters. Only equality comparisons are supported;
//! anything more specific belongs in a hand-written repository query.

use chrono::NaiveDate;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

/// A value that can appear on the right-hand side of an equality filter
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// UUID value (primary and foreign keys)
    Uuid(Uuid),
    /// Text value
    Text(String),
    /// 64-bit integer value
    Integer(i64),
    /// Boolean value
    Boolean(bool),
    /// Calendar date value
    Date(NaiveDate),
}

impl FilterValue {
    /// Append this value as a bound parameter
    fn push_bind(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        match self {
            Self::Uuid(v) => qb.push_bind(*v),
            Self::Text(v) => qb.push_bind(v.clone()),
            Self::Integer(v) => qb.push_bind(*v),
            Self::Boolean(v) => qb.push_bind(*v),
            Self::Date(v) => qb.push_bind(*v),
        };
    }
}

impl From<Uuid> for FilterValue {
    fn from(v: Uuid) -> Self {
        Self::Uuid(v)
    }
}

impl From<&str> for FilterValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<i64> for FilterValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<i32> for FilterValue {
    fn from(v: i32) -> Self {
        Self::Integer(i64::from(v))
    }
}

impl From<bool> for FilterValue {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<NaiveDate> for FilterValue {
    fn from(v: NaiveDate) -> Self {
        Self::Date(v)
    }
}

/// An equality filter over named fields
///
/// # Example
///
/// ```rust
/// use registra::repo::Filter;
///
/// let filter = Filter::new().eq("level", 300).eq("name", "Programming II");
/// assert!(!filter.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(&'static str, FilterValue)>,
}

impl Filter {
    /// Create an empty filter matching every row
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality condition
    ///
    /// Field names are trusted compile-time strings; values are always
    /// bound, never interpolated. Columns of a Postgres enum type take a
    /// `::text` suffix on the field name so a text parameter compares
    /// cleanly (e.g. `"status::text"`).
    #[must_use]
    pub fn eq(mut self, field: &'static str, value: impl Into<FilterValue>) -> Self {
        self.conditions.push((field, value.into()));
        self
    }

    /// True when no conditions have been added
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Number of conditions
    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    /// Append a WHERE clause joining every condition with AND
    ///
    /// Appends nothing when the filter is empty.
    pub fn push_where(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        if self.conditions.is_empty() {
            return;
        }
        qb.push(" WHERE ");
        for (i, (field, value)) in self.conditions.iter().enumerate() {
            if i > 0 {
                qb.push(" AND ");
            }
            qb.push(*field);
            qb.push(" = ");
            value.push_bind(qb);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filter_appends_nothing() {
        let mut qb = QueryBuilder::new("SELECT * FROM course");
        Filter::new().push_where(&mut qb);
        assert_eq!(qb.sql(), "SELECT * FROM course");
    }

    #[test]
    fn test_single_condition() {
        let mut qb = QueryBuilder::new("SELECT * FROM course");
        Filter::new().eq("level", 300).push_where(&mut qb);
        assert_eq!(qb.sql(), "SELECT * FROM course WHERE level = $1");
    }

    #[test]
    fn test_conditions_join_with_and() {
        let mut qb = QueryBuilder::new("SELECT * FROM course");
        Filter::new()
            .eq("level", 300)
            .eq("department_id", Uuid::nil())
            .push_where(&mut qb);
        assert_eq!(
            qb.sql(),
            "SELECT * FROM course WHERE level = $1 AND department_id = $2"
        );
    }

    #[test]
    fn test_enum_column_takes_text_cast_in_field() {
        let mut qb = QueryBuilder::new("SELECT * FROM task");
        Filter::new().eq("status::text", "UPCOMING").push_where(&mut qb);
        assert_eq!(qb.sql(), "SELECT * FROM task WHERE status::text = $1");
    }

    #[test]
    fn test_from_impls() {
        assert_eq!(FilterValue::from(7_i32), FilterValue::Integer(7));
        assert_eq!(FilterValue::from(7_i64), FilterValue::Integer(7));
        assert_eq!(FilterValue::from(true), FilterValue::Boolean(true));
        assert_eq!(
            FilterValue::from("x"),
            FilterValue::Text("x".to_string())
        );
        let id = Uuid::new_v4();
        assert_eq!(FilterValue::from(id), FilterValue::Uuid(id));
    }

    #[test]
    fn test_len_and_is_empty() {
        let filter = Filter::new();
        assert!(filter.is_empty());
        let filter = filter.eq("is_active", true);
        assert!(!filter.is_empty());
        assert_eq!(filter.len(), 1);
    }
}
