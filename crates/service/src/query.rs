//! Building blocks for the list screens: sort resolution, free-text search and
//! inclusive date bounds. Each resource module composes these into its own
//! filter type.
use chrono::NaiveDate;
use sea_orm::{ColumnTrait, Condition, EntityTrait, Order, QueryOrder, Select};
use serde::{Deserialize, Serialize};

use crate::pagination::Page;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn order(self) -> Order {
        match self {
            SortDirection::Asc => Order::Asc,
            SortDirection::Desc => Order::Desc,
        }
    }
}

/// A resource's sortable fields.
pub trait SortKey: Copy + PartialEq + Sized + 'static {
    type Entity: EntityTrait;

    /// All keys with their query-string names.
    const KEYS: &'static [(&'static str, Self)];
    const DEFAULT: Self;

    fn column(self) -> <Self::Entity as EntityTrait>::Column;

    /// Unknown or missing names fall back to [`SortKey::DEFAULT`].
    fn resolve(name: Option<&str>) -> Self {
        name.and_then(|n| Self::KEYS.iter().find(|(k, _)| *k == n).map(|(_, v)| *v))
            .unwrap_or(Self::DEFAULT)
    }

    fn name(self) -> &'static str {
        Self::KEYS.iter().find(|(_, v)| *v == self).map(|(k, _)| *k).unwrap_or("")
    }
}

/// Resolved ordering for one list request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sort<K> {
    pub key: K,
    pub direction: SortDirection,
}

impl<K: SortKey> Sort<K> {
    pub fn resolve(sort_by: Option<&str>, direction: Option<SortDirection>) -> Self {
        Self { key: K::resolve(sort_by), direction: direction.unwrap_or_default() }
    }

    pub fn apply(self, select: Select<K::Entity>) -> Select<K::Entity> {
        select.order_by(self.key.column(), self.direction.order())
    }
}

/// OR together a substring match over `columns`; blank terms yield `None`.
pub fn search_condition<C: ColumnTrait>(term: Option<&str>, columns: &[C]) -> Option<Condition> {
    let term = term.map(str::trim).filter(|t| !t.is_empty())?;
    Some(columns.iter().fold(Condition::any(), |cond, col| cond.add(col.contains(term))))
}

/// Inclusive `[from, to]` bounds on a date column; `None` when both are open.
pub fn date_range<C: ColumnTrait>(column: C, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Option<Condition> {
    if from.is_none() && to.is_none() {
        return None;
    }
    let mut cond = Condition::all();
    if let Some(from) = from { cond = cond.add(column.gte(from)); }
    if let Some(to) = to { cond = cond.add(column.lte(to)); }
    Some(cond)
}

/// Treat blank query-string values as absent.
pub fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// One list page plus the filters that produced it, echoed back for the UI.
#[derive(Debug, Clone, Serialize)]
pub struct Listing<T, F> {
    pub items: Page<T>,
    pub filters: F,
}
