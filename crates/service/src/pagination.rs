//! Pagination utilities for service layer
//!
//! List screens use a fixed page size; [`Page`] carries the envelope a front end
//! needs to render pager controls.
use sea_orm::{DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, Select};
use serde::Serialize;

/// Items per list page.
pub const PAGE_SIZE: u64 = 10;

/// Clamp a requested 1-based page index; `None` and `0` mean the first page.
pub fn normalize_page(page: Option<u64>) -> u64 {
    match page {
        Some(p) if p > 0 => p,
        _ => 1,
    }
}

/// Pull a page index back inside `1..=last_page`.
pub fn clamp_page(requested: u64, last_page: u64) -> u64 {
    requested.clamp(1, last_page.max(1))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub current_page: u64,
    pub last_page: u64,
    pub per_page: u64,
    pub total: u64,
    /// 1-based position of the first item on this page, `None` when empty.
    pub from: Option<u64>,
    pub to: Option<u64>,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, current_page: u64, total: u64, per_page: u64) -> Self {
        let per_page = per_page.max(1);
        let last_page = total.div_ceil(per_page).max(1);
        let (from, to) = if data.is_empty() {
            (None, None)
        } else {
            let first = (current_page - 1) * per_page + 1;
            (Some(first), Some(first + data.len() as u64 - 1))
        };
        Self { data, current_page, last_page, per_page, total, from, to }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            current_page: self.current_page,
            last_page: self.last_page,
            per_page: self.per_page,
            total: self.total,
            from: self.from,
            to: self.to,
        }
    }
}

/// Run `select` as one page of [`PAGE_SIZE`] rows.
///
/// A page past the end is served as the last page, and the envelope reports
/// the page actually returned.
pub async fn fetch_page<E>(db: &DatabaseConnection, select: Select<E>, page: u64) -> Result<Page<E::Model>, DbErr>
where
    E: EntityTrait,
    E::Model: Send + Sync,
{
    let paginator = select.paginate(db, PAGE_SIZE);
    let totals = paginator.num_items_and_pages().await?;
    let page = clamp_page(page, totals.number_of_pages);
    let data = paginator.fetch_page(page - 1).await?;
    Ok(Page::new(data, page, totals.number_of_items, PAGE_SIZE))
}
