use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

/// Number of posts on every listing page.
pub const PAGE_SIZE: i64 = 10;

/// PageMeta
///
/// Pagination metadata serialized with every listing response. `page` is the
/// 1-based page number actually served, which may differ from the requested
/// one because out-of-range requests clamp instead of erroring.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[ts(export)]
pub struct PageMeta {
    pub page: i64,
    pub page_size: i64,
    pub total_items: i64,
    pub total_pages: i64,
    pub has_next: bool,
    pub has_previous: bool,
}

/// Paginator
///
/// Partitions an ordered collection of `total_items` into fixed-size pages
/// addressed by 1-based page number. Page k covers items
/// `[(k-1)*page_size, k*page_size)` clipped to the collection.
///
/// The paginator never fails: a missing page number defaults to 1, and
/// out-of-range numbers clamp to the nearest valid page (first or last). An
/// empty collection still has exactly one valid, empty page.
#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    page_size: i64,
}

impl Paginator {
    pub const fn new(page_size: i64) -> Self {
        Self { page_size }
    }

    pub fn total_pages(&self, total_items: i64) -> i64 {
        if total_items <= 0 {
            1
        } else {
            (total_items + self.page_size - 1) / self.page_size
        }
    }

    /// clamp_page
    ///
    /// Resolves the requested page number against the collection size:
    /// absent -> 1, below range -> 1, above range -> last page.
    pub fn clamp_page(&self, requested: Option<i64>, total_items: i64) -> i64 {
        requested.unwrap_or(1).clamp(1, self.total_pages(total_items))
    }

    /// Row offset of a (clamped) page number.
    pub fn offset(&self, page: i64) -> i64 {
        (page - 1) * self.page_size
    }

    pub fn limit(&self) -> i64 {
        self.page_size
    }

    /// Assembles the metadata for a page number already clamped into range.
    pub fn meta(&self, page: i64, total_items: i64) -> PageMeta {
        let total_pages = self.total_pages(total_items);
        PageMeta {
            page,
            page_size: self.page_size,
            total_items,
            total_pages,
            has_next: page < total_pages,
            has_previous: page > 1,
        }
    }
}
