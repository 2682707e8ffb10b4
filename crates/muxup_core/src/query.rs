//! Translation between listing query strings and structured filter/order
//! directives.
//!
//! The server side turns `filter=field:value`, `sort=field` and
//! `order=asc|desc` into [`FindParams`]. The client side builds those query
//! pairs from a [`SearchVector`] and a [`SortVector`].

use crate::constants::{DEFAULT_PAGE_LIMIT, DEFAULT_PAGE_START};
use crate::models::asset::MuxAsset;
use serde::Deserialize;
use std::cmp::Ordering;

/// String fields a listing can be filtered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetField {
    Title,
    AssetId,
    UploadId,
    PlaybackId,
}

impl AssetField {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "title" => Some(Self::Title),
            "asset_id" => Some(Self::AssetId),
            "upload_id" => Some(Self::UploadId),
            "playback_id" => Some(Self::PlaybackId),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::AssetId => "asset_id",
            Self::UploadId => "upload_id",
            Self::PlaybackId => "playback_id",
        }
    }

    fn value_of(self, asset: &MuxAsset) -> Option<&str> {
        match self {
            Self::Title => Some(asset.title.as_str()),
            Self::AssetId => asset.asset_id.as_deref(),
            Self::UploadId => asset.upload_id.as_deref(),
            Self::PlaybackId => asset.playback_id.as_deref(),
        }
    }
}

/// Match operator applied to a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterOp {
    /// Case-insensitive substring match.
    ContainsI(String),
    /// Exact match.
    Eq(String),
}

/// A single-field filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub field: AssetField,
    pub op: FilterOp,
}

impl Filter {
    pub fn contains(field: AssetField, value: &str) -> Self {
        Self {
            field,
            op: FilterOp::ContainsI(value.to_string()),
        }
    }

    pub fn eq(field: AssetField, value: &str) -> Self {
        Self {
            field,
            op: FilterOp::Eq(value.to_string()),
        }
    }

    /// Records with no value for the field never match.
    pub fn matches(&self, asset: &MuxAsset) -> bool {
        let Some(value) = self.field.value_of(asset) else {
            return false;
        };
        match &self.op {
            FilterOp::ContainsI(needle) => value.to_lowercase().contains(&needle.to_lowercase()),
            FilterOp::Eq(expected) => value == expected,
        }
    }
}

/// Parse `field:value` into a substring filter.
///
/// Only the first colon separates field from value. Unknown fields yield no
/// filter.
pub fn parse_filter(raw: &str) -> Option<Filter> {
    let (field, value) = raw.split_once(':').unwrap_or((raw, ""));
    AssetField::parse(field.trim()).map(|field| Filter::contains(field, value))
}

/// Fields a listing can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Id,
    Title,
    IsReady,
    AssetId,
    UploadId,
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "id" => Some(Self::Id),
            "title" => Some(Self::Title),
            "isReady" => Some(Self::IsReady),
            "asset_id" => Some(Self::AssetId),
            "upload_id" => Some(Self::UploadId),
            "created_at" | "createdAt" => Some(Self::CreatedAt),
            "updated_at" | "updatedAt" => Some(Self::UpdatedAt),
            _ => None,
        }
    }

    fn compare(self, a: &MuxAsset, b: &MuxAsset) -> Ordering {
        match self {
            Self::Id => a.id.cmp(&b.id),
            Self::Title => a.title.cmp(&b.title),
            Self::IsReady => a.is_ready.cmp(&b.is_ready),
            Self::AssetId => a.asset_id.cmp(&b.asset_id),
            Self::UploadId => a.upload_id.cmp(&b.upload_id),
            Self::CreatedAt => a.created_at.cmp(&b.created_at),
            Self::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// `desc` (any case) is descending; everything else, including absence,
    /// is ascending.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some(value) if value.trim().eq_ignore_ascii_case("desc") => Self::Desc,
            _ => Self::Asc,
        }
    }
}

/// Ordering directive for a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub field: SortField,
    pub order: SortOrder,
}

impl OrderBy {
    pub fn compare(&self, a: &MuxAsset, b: &MuxAsset) -> Ordering {
        let ordering = self.field.compare(a, b).then_with(|| a.id.cmp(&b.id));
        match self.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

/// Build an ordering directive; an absent or unknown sort field yields none.
pub fn parse_order(sort: Option<&str>, order: Option<&str>) -> Option<OrderBy> {
    let field = SortField::parse(sort?.trim())?;
    Some(OrderBy {
        field,
        order: SortOrder::parse(order),
    })
}

/// Structured listing parameters handed to the entity service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindParams {
    pub start: usize,
    pub limit: usize,
    pub filter: Option<Filter>,
    pub order_by: Option<OrderBy>,
}

impl Default for FindParams {
    fn default() -> Self {
        Self {
            start: DEFAULT_PAGE_START,
            limit: DEFAULT_PAGE_LIMIT,
            filter: None,
            order_by: None,
        }
    }
}

impl FindParams {
    /// Filter, order and paginate `rows`.
    ///
    /// Rows arrive in identifier order, which is kept when no ordering
    /// directive is set.
    pub fn apply(&self, rows: impl IntoIterator<Item = MuxAsset>) -> Vec<MuxAsset> {
        let mut matched: Vec<MuxAsset> = rows
            .into_iter()
            .filter(|asset| self.filter.as_ref().map_or(true, |f| f.matches(asset)))
            .collect();
        if let Some(order_by) = self.order_by {
            matched.sort_by(|a, b| order_by.compare(a, b));
        }
        matched
            .into_iter()
            .skip(self.start)
            .take(self.limit)
            .collect()
    }
}

/// Raw query parameters of `GET /mux-asset` and `GET /mux-asset/count`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssetListQuery {
    pub start: Option<usize>,
    pub limit: Option<usize>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub filter: Option<String>,
}

impl AssetListQuery {
    /// The filter shared by the listing and its count query.
    pub fn filter(&self) -> Option<Filter> {
        self.filter.as_deref().and_then(parse_filter)
    }

    pub fn find_params(&self) -> FindParams {
        FindParams {
            start: self.start.unwrap_or(DEFAULT_PAGE_START),
            limit: self.limit.unwrap_or(DEFAULT_PAGE_LIMIT),
            filter: self.filter(),
            order_by: parse_order(self.sort.as_deref(), self.order.as_deref()),
        }
    }
}

/// Search input as chosen in a listing UI (`by_title`, `by_asset_id`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchVector {
    pub field: String,
    pub value: String,
}

impl SearchVector {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    /// The `filter` query value, or `None` for an unknown search field.
    pub fn filter_param(&self) -> Option<String> {
        let field = match self.field.as_str() {
            "by_title" => AssetField::Title,
            "by_asset_id" => AssetField::AssetId,
            _ => return None,
        };
        Some(format!("{}:{}", field.as_str(), self.value))
    }
}

/// Sort input as chosen in a listing UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortVector {
    pub field: String,
    pub desc: bool,
}

/// Query pairs for `GET /mux-asset`, in the order the server logs them.
pub fn list_query_pairs(
    search: Option<&SearchVector>,
    sort: Option<&SortVector>,
    start: usize,
    limit: usize,
) -> Vec<(&'static str, String)> {
    let mut pairs = vec![("start", start.to_string())];
    if let Some(sort) = sort {
        pairs.push(("sort", sort.field.clone()));
        let order = if sort.desc { "desc" } else { "asc" };
        pairs.push(("order", order.to_string()));
    }
    pairs.push(("limit", limit.to_string()));
    if let Some(filter) = search.and_then(SearchVector::filter_param) {
        pairs.push(("filter", filter));
    }
    pairs
}
