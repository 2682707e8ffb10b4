//! Generic entity-service contract for asset records.
//!
//! The HTTP controllers only talk to this trait; [`crate::db::AssetDb`] is the
//! redb-backed implementation.

use crate::error::AppError;
use crate::models::asset::{AssetChanges, AssetId, MuxAsset, NewMuxAsset};
use crate::query::{FindParams, Filter};

/// CRUD operations over a single record kind.
///
/// `find_many` and `count` are independent reads; nothing spans the two, so a
/// write landing between them can make a reported total disagree with the
/// returned page.
pub trait EntityService: Send + Sync {
    /// Filtered, ordered and paginated listing.
    fn find_many(&self, params: &FindParams) -> Result<Vec<MuxAsset>, AppError>;

    /// Fetch one record by id.
    fn find_one(&self, id: AssetId) -> Result<Option<MuxAsset>, AppError>;

    /// Number of records matching `filter` (all records when `None`).
    fn count(&self, filter: Option<&Filter>) -> Result<usize, AppError>;

    /// Insert a record and return it with its assigned id.
    fn create(&self, data: NewMuxAsset) -> Result<MuxAsset, AppError>;

    /// Apply `changes` to an existing record.
    ///
    /// # Returns
    /// `Ok(None)` when the record does not exist.
    fn update(&self, id: AssetId, changes: AssetChanges) -> Result<Option<MuxAsset>, AppError>;

    /// Remove a record and return what was deleted.
    fn delete(&self, id: AssetId) -> Result<Option<MuxAsset>, AppError>;

    /// First record matching `filter`, in id order.
    fn find_first(&self, filter: &Filter) -> Result<Option<MuxAsset>, AppError> {
        let params = FindParams {
            start: 0,
            limit: 1,
            filter: Some(filter.clone()),
            order_by: None,
        };
        Ok(self.find_many(&params)?.into_iter().next())
    }
}
