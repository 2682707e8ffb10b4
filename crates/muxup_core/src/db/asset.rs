//! Asset storage operations backed by redb.

use crate::db::tables::{ASSETS, COUNTERS, LAST_ASSET_ID_KEY};
use crate::entity::EntityService;
use crate::error::AppError;
use crate::models::asset::{AssetChanges, AssetId, MuxAsset, NewMuxAsset};
use crate::query::{FindParams, Filter};
use redb::{ReadableDatabase, ReadableTable};
use std::sync::Arc;

/// Accessor for asset tables.
pub struct AssetDb {
    db: Arc<redb::Database>,
}

fn deserialize_asset(bytes: &[u8]) -> Result<MuxAsset, AppError> {
    Ok(bincode::deserialize(bytes)?)
}

impl AssetDb {
    /// Initialize asset tables if they do not exist yet.
    ///
    /// # Errors
    /// Returns an error when redb transaction/table initialization fails.
    pub fn new(db: Arc<redb::Database>) -> Result<Self, AppError> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(ASSETS)?;
        write_txn.open_table(COUNTERS)?;
        write_txn.commit()?;
        Ok(Self { db })
    }

    /// Read every row in id order.
    fn scan(&self) -> Result<Vec<MuxAsset>, AppError> {
        let read_txn = self.db.begin_read()?;
        let assets = read_txn.open_table(ASSETS)?;
        let mut rows = Vec::new();
        for item in assets.iter()? {
            let (_, value) = item?;
            rows.push(deserialize_asset(value.value())?);
        }
        Ok(rows)
    }
}

impl EntityService for AssetDb {
    fn find_many(&self, params: &FindParams) -> Result<Vec<MuxAsset>, AppError> {
        if params.limit == 0 {
            return Ok(Vec::new());
        }
        Ok(params.apply(self.scan()?))
    }

    fn find_one(&self, id: AssetId) -> Result<Option<MuxAsset>, AppError> {
        let read_txn = self.db.begin_read()?;
        let assets = read_txn.open_table(ASSETS)?;
        match assets.get(id)? {
            Some(value) => Ok(Some(deserialize_asset(value.value())?)),
            None => Ok(None),
        }
    }

    fn count(&self, filter: Option<&Filter>) -> Result<usize, AppError> {
        let rows = self.scan()?;
        Ok(match filter {
            Some(filter) => rows.iter().filter(|asset| filter.matches(asset)).count(),
            None => rows.len(),
        })
    }

    fn create(&self, data: NewMuxAsset) -> Result<MuxAsset, AppError> {
        let write_txn = self.db.begin_write()?;
        let asset = {
            let mut assets = write_txn.open_table(ASSETS)?;
            let mut counters = write_txn.open_table(COUNTERS)?;

            let last_id = counters
                .get(LAST_ASSET_ID_KEY)?
                .map(|guard| guard.value())
                .unwrap_or(0);
            let id = last_id.checked_add(1).ok_or_else(|| {
                AppError::StorageMessage("Asset id space exhausted".to_string())
            })?;

            let asset = MuxAsset::from_new(id, data);
            let encoded = bincode::serialize(&asset)?;
            assets.insert(id, encoded.as_slice())?;
            counters.insert(LAST_ASSET_ID_KEY, id)?;
            asset
        };
        write_txn.commit()?;
        tracing::debug!(id = asset.id, "created asset record");
        Ok(asset)
    }

    fn update(&self, id: AssetId, changes: AssetChanges) -> Result<Option<MuxAsset>, AppError> {
        let write_txn = self.db.begin_write()?;
        let updated = {
            let mut assets = write_txn.open_table(ASSETS)?;
            let Some(old_guard) = assets.get(id)? else {
                return Ok(None);
            };
            let mut asset = deserialize_asset(old_guard.value())?;
            drop(old_guard);

            asset.apply(changes);
            let encoded = bincode::serialize(&asset)?;
            assets.insert(id, encoded.as_slice())?;
            asset
        };
        write_txn.commit()?;
        Ok(Some(updated))
    }

    fn delete(&self, id: AssetId) -> Result<Option<MuxAsset>, AppError> {
        let write_txn = self.db.begin_write()?;
        let deleted = {
            let mut assets = write_txn.open_table(ASSETS)?;
            let Some(old_guard) = assets.get(id)? else {
                return Ok(None);
            };
            let asset = deserialize_asset(old_guard.value())?;
            drop(old_guard);

            let _ = assets.remove(id)?;
            asset
        };
        write_txn.commit()?;
        tracing::debug!(id, "deleted asset record");
        Ok(Some(deleted))
    }
}
