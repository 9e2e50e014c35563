#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

use std::path::Path;

use alloy_primitives::U256;
use rocksdb::DB;
use thiserror::Error;

/// A [Result] type alias where the error is [StoreError].
pub type StoreResult<T> = Result<T, StoreError>;

/// An error type for [BlockStore] operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The underlying database returned an error.
    #[error("Database error: {_0}")]
    Database(#[from] rocksdb::Error),
    /// A stored value could not be decoded as a block number.
    #[error("Invalid block number encoding for key {_0}")]
    InvalidValue(String),
}

/// Persistent store for listener and route block cursors.
///
/// Values are stored as big-endian integers with leading zeros stripped, so
/// cursors written by older deployments remain readable.
#[derive(Debug)]
pub struct BlockStore {
    db: DB,
}

impl BlockStore {
    /// Opens (or creates) the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let mut opts = rocksdb::Options::default();
        opts.create_if_missing(true);
        Ok(Self { db: DB::open(&opts, path)? })
    }

    /// Stores the last proven execution block for the `(source, destination)` route.
    pub fn store_block(&self, source: u8, destination: u8, block: u64) -> StoreResult<()> {
        self.db.put(Self::route_key(source, destination), encode_block(block))?;
        Ok(())
    }

    /// Returns the last proven execution block for the `(source, destination)` route,
    /// or zero if the route has never been advanced.
    pub fn latest_block(&self, source: u8, destination: u8) -> StoreResult<u64> {
        let key = Self::route_key(source, destination);
        match self.db.get(&key)? {
            Some(value) => decode_block(&value).ok_or(StoreError::InvalidValue(key)),
            None => Ok(0),
        }
    }

    /// Stores the chain listener cursor for `domain`.
    pub fn store_chain_block(&self, domain: u8, block: u64) -> StoreResult<()> {
        self.db.put(Self::chain_key(domain), encode_block(block))?;
        Ok(())
    }

    /// Returns the chain listener cursor for `domain`, or `None` if the domain
    /// has never been observed.
    pub fn latest_chain_block(&self, domain: u8) -> StoreResult<Option<u64>> {
        let key = Self::chain_key(domain);
        match self.db.get(&key)? {
            Some(value) => decode_block(&value)
                .map(Some)
                .ok_or(StoreError::InvalidValue(key)),
            None => Ok(None),
        }
    }

    fn route_key(source: u8, destination: u8) -> String {
        format!("source:{source}:destination:{destination}:blockNumber")
    }

    fn chain_key(domain: u8) -> String {
        format!("chain:{domain}:block")
    }
}

fn encode_block(block: u64) -> Vec<u8> {
    U256::from(block).to_be_bytes_trimmed_vec()
}

fn decode_block(value: &[u8]) -> Option<u64> {
    U256::try_from_be_slice(value).and_then(|v| v.try_into().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_store() -> (TempDir, BlockStore) {
        let dir = TempDir::new().unwrap();
        let store = BlockStore::open(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn test_latest_block_absent_is_zero() {
        let (_dir, store) = open_store();
        assert_eq!(store.latest_block(1, 2).unwrap(), 0);
    }

    #[test]
    fn test_store_block_roundtrip() {
        let (_dir, store) = open_store();
        store.store_block(1, 2, 5).unwrap();
        assert_eq!(store.latest_block(1, 2).unwrap(), 5);

        // Routes are directional.
        assert_eq!(store.latest_block(2, 1).unwrap(), 0);
    }

    #[test]
    fn test_store_block_overwrites() {
        let (_dir, store) = open_store();
        store.store_block(1, 2, 100).unwrap();
        store.store_block(1, 2, 2432).unwrap();
        assert_eq!(store.latest_block(1, 2).unwrap(), 2432);
    }

    #[test]
    fn test_value_encoding_strips_leading_zeros() {
        let (_dir, store) = open_store();
        store.store_block(1, 2, 5).unwrap();
        let raw = store.db.get(b"source:1:destination:2:blockNumber").unwrap().unwrap();
        assert_eq!(raw, vec![5]);
    }

    #[test]
    fn test_chain_cursor_roundtrip() {
        let (_dir, store) = open_store();
        assert_eq!(store.latest_chain_block(3).unwrap(), None);
        store.store_chain_block(3, 19_000_000).unwrap();
        assert_eq!(store.latest_chain_block(3).unwrap(), Some(19_000_000));
    }
}
