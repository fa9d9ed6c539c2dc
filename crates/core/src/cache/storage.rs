//! The partition-store seam the interceptor is written against.

use async_trait::async_trait;

use super::connection::CacheDb;
use crate::Error;
use crate::exchange::{Request, Response};

/// Named partitions of request → response pairs.
///
/// Individual operations must be atomic; callers add no locking of their own.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Create the partition if absent.
    async fn open(&self, partition: &str) -> Result<(), Error>;

    /// Partition names in creation order.
    async fn keys(&self) -> Result<Vec<String>, Error>;

    /// Delete a partition; false if it did not exist.
    async fn delete(&self, partition: &str) -> Result<bool, Error>;

    async fn match_in(&self, partition: &str, request: &Request) -> Result<Option<Response>, Error>;

    /// Search every partition, oldest first.
    async fn match_any(&self, request: &Request) -> Result<Option<Response>, Error>;

    async fn put(&self, partition: &str, request: &Request, response: &Response) -> Result<(), Error>;

    /// Store every pair or none of them.
    async fn put_all(&self, partition: &str, entries: &[(Request, Response)]) -> Result<(), Error>;
}

#[async_trait]
impl CacheStorage for CacheDb {
    async fn open(&self, partition: &str) -> Result<(), Error> {
        self.open_partition(partition).await
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        self.partition_names().await
    }

    async fn delete(&self, partition: &str) -> Result<bool, Error> {
        self.delete_partition(partition).await
    }

    async fn match_in(&self, partition: &str, request: &Request) -> Result<Option<Response>, Error> {
        self.match_entry(partition, request).await
    }

    async fn match_any(&self, request: &Request) -> Result<Option<Response>, Error> {
        CacheDb::match_any(self, request).await
    }

    async fn put(&self, partition: &str, request: &Request, response: &Response) -> Result<(), Error> {
        self.put_entry(partition, request, response).await
    }

    async fn put_all(&self, partition: &str, entries: &[(Request, Response)]) -> Result<(), Error> {
        self.put_entries(partition, entries).await
    }
}
