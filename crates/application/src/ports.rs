use std::path::PathBuf;

use photo_grid_domain::DataUri;

use crate::ApplicationError;

/// String key-value storage. Both persistence tiers implement this; they
/// differ only in lifetime and capacity.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, ApplicationError>;

    fn set(&self, key: &str, value: &str) -> Result<(), ApplicationError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadRequest {
    pub path: PathBuf,
}

#[derive(Debug)]
pub struct ReadOutcome {
    pub sequence: u64,
    pub result: Result<DataUri, ApplicationError>,
}

/// Reads image files into data URIs off the UI thread.
///
/// Every submission gets a sequence number larger than the previous one.
/// Only the outcome of the latest submission is ever interesting.
pub trait ImageReadPipeline {
    fn submit_read(&self, request: ReadRequest) -> Result<u64, ApplicationError>;

    fn try_receive(&self) -> Result<Option<ReadOutcome>, ApplicationError>;

    /// Reads on the calling thread. The read still takes a sequence number,
    /// so it supersedes anything submitted before it.
    fn read_blocking(&self, request: ReadRequest) -> ReadOutcome;
}
