pub mod error;
pub mod query;
pub mod storage;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
