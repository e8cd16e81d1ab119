//! The `RecordStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `upkeep-store-sqlite`).
//! Higher layers (`upkeep-server`) depend on this abstraction, not on any
//! concrete backend.

use std::future::Future;

use crate::dataset::Dataset;

/// Abstraction over the backing store of the equipment and history tables.
///
/// The store only moves whole tables. Record updates and history appends
/// happen on the loaded [`Dataset`], which is then written back in full; the
/// last `persist` wins.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait RecordStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Read the whole dataset.
  ///
  /// A missing history table yields an empty history. A main table whose
  /// required columns cannot be resolved is an error.
  fn load(&self) -> impl Future<Output = Result<Dataset, Self::Error>> + Send + '_;

  /// Overwrite the main table and the history table with `dataset`.
  fn persist<'a>(
    &'a self,
    dataset: &'a Dataset,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}
