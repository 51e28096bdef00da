//! A prelude that re-exports the traits a consumer of the storage layer
//! usually needs in scope.
pub use crate::spectrum::traits::SpectrumLike;
pub use crate::storage::ArrayStorage;
