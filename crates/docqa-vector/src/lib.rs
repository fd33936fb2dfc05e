//! Vector side of the pipeline: the exhaustive squared-L2 index, the aligned
//! `Collection` triple and its on-disk store.

pub mod collection;
pub mod format;
pub mod index;
pub mod store;

pub use collection::Collection;
pub use index::{squared_l2, FlatL2Index, IndexBuilder};
pub use store::CollectionStore;
