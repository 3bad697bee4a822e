pub mod collection;
pub mod document;
pub mod ids;
pub mod space;

pub use collection::CollectionInfo;
pub use document::{Metadata, StoredDocument};
pub use ids::CollectionId;
pub use space::DistanceSpace;
