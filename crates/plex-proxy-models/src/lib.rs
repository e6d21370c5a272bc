pub mod item;
pub mod media;
pub mod resolution;
pub mod response;
pub mod section;

pub use item::{ItemLinks, NormalizedItem};
pub use media::MediaKind;
pub use resolution::{resolution_rank, sort_resolution_labels, CANONICAL_RESOLUTIONS};
pub use response::{LibraryResponse, LibrarySummary, ServerDescriptor};
pub use section::{LibrarySection, SectionReport};
