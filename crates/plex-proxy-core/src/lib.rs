pub mod aggregate;
pub mod error;
pub mod guid;
pub mod normalize;
pub mod resolution;

pub use aggregate::{build_response, handle_library_request, LibraryQuery};
pub use error::AggregateError;
pub use guid::extract_tmdb_id;
pub use resolution::{label_from_dimensions, label_from_token, labels_from_media};
