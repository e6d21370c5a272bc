pub mod api;
pub mod candidates;
pub mod identity;
pub mod pager;
pub mod probe;
pub mod server;
pub mod traits;

pub use api::PlexHttpClient;
pub use candidates::resolve_candidates;
pub use pager::{fetch_all_pages, ContainerPage};
pub use server::{connect, ConnectError, PlexServer};
pub use traits::LibraryBackend;
