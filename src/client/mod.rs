pub mod api;
pub mod pagination;
pub mod store;

pub use api::{ClientError, ClientResult, HttpMovieApi, MovieApi};
pub use pagination::{page_window, total_pages, PageItem};
pub use store::{FetchStatus, ListSnapshot, MovieStore};
