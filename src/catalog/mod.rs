//! Catalog items, filtering and the per-table view state shared by every
//! front end.

mod dashboard;
mod filter;
mod item;
mod kind;
mod view;

use thiserror::Error;

use crate::backend::BackendError;

pub use dashboard::Dashboard;
pub use filter::EmptyQueryPolicy;
pub use item::{CatalogItem, ItemKey};
pub use kind::CatalogKind;
pub use view::{CatalogView, LikeRequest, LoadState, fetch_snapshot, send_like, submit_request};

/// A table snapshot could not be read.
#[derive(Debug, Error)]
#[error("failed to fetch {}: {source}", .kind.plural())]
pub struct FetchError {
    pub kind: CatalogKind,
    #[source]
    pub source: BackendError,
}
