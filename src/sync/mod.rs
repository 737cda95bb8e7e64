//! Keeping each browser's view of its user's categories and transactions up to date.
//!
//! Every successful write publishes a [ChangeEvent] on the [ChangeFeed]. Open
//! pages listen on the event stream and re-fetch their content from the store
//! when one of their user's collections changes.

mod events;
mod feed;
mod view;

pub use events::get_events;
pub use feed::{ChangeEvent, ChangeFeed, Collection};
pub use view::{LedgerView, ensure_default_categories, load_categories};
