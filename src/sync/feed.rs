//! An in-process feed of changes to users' categories and transactions.

use tokio::sync::broadcast;

use crate::auth::UserID;

/// How many unread events each subscriber may lag behind before older events are dropped.
pub(crate) const FEED_CAPACITY: usize = 64;

/// The collection of records that changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    /// A category was created, updated or deleted, or the defaults were seeded.
    Categories,
    /// One or more transactions were created or deleted.
    Transactions,
}

impl Collection {
    /// The SSE event name for this collection.
    pub fn event_name(&self) -> &'static str {
        match self {
            Collection::Categories => "categories",
            Collection::Transactions => "transactions",
        }
    }
}

/// A change to one user's data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeEvent {
    /// The user who owns the changed records.
    pub user_id: UserID,
    /// Which records changed.
    pub collection: Collection,
}

/// Broadcasts [ChangeEvent]s to every open event stream.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    /// Create a feed with no subscribers.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(FEED_CAPACITY);

        Self { sender }
    }

    /// Notify subscribers that `collection` changed for `user_id`.
    pub fn publish(&self, user_id: UserID, collection: Collection) {
        let event = ChangeEvent {
            user_id,
            collection,
        };

        // An error only means nobody is listening right now.
        if self.sender.send(event).is_err() {
            tracing::debug!("No subscribers for {event:?}");
        }
    }

    /// Receive every event published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}
