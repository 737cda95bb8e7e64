//! Server-sent events that tell open pages to refresh when the user's data changes.

use std::convert::Infallible;

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{
        Sse,
        sse::{Event, KeepAlive},
    },
};
use futures::{Stream, StreamExt, stream};
use tokio::sync::broadcast::{self, error::RecvError};

use crate::{
    AppState,
    auth::UserID,
    sync::{ChangeEvent, ChangeFeed},
};

/// The event name sent when the stream fell behind and some changes were dropped.
const RESYNC_EVENT: &str = "resync";

/// The state needed for the event stream.
#[derive(Debug, Clone)]
pub struct EventsState {
    pub change_feed: ChangeFeed,
}

impl FromRef<AppState> for EventsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            change_feed: state.change_feed.clone(),
        }
    }
}

/// Stream the current user's changes to the browser.
///
/// The stream is bound to the user that opened it and ends when the client disconnects.
pub async fn get_events(
    State(state): State<EventsState>,
    Extension(user_id): Extension<UserID>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    tracing::debug!("User {user_id} subscribed to changes");

    let events = user_changes(state.change_feed.subscribe(), user_id).map(move |change| {
        let event = match change {
            Some(change) => Event::default()
                .event(change.collection.event_name())
                .data(change.user_id.to_string()),
            None => Event::default().event(RESYNC_EVENT).data(user_id.to_string()),
        };

        Ok(event)
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}

/// The changes to `user_id`'s records, in the order they were published.
///
/// Yields `None` when the receiver lagged and some changes were lost.
fn user_changes(
    receiver: broadcast::Receiver<ChangeEvent>,
    user_id: UserID,
) -> impl Stream<Item = Option<ChangeEvent>> {
    stream::unfold(receiver, move |mut receiver| async move {
        loop {
            match receiver.recv().await {
                Ok(change) if change.user_id == user_id => return Some((Some(change), receiver)),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Event stream for user {user_id} skipped {skipped} changes");
                    return Some((None, receiver));
                }
                Err(RecvError::Closed) => return None,
            }
        }
    })
}

#[cfg(test)]
mod event_stream_tests {
    use axum::{
        Extension,
        extract::State,
        http::{StatusCode, header::CONTENT_TYPE},
        response::IntoResponse,
    };
    use futures::StreamExt;

    use crate::{
        auth::UserID,
        sync::{ChangeEvent, ChangeFeed, Collection, feed::FEED_CAPACITY},
    };

    use super::{EventsState, get_events, user_changes};

    #[tokio::test]
    async fn events_endpoint_opens_event_stream() {
        let feed = ChangeFeed::new();

        let response = get_events(
            State(EventsState {
                change_feed: feed.clone(),
            }),
            Extension(UserID::new(1)),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "text/event-stream"
        );
    }

    #[tokio::test]
    async fn only_the_users_own_changes_are_streamed() {
        let feed = ChangeFeed::new();
        let user_id = UserID::new(1);
        let changes = user_changes(feed.subscribe(), user_id);
        futures::pin_mut!(changes);

        feed.publish(UserID::new(2), Collection::Transactions);
        feed.publish(user_id, Collection::Categories);

        assert_eq!(
            changes.next().await,
            Some(Some(ChangeEvent {
                user_id,
                collection: Collection::Categories
            }))
        );
    }

    #[tokio::test]
    async fn stream_ends_when_feed_is_dropped() {
        let feed = ChangeFeed::new();
        let changes = user_changes(feed.subscribe(), UserID::new(1));
        futures::pin_mut!(changes);

        drop(feed);

        assert_eq!(changes.next().await, None);
    }

    #[tokio::test]
    async fn lagging_stream_asks_for_resync() {
        let feed = ChangeFeed::new();
        let user_id = UserID::new(1);
        let changes = user_changes(feed.subscribe(), user_id);
        futures::pin_mut!(changes);

        for _ in 0..=FEED_CAPACITY {
            feed.publish(user_id, Collection::Transactions);
        }

        assert_eq!(changes.next().await, Some(None));
        assert_eq!(
            changes.next().await,
            Some(Some(ChangeEvent {
                user_id,
                collection: Collection::Transactions
            }))
        );
    }
}
