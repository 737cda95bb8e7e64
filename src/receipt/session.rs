//! Per-user receipt scanning state.
//!
//! Each user is either idle, waiting on the AI to read a receipt, or reviewing the
//! items read from a receipt. Only one scan per user may be in flight at a time.
//! Receipts left in review for longer than [STAGED_RECEIPT_LIFETIME] are discarded.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use time::{Date, Duration, OffsetDateTime};

use crate::{auth::UserID, database_id::CategoryId, receipt::ScanError};

/// A line item read from a receipt.
#[derive(Debug, Clone, PartialEq)]
pub struct ScannedItem {
    pub name: String,
    /// The price in whole yen.
    pub price: i64,
    /// The category the AI guessed for the item.
    pub category_id: CategoryId,
}

/// The items read from a receipt, waiting for the user to review them.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedReceipt {
    /// The store name, empty if the receipt did not show one.
    pub store: String,
    pub date: Date,
    /// Never empty.
    pub items: Vec<ScannedItem>,
}

impl StagedReceipt {
    /// The sum of the item prices.
    pub fn total(&self) -> i64 {
        self.items
            .iter()
            .fold(0, |total: i64, item| total.saturating_add(item.price))
    }
}

/// Where a user is in the scanning flow.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ScanState {
    #[default]
    Idle,
    /// A receipt has been sent to the AI and the reply has not arrived yet.
    Scanning,
    Reviewing(StagedReceipt),
}

/// How long a receipt may wait for review before it is discarded.
pub const STAGED_RECEIPT_LIFETIME: Duration = Duration::days(1);

#[derive(Debug)]
struct Session {
    state: ScanState,
    updated_at: OffsetDateTime,
}

impl Session {
    fn now(state: ScanState) -> Self {
        Self {
            state,
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    fn is_expired(&self, now: OffsetDateTime) -> bool {
        matches!(self.state, ScanState::Reviewing(_))
            && now - self.updated_at >= STAGED_RECEIPT_LIFETIME
    }
}

/// The scanning state of every user.
#[derive(Debug, Clone, Default)]
pub struct ScanSessions {
    sessions: Arc<Mutex<HashMap<UserID, Session>>>,
}

impl ScanSessions {
    /// Create an empty set of sessions where every user is idle.
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock cannot leave a half-written state, so the map is still usable.
    fn lock(&self) -> MutexGuard<'_, HashMap<UserID, Session>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drop every receipt that has been waiting for review for too long.
    fn remove_expired(sessions: &mut HashMap<UserID, Session>, now: OffsetDateTime) {
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired(now));

        let removed = before - sessions.len();
        if removed > 0 {
            tracing::info!("Discarded {removed} receipts that were never reviewed");
        }
    }

    /// The current state of `user_id`'s session.
    pub fn state(&self, user_id: UserID) -> ScanState {
        self.lock()
            .get(&user_id)
            .map(|session| session.state.clone())
            .unwrap_or_default()
    }

    /// Mark the user as scanning.
    ///
    /// Any items that were being reviewed are discarded. The returned ticket must be
    /// [finished](ScanTicket::finish), otherwise the session goes back to idle when it is dropped.
    ///
    /// # Errors
    ///
    /// Returns [ScanError::Busy] if the user is already scanning a receipt.
    pub fn begin_scan(&self, user_id: UserID) -> Result<ScanTicket, ScanError> {
        let mut sessions = self.lock();
        Self::remove_expired(&mut sessions, OffsetDateTime::now_utc());

        if matches!(
            sessions.get(&user_id),
            Some(Session {
                state: ScanState::Scanning,
                ..
            })
        ) {
            return Err(ScanError::Busy);
        }

        sessions.insert(user_id, Session::now(ScanState::Scanning));

        Ok(ScanTicket {
            sessions: self.clone(),
            user_id,
            finished: false,
        })
    }

    /// Take the staged receipt, leaving the user idle.
    ///
    /// Returns `None`, and leaves the session untouched, if the user is not reviewing a receipt.
    pub fn take_staged(&self, user_id: UserID) -> Option<StagedReceipt> {
        let mut sessions = self.lock();

        match sessions.remove(&user_id) {
            Some(Session {
                state: ScanState::Reviewing(receipt),
                ..
            }) => Some(receipt),
            Some(other) => {
                sessions.insert(user_id, other);
                None
            }
            None => None,
        }
    }

    /// Put a receipt back up for review after saving it failed.
    ///
    /// Does nothing if the user has started another scan in the meantime.
    pub fn restore_staged(&self, user_id: UserID, receipt: StagedReceipt) {
        self.lock()
            .entry(user_id)
            .or_insert_with(|| Session::now(ScanState::Reviewing(receipt)));
    }

    /// Discard any staged receipt.
    ///
    /// Returns `true` if there was a receipt to discard. An in-flight scan is not affected.
    pub fn cancel(&self, user_id: UserID) -> bool {
        self.take_staged(user_id).is_some()
    }

    fn set(&self, user_id: UserID, state: ScanState) {
        let mut sessions = self.lock();
        Self::remove_expired(&mut sessions, OffsetDateTime::now_utc());

        match state {
            ScanState::Idle => sessions.remove(&user_id),
            state => sessions.insert(user_id, Session::now(state)),
        };
    }
}

/// Proof that a user's scan is in flight.
#[derive(Debug)]
pub struct ScanTicket {
    sessions: ScanSessions,
    user_id: UserID,
    finished: bool,
}

impl ScanTicket {
    /// Record the outcome of the scan.
    ///
    /// A successful scan moves the user to reviewing, a failed one back to idle.
    pub fn finish(
        mut self,
        result: Result<StagedReceipt, ScanError>,
    ) -> Result<StagedReceipt, ScanError> {
        self.finished = true;

        match result {
            Ok(receipt) => {
                self.sessions
                    .set(self.user_id, ScanState::Reviewing(receipt.clone()));
                Ok(receipt)
            }
            Err(error) => {
                self.sessions.set(self.user_id, ScanState::Idle);
                Err(error)
            }
        }
    }
}

impl Drop for ScanTicket {
    fn drop(&mut self) {
        if !self.finished {
            tracing::warn!("Scan for user {} was abandoned", self.user_id);
            self.sessions.set(self.user_id, ScanState::Idle);
        }
    }
}

#[cfg(test)]
mod scan_session_tests {
    use time::{Duration, OffsetDateTime, macros::date};

    use crate::{auth::UserID, receipt::ScanError};

    use super::{
        STAGED_RECEIPT_LIFETIME, ScanSessions, ScanState, ScannedItem, Session, StagedReceipt,
    };

    fn receipt() -> StagedReceipt {
        StagedReceipt {
            store: "コンビニ".to_owned(),
            date: date!(2026 - 10 - 19),
            items: vec![
                ScannedItem {
                    name: "おにぎり".to_owned(),
                    price: 150,
                    category_id: 1,
                },
                ScannedItem {
                    name: "お茶".to_owned(),
                    price: 130,
                    category_id: 1,
                },
            ],
        }
    }

    #[test]
    fn new_sessions_are_idle() {
        let sessions = ScanSessions::new();

        assert_eq!(sessions.state(UserID::new(1)), ScanState::Idle);
    }

    #[test]
    fn successful_scan_moves_to_reviewing() {
        let sessions = ScanSessions::new();
        let user_id = UserID::new(1);

        let ticket = sessions.begin_scan(user_id).unwrap();
        assert_eq!(sessions.state(user_id), ScanState::Scanning);
        ticket.finish(Ok(receipt())).unwrap();

        assert_eq!(sessions.state(user_id), ScanState::Reviewing(receipt()));
    }

    #[test]
    fn failed_scan_returns_to_idle() {
        let sessions = ScanSessions::new();
        let user_id = UserID::new(1);

        let ticket = sessions.begin_scan(user_id).unwrap();
        let result = ticket.finish(Err(ScanError::MalformedResponse("no JSON".to_owned())));

        assert!(result.is_err());
        assert_eq!(sessions.state(user_id), ScanState::Idle);
    }

    #[test]
    fn second_scan_while_scanning_is_rejected() {
        let sessions = ScanSessions::new();
        let user_id = UserID::new(1);

        let _ticket = sessions.begin_scan(user_id).unwrap();

        assert_eq!(sessions.begin_scan(user_id).unwrap_err(), ScanError::Busy);
        assert!(sessions.begin_scan(UserID::new(2)).is_ok());
    }

    #[test]
    fn dropped_ticket_returns_to_idle() {
        let sessions = ScanSessions::new();
        let user_id = UserID::new(1);

        drop(sessions.begin_scan(user_id).unwrap());

        assert_eq!(sessions.state(user_id), ScanState::Idle);
        assert!(sessions.begin_scan(user_id).is_ok());
    }

    #[test]
    fn take_staged_only_while_reviewing() {
        let sessions = ScanSessions::new();
        let user_id = UserID::new(1);
        assert_eq!(sessions.take_staged(user_id), None);

        let ticket = sessions.begin_scan(user_id).unwrap();
        assert_eq!(sessions.take_staged(user_id), None);
        assert_eq!(sessions.state(user_id), ScanState::Scanning);

        ticket.finish(Ok(receipt())).unwrap();
        assert_eq!(sessions.take_staged(user_id), Some(receipt()));
        assert_eq!(sessions.state(user_id), ScanState::Idle);
    }

    #[test]
    fn cancel_discards_staged_items() {
        let sessions = ScanSessions::new();
        let user_id = UserID::new(1);
        sessions.begin_scan(user_id).unwrap().finish(Ok(receipt())).unwrap();

        assert!(sessions.cancel(user_id));
        assert!(!sessions.cancel(user_id));
        assert_eq!(sessions.state(user_id), ScanState::Idle);
    }

    #[test]
    fn restore_staged_does_not_clobber_new_scan() {
        let sessions = ScanSessions::new();
        let user_id = UserID::new(1);
        sessions.begin_scan(user_id).unwrap().finish(Ok(receipt())).unwrap();

        let staged = sessions.take_staged(user_id).unwrap();
        sessions.restore_staged(user_id, staged.clone());
        assert_eq!(sessions.state(user_id), ScanState::Reviewing(receipt()));

        sessions.take_staged(user_id).unwrap();
        let _ticket = sessions.begin_scan(user_id).unwrap();
        sessions.restore_staged(user_id, staged);
        assert_eq!(sessions.state(user_id), ScanState::Scanning);
    }

    #[test]
    fn total_sums_prices() {
        assert_eq!(receipt().total(), 280);
    }

    #[test]
    fn total_saturates_instead_of_overflowing() {
        let mut receipt = receipt();
        receipt.items[0].price = i64::MAX;

        assert_eq!(receipt.total(), i64::MAX);
    }

    #[test]
    fn stale_receipts_are_discarded_on_next_scan() {
        let sessions = ScanSessions::new();
        let stale_user = UserID::new(2);
        let fresh_user = UserID::new(3);
        {
            let mut map = sessions.lock();
            map.insert(
                stale_user,
                Session {
                    state: ScanState::Reviewing(receipt()),
                    updated_at: OffsetDateTime::now_utc()
                        - STAGED_RECEIPT_LIFETIME
                        - Duration::minutes(1),
                },
            );
            map.insert(fresh_user, Session::now(ScanState::Reviewing(receipt())));
        }

        let _ticket = sessions.begin_scan(UserID::new(1)).unwrap();

        assert_eq!(sessions.state(stale_user), ScanState::Idle);
        assert!(!sessions.lock().contains_key(&stale_user));
        assert_eq!(sessions.state(fresh_user), ScanState::Reviewing(receipt()));
    }
}
