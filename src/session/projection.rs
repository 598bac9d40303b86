//! Counts, filters and orderings derived from the authoritative lists
//!
//! Everything here is a pure function of a snapshot. `ProjectionView` ties a
//! projection to a list subscription so it is recomputed on every change.

use std::cmp::Reverse;
use std::str::FromStr;

use tokio::sync::watch;

use crate::error::PhonedeskError;
use crate::types::{BotUser, PhoneRecord, RecordStatus, UserStatus};

use super::list::Snapshot;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordCounts {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserCounts {
    pub total: usize,
    pub active: usize,
    pub blocked: usize,
    pub inactive: usize,
}

/// Items that can be summarised into per-status counts.
pub trait Tally: Sized {
    type Counts: Default;

    fn tally(items: &[Self]) -> Self::Counts;
}

impl Tally for PhoneRecord {
    type Counts = RecordCounts;

    fn tally(items: &[Self]) -> RecordCounts {
        items.iter().fold(RecordCounts::default(), |mut counts, record| {
            counts.total += 1;
            match record.status {
                RecordStatus::Active => counts.active += 1,
                RecordStatus::Inactive => counts.inactive += 1,
                RecordStatus::Unknown => {}
            }
            counts
        })
    }
}

impl Tally for BotUser {
    type Counts = UserCounts;

    fn tally(items: &[Self]) -> UserCounts {
        items.iter().fold(UserCounts::default(), |mut counts, user| {
            counts.total += 1;
            match user.status {
                UserStatus::Active => counts.active += 1,
                UserStatus::Blocked => counts.blocked += 1,
                UserStatus::Inactive => counts.inactive += 1,
                UserStatus::Unknown => {}
            }
            counts
        })
    }
}

pub fn record_counts(records: &[PhoneRecord]) -> RecordCounts {
    PhoneRecord::tally(records)
}

pub fn user_counts(users: &[BotUser]) -> UserCounts {
    BotUser::tally(users)
}

pub fn filter_records_by_status(records: &[PhoneRecord], status: RecordStatus) -> Vec<PhoneRecord> {
    records
        .iter()
        .filter(|record| record.status == status)
        .cloned()
        .collect()
}

pub fn filter_users_by_status(users: &[BotUser], status: UserStatus) -> Vec<BotUser> {
    users
        .iter()
        .filter(|user| user.status == status)
        .cloned()
        .collect()
}

/// Record ordering for list views
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RecordSort {
    /// Newest first
    #[default]
    Id,
    Name,
    Phone,
}

impl FromStr for RecordSort {
    type Err = PhonedeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "id" => Ok(RecordSort::Id),
            "name" => Ok(RecordSort::Name),
            "phone" => Ok(RecordSort::Phone),
            _ => Err(PhonedeskError::Other(format!(
                "invalid sort key '{s}', expected one of: id, name, phone"
            ))),
        }
    }
}

/// User ordering for list views
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UserSort {
    /// Most searches first
    #[default]
    Searches,
    Name,
    Id,
}

impl FromStr for UserSort {
    type Err = PhonedeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "searches" => Ok(UserSort::Searches),
            "name" => Ok(UserSort::Name),
            "id" => Ok(UserSort::Id),
            _ => Err(PhonedeskError::Other(format!(
                "invalid sort key '{s}', expected one of: searches, name, id"
            ))),
        }
    }
}

pub fn sort_records(records: &mut [PhoneRecord], key: RecordSort) {
    match key {
        RecordSort::Id => records.sort_by_key(|r| Reverse(r.id)),
        RecordSort::Name => records.sort_by_cached_key(|r| (r.name.to_lowercase(), r.id)),
        RecordSort::Phone => records.sort_by(|a, b| a.phone.cmp(&b.phone).then(a.id.cmp(&b.id))),
    }
}

pub fn sort_users(users: &mut [BotUser], key: UserSort) {
    match key {
        UserSort::Searches => users.sort_by_key(|u| (Reverse(u.search_count), u.id)),
        UserSort::Name => users.sort_by_cached_key(|u| (u.display_name().to_lowercase(), u.id)),
        UserSort::Id => users.sort_by_key(|u| u.id),
    }
}

/// Live projection over one authoritative list.
pub struct ProjectionView<T> {
    rx: watch::Receiver<Snapshot<T>>,
}

impl<T: Tally> ProjectionView<T> {
    pub fn new(rx: watch::Receiver<Snapshot<T>>) -> Self {
        Self { rx }
    }

    /// Counts for the snapshot currently held by the list.
    pub fn counts(&self) -> T::Counts {
        T::tally(&self.rx.borrow().items)
    }

    pub fn snapshot(&self) -> Snapshot<T> {
        self.rx.borrow().clone()
    }

    /// Wait for the list to change and return the recomputed counts.
    ///
    /// Returns `None` once the list has been torn down.
    pub async fn changed(&mut self) -> Option<T::Counts> {
        self.rx.changed().await.ok()?;
        Some(T::tally(&self.rx.borrow_and_update().items))
    }
}
