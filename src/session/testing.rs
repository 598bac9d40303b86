//! In-memory record store for session tests

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use reqwest::StatusCode;
use tokio::sync::watch;

use crate::remote::{
    NewRecord, RecordStore, RecordUpdate, SearchTerm, StoreResult, TransportError,
    UserStatusChange,
};
use crate::types::{BotUser, PhoneRecord, RecordStatus, Statistics, UserStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Statistics,
    List(SearchTerm),
    Create(NewRecord),
    Update(RecordUpdate),
    Delete(i64),
    ListUsers(SearchTerm),
    SetUserStatus(UserStatusChange),
}

#[derive(Debug, Default)]
struct State {
    records: Vec<PhoneRecord>,
    users: Vec<BotUser>,
    next_id: i64,
}

#[derive(Debug)]
pub(crate) struct MemoryStore {
    state: Mutex<State>,
    calls: Mutex<Vec<Call>>,
    list_delays: Mutex<HashMap<SearchTerm, Duration>>,
    mutation_failure: Mutex<Option<StatusCode>>,
    list_failure: Mutex<Option<StatusCode>>,
    gate: watch::Sender<bool>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn record(id: i64, phone: &str, name: &str, status: RecordStatus) -> PhoneRecord {
    PhoneRecord {
        id,
        phone: phone.to_string(),
        name: name.to_string(),
        info: String::new(),
        additional_info: Vec::new(),
        status,
        created_at: None,
    }
}

pub(crate) fn user(id: i64, username: &str, searches: u64, status: UserStatus) -> BotUser {
    BotUser {
        id,
        telegram_id: 1000 + id,
        username: Some(username.to_string()),
        first_name: None,
        last_name: None,
        search_count: searches,
        status,
        joined: None,
        last_active: None,
    }
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        let (gate, _) = watch::channel(true);
        Self {
            state: Mutex::new(State {
                next_id: 1,
                ..State::default()
            }),
            calls: Mutex::new(Vec::new()),
            list_delays: Mutex::new(HashMap::new()),
            mutation_failure: Mutex::new(None),
            list_failure: Mutex::new(None),
            gate,
        }
    }

    pub(crate) fn with_records(records: Vec<PhoneRecord>) -> Self {
        let store = Self::new();
        {
            let mut state = store.state.lock();
            state.next_id = records.iter().map(|r| r.id).max().unwrap_or(0) + 1;
            state.records = records;
        }
        store
    }

    pub(crate) fn set_users(&self, users: Vec<BotUser>) {
        self.state.lock().users = users;
    }

    pub(crate) fn records(&self) -> Vec<PhoneRecord> {
        self.state.lock().records.clone()
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub(crate) fn list_calls(&self) -> Vec<SearchTerm> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                Call::List(term) => Some(term.clone()),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn mutation_count(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| {
                matches!(
                    call,
                    Call::Create(_) | Call::Update(_) | Call::Delete(_) | Call::SetUserStatus(_)
                )
            })
            .count()
    }

    /// Delay list responses for a given term.
    pub(crate) fn delay_list(&self, term: SearchTerm, delay: Duration) {
        self.list_delays.lock().insert(term, delay);
    }

    pub(crate) fn fail_mutations(&self, status: Option<StatusCode>) {
        *self.mutation_failure.lock() = status;
    }

    pub(crate) fn fail_lists(&self, status: Option<StatusCode>) {
        *self.list_failure.lock() = status;
    }

    /// Hold mutations until the gate is reopened.
    pub(crate) fn close_gate(&self) {
        self.gate.send_replace(false);
    }

    pub(crate) fn open_gate(&self) {
        self.gate.send_replace(true);
    }

    fn record_call(&self, call: Call) {
        self.calls.lock().push(call);
    }

    async fn pass_gate(&self, operation: &'static str) -> StoreResult<()> {
        let mut rx = self.gate.subscribe();
        let _ = rx.wait_for(|open| *open).await;
        match *self.mutation_failure.lock() {
            Some(status) => Err(TransportError::with_status(operation, status)),
            None => Ok(()),
        }
    }

    async fn list_delay(&self, operation: &'static str, term: &SearchTerm) -> StoreResult<()> {
        let delay = self.list_delays.lock().get(term).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match *self.list_failure.lock() {
            Some(status) => Err(TransportError::with_status(operation, status)),
            None => Ok(()),
        }
    }
}

fn matches_record(record: &PhoneRecord, term: &SearchTerm) -> bool {
    match term.as_query() {
        None => true,
        Some(q) => {
            record.phone.contains(q) || record.name.to_lowercase().contains(&q.to_lowercase())
        }
    }
}

fn matches_user(user: &BotUser, term: &SearchTerm) -> bool {
    match term.as_query() {
        None => true,
        Some(q) => {
            let q = q.to_lowercase();
            user.display_name().to_lowercase().contains(&q)
                || user.telegram_id.to_string().contains(&q)
        }
    }
}

impl RecordStore for MemoryStore {
    async fn statistics(&self) -> StoreResult<Statistics> {
        self.record_call(Call::Statistics);
        let state = self.state.lock();
        Ok(Statistics {
            total_users: state.users.len() as u64,
            total_searches: state.users.iter().map(|u| u.search_count).sum(),
            database_records: state.records.len() as u64,
            active_today: 0,
        })
    }

    async fn list(&self, search: &SearchTerm) -> StoreResult<Vec<PhoneRecord>> {
        self.record_call(Call::List(search.clone()));
        self.list_delay("fetch phone records", search).await?;
        let state = self.state.lock();
        Ok(state
            .records
            .iter()
            .filter(|r| matches_record(r, search))
            .cloned()
            .collect())
    }

    async fn create(&self, record: &NewRecord) -> StoreResult<PhoneRecord> {
        self.record_call(Call::Create(record.clone()));
        self.pass_gate("add phone record").await?;
        let mut state = self.state.lock();
        let created = PhoneRecord {
            id: state.next_id,
            phone: record.phone.clone(),
            name: record.name.clone(),
            info: record.info.clone(),
            additional_info: record.additional_info.clone(),
            status: RecordStatus::Active,
            created_at: None,
        };
        state.next_id += 1;
        state.records.push(created.clone());
        Ok(created)
    }

    async fn update(&self, update: &RecordUpdate) -> StoreResult<PhoneRecord> {
        self.record_call(Call::Update(update.clone()));
        self.pass_gate("update phone record").await?;
        let mut state = self.state.lock();
        let record = state
            .records
            .iter_mut()
            .find(|r| r.id == update.id)
            .ok_or_else(|| TransportError::missing_entity("update phone record"))?;
        record.phone = update.phone.clone();
        record.name = update.name.clone();
        record.info = update.info.clone();
        record.status = update.status;
        record.additional_info = update.additional_info.clone();
        Ok(record.clone())
    }

    async fn delete(&self, id: i64) -> StoreResult<()> {
        self.record_call(Call::Delete(id));
        self.pass_gate("delete phone record").await?;
        let mut state = self.state.lock();
        let before = state.records.len();
        state.records.retain(|r| r.id != id);
        if state.records.len() == before {
            return Err(TransportError::with_status(
                "delete phone record",
                StatusCode::NOT_FOUND,
            ));
        }
        Ok(())
    }

    async fn list_users(&self, search: &SearchTerm) -> StoreResult<Vec<BotUser>> {
        self.record_call(Call::ListUsers(search.clone()));
        self.list_delay("fetch users", search).await?;
        let state = self.state.lock();
        Ok(state
            .users
            .iter()
            .filter(|u| matches_user(u, search))
            .cloned()
            .collect())
    }

    async fn set_user_status(&self, change: UserStatusChange) -> StoreResult<BotUser> {
        self.record_call(Call::SetUserStatus(change));
        self.pass_gate("update user status").await?;
        let mut state = self.state.lock();
        let user = state
            .users
            .iter_mut()
            .find(|u| u.id == change.id)
            .ok_or_else(|| TransportError::missing_entity("update user status"))?;
        user.status = change.status;
        Ok(user.clone())
    }
}
