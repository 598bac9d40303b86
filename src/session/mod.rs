//! View session: the record synchronization core
//!
//! A `Session` owns everything one admin view needs while it is open: the
//! record and user lists, a debounced search controller for each, and the
//! mutation coordinator. All of it is discarded on `shutdown`.

pub mod attributes;
pub mod form;
pub mod list;
pub mod mutation;
pub mod notice;
pub mod projection;
pub mod search;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::remote::{RecordStore, SearchTerm, StoreResult};
use crate::types::{BotUser, PhoneRecord, Statistics};

pub use attributes::{AttributeField, AttributeList};
pub use form::{FormMode, RecordForm};
pub use list::{AuthoritativeList, Snapshot};
pub use mutation::{DeleteTarget, MutationCoordinator, MutationPhase, SubmitOutcome};
pub use notice::{Notice, NoticeLevel, Notifier};
pub use projection::{ProjectionView, RecordCounts, UserCounts};
pub use search::{DebouncedSearch, SearchField};

/// The single load path shared by search, start-up and post-mutation reloads.
pub struct Loader<S> {
    store: Arc<S>,
    records: Arc<AuthoritativeList<PhoneRecord>>,
    users: Arc<AuthoritativeList<BotUser>>,
    notifier: Notifier,
}

impl<S> Clone for Loader<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            records: Arc::clone(&self.records),
            users: Arc::clone(&self.users),
            notifier: self.notifier.clone(),
        }
    }
}

impl<S: RecordStore> Loader<S> {
    pub fn new(store: Arc<S>, notifier: Notifier) -> Self {
        Self {
            store,
            records: Arc::new(AuthoritativeList::new()),
            users: Arc::new(AuthoritativeList::new()),
            notifier,
        }
    }

    pub fn store(&self) -> Arc<S> {
        Arc::clone(&self.store)
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn records(&self) -> &AuthoritativeList<PhoneRecord> {
        &self.records
    }

    pub fn users(&self) -> &AuthoritativeList<BotUser> {
        &self.users
    }

    /// Fetch records for `term` and replace the list if no newer fetch has
    /// landed meanwhile. Failures are also reported as an error notice.
    pub async fn load_records(&self, term: SearchTerm) -> StoreResult<bool> {
        let seq = self.records.begin();
        tracing::debug!("loading records for {term} (seq {seq})");
        match self.store.list(&term).await {
            Ok(items) => Ok(self.records.apply(seq, term, items)),
            Err(e) => {
                self.notifier.send(Notice::error(e.to_string()));
                Err(e)
            }
        }
    }

    pub async fn load_users(&self, term: SearchTerm) -> StoreResult<bool> {
        let seq = self.users.begin();
        tracing::debug!("loading users for {term} (seq {seq})");
        match self.store.list_users(&term).await {
            Ok(items) => Ok(self.users.apply(seq, term, items)),
            Err(e) => {
                self.notifier.send(Notice::error(e.to_string()));
                Err(e)
            }
        }
    }
}

/// One open admin view.
pub struct Session<S> {
    loader: Loader<S>,
    record_search: DebouncedSearch,
    user_search: DebouncedSearch,
    coordinator: Arc<MutationCoordinator<S>>,
}

impl<S: RecordStore + 'static> Session<S> {
    pub fn new(store: Arc<S>, debounce: Duration, notifier: Notifier) -> Self {
        let loader = Loader::new(store, notifier);
        let record_search = DebouncedSearch::new(debounce);
        let user_search = DebouncedSearch::new(debounce);
        let coordinator = Arc::new(MutationCoordinator::new(
            loader.clone(),
            record_search.field().clone(),
            user_search.field().clone(),
        ));
        Self {
            loader,
            record_search,
            user_search,
            coordinator,
        }
    }

    /// Load the unfiltered record and user lists.
    ///
    /// Both loads run concurrently; a failure of either is returned after
    /// both have finished.
    pub async fn start(&self) -> StoreResult<()> {
        tracing::debug!("starting session");
        let (records, users) = tokio::join!(
            self.loader.load_records(SearchTerm::all()),
            self.loader.load_users(SearchTerm::all()),
        );
        records?;
        users?;
        Ok(())
    }

    pub async fn load_records(&self, term: SearchTerm) -> StoreResult<bool> {
        self.loader.load_records(term).await
    }

    pub async fn load_users(&self, term: SearchTerm) -> StoreResult<bool> {
        self.loader.load_users(term).await
    }

    /// Feed the record search box. The fetch happens once typing pauses.
    pub fn search_records(&self, text: impl Into<String>) {
        let loader = self.loader.clone();
        self.record_search.input(text, move |term| async move {
            let _ = loader.load_records(term).await;
        });
    }

    pub fn search_users(&self, text: impl Into<String>) {
        let loader = self.loader.clone();
        self.user_search.input(text, move |term| async move {
            let _ = loader.load_users(term).await;
        });
    }

    pub async fn statistics(&self) -> StoreResult<Statistics> {
        let result = self.loader.store.statistics().await;
        if let Err(e) = &result {
            self.loader.notifier.send(Notice::error(e.to_string()));
        }
        result
    }

    pub fn coordinator(&self) -> &MutationCoordinator<S> {
        &self.coordinator
    }

    /// Shared handle to the coordinator for submissions run on another task.
    pub fn coordinator_handle(&self) -> Arc<MutationCoordinator<S>> {
        Arc::clone(&self.coordinator)
    }

    pub fn records(&self) -> Snapshot<PhoneRecord> {
        self.loader.records.snapshot()
    }

    pub fn users(&self) -> Snapshot<BotUser> {
        self.loader.users.snapshot()
    }

    pub fn watch_records(&self) -> watch::Receiver<Snapshot<PhoneRecord>> {
        self.loader.records.subscribe()
    }

    pub fn watch_users(&self) -> watch::Receiver<Snapshot<BotUser>> {
        self.loader.users.subscribe()
    }

    pub fn record_view(&self) -> ProjectionView<PhoneRecord> {
        ProjectionView::new(self.watch_records())
    }

    pub fn user_view(&self) -> ProjectionView<BotUser> {
        ProjectionView::new(self.watch_users())
    }

    pub fn record_search_term(&self) -> SearchTerm {
        self.record_search.current_term()
    }

    pub fn user_search_term(&self) -> SearchTerm {
        self.user_search.current_term()
    }

    /// Cancel pending search timers. Requests already sent still complete
    /// but nothing new is issued.
    pub fn shutdown(&self) {
        tracing::debug!("shutting down session");
        self.record_search.cancel();
        self.user_search.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::testing::{Call, MemoryStore, record, user};
    use crate::types::{RecordStatus, UserStatus};
    use reqwest::StatusCode;
    use tokio::sync::mpsc;

    const WINDOW: Duration = Duration::from_millis(500);

    fn seeded_store() -> MemoryStore {
        let store = MemoryStore::with_records(vec![
            record(1, "+7 999 111", "Anna", RecordStatus::Active),
            record(2, "+7 999 222", "Boris", RecordStatus::Inactive),
            record(3, "+7 912 333", "Annet", RecordStatus::Active),
        ]);
        store.set_users(vec![
            user(1, "ivan", 4, UserStatus::Active),
            user(2, "petr", 0, UserStatus::Blocked),
        ]);
        store
    }

    fn session(
        store: MemoryStore,
    ) -> (
        Arc<MemoryStore>,
        Session<MemoryStore>,
        mpsc::UnboundedReceiver<Notice>,
    ) {
        let store = Arc::new(store);
        let (notifier, notices) = Notifier::channel();
        let session = Session::new(Arc::clone(&store), WINDOW, notifier);
        (store, session, notices)
    }

    #[tokio::test]
    async fn test_start_loads_everything_unfiltered() {
        let (store, session, _notices) = session(seeded_store());
        session.start().await.unwrap();

        assert_eq!(session.records().len(), 3);
        assert_eq!(session.users().len(), 2);
        assert!(session.records().term.is_all());
        assert!(store.calls().contains(&Call::List(SearchTerm::all())));
        assert!(store.calls().contains(&Call::ListUsers(SearchTerm::all())));
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_burst_issues_one_fetch() {
        let (store, session, _notices) = session(seeded_store());
        session.start().await.unwrap();

        for text in ["a", "an", "ann"] {
            session.search_records(text);
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        tokio::time::sleep(WINDOW).await;

        assert_eq!(
            store.list_calls(),
            vec![SearchTerm::all(), SearchTerm::new("ann")]
        );
        let snapshot = session.records();
        assert_eq!(snapshot.term, SearchTerm::new("ann"));
        assert_eq!(
            snapshot.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![1, 3]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_clearing_search_reloads_full_list() {
        let (store, session, _notices) = session(seeded_store());
        session.search_records("boris");
        tokio::time::sleep(WINDOW * 2).await;
        assert_eq!(session.records().len(), 1);

        session.search_records("");
        tokio::time::sleep(WINDOW * 2).await;

        assert_eq!(store.list_calls().last(), Some(&SearchTerm::all()));
        assert_eq!(session.records().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_older_response_is_discarded() {
        let (store, session, _notices) = session(seeded_store());
        store.delay_list(SearchTerm::new("a"), Duration::from_secs(3));

        session.search_records("a");
        tokio::time::sleep(WINDOW + Duration::from_millis(100)).await;
        session.search_records("ann");
        tokio::time::sleep(WINDOW + Duration::from_millis(100)).await;
        assert_eq!(session.records().term, SearchTerm::new("ann"));

        // The "a" response lands now and must not replace "ann"
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(
            store.list_calls(),
            vec![SearchTerm::new("a"), SearchTerm::new("ann")]
        );
        let snapshot = session.records();
        assert_eq!(snapshot.term, SearchTerm::new("ann"));
        assert_eq!(snapshot.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_pending_search() {
        let (store, session, _notices) = session(seeded_store());
        session.search_records("anna");
        session.search_users("ivan");
        session.shutdown();

        tokio::time::sleep(WINDOW * 4).await;
        assert!(store.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_user_search() {
        let (store, session, _notices) = session(seeded_store());
        session.search_users("PETR");
        tokio::time::sleep(WINDOW * 2).await;

        assert_eq!(store.calls(), vec![Call::ListUsers(SearchTerm::new("PETR"))]);
        assert_eq!(session.users().items[0].id, 2);
        assert_eq!(session.user_search_term(), SearchTerm::new("PETR"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_mutation_reload_follows_typed_search() {
        let (store, session, _notices) = session(seeded_store());
        session.start().await.unwrap();
        session.search_records("ann");
        tokio::time::sleep(WINDOW * 2).await;

        let mut form = RecordForm::create();
        form.phone = "+7 900 000".to_string();
        form.name = "Anneta".to_string();
        session.coordinator().submit_create(&form).await.unwrap();

        assert_eq!(store.list_calls().last(), Some(&SearchTerm::new("ann")));
        assert_eq!(session.records().len(), 3);
    }

    #[tokio::test]
    async fn test_projection_follows_reloads() {
        let (_store, session, _notices) = session(seeded_store());
        let mut view = session.record_view();
        session.start().await.unwrap();
        assert_eq!(view.changed().await.unwrap().active, 2);

        let target = DeleteTarget::from(&session.records().items[0]);
        session.coordinator().submit_delete(target).await.unwrap();

        let counts = view.changed().await.unwrap();
        assert_eq!(counts.total, 2);
        assert_eq!(view.counts(), counts);
    }

    #[tokio::test]
    async fn test_load_failure_becomes_notice() {
        let (store, session, mut notices) = session(seeded_store());
        store.fail_lists(Some(StatusCode::SERVICE_UNAVAILABLE));

        let err = session.start().await.unwrap_err();
        assert_eq!(err.status, Some(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!session.records().is_loaded());

        let first = notices.try_recv().unwrap();
        assert_eq!(first.level, NoticeLevel::Error);
        assert_eq!(notices.try_recv().unwrap().level, NoticeLevel::Error);
    }

    #[tokio::test]
    async fn test_statistics() {
        let (_store, session, _notices) = session(seeded_store());
        let stats = session.statistics().await.unwrap();
        assert_eq!(stats.database_records, 3);
        assert_eq!(stats.total_users, 2);
        assert_eq!(stats.total_searches, 4);
    }
}
