//! Create, update and delete orchestration
//!
//! Every submission follows the same path:
//! `Idle -> Validating -> Submitting -> Reloading -> Idle`, or back to `Idle`
//! straight from a failed step. The record dialog and the user status
//! control are separate forms: each runs one submission at a time, and a
//! second one on the same form while the first is in flight is ignored.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;

use crate::error::{PhonedeskError, Result};
use crate::remote::{RecordStore, TransportError, UserStatusChange};
use crate::types::{BotUser, PhoneRecord, UserStatus};

use super::Loader;
use super::form::RecordForm;
use super::notice::Notice;
use super::search::SearchField;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MutationPhase {
    #[default]
    Idle,
    Validating,
    Submitting,
    Reloading,
}

/// Result of a submission that was not rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome<T> {
    Done(T),
    /// Another submission was already in flight; nothing was sent.
    Busy,
}

impl<T> SubmitOutcome<T> {
    pub fn is_busy(&self) -> bool {
        matches!(self, SubmitOutcome::Busy)
    }

    pub fn done(self) -> Option<T> {
        match self {
            SubmitOutcome::Done(value) => Some(value),
            SubmitOutcome::Busy => None,
        }
    }
}

/// Record chosen for deletion, captured when the action is invoked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteTarget {
    pub id: i64,
    pub label: String,
}

impl DeleteTarget {
    pub fn new(id: i64, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
        }
    }
}

impl From<&PhoneRecord> for DeleteTarget {
    fn from(record: &PhoneRecord) -> Self {
        Self::new(record.id, format!("{} ({})", record.name, record.phone))
    }
}

/// Saving flag and observable phase of one logical form.
struct FormSlot {
    saving: AtomicBool,
    phase: watch::Sender<MutationPhase>,
}

impl FormSlot {
    fn new() -> Self {
        let (phase, _) = watch::channel(MutationPhase::Idle);
        Self {
            saving: AtomicBool::new(false),
            phase,
        }
    }

    fn try_begin(&self) -> Option<SavingGuard<'_>> {
        if self
            .saving
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("submission ignored, another one is in flight");
            return None;
        }
        Some(SavingGuard { slot: self })
    }

    fn enter(&self, phase: MutationPhase) {
        self.phase.send_replace(phase);
    }

    fn is_saving(&self) -> bool {
        self.saving.load(Ordering::Acquire)
    }
}

/// Resets the saving flag and phase on every exit path.
struct SavingGuard<'a> {
    slot: &'a FormSlot,
}

impl Drop for SavingGuard<'_> {
    fn drop(&mut self) {
        self.slot.phase.send_replace(MutationPhase::Idle);
        self.slot.saving.store(false, Ordering::Release);
    }
}

pub struct MutationCoordinator<S> {
    store: Arc<S>,
    loader: Loader<S>,
    record_search: SearchField,
    user_search: SearchField,
    record_form: FormSlot,
    user_form: FormSlot,
}

impl<S: RecordStore> MutationCoordinator<S> {
    /// Create a coordinator that reloads through `loader`, using whatever
    /// the search fields hold at reload time.
    pub fn new(loader: Loader<S>, record_search: SearchField, user_search: SearchField) -> Self {
        Self {
            store: loader.store(),
            loader,
            record_search,
            user_search,
            record_form: FormSlot::new(),
            user_form: FormSlot::new(),
        }
    }

    /// Phase of the record dialog (create, update, delete).
    pub fn phase(&self) -> MutationPhase {
        *self.record_form.phase.borrow()
    }

    pub fn watch_phase(&self) -> watch::Receiver<MutationPhase> {
        self.record_form.phase.subscribe()
    }

    pub fn is_saving(&self) -> bool {
        self.record_form.is_saving()
    }

    /// Phase of the user status control.
    pub fn user_phase(&self) -> MutationPhase {
        *self.user_form.phase.borrow()
    }

    pub fn watch_user_phase(&self) -> watch::Receiver<MutationPhase> {
        self.user_form.phase.subscribe()
    }

    pub fn is_saving_user(&self) -> bool {
        self.user_form.is_saving()
    }

    pub async fn submit_create(&self, form: &RecordForm) -> Result<SubmitOutcome<PhoneRecord>> {
        let Some(_guard) = self.record_form.try_begin() else {
            return Ok(SubmitOutcome::Busy);
        };

        self.record_form.enter(MutationPhase::Validating);
        let payload = form.new_record().map_err(|e| self.rejected(e))?;

        self.record_form.enter(MutationPhase::Submitting);
        let created = self
            .store
            .create(&payload)
            .await
            .map_err(|e| self.failed(e))?;
        tracing::info!("created record #{}", created.id);
        self.notify(Notice::info(format!("Record #{} added", created.id)));

        self.reload_records().await;
        Ok(SubmitOutcome::Done(created))
    }

    pub async fn submit_update(&self, form: &RecordForm) -> Result<SubmitOutcome<PhoneRecord>> {
        let Some(_guard) = self.record_form.try_begin() else {
            return Ok(SubmitOutcome::Busy);
        };

        self.record_form.enter(MutationPhase::Validating);
        let payload = form.record_update().map_err(|e| self.rejected(e))?;

        self.record_form.enter(MutationPhase::Submitting);
        let updated = self
            .store
            .update(&payload)
            .await
            .map_err(|e| self.failed(e))?;
        tracing::info!("updated record #{}", updated.id);
        self.notify(Notice::info(format!("Record #{} updated", updated.id)));

        self.reload_records().await;
        Ok(SubmitOutcome::Done(updated))
    }

    pub async fn submit_delete(&self, target: DeleteTarget) -> Result<SubmitOutcome<()>> {
        let Some(_guard) = self.record_form.try_begin() else {
            return Ok(SubmitOutcome::Busy);
        };

        self.record_form.enter(MutationPhase::Submitting);
        self.store
            .delete(target.id)
            .await
            .map_err(|e| self.failed(e))?;
        tracing::info!("deleted record #{}", target.id);
        self.notify(Notice::info(format!("Deleted {}", target.label)));

        self.reload_records().await;
        Ok(SubmitOutcome::Done(()))
    }

    pub async fn submit_user_status(
        &self,
        id: i64,
        status: UserStatus,
    ) -> Result<SubmitOutcome<BotUser>> {
        let Some(_guard) = self.user_form.try_begin() else {
            return Ok(SubmitOutcome::Busy);
        };

        self.user_form.enter(MutationPhase::Submitting);
        let user = self
            .store
            .set_user_status(UserStatusChange { id, status })
            .await
            .map_err(|e| self.failed(e))?;
        tracing::info!("user #{id} is now {status}");
        self.notify(Notice::info(format!(
            "{} is now {status}",
            user.display_name()
        )));

        self.user_form.enter(MutationPhase::Reloading);
        let _ = self.loader.load_users(self.user_search.term()).await;
        Ok(SubmitOutcome::Done(user))
    }

    fn notify(&self, notice: Notice) {
        self.loader.notifier().send(notice);
    }

    fn rejected(&self, err: PhonedeskError) -> PhonedeskError {
        self.notify(Notice::warning(err.to_string()));
        err
    }

    fn failed(&self, err: TransportError) -> PhonedeskError {
        self.notify(Notice::error(err.to_string()));
        PhonedeskError::Transport(err)
    }

    /// Reload failures are reported by the loader and do not fail the
    /// mutation that triggered them.
    async fn reload_records(&self) {
        self.record_form.enter(MutationPhase::Reloading);
        let _ = self.loader.load_records(self.record_search.term()).await;
    }
}
