pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod remote;
pub mod session;
pub mod types;

pub use config::Config;
pub use error::{PhonedeskError, Result};
pub use remote::{
    HttpRecordStore, NewRecord, RecordStore, RecordUpdate, SearchTerm, StoreResult,
    TransportError, UserStatusChange,
};
pub use session::{
    AttributeField, AttributeList, DeleteTarget, FormMode, MutationCoordinator, MutationPhase,
    Notice, NoticeLevel, Notifier, RecordForm, Session, SubmitOutcome,
};
pub use types::{
    AttributeEntry, BotUser, PhoneRecord, RecordStatus, Statistics, UserStatus,
    VALID_RECORD_STATUSES, VALID_USER_STATUSES,
};
