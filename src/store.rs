use crate::models::{LocationRow, NewSignup, RecordField, SignupRecord};

/// Outcome of an insert that reached the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// The store's own uniqueness guard rejected the email.
    DuplicateEmail,
}

/// The hosted table the waitlist reads from and writes to.
///
/// Emails are compared case-insensitively; callers pass them lowercased.
#[allow(async_fn_in_trait)]
pub trait RecordStore {
    async fn insert(&self, signup: &NewSignup) -> anyhow::Result<InsertOutcome>;

    async fn exists_by_email(&self, email: &str) -> anyhow::Result<bool>;

    async fn count_all(&self) -> anyhow::Result<u64>;

    async fn count_where(&self, field: RecordField, value: &str) -> anyhow::Result<u64>;

    async fn select_locations(&self) -> anyhow::Result<Vec<LocationRow>>;

    async fn select_all(&self) -> anyhow::Result<Vec<SignupRecord>>;
}
