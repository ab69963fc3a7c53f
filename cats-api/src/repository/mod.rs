//! Persistence ports and their Postgres implementations.
//!
//! Every repository operation runs against a transaction handle supplied by
//! the caller. Repositories never begin, commit or roll back; that belongs to
//! [`Store::transaction`] and [`Store::read_only`], which the services drive.

use uuid::Uuid;

use cats_shared::errors::{AppError, AppResult};

use crate::cat_filter::CatFilter;
use crate::models::{
    Cat, CatChanges, CatMatch, MatchRecord, MatchStatus, NewCat, NewCatMatch, NewUser, User,
};

mod cat;
mod cat_match;
#[cfg(test)]
pub mod memory;
mod pg;
mod user;

pub use cat::PgCatRepository;
pub use cat_match::PgCatMatchRepository;
pub use pg::PgStore;
pub use user::PgUserRepository;

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("connection unavailable: {0}")]
    Connection(String),

    #[error("query failed: {0}")]
    Query(diesel::result::Error),

    #[error("unique constraint violated: {0}")]
    Conflict(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("corrupt row: {0}")]
    Corrupt(String),
}

impl From<diesel::result::Error> for RepoError {
    fn from(err: diesel::result::Error) -> Self {
        use diesel::result::{DatabaseErrorKind, Error};

        match err {
            Error::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                RepoError::Conflict(info.message().to_string())
            }
            other => RepoError::Query(other),
        }
    }
}

/// Repository failures never reach the client verbatim; the cause is logged
/// and a generic message is returned.
impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(entity) => AppError::not_found(format!("{entity} is not found")),
            RepoError::Conflict(detail) => {
                tracing::warn!(detail = %detail, "unique constraint violated");
                AppError::conflict("resource already exists")
            }
            other => {
                tracing::error!(error = %other, "repository failure");
                AppError::internal("something went wrong")
            }
        }
    }
}

pub type RepoResult<T> = Result<T, RepoError>;

pub trait UserRepository: Send + Sync {
    type Tx;

    fn create_user(&self, tx: &mut Self::Tx, user: &NewUser) -> RepoResult<User>;
    fn find_by_email(&self, tx: &mut Self::Tx, email: &str) -> RepoResult<Option<User>>;
    fn email_exists(&self, tx: &mut Self::Tx, email: &str) -> RepoResult<bool>;
}

pub trait CatRepository: Send + Sync {
    type Tx;

    fn create_cat(&self, tx: &mut Self::Tx, cat: &NewCat) -> RepoResult<Cat>;
    /// Non-deleted cats matching `filter`, newest first.
    fn list_cats(&self, tx: &mut Self::Tx, filter: &CatFilter, requester: Uuid) -> RepoResult<Vec<Cat>>;
    /// The cat if it exists, is not deleted and belongs to `owner`.
    fn find_owned_cat(&self, tx: &mut Self::Tx, cat_id: Uuid, owner: Uuid) -> RepoResult<Option<Cat>>;
    fn update_cat(&self, tx: &mut Self::Tx, cat_id: Uuid, changes: &CatChanges) -> RepoResult<Cat>;
    fn soft_delete_cat(&self, tx: &mut Self::Tx, cat_id: Uuid) -> RepoResult<()>;
    /// Whether the cat appears in any match request, on either side.
    fn has_any_match(&self, tx: &mut Self::Tx, cat_id: Uuid) -> RepoResult<bool>;

    /// Takes row locks on the given cats until the transaction ends.
    fn lock_cats(&self, tx: &mut Self::Tx, cat_ids: &[Uuid]) -> RepoResult<()>;
    fn is_cat_owner(&self, tx: &mut Self::Tx, cat_id: Uuid, user_id: Uuid) -> RepoResult<bool>;
    fn both_cats_exist(&self, tx: &mut Self::Tx, first: Uuid, second: Uuid) -> RepoResult<bool>;
    fn has_same_sex(&self, tx: &mut Self::Tx, first: Uuid, second: Uuid) -> RepoResult<bool>;
    fn from_same_owner(&self, tx: &mut Self::Tx, first: Uuid, second: Uuid) -> RepoResult<bool>;
    /// True when either cat has already completed a match.
    fn has_matched(&self, tx: &mut Self::Tx, first: Uuid, second: Uuid) -> RepoResult<bool>;
    fn mark_matched(&self, tx: &mut Self::Tx, cat_ids: &[Uuid]) -> RepoResult<()>;
}

pub trait CatMatchRepository: Send + Sync {
    type Tx;

    fn create_match(&self, tx: &mut Self::Tx, cat_match: &NewCatMatch) -> RepoResult<CatMatch>;
    /// Matches issued by the user or addressed to one of the user's cats,
    /// newest first.
    fn matches_for_participant(&self, tx: &mut Self::Tx, user_id: Uuid) -> RepoResult<Vec<MatchRecord>>;
    /// Reads the match without locking it.
    fn find_match(&self, tx: &mut Self::Tx, match_id: Uuid) -> RepoResult<Option<CatMatch>>;
    fn find_match_record(&self, tx: &mut Self::Tx, match_id: Uuid) -> RepoResult<Option<MatchRecord>>;
    /// Loads the match and locks its row until the transaction ends. Callers
    /// that also lock cats must take the cat locks first.
    fn lock_match(&self, tx: &mut Self::Tx, match_id: Uuid) -> RepoResult<Option<CatMatch>>;
    fn can_user_delete_match(&self, tx: &mut Self::Tx, match_id: Uuid, user_id: Uuid) -> RepoResult<bool>;
    fn can_user_respond_match(&self, tx: &mut Self::Tx, match_id: Uuid, user_id: Uuid) -> RepoResult<bool>;
    fn match_status(&self, tx: &mut Self::Tx, match_id: Uuid) -> RepoResult<MatchStatus>;
    fn delete_match(&self, tx: &mut Self::Tx, match_id: Uuid) -> RepoResult<()>;
    fn update_match_status(&self, tx: &mut Self::Tx, match_id: Uuid, status: MatchStatus) -> RepoResult<()>;
    /// Rejects every waiting match that references one of `cat_ids`, except
    /// `keep`. Returns the number of rejected matches.
    fn reject_waiting_matches_for_cats(
        &self,
        tx: &mut Self::Tx,
        cat_ids: &[Uuid],
        keep: Option<Uuid>,
    ) -> RepoResult<usize>;
}

/// A transactional backend bundling the three repositories over one
/// transaction handle type.
pub trait Store: Send + Sync + 'static {
    type Tx;
    type Users: UserRepository<Tx = Self::Tx>;
    type Cats: CatRepository<Tx = Self::Tx>;
    type Matches: CatMatchRepository<Tx = Self::Tx>;

    fn users(&self) -> &Self::Users;
    fn cats(&self) -> &Self::Cats;
    fn matches(&self) -> &Self::Matches;

    /// Runs `f` in a transaction that commits on `Ok` and rolls back on `Err`.
    fn transaction<T, F>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&mut Self::Tx) -> AppResult<T>;

    /// Runs `f` in a transaction that is always rolled back.
    fn read_only<T, F>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&mut Self::Tx) -> AppResult<T>;

    /// Connectivity check for the health endpoint.
    fn ping(&self) -> AppResult<()>;
}

pub(crate) fn parse_status(raw: &str) -> RepoResult<MatchStatus> {
    raw.parse().map_err(RepoError::Corrupt)
}
