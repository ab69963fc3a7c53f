//! In-memory store used by the service and handler tests.
//!
//! A transaction works on a clone of the whole state and writes it back only
//! when the closure returns `Ok`, which gives the same all-or-nothing
//! visibility as a Postgres transaction. The mutex is held for the whole
//! transaction, so transactions are fully serialized.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use uuid::Uuid;

use cats_shared::errors::AppResult;

use crate::cat_filter::{AgeFilter, CatFilter};
use crate::models::{
    Cat, CatChanges, CatMatch, MatchRecord, MatchStatus, NewCat, NewCatMatch, NewUser, Race, Sex, User,
};

use super::{
    parse_status, CatMatchRepository, CatRepository, RepoError, RepoResult, Store, UserRepository,
};

/// A row lock taken through a repository, in acquisition order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockEvent {
    Cats(Vec<Uuid>),
    Match(Uuid),
}

#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    pub users: Vec<User>,
    pub cats: Vec<Cat>,
    pub matches: Vec<CatMatch>,
    fail_next_match_insert: Arc<AtomicBool>,
    lock_log: Arc<Mutex<Vec<LockEvent>>>,
}

impl MemoryState {
    fn cat(&self, id: Uuid) -> RepoResult<&Cat> {
        self.cats
            .iter()
            .find(|cat| cat.id == id)
            .ok_or(RepoError::NotFound("cat"))
    }

    fn cat_pair(&self, first: Uuid, second: Uuid) -> RepoResult<(&Cat, &Cat)> {
        Ok((self.cat(first)?, self.cat(second)?))
    }

    fn record(&self, cat_match: &CatMatch) -> RepoResult<MatchRecord> {
        let issuer = self
            .users
            .iter()
            .find(|user| user.id == cat_match.issued_by_id)
            .cloned()
            .ok_or_else(|| RepoError::Corrupt(format!("match {} has no issuer", cat_match.id)))?;

        Ok(MatchRecord {
            cat_match: cat_match.clone(),
            issuer,
            issuer_cat: self.cat(cat_match.issuer_cat_id)?.clone(),
            receiver_cat: self.cat(cat_match.receiver_cat_id)?.clone(),
        })
    }
}

pub struct MemoryUserRepository;
pub struct MemoryCatRepository;
pub struct MemoryCatMatchRepository;

impl UserRepository for MemoryUserRepository {
    type Tx = MemoryState;

    fn create_user(&self, tx: &mut MemoryState, user: &NewUser) -> RepoResult<User> {
        if tx.users.iter().any(|u| u.email == user.email) {
            return Err(RepoError::Conflict("users_email_key".into()));
        }
        let created = User {
            id: Uuid::new_v4(),
            email: user.email.clone(),
            name: user.name.clone(),
            password_hash: user.password_hash.clone(),
            created_at: Utc::now(),
        };
        tx.users.push(created.clone());
        Ok(created)
    }

    fn find_by_email(&self, tx: &mut MemoryState, email: &str) -> RepoResult<Option<User>> {
        Ok(tx.users.iter().find(|u| u.email == email).cloned())
    }

    fn email_exists(&self, tx: &mut MemoryState, email: &str) -> RepoResult<bool> {
        Ok(tx.users.iter().any(|u| u.email == email))
    }
}

impl CatRepository for MemoryCatRepository {
    type Tx = MemoryState;

    fn create_cat(&self, tx: &mut MemoryState, cat: &NewCat) -> RepoResult<Cat> {
        let created = Cat {
            id: Uuid::new_v4(),
            name: cat.name.clone(),
            race: cat.race.clone(),
            sex: cat.sex.clone(),
            age_in_month: cat.age_in_month,
            description: cat.description.clone(),
            image_urls: cat.image_urls.clone(),
            has_matched: false,
            owned_by_id: cat.owned_by_id,
            deleted: false,
            created_at: Utc::now(),
        };
        tx.cats.push(created.clone());
        Ok(created)
    }

    fn list_cats(&self, tx: &mut MemoryState, filter: &CatFilter, requester: Uuid) -> RepoResult<Vec<Cat>> {
        let search = filter.search.as_ref().map(|term| term.to_lowercase());

        let cats = tx
            .cats
            .iter()
            .rev()
            .filter(|cat| !cat.deleted)
            .filter(|cat| filter.id.map_or(true, |id| cat.id == id))
            .filter(|cat| filter.race.map_or(true, |race| cat.race == race.as_str()))
            .filter(|cat| filter.sex.map_or(true, |sex| cat.sex == sex.as_str()))
            .filter(|cat| filter.has_matched.map_or(true, |m| cat.has_matched == m))
            .filter(|cat| match filter.age {
                Some(AgeFilter::GreaterThan(n)) => cat.age_in_month > n,
                Some(AgeFilter::LessThan(n)) => cat.age_in_month < n,
                Some(AgeFilter::Equal(n)) => cat.age_in_month == n,
                None => true,
            })
            .filter(|cat| filter.owned.map_or(true, |owned| (cat.owned_by_id == requester) == owned))
            .filter(|cat| {
                search
                    .as_ref()
                    .map_or(true, |term| cat.name.to_lowercase().contains(term.as_str()))
            })
            .skip(filter.offset as usize)
            .take(filter.limit as usize)
            .cloned()
            .collect();
        Ok(cats)
    }

    fn find_owned_cat(&self, tx: &mut MemoryState, cat_id: Uuid, owner: Uuid) -> RepoResult<Option<Cat>> {
        Ok(tx
            .cats
            .iter()
            .find(|cat| cat.id == cat_id && cat.owned_by_id == owner && !cat.deleted)
            .cloned())
    }

    fn update_cat(&self, tx: &mut MemoryState, cat_id: Uuid, changes: &CatChanges) -> RepoResult<Cat> {
        let cat = tx
            .cats
            .iter_mut()
            .find(|cat| cat.id == cat_id)
            .ok_or(RepoError::NotFound("cat"))?;
        cat.name = changes.name.clone();
        cat.race = changes.race.clone();
        cat.sex = changes.sex.clone();
        cat.age_in_month = changes.age_in_month;
        cat.description = changes.description.clone();
        cat.image_urls = changes.image_urls.clone();
        Ok(cat.clone())
    }

    fn soft_delete_cat(&self, tx: &mut MemoryState, cat_id: Uuid) -> RepoResult<()> {
        if let Some(cat) = tx.cats.iter_mut().find(|cat| cat.id == cat_id) {
            cat.deleted = true;
        }
        Ok(())
    }

    fn has_any_match(&self, tx: &mut MemoryState, cat_id: Uuid) -> RepoResult<bool> {
        Ok(tx
            .matches
            .iter()
            .any(|m| m.issuer_cat_id == cat_id || m.receiver_cat_id == cat_id))
    }

    fn lock_cats(&self, tx: &mut MemoryState, cat_ids: &[Uuid]) -> RepoResult<()> {
        let mut ids = cat_ids.to_vec();
        ids.sort();
        tx.lock_log.lock().unwrap().push(LockEvent::Cats(ids));
        Ok(())
    }

    fn is_cat_owner(&self, tx: &mut MemoryState, cat_id: Uuid, user_id: Uuid) -> RepoResult<bool> {
        Ok(tx
            .cats
            .iter()
            .any(|cat| cat.id == cat_id && cat.owned_by_id == user_id && !cat.deleted))
    }

    fn both_cats_exist(&self, tx: &mut MemoryState, first: Uuid, second: Uuid) -> RepoResult<bool> {
        let live = |id: Uuid| tx.cats.iter().any(|cat| cat.id == id && !cat.deleted);
        Ok(first != second && live(first) && live(second))
    }

    fn has_same_sex(&self, tx: &mut MemoryState, first: Uuid, second: Uuid) -> RepoResult<bool> {
        let (a, b) = tx.cat_pair(first, second)?;
        Ok(a.sex == b.sex)
    }

    fn from_same_owner(&self, tx: &mut MemoryState, first: Uuid, second: Uuid) -> RepoResult<bool> {
        let (a, b) = tx.cat_pair(first, second)?;
        Ok(a.owned_by_id == b.owned_by_id)
    }

    fn has_matched(&self, tx: &mut MemoryState, first: Uuid, second: Uuid) -> RepoResult<bool> {
        let (a, b) = tx.cat_pair(first, second)?;
        Ok(a.has_matched || b.has_matched)
    }

    fn mark_matched(&self, tx: &mut MemoryState, cat_ids: &[Uuid]) -> RepoResult<()> {
        for cat in tx.cats.iter_mut().filter(|cat| cat_ids.contains(&cat.id)) {
            cat.has_matched = true;
        }
        Ok(())
    }
}

impl CatMatchRepository for MemoryCatMatchRepository {
    type Tx = MemoryState;

    fn create_match(&self, tx: &mut MemoryState, cat_match: &NewCatMatch) -> RepoResult<CatMatch> {
        if tx.fail_next_match_insert.swap(false, Ordering::SeqCst) {
            return Err(RepoError::Connection("injected insert failure".into()));
        }
        let created = CatMatch {
            id: Uuid::new_v4(),
            issuer_cat_id: cat_match.issuer_cat_id,
            receiver_cat_id: cat_match.receiver_cat_id,
            issued_by_id: cat_match.issued_by_id,
            message: cat_match.message.clone(),
            status: cat_match.status.clone(),
            created_at: Utc::now(),
        };
        tx.matches.push(created.clone());
        Ok(created)
    }

    fn matches_for_participant(&self, tx: &mut MemoryState, user_id: Uuid) -> RepoResult<Vec<MatchRecord>> {
        let owned: Vec<Uuid> = tx
            .cats
            .iter()
            .filter(|cat| cat.owned_by_id == user_id)
            .map(|cat| cat.id)
            .collect();

        tx.matches
            .iter()
            .rev()
            .filter(|m| m.issued_by_id == user_id || owned.contains(&m.receiver_cat_id))
            .map(|m| tx.record(m))
            .collect()
    }

    fn find_match(&self, tx: &mut MemoryState, match_id: Uuid) -> RepoResult<Option<CatMatch>> {
        Ok(tx.matches.iter().find(|m| m.id == match_id).cloned())
    }

    fn find_match_record(&self, tx: &mut MemoryState, match_id: Uuid) -> RepoResult<Option<MatchRecord>> {
        tx.matches
            .iter()
            .find(|m| m.id == match_id)
            .map(|m| tx.record(m))
            .transpose()
    }

    fn lock_match(&self, tx: &mut MemoryState, match_id: Uuid) -> RepoResult<Option<CatMatch>> {
        tx.lock_log.lock().unwrap().push(LockEvent::Match(match_id));
        Ok(tx.matches.iter().find(|m| m.id == match_id).cloned())
    }

    fn can_user_delete_match(&self, tx: &mut MemoryState, match_id: Uuid, user_id: Uuid) -> RepoResult<bool> {
        Ok(tx
            .matches
            .iter()
            .any(|m| m.id == match_id && m.issued_by_id == user_id))
    }

    fn can_user_respond_match(&self, tx: &mut MemoryState, match_id: Uuid, user_id: Uuid) -> RepoResult<bool> {
        let Some(cat_match) = tx.matches.iter().find(|m| m.id == match_id) else {
            return Ok(false);
        };
        Ok(tx
            .cats
            .iter()
            .any(|cat| cat.id == cat_match.receiver_cat_id && cat.owned_by_id == user_id))
    }

    fn match_status(&self, tx: &mut MemoryState, match_id: Uuid) -> RepoResult<MatchStatus> {
        let cat_match = tx
            .matches
            .iter()
            .find(|m| m.id == match_id)
            .ok_or(RepoError::NotFound("cat match"))?;
        parse_status(&cat_match.status)
    }

    fn delete_match(&self, tx: &mut MemoryState, match_id: Uuid) -> RepoResult<()> {
        tx.matches.retain(|m| m.id != match_id);
        Ok(())
    }

    fn update_match_status(&self, tx: &mut MemoryState, match_id: Uuid, status: MatchStatus) -> RepoResult<()> {
        if status == MatchStatus::Accepted {
            let target = tx
                .matches
                .iter()
                .find(|m| m.id == match_id)
                .cloned()
                .ok_or(RepoError::NotFound("cat match"))?;
            // Mirrors the partial unique indexes on accepted matches.
            let clash = tx.matches.iter().any(|m| {
                m.id != match_id
                    && m.status == MatchStatus::Accepted.as_str()
                    && (m.issuer_cat_id == target.issuer_cat_id || m.receiver_cat_id == target.receiver_cat_id)
            });
            if clash {
                return Err(RepoError::Conflict("cat_matches_one_accepted".into()));
            }
        }

        if let Some(m) = tx.matches.iter_mut().find(|m| m.id == match_id) {
            m.status = status.as_str().to_string();
        }
        Ok(())
    }

    fn reject_waiting_matches_for_cats(
        &self,
        tx: &mut MemoryState,
        cat_ids: &[Uuid],
        keep: Option<Uuid>,
    ) -> RepoResult<usize> {
        let mut rejected = 0;
        for m in tx.matches.iter_mut() {
            let touches = cat_ids.contains(&m.issuer_cat_id) || cat_ids.contains(&m.receiver_cat_id);
            if touches && m.status == MatchStatus::Waiting.as_str() && Some(m.id) != keep {
                m.status = MatchStatus::Rejected.as_str().to_string();
                rejected += 1;
            }
        }
        Ok(rejected)
    }
}

pub struct MemoryStore {
    state: Mutex<MemoryState>,
    users: MemoryUserRepository,
    cats: MemoryCatRepository,
    matches: MemoryCatMatchRepository,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState::default()),
            users: MemoryUserRepository,
            cats: MemoryCatRepository,
            matches: MemoryCatMatchRepository,
        }
    }

    pub fn snapshot(&self) -> MemoryState {
        self.state.lock().unwrap().clone()
    }

    /// Makes the next `create_match` fail as if the database went away.
    pub fn fail_next_match_insert(&self) {
        self.state
            .lock()
            .unwrap()
            .fail_next_match_insert
            .store(true, Ordering::SeqCst);
    }

    /// Every lock taken since the store was created, including those of
    /// rolled-back transactions.
    pub fn lock_log(&self) -> Vec<LockEvent> {
        self.state.lock().unwrap().lock_log.lock().unwrap().clone()
    }

    pub fn seed_user(&self, email: &str) -> User {
        let user = NewUser {
            email: email.to_string(),
            name: "Cat Lover".to_string(),
            password_hash: "not-a-real-hash".to_string(),
        };
        let mut state = self.state.lock().unwrap();
        self.users.create_user(&mut state, &user).unwrap()
    }

    pub fn seed_cat(&self, owner: Uuid, sex: Sex) -> Cat {
        let cat = NewCat {
            name: format!("{sex} cat"),
            race: Race::Persian.to_string(),
            sex: sex.to_string(),
            age_in_month: 12,
            description: "seeded".to_string(),
            image_urls: vec!["https://example.com/cat.png".to_string()],
            owned_by_id: owner,
        };
        let mut state = self.state.lock().unwrap();
        self.cats.create_cat(&mut state, &cat).unwrap()
    }

    pub fn cat(&self, id: Uuid) -> Cat {
        self.snapshot().cat(id).unwrap().clone()
    }

    pub fn cat_match(&self, id: Uuid) -> Option<CatMatch> {
        self.snapshot().matches.into_iter().find(|m| m.id == id)
    }
}

impl Store for MemoryStore {
    type Tx = MemoryState;
    type Users = MemoryUserRepository;
    type Cats = MemoryCatRepository;
    type Matches = MemoryCatMatchRepository;

    fn users(&self) -> &Self::Users {
        &self.users
    }

    fn cats(&self) -> &Self::Cats {
        &self.cats
    }

    fn matches(&self) -> &Self::Matches {
        &self.matches
    }

    fn transaction<T, F>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&mut MemoryState) -> AppResult<T>,
    {
        let mut state = self.state.lock().unwrap();
        let mut tx = state.clone();
        let out = f(&mut tx)?;
        *state = tx;
        Ok(out)
    }

    fn read_only<T, F>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&mut MemoryState) -> AppResult<T>,
    {
        let mut tx = self.state.lock().unwrap().clone();
        f(&mut tx)
    }

    fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}
