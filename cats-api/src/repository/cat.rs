use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use crate::cat_filter::{AgeFilter, CatFilter};
use crate::models::{Cat, CatChanges, NewCat};
use crate::schema::{cat_matches, cats};

use super::{CatRepository, RepoError, RepoResult};

pub struct PgCatRepository;

impl PgCatRepository {
    /// Loads both cats regardless of their deleted flag.
    fn load_pair(&self, tx: &mut PgConnection, first: Uuid, second: Uuid) -> RepoResult<(Cat, Cat)> {
        let rows = cats::table
            .filter(cats::id.eq_any([first, second]))
            .load::<Cat>(tx)?;

        let pick = |id: Uuid| {
            rows.iter()
                .find(|cat| cat.id == id)
                .cloned()
                .ok_or(RepoError::NotFound("cat"))
        };
        Ok((pick(first)?, pick(second)?))
    }
}

impl CatRepository for PgCatRepository {
    type Tx = PgConnection;

    fn create_cat(&self, tx: &mut PgConnection, cat: &NewCat) -> RepoResult<Cat> {
        let created = diesel::insert_into(cats::table)
            .values(cat)
            .get_result::<Cat>(tx)?;
        Ok(created)
    }

    fn list_cats(&self, tx: &mut PgConnection, filter: &CatFilter, requester: Uuid) -> RepoResult<Vec<Cat>> {
        let mut query = cats::table
            .filter(cats::deleted.eq(false))
            .into_boxed();

        if let Some(id) = filter.id {
            query = query.filter(cats::id.eq(id));
        }
        if let Some(race) = filter.race {
            query = query.filter(cats::race.eq(race.as_str()));
        }
        if let Some(sex) = filter.sex {
            query = query.filter(cats::sex.eq(sex.as_str()));
        }
        if let Some(has_matched) = filter.has_matched {
            query = query.filter(cats::has_matched.eq(has_matched));
        }
        query = match filter.age {
            Some(AgeFilter::GreaterThan(n)) => query.filter(cats::age_in_month.gt(n)),
            Some(AgeFilter::LessThan(n)) => query.filter(cats::age_in_month.lt(n)),
            Some(AgeFilter::Equal(n)) => query.filter(cats::age_in_month.eq(n)),
            None => query,
        };
        query = match filter.owned {
            Some(true) => query.filter(cats::owned_by_id.eq(requester)),
            Some(false) => query.filter(cats::owned_by_id.ne(requester)),
            None => query,
        };
        if let Some(pattern) = filter.search_pattern() {
            query = query.filter(cats::name.ilike(pattern));
        }

        let rows = query
            .order(cats::created_at.desc())
            .limit(filter.limit)
            .offset(filter.offset)
            .load::<Cat>(tx)?;
        Ok(rows)
    }

    fn find_owned_cat(&self, tx: &mut PgConnection, cat_id: Uuid, owner: Uuid) -> RepoResult<Option<Cat>> {
        let cat = cats::table
            .filter(cats::id.eq(cat_id))
            .filter(cats::owned_by_id.eq(owner))
            .filter(cats::deleted.eq(false))
            .first::<Cat>(tx)
            .optional()?;
        Ok(cat)
    }

    fn update_cat(&self, tx: &mut PgConnection, cat_id: Uuid, changes: &CatChanges) -> RepoResult<Cat> {
        let updated = diesel::update(cats::table.find(cat_id))
            .set(changes)
            .get_result::<Cat>(tx)?;
        Ok(updated)
    }

    fn soft_delete_cat(&self, tx: &mut PgConnection, cat_id: Uuid) -> RepoResult<()> {
        diesel::update(cats::table.find(cat_id))
            .set(cats::deleted.eq(true))
            .execute(tx)?;
        Ok(())
    }

    fn has_any_match(&self, tx: &mut PgConnection, cat_id: Uuid) -> RepoResult<bool> {
        let exists = diesel::select(diesel::dsl::exists(
            cat_matches::table.filter(
                cat_matches::issuer_cat_id
                    .eq(cat_id)
                    .or(cat_matches::receiver_cat_id.eq(cat_id)),
            ),
        ))
        .get_result::<bool>(tx)?;
        Ok(exists)
    }

    fn lock_cats(&self, tx: &mut PgConnection, cat_ids: &[Uuid]) -> RepoResult<()> {
        // Ordered by id so two transactions locking the same pair cannot deadlock.
        cats::table
            .filter(cats::id.eq_any(cat_ids))
            .order(cats::id)
            .select(cats::id)
            .for_update()
            .load::<Uuid>(tx)?;
        Ok(())
    }

    fn is_cat_owner(&self, tx: &mut PgConnection, cat_id: Uuid, user_id: Uuid) -> RepoResult<bool> {
        let owner = diesel::select(diesel::dsl::exists(
            cats::table
                .filter(cats::id.eq(cat_id))
                .filter(cats::owned_by_id.eq(user_id))
                .filter(cats::deleted.eq(false)),
        ))
        .get_result::<bool>(tx)?;
        Ok(owner)
    }

    fn both_cats_exist(&self, tx: &mut PgConnection, first: Uuid, second: Uuid) -> RepoResult<bool> {
        let live: i64 = cats::table
            .filter(cats::id.eq_any([first, second]))
            .filter(cats::deleted.eq(false))
            .count()
            .get_result(tx)?;
        Ok(first != second && live == 2)
    }

    fn has_same_sex(&self, tx: &mut PgConnection, first: Uuid, second: Uuid) -> RepoResult<bool> {
        let (a, b) = self.load_pair(tx, first, second)?;
        Ok(a.sex == b.sex)
    }

    fn from_same_owner(&self, tx: &mut PgConnection, first: Uuid, second: Uuid) -> RepoResult<bool> {
        let (a, b) = self.load_pair(tx, first, second)?;
        Ok(a.owned_by_id == b.owned_by_id)
    }

    fn has_matched(&self, tx: &mut PgConnection, first: Uuid, second: Uuid) -> RepoResult<bool> {
        let (a, b) = self.load_pair(tx, first, second)?;
        Ok(a.has_matched || b.has_matched)
    }

    fn mark_matched(&self, tx: &mut PgConnection, cat_ids: &[Uuid]) -> RepoResult<()> {
        diesel::update(cats::table.filter(cats::id.eq_any(cat_ids)))
            .set(cats::has_matched.eq(true))
            .execute(tx)?;
        Ok(())
    }
}
