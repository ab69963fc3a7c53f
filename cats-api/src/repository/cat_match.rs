use std::collections::HashMap;

use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use crate::models::{Cat, CatMatch, MatchRecord, MatchStatus, NewCatMatch, User};
use crate::schema::{cat_matches, cats, users};

use super::{parse_status, CatMatchRepository, RepoError, RepoResult};

pub struct PgCatMatchRepository;

impl PgCatMatchRepository {
    /// Attaches the issuer and both cats to each match, preserving row order.
    fn hydrate(&self, tx: &mut PgConnection, rows: Vec<CatMatch>) -> RepoResult<Vec<MatchRecord>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let cat_ids: Vec<Uuid> = rows
            .iter()
            .flat_map(|m| [m.issuer_cat_id, m.receiver_cat_id])
            .collect();
        let user_ids: Vec<Uuid> = rows.iter().map(|m| m.issued_by_id).collect();

        let cats_by_id: HashMap<Uuid, Cat> = cats::table
            .filter(cats::id.eq_any(&cat_ids))
            .load::<Cat>(tx)?
            .into_iter()
            .map(|cat| (cat.id, cat))
            .collect();
        let users_by_id: HashMap<Uuid, User> = users::table
            .filter(users::id.eq_any(&user_ids))
            .load::<User>(tx)?
            .into_iter()
            .map(|user| (user.id, user))
            .collect();

        rows.into_iter()
            .map(|cat_match| {
                let missing = |what: &str| {
                    RepoError::Corrupt(format!("match {} references a missing {what}", cat_match.id))
                };
                let issuer = users_by_id
                    .get(&cat_match.issued_by_id)
                    .cloned()
                    .ok_or_else(|| missing("user"))?;
                let issuer_cat = cats_by_id
                    .get(&cat_match.issuer_cat_id)
                    .cloned()
                    .ok_or_else(|| missing("issuer cat"))?;
                let receiver_cat = cats_by_id
                    .get(&cat_match.receiver_cat_id)
                    .cloned()
                    .ok_or_else(|| missing("receiver cat"))?;

                Ok(MatchRecord {
                    cat_match,
                    issuer,
                    issuer_cat,
                    receiver_cat,
                })
            })
            .collect()
    }
}

impl CatMatchRepository for PgCatMatchRepository {
    type Tx = PgConnection;

    fn create_match(&self, tx: &mut PgConnection, cat_match: &NewCatMatch) -> RepoResult<CatMatch> {
        let created = diesel::insert_into(cat_matches::table)
            .values(cat_match)
            .get_result::<CatMatch>(tx)?;
        Ok(created)
    }

    fn matches_for_participant(&self, tx: &mut PgConnection, user_id: Uuid) -> RepoResult<Vec<MatchRecord>> {
        let owned_cats = cats::table
            .filter(cats::owned_by_id.eq(user_id))
            .select(cats::id);

        let rows = cat_matches::table
            .filter(
                cat_matches::issued_by_id
                    .eq(user_id)
                    .or(cat_matches::receiver_cat_id.eq_any(owned_cats)),
            )
            .order(cat_matches::created_at.desc())
            .load::<CatMatch>(tx)?;

        self.hydrate(tx, rows)
    }

    fn find_match(&self, tx: &mut PgConnection, match_id: Uuid) -> RepoResult<Option<CatMatch>> {
        let row = cat_matches::table
            .find(match_id)
            .first::<CatMatch>(tx)
            .optional()?;
        Ok(row)
    }

    fn find_match_record(&self, tx: &mut PgConnection, match_id: Uuid) -> RepoResult<Option<MatchRecord>> {
        let row = cat_matches::table
            .find(match_id)
            .first::<CatMatch>(tx)
            .optional()?;

        match row {
            Some(row) => Ok(self.hydrate(tx, vec![row])?.pop()),
            None => Ok(None),
        }
    }

    fn lock_match(&self, tx: &mut PgConnection, match_id: Uuid) -> RepoResult<Option<CatMatch>> {
        let row = cat_matches::table
            .find(match_id)
            .for_update()
            .first::<CatMatch>(tx)
            .optional()?;
        Ok(row)
    }

    fn can_user_delete_match(&self, tx: &mut PgConnection, match_id: Uuid, user_id: Uuid) -> RepoResult<bool> {
        let allowed = diesel::select(diesel::dsl::exists(
            cat_matches::table
                .filter(cat_matches::id.eq(match_id))
                .filter(cat_matches::issued_by_id.eq(user_id)),
        ))
        .get_result::<bool>(tx)?;
        Ok(allowed)
    }

    fn can_user_respond_match(&self, tx: &mut PgConnection, match_id: Uuid, user_id: Uuid) -> RepoResult<bool> {
        let owned_cats = cats::table
            .filter(cats::owned_by_id.eq(user_id))
            .select(cats::id);

        let allowed = diesel::select(diesel::dsl::exists(
            cat_matches::table
                .filter(cat_matches::id.eq(match_id))
                .filter(cat_matches::receiver_cat_id.eq_any(owned_cats)),
        ))
        .get_result::<bool>(tx)?;
        Ok(allowed)
    }

    fn match_status(&self, tx: &mut PgConnection, match_id: Uuid) -> RepoResult<MatchStatus> {
        let raw = cat_matches::table
            .find(match_id)
            .select(cat_matches::status)
            .for_update()
            .first::<String>(tx)
            .optional()?
            .ok_or(RepoError::NotFound("cat match"))?;
        parse_status(&raw)
    }

    fn delete_match(&self, tx: &mut PgConnection, match_id: Uuid) -> RepoResult<()> {
        diesel::delete(cat_matches::table.find(match_id)).execute(tx)?;
        Ok(())
    }

    fn update_match_status(&self, tx: &mut PgConnection, match_id: Uuid, status: MatchStatus) -> RepoResult<()> {
        diesel::update(cat_matches::table.find(match_id))
            .set(cat_matches::status.eq(status.as_str()))
            .execute(tx)?;
        Ok(())
    }

    fn reject_waiting_matches_for_cats(
        &self,
        tx: &mut PgConnection,
        cat_ids: &[Uuid],
        keep: Option<Uuid>,
    ) -> RepoResult<usize> {
        let mut query = cat_matches::table
            .filter(cat_matches::status.eq(MatchStatus::Waiting.as_str()))
            .filter(
                cat_matches::issuer_cat_id
                    .eq_any(cat_ids)
                    .or(cat_matches::receiver_cat_id.eq_any(cat_ids)),
            )
            .select(cat_matches::id)
            .into_boxed();
        if let Some(keep) = keep {
            query = query.filter(cat_matches::id.ne(keep));
        }
        let ids = query.load::<Uuid>(tx)?;

        let rejected = diesel::update(cat_matches::table.filter(cat_matches::id.eq_any(&ids)))
            .set(cat_matches::status.eq(MatchStatus::Rejected.as_str()))
            .execute(tx)?;
        Ok(rejected)
    }
}
