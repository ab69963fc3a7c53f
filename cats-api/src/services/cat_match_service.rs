//! Match request lifecycle: create, list, respond (accept/reject), delete.
//!
//! Every mutating flow runs in one store transaction. The cat rows involved
//! are locked before any eligibility predicate is evaluated, so two requests
//! racing on the same cats are serialized and the later one sees the
//! committed `has_matched` flags.

use std::sync::Arc;

use uuid::Uuid;

use cats_shared::errors::{AppError, AppResult, ErrorCode};

use crate::models::{CreateMatchRequest, CreatedResponse, MatchDecision, MatchStatus, MatchView, NewCatMatch};
use crate::repository::{parse_status, CatMatchRepository, CatRepository, RepoError, Store};

pub struct CatMatchService<S: Store> {
    store: Arc<S>,
}

impl<S: Store> CatMatchService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Issues a match request from the requester's `user_cat_id` to
    /// `match_cat_id`. The first failing eligibility check decides the error.
    pub fn create_match(&self, requester: Uuid, req: CreateMatchRequest) -> AppResult<CreatedResponse> {
        let issuer_cat = req.user_cat_id;
        let receiver_cat = req.match_cat_id;

        let created = self.store.transaction(|tx| {
            let cats = self.store.cats();
            cats.lock_cats(tx, &[issuer_cat, receiver_cat])?;

            if !cats.both_cats_exist(tx, issuer_cat, receiver_cat)? {
                return Err(AppError::new(
                    ErrorCode::CatUnavailable,
                    "cat is not found or has been deleted",
                ));
            }
            if !cats.is_cat_owner(tx, issuer_cat, requester)? {
                return Err(AppError::new(ErrorCode::CatNotFound, "user cat is not found"));
            }
            if cats.has_same_sex(tx, issuer_cat, receiver_cat)? {
                return Err(AppError::new(ErrorCode::CatsSameSex, "cats must have different sex"));
            }
            if cats.from_same_owner(tx, issuer_cat, receiver_cat)? {
                return Err(AppError::new(ErrorCode::CannotMatchOwnCat, "cannot match own cat"));
            }
            if cats.has_matched(tx, issuer_cat, receiver_cat)? {
                return Err(already_matched());
            }

            let new_match = NewCatMatch {
                issuer_cat_id: issuer_cat,
                receiver_cat_id: receiver_cat,
                issued_by_id: requester,
                message: req.message,
                status: MatchStatus::Waiting.to_string(),
            };
            Ok(self.store.matches().create_match(tx, &new_match)?)
        })?;

        tracing::info!(
            match_id = %created.id,
            issuer_cat = %issuer_cat,
            receiver_cat = %receiver_cat,
            "match request sent"
        );

        Ok(CreatedResponse {
            id: created.id,
            created_at: created.created_at,
        })
    }

    /// Every match the user issued or received, newest first.
    pub fn list_matches(&self, user_id: Uuid) -> AppResult<Vec<MatchView>> {
        let records = self
            .store
            .read_only(|tx| Ok(self.store.matches().matches_for_participant(tx, user_id)?))?;
        Ok(records.into_iter().map(MatchView::from).collect())
    }

    pub fn get_match(&self, user_id: Uuid, match_id: Uuid) -> AppResult<MatchView> {
        let record = self
            .store
            .read_only(|tx| Ok(self.store.matches().find_match_record(tx, match_id)?))?
            .filter(|record| record.is_participant(user_id))
            .ok_or_else(match_not_found)?;
        Ok(record.into())
    }

    /// Accepts or rejects a waiting request addressed to one of the
    /// requester's cats. Accepting marks both cats as matched and rejects
    /// every other request still waiting on either of them.
    pub fn respond_match(&self, requester: Uuid, match_id: Uuid, decision: MatchDecision) -> AppResult<MatchView> {
        let record = self.store.transaction(|tx| {
            let matches = self.store.matches();
            let cats = self.store.cats();

            if !matches.can_user_respond_match(tx, match_id, requester)? {
                return Err(match_not_found());
            }
            // Cats before the match row, the same order delete_cat uses.
            let unlocked = matches.find_match(tx, match_id)?.ok_or_else(match_not_found)?;
            let pair = [unlocked.issuer_cat_id, unlocked.receiver_cat_id];
            cats.lock_cats(tx, &pair)?;
            let cat_match = matches.lock_match(tx, match_id)?.ok_or_else(match_not_found)?;

            if parse_status(&cat_match.status)? != MatchStatus::Waiting {
                return Err(AppError::new(
                    ErrorCode::MatchNotWaiting,
                    "match request is no longer waiting",
                ));
            }

            match decision {
                MatchDecision::Rejected => {
                    matches.update_match_status(tx, match_id, MatchStatus::Rejected)?;
                }
                MatchDecision::Accepted => {
                    if cats.has_matched(tx, pair[0], pair[1])? {
                        return Err(already_matched());
                    }
                    matches
                        .update_match_status(tx, match_id, MatchStatus::Accepted)
                        .map_err(|e| match e {
                            RepoError::Conflict(_) => already_matched(),
                            other => other.into(),
                        })?;
                    cats.mark_matched(tx, &pair)?;
                    let rejected = matches.reject_waiting_matches_for_cats(tx, &pair, Some(match_id))?;
                    tracing::info!(match_id = %match_id, rejected_matches = rejected, "match accepted");
                }
            }

            matches.find_match_record(tx, match_id)?.ok_or_else(match_not_found)
        })?;

        tracing::info!(match_id = %match_id, status = %record.cat_match.status, "match request answered");
        Ok(record.into())
    }

    /// Withdraws a waiting request. Only its issuer may do so; anyone else
    /// gets the same answer as for a missing request.
    pub fn delete_match(&self, requester: Uuid, match_id: Uuid) -> AppResult<()> {
        self.store.transaction(|tx| {
            let matches = self.store.matches();

            if !matches.can_user_delete_match(tx, match_id, requester)? {
                return Err(match_not_found());
            }
            if matches.match_status(tx, match_id)? != MatchStatus::Waiting {
                return Err(AppError::new(
                    ErrorCode::MatchNotWaiting,
                    "cannot delete non waiting cat match request",
                ));
            }
            Ok(matches.delete_match(tx, match_id)?)
        })?;

        tracing::info!(match_id = %match_id, "match request deleted");
        Ok(())
    }
}

fn match_not_found() -> AppError {
    AppError::new(ErrorCode::CatMatchNotFound, "cat match request is not found")
}

fn already_matched() -> AppError {
    AppError::new(ErrorCode::CatAlreadyMatched, "cat has already matched")
}
