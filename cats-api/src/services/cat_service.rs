use std::sync::Arc;

use uuid::Uuid;

use cats_shared::errors::{AppError, AppResult, ErrorCode};

use crate::cat_filter::CatFilter;
use crate::models::{CatRequest, CatView, CreatedResponse};
use crate::repository::{CatMatchRepository, CatRepository, Store};

pub struct CatService<S: Store> {
    store: Arc<S>,
}

impl<S: Store> CatService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn create_cat(&self, owner: Uuid, req: CatRequest) -> AppResult<CreatedResponse> {
        let cat = self
            .store
            .transaction(|tx| Ok(self.store.cats().create_cat(tx, &req.into_new_cat(owner))?))?;

        tracing::info!(cat_id = %cat.id, owner = %owner, "cat created");
        Ok(CreatedResponse {
            id: cat.id,
            created_at: cat.created_at,
        })
    }

    pub fn list_cats(&self, requester: Uuid, filter: &CatFilter) -> AppResult<Vec<CatView>> {
        let cats = self
            .store
            .read_only(|tx| Ok(self.store.cats().list_cats(tx, filter, requester)?))?;
        Ok(cats.into_iter().map(CatView::from).collect())
    }

    /// Replaces every editable field. The sex is frozen once the cat appears
    /// in any match request.
    pub fn update_cat(&self, owner: Uuid, cat_id: Uuid, req: CatRequest) -> AppResult<CatView> {
        let cat = self.store.transaction(|tx| {
            let cats = self.store.cats();
            cats.lock_cats(tx, &[cat_id])?;

            let current = cats
                .find_owned_cat(tx, cat_id, owner)?
                .ok_or_else(cat_not_found)?;

            if current.sex != req.sex.as_str() && cats.has_any_match(tx, cat_id)? {
                return Err(AppError::new(
                    ErrorCode::CatSexLocked,
                    "cannot change sex of a cat that has match requests",
                ));
            }

            Ok(cats.update_cat(tx, cat_id, &req.into_changes())?)
        })?;

        tracing::info!(cat_id = %cat.id, "cat updated");
        Ok(cat.into())
    }

    /// Soft-deletes the cat and rejects the match requests still waiting on it.
    pub fn delete_cat(&self, owner: Uuid, cat_id: Uuid) -> AppResult<()> {
        let rejected = self.store.transaction(|tx| {
            let cats = self.store.cats();
            cats.lock_cats(tx, &[cat_id])?;

            if cats.find_owned_cat(tx, cat_id, owner)?.is_none() {
                return Err(cat_not_found());
            }
            cats.soft_delete_cat(tx, cat_id)?;

            Ok(self
                .store
                .matches()
                .reject_waiting_matches_for_cats(tx, &[cat_id], None)?)
        })?;

        tracing::info!(cat_id = %cat_id, rejected_matches = rejected, "cat deleted");
        Ok(())
    }
}

fn cat_not_found() -> AppError {
    AppError::new(ErrorCode::CatNotFound, "cat is not found")
}
