use diesel::connection::{AnsiTransactionManager, TransactionManager};
use diesel::pg::PgConnection;
use diesel::prelude::*;

use cats_shared::clients::db::DbPool;
use cats_shared::errors::{AppError, AppResult};

use super::{PgCatMatchRepository, PgCatRepository, PgUserRepository, RepoError, Store};

/// Postgres-backed store; every transaction checks one connection out of the
/// r2d2 pool for its whole lifetime.
pub struct PgStore {
    pool: DbPool,
    users: PgUserRepository,
    cats: PgCatRepository,
    matches: PgCatMatchRepository,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            users: PgUserRepository,
            cats: PgCatRepository,
            matches: PgCatMatchRepository,
        }
    }

    fn checkout(&self) -> AppResult<diesel::r2d2::PooledConnection<diesel::r2d2::ConnectionManager<PgConnection>>> {
        self.pool
            .get()
            .map_err(|e| AppError::from(RepoError::Connection(e.to_string())))
    }
}

impl Store for PgStore {
    type Tx = PgConnection;
    type Users = PgUserRepository;
    type Cats = PgCatRepository;
    type Matches = PgCatMatchRepository;

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
        F: FnOnce(&mut PgConnection) -> AppResult<T>,
    {
        let mut pooled = self.checkout()?;
        let conn: &mut PgConnection = &mut pooled;
        conn.transaction(f)
    }

    fn read_only<T, F>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&mut PgConnection) -> AppResult<T>,
    {
        let mut pooled = self.checkout()?;
        let conn: &mut PgConnection = &mut pooled;

        <AnsiTransactionManager as TransactionManager<PgConnection>>::begin_transaction(conn)?;
        let result = f(conn);
        if let Err(e) = <AnsiTransactionManager as TransactionManager<PgConnection>>::rollback_transaction(conn) {
            tracing::warn!(error = %e, "failed to roll back read-only transaction");
        }
        result
    }

    fn ping(&self) -> AppResult<()> {
        let mut pooled = self.checkout()?;
        diesel::sql_query("SELECT 1")
            .execute(&mut *pooled)
            .map_err(RepoError::from)?;
        Ok(())
    }
}
