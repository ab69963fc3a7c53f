use diesel::pg::PgConnection;
use diesel::prelude::*;

use crate::models::{NewUser, User};
use crate::schema::users;

use super::{RepoResult, UserRepository};

pub struct PgUserRepository;

impl UserRepository for PgUserRepository {
    type Tx = PgConnection;

    fn create_user(&self, tx: &mut PgConnection, user: &NewUser) -> RepoResult<User> {
        let created = diesel::insert_into(users::table)
            .values(user)
            .get_result::<User>(tx)?;
        Ok(created)
    }

    fn find_by_email(&self, tx: &mut PgConnection, email: &str) -> RepoResult<Option<User>> {
        let user = users::table
            .filter(users::email.eq(email))
            .first::<User>(tx)
            .optional()?;
        Ok(user)
    }

    fn email_exists(&self, tx: &mut PgConnection, email: &str) -> RepoResult<bool> {
        let exists = diesel::select(diesel::dsl::exists(
            users::table.filter(users::email.eq(email)),
        ))
        .get_result::<bool>(tx)?;
        Ok(exists)
    }
}
