use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use diesel::{prelude::*, sql_types::Text};
use domain::{repositories::users::UserRepository, schema::profiles};
use uuid::Uuid;

use crate::postgres::postgres_connection::{PgPoolSquad, with_connection};

diesel::define_sql_function!(fn lower(value: Text) -> Text);

pub struct UserPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl UserPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl UserRepository for UserPostgres {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<Uuid>> {
        let email = email.trim().to_lowercase();

        with_connection(&self.db_pool, move |conn| {
            let user_id = profiles::table
                .filter(lower(profiles::email).eq(email))
                .select(profiles::id)
                .first::<Uuid>(conn)
                .optional()?;
            Ok(user_id)
        })
        .await
    }
}
