use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::profiles;

/// Read-only view of the identity provider's user profile.
#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = profiles)]
pub struct ProfileEntity {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
}
