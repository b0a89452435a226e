use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

#[automock]
#[async_trait]
pub trait UserRepository {
    /// Case-insensitive lookup against the identity provider's profiles.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<Uuid>>;
}
