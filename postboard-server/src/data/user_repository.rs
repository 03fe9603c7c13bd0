use async_trait::async_trait;

use crate::domain::error::DomainError;
use crate::domain::user::User;

#[async_trait]
pub(crate) trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, DomainError>;
}
