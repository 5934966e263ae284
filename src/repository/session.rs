use tracing::info;

use crate::error::AppError;
use crate::keys::LOGGED_IN_USER_ID;
use crate::models::User;
use crate::notify::Resource;
use crate::repository::ContentRepository;

/// The session pointer only records who is signed in. Verifying credentials
/// happens before `login` is called.
impl ContentRepository {
    pub async fn login(&self, user_id: &str) -> Result<User, AppError> {
        let user = self.get_user(user_id).await?;
        self.commit(
            Resource::Session,
            vec![(LOGGED_IN_USER_ID.to_string(), user.id.clone())],
        )
        .await?;
        info!("user {} signed in", user.id);
        Ok(user)
    }

    pub async fn logout(&self) -> Result<(), AppError> {
        if self.store.remove(LOGGED_IN_USER_ID).await? {
            self.publish(Resource::Session, vec![LOGGED_IN_USER_ID.to_string()]);
        }
        Ok(())
    }

    pub async fn current_user_id(&self) -> Result<Option<String>, AppError> {
        Ok(self
            .read_raw(LOGGED_IN_USER_ID)
            .await?
            .filter(|id| !id.trim().is_empty()))
    }

    /// The signed-in user, or `None` when nobody is signed in or the user
    /// has since been deleted.
    pub async fn current_user(&self) -> Result<Option<User>, AppError> {
        let Some(user_id) = self.current_user_id().await? else {
            return Ok(None);
        };
        match self.get_user(&user_id).await {
            Ok(user) => Ok(Some(user)),
            Err(AppError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
