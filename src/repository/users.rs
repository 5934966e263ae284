use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::keys::ALL_USERS;
use crate::models::{ProfileUpdate, User, UserPermissions};
use crate::notify::Resource;
use crate::overrides::{OverrideField, UserOverrides};
use crate::repository::defaults::default_users;
use crate::repository::{ContentRepository, required};

impl ContentRepository {
    /// Canonical records, without overrides.
    async fn load_canonical_users(&self) -> Result<Vec<User>, AppError> {
        Ok(self
            .read_json::<Vec<User>>(ALL_USERS)
            .await?
            .unwrap_or_else(default_users))
    }

    async fn resolve_user(&self, user: &User) -> Result<User, AppError> {
        let overrides = UserOverrides::load(self.store.as_ref(), &user.id).await?;
        Ok(overrides.apply(user))
    }

    /// Every user with stored overrides merged in.
    pub async fn get_users(&self) -> Result<Vec<User>, AppError> {
        let canonical = self.load_canonical_users().await?;
        let mut users = Vec::with_capacity(canonical.len());
        for user in &canonical {
            users.push(self.resolve_user(user).await?);
        }
        Ok(users)
    }

    pub async fn get_user(&self, user_id: &str) -> Result<User, AppError> {
        let canonical = self.load_canonical_users().await?;
        let user = canonical
            .iter()
            .find(|u| u.id == user_id)
            .ok_or_else(|| AppError::not_found(format!("user {}", user_id)))?;
        self.resolve_user(user).await
    }

    /// Inserts or replaces the canonical record. Overrides are left alone, so
    /// a stored override keeps winning over the new canonical value.
    pub async fn upsert_user(&self, mut user: User) -> Result<User, AppError> {
        user.name = required(&user.name, "name")?;
        user.email = required(&user.email, "email")?;
        if user.id.trim().is_empty() {
            user.id = Uuid::new_v4().to_string();
        }

        let mut users = self.load_canonical_users().await?;
        match users.iter_mut().find(|u| u.id == user.id) {
            Some(existing) => *existing = user.clone(),
            None => users.push(user.clone()),
        }

        self.commit(Resource::Users, vec![Self::encode(ALL_USERS, &users)?])
            .await?;
        info!("saved user {}", user.id);
        Ok(user)
    }

    pub async fn delete_user(&self, user_id: &str) -> Result<(), AppError> {
        let mut users = self.load_canonical_users().await?;
        let index = users
            .iter()
            .position(|u| u.id == user_id)
            .ok_or_else(|| AppError::not_found(format!("user {}", user_id)))?;
        users.remove(index);

        self.commit(Resource::Users, vec![Self::encode(ALL_USERS, &users)?])
            .await?;
        info!("deleted user {}", user_id);
        Ok(())
    }

    /// Writes one override key. The owning user does not have to exist yet.
    pub async fn set_user_override(
        &self,
        user_id: &str,
        field: OverrideField,
        value: &str,
    ) -> Result<(), AppError> {
        let value = field.normalise(value)?;
        self.commit(Resource::Users, vec![(field.key(user_id), value)])
            .await
    }

    pub async fn clear_user_override(&self, user_id: &str, field: OverrideField) -> Result<(), AppError> {
        let key = field.key(user_id);
        if self.store.remove(&key).await? {
            self.publish(Resource::Users, vec![key]);
        }
        Ok(())
    }

    /// Self-service edit, honouring the effective `canChangeName` and
    /// `canChangePhoto` flags.
    pub async fn update_profile(&self, user_id: &str, update: ProfileUpdate) -> Result<User, AppError> {
        let current = self.get_user(user_id).await?;
        let mut writes = Vec::new();

        if let Some(name) = update.name {
            if !current.can_change_name {
                return Err(AppError::Forbidden("changing the display name is not allowed".to_string()));
            }
            writes.push((OverrideField::Name.key(user_id), OverrideField::Name.normalise(&name)?));
        }
        if let Some(avatar) = update.avatar {
            if !current.can_change_photo {
                return Err(AppError::Forbidden("changing the photo is not allowed".to_string()));
            }
            writes.push((OverrideField::Avatar.key(user_id), OverrideField::Avatar.normalise(&avatar)?));
        }

        if writes.is_empty() {
            return Ok(current);
        }
        self.commit(Resource::Users, writes).await?;
        self.get_user(user_id).await
    }

    pub async fn set_permissions(&self, user_id: &str, permissions: UserPermissions) -> Result<User, AppError> {
        self.get_user(user_id).await?;

        let mut writes = Vec::new();
        if let Some(role) = permissions.role {
            writes.push((OverrideField::Role.key(user_id), role.as_str().to_string()));
        }
        if let Some(allowed) = permissions.can_change_name {
            writes.push((OverrideField::CanChangeName.key(user_id), allowed.to_string()));
        }
        if let Some(allowed) = permissions.can_change_photo {
            writes.push((OverrideField::CanChangePhoto.key(user_id), allowed.to_string()));
        }

        if !writes.is_empty() {
            self.commit(Resource::Users, writes).await?;
            info!("updated permissions for user {}", user_id);
        }
        self.get_user(user_id).await
    }
}
