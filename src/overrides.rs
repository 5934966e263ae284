//! Per-user field overrides.
//!
//! Profile edits are stored as individual keys (`user-name-<id>` and friends)
//! next to the canonical user collection. Reading a field always goes through
//! [`resolve`]: stored override, then the canonical record, then a built-in
//! default.

use crate::error::AppError;
use crate::keys::USER_OVERRIDE_PREFIX;
use crate::models::{Role, User};
use crate::store::KeyValueStore;

pub const DEFAULT_USER_NAME: &str = "User";
pub const DEFAULT_AVATAR: &str = "/default-avatar.png";
pub const DEFAULT_ROLE: Role = Role::Student;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideField {
    Name,
    Avatar,
    CanChangeName,
    CanChangePhoto,
    Role,
}

impl OverrideField {
    pub const ALL: [OverrideField; 5] = [
        OverrideField::Name,
        OverrideField::Avatar,
        OverrideField::CanChangeName,
        OverrideField::CanChangePhoto,
        OverrideField::Role,
    ];

    pub fn key_part(&self) -> &'static str {
        match self {
            OverrideField::Name => "name",
            OverrideField::Avatar => "avatar",
            OverrideField::CanChangeName => "canChangeName",
            OverrideField::CanChangePhoto => "canChangePhoto",
            OverrideField::Role => "role",
        }
    }

    pub fn key(&self, user_id: &str) -> String {
        format!("{}{}-{}", USER_OVERRIDE_PREFIX, self.key_part(), user_id)
    }

    /// Checks that a raw value is acceptable for this field and returns the
    /// normalised form that gets stored.
    pub fn normalise(&self, raw: &str) -> Result<String, AppError> {
        match self {
            OverrideField::Name => {
                let name = raw.trim();
                if name.is_empty() {
                    return Err(AppError::validation("name must not be empty"));
                }
                Ok(name.to_string())
            }
            OverrideField::Avatar => Ok(raw.trim().to_string()),
            OverrideField::CanChangeName | OverrideField::CanChangePhoto => parse_bool(raw)
                .map(|b| b.to_string())
                .ok_or_else(|| AppError::validation(format!("{} must be true or false", self.key_part()))),
            OverrideField::Role => Role::parse(raw)
                .map(|r| r.as_str().to_string())
                .ok_or_else(|| AppError::validation(format!("unknown role: {}", raw))),
        }
    }
}

/// Stored override, else canonical value, else default.
pub fn resolve<T>(stored: Option<T>, canonical: Option<T>, default: T) -> T {
    stored.or(canonical).unwrap_or(default)
}

pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserOverrides {
    pub name: Option<String>,
    pub avatar: Option<String>,
    pub can_change_name: Option<bool>,
    pub can_change_photo: Option<bool>,
    pub role: Option<Role>,
}

impl UserOverrides {
    pub async fn load(store: &dyn KeyValueStore, user_id: &str) -> Result<Self, AppError> {
        let mut overrides = UserOverrides::default();
        for field in OverrideField::ALL {
            let Some(raw) = store.get(&field.key(user_id)).await? else {
                continue;
            };
            match field {
                OverrideField::Name => overrides.name = non_empty(&raw),
                OverrideField::Avatar => overrides.avatar = non_empty(&raw),
                OverrideField::CanChangeName => overrides.can_change_name = parse_bool(&raw),
                OverrideField::CanChangePhoto => overrides.can_change_photo = parse_bool(&raw),
                OverrideField::Role => overrides.role = Role::parse(&raw),
            }
        }
        Ok(overrides)
    }

    /// Effective user as every reader should see it.
    pub fn apply(&self, user: &User) -> User {
        User {
            name: resolve(
                self.name.clone(),
                non_empty(&user.name),
                DEFAULT_USER_NAME.to_string(),
            ),
            avatar: Some(resolve(
                self.avatar.clone(),
                user.avatar.as_deref().and_then(non_empty),
                DEFAULT_AVATAR.to_string(),
            )),
            role: resolve(self.role, Some(user.role), DEFAULT_ROLE),
            can_change_name: resolve(self.can_change_name, Some(user.can_change_name), true),
            can_change_photo: resolve(self.can_change_photo, Some(user.can_change_photo), true),
            ..user.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserStatus;
    use crate::store::MemoryStore;

    fn student() -> User {
        User {
            id: "u1".to_string(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            avatar: None,
            role: Role::Student,
            status: UserStatus::Offline,
            display_name_hidden: false,
            can_change_name: true,
            can_change_photo: true,
        }
    }

    #[test]
    fn test_resolve_precedence() {
        assert_eq!(resolve(Some(1), Some(2), 3), 1);
        assert_eq!(resolve(None, Some(2), 3), 2);
        assert_eq!(resolve(None, None, 3), 3);
    }

    #[test]
    fn test_override_keys() {
        assert_eq!(OverrideField::Name.key("42"), "user-name-42");
        assert_eq!(OverrideField::CanChangePhoto.key("42"), "user-canChangePhoto-42");
        assert_eq!(OverrideField::Role.key("42"), "user-role-42");
    }

    #[test]
    fn test_normalise_rejects_bad_values() {
        assert!(OverrideField::Name.normalise("   ").is_err());
        assert!(OverrideField::CanChangeName.normalise("yes").is_err());
        assert!(OverrideField::Role.normalise("superuser").is_err());
        assert_eq!(OverrideField::Role.normalise(" Admin ").unwrap(), "admin");
    }

    #[tokio::test]
    async fn test_apply_uses_all_three_tiers() {
        let store = MemoryStore::new();
        store.set("user-canChangeName-u1", "false").await.unwrap();
        store.set("user-role-u1", "uploader").await.unwrap();

        let overrides = UserOverrides::load(&store, "u1").await.unwrap();
        let effective = overrides.apply(&student());

        assert_eq!(effective.name, "Ada");
        assert_eq!(effective.avatar.as_deref(), Some(DEFAULT_AVATAR));
        assert!(!effective.can_change_name);
        assert!(effective.can_change_photo);
        assert_eq!(effective.role, Role::Uploader);
    }

    #[tokio::test]
    async fn test_unparseable_override_falls_back_to_canonical() {
        let store = MemoryStore::new();
        store.set("user-canChangePhoto-u1", "maybe").await.unwrap();

        let overrides = UserOverrides::load(&store, "u1").await.unwrap();
        assert!(overrides.apply(&student()).can_change_photo);
    }
}
