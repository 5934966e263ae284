//! Names of every persisted key. These match the browser client's local
//! storage layout so a store can be exported from one and read by the other.

pub const SEMESTERS: &str = "semesters";
pub const ALL_USERS: &str = "all-users";
pub const ANNOUNCEMENT_TEXT: &str = "update-note-text";
pub const ANNOUNCEMENT_DATE: &str = "update-note-date";
pub const LOGGED_IN_USER_ID: &str = "loggedInUserId";
pub const LOGIN_BACKGROUND_IMAGE: &str = "login-background-image";
pub const LOGIN_OVERLAY_OPACITY: &str = "login-overlay-opacity";
pub const FONT: &str = "font";

/// Prefix shared by every per-user override key.
pub const USER_OVERRIDE_PREFIX: &str = "user-";
