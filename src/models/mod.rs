pub mod announcement;
pub mod content;
pub mod settings;
pub mod user;

pub use announcement::{Announcement, UpdateAnnouncementRequest};
pub use content::{
    NewPdfRequest, NewSemesterRequest, NewSubjectRequest, Pdf, PdfCategory, RenamePdfRequest,
    RenameRequest, Semester, Subject,
};
pub use settings::{FontPreference, LoginAppearance};
pub use user::{ProfileUpdate, Role, User, UserPermissions, UserStatus};
