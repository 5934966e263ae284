use crate::models::{Role, Semester, Subject, User, UserStatus};

pub const DEFAULT_ANNOUNCEMENT: &str = "Welcome to NoteVerse! New notes and exams will be announced here.";
pub const DEFAULT_FONT: &str = "Inter";
pub const DEFAULT_OVERLAY_OPACITY: f32 = 0.5;

/// Change-log lines kept under the announcement text.
pub const MAX_LOG_LINES: usize = 20;
/// Marks an announcement line as a change-log entry rather than admin text.
pub const LOG_LINE_PREFIX: &str = "• ";

const STARTER_SUBJECTS: [&[&str]; 4] = [
    &["Mathematics I", "Physics", "Chemistry", "Programming Fundamentals"],
    &["Mathematics II", "Electrical Circuits", "Engineering Drawing"],
    &["Data Structures", "Digital Logic", "Discrete Mathematics"],
    &["Algorithms", "Operating Systems", "Database Systems"],
];

/// Tree served when nothing has been persisted yet.
pub fn default_tree() -> Vec<Semester> {
    STARTER_SUBJECTS
        .iter()
        .enumerate()
        .map(|(i, subjects)| {
            let n = i + 1;
            let mut semester = Semester::new(format!("sem{}", n), format!("Semester {}", n));
            semester.subjects = subjects
                .iter()
                .enumerate()
                .map(|(j, name)| Subject::new(format!("sem{}-sub{}", n, j + 1), *name))
                .collect();
            semester
        })
        .collect()
}

pub fn default_users() -> Vec<User> {
    vec![User {
        id: "admin".to_string(),
        name: "Administrator".to_string(),
        email: "admin@noteverse.app".to_string(),
        avatar: None,
        role: Role::Admin,
        status: UserStatus::Offline,
        display_name_hidden: false,
        can_change_name: true,
        can_change_photo: true,
    }]
}
