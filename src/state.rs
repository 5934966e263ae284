use crate::repository::ContentRepository;

#[derive(Clone)]
pub struct AppState {
    pub repo: ContentRepository,
}
