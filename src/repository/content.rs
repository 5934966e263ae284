use std::collections::HashSet;

use tracing::{info, warn};
use uuid::Uuid;

use crate::blobs::FileUpload;
use crate::error::AppError;
use crate::keys::SEMESTERS;
use crate::models::{Pdf, PdfCategory, Semester, Subject};
use crate::notify::Resource;
use crate::repository::defaults::default_tree;
use crate::repository::{ContentRepository, required};

/// Where a new PDF's content comes from.
#[derive(Debug, Clone)]
pub enum PdfSource {
    /// File bytes that still have to be turned into a storable reference.
    Upload(FileUpload),
    /// An already hosted document.
    Link(String),
}

fn semester_mut<'a>(tree: &'a mut [Semester], id: &str) -> Result<&'a mut Semester, AppError> {
    tree.iter_mut()
        .find(|s| s.id == id)
        .ok_or_else(|| AppError::not_found(format!("semester {}", id)))
}

fn subject_mut<'a>(semester: &'a mut Semester, id: &str) -> Result<&'a mut Subject, AppError> {
    semester
        .subjects
        .iter_mut()
        .find(|s| s.id == id)
        .ok_or_else(|| AppError::not_found(format!("subject {}", id)))
}

fn pdf_position(subject: &Subject, id: &str) -> Result<usize, AppError> {
    subject
        .pdfs
        .iter()
        .position(|p| p.id == id)
        .ok_or_else(|| AppError::not_found(format!("pdf {}", id)))
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Names must be present and every id must be unique across the whole tree.
fn validate_tree(tree: &[Semester]) -> Result<(), AppError> {
    let mut seen = HashSet::new();
    let mut check_id = |id: &str| {
        if id.trim().is_empty() {
            return Err(AppError::validation("id must not be empty"));
        }
        if !seen.insert(id.to_string()) {
            return Err(AppError::validation(format!("duplicate id {}", id)));
        }
        Ok(())
    };

    for semester in tree {
        check_id(&semester.id)?;
        required(&semester.name, "semester name")?;
        for subject in &semester.subjects {
            check_id(&subject.id)?;
            required(&subject.name, "subject name")?;
            for pdf in &subject.pdfs {
                check_id(&pdf.id)?;
                required(&pdf.title, "title")?;
            }
        }
    }
    Ok(())
}

impl ContentRepository {
    /// Returns the persisted tree, seeding the built-in default on first use.
    pub async fn load_tree(&self) -> Result<Vec<Semester>, AppError> {
        if let Some(tree) = self.read_json::<Vec<Semester>>(SEMESTERS).await? {
            return Ok(tree);
        }

        let tree = default_tree();
        let (key, value) = Self::encode(SEMESTERS, &tree)?;
        if let Err(e) = self.store.set(&key, &value).await {
            warn!("could not persist default semester tree: {}", e);
        }
        Ok(tree)
    }

    /// Overwrites the whole tree. Whatever another context wrote since `tree`
    /// was loaded is lost.
    pub async fn replace_tree(&self, tree: Vec<Semester>) -> Result<(), AppError> {
        validate_tree(&tree)?;
        let writes = vec![Self::encode(SEMESTERS, &tree)?];
        self.commit(Resource::Semesters, writes).await?;
        info!("replaced semester tree ({} semesters)", tree.len());
        Ok(())
    }

    pub async fn semester(&self, semester_id: &str) -> Result<Semester, AppError> {
        self.load_tree()
            .await?
            .into_iter()
            .find(|s| s.id == semester_id)
            .ok_or_else(|| AppError::not_found(format!("semester {}", semester_id)))
    }

    pub async fn subject(&self, semester_id: &str, subject_id: &str) -> Result<Subject, AppError> {
        let mut semester = self.semester(semester_id).await?;
        subject_mut(&mut semester, subject_id).map(|s| s.clone())
    }

    /// Fresh read, in-memory change, one atomic write of the tree together
    /// with the announcement log line, one notification.
    async fn mutate_tree<R>(
        &self,
        apply: impl FnOnce(&mut Vec<Semester>) -> Result<(R, String), AppError>,
    ) -> Result<R, AppError> {
        let mut tree = self.load_tree().await?;
        let (result, entry) = apply(&mut tree)?;

        let mut writes = vec![Self::encode(SEMESTERS, &tree)?];
        writes.extend(self.announcement_log_writes(&entry).await?);
        self.commit(Resource::Semesters, writes).await?;

        info!("{}", entry);
        Ok(result)
    }

    pub async fn add_semester(&self, name: &str) -> Result<Semester, AppError> {
        let name = required(name, "semester name")?;
        self.mutate_tree(|tree| {
            let semester = Semester::new(new_id(), name);
            let entry = format!("Added semester \"{}\".", semester.name);
            tree.push(semester.clone());
            Ok((semester, entry))
        })
        .await
    }

    pub async fn rename_semester(&self, semester_id: &str, name: &str) -> Result<Semester, AppError> {
        let name = required(name, "semester name")?;
        self.mutate_tree(|tree| {
            let semester = semester_mut(tree, semester_id)?;
            let entry = format!("Renamed semester \"{}\" to \"{}\".", semester.name, name);
            semester.name = name;
            Ok((semester.clone(), entry))
        })
        .await
    }

    /// Removes the semester with every subject and PDF below it.
    pub async fn delete_semester(&self, semester_id: &str) -> Result<(), AppError> {
        self.mutate_tree(|tree| {
            let index = tree
                .iter()
                .position(|s| s.id == semester_id)
                .ok_or_else(|| AppError::not_found(format!("semester {}", semester_id)))?;
            let removed = tree.remove(index);
            Ok(((), format!("Removed semester \"{}\".", removed.name)))
        })
        .await
    }

    pub async fn add_subject(&self, semester_id: &str, name: &str) -> Result<Subject, AppError> {
        let name = required(name, "subject name")?;
        self.mutate_tree(|tree| {
            let semester = semester_mut(tree, semester_id)?;
            let subject = Subject::new(new_id(), name);
            let entry = format!("Added subject \"{}\" to {}.", subject.name, semester.name);
            semester.subjects.push(subject.clone());
            Ok((subject, entry))
        })
        .await
    }

    pub async fn rename_subject(
        &self,
        semester_id: &str,
        subject_id: &str,
        name: &str,
    ) -> Result<Subject, AppError> {
        let name = required(name, "subject name")?;
        self.mutate_tree(|tree| {
            let semester = semester_mut(tree, semester_id)?;
            let semester_name = semester.name.clone();
            let subject = subject_mut(semester, subject_id)?;
            let entry = format!(
                "Renamed subject \"{}\" to \"{}\" in {}.",
                subject.name, name, semester_name
            );
            subject.name = name;
            Ok((subject.clone(), entry))
        })
        .await
    }

    pub async fn delete_subject(&self, semester_id: &str, subject_id: &str) -> Result<(), AppError> {
        self.mutate_tree(|tree| {
            let semester = semester_mut(tree, semester_id)?;
            let index = semester
                .subjects
                .iter()
                .position(|s| s.id == subject_id)
                .ok_or_else(|| AppError::not_found(format!("subject {}", subject_id)))?;
            let removed = semester.subjects.remove(index);
            let entry = format!("Removed subject \"{}\" from {}.", removed.name, semester.name);
            Ok(((), entry))
        })
        .await
    }

    /// Stores the file first (this may hit the network), then appends the PDF
    /// to a freshly read tree. Nothing is persisted if the upload fails.
    pub async fn add_pdf(
        &self,
        semester_id: &str,
        subject_id: &str,
        title: &str,
        category: PdfCategory,
        source: PdfSource,
    ) -> Result<Pdf, AppError> {
        let title = required(title, "title")?;
        self.subject(semester_id, subject_id).await?;

        let (url, uploaded) = match source {
            PdfSource::Upload(upload) => (self.blobs.store(&upload).await?, true),
            PdfSource::Link(url) => (required(&url, "url")?, false),
        };

        let created_at = self.today();
        let result = self
            .mutate_tree(|tree| {
                let semester = semester_mut(tree, semester_id)?;
                let semester_name = semester.name.clone();
                let subject = subject_mut(semester, subject_id)?;
                let pdf = Pdf {
                    id: new_id(),
                    title,
                    category,
                    url,
                    created_at,
                };
                let entry = format!(
                    "Added {} \"{}\" to {} ({}).",
                    category.label(),
                    pdf.title,
                    subject.name,
                    semester_name
                );
                subject.pdfs.push(pdf.clone());
                Ok((pdf, entry))
            })
            .await;

        if let Err(e) = &result {
            if uploaded {
                warn!("uploaded file for {}/{} is orphaned: {}", semester_id, subject_id, e);
            }
        }
        result
    }

    pub async fn rename_pdf(
        &self,
        semester_id: &str,
        subject_id: &str,
        pdf_id: &str,
        title: &str,
    ) -> Result<Pdf, AppError> {
        let title = required(title, "title")?;
        self.mutate_tree(|tree| {
            let semester = semester_mut(tree, semester_id)?;
            let subject = subject_mut(semester, subject_id)?;
            let index = pdf_position(subject, pdf_id)?;
            let subject_name = subject.name.clone();
            let pdf = &mut subject.pdfs[index];
            let entry = format!(
                "Renamed {} \"{}\" to \"{}\" in {}.",
                pdf.category.label(),
                pdf.title,
                title,
                subject_name
            );
            pdf.title = title;
            Ok((pdf.clone(), entry))
        })
        .await
    }

    pub async fn delete_pdf(&self, semester_id: &str, subject_id: &str, pdf_id: &str) -> Result<(), AppError> {
        self.mutate_tree(|tree| {
            let semester = semester_mut(tree, semester_id)?;
            let subject = subject_mut(semester, subject_id)?;
            let index = pdf_position(subject, pdf_id)?;
            let removed = subject.pdfs.remove(index);
            let entry = format!(
                "Removed {} \"{}\" from {}.",
                removed.category.label(),
                removed.title,
                subject.name
            );
            Ok(((), entry))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_tree_rejects_duplicate_ids() {
        let mut tree = default_tree();
        tree[1].subjects[0].id = tree[0].subjects[0].id.clone();
        assert!(matches!(validate_tree(&tree), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_validate_tree_rejects_blank_names() {
        let mut tree = default_tree();
        tree[2].name = "  ".to_string();
        assert!(matches!(validate_tree(&tree), Err(AppError::Validation(_))));
        assert!(validate_tree(&default_tree()).is_ok());
    }
}
