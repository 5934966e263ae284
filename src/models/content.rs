use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PdfCategory {
    Note,
    Exam,
}

impl PdfCategory {
    pub fn label(&self) -> &'static str {
        match self {
            PdfCategory::Note => "note",
            PdfCategory::Exam => "exam",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pdf {
    pub id: String,
    pub title: String,
    pub category: PdfCategory,
    pub url: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub pdfs: Vec<Pdf>,
}

impl Subject {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            pdfs: Vec::new(),
        }
    }

    pub fn pdfs_in(&self, category: PdfCategory) -> impl Iterator<Item = &Pdf> {
        self.pdfs.iter().filter(move |p| p.category == category)
    }

    pub fn notes(&self) -> impl Iterator<Item = &Pdf> {
        self.pdfs_in(PdfCategory::Note)
    }

    pub fn exams(&self) -> impl Iterator<Item = &Pdf> {
        self.pdfs_in(PdfCategory::Exam)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Semester {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub subjects: Vec<Subject>,
}

impl Semester {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            subjects: Vec::new(),
        }
    }

    pub fn subject(&self, subject_id: &str) -> Option<&Subject> {
        self.subjects.iter().find(|s| s.id == subject_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSemesterRequest {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSubjectRequest {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameRequest {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenamePdfRequest {
    pub title: String,
}

/// A PDF upload as sent by API clients: either an existing link or a base64 payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPdfRequest {
    pub title: String,
    pub category: PdfCategory,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub data: Option<String>,
}
