use serde::{Deserialize, Serialize};

/// Extensions that mark an uploaded file as an image.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Extensions of non-page data files kept next to pages (the tag document).
pub const DATA_EXTENSIONS: &[&str] = &["csv"];

/// What a stored file is, judged by its extension.
///
/// Pages and data files share one container, so every listing of pages has
/// to filter by kind. Add new non-page extensions here, not at call sites.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Page,
    Image,
    Data,
}

impl FileKind {
    /// Classify a file name. Matching is ASCII case-insensitive.
    pub fn from_filename(name: &str) -> Self {
        let Some((_, ext)) = name.rsplit_once('.') else {
            return Self::Page;
        };
        let matches = |list: &[&str]| list.iter().any(|e| e.eq_ignore_ascii_case(ext));
        if matches(IMAGE_EXTENSIONS) {
            Self::Image
        } else if matches(DATA_EXTENSIONS) {
            Self::Data
        } else {
            Self::Page
        }
    }

    pub fn is_page(self) -> bool {
        self == Self::Page
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Page => write!(f, "page"),
            Self::Image => write!(f, "image"),
            Self::Data => write!(f, "data"),
        }
    }
}
