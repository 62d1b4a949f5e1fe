use std::path::{Path, PathBuf};

/// A source unit of the compilation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Name used in diagnostics and dumps
    pub name: String,
    pub path: PathBuf,
}

impl SourceFile {
    pub fn new(name: &str, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.to_string(),
            path: path.into(),
        }
    }

    /// Directory relative includes are resolved against
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }
}
