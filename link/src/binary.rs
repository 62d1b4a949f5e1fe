use crate::entry::{EntryData, EntryId};
use crate::error::Error;
use crate::section::Section;
use crate::source::SourceFile;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Raw binary include. Only the size is known until the image is generated.
#[derive(Debug, Clone, PartialEq)]
pub struct Binary {
    file: String,
    index: usize,
    src: PathBuf,
    size: usize,
}

/// Resolve an include path.
///
/// A leading `/` roots the path at the project `base`, anything else is
/// relative to the directory of the including file. Repeated leading
/// separators are collapsed so the result always stays under `base`.
pub fn resolve_path(file: &SourceFile, base: &Path, src: &str) -> PathBuf {
    if src.starts_with('/') {
        base.join(src.trim_start_matches('/'))
    } else {
        file.dir().join(src)
    }
}

impl Binary {
    /// Measure the referenced file and append it to `section`.
    pub fn register(
        file: &SourceFile,
        base: &Path,
        src: &str,
        section: &mut Section,
        index: usize,
    ) -> Result<EntryId, Error> {
        let path = resolve_path(file, base, src);
        let include_error = |source: io::Error| Error::Include {
            file: file.name.clone(),
            index,
            path: path.clone(),
            source,
        };
        let len = fs::metadata(&path).map_err(include_error)?.len();
        let size = usize::try_from(len).map_err(|_| {
            include_error(io::Error::new(
                io::ErrorKind::InvalidData,
                "file too large to address",
            ))
        })?;
        trace!(path = %path.display(), size, "sized binary include");

        let binary = Binary {
            file: file.name.clone(),
            index,
            src: path,
            size,
        };
        section.append(EntryData::Binary(binary), index)
    }

    pub fn src(&self) -> &Path {
        &self.src
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Read the whole file. Only meant for final image generation.
    pub fn materialize(&self) -> Result<Vec<u8>, Error> {
        fs::read(&self.src).map_err(|source| Error::Include {
            file: self.file.clone(),
            index: self.index,
            path: self.src.clone(),
            source,
        })
    }
}
