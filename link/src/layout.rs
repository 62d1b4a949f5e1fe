use crate::binary::Binary;
use crate::dump::SectionDump;
use crate::entry::EntryId;
use crate::error::Error;
use crate::section::Section;
use crate::source::SourceFile;
use std::path::{Path, PathBuf};
use tracing::info;

/// All sections of one compilation run.
///
/// Sections and their entries are collected first; offsets are only
/// meaningful once `resolve` has run over the finished collection.
#[derive(Debug, Clone)]
pub struct Layout {
    base: PathBuf,
    sections: Vec<Section>,
}

/// Handle of a section inside a layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SectionId(usize);

impl Layout {
    /// `base` is the project directory `/`-rooted includes resolve against.
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            sections: vec![],
        }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn declare(&mut self, section: Section) -> SectionId {
        self.sections.push(section);
        SectionId(self.sections.len() - 1)
    }

    pub fn section(&self, id: SectionId) -> Option<&Section> {
        self.sections.get(id.0)
    }

    pub fn section_mut(&mut self, id: SectionId) -> Option<&mut Section> {
        self.sections.get_mut(id.0)
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Register a binary include of `file` into the section `id`.
    pub fn include(
        &mut self,
        file: &SourceFile,
        id: SectionId,
        src: &str,
        index: usize,
    ) -> Result<EntryId, Error> {
        let section = self
            .sections
            .get_mut(id.0)
            .ok_or(Error::SectionNotFound(id.0))?;
        Binary::register(file, &self.base, src, section, index)
    }

    /// Resolve every section in declaration order, stopping at the first error.
    pub fn resolve(&mut self) -> Result<usize, Error> {
        let mut total = 0;
        for section in &mut self.sections {
            total += section.resolve()?;
        }
        info!(sections = self.sections.len(), bytes = total, "resolved layout");
        Ok(total)
    }

    pub fn dump(&self) -> Vec<SectionDump> {
        self.sections.iter().map(Section::dump).collect()
    }
}
