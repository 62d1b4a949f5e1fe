use crate::entry::{DataBlock, EntryData, Instruction, Variable};
use crate::error::Error;
use crate::layout::Layout;
use crate::section::Section;
use crate::source::SourceFile;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

/// Layout description read by the `gblink` driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutFile {
    pub files: Vec<FileDecl>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileDecl {
    /// Path relative to the layout file
    pub name: String,
    #[serde(default)]
    pub sections: IndexMap<String, SectionDecl>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionDecl {
    pub region: String,
    #[serde(default)]
    pub bank: Option<i64>,
    #[serde(default)]
    pub offset: Option<usize>,
    /// Entries are written as single-key maps, `- label: main`
    #[serde(default, with = "serde_yaml::with::singleton_map_recursive")]
    pub entries: Vec<EntryDecl>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryDecl {
    Label(String),
    Instruction {
        mnemonic: String,
        size: usize,
    },
    Data {
        #[serde(default)]
        values: Vec<u8>,
        #[serde(default)]
        size: Option<usize>,
    },
    Variable(usize),
    Binary(String),
}

impl LayoutFile {
    pub fn load(path: &Path) -> Result<Self, Error> {
        let file = File::open(path)?;
        Ok(serde_yaml::from_reader(BufReader::new(file))?)
    }

    pub fn parse(text: &str) -> Result<Self, Error> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Declare every section and entry into a new layout.
    ///
    /// `dir` is the directory of the layout file, `base` the project
    /// directory for `/`-rooted includes. Each section header and entry
    /// takes the next source index of its file.
    pub fn build(&self, dir: &Path, base: &Path) -> Result<Layout, Error> {
        let mut layout = Layout::new(base);
        for decl in &self.files {
            let file = SourceFile::new(&decl.name, dir.join(&decl.name));
            let mut index = 0;
            for (name, sdecl) in &decl.sections {
                let section = Section::bind(
                    &file.name,
                    name,
                    index,
                    &sdecl.region,
                    sdecl.bank,
                    sdecl.offset,
                )?;
                index += 1;
                let id = layout.declare(section);
                for entry in &sdecl.entries {
                    match entry.to_data() {
                        Some(data) => {
                            if let Some(section) = layout.section_mut(id) {
                                section.append(data, index)?;
                            }
                        }
                        None => {
                            if let EntryDecl::Binary(src) = entry {
                                layout.include(&file, id, src, index)?;
                            }
                        }
                    }
                    index += 1;
                }
            }
            debug!(file = %decl.name, sections = decl.sections.len(), "declared file");
        }
        Ok(layout)
    }
}

impl EntryDecl {
    /// In-memory entry payload; binary includes need the loader instead.
    fn to_data(&self) -> Option<EntryData> {
        match self {
            EntryDecl::Label(name) => Some(EntryData::label(name)),
            EntryDecl::Instruction { mnemonic, size } => Some(EntryData::Instruction(Instruction {
                mnemonic: mnemonic.clone(),
                size: *size,
            })),
            EntryDecl::Data { values, size } => Some(EntryData::Data(DataBlock {
                values: values.clone(),
                size: size.unwrap_or(values.len()).max(values.len()),
            })),
            EntryDecl::Variable(size) => Some(EntryData::Variable(Variable { size: *size })),
            EntryDecl::Binary(_) => None,
        }
    }
}
