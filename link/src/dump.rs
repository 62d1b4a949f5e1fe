use crate::entry::{Entry, EntryData, Frame};
use crate::section::Section;
use gbarch::Region;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Snapshot of a section as consumed by the map, symbol and JSON writers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename = "Section", rename_all = "camelCase")]
pub struct SectionDump {
    pub file: String,
    pub name: String,
    pub region: Region,
    pub bank: usize,
    pub start: usize,
    pub end: usize,
    pub offset: usize,
    pub bank_offset: usize,
    pub writeable: bool,
    pub entries: Vec<EntryDump>,
}

/// Entry snapshot. Every offset is physical, label offsets included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum EntryDump {
    Label {
        name: String,
        offset: Option<usize>,
        size: usize,
    },
    Instruction {
        mnemonic: String,
        offset: Option<usize>,
        size: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
    DataBlock {
        values: Vec<u8>,
        offset: Option<usize>,
        size: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
    Variable {
        offset: Option<usize>,
        size: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
    Binary {
        src: PathBuf,
        offset: Option<usize>,
        size: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
}

impl EntryDump {
    pub fn offset(&self) -> Option<usize> {
        match self {
            EntryDump::Label { offset, .. }
            | EntryDump::Instruction { offset, .. }
            | EntryDump::DataBlock { offset, .. }
            | EntryDump::Variable { offset, .. }
            | EntryDump::Binary { offset, .. } => *offset,
        }
    }
}

impl Section {
    pub fn dump(&self) -> SectionDump {
        SectionDump {
            file: self.file().to_string(),
            name: self.name().to_string(),
            region: self.region(),
            bank: self.bank(),
            start: self.start_offset(),
            end: self.end_offset(),
            offset: self.resolved_offset(),
            bank_offset: self.bank_offset(),
            writeable: self.is_read_write(),
            entries: self.entries().iter().map(|e| self.dump_entry(e)).collect(),
        }
    }

    fn dump_entry(&self, entry: &Entry) -> EntryDump {
        let offset = entry.offset(Frame::Physical, self.bank_offset());
        let size = entry.size();
        let label = self.label_of(entry.id()).and_then(|l| match l.data() {
            EntryData::Label(label) => Some(label.name.clone()),
            _ => None,
        });
        match entry.data() {
            EntryData::Label(l) => EntryDump::Label {
                name: l.name.clone(),
                offset,
                size,
            },
            EntryData::Instruction(inst) => EntryDump::Instruction {
                mnemonic: inst.mnemonic.clone(),
                offset,
                size,
                label,
            },
            EntryData::Data(block) => EntryDump::DataBlock {
                values: block.values.clone(),
                offset,
                size,
                label,
            },
            EntryData::Variable(_) => EntryDump::Variable {
                offset,
                size,
                label,
            },
            EntryData::Binary(bin) => EntryDump::Binary {
                src: bin.src().to_path_buf(),
                offset,
                size,
                label,
            },
        }
    }
}
