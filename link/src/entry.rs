use crate::binary::Binary;
use serde::{Deserialize, Serialize};

/// Stable handle of an entry inside its section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryId(pub(crate) usize);

/// Address frame an offset is expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame {
    /// What the CPU sees through the region's window
    Cpu,
    /// Position in the flattened image, bank placement included
    Physical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Address {
    pub frame: Frame,
    pub value: usize,
}

impl Address {
    pub fn cpu(value: usize) -> Self {
        Self {
            frame: Frame::Cpu,
            value,
        }
    }

    pub fn physical(value: usize) -> Self {
        Self {
            frame: Frame::Physical,
            value,
        }
    }

    /// Convert into `frame`, `physical = cpu + bank_offset`.
    pub fn to(self, frame: Frame, bank_offset: usize) -> Option<usize> {
        match (self.frame, frame) {
            (Frame::Cpu, Frame::Cpu) | (Frame::Physical, Frame::Physical) => Some(self.value),
            (Frame::Cpu, Frame::Physical) => self.value.checked_add(bank_offset),
            (Frame::Physical, Frame::Cpu) => self.value.checked_sub(bank_offset),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub name: String,
}

/// Instruction with an already encoded length
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub mnemonic: String,
    pub size: usize,
}

/// Data block, zero padded up to `size`
#[derive(Debug, Clone, PartialEq)]
pub struct DataBlock {
    pub values: Vec<u8>,
    pub size: usize,
}

impl DataBlock {
    pub fn new(values: Vec<u8>) -> Self {
        let size = values.len();
        Self { values, size }
    }

    /// Uninitialized storage of `size` bytes
    pub fn reserve(size: usize) -> Self {
        Self {
            values: vec![],
            size,
        }
    }

    pub fn is_initialized(&self) -> bool {
        !self.values.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub size: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntryData {
    Label(Label),
    Instruction(Instruction),
    Data(DataBlock),
    Variable(Variable),
    Binary(Binary),
}

impl EntryData {
    pub fn label(name: &str) -> Self {
        EntryData::Label(Label {
            name: name.to_string(),
        })
    }

    pub fn instruction(mnemonic: &str, size: usize) -> Self {
        EntryData::Instruction(Instruction {
            mnemonic: mnemonic.to_string(),
            size,
        })
    }

    pub fn variable(size: usize) -> Self {
        EntryData::Variable(Variable { size })
    }

    pub fn size(&self) -> usize {
        match self {
            EntryData::Label(_) => 0,
            EntryData::Instruction(inst) => inst.size,
            EntryData::Data(data) => data.size,
            EntryData::Variable(var) => var.size,
            EntryData::Binary(bin) => bin.size(),
        }
    }
}

/// One placed unit of a section
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub(crate) id: EntryId,
    pub(crate) data: EntryData,
    pub(crate) index: usize,
    pub(crate) address: Option<Address>,
    pub(crate) label: Option<EntryId>,
}

impl Entry {
    pub(crate) fn new(id: EntryId, data: EntryData, index: usize) -> Self {
        Self {
            id,
            data,
            index,
            address: None,
            label: None,
        }
    }

    pub fn id(&self) -> EntryId {
        self.id
    }

    pub fn data(&self) -> &EntryData {
        &self.data
    }

    pub fn size(&self) -> usize {
        self.data.size()
    }

    /// Source index used for diagnostics
    pub fn index(&self) -> usize {
        self.index
    }

    /// Label placed directly in front of this entry
    pub fn associated_label(&self) -> Option<EntryId> {
        self.label
    }

    /// Assigned address in the frame it was stored in, `None` before resolution
    pub fn address(&self) -> Option<Address> {
        self.address
    }

    pub fn offset(&self, frame: Frame, bank_offset: usize) -> Option<usize> {
        self.address.and_then(|addr| addr.to(frame, bank_offset))
    }
}
