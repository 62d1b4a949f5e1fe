use crate::entry::{Address, Entry, EntryData, EntryId, Frame};
use crate::error::{BankError, Error, Violation};
use gbarch::{hex, Region, Storage};
use tracing::debug;

/// Macro call waiting for expansion inside a section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroCall {
    pub name: String,
    pub index: usize,
    /// Entry position the expansion is spliced in at
    pub position: usize,
}

#[derive(Debug, Clone)]
pub struct Section {
    file: String,
    name: String,
    name_index: usize,
    region: Region,
    bank: usize,
    declared: Option<usize>,
    resolved: usize,
    bank_offset: usize,
    start: usize,
    end: usize,
    storage: Storage,
    size: Option<usize>,
    entries: Vec<Entry>,
    macros: Vec<MacroCall>,
    next_id: usize,
}

/// Content policy of a storage class
fn violation(storage: Storage, data: &EntryData) -> Option<Violation> {
    match (storage, data) {
        (Storage::ReadWrite, EntryData::Instruction(_)) => Some(Violation::Instruction),
        (Storage::ReadWrite, EntryData::Data(block)) if block.is_initialized() => {
            Some(Violation::InitializedData)
        }
        (Storage::ReadWrite, EntryData::Binary(_)) => Some(Violation::Binary),
        (Storage::ReadWrite, EntryData::Label(_) | EntryData::Data(_) | EntryData::Variable(_)) => {
            None
        }
        (Storage::ReadOnly, EntryData::Variable(_)) => Some(Violation::Variable),
        (
            Storage::ReadOnly,
            EntryData::Label(_) | EntryData::Instruction(_) | EntryData::Data(_) | EntryData::Binary(_),
        ) => None,
    }
}

impl Section {
    /// Bind a declared section to a region, validating bank and offset.
    ///
    /// `bank` defaults to 1 on banked regions and 0 elsewhere. Without a
    /// declared offset the section starts at the bottom of its bank window.
    pub fn bind(
        file: &str,
        name: &str,
        name_index: usize,
        region: &str,
        bank: Option<i64>,
        offset: Option<usize>,
    ) -> Result<Self, Error> {
        let region =
            Region::lookup(region).ok_or_else(|| Error::unknown_region(file, name_index, region))?;
        let def = region.def();

        let invalid = |reason| Error::InvalidBank {
            file: file.to_string(),
            index: name_index,
            reason,
        };
        let bank = bank.unwrap_or(def.default_bank() as i64);
        if bank > 0 && !def.is_banked() {
            return Err(invalid(BankError::NonBankable));
        } else if bank < 0 {
            return Err(invalid(BankError::Negative));
        } else if def.is_banked() && (bank < 1 || bank as usize > def.max_bank()) {
            return Err(invalid(BankError::OutOfRange(def.max_bank())));
        }
        let bank = bank as usize;

        let (low, high) = def.window(bank);
        let resolved = match offset {
            None => low,
            Some(offset) if (low..=high).contains(&offset) => offset,
            Some(_) => {
                return Err(Error::OffsetOutOfRange {
                    file: file.to_string(),
                    index: name_index,
                    low,
                    high,
                })
            }
        };

        let section = Self {
            file: file.to_string(),
            name: name.to_string(),
            name_index,
            region,
            bank,
            declared: offset,
            resolved,
            bank_offset: low - def.base,
            start: low,
            end: high,
            storage: def.storage,
            size: None,
            entries: vec![],
            macros: vec![],
            next_id: 0,
        };
        debug!(section = %section.summary(Frame::Physical), "bound section");
        Ok(section)
    }

    fn check(&self, data: &EntryData, index: usize) -> Result<(), Error> {
        match violation(self.storage, data) {
            Some(violation) => Err(Error::IllegalContent {
                file: self.file.clone(),
                index,
                violation,
            }),
            None => Ok(()),
        }
    }

    fn make(&mut self, data: EntryData, index: usize) -> Result<Entry, Error> {
        self.check(&data, index)?;
        let id = EntryId(self.next_id);
        self.next_id += 1;
        self.size = None;
        Ok(Entry::new(id, data, index))
    }

    pub fn append(&mut self, data: EntryData, index: usize) -> Result<EntryId, Error> {
        let entry = self.make(data, index)?;
        let id = entry.id;
        self.entries.push(entry);
        Ok(id)
    }

    /// Splice an entry in before `position`; positions past the end append.
    pub fn insert_at(
        &mut self,
        data: EntryData,
        position: usize,
        index: usize,
    ) -> Result<EntryId, Error> {
        let entry = self.make(data, index)?;
        let id = entry.id;
        let position = position.min(self.entries.len());
        self.entries.insert(position, entry);
        Ok(id)
    }

    /// Remove an entry. Offsets are stale until the next `resolve`.
    pub fn remove(&mut self, id: EntryId) -> Option<Entry> {
        let position = self.entries.iter().position(|e| e.id == id)?;
        self.size = None;
        Some(self.entries.remove(position))
    }

    /// Assign offsets to all entries in order.
    ///
    /// Labels get the CPU visible address of the next placed byte, all other
    /// entries their physical address. Only the entry directly following a
    /// label is associated with it.
    pub fn resolve(&mut self) -> Result<usize, Error> {
        let mut running = self.resolved;
        let mut last_label = None;
        for entry in &mut self.entries {
            match entry.data {
                EntryData::Label(_) => {
                    entry.address = Some(Address::cpu(running - self.bank_offset));
                    last_label = Some(entry.id);
                }
                _ => {
                    entry.label = last_label.take();
                    entry.address = Some(Address::physical(running));
                    running = running.saturating_add(entry.size());
                    if running > self.end {
                        return Err(Error::SectionOverflow {
                            file: self.file.clone(),
                            index: entry.index,
                            overflow: running - self.end,
                            start: self.bank_offset,
                            end: self.end,
                            reached: running,
                        });
                    }
                }
            }
        }
        let size = running - self.resolved;
        self.size = Some(size);
        debug!(section = %self.summary(Frame::Physical), "resolved section");
        Ok(size)
    }

    /// `<name> in <region>[<bank>] at $XXXX-$YYYY`
    ///
    /// The physical frame shows the resolved placement, the CPU frame the
    /// bounds as seen through the bank window.
    pub fn summary(&self, frame: Frame) -> String {
        let begin = match frame {
            Frame::Physical => self.resolved,
            Frame::Cpu => self.resolved - self.bank_offset,
        };
        format!(
            "{} in {}[{}] at {}-{}",
            self.name,
            self.region,
            self.bank,
            hex(begin),
            hex(begin + self.size.unwrap_or(0))
        )
    }
}

impl Section {
    pub fn push_macro(&mut self, call: MacroCall) {
        self.macros.push(call);
    }

    pub fn macros(&self) -> &[MacroCall] {
        &self.macros
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn name_index(&self) -> usize {
        self.name_index
    }

    pub fn region(&self) -> Region {
        self.region
    }

    pub fn bank(&self) -> usize {
        self.bank
    }

    /// Offset given in the declaration, if any
    pub fn declared_offset(&self) -> Option<usize> {
        self.declared
    }

    /// Physical base of the section
    pub fn resolved_offset(&self) -> usize {
        self.resolved
    }

    pub fn bank_offset(&self) -> usize {
        self.bank_offset
    }

    pub fn start_offset(&self) -> usize {
        self.start
    }

    pub fn end_offset(&self) -> usize {
        self.end
    }

    pub fn is_read_write(&self) -> bool {
        self.storage == Storage::ReadWrite
    }

    /// Consumed bytes, `None` until resolved or after a later mutation
    pub fn size(&self) -> Option<usize> {
        self.size
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn entry(&self, id: EntryId) -> Option<&Entry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Label associated with the entry `id`
    pub fn label_of(&self, id: EntryId) -> Option<&Entry> {
        self.entry(id)
            .and_then(|e| e.label)
            .and_then(|label| self.entry(label))
    }

    pub fn cpu_offset(&self, id: EntryId) -> Option<usize> {
        self.entry(id)
            .and_then(|e| e.offset(Frame::Cpu, self.bank_offset))
    }

    pub fn physical_offset(&self, id: EntryId) -> Option<usize> {
        self.entry(id)
            .and_then(|e| e.offset(Frame::Physical, self.bank_offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::DataBlock;

    fn bind(region: &str, bank: Option<i64>, offset: Option<usize>) -> Result<Section, Error> {
        Section::bind("main.gbc", "Test", 0, region, bank, offset)
    }

    #[test]
    fn test_default_bank() {
        assert_eq!(bind("ROM0", None, None).unwrap().bank(), 0);
        assert_eq!(bind("ROMX", None, None).unwrap().bank(), 1);
        assert_eq!(bind("WRAMX", None, None).unwrap().bank(), 1);
        assert_eq!(bind("RAMX", None, None).unwrap().bank(), 1);
    }

    #[test]
    fn test_bank_errors() {
        let reason = |r: Result<Section, Error>| match r {
            Err(Error::InvalidBank { reason, .. }) => Some(reason),
            _ => None,
        };
        assert_eq!(reason(bind("ROMX", Some(128), None)), Some(BankError::OutOfRange(127)));
        assert_eq!(reason(bind("ROMX", Some(0), None)), Some(BankError::OutOfRange(127)));
        assert_eq!(reason(bind("WRAM0", Some(1), None)), Some(BankError::NonBankable));
        assert_eq!(reason(bind("ROMX", Some(-1), None)), Some(BankError::Negative));
        assert_eq!(reason(bind("HRAM", Some(-2), None)), Some(BankError::Negative));
        assert_eq!(reason(bind("RAMX", Some(8), None)), Some(BankError::OutOfRange(7)));
        assert!(bind("ROM0", Some(0), None).is_ok());
        assert!(bind("ROMX", Some(127), None).is_ok());
    }

    #[test]
    fn test_unknown_region() {
        assert!(matches!(
            bind("VRAM", None, None),
            Err(Error::UnknownRegion { name, .. }) if name == "VRAM"
        ));
    }

    #[test]
    fn test_default_offsets() {
        let s = bind("ROMX", Some(2), None).unwrap();
        assert_eq!(s.resolved_offset(), 0x8000);
        assert_eq!(s.bank_offset(), 0x4000);
        assert_eq!(s.start_offset(), 0x8000);
        assert_eq!(s.end_offset(), 0xC000);
        assert_eq!(s.declared_offset(), None);

        let s = bind("WRAMX", Some(1), None).unwrap();
        assert_eq!(s.resolved_offset(), 0xD000);
        assert_eq!(s.bank_offset(), 0);

        let s = bind("RAMX", Some(3), None).unwrap();
        assert_eq!(s.resolved_offset(), 0xE000);
        assert_eq!(s.bank_offset(), 0x4000);
        assert!(s.is_read_write());
    }

    #[test]
    fn test_declared_offsets() {
        let s = bind("ROM0", None, Some(0x0150)).unwrap();
        assert_eq!(s.resolved_offset(), 0x0150);
        assert_eq!(s.bank_offset(), 0);
        assert_eq!(s.start_offset(), 0x0000);
        assert_eq!(s.end_offset(), 0x4000);

        let s = bind("ROMX", Some(3), Some(0xC100)).unwrap();
        assert_eq!(s.resolved_offset(), 0xC100);
        assert_eq!(s.bank_offset(), 0x8000);
        assert_eq!(s.start_offset(), 0xC000);
        assert_eq!(s.end_offset(), 0x10000);

        // upper bound is inclusive
        assert!(bind("ROM0", None, Some(0x4000)).is_ok());
    }

    #[test]
    fn test_declared_offset_out_of_range() {
        assert!(matches!(
            bind("ROM0", None, Some(0x4001)),
            Err(Error::OffsetOutOfRange { low: 0x0000, high: 0x4000, .. })
        ));
        assert!(matches!(
            bind("ROMX", Some(2), Some(0x4000)),
            Err(Error::OffsetOutOfRange { low: 0x8000, high: 0xC000, .. })
        ));
        assert!(matches!(
            bind("HRAM", None, Some(0xFF00)),
            Err(Error::OffsetOutOfRange { .. })
        ));
    }

    macro_rules! test_policy {
        ($($name:ident: $region:expr, $data:expr => $violation:expr,)*) => {
            $(
                #[test]
                fn $name() {
                    let mut section = bind($region, None, None).unwrap();
                    let result = section.append($data, 1);
                    match $violation {
                        Some(expected) => {
                            assert!(matches!(
                                result,
                                Err(Error::IllegalContent { violation, .. }) if violation == expected
                            ));
                            assert!(section.entries().is_empty());
                        }
                        None => assert!(result.is_ok()),
                    }
                }
            )*
        }
    }

    test_policy! {
        policy_ram_instruction: "WRAM0", EntryData::instruction("nop", 1) => Some(Violation::Instruction),
        policy_ram_data: "HRAM", EntryData::Data(DataBlock::new(vec![1])) => Some(Violation::InitializedData),
        policy_ram_reserve: "HRAM", EntryData::Data(DataBlock::reserve(4)) => None::<Violation>,
        policy_ram_variable: "WRAMX", EntryData::variable(2) => None::<Violation>,
        policy_ram_label: "RAM", EntryData::label("buffer") => None::<Violation>,
        policy_rom_variable: "ROM0", EntryData::variable(1) => Some(Violation::Variable),
        policy_rom_instruction: "ROMX", EntryData::instruction("ret", 1) => None::<Violation>,
        policy_rom_data: "ROM0", EntryData::Data(DataBlock::new(vec![0xCE, 0xED])) => None::<Violation>,
    }

    #[test]
    fn test_insert_and_remove() {
        let mut s = bind("ROM0", None, None).unwrap();
        let a = s.append(EntryData::instruction("a", 1), 0).unwrap();
        let c = s.append(EntryData::instruction("c", 1), 2).unwrap();
        let b = s.insert_at(EntryData::instruction("b", 1), 1, 1).unwrap();
        let ids: Vec<_> = s.entries().iter().map(|e| e.id()).collect();
        assert_eq!(ids, vec![a, b, c]);

        let d = s.insert_at(EntryData::instruction("d", 1), 99, 3).unwrap();
        assert_eq!(s.entries().last().map(|e| e.id()), Some(d));

        assert!(s.remove(b).is_some());
        assert!(s.remove(b).is_none());
        let ids: Vec<_> = s.entries().iter().map(|e| e.id()).collect();
        assert_eq!(ids, vec![a, c, d]);
    }

    #[test]
    fn test_resolve_labels() {
        let mut s = bind("ROMX", Some(2), None).unwrap();
        let l = s.append(EntryData::label("start"), 0).unwrap();
        let a = s.append(EntryData::instruction("ld a, 1", 2), 1).unwrap();
        let b = s.append(EntryData::instruction("ret", 1), 2).unwrap();
        assert_eq!(s.resolve().unwrap(), 3);

        assert_eq!(s.cpu_offset(l), Some(0x4000));
        assert_eq!(s.physical_offset(l), Some(0x8000));
        assert_eq!(s.physical_offset(a), Some(0x8000));
        assert_eq!(s.physical_offset(b), Some(0x8002));
        assert_eq!(s.cpu_offset(b), Some(0x4002));
        assert_eq!(s.entry(a).and_then(|e| e.associated_label()), Some(l));
        assert_eq!(s.entry(b).and_then(|e| e.associated_label()), None);
        assert_eq!(s.label_of(a).map(|e| e.id()), Some(l));
        assert_eq!(s.size(), Some(3));
    }

    #[test]
    fn test_resolve_twice() {
        let mut s = bind("ROM0", None, Some(0x100)).unwrap();
        let a = s.append(EntryData::instruction("nop", 1), 0).unwrap();
        let b = s.append(EntryData::instruction("jp", 3), 1).unwrap();
        s.resolve().unwrap();
        assert_eq!(s.resolve().unwrap(), 4);
        assert_eq!(s.physical_offset(b), Some(0x101));

        s.remove(a);
        assert_eq!(s.size(), None);
        assert_eq!(s.resolve().unwrap(), 3);
        assert_eq!(s.physical_offset(b), Some(0x100));
    }

    #[test]
    fn test_overflow() {
        let mut s = bind("HRAM", None, None).unwrap();
        s.append(EntryData::Data(DataBlock::reserve(200)), 4).unwrap();
        match s.resolve() {
            Err(Error::SectionOverflow {
                index,
                overflow,
                start,
                end,
                reached,
                ..
            }) => {
                assert_eq!(index, 4);
                assert_eq!(overflow, 72);
                assert_eq!(start, 0);
                assert_eq!(end, 0x10000);
                assert_eq!(reached, 0x10048);
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(s.size(), None);
    }

    #[test]
    fn test_exact_fit() {
        let mut s = bind("HRAM", None, None).unwrap();
        s.append(EntryData::Data(DataBlock::reserve(0x80)), 0).unwrap();
        assert_eq!(s.resolve().unwrap(), 0x80);
    }

    #[test]
    fn test_macro_calls_are_kept() {
        let mut s = bind("ROM0", None, None).unwrap();
        s.append(EntryData::instruction("nop", 1), 1).unwrap();
        s.push_macro(MacroCall {
            name: "memcpy".to_string(),
            index: 2,
            position: 1,
        });
        assert_eq!(s.macros().len(), 1);
        let position = s.macros()[0].position;
        s.insert_at(EntryData::instruction("ld a, [hl+]", 1), position, 2)
            .unwrap();
        assert_eq!(s.resolve().unwrap(), 2);
    }

    #[test]
    fn test_summary() {
        let mut s = Section::bind("main.gbc", "Data", 0, "ROMX", Some(2), None).unwrap();
        s.append(EntryData::Data(DataBlock::new(vec![0; 0x10])), 0).unwrap();
        s.resolve().unwrap();
        assert_eq!(s.summary(Frame::Physical), "Data in ROMX[2] at $8000-$8010");
        assert_eq!(s.summary(Frame::Cpu), "Data in ROMX[2] at $4000-$4010");
    }
}
