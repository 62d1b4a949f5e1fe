use crate::error::Error;
use crate::section::Section;
use gbarch::Region;
use indexmap::IndexMap;

#[derive(Debug, Clone)]
struct Span {
    begin: usize,
    end: usize,
    name: Option<String>, // None means free
}

impl Span {
    fn new(begin: usize, end: usize, name: Option<String>) -> Self {
        Self { begin, end, name }
    }

    fn overlaps(&self, begin: usize, end: usize) -> bool {
        begin <= self.end && end >= self.begin
    }

    fn contains(&self, begin: usize, end: usize) -> bool {
        begin >= self.begin && end <= self.end
    }

    fn split(&self, begin: usize, end: usize, name: &str) -> Vec<Self> {
        let mut result = Vec::new();

        // Leading span
        if begin > self.begin {
            result.push(Span::new(self.begin, begin - 1, None));
        }

        result.push(Span::new(begin, end, Some(name.to_string())));

        // Tailing span
        if end < self.end {
            result.push(Span::new(end + 1, self.end, None));
        }

        result
    }
}

/// Occupancy map of one bank window, inclusive bounds
struct Occupancy {
    region: Region,
    bank: usize,
    map: Vec<Span>,
}

impl Occupancy {
    fn new(region: Region, bank: usize) -> Self {
        let (low, high) = region.def().window(bank);
        Self {
            region,
            bank,
            map: vec![Span::new(low, high, None)],
        }
    }

    fn claim(&mut self, begin: usize, size: usize, name: &str) -> Result<(), Error> {
        let end = begin + size - 1;
        let conflict = |other: &str| Error::SectionOverlap {
            section: name.to_string(),
            other: other.to_string(),
            region: self.region,
            bank: self.bank,
            begin,
            end,
        };

        if let Some(other) = self
            .map
            .iter()
            .filter(|span| span.overlaps(begin, end))
            .find_map(|span| span.name.as_deref())
        {
            return Err(conflict(other));
        }

        // Resolution keeps every section inside its window
        if let Some(i) = self.map.iter().position(|span| span.contains(begin, end)) {
            let parts = self.map[i].split(begin, end, name);
            self.map.splice(i..=i, parts);
        }
        Ok(())
    }
}

/// Report the first pair of resolved sections sharing bytes in the same
/// region and bank. Unresolved and empty sections are skipped.
pub fn check_overlaps<'a>(sections: impl IntoIterator<Item = &'a Section>) -> Result<(), Error> {
    let mut banks: IndexMap<(Region, usize), Occupancy> = IndexMap::new();
    for section in sections {
        let size = match section.size() {
            Some(size) if size > 0 => size,
            _ => continue,
        };
        banks
            .entry((section.region(), section.bank()))
            .or_insert_with(|| Occupancy::new(section.region(), section.bank()))
            .claim(section.resolved_offset(), size, section.name())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{DataBlock, EntryData};

    fn section(name: &str, region: &str, bank: Option<i64>, offset: Option<usize>, size: usize) -> Section {
        let mut s = Section::bind("main.gbc", name, 0, region, bank, offset).unwrap();
        if size > 0 {
            s.append(EntryData::Data(DataBlock::reserve(size)), 1).unwrap();
        }
        s.resolve().unwrap();
        s
    }

    #[test]
    fn test_disjoint() {
        let sections = vec![
            section("Header", "ROM0", None, Some(0x100), 0x50),
            section("Main", "ROM0", None, Some(0x150), 0x100),
            section("Vectors", "ROM0", None, None, 0x40),
        ];
        assert!(check_overlaps(&sections).is_ok());
    }

    #[test]
    fn test_overlap() {
        let sections = vec![
            section("Header", "ROM0", None, Some(0x100), 0x50),
            section("Main", "ROM0", None, Some(0x140), 0x100),
        ];
        match check_overlaps(&sections) {
            Err(Error::SectionOverlap {
                section,
                other,
                begin,
                end,
                ..
            }) => {
                assert_eq!(section, "Main");
                assert_eq!(other, "Header");
                assert_eq!(begin, 0x140);
                assert_eq!(end, 0x23F);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_other_bank_or_region() {
        let sections = vec![
            section("A", "ROMX", Some(1), None, 0x10),
            section("B", "ROMX", Some(2), None, 0x10),
            section("C", "RAM", None, None, 0x10),
            section("D", "RAMX", Some(1), None, 0x10),
        ];
        assert!(check_overlaps(&sections).is_ok());
    }

    #[test]
    fn test_empty_sections_never_collide() {
        let sections = vec![
            section("A", "WRAM0", None, None, 0),
            section("B", "WRAM0", None, None, 0x20),
            section("C", "WRAM0", None, None, 0),
        ];
        assert!(check_overlaps(&sections).is_ok());
    }
}
