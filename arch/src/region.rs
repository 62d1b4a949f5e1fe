use num_enum::{IntoPrimitive, TryFromPrimitive};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Memory regions of the target's address map.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    IntoPrimitive,
    TryFromPrimitive,
    EnumString,
    EnumIter,
    IntoStaticStr,
    Display,
)]
#[repr(u8)]
pub enum Region {
    /// Fixed program storage
    ROM0,
    /// Switchable program storage
    ROMX,
    /// Fixed working RAM
    WRAM0,
    /// Switchable working RAM
    WRAMX,
    /// High RAM
    HRAM,
    /// Cartridge RAM
    RAM,
    /// Switchable cartridge RAM
    RAMX,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Storage {
    ReadOnly,
    ReadWrite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Banking {
    /// Distance between two consecutive banks in the flattened image
    pub bank_size: usize,
    /// Highest selectable bank, inclusive
    pub max_bank: usize,
    /// Every bank is addressed through the same CPU window
    pub zero_banked: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionDef {
    pub base: usize,
    pub size: usize,
    pub storage: Storage,
    pub banking: Option<Banking>,
}

const ROM0: RegionDef = RegionDef {
    base: 0x0000,
    size: 0x4000,
    storage: Storage::ReadOnly,
    banking: None,
};

const ROMX: RegionDef = RegionDef {
    base: 0x4000,
    size: 0x4000,
    storage: Storage::ReadOnly,
    banking: Some(Banking {
        bank_size: 0x4000,
        max_bank: 127,
        zero_banked: false,
    }),
};

const WRAM0: RegionDef = RegionDef {
    base: 0xC000,
    size: 0x1000,
    storage: Storage::ReadWrite,
    banking: None,
};

const WRAMX: RegionDef = RegionDef {
    base: 0xD000,
    size: 0x1000,
    storage: Storage::ReadWrite,
    banking: Some(Banking {
        bank_size: 0x0000,
        max_bank: 1,
        zero_banked: false,
    }),
};

const HRAM: RegionDef = RegionDef {
    base: 0xFF80,
    size: 0x0080,
    storage: Storage::ReadWrite,
    banking: None,
};

const RAM: RegionDef = RegionDef {
    base: 0xA000,
    size: 0x2000,
    storage: Storage::ReadWrite,
    banking: None,
};

const RAMX: RegionDef = RegionDef {
    base: 0xA000,
    size: 0x2000,
    storage: Storage::ReadWrite,
    banking: Some(Banking {
        bank_size: 0x2000,
        max_bank: 7,
        zero_banked: true,
    }),
};

static NAMES: Lazy<Vec<&'static str>> = Lazy::new(|| {
    let mut names: Vec<&'static str> = Region::iter().map(|r| r.into()).collect();
    names.sort_unstable();
    names
});

impl Region {
    /// Exact, case sensitive lookup.
    pub fn lookup(name: &str) -> Option<Self> {
        name.parse::<Self>().ok()
    }

    /// All region names in alphabetical order.
    pub fn names() -> &'static [&'static str] {
        &NAMES
    }

    pub fn name(self) -> &'static str {
        self.into()
    }

    pub fn def(self) -> &'static RegionDef {
        match self {
            Region::ROM0 => &ROM0,
            Region::ROMX => &ROMX,
            Region::WRAM0 => &WRAM0,
            Region::WRAMX => &WRAMX,
            Region::HRAM => &HRAM,
            Region::RAM => &RAM,
            Region::RAMX => &RAMX,
        }
    }
}

impl RegionDef {
    pub fn is_banked(&self) -> bool {
        self.banking.is_some()
    }

    pub fn is_read_write(&self) -> bool {
        self.storage == Storage::ReadWrite
    }

    pub fn max_bank(&self) -> usize {
        self.banking.map_or(0, |b| b.max_bank)
    }

    /// Bank used when a section does not name one.
    pub fn default_bank(&self) -> usize {
        if self.is_banked() {
            1
        } else {
            0
        }
    }

    /// Physical window `[low, high]` of one bank.
    ///
    /// Bank 0 is the unbanked window at `base`. Bank `n > 0` is placed
    /// `(n - 1)` bank sizes past `base` in the flattened image. The upper
    /// bound is exclusive for entries but a section may start on it.
    pub fn window(&self, bank: usize) -> (usize, usize) {
        let low = match (bank, self.banking) {
            (0, _) | (_, None) => self.base,
            (n, Some(b)) => self.base + (n - 1) * b.bank_size,
        };
        (low, low + self.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_sorted() {
        assert_eq!(
            Region::names(),
            &["HRAM", "RAM", "RAMX", "ROM0", "ROMX", "WRAM0", "WRAMX"]
        );
    }

    #[test]
    fn test_lookup() {
        assert_eq!(Region::lookup("ROMX"), Some(Region::ROMX));
        assert_eq!(Region::lookup("romx"), None);
        assert_eq!(Region::lookup("VRAM"), None);
        assert_eq!(Region::HRAM.to_string(), "HRAM");
    }

    #[test]
    fn test_index() {
        assert_eq!(u8::from(Region::ROM0), 0);
        assert_eq!(u8::from(Region::RAMX), 6);
        assert_eq!(Region::try_from(3u8).ok(), Some(Region::WRAMX));
        assert!(Region::try_from(7u8).is_err());
    }

    macro_rules! test_window {
        ($($name:ident: $region:expr, $bank:expr => $window:expr,)*) => {
            $(
                #[test]
                fn $name() {
                    assert_eq!($region.def().window($bank), $window);
                }
            )*
        }
    }

    test_window! {
        window_rom0: Region::ROM0, 0 => (0x0000, 0x4000),
        window_romx_1: Region::ROMX, 1 => (0x4000, 0x8000),
        window_romx_2: Region::ROMX, 2 => (0x8000, 0xC000),
        window_romx_127: Region::ROMX, 127 => (0x1FC000, 0x200000),
        window_wramx_1: Region::WRAMX, 1 => (0xD000, 0xE000),
        window_hram: Region::HRAM, 0 => (0xFF80, 0x10000),
        window_ramx_3: Region::RAMX, 3 => (0xE000, 0x10000),
    }

    #[test]
    fn test_geometry() {
        assert!(Region::ROMX.def().is_banked());
        assert!(!Region::ROM0.def().is_read_write());
        assert!(Region::WRAM0.def().is_read_write());
        assert_eq!(Region::ROMX.def().max_bank(), 127);
        assert_eq!(Region::HRAM.def().max_bank(), 0);
        assert_eq!(Region::RAMX.def().default_bank(), 1);
        assert_eq!(Region::RAM.def().default_bank(), 0);
        assert!(Region::RAMX.def().banking.is_some_and(|b| b.zero_banked));
        assert!(Region::ROMX.def().banking.is_some_and(|b| !b.zero_banked));
    }
}
