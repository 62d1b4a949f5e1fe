mod binary;
mod config;
mod dump;
mod entry;
mod error;
mod layout;
mod overlap;
mod section;
mod source;

pub use binary::{resolve_path, Binary};
pub use config::{EntryDecl, FileDecl, LayoutFile, SectionDecl};
pub use dump::{EntryDump, SectionDump};
pub use entry::{Address, DataBlock, Entry, EntryData, EntryId, Frame, Instruction, Label, Variable};
pub use error::{BankError, Error, Violation};
pub use gbarch::{hex, Region, Storage};
pub use layout::{Layout, SectionId};
pub use overlap::check_overlaps;
pub use section::{MacroCall, Section};
pub use source::SourceFile;
