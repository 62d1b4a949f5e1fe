use color_print::cprintln;
use gbarch::Region;
use std::path::PathBuf;
use thiserror::Error;

fn hex(value: &usize) -> String {
    gbarch::hex(*value)
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BankError {
    #[error("Unexpected bank index on non-bankable section")]
    NonBankable,

    #[error("Negative bank indexes are not allowed")]
    Negative,

    #[error("Invalid bank index, must be between 1 and {0}")]
    OutOfRange(usize),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Violation {
    #[error("Instruction is not allowed in RAM segment")]
    Instruction,

    #[error("Initialized DataBlock not allowed in RAM segment")]
    InitializedData,

    #[error("Binary include not allowed in RAM segment")]
    Binary,

    #[error("Variable can not be put in ROM segment")]
    Variable,
}

// Unified error type for the linker
#[derive(Debug, Error)]
pub enum Error {
    // Binding errors
    #[error("Unknown section region `{name}`, expected one of {expected}")]
    UnknownRegion {
        file: String,
        index: usize,
        name: String,
        expected: String,
    },

    #[error("{reason}")]
    InvalidBank {
        file: String,
        index: usize,
        #[source]
        reason: BankError,
    },

    #[error("Section offset out of range, must be between {} and {}", hex(.low), hex(.high))]
    OffsetOutOfRange {
        file: String,
        index: usize,
        low: usize,
        high: usize,
    },

    // Placement errors
    #[error("{violation}")]
    IllegalContent {
        file: String,
        index: usize,
        #[source]
        violation: Violation,
    },

    #[error(
        "Entry exceeds section by {} bytes, section ranges from address {} to {}, but entry would end at address {}.",
        hex(.overflow), hex(.start), hex(.end), hex(.reached)
    )]
    SectionOverflow {
        file: String,
        index: usize,
        overflow: usize,
        start: usize,
        end: usize,
        reached: usize,
    },

    #[error("Failed to include binary data `{}`", .path.display())]
    Include {
        file: String,
        index: usize,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Validation errors
    #[error("Address conflict: {section} at {}-{} overlaps with {other} in {region}[{bank}]", hex(.begin), hex(.end))]
    SectionOverlap {
        section: String,
        other: String,
        region: Region,
        bank: usize,
        begin: usize,
        end: usize,
    },

    // Driver errors
    #[error("Section #{0} is not part of this layout")]
    SectionNotFound(usize),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid layout file: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("Failed to write dump: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn unknown_region(file: &str, index: usize, name: &str) -> Self {
        Error::UnknownRegion {
            file: file.to_string(),
            index,
            name: name.to_string(),
            expected: Region::names().join(", "),
        }
    }

    /// Originating source file and source index, if the error has one
    pub fn location(&self) -> Option<(&str, usize)> {
        match self {
            Error::UnknownRegion { file, index, .. }
            | Error::InvalidBank { file, index, .. }
            | Error::OffsetOutOfRange { file, index, .. }
            | Error::IllegalContent { file, index, .. }
            | Error::SectionOverflow { file, index, .. }
            | Error::Include { file, index, .. } => Some((file.as_str(), *index)),
            Error::SectionOverlap { .. }
            | Error::SectionNotFound(_)
            | Error::Io(_)
            | Error::Config(_)
            | Error::Json(_) => None,
        }
    }

    /// Print error with the file and source index it originates from
    pub fn print_diag(&self) {
        cprintln!("<red,bold>error</>: {}", self);
        if let Error::Include { source, .. } = self {
            cprintln!("      <blue>=</> <bold>cause</>: {}", source);
        }
        if let Some((file, index)) = self.location() {
            cprintln!("     <blue>--></> <underline>{}:#{}</>", file, index);
        }
    }
}
