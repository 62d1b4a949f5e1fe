pub mod region;

pub use region::{Banking, Region, RegionDef, Storage};

/// Render an address as `$XXXX`.
pub fn hex(value: usize) -> String {
    format!("${:04X}", value)
}

#[cfg(test)]
mod tests {
    use super::hex;

    #[test]
    fn test_hex() {
        assert_eq!(hex(0), "$0000");
        assert_eq!(hex(0x4a), "$004A");
        assert_eq!(hex(0xFF80), "$FF80");
        assert_eq!(hex(0x10048), "$10048");
    }
}
