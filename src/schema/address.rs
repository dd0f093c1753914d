/// Virtual address arithmetic and the text forms the tutorial shows players.
///
/// Addresses are split into a virtual page number (high bits) and a page
/// offset (low bits). The VPN has the same width as the offset, so the
/// default 4-bit offset gives 8-bit addresses.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("empty input")]
    Empty,
    #[error("'{0}' is not a hex, binary or decimal number")]
    Invalid(String),
}

/// Bit layout of a virtual address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressLayout {
    pub offset_bits: u32,
}

impl Default for AddressLayout {
    fn default() -> Self {
        Self { offset_bits: 4 }
    }
}

impl AddressLayout {
    pub fn new(offset_bits: u32) -> Self {
        Self {
            offset_bits: offset_bits.clamp(1, 16),
        }
    }

    /// Width of a whole address: VPN plus offset.
    pub fn address_bits(&self) -> u32 {
        self.offset_bits * 2
    }

    pub fn split(&self, value: u64) -> AddressSplit {
        let mask = (1u64 << self.offset_bits) - 1;
        AddressSplit {
            value,
            vpn: value >> self.offset_bits,
            offset: value & mask,
            layout: *self,
        }
    }
}

/// A virtual address broken into its VPN and offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressSplit {
    pub value: u64,
    pub vpn: u64,
    pub offset: u64,
    layout: AddressLayout,
}

impl AddressSplit {
    pub fn binary(&self) -> String {
        format_nibbles(self.value, self.layout.address_bits())
    }

    pub fn vpn_binary(&self) -> String {
        format_nibbles(self.vpn, self.layout.offset_bits)
    }

    pub fn offset_binary(&self) -> String {
        format_nibbles(self.offset, self.layout.offset_bits)
    }

    pub fn hex(&self) -> String {
        format_hex(self.value)
    }

    pub fn vpn_hex(&self) -> String {
        format_hex(self.vpn)
    }

    pub fn offset_hex(&self) -> String {
        format_hex(self.offset)
    }

    /// One-line summary shown by the calculator.
    pub fn summary(&self) -> String {
        format!(
            "Binary={}, VPN={} ({}), Offset={} ({})",
            self.binary(),
            self.vpn_binary(),
            self.vpn_hex(),
            self.offset_binary(),
            self.offset_hex()
        )
    }
}

/// Render `value` in binary, zero-padded to at least `min_bits` and to a
/// multiple of four, with a single space between nibbles.
pub fn format_nibbles(value: u64, min_bits: u32) -> String {
    let raw = format!("{:b}", value);
    let width = raw.len().max(min_bits as usize);
    let width = width.div_ceil(4) * 4;
    let padded = format!("{:0>width$}", raw, width = width);

    let mut out = String::with_capacity(width + width / 4);
    for (i, ch) in padded.chars().enumerate() {
        if i > 0 && i % 4 == 0 {
            out.push(' ');
        }
        out.push(ch);
    }
    out
}

/// Upper-case hex with a `0x` prefix.
pub fn format_hex(value: u64) -> String {
    format!("0x{:X}", value)
}

/// Parse what a player types into the calculator.
///
/// Accepted forms, in order: `0x` hex, `0b` binary, a run of at least four
/// 0/1 digits as binary, bare hex digits, then decimal. Spaces and
/// underscores are ignored so nibble-grouped input works.
pub fn parse_number(input: &str) -> Result<u64, AddressError> {
    let cleaned: String = input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .collect();
    if cleaned.is_empty() {
        return Err(AddressError::Empty);
    }
    let invalid = || AddressError::Invalid(input.trim().to_string());
    let lower = cleaned.to_ascii_lowercase();

    if let Some(hex) = lower.strip_prefix("0x") {
        return u64::from_str_radix(hex, 16).map_err(|_| invalid());
    }
    if let Some(bin) = lower.strip_prefix("0b") {
        return u64::from_str_radix(bin, 2).map_err(|_| invalid());
    }
    if lower.len() >= 4 && lower.chars().all(|c| c == '0' || c == '1') {
        return u64::from_str_radix(&lower, 2).map_err(|_| invalid());
    }
    if lower.chars().all(|c| c.is_ascii_hexdigit()) {
        return u64::from_str_radix(&lower, 16).map_err(|_| invalid());
    }
    lower.parse::<u64>().map_err(|_| invalid())
}

/// Parse a hex literal such as `0x5` leniently, for frame numbers kept in
/// player vars.
pub fn parse_hex_var(value: &str) -> Option<u64> {
    let trimmed = value.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    u64::from_str_radix(digits, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_0x5c() {
        let split = AddressLayout::default().split(0x5C);
        assert_eq!(split.vpn_binary(), "0101");
        assert_eq!(split.offset_binary(), "1100");
        assert_eq!(split.vpn_hex(), "0x5");
        assert_eq!(split.offset_hex(), "0xC");
        assert_eq!(split.binary(), "0101 1100");
    }

    #[test]
    fn nibbles_pad_to_multiple_of_four() {
        assert_eq!(format_nibbles(0b101, 0), "0101");
        assert_eq!(format_nibbles(0x2A, 8), "0010 1010");
        assert_eq!(format_nibbles(0x1FF, 8), "0001 1111 1111");
        assert_eq!(format_nibbles(0, 4), "0000");
    }

    #[test]
    fn hex_is_upper_case_with_prefix() {
        assert_eq!(format_hex(0xab), "0xAB");
        assert_eq!(format_hex(0), "0x0");
    }

    #[test]
    fn wider_layout_splits_on_offset_bits() {
        let split = AddressLayout::new(6).split(0b1010_1100_1111);
        assert_eq!(split.offset, 0b00_1111);
        assert_eq!(split.vpn, 0b10_1011);
        assert_eq!(split.binary(), "1010 1100 1111");
    }

    #[test]
    fn parse_number_forms() {
        assert_eq!(parse_number("0x5C"), Ok(0x5C));
        assert_eq!(parse_number("0b0101"), Ok(5));
        assert_eq!(parse_number("0101 1100"), Ok(0x5C));
        assert_eq!(parse_number("5c"), Ok(0x5C));
        assert_eq!(parse_number("  "), Err(AddressError::Empty));
        assert!(matches!(parse_number("zz"), Err(AddressError::Invalid(_))));
    }

    #[test]
    fn short_binary_looking_input_is_hex() {
        assert_eq!(parse_number("10"), Ok(0x10));
    }

    #[test]
    fn summary_line() {
        let split = AddressLayout::default().split(0x2A);
        assert_eq!(
            split.summary(),
            "Binary=0010 1010, VPN=0010 (0x2), Offset=1010 (0xA)"
        );
    }

    #[test]
    fn hex_var_parsing() {
        assert_eq!(parse_hex_var("0x5"), Some(5));
        assert_eq!(parse_hex_var("6"), Some(6));
        assert_eq!(parse_hex_var("N/A"), None);
    }
}
