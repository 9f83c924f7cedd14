//! Numeric telegram alphabet
//!
//! Pager telegrams in numeric mode carry one of seventeen
//! symbols per character. Fields which really carry binary
//! data, like the route name, are recovered by mapping each
//! symbol back to its position in the alphabet.

use phf::phf_map;

/// The numeric alphabet, in code order
///
/// The position of each character is its code. The sixteen
/// printable symbols are followed by a NUL, which some
/// demodulators leave in the telegram body. NUL maps to code
/// `16` and is the only code that does not fit in a nibble.
pub const NUMERIC_ALPHABET: &str = "0123456789.U -)(\0";

// position of each symbol in NUMERIC_ALPHABET
static CODEBOOK: phf::Map<char, u8> = phf_map! {
    '0' => 0,
    '1' => 1,
    '2' => 2,
    '3' => 3,
    '4' => 4,
    '5' => 5,
    '6' => 6,
    '7' => 7,
    '8' => 8,
    '9' => 9,
    '.' => 10,
    'U' => 11,
    ' ' => 12,
    '-' => 13,
    ')' => 14,
    '(' => 15,
    '\0' => 16,
};

/// Code for a single character
///
/// Returns the position of `ch` in the
/// [numeric alphabet](NUMERIC_ALPHABET), or `None` if `ch`
/// is not part of it.
///
/// ```
/// use railpager::alphabet::code_of;
///
/// assert_eq!(Some(0), code_of('0'));
/// assert_eq!(Some(11), code_of('U'));
/// assert_eq!(None, code_of('Z'));
/// ```
pub fn code_of(ch: char) -> Option<u8> {
    CODEBOOK.get(&ch).copied()
}

/// Map a numeric field to alphabet codes
///
/// Each character of `field` is replaced by its code.
/// Characters outside the alphabet are dropped, not
/// replaced, so the output may be shorter than the input.
///
/// ```
/// use railpager::alphabet::to_codes;
///
/// assert_eq!(vec![1, 11, 12, 15], to_codes("1U ("));
/// assert_eq!(vec![4, 2], to_codes("4x2\r\n"));
/// ```
pub fn to_codes(field: &str) -> Vec<u8> {
    field.chars().filter_map(code_of).collect()
}
