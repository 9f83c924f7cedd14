//! Route name candidate decoding
//!
//! The route name in a geolocation telegram is double-byte
//! text that was squeezed through the numeric alphabet. Each
//! alphabet code carries one nibble, but the transmitter's bit
//! order within a nibble and nibble order within a byte are
//! not known. We try all four orderings and keep the byte
//! strings which could plausibly be double-byte text.
//!
//! Route names are GB2312. [`route_text()`] renders a candidate
//! when it is well-formed GB2312 with at least one ideograph.

use std::collections::BTreeSet;
use std::fmt;

use encoding_rs::GBK;
use log::trace;
use strum::IntoEnumIterator;

use crate::alphabet;

/// Smallest lead byte of a double-byte character
///
/// A candidate must contain at least one byte at or above
/// this value to be considered text.
pub const LEAD_BYTE_MIN: u8 = 0xA1;

// GB2312 row and cell ranges
const GB2312_LEAD: std::ops::RangeInclusive<u8> = 0xA1..=0xF7;
const GB2312_TRAIL: std::ops::RangeInclusive<u8> = 0xA1..=0xFE;

// CJK unified ideographs
const IDEOGRAPHS: std::ops::RangeInclusive<char> = '\u{4e00}'..='\u{9fff}';

/// Bit order within each nibble
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, strum_macros::EnumIter)]
pub enum BitOrder {
    /// Codes are used as-is
    Normal,

    /// The four bits of each code are mirrored with [`reverse4()`]
    Reversed,
}

/// Order of the two nibbles which make up a byte
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, strum_macros::EnumIter)]
pub enum NibbleOrder {
    /// The first code of each pair is the high nibble
    HighFirst,

    /// The first code of each pair is the low nibble
    LowFirst,
}

/// One way of packing alphabet codes into bytes
///
/// There are exactly four packing orders, which are
/// enumerated by [`PackingOrder::all()`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PackingOrder {
    /// Bit order within each nibble
    pub bits: BitOrder,

    /// Nibble order within each byte
    pub nibbles: NibbleOrder,
}

impl PackingOrder {
    /// Create a packing order
    pub const fn new(bits: BitOrder, nibbles: NibbleOrder) -> Self {
        Self { bits, nibbles }
    }

    /// Iterate over every packing order
    ///
    /// ```
    /// use railpager::route::PackingOrder;
    ///
    /// assert_eq!(4, PackingOrder::all().count());
    /// ```
    pub fn all() -> impl Iterator<Item = PackingOrder> {
        BitOrder::iter()
            .flat_map(|bits| NibbleOrder::iter().map(move |nibbles| Self::new(bits, nibbles)))
    }

    /// Pack alphabet codes into bytes
    ///
    /// Consumes `codes` two at a time. A trailing unpaired
    /// code is dropped. Codes above `0xf` are not masked;
    /// the packed value is truncated to eight bits.
    pub fn pack(&self, codes: &[u8]) -> Vec<u8> {
        codes
            .chunks_exact(2)
            .map(|pair| self.pack_pair(pair[0], pair[1]))
            .collect()
    }

    #[inline]
    fn pack_pair(&self, first: u8, second: u8) -> u8 {
        let (n0, n1) = match self.bits {
            BitOrder::Normal => (first as u32, second as u32),
            BitOrder::Reversed => (reverse4(first) as u32, reverse4(second) as u32),
        };

        let packed = match self.nibbles {
            NibbleOrder::HighFirst => (n0 << 4) | n1,
            NibbleOrder::LowFirst => (n1 << 4) | n0,
        };
        packed as u8
    }
}

impl fmt::Display for PackingOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} bits, {:?} nibbles", self.bits, self.nibbles)
    }
}

/// Mirror the low four bits of `x`
///
/// Bit `i` moves to bit `3 - i`. Bits above the low nibble
/// are discarded. For every nibble, `reverse4(reverse4(x)) == x`.
///
/// ```
/// use railpager::route::reverse4;
///
/// assert_eq!(0b1000, reverse4(0b0001));
/// assert_eq!(0b0101, reverse4(0b1010));
/// ```
#[inline]
pub fn reverse4(x: u8) -> u8 {
    (0..4).fold(0u8, |r, i| r | (((x >> i) & 1) << (3 - i)))
}

/// True if `bytes` contains a plausible lead byte
pub fn has_lead_byte(bytes: &[u8]) -> bool {
    bytes.iter().any(|&b| b >= LEAD_BYTE_MIN)
}

/// Route name candidates from alphabet codes
///
/// Packs `codes` with every [`PackingOrder`] and keeps the
/// results which contain a [lead byte](LEAD_BYTE_MIN).
/// Duplicates are merged, so zero to four candidates are
/// returned, in lexicographic order.
///
/// ```
/// use railpager::route::route_candidates;
///
/// // ".U"
/// let candidates: Vec<Vec<u8>> = route_candidates(&[10, 11]).into_iter().collect();
/// assert_eq!(candidates, vec![vec![0xABu8], vec![0xBA], vec![0xD5]]);
/// ```
pub fn route_candidates(codes: &[u8]) -> BTreeSet<Vec<u8>> {
    PackingOrder::all()
        .map(|order| {
            let bytes = order.pack(codes);
            trace!("route packed with {}: {:02X?}", order, bytes);
            bytes
        })
        .filter(|bytes| has_lead_byte(bytes))
        .collect()
}

/// Route name candidates from a numeric field
///
/// Maps `field` through the [numeric alphabet](crate::alphabet)
/// and then computes [`route_candidates()`].
pub fn decode_route(field: &str) -> BTreeSet<Vec<u8>> {
    route_candidates(&alphabet::to_codes(field))
}

/// Render a route name candidate as text
///
/// Returns `None` unless `candidate` is well-formed GB2312:
/// every byte above `0x7f` must be a lead byte followed by a
/// trail byte. Text without a CJK ideograph is also rejected,
/// since a wrong packing order still tends to produce valid
/// symbols. Leading and trailing whitespace is removed.
///
/// ```
/// use railpager::route::route_text;
///
/// assert_eq!(Some("京沪线".to_owned()), route_text(&[0xBE, 0xA9, 0xBB, 0xA6, 0xCF, 0xDF, 0x20]));
/// assert_eq!(None, route_text(&[0xAB, 0xAB]));
/// assert_eq!(None, route_text(&[0xBE]));
/// ```
pub fn route_text(candidate: &[u8]) -> Option<String> {
    if !is_gb2312(candidate) {
        return None;
    }

    let text = GBK.decode_without_bom_handling_and_without_replacement(candidate)?;
    let text = text.trim();
    if text.chars().any(|c| IDEOGRAPHS.contains(&c)) {
        Some(text.to_owned())
    } else {
        None
    }
}

// True if every double-byte unit falls in the GB2312 code space
fn is_gb2312(bytes: &[u8]) -> bool {
    let mut iter = bytes.iter();
    while let Some(b) = iter.next() {
        if b.is_ascii() {
            continue;
        }
        match iter.next() {
            Some(trail) if GB2312_LEAD.contains(b) && GB2312_TRAIL.contains(trail) => {}
            _ => return false,
        }
    }
    true
}
