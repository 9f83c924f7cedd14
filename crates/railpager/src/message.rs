//! Telegram classification and field extraction

use std::collections::BTreeSet;
use std::convert::TryFrom;
use std::fmt;

use thiserror::Error;

use crate::route;

/// A decoded telegram
///
/// Telegrams are classified by the address marker they
/// contain. Two kinds of telegram are understood:
///
/// * [`Geolocation`](ParsedMessage::Geolocation): the position
///   of a vehicle and the name of the route it is running on
/// * [`Status`](ParsedMessage::Status): train number, speed,
///   and mileage post
///
/// Anything else is passed through as
/// [`Unknown`](ParsedMessage::Unknown).
///
/// ```
/// use railpager::ParsedMessage;
///
/// let msg = railpager::decode("1234000\r\nABC123 80 4521\r\n").unwrap();
/// match &msg {
///     ParsedMessage::Status(st) => {
///         assert_eq!("ABC123", st.train_no());
///         assert_eq!("80", st.speed());
///         assert_eq!("4521", st.mileage());
///     }
///     _ => unreachable!(),
/// }
/// assert_eq!(Some(0.0), msg.latitude());
/// ```
#[derive(Clone, Debug, PartialEq, strum_macros::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ParsedMessage {
    /// Vehicle position report
    Geolocation(GeoReport),

    /// Train number, speed, and mileage
    Status(TrainStatus),

    /// Unrecognized telegram, carrying the original text
    Unknown(String),
}

/// Error decoding a telegram
///
/// A telegram which carries a recognized marker but cannot
/// be split into its fields is malformed. Malformed telegrams
/// are reported once and discarded.
#[derive(Error, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TelegramDecodeErr {
    /// Telegram is shorter than its fixed field layout
    #[error("malformed telegram: {actual} bytes is shorter than the {needed} required")]
    TooShort {
        /// Minimum length in bytes
        needed: usize,

        /// Length of the telegram in bytes
        actual: usize,
    },

    /// Status telegram does not contain all of its fields
    #[error("malformed telegram: expected 3 status fields, found {found}")]
    MissingFields {
        /// Number of fields found
        found: usize,
    },

    /// A coordinate field is not a number
    #[error("malformed telegram: invalid coordinate \"{0}\"")]
    InvalidCoordinate(String),

    /// A fixed-offset field does not fall on character boundaries
    #[error("malformed telegram: field boundaries split a character")]
    Malformed,
}

/// Decode a telegram
///
/// Classifies `text` by its address marker and extracts the
/// fields for that kind of telegram. `text` is usually the
/// payload of a `[MSG]` line: the ten-digit address, a space,
/// and the telegram body.
///
/// Unrecognized telegrams are not an error; they are returned
/// as [`ParsedMessage::Unknown`]. An error is returned if the
/// telegram is recognized but malformed.
pub fn decode(text: &str) -> Result<ParsedMessage, TelegramDecodeErr> {
    if text.contains(MARKER_GEOLOCATION) {
        Ok(ParsedMessage::Geolocation(GeoReport::new(text)?))
    } else if let Some(pos) = text.find(MARKER_STATUS) {
        Ok(ParsedMessage::Status(TrainStatus::new(
            &text[pos + MARKER_STATUS.len()..],
        )?))
    } else {
        Ok(ParsedMessage::Unknown(text.to_owned()))
    }
}

impl ParsedMessage {
    /// Short name of the telegram kind
    ///
    /// One of `geolocation`, `status`, or `unknown`.
    pub fn kind_str(&self) -> &'static str {
        self.into()
    }

    /// Latitude, in decimal degrees
    ///
    /// Status telegrams do not carry a position and report
    /// `0.0`. Unknown telegrams report `None`.
    pub fn latitude(&self) -> Option<f64> {
        match self {
            Self::Geolocation(geo) => Some(geo.latitude()),
            Self::Status(_) => Some(0.0),
            Self::Unknown(_) => None,
        }
    }

    /// Longitude, in decimal degrees
    ///
    /// Status telegrams do not carry a position and report
    /// `0.0`. Unknown telegrams report `None`.
    pub fn longitude(&self) -> Option<f64> {
        match self {
            Self::Geolocation(geo) => Some(geo.longitude()),
            Self::Status(_) => Some(0.0),
            Self::Unknown(_) => None,
        }
    }
}

/// Vehicle position and route
#[derive(Clone, Debug, PartialEq)]
pub struct GeoReport {
    vehicle_id: String,
    latitude: f64,
    longitude: f64,
    route_candidates: BTreeSet<Vec<u8>>,
}

impl GeoReport {
    /// Extract a position report from telegram `text`
    ///
    /// The fields sit at fixed byte offsets, so `text` must be
    /// at least 58 bytes long.
    pub fn new(text: &str) -> Result<Self, TelegramDecodeErr> {
        if text.len() < Self::MIN_LENGTH {
            return Err(TelegramDecodeErr::TooShort {
                needed: Self::MIN_LENGTH,
                actual: text.len(),
            });
        }

        let vehicle_id = field(text, Self::OFFSET_VEHICLE, Self::LEN_VEHICLE)?;
        let route_raw = field(text, Self::OFFSET_ROUTE, Self::LEN_ROUTE)?;
        let lon_raw = field(text, Self::OFFSET_LON, Self::LEN_LON)?;
        let lat_raw = field(text, Self::OFFSET_LAT, Self::LEN_LAT)?;

        Ok(Self {
            vehicle_id: vehicle_id.to_owned(),
            latitude: splice_degrees(lat_raw, 2)?,
            longitude: splice_degrees(lon_raw, 3)?,
            route_candidates: route::decode_route(route_raw),
        })
    }

    /// Vehicle identifier (eight characters)
    pub fn vehicle_id(&self) -> &str {
        &self.vehicle_id
    }

    /// Latitude, in decimal degrees
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude, in decimal degrees
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Possible encodings of the route name
    ///
    /// Each candidate is double-byte text in some unknown
    /// bit and nibble order. Every candidate contains at least
    /// one [lead byte](crate::route::LEAD_BYTE_MIN). The set
    /// may be empty.
    pub fn route_candidates(&self) -> &BTreeSet<Vec<u8>> {
        &self.route_candidates
    }

    /// First route name candidate, if any
    pub fn first_route(&self) -> Option<&[u8]> {
        self.route_candidates.iter().next().map(|c| c.as_slice())
    }

    /// Route name candidates which render as GB2312 text
    ///
    /// Usually there is exactly one. Candidates which are not
    /// [legible](crate::route::route_text) are skipped. The
    /// result follows candidate order.
    pub fn route_texts(&self) -> Vec<String> {
        self.route_candidates
            .iter()
            .filter_map(|cand| route::route_text(cand))
            .collect()
    }

    const MIN_LENGTH: usize = 58;
    const OFFSET_VEHICLE: usize = 15;
    const LEN_VEHICLE: usize = 8;
    const OFFSET_ROUTE: usize = 25;
    const LEN_ROUTE: usize = 14;
    const OFFSET_LON: usize = 41;
    const LEN_LON: usize = 9;
    const OFFSET_LAT: usize = 50;
    const LEN_LAT: usize = 8;
}

/// Train number, speed, and mileage post
///
/// All three fields are reported verbatim.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TrainStatus {
    train_no: String,
    speed: String,
    mileage: String,
}

impl TrainStatus {
    /// Extract status fields from the text after the marker
    ///
    /// Line breaks are removed, and the remainder is split on
    /// whitespace. The first three fields are the train number,
    /// speed, and mileage. Extra fields are ignored.
    pub fn new(fields: &str) -> Result<Self, TelegramDecodeErr> {
        let joined: String = fields.chars().filter(|&c| c != '\r' && c != '\n').collect();
        let mut tokens = joined.split_whitespace();

        match (tokens.next(), tokens.next(), tokens.next()) {
            (Some(train_no), Some(speed), Some(mileage)) => Ok(Self {
                train_no: train_no.to_owned(),
                speed: speed.to_owned(),
                mileage: mileage.to_owned(),
            }),
            (first, second, _) => Err(TelegramDecodeErr::MissingFields {
                found: first.is_some() as usize + second.is_some() as usize,
            }),
        }
    }

    /// Train number
    pub fn train_no(&self) -> &str {
        &self.train_no
    }

    /// Speed (km/h)
    pub fn speed(&self) -> &str {
        &self.speed
    }

    /// Mileage post (km)
    pub fn mileage(&self) -> &str {
        &self.mileage
    }
}

impl fmt::Display for ParsedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Geolocation(geo) => geo.fmt(f),
            Self::Status(st) => st.fmt(f),
            Self::Unknown(raw) => write!(f, "unknown: {}", raw.escape_debug()),
        }
    }
}

impl fmt::Display for GeoReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "vehicle {} at {:.6}, {:.6} route",
            self.vehicle_id, self.latitude, self.longitude
        )?;
        if self.route_candidates.is_empty() {
            return f.write_str(" -");
        }

        let texts = self.route_texts();
        if !texts.is_empty() {
            return write!(f, " {}", texts.join(" / "));
        }

        for cand in &self.route_candidates {
            f.write_str(" ")?;
            for byte in cand {
                write!(f, "{:02X}", byte)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for TrainStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "train {} speed {} km/h mileage {} km",
            self.train_no, self.speed, self.mileage
        )
    }
}

impl TryFrom<&str> for ParsedMessage {
    type Error = TelegramDecodeErr;

    #[inline]
    fn try_from(inp: &str) -> Result<Self, Self::Error> {
        decode(inp)
    }
}

impl TryFrom<String> for ParsedMessage {
    type Error = TelegramDecodeErr;

    #[inline]
    fn try_from(inp: String) -> Result<Self, Self::Error> {
        if inp.contains(MARKER_GEOLOCATION) || inp.contains(MARKER_STATUS) {
            decode(&inp)
        } else {
            Ok(ParsedMessage::Unknown(inp))
        }
    }
}

const MARKER_GEOLOCATION: &str = "1234002";
const MARKER_STATUS: &str = "1234000";

// Slice a fixed-offset field out of the telegram
//
// The caller checks the overall length. Offsets are in bytes,
// so a multi-byte character can still straddle a boundary.
fn field(text: &str, offset: usize, len: usize) -> Result<&str, TelegramDecodeErr> {
    text.get(offset..offset + len)
        .ok_or(TelegramDecodeErr::Malformed)
}

// Splice a decimal point into a coordinate field
//
// The first `degree_digits` characters are the whole degrees
// and the rest is the fraction: "12345678" → 12.345678. This
// is a textual splice. No minutes conversion is performed.
fn splice_degrees(raw: &str, degree_digits: usize) -> Result<f64, TelegramDecodeErr> {
    let invalid = || TelegramDecodeErr::InvalidCoordinate(raw.to_owned());

    let whole = raw.get(..degree_digits).ok_or_else(invalid)?;
    let fraction = raw.get(degree_digits..).ok_or_else(invalid)?;
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !fraction.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(invalid());
    }

    format!("{}.{}", whole, fraction)
        .parse()
        .map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;

    use assert_approx_eq::assert_approx_eq;

    // lay out a geolocation telegram the way it appears in a
    // [MSG] line payload
    fn geo_text(vehicle: &str, route: &str, lon: &str, lat: &str) -> String {
        let mut out = String::from("0001234002 0000");
        out.push_str(vehicle);
        out.push_str("20");
        out.push_str(route);
        out.push_str("00");
        out.push_str(lon);
        out.push_str(lat);
        out
    }

    #[test]
    fn test_field() {
        assert_eq!(Ok("cde"), field("abcdefg", 2, 3));
        assert_eq!(Err(TelegramDecodeErr::Malformed), field("abc", 2, 3));
        assert_eq!(Err(TelegramDecodeErr::Malformed), field("a车b", 2, 1));
    }

    #[test]
    fn test_splice_degrees() {
        assert_approx_eq!(splice_degrees("12345678", 2).unwrap(), 12.345678f64);
        assert_approx_eq!(splice_degrees("114305678", 3).unwrap(), 114.305678f64);
        assert_approx_eq!(splice_degrees("00000000", 2).unwrap(), 0.0f64);
        assert_eq!(
            Err(TelegramDecodeErr::InvalidCoordinate("12U45678".to_owned())),
            splice_degrees("12U45678", 2)
        );
        assert_eq!(
            Err(TelegramDecodeErr::InvalidCoordinate("1 345678".to_owned())),
            splice_degrees("1 345678", 2)
        );
    }

    #[test]
    fn test_geolocation() {
        let text = geo_text("12345678", ".U.U.U.U.U.U.U", "114305678", "12345678");
        assert_eq!(text.len(), 58);

        let msg = decode(&text).expect("bad msg");
        assert_eq!(msg.kind_str(), "geolocation");
        assert_approx_eq!(msg.latitude().unwrap(), 12.345678f64);
        assert_approx_eq!(msg.longitude().unwrap(), 114.305678f64);

        let geo = match msg {
            ParsedMessage::Geolocation(geo) => geo,
            _ => unreachable!(),
        };
        assert_eq!(geo.vehicle_id(), "12345678");
        assert_eq!(geo.route_candidates().len(), 3);
        assert_eq!(geo.first_route(), Some(&[0xABu8; 7][..]));
        assert!(geo.route_candidates().contains(&vec![0xBA; 7]));
        assert!(geo.route_candidates().contains(&vec![0xD5; 7]));
        for cand in geo.route_candidates() {
            assert!(route::has_lead_byte(cand));
        }
    }

    #[test]
    fn test_geolocation_route_text() {
        let text = geo_text("12345678", "U).9UU.6 (-(20", "114305678", "12345678");
        let geo = match decode(&text).expect("bad msg") {
            ParsedMessage::Geolocation(geo) => geo,
            _ => unreachable!(),
        };

        assert_eq!(geo.route_texts(), vec!["京沪线".to_owned()]);
        assert_eq!(
            format!("{}", geo),
            "vehicle 12345678 at 12.345678, 114.305678 route 京沪线"
        );

        // no legible candidate: hex
        let text = geo_text("12345678", ".U.U.U.U.U.U.U", "114305678", "12345678");
        let msg = decode(&text).expect("bad msg");
        assert_eq!(
            format!("{}", msg),
            "vehicle 12345678 at 12.345678, 114.305678 route \
             ABABABABABABAB BABABABABABABA D5D5D5D5D5D5D5"
        );
    }

    #[test]
    fn test_geolocation_trailing_data() {
        let mut text = geo_text("00000001", "00000000000000", "000000000", "00000000");
        text.push_str("\r\nextra");

        let geo = match decode(&text).expect("bad msg") {
            ParsedMessage::Geolocation(geo) => geo,
            _ => unreachable!(),
        };
        assert_eq!(geo.vehicle_id(), "00000001");
        assert!(geo.route_candidates().is_empty());
        assert!(geo.first_route().is_none());
        assert_eq!(
            format!("{}", geo),
            "vehicle 00000001 at 0.000000, 0.000000 route -"
        );
    }

    #[test]
    fn test_geolocation_malformed() {
        let text = geo_text("12345678", ".U.U.U.U.U.U.U", "114305678", "1234567");
        assert_eq!(
            Err(TelegramDecodeErr::TooShort {
                needed: 58,
                actual: 57
            }),
            decode(&text)
        );

        assert_eq!(
            Err(TelegramDecodeErr::TooShort {
                needed: 58,
                actual: 7
            }),
            decode("1234002")
        );

        // multi-byte character straddles the vehicle id
        let text = format!("0001234002 000车{}", "0".repeat(50));
        assert!(text.len() >= 58);
        assert_eq!(Err(TelegramDecodeErr::Malformed), decode(&text));

        let text = geo_text("12345678", ".U.U.U.U.U.U.U", "114305678", "1234567U");
        assert_eq!(
            Err(TelegramDecodeErr::InvalidCoordinate("1234567U".to_owned())),
            decode(&text)
        );
    }

    #[test]
    fn test_status() {
        let msg = decode("1234000\r\nABC123 80 4521\r\n").expect("bad msg");
        assert_eq!(msg.kind_str(), "status");
        assert_eq!(msg.latitude(), Some(0.0));
        assert_eq!(msg.longitude(), Some(0.0));
        match &msg {
            ParsedMessage::Status(st) => {
                assert_eq!(st.train_no(), "ABC123");
                assert_eq!(st.speed(), "80");
                assert_eq!(st.mileage(), "4521");
            }
            _ => unreachable!(),
        }
        assert_eq!(format!("{}", msg), "train ABC123 speed 80 km/h mileage 4521 km");

        // [MSG] payload form decodes identically
        assert_eq!(msg, decode("0001234000 ABC123 80 4521").expect("bad msg"));

        // extra fields are ignored
        let msg = decode("0001234000 K1 120 1002.5 garbage").expect("bad msg");
        match &msg {
            ParsedMessage::Status(st) => assert_eq!(st.mileage(), "1002.5"),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_status_line_breaks_are_removed() {
        // CR/LF removal joins the pieces of a split token
        let msg = decode("1234000 AB\r\nC 5 6").expect("bad msg");
        match &msg {
            ParsedMessage::Status(st) => assert_eq!(st.train_no(), "ABC"),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_status_malformed() {
        assert_eq!(
            Err(TelegramDecodeErr::MissingFields { found: 2 }),
            decode("1234000\r\nABC123 80\r\n")
        );
        assert_eq!(
            Err(TelegramDecodeErr::MissingFields { found: 0 }),
            decode("0001234000 \r\n")
        );
    }

    #[test]
    fn test_unknown() {
        let msg = decode("0001234008 hello\r\n").expect("bad msg");
        assert_eq!(msg, ParsedMessage::Unknown("0001234008 hello\r\n".to_owned()));
        assert_eq!(msg.kind_str(), "unknown");
        assert_eq!(msg.latitude(), None);
        assert_eq!(format!("{}", msg), "unknown: 0001234008 hello\\r\\n");

        assert_eq!(
            ParsedMessage::try_from(String::new()),
            Ok(ParsedMessage::Unknown(String::new()))
        );
    }

    #[test]
    fn test_geolocation_marker_wins() {
        let text = geo_text("1234000X", "00000000000000", "000000000", "00000000");
        assert!(text.contains(MARKER_STATUS));
        assert_eq!(decode(&text).expect("bad msg").kind_str(), "geolocation");
    }

    #[test]
    fn test_try_from() {
        let text = geo_text("12345678", ".U.U.U.U.U.U.U", "114305678", "12345678");
        assert_eq!(
            ParsedMessage::try_from(text.as_str()),
            ParsedMessage::try_from(text.clone())
        );
        assert!(ParsedMessage::try_from("1234000 A").is_err());
    }
}
