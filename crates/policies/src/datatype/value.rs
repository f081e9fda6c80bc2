//! Typed values: parsing from lexical form, canonical equality, and the
//! total order used by the standard comparison functions.

use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use num_bigint::BigInt;
use num_traits::Num;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Datatype;

/// A lexical form that does not conform to its declared datatype's schema.
///
/// Surfaced by callers as `Indeterminate` with status code `syntax-error`
/// (`spec.md` §4.A, §7).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid lexical form for {datatype}: {lexical:?}")]
pub struct SyntaxError {
    pub datatype: Datatype,
    pub lexical: String,
}

/// An immutable value of a known XACML datatype.
///
/// Two values are equal only if both their datatype and their canonical
/// content agree; equality is datatype-specific (`spec.md` §4.A).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    Boolean(bool),
    #[serde(with = "bigint_decimal")]
    Integer(BigInt),
    Double(f64),
    String(String),
    Time(XsTime),
    Date(XsDate),
    DateTime(XsDateTime),
    DayTimeDuration(DayTimeDuration),
    YearMonthDuration(YearMonthDuration),
    AnyUri(String),
    HexBinary(Vec<u8>),
    Base64Binary(Vec<u8>),
    Rfc822Name(Rfc822Name),
    X500Name(X500Name),
    IpAddress(IpAddressValue),
    DnsName(DnsNameValue),
}

mod bigint_decimal {
    use num_bigint::BigInt;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &BigInt, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&v.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<BigInt, D::Error> {
        let s = String::deserialize(d)?;
        s.parse::<BigInt>().map_err(serde::de::Error::custom)
    }
}

impl Value {
    /// The datatype this value is tagged with.
    pub fn datatype(&self) -> Datatype {
        match self {
            Value::Boolean(_) => Datatype::Boolean,
            Value::Integer(_) => Datatype::Integer,
            Value::Double(_) => Datatype::Double,
            Value::String(_) => Datatype::String,
            Value::Time(_) => Datatype::Time,
            Value::Date(_) => Datatype::Date,
            Value::DateTime(_) => Datatype::DateTime,
            Value::DayTimeDuration(_) => Datatype::DayTimeDuration,
            Value::YearMonthDuration(_) => Datatype::YearMonthDuration,
            Value::AnyUri(_) => Datatype::AnyUri,
            Value::HexBinary(_) => Datatype::HexBinary,
            Value::Base64Binary(_) => Datatype::Base64Binary,
            Value::Rfc822Name(_) => Datatype::Rfc822Name,
            Value::X500Name(_) => Datatype::X500Name,
            Value::IpAddress(_) => Datatype::IpAddress,
            Value::DnsName(_) => Datatype::DnsName,
        }
    }

    /// Parse a lexical form into a value of the given datatype.
    pub fn parse(datatype: Datatype, lexical: &str) -> Result<Self, SyntaxError> {
        let err = || SyntaxError { datatype, lexical: lexical.to_string() };
        Ok(match datatype {
            Datatype::Boolean => Value::Boolean(match lexical {
                "true" | "1" => true,
                "false" | "0" => false,
                _ => return Err(err()),
            }),
            Datatype::Integer => {
                Value::Integer(BigInt::from_str_radix(lexical.trim(), 10).map_err(|_| err())?)
            }
            Datatype::Double => Value::Double(parse_xs_double(lexical).ok_or_else(err)?),
            Datatype::String => Value::String(lexical.to_string()),
            Datatype::Time => Value::Time(XsTime::parse(lexical).ok_or_else(err)?),
            Datatype::Date => Value::Date(XsDate::parse(lexical).ok_or_else(err)?),
            Datatype::DateTime => Value::DateTime(XsDateTime::parse(lexical).ok_or_else(err)?),
            Datatype::DayTimeDuration => {
                Value::DayTimeDuration(DayTimeDuration::parse(lexical).ok_or_else(err)?)
            }
            Datatype::YearMonthDuration => {
                Value::YearMonthDuration(YearMonthDuration::parse(lexical).ok_or_else(err)?)
            }
            Datatype::AnyUri => Value::AnyUri(lexical.to_string()),
            Datatype::HexBinary => {
                Value::HexBinary(hex::decode(lexical).map_err(|_| err())?)
            }
            Datatype::Base64Binary => Value::Base64Binary(
                base64::Engine::decode(&base64::engine::general_purpose::STANDARD, lexical)
                    .map_err(|_| err())?,
            ),
            Datatype::Rfc822Name => Value::Rfc822Name(Rfc822Name::parse(lexical).ok_or_else(err)?),
            Datatype::X500Name => Value::X500Name(X500Name::parse(lexical)),
            Datatype::IpAddress => {
                Value::IpAddress(IpAddressValue::parse(lexical).ok_or_else(err)?)
            }
            Datatype::DnsName => Value::DnsName(DnsNameValue::parse(lexical).ok_or_else(err)?),
        })
    }

    /// Serialise back to lexical form.
    pub fn to_lexical(&self) -> String {
        match self {
            Value::Boolean(b) => b.to_string(),
            Value::Integer(i) => i.to_string(),
            Value::Double(d) => format_xs_double(*d),
            Value::String(s) => s.clone(),
            Value::Time(t) => t.to_lexical(),
            Value::Date(d) => d.to_lexical(),
            Value::DateTime(dt) => dt.to_lexical(),
            Value::DayTimeDuration(d) => d.to_lexical(),
            Value::YearMonthDuration(d) => d.to_lexical(),
            Value::AnyUri(s) => s.clone(),
            Value::HexBinary(b) => hex::encode(b),
            Value::Base64Binary(b) => {
                base64::Engine::encode(&base64::engine::general_purpose::STANDARD, b)
            }
            Value::Rfc822Name(r) => format!("{}@{}", r.local, r.domain),
            Value::X500Name(x) => x.to_lexical(),
            Value::IpAddress(ip) => ip.to_lexical(),
            Value::DnsName(d) => d.to_lexical(),
        }
    }

    /// The total order used by `*-greater-than`/`*-less-than` functions, for
    /// datatypes that declare one (`Datatype::is_ordered`).
    pub fn partial_cmp_ordered(&self, other: &Value) -> Option<std::cmp::Ordering> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a.partial_cmp(b),
            (Value::Double(a), Value::Double(b)) => a.partial_cmp(b),
            (Value::Date(a), Value::Date(b)) => a.partial_cmp(b),
            (Value::Time(a), Value::Time(b)) => a.partial_cmp(b),
            (Value::DateTime(a), Value::DateTime(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Time(a), Value::Time(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::DayTimeDuration(a), Value::DayTimeDuration(b)) => a == b,
            (Value::YearMonthDuration(a), Value::YearMonthDuration(b)) => a == b,
            (Value::AnyUri(a), Value::AnyUri(b)) => a == b,
            (Value::HexBinary(a), Value::HexBinary(b)) => a == b,
            (Value::Base64Binary(a), Value::Base64Binary(b)) => a == b,
            (Value::Rfc822Name(a), Value::Rfc822Name(b)) => a == b,
            (Value::X500Name(a), Value::X500Name(b)) => a == b,
            (Value::IpAddress(a), Value::IpAddress(b)) => a == b,
            (Value::DnsName(a), Value::DnsName(b)) => a == b,
            _ => false,
        }
    }
}

fn parse_xs_double(s: &str) -> Option<f64> {
    match s {
        "NaN" => Some(f64::NAN),
        "INF" | "+INF" => Some(f64::INFINITY),
        "-INF" => Some(f64::NEG_INFINITY),
        _ => s.parse::<f64>().ok(),
    }
}

fn format_xs_double(d: f64) -> String {
    if d.is_nan() {
        "NaN".to_string()
    } else if d.is_infinite() {
        if d > 0.0 { "INF".to_string() } else { "-INF".to_string() }
    } else {
        let mut s = format!("{}", d);
        if !s.contains('.') && !s.contains('E') && !s.contains('e') {
            s.push_str(".0");
        }
        s
    }
}

/// `xs:time`: wall-clock time of day plus an optional UTC offset.
///
/// Both fields are retained (rather than normalising to UTC) so a value
/// round-trips through `to_lexical`/`parse` byte-for-byte.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct XsTime {
    pub naive: NaiveTime,
    pub offset_seconds: Option<i32>,
}

impl XsTime {
    pub fn parse(s: &str) -> Option<Self> {
        let (time_part, offset) = split_offset(s)?;
        let naive = NaiveTime::parse_from_str(time_part, "%H:%M:%S%.f").ok()?;
        Some(XsTime { naive, offset_seconds: offset })
    }

    pub fn to_lexical(&self) -> String {
        format!("{}{}", self.naive.format("%H:%M:%S%.f"), format_offset(self.offset_seconds))
    }

    fn instant_key(&self) -> (i64, i64) {
        let secs = self.naive.num_seconds_from_midnight() as i64 - self.offset_seconds.unwrap_or(0) as i64;
        (secs, self.naive.nanosecond() as i64)
    }
}

use chrono::Timelike;

impl PartialEq for XsTime {
    fn eq(&self, other: &Self) -> bool {
        match (self.offset_seconds, other.offset_seconds) {
            (Some(_), Some(_)) => self.instant_key() == other.instant_key(),
            (None, None) => self.naive == other.naive,
            _ => false,
        }
    }
}

impl PartialOrd for XsTime {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        match (self.offset_seconds, other.offset_seconds) {
            (Some(_), Some(_)) => self.instant_key().partial_cmp(&other.instant_key()),
            (None, None) => self.naive.partial_cmp(&other.naive),
            _ => None,
        }
    }
}

/// `xs:date`: calendar date plus an optional UTC offset.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct XsDate {
    pub naive: NaiveDate,
    pub offset_seconds: Option<i32>,
}

impl XsDate {
    pub fn parse(s: &str) -> Option<Self> {
        let (date_part, offset) = split_offset(s)?;
        let naive = NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()?;
        Some(XsDate { naive, offset_seconds: offset })
    }

    pub fn to_lexical(&self) -> String {
        format!("{}{}", self.naive.format("%Y-%m-%d"), format_offset(self.offset_seconds))
    }

    fn instant_key(&self) -> i64 {
        self.naive.and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp()
            - self.offset_seconds.unwrap_or(0) as i64
    }
}

impl PartialEq for XsDate {
    fn eq(&self, other: &Self) -> bool {
        match (self.offset_seconds, other.offset_seconds) {
            (Some(_), Some(_)) => self.instant_key() == other.instant_key(),
            (None, None) => self.naive == other.naive,
            _ => false,
        }
    }
}

impl PartialOrd for XsDate {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        match (self.offset_seconds, other.offset_seconds) {
            (Some(_), Some(_)) => self.instant_key().partial_cmp(&other.instant_key()),
            (None, None) => self.naive.partial_cmp(&other.naive),
            _ => None,
        }
    }
}

/// `xs:dateTime`: the full timestamp, as consulted by the frozen environment
/// clock (`spec.md` §3 invariant 2, §4.B).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct XsDateTime {
    pub naive: NaiveDateTime,
    pub offset_seconds: Option<i32>,
}

impl XsDateTime {
    pub fn parse(s: &str) -> Option<Self> {
        let (dt_part, offset) = split_offset(s)?;
        let naive = NaiveDateTime::parse_from_str(dt_part, "%Y-%m-%dT%H:%M:%S%.f").ok()?;
        Some(XsDateTime { naive, offset_seconds: offset })
    }

    pub fn to_lexical(&self) -> String {
        format!(
            "{}{}",
            self.naive.format("%Y-%m-%dT%H:%M:%S%.f"),
            format_offset(self.offset_seconds)
        )
    }

    pub fn from_utc_now(now: chrono::DateTime<chrono::Utc>) -> Self {
        XsDateTime { naive: now.naive_utc(), offset_seconds: Some(0) }
    }

    fn instant_key(&self) -> i64 {
        self.naive.and_utc().timestamp() - self.offset_seconds.unwrap_or(0) as i64
    }
}

impl PartialEq for XsDateTime {
    fn eq(&self, other: &Self) -> bool {
        match (self.offset_seconds, other.offset_seconds) {
            (Some(_), Some(_)) => {
                self.instant_key() == other.instant_key()
                    && self.naive.and_utc().timestamp_subsec_nanos()
                        == other.naive.and_utc().timestamp_subsec_nanos()
            }
            (None, None) => self.naive == other.naive,
            _ => false,
        }
    }
}

impl PartialOrd for XsDateTime {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        match (self.offset_seconds, other.offset_seconds) {
            (Some(_), Some(_)) => self.instant_key().partial_cmp(&other.instant_key()),
            (None, None) => self.naive.partial_cmp(&other.naive),
            _ => None,
        }
    }
}

fn split_offset(s: &str) -> Option<(&str, Option<i32>)> {
    let s = s.trim();
    if let Some(stripped) = s.strip_suffix('Z') {
        return Some((stripped, Some(0)));
    }
    // Look for a trailing +HH:MM or -HH:MM, but not the leading '-' of a
    // BCE year or an internal date separator.
    if s.len() > 6 {
        let tail = &s[s.len() - 6..];
        let mut chars = tail.chars();
        let sign = chars.next();
        if matches!(sign, Some('+') | Some('-'))
            && tail.as_bytes()[3] == b':'
            && tail[1..3].chars().all(|c| c.is_ascii_digit())
            && tail[4..6].chars().all(|c| c.is_ascii_digit())
        {
            let hours: i32 = tail[1..3].parse().ok()?;
            let mins: i32 = tail[4..6].parse().ok()?;
            let total = (hours * 3600 + mins * 60) * if sign == Some('-') { -1 } else { 1 };
            return Some((&s[..s.len() - 6], Some(total)));
        }
    }
    Some((s, None))
}

fn format_offset(offset: Option<i32>) -> String {
    match offset {
        None => String::new(),
        Some(0) => "Z".to_string(),
        Some(secs) => {
            let sign = if secs < 0 { '-' } else { '+' };
            let secs = secs.abs();
            format!("{}{:02}:{:02}", sign, secs / 3600, (secs % 3600) / 60)
        }
    }
}

/// `xs:dayTimeDuration`: `[-]PnDTnHnMnS`, canonicalised so equal durations
/// compare equal regardless of which fields the lexical form spread them
/// across (e.g. `P1DT2H` vs `PT26H`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DayTimeDuration {
    pub negative: bool,
    pub total_seconds: f64,
}

impl DayTimeDuration {
    pub fn parse(s: &str) -> Option<Self> {
        let (negative, rest) = strip_sign(s);
        let rest = rest.strip_prefix('P')?;
        let (days_part, time_part) = rest.split_once('T').unwrap_or((rest, ""));
        let days = parse_component(days_part, 'D').unwrap_or(0.0);
        if !time_part.is_empty() || days_part.contains('D') || rest == "T" {
            let hours = parse_component(time_part, 'H').unwrap_or(0.0);
            let minutes = parse_component(time_part, 'M').unwrap_or(0.0);
            let seconds = parse_component(time_part, 'S').unwrap_or(0.0);
            let total = days * 86400.0 + hours * 3600.0 + minutes * 60.0 + seconds;
            return Some(DayTimeDuration { negative, total_seconds: total });
        }
        None
    }

    pub fn to_lexical(&self) -> String {
        let mut secs = self.total_seconds;
        let days = (secs / 86400.0).trunc();
        secs -= days * 86400.0;
        let hours = (secs / 3600.0).trunc();
        secs -= hours * 3600.0;
        let minutes = (secs / 60.0).trunc();
        secs -= minutes * 60.0;
        let mut out = String::new();
        if self.negative {
            out.push('-');
        }
        out.push('P');
        if days != 0.0 {
            out.push_str(&format!("{}D", days as i64));
        }
        if hours != 0.0 || minutes != 0.0 || secs != 0.0 {
            out.push('T');
            if hours != 0.0 {
                out.push_str(&format!("{}H", hours as i64));
            }
            if minutes != 0.0 {
                out.push_str(&format!("{}M", minutes as i64));
            }
            if secs != 0.0 || (days == 0.0 && hours == 0.0 && minutes == 0.0) {
                out.push_str(&format!("{}S", secs));
            }
        }
        if out == "P" {
            out.push_str("T0S");
        }
        out
    }

    pub fn signed_seconds(&self) -> f64 {
        if self.negative { -self.total_seconds } else { self.total_seconds }
    }
}

/// `xs:yearMonthDuration`: `[-]PnYnM`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearMonthDuration {
    pub negative: bool,
    pub total_months: i64,
}

impl YearMonthDuration {
    pub fn parse(s: &str) -> Option<Self> {
        let (negative, rest) = strip_sign(s);
        let rest = rest.strip_prefix('P')?;
        if rest.contains('T') {
            return None;
        }
        let years = parse_component(rest, 'Y').unwrap_or(0.0) as i64;
        let months = parse_component(rest, 'M').unwrap_or(0.0) as i64;
        Some(YearMonthDuration { negative, total_months: years * 12 + months })
    }

    pub fn to_lexical(&self) -> String {
        let years = self.total_months / 12;
        let months = self.total_months % 12;
        let mut out = String::new();
        if self.negative {
            out.push('-');
        }
        out.push('P');
        if years != 0 {
            out.push_str(&format!("{}Y", years));
        }
        if months != 0 || years == 0 {
            out.push_str(&format!("{}M", months));
        }
        out
    }

    pub fn signed_months(&self) -> i64 {
        if self.negative { -self.total_months } else { self.total_months }
    }
}

fn strip_sign(s: &str) -> (bool, &str) {
    match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    }
}

fn parse_component(s: &str, unit: char) -> Option<f64> {
    let idx = s.find(unit)?;
    let start = s[..idx]
        .rfind(|c: char| !c.is_ascii_digit() && c != '.')
        .map(|i| i + 1)
        .unwrap_or(0);
    s[start..idx].parse().ok()
}

/// `rfc822Name`: mailbox-style name. Local part is case-sensitive; domain
/// part is compared case-insensitively (`spec.md` §4.A).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rfc822Name {
    pub local: String,
    pub domain: String,
}

impl Rfc822Name {
    pub fn parse(s: &str) -> Option<Self> {
        let (local, domain) = s.rsplit_once('@')?;
        if local.is_empty() || domain.is_empty() {
            return None;
        }
        Some(Rfc822Name { local: local.to_string(), domain: domain.to_string() })
    }
}

impl PartialEq for Rfc822Name {
    fn eq(&self, other: &Self) -> bool {
        self.local == other.local && self.domain.eq_ignore_ascii_case(&other.domain)
    }
}

/// `x500Name`: an RDN sequence, compared in RDN-canonical form (components
/// trimmed of surrounding whitespace, compared in declared order).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct X500Name {
    rdns: Vec<String>,
}

impl X500Name {
    pub fn parse(s: &str) -> Self {
        let rdns = s.split(',').map(|rdn| canonicalize_rdn(rdn)).collect();
        X500Name { rdns }
    }

    pub fn to_lexical(&self) -> String {
        self.rdns.join(",")
    }
}

fn canonicalize_rdn(rdn: &str) -> String {
    match rdn.split_once('=') {
        Some((k, v)) => format!("{}={}", k.trim().to_uppercase(), v.trim()),
        None => rdn.trim().to_string(),
    }
}

impl PartialEq for X500Name {
    fn eq(&self, other: &Self) -> bool {
        self.rdns == other.rdns
    }
}

/// `ipAddress`: `address[/mask][:port[-port]]`. Equality compares the
/// network prefix (address masked by prefix length) and the port range,
/// not the raw address bits (`spec.md` §4.A).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum IpAddressValue {
    V4 { addr: Ipv4Addr, prefix: u8, port_range: Option<(u16, u16)> },
    V6 { addr: Ipv6Addr, prefix: u8, port_range: Option<(u16, u16)> },
}

impl IpAddressValue {
    pub fn parse(s: &str) -> Option<Self> {
        let (addr_mask, port_range) = match s.rsplit_once(':') {
            Some((left, port)) if !left.contains(']') || left.ends_with(']') => {
                (left, Some(parse_port_range(port)?))
            }
            _ => (s, None),
        };
        let (addr_part, mask_part) = addr_mask.split_once('/').unwrap_or((addr_mask, ""));
        if let Ok(v4) = Ipv4Addr::from_str(addr_part) {
            let prefix = if mask_part.is_empty() {
                32
            } else if let Ok(p) = mask_part.parse::<u8>() {
                p
            } else {
                let mask = Ipv4Addr::from_str(mask_part).ok()?;
                u32::from(mask).count_ones() as u8
            };
            return Some(IpAddressValue::V4 { addr: v4, prefix, port_range });
        }
        if let Ok(v6) = Ipv6Addr::from_str(addr_part) {
            let prefix = if mask_part.is_empty() { 128 } else { mask_part.parse().ok()? };
            return Some(IpAddressValue::V6 { addr: v6, prefix, port_range });
        }
        None
    }

    pub fn to_lexical(&self) -> String {
        match self {
            IpAddressValue::V4 { addr, prefix, port_range } => {
                format_ip(addr.to_string(), *prefix, 32, *port_range)
            }
            IpAddressValue::V6 { addr, prefix, port_range } => {
                format_ip(addr.to_string(), *prefix, 128, *port_range)
            }
        }
    }

    fn masked_key(&self) -> (u128, u8, Option<(u16, u16)>) {
        match self {
            IpAddressValue::V4 { addr, prefix, port_range } => {
                let bits = u32::from(*addr);
                let masked = if *prefix == 0 { 0 } else { bits & (u32::MAX << (32 - prefix)) };
                (masked as u128, *prefix, *port_range)
            }
            IpAddressValue::V6 { addr, prefix, port_range } => {
                let bits = u128::from(*addr);
                let masked = if *prefix == 0 { 0 } else { bits & (u128::MAX << (128 - prefix)) };
                (masked, *prefix | 0x80, *port_range)
            }
        }
    }
}

fn format_ip(addr: String, prefix: u8, full: u8, port_range: Option<(u16, u16)>) -> String {
    let mut out = addr;
    if prefix != full {
        out.push('/');
        out.push_str(&prefix.to_string());
    }
    if let Some((lo, hi)) = port_range {
        out.push(':');
        if lo == hi {
            out.push_str(&lo.to_string());
        } else {
            out.push_str(&format!("{}-{}", lo, hi));
        }
    }
    out
}

fn parse_port_range(s: &str) -> Option<(u16, u16)> {
    match s.split_once('-') {
        Some((a, b)) => Some((a.parse().ok()?, b.parse().ok()?)),
        None => {
            let p = s.parse().ok()?;
            Some((p, p))
        }
    }
}

impl PartialEq for IpAddressValue {
    fn eq(&self, other: &Self) -> bool {
        self.masked_key() == other.masked_key()
    }
}

/// `dnsName`: `domain[:port[-port]]`, domain compared case-insensitively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DnsNameValue {
    pub domain: String,
    pub port_range: Option<(u16, u16)>,
}

impl DnsNameValue {
    pub fn parse(s: &str) -> Option<Self> {
        let (domain, port_range) = match s.rsplit_once(':') {
            Some((d, p)) => (d, Some(parse_port_range(p)?)),
            None => (s, None),
        };
        if domain.is_empty() {
            return None;
        }
        Some(DnsNameValue { domain: domain.to_string(), port_range })
    }

    pub fn to_lexical(&self) -> String {
        match self.port_range {
            None => self.domain.clone(),
            Some((lo, hi)) if lo == hi => format!("{}:{}", self.domain, lo),
            Some((lo, hi)) => format!("{}:{}-{}", self.domain, lo, hi),
        }
    }
}

impl PartialEq for DnsNameValue {
    fn eq(&self, other: &Self) -> bool {
        self.domain.eq_ignore_ascii_case(&other.domain) && self.port_range == other.port_range
    }
}
