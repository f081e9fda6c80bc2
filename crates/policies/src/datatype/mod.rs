//! The value & datatype system (component A).
//!
//! XACML 3.0 fixes a closed set of primitive datatypes. Every [`Value`] in
//! this engine is tagged with one of these, and a [`Bag`] is a homogeneous
//! multiset of them. Nothing here performs implicit coercion: a function
//! argument of the wrong datatype is always an `Indeterminate`, never a
//! silent conversion (`spec.md` §3 invariant 6).

mod bag;
mod value;

pub use bag::Bag;
pub use value::{
    DayTimeDuration, DnsNameValue, IpAddressValue, Rfc822Name, SyntaxError, Value, X500Name,
    XsDate, XsDateTime, XsTime, YearMonthDuration,
};

/// One of the fifteen XACML 3.0 primitive datatypes.
///
/// The set is closed: the standard does not allow third parties to register
/// new primitive datatypes the way it allows new functions. `Datatype`
/// is therefore a plain enum rather than an open registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum Datatype {
    Boolean,
    Integer,
    Double,
    String,
    Time,
    Date,
    DateTime,
    DayTimeDuration,
    YearMonthDuration,
    AnyUri,
    HexBinary,
    Base64Binary,
    Rfc822Name,
    X500Name,
    IpAddress,
    DnsName,
}

impl Datatype {
    /// The datatype's XACML/XML-Schema identity URI.
    pub fn uri(self) -> &'static str {
        match self {
            Datatype::Boolean => "http://www.w3.org/2001/XMLSchema#boolean",
            Datatype::Integer => "http://www.w3.org/2001/XMLSchema#integer",
            Datatype::Double => "http://www.w3.org/2001/XMLSchema#double",
            Datatype::String => "http://www.w3.org/2001/XMLSchema#string",
            Datatype::Time => "http://www.w3.org/2001/XMLSchema#time",
            Datatype::Date => "http://www.w3.org/2001/XMLSchema#date",
            Datatype::DateTime => "http://www.w3.org/2001/XMLSchema#dateTime",
            Datatype::DayTimeDuration => {
                "urn:oasis:names:tc:xacml:2.0:data-type:dayTimeDuration"
            }
            Datatype::YearMonthDuration => {
                "urn:oasis:names:tc:xacml:2.0:data-type:yearMonthDuration"
            }
            Datatype::AnyUri => "http://www.w3.org/2001/XMLSchema#anyURI",
            Datatype::HexBinary => "http://www.w3.org/2001/XMLSchema#hexBinary",
            Datatype::Base64Binary => "http://www.w3.org/2001/XMLSchema#base64Binary",
            Datatype::Rfc822Name => "urn:oasis:names:tc:xacml:1.0:data-type:rfc822Name",
            Datatype::X500Name => "urn:oasis:names:tc:xacml:1.0:data-type:x500Name",
            Datatype::IpAddress => "urn:oasis:names:tc:xacml:2.0:data-type:ipAddress",
            Datatype::DnsName => "urn:oasis:names:tc:xacml:2.0:data-type:dnsName",
        }
    }

    /// Resolve a datatype from its identity URI.
    pub fn from_uri(uri: &str) -> Option<Self> {
        use Datatype::*;
        [
            Boolean,
            Integer,
            Double,
            String,
            Time,
            Date,
            DateTime,
            DayTimeDuration,
            YearMonthDuration,
            AnyUri,
            HexBinary,
            Base64Binary,
            Rfc822Name,
            X500Name,
            IpAddress,
            DnsName,
        ]
        .into_iter()
        .find(|d| d.uri() == uri)
    }

    /// Whether values of this datatype have a total order usable by the
    /// standard `*-greater-than`/`*-less-than` comparison functions.
    pub fn is_ordered(self) -> bool {
        matches!(
            self,
            Datatype::Integer | Datatype::Double | Datatype::Date | Datatype::Time | Datatype::DateTime
        )
    }
}

impl std::fmt::Display for Datatype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.uri())
    }
}
