//! SIP request methods as defined in RFC 3261 and its extensions.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// A SIP request method.
///
/// The set matches the methods the parser recognizes in start lines, CSeq,
/// RAck and Allow headers. Unknown method tokens are rejected by the start
/// line parser and mark the owning value bad in header values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Invite,
    Ack,
    Options,
    Bye,
    Cancel,
    Register,
    Refer,
    Info,
    Subscribe,
    Notify,
    Prack,
    Update,
}

impl Method {
    /// All known methods, in table order.
    pub const ALL: [Method; 12] = [
        Method::Invite,
        Method::Ack,
        Method::Options,
        Method::Bye,
        Method::Cancel,
        Method::Register,
        Method::Refer,
        Method::Info,
        Method::Subscribe,
        Method::Notify,
        Method::Prack,
        Method::Update,
    ];

    /// The canonical (upper case) name of the method.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Invite => "INVITE",
            Method::Ack => "ACK",
            Method::Options => "OPTIONS",
            Method::Bye => "BYE",
            Method::Cancel => "CANCEL",
            Method::Register => "REGISTER",
            Method::Refer => "REFER",
            Method::Info => "INFO",
            Method::Subscribe => "SUBSCRIBE",
            Method::Notify => "NOTIFY",
            Method::Prack => "PRACK",
            Method::Update => "UPDATE",
        }
    }

    /// Looks up a method token. Method names are case-sensitive per
    /// RFC 3261 Section 7.1.
    pub fn from_token(token: &[u8]) -> Option<Method> {
        Method::ALL
            .iter()
            .copied()
            .find(|m| m.as_str().as_bytes() == token)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Method::from_token(s.as_bytes()).ok_or(Error::InvalidArgument)
    }
}
