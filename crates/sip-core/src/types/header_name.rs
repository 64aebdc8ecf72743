//! The header registry: maps header names (long and compact forms) to the
//! grammar used to parse their values.
//!
//! Lookup is case-insensitive and exact-length, per RFC 3261 Section 7.3.
//! Headers outside the registry are carried verbatim as [`HeaderKind::Other`]
//! and are skipped by typed accessors.

/// Identity of a registered SIP header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderKind {
    Accept,
    AcceptEncoding,
    AcceptLanguage,
    AlertInfo,
    Allow,
    AllowEvents,
    Authorization,
    CallId,
    CallInfo,
    Contact,
    ContentDisposition,
    ContentEncoding,
    ContentLanguage,
    ContentLength,
    ContentType,
    CSeq,
    Date,
    ErrorInfo,
    Event,
    Expires,
    From,
    InReplyTo,
    MaxForwards,
    MimeVersion,
    MinExpires,
    Organization,
    PAssertedIdentity,
    PPreferredIdentity,
    Priority,
    Privacy,
    ProxyAuthenticate,
    ProxyAuthorization,
    ProxyRequire,
    RAck,
    RecordRoute,
    ReplyTo,
    Require,
    RetryAfter,
    Route,
    RSeq,
    Server,
    Subject,
    SubscriptionState,
    Supported,
    Timestamp,
    To,
    Unsupported,
    UserAgent,
    Via,
    Warning,
    WwwAuthenticate,
    /// A header this library has no grammar for. Its bytes are preserved and
    /// reserialized untouched; `value()` on such a header fails.
    Other,
}

/// The parse strategy a registered header dispatches to.
///
/// `P1`-`P5` are the five generic grammars; the remaining entries name the
/// header-specific grammars that do not fit them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ParseStrategy {
    /// Token list, optional `sep`-separated pair, optional params,
    /// comma-separated values.
    P1 { sep: Option<u8> },
    /// Single integer value. `reject_zero` marks a numeric 0 bad (RSeq).
    P2 { reject_zero: bool },
    /// Angle-quoted URI with optional display name, comma-separated.
    /// `display` selects the display-name form over the bare `<uri>` form.
    P3 { display: bool },
    /// Opaque free text up to the final CRLF.
    P4,
    /// Challenge/credentials: scheme token, comma-separated param list.
    P5,
    Via,
    /// Contact/From/To/Route/Record-Route address grammar.
    Cftr,
    CSeq,
    RAck,
    Warning,
    Date,
    RetryAfter,
    Timestamp,
    Allow,
    /// No grammar; `value()` fails with `InvalidArgument`.
    None,
}

struct Registration {
    kind: HeaderKind,
    long: &'static str,
    compact: Option<&'static str>,
    strategy: ParseStrategy,
    /// `Name:` with nothing after the colon is an empty parsed header rather
    /// than a protocol error.
    allows_empty: bool,
}

const P1: ParseStrategy = ParseStrategy::P1 { sep: None };
const P1_SLASH: ParseStrategy = ParseStrategy::P1 { sep: Some(b'/') };
const P2: ParseStrategy = ParseStrategy::P2 { reject_zero: false };

#[rustfmt::skip]
static REGISTRY: &[Registration] = &[
    Registration { kind: HeaderKind::Accept,             long: "Accept",              compact: None,      strategy: P1_SLASH, allows_empty: true },
    Registration { kind: HeaderKind::AcceptEncoding,     long: "Accept-Encoding",     compact: None,      strategy: P1, allows_empty: true },
    Registration { kind: HeaderKind::AcceptLanguage,     long: "Accept-Language",     compact: None,      strategy: P1, allows_empty: true },
    Registration { kind: HeaderKind::AlertInfo,          long: "Alert-Info",          compact: None,      strategy: ParseStrategy::P3 { display: false }, allows_empty: false },
    Registration { kind: HeaderKind::Allow,              long: "Allow",               compact: None,      strategy: ParseStrategy::Allow, allows_empty: true },
    Registration { kind: HeaderKind::AllowEvents,        long: "Allow-Events",        compact: Some("u"), strategy: P1, allows_empty: false },
    Registration { kind: HeaderKind::Authorization,      long: "Authorization",       compact: None,      strategy: ParseStrategy::P5, allows_empty: false },
    Registration { kind: HeaderKind::CallId,             long: "Call-ID",             compact: Some("i"), strategy: ParseStrategy::P4, allows_empty: false },
    Registration { kind: HeaderKind::CallInfo,           long: "Call-Info",           compact: None,      strategy: ParseStrategy::P3 { display: false }, allows_empty: false },
    Registration { kind: HeaderKind::Contact,            long: "Contact",             compact: Some("m"), strategy: ParseStrategy::Cftr, allows_empty: false },
    Registration { kind: HeaderKind::ContentDisposition, long: "Content-Disposition", compact: None,      strategy: P1, allows_empty: false },
    Registration { kind: HeaderKind::ContentEncoding,    long: "Content-Encoding",    compact: Some("e"), strategy: P1, allows_empty: false },
    Registration { kind: HeaderKind::ContentLanguage,    long: "Content-Language",    compact: None,      strategy: P1, allows_empty: false },
    Registration { kind: HeaderKind::ContentLength,      long: "Content-Length",      compact: Some("l"), strategy: P2, allows_empty: false },
    Registration { kind: HeaderKind::ContentType,        long: "Content-Type",        compact: Some("c"), strategy: P1_SLASH, allows_empty: false },
    Registration { kind: HeaderKind::CSeq,               long: "CSeq",                compact: None,      strategy: ParseStrategy::CSeq, allows_empty: false },
    Registration { kind: HeaderKind::Date,               long: "Date",                compact: None,      strategy: ParseStrategy::Date, allows_empty: false },
    Registration { kind: HeaderKind::ErrorInfo,          long: "Error-Info",          compact: None,      strategy: ParseStrategy::P3 { display: false }, allows_empty: false },
    Registration { kind: HeaderKind::Event,              long: "Event",               compact: Some("o"), strategy: P1, allows_empty: false },
    Registration { kind: HeaderKind::Expires,            long: "Expires",             compact: None,      strategy: P2, allows_empty: false },
    Registration { kind: HeaderKind::From,               long: "From",                compact: Some("f"), strategy: ParseStrategy::Cftr, allows_empty: false },
    Registration { kind: HeaderKind::InReplyTo,          long: "In-Reply-To",         compact: None,      strategy: P1, allows_empty: false },
    Registration { kind: HeaderKind::MaxForwards,        long: "Max-Forwards",        compact: None,      strategy: P2, allows_empty: false },
    Registration { kind: HeaderKind::MimeVersion,        long: "MIME-Version",        compact: None,      strategy: ParseStrategy::P4, allows_empty: false },
    Registration { kind: HeaderKind::MinExpires,         long: "Min-Expires",         compact: None,      strategy: P2, allows_empty: false },
    Registration { kind: HeaderKind::Organization,       long: "Organization",        compact: None,      strategy: ParseStrategy::P4, allows_empty: true },
    Registration { kind: HeaderKind::PAssertedIdentity,  long: "P-Asserted-Identity", compact: None,      strategy: ParseStrategy::P3 { display: true }, allows_empty: false },
    Registration { kind: HeaderKind::PPreferredIdentity, long: "P-Preferred-Identity", compact: None,     strategy: ParseStrategy::P3 { display: true }, allows_empty: false },
    Registration { kind: HeaderKind::Priority,           long: "Priority",            compact: None,      strategy: P1, allows_empty: false },
    Registration { kind: HeaderKind::Privacy,            long: "Privacy",             compact: None,      strategy: P1, allows_empty: false },
    Registration { kind: HeaderKind::ProxyAuthenticate,  long: "Proxy-Authenticate",  compact: None,      strategy: ParseStrategy::P5, allows_empty: false },
    Registration { kind: HeaderKind::ProxyAuthorization, long: "Proxy-Authorization", compact: None,      strategy: ParseStrategy::P5, allows_empty: false },
    Registration { kind: HeaderKind::ProxyRequire,       long: "Proxy-Require",       compact: None,      strategy: P1, allows_empty: false },
    Registration { kind: HeaderKind::RAck,               long: "RAck",                compact: None,      strategy: ParseStrategy::RAck, allows_empty: false },
    Registration { kind: HeaderKind::RecordRoute,        long: "Record-Route",        compact: None,      strategy: ParseStrategy::Cftr, allows_empty: false },
    Registration { kind: HeaderKind::ReplyTo,            long: "Reply-To",            compact: None,      strategy: ParseStrategy::P3 { display: true }, allows_empty: false },
    Registration { kind: HeaderKind::Require,            long: "Require",             compact: None,      strategy: P1, allows_empty: false },
    Registration { kind: HeaderKind::RetryAfter,         long: "Retry-After",         compact: None,      strategy: ParseStrategy::RetryAfter, allows_empty: false },
    Registration { kind: HeaderKind::Route,              long: "Route",               compact: None,      strategy: ParseStrategy::Cftr, allows_empty: false },
    Registration { kind: HeaderKind::RSeq,               long: "RSeq",                compact: None,      strategy: ParseStrategy::P2 { reject_zero: true }, allows_empty: false },
    Registration { kind: HeaderKind::Server,             long: "Server",              compact: None,      strategy: ParseStrategy::P4, allows_empty: false },
    Registration { kind: HeaderKind::Subject,            long: "Subject",             compact: Some("s"), strategy: ParseStrategy::P4, allows_empty: true },
    Registration { kind: HeaderKind::SubscriptionState,  long: "Subscription-State",  compact: None,      strategy: P1, allows_empty: false },
    Registration { kind: HeaderKind::Supported,          long: "Supported",           compact: Some("k"), strategy: P1, allows_empty: true },
    Registration { kind: HeaderKind::Timestamp,          long: "Timestamp",           compact: None,      strategy: ParseStrategy::Timestamp, allows_empty: false },
    Registration { kind: HeaderKind::To,                 long: "To",                  compact: Some("t"), strategy: ParseStrategy::Cftr, allows_empty: false },
    Registration { kind: HeaderKind::Unsupported,        long: "Unsupported",         compact: None,      strategy: P1, allows_empty: true },
    Registration { kind: HeaderKind::UserAgent,          long: "User-Agent",          compact: None,      strategy: ParseStrategy::P4, allows_empty: false },
    Registration { kind: HeaderKind::Via,                long: "Via",                 compact: Some("v"), strategy: ParseStrategy::Via, allows_empty: false },
    Registration { kind: HeaderKind::Warning,            long: "Warning",             compact: None,      strategy: ParseStrategy::Warning, allows_empty: false },
    Registration { kind: HeaderKind::WwwAuthenticate,    long: "WWW-Authenticate",    compact: None,      strategy: ParseStrategy::P5, allows_empty: false },
];

fn registration(kind: HeaderKind) -> Option<&'static Registration> {
    REGISTRY.iter().find(|r| r.kind == kind)
}

impl HeaderKind {
    /// Looks up a header name, long or compact form, case-insensitively.
    pub fn from_name(name: &[u8]) -> HeaderKind {
        for reg in REGISTRY {
            if name.eq_ignore_ascii_case(reg.long.as_bytes()) {
                return reg.kind;
            }
            if let Some(compact) = reg.compact {
                if name.eq_ignore_ascii_case(compact.as_bytes()) {
                    return reg.kind;
                }
            }
        }
        HeaderKind::Other
    }

    /// The canonical long name, or `None` for unregistered headers.
    pub fn long_name(&self) -> Option<&'static str> {
        registration(*self).map(|r| r.long)
    }

    /// The single-letter compact form, if the header has one.
    pub fn compact_form(&self) -> Option<&'static str> {
        registration(*self).and_then(|r| r.compact)
    }

    /// Whether `Name:` with an empty value parses to an empty header rather
    /// than failing.
    pub fn allows_empty(&self) -> bool {
        registration(*self).map(|r| r.allows_empty).unwrap_or(false)
    }

    pub(crate) fn strategy(&self) -> ParseStrategy {
        registration(*self)
            .map(|r| r.strategy)
            .unwrap_or(ParseStrategy::None)
    }
}
