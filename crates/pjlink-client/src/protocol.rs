//! PJLink response parser.
//!
//! Turns one raw response frame into a [`PjLinkResponse`]: a value
//! string, a typed device error (ERR1..ERR4, ERRA), or the connection
//! banner a device sends after TCP connect.
//!
//! # Response format
//!
//! ```text
//! %<class><TAG>=<value>\r      normal reply
//! PJLINK 0\r                   banner, no authentication
//! PJLINK 1 <nonce>\r           banner, authentication required
//! PJLINK ERRA\r                authentication rejected
//! ```
//!
//! A value of `ERR1`..`ERR4` is reclassified as the corresponding device
//! error; a value of `-` is the protocol's "not available" sentinel. A
//! frame with neither a banner prefix nor a `=` separator parses as
//! `Value("")` and is left for the retry loop to scroll past.

/// Banner line prefix sent by a device after TCP connect.
pub const BANNER_PREFIX: &str = "PJLINK ";

/// Device-reported PJLink error classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceError {
    /// ERR1: the command is not defined on this device.
    Unsupported,
    /// ERR2: a parameter was out of range.
    OutOfParameter,
    /// ERR3: the command cannot be performed in the current state.
    Unavailable,
    /// ERR4: projector or display failure.
    DeviceFailure,
    /// ERRA: authentication rejected.
    AuthFailed,
}

/// The connection banner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    /// `true` for `PJLINK 1 <nonce>`, `false` for `PJLINK 0`.
    pub requires_auth: bool,
    /// The 8-hex-digit authentication seed, when present.
    pub nonce: Option<String>,
}

/// One parsed response frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PjLinkResponse {
    /// The substring after `=` up to the terminator.
    Value(String),
    /// The device answered `-` (or the retry loop gave up).
    NotAvailable,
    /// The connection banner.
    Banner(Banner),
    /// A typed device error.
    Error(DeviceError),
}

impl PjLinkResponse {
    /// The value string, if this is a plain value reply.
    pub fn value(&self) -> Option<&str> {
        match self {
            PjLinkResponse::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Returns `true` for any device error reply.
    pub fn is_error(&self) -> bool {
        matches!(self, PjLinkResponse::Error(_))
    }
}

/// Parse one raw response frame.
///
/// The trailing 0x0D is stripped if present; the rest is interpreted as
/// ASCII text (PJLink payloads are ASCII, and INNM names pass through
/// lossily otherwise).
pub fn parse(raw: &[u8]) -> PjLinkResponse {
    let body = match raw.last() {
        Some(0x0d) => &raw[..raw.len() - 1],
        _ => raw,
    };
    let text = String::from_utf8_lossy(body);

    if let Some(rest) = text.strip_prefix(BANNER_PREFIX) {
        return parse_banner(rest.trim());
    }

    match text.find('=') {
        Some(pos) => classify_value(&text[pos + 1..]),
        None => PjLinkResponse::Value(String::new()),
    }
}

/// Parse the portion of a banner line after `PJLINK `.
fn parse_banner(rest: &str) -> PjLinkResponse {
    if rest == "ERRA" {
        return PjLinkResponse::Error(DeviceError::AuthFailed);
    }
    if let Some(seed) = rest.strip_prefix('1') {
        let seed = seed.trim();
        return PjLinkResponse::Banner(Banner {
            requires_auth: true,
            nonce: if seed.is_empty() {
                None
            } else {
                Some(seed.to_string())
            },
        });
    }
    // "PJLINK 0" and anything else unrecognised: open session, no auth.
    PjLinkResponse::Banner(Banner {
        requires_auth: false,
        nonce: None,
    })
}

/// Classify the value portion of a `=`-delimited reply.
fn classify_value(value: &str) -> PjLinkResponse {
    match value {
        "ERR1" => PjLinkResponse::Error(DeviceError::Unsupported),
        "ERR2" => PjLinkResponse::Error(DeviceError::OutOfParameter),
        "ERR3" => PjLinkResponse::Error(DeviceError::Unavailable),
        "ERR4" => PjLinkResponse::Error(DeviceError::DeviceFailure),
        "-" => PjLinkResponse::NotAvailable,
        _ => PjLinkResponse::Value(value.to_string()),
    }
}

/// Returns `true` if a raw frame satisfies the retry loop: it is a
/// device error, or its text contains the expected response tag.
pub fn matches_expectation(raw: &[u8], tag: &str) -> bool {
    if parse(raw).is_error() {
        return true;
    }
    !tag.is_empty() && String::from_utf8_lossy(raw).contains(tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ---------------------------------------------------------------
    // Banner lines
    // ---------------------------------------------------------------

    #[test]
    fn parse_banner_no_auth() {
        assert_eq!(
            parse(b"PJLINK 0\r"),
            PjLinkResponse::Banner(Banner {
                requires_auth: false,
                nonce: None,
            })
        );
    }

    #[test]
    fn parse_banner_with_nonce() {
        assert_eq!(
            parse(b"PJLINK 1 6b1aa0ba\r"),
            PjLinkResponse::Banner(Banner {
                requires_auth: true,
                nonce: Some("6b1aa0ba".to_string()),
            })
        );
    }

    #[test]
    fn parse_banner_auth_without_nonce() {
        assert_eq!(
            parse(b"PJLINK 1\r"),
            PjLinkResponse::Banner(Banner {
                requires_auth: true,
                nonce: None,
            })
        );
    }

    #[test]
    fn parse_banner_erra() {
        assert_eq!(
            parse(b"PJLINK ERRA\r"),
            PjLinkResponse::Error(DeviceError::AuthFailed)
        );
    }

    // ---------------------------------------------------------------
    // Value replies
    // ---------------------------------------------------------------

    #[test]
    fn parse_power_value() {
        assert_eq!(parse(b"%1POWR=1\r"), PjLinkResponse::Value("1".into()));
    }

    #[test]
    fn parse_class_value() {
        assert_eq!(parse(b"%1CLSS=2\r"), PjLinkResponse::Value("2".into()));
    }

    #[test]
    fn parse_value_with_spaces() {
        assert_eq!(
            parse(b"%1NAME=REAL NAME\r"),
            PjLinkResponse::Value("REAL NAME".into())
        );
    }

    #[test]
    fn parse_input_list_value() {
        assert_eq!(
            parse(b"%1INST=11 31 32 33 51 61\r"),
            PjLinkResponse::Value("11 31 32 33 51 61".into())
        );
    }

    #[test]
    fn parse_ok_reply() {
        assert_eq!(parse(b"%1POWR=OK\r"), PjLinkResponse::Value("OK".into()));
    }

    #[test]
    fn parse_without_terminator() {
        assert_eq!(parse(b"%1POWR=0"), PjLinkResponse::Value("0".into()));
    }

    // ---------------------------------------------------------------
    // Error reclassification
    // ---------------------------------------------------------------

    #[test]
    fn parse_err1_through_err4() {
        assert_eq!(
            parse(b"%1LAMP=ERR1\r"),
            PjLinkResponse::Error(DeviceError::Unsupported)
        );
        assert_eq!(
            parse(b"%1INPT=ERR2\r"),
            PjLinkResponse::Error(DeviceError::OutOfParameter)
        );
        assert_eq!(
            parse(b"%2SNUM=ERR3\r"),
            PjLinkResponse::Error(DeviceError::Unavailable)
        );
        assert_eq!(
            parse(b"%1POWR=ERR4\r"),
            PjLinkResponse::Error(DeviceError::DeviceFailure)
        );
    }

    #[test]
    fn parse_na_sentinel() {
        assert_eq!(parse(b"%2FILT=-\r"), PjLinkResponse::NotAvailable);
    }

    #[test]
    fn err_text_inside_value_is_not_an_error() {
        // Only the exact ERR strings reclassify.
        assert_eq!(
            parse(b"%1NAME=ERR1 ROOM\r"),
            PjLinkResponse::Value("ERR1 ROOM".into())
        );
    }

    // ---------------------------------------------------------------
    // Degenerate frames
    // ---------------------------------------------------------------

    #[test]
    fn parse_empty_frame() {
        assert_eq!(parse(b""), PjLinkResponse::Value(String::new()));
    }

    #[test]
    fn parse_bare_cr() {
        assert_eq!(parse(b"\r"), PjLinkResponse::Value(String::new()));
    }

    #[test]
    fn parse_garbage_without_separator() {
        assert_eq!(parse(b"NOISE\r"), PjLinkResponse::Value(String::new()));
    }

    // ---------------------------------------------------------------
    // Retry-loop matching
    // ---------------------------------------------------------------

    #[test]
    fn expectation_matches_tag() {
        assert!(matches_expectation(b"%1POWR=1\r", "POWR"));
        assert!(!matches_expectation(b"%1POWR=1\r", "AVMT"));
    }

    #[test]
    fn expectation_matches_any_device_error() {
        assert!(matches_expectation(b"%1AVMT=ERR3\r", "POWR"));
        assert!(matches_expectation(b"PJLINK ERRA\r", "POWR"));
    }

    #[test]
    fn expectation_rejects_empty_frame() {
        assert!(!matches_expectation(b"", "POWR"));
    }

    #[test]
    fn expectation_with_empty_tag_needs_error() {
        assert!(!matches_expectation(b"%1POWR=1\r", ""));
        assert!(matches_expectation(b"%1POWR=ERR1\r", ""));
    }
}
