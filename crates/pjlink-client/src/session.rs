//! Session state and PJLink authentication.
//!
//! A PJLink device greets each new TCP connection with a banner. When
//! the banner is `PJLINK 1 <nonce>`, the device expects the next command
//! to be prefixed with `lowercase_hex(md5(nonce || password))` -- no
//! separator between digest and command, and at most one authenticated
//! exchange per session. The reply to that single command settles the
//! session: `ERRA` means the credentials were rejected.

use md5::{Digest, Md5};

/// Session lifecycle for one device connection.
///
/// ```text
/// Disconnected -> BannerPending -> Authenticating -> Ready
///                              \__________________/
///                               (no-auth banner)
/// ```
///
/// `Paused` is entered by the keep-alive supervisor when the host stops
/// polling; the next operation re-runs the handshake from
/// `Disconnected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No session; the handshake runs before the next command.
    Disconnected,
    /// Socket opened, greeting not yet read.
    BannerPending,
    /// Auth banner received; the next command carries the digest prefix.
    Authenticating,
    /// Session established; commands are sent bare.
    Ready,
    /// Host went idle; socket released by the supervisor.
    Paused,
}

impl SessionState {
    /// Returns `true` when a handshake is needed before sending.
    pub fn needs_handshake(&self) -> bool {
        matches!(
            self,
            SessionState::Disconnected | SessionState::Paused | SessionState::BannerPending
        )
    }
}

/// Compute the one-shot authentication digest for a nonce/password pair.
///
/// The digest is the lowercase hex MD5 of the nonce immediately followed
/// by the password, exactly as both appear on the wire.
pub fn auth_digest(nonce: &str, password: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(nonce.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Prepend the digest to a command's bytes, with no separator.
pub fn with_digest(digest: &str, command: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(digest.len() + command.len());
    out.extend_from_slice(digest.as_bytes());
    out.extend_from_slice(command);
    out
}
