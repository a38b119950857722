//! Error types for netlink operations.

use std::io;

/// Result type for netlink operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building, exchanging, or decoding
/// netlink messages.
///
/// Every failure is surfaced as a value to the immediate caller; this
/// crate never retries, logs an error, or panics. Whether to resend is
/// the caller's decision (a fresh sequence number is assigned on the
/// next [`finish`](crate::builder::MessageBuilder::finish)).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error from socket operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The kernel reported a local address of the wrong family.
    #[error("unexpected netlink socket address family: {family}")]
    AddressFamily {
        /// The family reported by `getsockname`.
        family: u16,
    },

    /// Datagram sender or reply header does not match the expected peer.
    #[error("netlink peer mismatch (got {actual}, expected {expected})")]
    PeerMismatch {
        /// The port id that was expected.
        expected: u32,
        /// The port id actually seen.
        actual: u32,
    },

    /// Received data too short to hold a message header.
    #[error("truncated netlink message header (have {actual} bytes)")]
    TruncatedHeader {
        /// Bytes actually received.
        actual: usize,
    },

    /// Received data shorter than the header's declared total length.
    #[error("truncated netlink message (have {actual} bytes, expected {expected})")]
    TruncatedMessage {
        /// The declared length.
        expected: usize,
        /// Bytes actually available.
        actual: usize,
    },

    /// Attribute stream ends inside an attribute record.
    #[error("truncated netlink attribute (have {actual} bytes, expected {expected})")]
    TruncatedAttribute {
        /// Bytes the record requires.
        expected: usize,
        /// Bytes remaining in the stream.
        actual: usize,
    },

    /// Cursor would advance past the end of the payload.
    #[error("truncated netlink payload (have {actual} bytes, expected {expected})")]
    TruncatedPayload {
        /// Bytes the caller asked to skip.
        expected: usize,
        /// Bytes remaining.
        actual: usize,
    },

    /// Reply does not correlate with the request believed sent.
    #[error("netlink reply sequence number mismatch (got {actual}, expected {expected})")]
    SequenceMismatch {
        /// The sequence number that was sent.
        expected: u32,
        /// The sequence number in the reply.
        actual: u32,
    },

    /// Reply header type disagrees with the caller's expectation.
    #[error("netlink response has wrong type (got {actual}, expected {expected})")]
    UnexpectedType {
        /// The message type the caller expected.
        expected: u16,
        /// The message type in the header.
        actual: u16,
    },

    /// Requested attribute type absent from the decoded message.
    #[error("missing attribute {kind}")]
    MissingAttribute {
        /// The attribute type that was requested.
        kind: u16,
    },

    /// Attribute present but its value cannot be interpreted as asked.
    #[error("invalid attribute: {0}")]
    InvalidAttribute(String),

    /// Invalid message structure.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// Kernel explicitly rejected the request.
    #[error("netlink error response: {message} (errno {errno})")]
    Kernel {
        /// The errno value decoded from the error payload.
        errno: i32,
        /// Human-readable error message.
        message: String,
    },

    /// A datagram carried more than one logical message.
    #[error("multiple netlink messages received (have {actual} bytes, message declares {declared})")]
    MultipleMessages {
        /// The first message's declared length.
        declared: usize,
        /// Bytes in the datagram.
        actual: usize,
    },
}

impl Error {
    /// Build a kernel error from the raw wire code.
    ///
    /// The kernel encodes failures as a non-positive value whose
    /// negation is the system errno.
    pub fn from_errno(code: i32) -> Self {
        let message = io::Error::from_raw_os_error(-code).to_string();
        Self::Kernel {
            errno: -code,
            message,
        }
    }

    /// Get the errno value if this is a kernel error.
    pub fn errno(&self) -> Option<i32> {
        match self {
            Self::Kernel { errno, .. } => Some(*errno),
            _ => None,
        }
    }

    /// Check if this is a "not found" error (ENOENT, ENODEV).
    pub fn is_not_found(&self) -> bool {
        matches!(self.errno(), Some(2) | Some(19))
    }

    /// Check if this is a permission error (EPERM, EACCES).
    pub fn is_permission_denied(&self) -> bool {
        matches!(self.errno(), Some(1) | Some(13))
    }
}
