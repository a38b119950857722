//! Validation of received responses against the request that was sent.

use crate::error::{Error, Result};
use crate::message::{NLMSG_HDRLEN, NlMsgError, NlMsgHdr, nlmsg_align};

/// Outcome of a successfully validated response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response<'a> {
    /// A plain acknowledgement: an error-type message with code 0.
    Ack,
    /// A payload-bearing message; the bytes between the header and the
    /// declared total length.
    Payload(&'a [u8]),
}

/// Validate one received datagram.
///
/// `local_pid` is the socket's kernel-assigned port id (the kernel
/// echoes it back in replies addressed to the requester) and
/// `expected_seq` is the sequence number assigned when the request was
/// finished. Checks run in order and short-circuit at the first
/// violation:
///
/// 1. the buffer holds at least a header, else [`Error::TruncatedHeader`];
/// 2. the declared total length fits the buffer, else
///    [`Error::TruncatedMessage`];
/// 3. the header's port id equals `local_pid`, else [`Error::PeerMismatch`];
/// 4. the header's sequence number equals `expected_seq`, else
///    [`Error::SequenceMismatch`];
/// 5. an error-type message decodes to [`Response::Ack`] on code 0 and
///    to [`Error::Kernel`] otherwise;
/// 6. a trailing second message in the datagram is unsupported and
///    rejected as [`Error::MultipleMessages`] rather than silently
///    dropped.
pub fn check_response<'a>(
    data: &'a [u8],
    local_pid: u32,
    expected_seq: u32,
) -> Result<Response<'a>> {
    if data.len() < NLMSG_HDRLEN {
        return Err(Error::TruncatedHeader { actual: data.len() });
    }

    let header = *NlMsgHdr::from_bytes(data)?;
    let msg_len = header.nlmsg_len as usize;
    if data.len() < msg_len {
        return Err(Error::TruncatedMessage {
            expected: msg_len,
            actual: data.len(),
        });
    }
    if msg_len < NLMSG_HDRLEN {
        return Err(Error::InvalidMessage(format!(
            "invalid message length: {msg_len}"
        )));
    }

    if header.nlmsg_pid != local_pid {
        return Err(Error::PeerMismatch {
            expected: local_pid,
            actual: header.nlmsg_pid,
        });
    }

    if header.nlmsg_seq != expected_seq {
        return Err(Error::SequenceMismatch {
            expected: expected_seq,
            actual: header.nlmsg_seq,
        });
    }

    let payload = &data[NLMSG_HDRLEN..msg_len];
    if header.is_error() {
        let err = NlMsgError::from_bytes(payload)?;
        if err.is_ack() {
            return Ok(Response::Ack);
        }
        return Err(Error::from_errno(err.error));
    }

    if nlmsg_align(msg_len) < data.len() {
        return Err(Error::MultipleMessages {
            declared: msg_len,
            actual: data.len(),
        });
    }

    Ok(Response::Payload(payload))
}
