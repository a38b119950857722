//! Cursor-based decoding of received netlink messages.

use crate::align::align_up;
use crate::attr::{Attrs, NLA_ALIGNTO, NLA_HDRLEN, NlAttr};
use crate::error::{Error, Result};
use crate::message::{NLMSG_HDRLEN, NlMsgHdr};

/// Stateful cursor over a received message buffer.
///
/// Borrows the datagram; attribute values handed out by
/// [`take_attrs`](Self::take_attrs) are slices into the same buffer.
/// Every read is bounds-checked against the end of data before any byte
/// is interpreted.
#[derive(Debug)]
pub struct MessageReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> MessageReader<'a> {
    /// Create a reader positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current cursor position.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes remaining after the cursor.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Align the cursor to the next multiple of `a`.
    pub fn align(&mut self, a: usize) {
        self.pos = align_up(self.pos, a);
    }

    /// Advance the cursor by `n` bytes.
    ///
    /// Used to skip fixed-size sub-structures embedded before an
    /// attribute stream. Fails without moving if fewer than `n` bytes
    /// remain.
    pub fn advance(&mut self, n: usize) -> Result<()> {
        let pos = self.pos + n;
        if pos > self.data.len() {
            return Err(Error::TruncatedPayload {
                expected: n,
                actual: self.remaining(),
            });
        }
        self.pos = pos;
        Ok(())
    }

    /// Read the message header at the cursor and advance past it.
    ///
    /// Fails with [`Error::UnexpectedType`] if the header's type does
    /// not equal `expected`.
    pub fn take_header(&mut self, expected: u16) -> Result<NlMsgHdr> {
        let rest = self.data.get(self.pos..).unwrap_or_default();
        let header = *NlMsgHdr::from_bytes(rest)?;
        self.pos += NLMSG_HDRLEN;

        if header.nlmsg_type != expected {
            return Err(Error::UnexpectedType {
                expected,
                actual: header.nlmsg_type,
            });
        }

        Ok(header)
    }

    /// Decode the attribute stream from the cursor to the end of data.
    ///
    /// Each record's declared length is checked against the remaining
    /// bytes before its value is sliced out. Values are stored by
    /// attribute type, last write wins. The cursor advances by each
    /// record's declared (unaligned) length; the next iteration
    /// re-aligns before reading the following prefix.
    pub fn take_attrs(&mut self) -> Result<Attrs<'a>> {
        let mut attrs = Attrs::new();
        loop {
            let apos = align_up(self.pos, NLA_ALIGNTO);
            if apos >= self.data.len() {
                return Ok(attrs);
            }
            self.pos = apos;

            let remaining = self.remaining();
            if remaining < NLA_HDRLEN {
                return Err(Error::TruncatedAttribute {
                    expected: NLA_HDRLEN,
                    actual: remaining,
                });
            }

            let attr = NlAttr::from_bytes(&self.data[self.pos..])?;
            let len = attr.nla_len as usize;
            if len < NLA_HDRLEN || len > remaining {
                return Err(Error::TruncatedAttribute {
                    expected: len,
                    actual: remaining,
                });
            }

            let value_start = align_up(self.pos + NLA_HDRLEN, NLA_ALIGNTO);
            let end = self.pos + len;
            attrs.insert(attr.nla_type, &self.data[value_start..end]);
            self.pos = end;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::MessageBuilder;
    use crate::message::NLM_F_REQUEST;

    #[test]
    fn test_advance_within_bounds() {
        let data = [0u8; 8];
        let mut reader = MessageReader::new(&data);
        reader.advance(8).unwrap();
        assert_eq!(reader.position(), 8);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_advance_past_end_fails_without_moving() {
        let data = [0u8; 8];
        let mut reader = MessageReader::new(&data);
        reader.advance(5).unwrap();
        assert!(matches!(
            reader.advance(4),
            Err(Error::TruncatedPayload {
                expected: 4,
                actual: 3
            })
        ));
        assert_eq!(reader.position(), 5);
    }

    #[test]
    fn test_take_header_wrong_type() {
        let (msg, _) = MessageBuilder::new(16, NLM_F_REQUEST).finish();
        let mut reader = MessageReader::new(&msg);
        assert!(matches!(
            reader.take_header(20),
            Err(Error::UnexpectedType {
                expected: 20,
                actual: 16
            })
        ));
    }

    #[test]
    fn test_take_header_truncated() {
        let data = [0u8; 4];
        let mut reader = MessageReader::new(&data);
        assert!(matches!(
            reader.take_header(16),
            Err(Error::TruncatedHeader { actual: 4 })
        ));
    }

    #[test]
    fn test_take_attrs_empty_stream() {
        let (msg, _) = MessageBuilder::new(16, NLM_F_REQUEST).finish();
        let mut reader = MessageReader::new(&msg);
        reader.take_header(16).unwrap();
        let attrs = reader.take_attrs().unwrap();
        assert!(attrs.is_empty());
    }

    #[test]
    fn test_take_attrs_truncated_record() {
        let mut builder = MessageBuilder::new(16, NLM_F_REQUEST);
        builder.put_bytes_attr(1, b"abcdefgh");
        let (mut msg, _) = builder.finish();

        // Claim more bytes than the record holds.
        let attr_pos = NLMSG_HDRLEN;
        msg[attr_pos..attr_pos + 2].copy_from_slice(&100u16.to_ne_bytes());

        let mut reader = MessageReader::new(&msg);
        reader.take_header(16).unwrap();
        assert!(matches!(
            reader.take_attrs(),
            Err(Error::TruncatedAttribute { expected: 100, .. })
        ));
    }

    #[test]
    fn test_take_attrs_undersized_length_field() {
        let mut builder = MessageBuilder::new(16, NLM_F_REQUEST);
        builder.put_u32_attr(1, 7);
        let (mut msg, _) = builder.finish();

        // A declared length smaller than the prefix is malformed.
        let attr_pos = NLMSG_HDRLEN;
        msg[attr_pos..attr_pos + 2].copy_from_slice(&2u16.to_ne_bytes());

        let mut reader = MessageReader::new(&msg);
        reader.take_header(16).unwrap();
        assert!(matches!(
            reader.take_attrs(),
            Err(Error::TruncatedAttribute { expected: 2, .. })
        ));
    }

    #[test]
    fn test_duplicate_type_keeps_last_value() {
        let mut builder = MessageBuilder::new(16, NLM_F_REQUEST);
        builder.put_bytes_attr(5, b"first");
        builder.put_bytes_attr(5, b"second");
        let (msg, _) = builder.finish();

        let mut reader = MessageReader::new(&msg);
        reader.take_header(16).unwrap();
        let attrs = reader.take_attrs().unwrap();
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs.get(5).unwrap(), b"second");
    }

    #[test]
    fn test_attrs_after_fixed_substructure() {
        // Messages may carry a fixed-size struct between the header and
        // the attribute stream; consumers skip it with advance/align.
        let mut builder = MessageBuilder::new(16, NLM_F_REQUEST);
        builder.put_bytes(&[0xaa; 6]);
        builder.align_to(4);
        builder.put_u32_attr(2, 42);
        let (msg, _) = builder.finish();

        let mut reader = MessageReader::new(&msg);
        reader.take_header(16).unwrap();
        reader.advance(6).unwrap();
        reader.align(4);
        let attrs = reader.take_attrs().unwrap();
        assert_eq!(attrs.get_u32(2).unwrap(), 42);
    }
}
