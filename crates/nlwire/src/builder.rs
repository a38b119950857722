//! Message builder for constructing netlink requests.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::align::align_up;
use crate::attr::{NLA_ALIGNTO, NLA_HDRLEN};
use crate::message::{NLMSG_HDRLEN, NlMsgHdr};

/// Process-wide sequence counter.
///
/// Every finished message consumes the next value, so concurrent
/// in-flight requests from this process never share a sequence number.
/// The counter wraps at `u32::MAX` like any other integer.
static NEXT_SEQ: AtomicU32 = AtomicU32::new(1);

/// Builder for one outbound netlink message.
///
/// Accumulates a growable byte buffer: a header prefix whose length and
/// sequence number are deferred, followed by TLV-encoded attributes with
/// alignment padding at each boundary. Positions within the buffer are
/// plain offsets, so nested attribute construction never holds a live
/// reference across a reallocation.
///
/// The builder is consumed by [`finish`](Self::finish) and must not be
/// reused afterwards. It is single-owner; concurrent use from multiple
/// threads without external locking is the caller's responsibility.
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    buf: Vec<u8>,
}

impl MessageBuilder {
    /// Create a new message builder with the given type and flags.
    ///
    /// The buffer starts as a zeroed header-sized prefix with the type
    /// and flags stamped immediately; length and sequence number are
    /// filled in by [`finish`](Self::finish).
    pub fn new(msg_type: u16, flags: u16) -> Self {
        let header = NlMsgHdr::new(msg_type, flags);
        let mut buf = vec![0u8; NLMSG_HDRLEN];
        buf[..std::mem::size_of::<NlMsgHdr>()].copy_from_slice(header.as_bytes());
        Self { buf }
    }

    /// Get the current message length.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Check if the message is empty (header only).
    pub fn is_empty(&self) -> bool {
        self.buf.len() == NLMSG_HDRLEN
    }

    /// Reserve `n` zeroed bytes at the end of the buffer and return the
    /// offset at which the new region starts.
    ///
    /// Capacity grows geometrically, recomputed until large enough.
    /// Growth preserves all previously written bytes; returned offsets
    /// are stable logical positions regardless of reallocation.
    /// `grow(0)` returns the current end unchanged.
    pub fn grow(&mut self, n: usize) -> usize {
        let pos = self.buf.len();
        let needed = pos + n;
        if needed > self.buf.capacity() {
            let mut cap = (self.buf.capacity() + 1) * 3 / 2;
            while cap < needed {
                cap = (cap + 1) * 3 / 2;
            }
            self.buf.reserve_exact(cap - pos);
        }
        self.buf.resize(needed, 0);
        pos
    }

    /// Zero-pad the buffer length up to the next multiple of `a`.
    ///
    /// No-op when already aligned.
    pub fn align_to(&mut self, a: usize) {
        let aligned = align_up(self.buf.len(), a);
        let pad = aligned - self.buf.len();
        if pad > 0 {
            self.grow(pad);
        }
    }

    /// Append raw bytes at the end of the buffer (no prefix, no padding).
    pub fn put_bytes(&mut self, data: &[u8]) {
        let pos = self.grow(data.len());
        self.buf[pos..pos + data.len()].copy_from_slice(data);
    }

    /// Emit one TLV attribute, with the value written by a closure.
    ///
    /// Aligns to the attribute boundary, reserves the prefix, runs the
    /// closure to write the value, then backfills the prefix's type and
    /// length (prefix start to current end, inclusive of the prefix).
    /// The closure may call `put_attr` again to nest; a closure that
    /// writes nothing yields a legal empty attribute.
    pub fn put_attr<F>(&mut self, kind: u16, write: F)
    where
        F: FnOnce(&mut Self),
    {
        self.align_to(NLA_ALIGNTO);
        let pos = self.grow(NLA_HDRLEN);
        write(self);
        let len = (self.buf.len() - pos) as u16;
        self.buf[pos..pos + 2].copy_from_slice(&len.to_ne_bytes());
        self.buf[pos + 2..pos + 4].copy_from_slice(&kind.to_ne_bytes());
    }

    /// Emit an attribute whose value is `data`.
    pub fn put_bytes_attr(&mut self, kind: u16, data: &[u8]) {
        self.put_attr(kind, |b| b.put_bytes(data));
    }

    /// Emit an attribute holding the string bytes plus one NUL terminator.
    pub fn put_str_attr(&mut self, kind: u16, value: &str) {
        self.put_attr(kind, |b| {
            b.put_bytes(value.as_bytes());
            b.put_bytes(&[0]);
        });
    }

    /// Emit a native-endian u16 attribute.
    pub fn put_u16_attr(&mut self, kind: u16, value: u16) {
        self.put_bytes_attr(kind, &value.to_ne_bytes());
    }

    /// Emit a native-endian u32 attribute.
    pub fn put_u32_attr(&mut self, kind: u16, value: u32) {
        self.put_bytes_attr(kind, &value.to_ne_bytes());
    }

    /// Get the current buffer for inspection.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Finalize the message.
    ///
    /// Backfills the header's total length, assigns the next process-wide
    /// sequence number into the header, and yields the completed buffer
    /// together with that sequence number.
    pub fn finish(mut self) -> (Vec<u8>, u32) {
        let len = self.buf.len() as u32;
        self.buf[0..4].copy_from_slice(&len.to_ne_bytes());
        let seq = NEXT_SEQ.fetch_add(1, Ordering::Relaxed);
        self.buf[8..12].copy_from_slice(&seq.to_ne_bytes());
        (self.buf, seq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{NLM_F_ACK, NLM_F_REQUEST};
    use crate::reader::MessageReader;

    #[test]
    fn test_simple_message() {
        let (msg, seq) = MessageBuilder::new(16, NLM_F_REQUEST).finish();
        assert_eq!(msg.len(), NLMSG_HDRLEN);

        let header = NlMsgHdr::from_bytes(&msg).unwrap();
        assert_eq!(header.nlmsg_len as usize, NLMSG_HDRLEN);
        assert_eq!(header.nlmsg_type, 16);
        assert_eq!(header.nlmsg_flags, NLM_F_REQUEST);
        assert_eq!(header.nlmsg_seq, seq);
    }

    #[test]
    fn test_grow_returns_stable_offsets() {
        let mut builder = MessageBuilder::new(16, NLM_F_REQUEST);
        let first = builder.len();
        builder.put_bytes(b"xyz");
        assert_eq!(first, NLMSG_HDRLEN);

        // Force several reallocations, then check the early region.
        let mut marker = builder.grow(1);
        for _ in 0..10 {
            marker = builder.grow(97);
        }
        assert!(marker > first);
        assert_eq!(&builder.as_bytes()[first..first + 3], b"xyz");

        // grow(0) is legal and reports the current end.
        let end = builder.grow(0);
        assert_eq!(end, builder.len());
    }

    #[test]
    fn test_align_to_when_aligned_is_noop() {
        let mut builder = MessageBuilder::new(16, NLM_F_REQUEST);
        let len = builder.len();
        builder.align_to(4);
        assert_eq!(builder.len(), len);

        builder.grow(1);
        builder.align_to(4);
        assert_eq!(builder.len(), len + 4);
    }

    #[test]
    fn test_string_attribute_round_trip() {
        let mut builder = MessageBuilder::new(24, NLM_F_REQUEST | NLM_F_ACK);
        builder.put_str_attr(3, "eth0");
        let (msg, _) = builder.finish();

        let header = NlMsgHdr::from_bytes(&msg).unwrap();
        assert_eq!(header.nlmsg_len as usize, msg.len());
        assert_eq!(header.nlmsg_type, 24);
        assert_eq!(header.nlmsg_flags, NLM_F_REQUEST | NLM_F_ACK);

        let mut reader = MessageReader::new(&msg);
        reader.take_header(24).unwrap();
        let attrs = reader.take_attrs().unwrap();
        assert_eq!(attrs.get(3).unwrap(), b"eth0\0");
        assert_eq!(attrs.get_str(3).unwrap(), "eth0");
    }

    #[test]
    fn test_empty_attribute_is_prefix_sized() {
        let mut builder = MessageBuilder::new(16, NLM_F_REQUEST);
        builder.put_attr(1, |_| {});
        let (msg, _) = builder.finish();

        let mut reader = MessageReader::new(&msg);
        reader.take_header(16).unwrap();
        let attrs = reader.take_attrs().unwrap();
        assert_eq!(attrs.get(1).unwrap(), b"");
    }

    #[test]
    fn test_nested_attribute_is_contained() {
        let mut builder = MessageBuilder::new(16, NLM_F_REQUEST);
        builder.put_attr(1, |b| {
            b.put_attr(2, |b| b.put_bytes(b"abcd"));
        });
        let (msg, _) = builder.finish();

        let mut reader = MessageReader::new(&msg);
        reader.take_header(16).unwrap();
        let attrs = reader.take_attrs().unwrap();

        // The inner record is not visible at the top level.
        assert!(attrs.contains(1));
        assert!(!attrs.contains(2));

        // Re-entering the container's value exposes it.
        let outer = attrs.get(1).unwrap();
        let mut inner = MessageReader::new(outer);
        let nested = inner.take_attrs().unwrap();
        assert_eq!(nested.get(2).unwrap(), b"abcd");
    }

    #[test]
    fn test_scalar_attributes() {
        let mut builder = MessageBuilder::new(16, NLM_F_REQUEST);
        builder.put_u16_attr(1, 0x1234);
        builder.put_u32_attr(2, 0xdead_beef);
        let (msg, _) = builder.finish();

        let mut reader = MessageReader::new(&msg);
        reader.take_header(16).unwrap();
        let attrs = reader.take_attrs().unwrap();
        assert_eq!(attrs.get_u16(1).unwrap(), 0x1234);
        assert_eq!(attrs.get_u32(2).unwrap(), 0xdead_beef);
    }

    #[test]
    fn test_concurrent_finish_yields_distinct_sequence_numbers() {
        use std::collections::HashSet;
        use std::sync::Mutex;

        let seen = Mutex::new(HashSet::new());
        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    for _ in 0..64 {
                        let (_, seq) = MessageBuilder::new(16, NLM_F_REQUEST).finish();
                        assert!(seen.lock().unwrap().insert(seq));
                    }
                });
            }
        });
        assert_eq!(seen.lock().unwrap().len(), 8 * 64);
    }
}
