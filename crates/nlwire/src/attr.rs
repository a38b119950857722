//! Netlink attribute (rtattr/nlattr) codec and the decoded attribute map.

use std::collections::HashMap;

use crate::align::align_up;
use crate::error::{Error, Result};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Netlink attribute alignment.
pub const NLA_ALIGNTO: usize = 4;

/// Align a length to NLA_ALIGNTO boundary.
#[inline]
pub const fn nla_align(len: usize) -> usize {
    align_up(len, NLA_ALIGNTO)
}

/// Size of the attribute header.
pub const NLA_HDRLEN: usize = 4; // nla_align(size_of::<NlAttr>())

/// Attribute type flags, carried in the high bits of `nla_type`.
pub const NLA_F_NESTED: u16 = 1 << 15;
pub const NLA_F_NET_BYTEORDER: u16 = 1 << 14;
pub const NLA_TYPE_MASK: u16 = !(NLA_F_NESTED | NLA_F_NET_BYTEORDER);

/// Netlink attribute header (mirrors struct nlattr / struct rtattr).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct NlAttr {
    /// Length including header.
    pub nla_len: u16,
    /// Attribute type.
    pub nla_type: u16,
}

impl NlAttr {
    /// Create a new attribute header for a value of `data_len` bytes.
    pub fn new(attr_type: u16, data_len: usize) -> Self {
        Self {
            nla_len: (NLA_HDRLEN + data_len) as u16,
            nla_type: attr_type,
        }
    }

    /// Get the payload length (total length minus header).
    pub fn payload_len(&self) -> usize {
        (self.nla_len as usize).saturating_sub(NLA_HDRLEN)
    }

    /// Convert to bytes.
    pub fn as_bytes(&self) -> &[u8] {
        <Self as IntoBytes>::as_bytes(self)
    }

    /// Parse from the front of a byte slice.
    pub fn from_bytes(data: &[u8]) -> Result<&Self> {
        Self::ref_from_prefix(data)
            .map(|(r, _)| r)
            .map_err(|_| Error::TruncatedAttribute {
                expected: NLA_HDRLEN,
                actual: data.len(),
            })
    }
}

/// Decoded attribute map for one message.
///
/// Maps attribute types to raw value bytes borrowed from the received
/// buffer; entries must not outlive it. Built fresh per message by
/// [`MessageReader::take_attrs`](crate::reader::MessageReader::take_attrs).
/// A duplicate type overwrites the earlier entry, mirroring the raw
/// last-write-wins semantics of the wire stream.
#[derive(Debug, Default)]
pub struct Attrs<'a> {
    map: HashMap<u16, &'a [u8]>,
}

impl<'a> Attrs<'a> {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, kind: u16, value: &'a [u8]) {
        self.map.insert(kind, value);
    }

    /// Number of decoded attributes.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if no attributes were decoded.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Check whether an attribute of the given type is present.
    pub fn contains(&self, kind: u16) -> bool {
        self.map.contains_key(&kind)
    }

    /// Get the raw value bytes for an attribute type.
    pub fn get(&self, kind: u16) -> Result<&'a [u8]> {
        self.map
            .get(&kind)
            .copied()
            .ok_or(Error::MissingAttribute { kind })
    }

    /// Get an attribute value as a native-endian u16.
    ///
    /// A stored value whose length is not exactly 2 bytes is rejected,
    /// never reinterpreted or zero-extended.
    pub fn get_u16(&self, kind: u16) -> Result<u16> {
        let val = self.get(kind)?;
        if val.len() != 2 {
            return Err(Error::InvalidAttribute(format!(
                "attribute {} has wrong length (got {} bytes, expected 2)",
                kind,
                val.len()
            )));
        }
        Ok(u16::from_ne_bytes([val[0], val[1]]))
    }

    /// Get an attribute value as a native-endian u32.
    pub fn get_u32(&self, kind: u16) -> Result<u32> {
        let val = self.get(kind)?;
        if val.len() != 4 {
            return Err(Error::InvalidAttribute(format!(
                "attribute {} has wrong length (got {} bytes, expected 4)",
                kind,
                val.len()
            )));
        }
        Ok(u32::from_ne_bytes([val[0], val[1], val[2], val[3]]))
    }

    /// Get an attribute value as a string, up to the first NUL.
    pub fn get_str(&self, kind: u16) -> Result<&'a str> {
        let val = self.get(kind)?;
        let len = val.iter().position(|&b| b == 0).unwrap_or(val.len());
        std::str::from_utf8(&val[..len])
            .map_err(|e| Error::InvalidAttribute(format!("attribute {kind}: invalid UTF-8: {e}")))
    }

    /// Iterate over decoded (type, value) pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &'a [u8])> + '_ {
        self.map.iter().map(|(&k, &v)| (k, v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_codec_round_trip() {
        let attr = NlAttr::new(3, 5);
        assert_eq!(attr.nla_len as usize, NLA_HDRLEN + 5);

        let decoded = NlAttr::from_bytes(attr.as_bytes()).unwrap();
        assert_eq!(decoded.nla_type, 3);
        assert_eq!(decoded.payload_len(), 5);
    }

    #[test]
    fn test_prefix_from_short_slice() {
        assert!(matches!(
            NlAttr::from_bytes(&[0u8; 2]),
            Err(Error::TruncatedAttribute {
                expected: NLA_HDRLEN,
                actual: 2
            })
        ));
    }

    fn sample() -> Attrs<'static> {
        let mut attrs = Attrs::new();
        attrs.insert(1, &[0x34, 0x12]);
        attrs.insert(2, b"eth0\0");
        attrs.insert(3, &[1, 2, 3]);
        attrs
    }

    #[test]
    fn test_get_missing() {
        let attrs = sample();
        assert!(matches!(
            attrs.get(9),
            Err(Error::MissingAttribute { kind: 9 })
        ));
    }

    #[test]
    fn test_get_u16() {
        let attrs = sample();
        assert_eq!(attrs.get_u16(1).unwrap(), u16::from_ne_bytes([0x34, 0x12]));
    }

    #[test]
    fn test_get_u16_wrong_length_is_rejected() {
        let attrs = sample();
        assert!(matches!(attrs.get_u16(3), Err(Error::InvalidAttribute(_))));
    }

    #[test]
    fn test_get_str_stops_at_nul() {
        let attrs = sample();
        assert_eq!(attrs.get_str(2).unwrap(), "eth0");
    }
}
