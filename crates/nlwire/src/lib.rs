//! Blocking netlink wire codec and transport for Linux.
//!
//! This crate covers the wire-format layer of talking to the kernel
//! over netlink: building request messages as correctly-aligned binary
//! buffers with nested TLV attributes, exchanging datagrams over a raw
//! netlink socket, correlating replies by peer and sequence number, and
//! decoding headers and attribute streams back into typed values.
//!
//! What a specific family's messages *mean* (link, address, route
//! payload semantics, message type constants, group numbers) is the
//! consumer's business; this crate supplies the codec and the transport.
//!
//! # Example
//!
//! ```ignore
//! use nlwire::message::{NLM_F_ACK, NLM_F_REQUEST};
//! use nlwire::{MessageBuilder, MessageReader, NetlinkSocket, Protocol, Response};
//!
//! const RTM_SETLINK: u16 = 19;
//! const IFLA_IFNAME: u16 = 3;
//!
//! let sock = NetlinkSocket::open(Protocol::Route)?;
//!
//! let mut msg = MessageBuilder::new(RTM_SETLINK, NLM_F_REQUEST | NLM_F_ACK);
//! msg.put_str_attr(IFLA_IFNAME, "eth0");
//! let (buf, seq) = msg.finish();
//!
//! sock.send(&buf)?;
//! let reply = sock.recv(0)?;
//!
//! match nlwire::check_response(&reply, sock.local_port(), seq)? {
//!     Response::Ack => {}
//!     Response::Payload(_) => {
//!         let mut reader = MessageReader::new(&reply);
//!         let header = reader.take_header(RTM_SETLINK)?;
//!         let attrs = reader.take_attrs()?;
//!         let name = attrs.get_str(IFLA_IFNAME)?;
//!     }
//! }
//! ```
//!
//! # Concurrency
//!
//! I/O is synchronous and blocking. The only process-wide mutable state
//! is the atomic sequence counter consumed by
//! [`MessageBuilder::finish`]; everything else (a builder, a socket's
//! receive path, a reader) is single-owner and carries no internal
//! synchronization.

pub mod align;
pub mod attr;
pub mod builder;
pub mod error;
pub mod message;
pub mod reader;
pub mod response;
pub mod socket;

pub use attr::{Attrs, NlAttr};
pub use builder::MessageBuilder;
pub use error::{Error, Result};
pub use message::{NLMSG_HDRLEN, NlMsgError, NlMsgHdr, NlMsgType};
pub use reader::MessageReader;
pub use response::{Response, check_response};
pub use socket::{NetlinkSocket, Protocol};
