//! Blocking netlink socket transport.

use std::os::unix::io::{AsRawFd, RawFd};

use bytes::BytesMut;
use netlink_sys::{Socket, SocketAddr, protocols};
use tracing::trace;

use crate::error::{Error, Result};

/// Netlink protocol families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// Routing/device hook (links, addresses, routes, tc).
    Route,
    /// Generic netlink.
    Generic,
    /// Netfilter.
    Netfilter,
    /// Kernel connector.
    Connector,
    /// Kobject uevent.
    KobjectUevent,
    /// Any other family, by raw protocol number.
    Other(isize),
}

impl Protocol {
    fn as_isize(self) -> isize {
        match self {
            Protocol::Route => protocols::NETLINK_ROUTE,
            Protocol::Generic => protocols::NETLINK_GENERIC,
            Protocol::Netfilter => protocols::NETLINK_NETFILTER,
            Protocol::Connector => protocols::NETLINK_CONNECTOR,
            Protocol::KobjectUevent => protocols::NETLINK_KOBJECT_UEVENT,
            Protocol::Other(n) => n,
        }
    }
}

/// Blocking netlink socket bound to a kernel-assigned local address.
///
/// Send and receive block; no timeout or cancellation exists at this
/// layer (configure socket-level timeouts externally if needed). The
/// descriptor is closed exactly once when the handle drops.
///
/// The type adds no internal locking: one thread may send while another
/// receives, which is sound only because the underlying datagram
/// syscalls are independently thread-safe. Concurrent use of the same
/// operation from multiple threads is the caller's responsibility.
pub struct NetlinkSocket {
    socket: Socket,
    /// Kernel-assigned local address, fixed for the socket lifetime.
    local: SocketAddr,
}

impl NetlinkSocket {
    /// Open a netlink socket for the given protocol.
    ///
    /// Binds with port id 0 and no multicast groups, letting the kernel
    /// assign the local port id, then queries the assigned address.
    /// Fails if the reported address is not of the netlink family.
    pub fn open(protocol: Protocol) -> Result<Self> {
        let mut socket = Socket::new(protocol.as_isize())?;
        socket.bind(&SocketAddr::new(0, 0))?;
        let local = local_address(&socket)?;
        trace!(pid = local.port_number(), "netlink socket bound");
        Ok(Self { socket, local })
    }

    /// The kernel-assigned local port id.
    ///
    /// Replies addressed to this socket carry this value in their
    /// header's port id field.
    pub fn local_port(&self) -> u32 {
        self.local.port_number()
    }

    /// Send a finished message unicast to the kernel (port 0, no groups).
    pub fn send(&self, buf: &[u8]) -> Result<()> {
        let kernel = SocketAddr::new(0, 0);
        let sent = self.socket.send_to(buf, &kernel, 0)?;
        trace!(bytes = sent, "sent netlink request");
        Ok(())
    }

    /// Receive one datagram, verifying the sender.
    ///
    /// Reads into a page-sized buffer and returns exactly the bytes
    /// received. Fails with [`Error::PeerMismatch`] if the sender's
    /// port id is not `peer` (normally 0, the kernel). One datagram per
    /// call; nothing is buffered across calls.
    pub fn recv(&self, peer: u32) -> Result<Vec<u8>> {
        let mut buf = BytesMut::with_capacity(page_size());
        let (n, from) = self.socket.recv_from(&mut buf, 0)?;
        if from.port_number() != peer {
            return Err(Error::PeerMismatch {
                expected: peer,
                actual: from.port_number(),
            });
        }
        trace!(bytes = n, from = from.port_number(), "received netlink datagram");
        Ok(buf.to_vec())
    }
}

impl AsRawFd for NetlinkSocket {
    fn as_raw_fd(&self) -> RawFd {
        self.socket.as_raw_fd()
    }
}

/// Query the socket's bound address, checking the family.
///
/// The kernel reporting anything but `AF_NETLINK` here is a contract
/// violation, surfaced as an error rather than trusted or ignored.
fn local_address(socket: &Socket) -> Result<SocketAddr> {
    let mut sa: libc::sockaddr_nl = unsafe { std::mem::zeroed() };
    let mut len = std::mem::size_of::<libc::sockaddr_nl>() as libc::socklen_t;

    // SAFETY: sa is a zeroed sockaddr_nl and len matches its size; the
    // kernel writes at most len bytes into it.
    let rc = unsafe {
        libc::getsockname(
            socket.as_raw_fd(),
            (&raw mut sa).cast::<libc::sockaddr>(),
            &mut len,
        )
    };
    if rc < 0 {
        return Err(std::io::Error::last_os_error().into());
    }

    if sa.nl_family != libc::AF_NETLINK as libc::sa_family_t {
        return Err(Error::AddressFamily {
            family: sa.nl_family,
        });
    }

    Ok(SocketAddr::new(sa.nl_pid, sa.nl_groups))
}

fn page_size() -> usize {
    // SAFETY: sysconf has no memory-safety preconditions.
    let n = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if n > 0 { n as usize } else { 4096 }
}
