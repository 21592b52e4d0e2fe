use std::{io, os::fd::AsRawFd};

use tracing::{debug, trace};

use crate::{
  addr::{AddrSpec, Family, SocketKind, resolve},
  error::ListenError,
  handle::SocketHandle,
};

/// Queue depth for freshly announced stream sockets.
const LISTEN_BACKLOG: libc::c_int = 5;

/// Creates a bound (and, for stream sockets, listening) socket on
/// `local_host:port`.
///
/// With no family and no local host given, the wildcard bind resolves as
/// IPv6 and accepts IPv4-mapped peers too where the platform allows it.
/// An explicit [`Family::V6`] keeps the listener IPv6-only.
pub fn announce(
  family: Family,
  kind: SocketKind,
  local_host: Option<&str>,
  port: u16,
) -> Result<SocketHandle, ListenError> {
  // A passive AF_UNSPEC wildcard lookup comes back as an IPv4 wildcard on
  // several platforms, which could never accept IPv6 peers. Force IPv6
  // here and let the v6only option below bring IPv4 back in.
  let lookup_family = if family == Family::Unspec && local_host.is_none() {
    trace!("wildcard bind with unspecified family, forcing IPv6");
    Family::V6
  } else {
    family
  };

  let resolved = resolve(
    AddrSpec { family: lookup_family, kind, host: local_host, port },
    true,
  )?;

  let handle =
    SocketHandle::open(resolved.family, kind).map_err(ListenError::Socket)?;

  set_sockopt(&handle, libc::SOL_SOCKET, libc::SO_REUSEADDR, 1)
    .map_err(ListenError::ReuseAddr)?;

  // Decide whether the socket also accepts IPv4-mapped peers. Only done
  // when the caller left the family open; an explicit V6 request keeps
  // strict separation. OpenBSD implements IPV6_V6ONLY but rejects
  // IPv4-mapped addresses, so the listener stays IPv6-only there.
  #[cfg(not(target_os = "openbsd"))]
  if resolved.family == libc::AF_INET6
    && matches!(family, Family::Unspec | Family::V6)
  {
    let v6only = match family {
      Family::Unspec => 0,
      _ => 1,
    };
    trace!(v6only, "dual-stack accept policy");
    set_sockopt(&handle, libc::IPPROTO_IPV6, libc::IPV6_V6ONLY, v6only)
      .map_err(ListenError::V6Only)?;
  }

  syscall!(bind(handle.as_raw_fd(), resolved.as_ptr(), resolved.len()))
    .map_err(ListenError::Bind)?;

  if kind == SocketKind::Stream {
    syscall!(listen(handle.as_raw_fd(), LISTEN_BACKLOG))
      .map_err(ListenError::Listen)?;
  }

  debug!(?local_host, port, ?kind, "announced");
  Ok(handle)
}

fn set_sockopt(
  handle: &SocketHandle,
  level: libc::c_int,
  option: libc::c_int,
  value: libc::c_int,
) -> io::Result<()> {
  syscall!(setsockopt(
    handle.as_raw_fd(),
    level,
    option,
    &value as *const libc::c_int as *const libc::c_void,
    std::mem::size_of::<libc::c_int>() as libc::socklen_t,
  ))
  .map(|_| ())
}
