use std::{
  ffi::{CStr, CString},
  io, mem,
  net::{Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV4, SocketAddrV6},
  ptr,
};

use crate::error::ResolutionError;

/// Address family selector for [`dial`](crate::dial) and
/// [`announce`](crate::announce).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Family {
  /// Let resolution pick the concrete family.
  Unspec,
  V4,
  V6,
}

impl Family {
  pub(crate) fn as_raw(self) -> libc::c_int {
    match self {
      Family::Unspec => libc::AF_UNSPEC,
      Family::V4 => libc::AF_INET,
      Family::V6 => libc::AF_INET6,
    }
  }
}

/// Transport kind of the descriptor being set up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SocketKind {
  Stream,
  Datagram,
}

impl SocketKind {
  pub(crate) fn as_raw(self) -> libc::c_int {
    match self {
      SocketKind::Stream => libc::SOCK_STREAM,
      SocketKind::Datagram => libc::SOCK_DGRAM,
    }
  }
}

/// One name-lookup request.
///
/// The port only reaches the resolver for passive (bind-intended)
/// lookups. Active lookups resolve on family/kind alone and stamp the
/// port onto the resolved sockaddr afterwards.
#[derive(Clone, Copy, Debug)]
pub(crate) struct AddrSpec<'a> {
  pub family: Family,
  pub kind: SocketKind,
  pub host: Option<&'a str>,
  pub port: u16,
}

/// The first usable result of a lookup, copied out of the addrinfo list
/// so no exit path has a list left to free.
#[derive(Debug)]
pub(crate) struct Resolved {
  pub family: libc::c_int,
  storage: libc::sockaddr_storage,
  len: libc::socklen_t,
}

impl Resolved {
  /// Stamps `port` over whatever port resolution produced.
  pub fn set_port(&mut self, port: u16) {
    set_port(&mut self.storage, port);
  }

  pub fn as_ptr(&self) -> *const libc::sockaddr {
    (&self.storage as *const libc::sockaddr_storage).cast()
  }

  pub fn len(&self) -> libc::socklen_t {
    self.len
  }
}

/// Resolves `spec` and selects the first result.
pub(crate) fn resolve(
  spec: AddrSpec<'_>,
  passive: bool,
) -> Result<Resolved, ResolutionError> {
  // SAFETY: addrinfo is a plain C struct; all-zero is a valid empty hint set.
  let mut hints: libc::addrinfo = unsafe { mem::zeroed() };
  hints.ai_family = spec.family.as_raw();
  hints.ai_socktype = spec.kind.as_raw();
  if passive {
    hints.ai_flags = libc::AI_PASSIVE;
  }

  let host = match spec.host {
    Some(host) => Some(CString::new(host).map_err(|_| {
      ResolutionError::new(spec.host, "host contains an interior NUL byte")
    })?),
    None => None,
  };
  let service = if passive {
    // Decimal digits never contain a NUL byte.
    Some(CString::new(spec.port.to_string()).unwrap())
  } else {
    None
  };

  let mut list: *mut libc::addrinfo = ptr::null_mut();
  // SAFETY: hints and the out pointer live across the call; host/service
  // are NUL-terminated or null.
  let rc = unsafe {
    libc::getaddrinfo(
      host.as_ref().map_or(ptr::null(), |h| h.as_ptr()),
      service.as_ref().map_or(ptr::null(), |s| s.as_ptr()),
      &hints,
      &mut list,
    )
  };
  if rc != 0 {
    return Err(ResolutionError::new(spec.host, gai_detail(rc)));
  }

  // SAFETY: a zero return guarantees a non-empty result list.
  let first = unsafe { &*list };
  let mut storage: libc::sockaddr_storage = unsafe { mem::zeroed() };
  let len = first.ai_addrlen as libc::socklen_t;
  // SAFETY: ai_addr points to ai_addrlen valid bytes, and sockaddr_storage
  // holds any address the resolver can produce.
  unsafe {
    ptr::copy_nonoverlapping(
      first.ai_addr as *const u8,
      (&mut storage as *mut libc::sockaddr_storage) as *mut u8,
      first.ai_addrlen as usize,
    );
  }
  let family = first.ai_family;
  // SAFETY: the list came from a successful getaddrinfo and is freed once.
  unsafe { libc::freeaddrinfo(list) };

  Ok(Resolved { family, storage, len })
}

fn gai_detail(rc: libc::c_int) -> String {
  if rc == libc::EAI_SYSTEM {
    return io::Error::last_os_error().to_string();
  }
  // SAFETY: gai_strerror returns a static NUL-terminated string.
  let msg = unsafe { CStr::from_ptr(libc::gai_strerror(rc)) };
  msg.to_string_lossy().into_owned()
}

/// Stamps a port (network byte order) into a v4 or v6 sockaddr.
pub(crate) fn set_port(storage: &mut libc::sockaddr_storage, port: u16) {
  if storage.ss_family == libc::AF_INET as libc::sa_family_t {
    // SAFETY: family checked, so the storage holds a sockaddr_in.
    let v4 = unsafe {
      &mut *(storage as *mut libc::sockaddr_storage).cast::<libc::sockaddr_in>()
    };
    v4.sin_port = port.to_be();
  } else if storage.ss_family == libc::AF_INET6 as libc::sa_family_t {
    // SAFETY: family checked, so the storage holds a sockaddr_in6.
    let v6 = unsafe {
      &mut *(storage as *mut libc::sockaddr_storage)
        .cast::<libc::sockaddr_in6>()
    };
    v6.sin6_port = port.to_be();
  }
}

/// Converts a kernel-filled sockaddr (getsockname/getpeername output)
/// into a std address.
pub(crate) fn sockaddr_into_std(
  storage: &libc::sockaddr_storage,
) -> io::Result<SocketAddr> {
  if storage.ss_family == libc::AF_INET as libc::sa_family_t {
    // SAFETY: family checked, so the storage holds a sockaddr_in.
    let v4 = unsafe {
      &*(storage as *const libc::sockaddr_storage).cast::<libc::sockaddr_in>()
    };
    let ip = Ipv4Addr::from(u32::from_be(v4.sin_addr.s_addr));
    Ok(SocketAddr::V4(SocketAddrV4::new(ip, u16::from_be(v4.sin_port))))
  } else if storage.ss_family == libc::AF_INET6 as libc::sa_family_t {
    // SAFETY: family checked, so the storage holds a sockaddr_in6.
    let v6 = unsafe {
      &*(storage as *const libc::sockaddr_storage)
        .cast::<libc::sockaddr_in6>()
    };
    let ip = Ipv6Addr::from(v6.sin6_addr.s6_addr);
    Ok(SocketAddr::V6(SocketAddrV6::new(
      ip,
      u16::from_be(v6.sin6_port),
      v6.sin6_flowinfo,
      v6.sin6_scope_id,
    )))
  } else {
    Err(io::Error::from_raw_os_error(libc::EAFNOSUPPORT))
  }
}
