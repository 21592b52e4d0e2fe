use std::{
  io, mem,
  net::SocketAddr,
  os::fd::{AsFd, AsRawFd, BorrowedFd, FromRawFd, IntoRawFd, RawFd},
};

use crate::addr::{SocketKind, sockaddr_into_std};

/// An owned socket descriptor.
///
/// The handle closes its descriptor on drop and is the only thing that
/// ever does: the transfer primitives borrow it, and the setup paths in
/// [`dial`](crate::dial) / [`announce`](crate::announce) only close
/// descriptors they created themselves and are about to abandon.
#[derive(Debug)]
pub struct SocketHandle {
  fd: RawFd,
}

impl SocketHandle {
  /// Creates a socket of the given family and kind with close-on-exec set.
  #[cfg(not(apple))]
  pub(crate) fn open(
    family: libc::c_int,
    kind: SocketKind,
  ) -> io::Result<Self> {
    let fd = syscall!(socket(family, kind.as_raw() | libc::SOCK_CLOEXEC, 0))?;
    Ok(SocketHandle { fd })
  }

  /// Creates a socket of the given family and kind with close-on-exec set.
  ///
  /// No SOCK_CLOEXEC on Apple platforms; the flag goes on right after
  /// creation instead.
  #[cfg(apple)]
  pub(crate) fn open(
    family: libc::c_int,
    kind: SocketKind,
  ) -> io::Result<Self> {
    let fd = syscall!(socket(family, kind.as_raw(), 0))?;
    if let Err(err) = syscall!(ioctl(fd, libc::FIOCLEX)) {
      // SAFETY: fd was just returned by socket() and is not shared yet.
      unsafe { libc::close(fd) };
      return Err(err);
    }
    Ok(SocketHandle { fd })
  }

  /// Local address the descriptor is bound to.
  pub fn local_addr(&self) -> io::Result<SocketAddr> {
    // SAFETY: zeroed storage is a valid out-buffer for getsockname.
    let mut storage: libc::sockaddr_storage = unsafe { mem::zeroed() };
    let mut len = mem::size_of::<libc::sockaddr_storage>() as libc::socklen_t;
    syscall!(getsockname(
      self.fd,
      (&mut storage as *mut libc::sockaddr_storage).cast(),
      &mut len,
    ))?;
    sockaddr_into_std(&storage)
  }

  /// Address of the connected peer.
  ///
  /// Fails with ENOTCONN while a non-blocking connect is still in flight.
  pub fn peer_addr(&self) -> io::Result<SocketAddr> {
    // SAFETY: zeroed storage is a valid out-buffer for getpeername.
    let mut storage: libc::sockaddr_storage = unsafe { mem::zeroed() };
    let mut len = mem::size_of::<libc::sockaddr_storage>() as libc::socklen_t;
    syscall!(getpeername(
      self.fd,
      (&mut storage as *mut libc::sockaddr_storage).cast(),
      &mut len,
    ))?;
    sockaddr_into_std(&storage)
  }

  /// Switches the descriptor between blocking and non-blocking mode.
  pub fn set_nonblocking(&self, nonblocking: bool) -> io::Result<()> {
    let mut flag = nonblocking as libc::c_int;
    syscall!(ioctl(self.fd, libc::FIONBIO, &mut flag)).map(|_| ())
  }
}

impl Drop for SocketHandle {
  fn drop(&mut self) {
    // SAFETY: the fd is owned and this is the only close.
    let _ = unsafe { libc::close(self.fd) };
  }
}

impl AsRawFd for SocketHandle {
  fn as_raw_fd(&self) -> RawFd {
    self.fd
  }
}

impl AsFd for SocketHandle {
  fn as_fd(&self) -> BorrowedFd<'_> {
    // SAFETY: the fd is owned by self and stays open for the borrow.
    unsafe { BorrowedFd::borrow_raw(self.fd) }
  }
}

impl FromRawFd for SocketHandle {
  unsafe fn from_raw_fd(fd: RawFd) -> Self {
    SocketHandle { fd }
  }
}

impl IntoRawFd for SocketHandle {
  fn into_raw_fd(self) -> RawFd {
    let fd = self.fd;
    mem::forget(self);
    fd
  }
}
