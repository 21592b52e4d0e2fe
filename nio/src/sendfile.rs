//! Zero-copy bulk transfer between two descriptors.
//!
//! Three kernels expose three incompatible sendfile signatures: Linux
//! reports progress as the call's result, FreeBSD through an `sbytes`
//! output parameter, macOS through an in-out length parameter. Each
//! platform implements the one [`Chunk`]-producing adapter below; the
//! retry loop and outcome classification sit above it and never branch
//! on the platform.

#[cfg(sendfile)]
use std::os::fd::RawFd;
use std::{io, os::fd::AsRawFd};

#[cfg(sendfile)]
use crate::transfer::transient;
use crate::transfer::TransferOutcome;

/// Whether this build carries a zero-copy bulk path.
pub const fn bulk_copy_supported() -> bool {
  cfg!(sendfile)
}

/// One zero-copy attempt: how many bytes the kernel moved, and the error
/// if the attempt did not finish cleanly (bytes may move even then).
#[cfg(sendfile)]
enum Chunk {
  Moved(usize),
  Error(usize, io::Error),
}

#[cfg(linux)]
fn transfer_chunk(from: RawFd, to: RawFd, offset: u64, len: usize) -> Chunk {
  let mut off = offset as libc::off_t;
  // SAFETY: both descriptors are borrowed from live owners and `off` is a
  // valid in-out parameter for the duration of the call.
  let r = unsafe { libc::sendfile(to, from, &mut off, len) };
  if r < 0 {
    Chunk::Error(0, io::Error::last_os_error())
  } else {
    Chunk::Moved(r as usize)
  }
}

#[cfg(freebsd)]
fn transfer_chunk(from: RawFd, to: RawFd, offset: u64, len: usize) -> Chunk {
  let mut sent: libc::off_t = 0;
  // SAFETY: both descriptors are borrowed from live owners and `sent` is
  // a valid out-parameter for the duration of the call.
  let r = unsafe {
    libc::sendfile(
      from,
      to,
      offset as libc::off_t,
      len,
      std::ptr::null_mut(),
      &mut sent,
      0,
    )
  };
  if r < 0 {
    Chunk::Error(sent as usize, io::Error::last_os_error())
  } else {
    Chunk::Moved(sent as usize)
  }
}

#[cfg(apple)]
fn transfer_chunk(from: RawFd, to: RawFd, offset: u64, len: usize) -> Chunk {
  let mut sent = len as libc::off_t;
  // SAFETY: both descriptors are borrowed from live owners and `sent` is
  // a valid in-out parameter for the duration of the call.
  let r = unsafe {
    libc::sendfile(
      from,
      to,
      offset as libc::off_t,
      &mut sent,
      std::ptr::null_mut(),
      0,
    )
  };
  if r < 0 {
    Chunk::Error(sent as usize, io::Error::last_os_error())
  } else {
    Chunk::Moved(sent as usize)
  }
}

/// Moves `count` bytes from `from` to `to` inside the kernel, without
/// copying through a userspace buffer. Each call starts reading `from`
/// at offset zero.
///
/// `from` must be something the platform accepts as a sendfile source (a
/// regular file on every supported platform). Builds without the
/// facility report a hard "not supported" error and callers fall back to
/// a [`read_exact`](crate::read_exact) / [`write_exact`](crate::write_exact)
/// pair, which moves identical bytes.
#[cfg(sendfile)]
pub fn bulk_copy(
  from: &impl AsRawFd,
  to: &impl AsRawFd,
  count: usize,
) -> TransferOutcome {
  let (from, to) = (from.as_raw_fd(), to.as_raw_fd());
  let mut left = count;

  while left > 0 {
    let offset = (count - left) as u64;
    match transfer_chunk(from, to, offset, left) {
      // Zero-length result: the source has nothing more to give.
      Chunk::Moved(0) => return TransferOutcome::Soft,
      Chunk::Moved(n) => left -= n,
      Chunk::Error(n, err) => {
        left -= n;
        if transient(&err) {
          return if left == count {
            TransferOutcome::Soft
          } else {
            TransferOutcome::Partial(count - left)
          };
        }
        if matches!(
          err.raw_os_error(),
          Some(libc::ENOBUFS) | Some(libc::ENOMEM)
        ) {
          return TransferOutcome::Soft;
        }
        return TransferOutcome::Hard(err);
      }
    }
  }

  TransferOutcome::Completed(count)
}

/// See the sendfile-enabled version; this build has no zero-copy
/// facility, so every call reports "not supported".
#[cfg(not(sendfile))]
pub fn bulk_copy(
  _from: &impl AsRawFd,
  _to: &impl AsRawFd,
  _count: usize,
) -> TransferOutcome {
  TransferOutcome::Hard(io::Error::from_raw_os_error(libc::ENOSYS))
}
