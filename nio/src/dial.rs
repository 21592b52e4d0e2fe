use std::{io, os::fd::AsRawFd};

use tracing::debug;

use crate::{
  addr::{AddrSpec, Family, Resolved, SocketKind, resolve},
  error::DialError,
  handle::SocketHandle,
};

/// What the connect step reported. An [`InProgress`](ConnectStart::InProgress)
/// descriptor is healthy; the connect completes (or fails) asynchronously
/// and the caller observes the outcome on first use.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ConnectStart {
  Established,
  InProgress,
}

/// Opens a socket, optionally binds it to a local endpoint, and connects
/// it to `remote_host:remote_port`.
///
/// A nonzero `local_port` pins the connection to that source port,
/// overriding whatever port the local lookup produced. A connect that is
/// merely still in flight (non-blocking descriptor semantics) counts as
/// success; the possibly-still-connecting handle is returned.
pub fn dial(
  family: Family,
  kind: SocketKind,
  local_host: Option<&str>,
  local_port: u16,
  remote_host: &str,
  remote_port: u16,
) -> Result<SocketHandle, DialError> {
  let local = match local_host {
    Some(_) => Some(resolve(
      AddrSpec { family, kind, host: local_host, port: local_port },
      false,
    )?),
    None => None,
  };

  let mut remote = resolve(
    AddrSpec { family, kind, host: Some(remote_host), port: remote_port },
    false,
  )?;

  // The remote lookup decides the concrete family; Unspec never reaches
  // socket(2).
  let handle =
    SocketHandle::open(remote.family, kind).map_err(DialError::Socket)?;

  if let Some(mut local) = local {
    if local_port != 0 {
      local.set_port(local_port);
    }
    syscall!(bind(handle.as_raw_fd(), local.as_ptr(), local.len()))
      .map_err(DialError::Bind)?;
  }

  remote.set_port(remote_port);
  let start = connect_start(&handle, &remote).map_err(DialError::Connect)?;
  debug!(remote_host, remote_port, ?start, "dialed");

  Ok(handle)
}

fn connect_start(
  handle: &SocketHandle,
  remote: &Resolved,
) -> io::Result<ConnectStart> {
  match syscall!(connect(handle.as_raw_fd(), remote.as_ptr(), remote.len()))
  {
    Ok(_) => Ok(ConnectStart::Established),
    Err(err) if err.raw_os_error() == Some(libc::EINPROGRESS) => {
      Ok(ConnectStart::InProgress)
    }
    Err(err) => Err(err),
  }
}
