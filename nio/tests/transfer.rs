use std::io::Write;
use std::net::{TcpListener, TcpStream};
use std::os::fd::{AsRawFd, FromRawFd, IntoRawFd};
use std::thread;
use std::time::Duration;

use nio::{
  Family, SocketHandle, SocketKind, TransferOutcome, announce, dial,
  read_exact, write_exact,
};

/// Connected TCP pair built from the crate's own primitives.
fn tcp_pair() -> (SocketHandle, TcpStream) {
  let listener = announce(Family::V4, SocketKind::Stream, Some("127.0.0.1"), 0)
    .expect("announce failed");
  let port = listener.local_addr().expect("local_addr failed").port();
  let dialed = dial(Family::V4, SocketKind::Stream, None, 0, "127.0.0.1", port)
    .expect("dial failed");
  // SAFETY: fd ownership moves into the std listener exactly once.
  let listener = unsafe { TcpListener::from_raw_fd(listener.into_raw_fd()) };
  let (accepted, _) = listener.accept().expect("accept failed");
  (dialed, accepted)
}

/// Shrinks the send buffer so a large write cannot complete in one go.
fn shrink_send_buffer(fd: &impl AsRawFd) {
  let size: libc::c_int = 4096;
  // SAFETY: plain setsockopt on a live descriptor.
  let rc = unsafe {
    libc::setsockopt(
      fd.as_raw_fd(),
      libc::SOL_SOCKET,
      libc::SO_SNDBUF,
      &size as *const libc::c_int as *const libc::c_void,
      std::mem::size_of::<libc::c_int>() as libc::socklen_t,
    )
  };
  assert_eq!(rc, 0);
}

#[test]
fn write_then_read_moves_exactly_n_bytes() {
  let (local, remote) = tcp_pair();
  let payload: Vec<u8> = (0..1 << 20).map(|_| fastrand::u8(..)).collect();

  let expected = payload.clone();
  let writer = thread::spawn(move || write_exact(&local, &payload));

  let mut got = vec![0u8; expected.len()];
  let n = read_exact(&remote, &mut got).expect("read failed");
  assert_eq!(n, expected.len());
  assert_eq!(got, expected);

  match writer.join().unwrap() {
    TransferOutcome::Completed(n) => assert_eq!(n, expected.len()),
    other => panic!("expected completion, got {other:?}"),
  }
}

#[test]
fn read_stops_at_peer_close() {
  let (local, mut remote) = tcp_pair();
  remote.write_all(&[7u8; 100]).unwrap();
  drop(remote);

  let mut buf = [0u8; 256];
  let n = read_exact(&local, &mut buf).unwrap();
  assert_eq!(n, 100);
  assert!(buf[..n].iter().all(|&b| b == 7));
}

#[test]
fn read_returns_what_is_available_on_nonblocking_sockets() {
  let (local, mut remote) = tcp_pair();
  local.set_nonblocking(true).unwrap();

  let mut buf = [0u8; 32];
  assert_eq!(read_exact(&local, &mut buf).unwrap(), 0);

  remote.write_all(&[1u8; 8]).unwrap();
  thread::sleep(Duration::from_millis(50));
  assert_eq!(read_exact(&local, &mut buf).unwrap(), 8);
}

#[test]
fn blocked_write_reports_partial_and_resumes_to_n() {
  let (local, remote) = tcp_pair();
  shrink_send_buffer(&local);
  local.set_nonblocking(true).unwrap();

  let payload: Vec<u8> = (0..1 << 20).map(|_| fastrand::u8(..)).collect();
  let sent = match write_exact(&local, &payload) {
    TransferOutcome::Partial(n) => n,
    other => panic!("expected a partial write, got {other:?}"),
  };
  assert!(sent > 0 && sent < payload.len());

  let total = payload.len();
  let reader = thread::spawn(move || {
    let mut got = vec![0u8; total];
    let n = read_exact(&remote, &mut got).expect("read failed");
    assert_eq!(n, total);
    got
  });

  local.set_nonblocking(false).unwrap();
  match write_exact(&local, &payload[sent..]) {
    TransferOutcome::Completed(n) => assert_eq!(sent + n, payload.len()),
    other => panic!("expected the rest to complete, got {other:?}"),
  }

  assert_eq!(reader.join().unwrap(), payload);
}

#[test]
fn empty_write_completes_immediately() {
  let (local, _remote) = tcp_pair();
  assert!(matches!(write_exact(&local, &[]), TransferOutcome::Completed(0)));
}

#[test]
fn write_after_peer_close_is_a_hard_error() {
  let (local, remote) = tcp_pair();
  drop(remote);
  thread::sleep(Duration::from_millis(50));

  // The first write can still land in the kernel buffer; keep writing
  // until the reset surfaces.
  let buf = [0u8; 8192];
  for _ in 0..64 {
    match write_exact(&local, &buf) {
      TransferOutcome::Hard(err) => {
        assert!(matches!(
          err.kind(),
          std::io::ErrorKind::BrokenPipe
            | std::io::ErrorKind::ConnectionReset
        ));
        return;
      }
      _ => thread::sleep(Duration::from_millis(10)),
    }
  }
  panic!("peer close never surfaced as a hard error");
}
