use std::io::ErrorKind;
use std::net::{TcpListener, UdpSocket};
use std::os::fd::{FromRawFd, IntoRawFd};

use nio::{
  DialError, Family, SocketKind, TransferOutcome, announce, dial, write_exact,
};

#[test]
fn dial_connects_to_a_listener() {
  let listener = TcpListener::bind("127.0.0.1:0").unwrap();
  let target = listener.local_addr().unwrap();

  let handle = dial(
    Family::V4,
    SocketKind::Stream,
    None,
    0,
    "127.0.0.1",
    target.port(),
  )
  .expect("dial failed");

  let (_accepted, peer) = listener.accept().unwrap();
  assert_eq!(peer, handle.local_addr().unwrap());
  assert_eq!(handle.peer_addr().unwrap(), target);
}

#[test]
fn dial_pins_the_source_port() {
  let listener = TcpListener::bind("127.0.0.1:0").unwrap();
  let target_port = listener.local_addr().unwrap().port();

  // A port the kernel just considered free.
  let probe = TcpListener::bind("127.0.0.1:0").unwrap();
  let src_port = probe.local_addr().unwrap().port();
  drop(probe);

  let handle = dial(
    Family::V4,
    SocketKind::Stream,
    Some("127.0.0.1"),
    src_port,
    "127.0.0.1",
    target_port,
  )
  .expect("dial failed");

  let (_accepted, peer) = listener.accept().unwrap();
  assert_eq!(peer.port(), src_port);
  assert_eq!(handle.local_addr().unwrap().port(), src_port);
}

#[test]
fn dial_surfaces_remote_resolution_failures() {
  let err = dial(
    Family::Unspec,
    SocketKind::Stream,
    None,
    0,
    "nowhere.invalid",
    1,
  )
  .unwrap_err();
  assert!(matches!(err, DialError::Resolution(_)));
}

#[test]
fn dial_surfaces_local_resolution_failures() {
  let err = dial(
    Family::V4,
    SocketKind::Stream,
    Some("nowhere.invalid"),
    0,
    "127.0.0.1",
    1,
  )
  .unwrap_err();
  assert!(matches!(err, DialError::Resolution(_)));
}

#[test]
fn dial_reports_refused_connects() {
  let probe = TcpListener::bind("127.0.0.1:0").unwrap();
  let dead_port = probe.local_addr().unwrap().port();
  drop(probe);

  let err =
    dial(Family::V4, SocketKind::Stream, None, 0, "127.0.0.1", dead_port)
      .unwrap_err();
  match err {
    DialError::Connect(source) => {
      assert_eq!(source.kind(), ErrorKind::ConnectionRefused)
    }
    other => panic!("expected a connect failure, got {other}"),
  }
}

#[test]
fn dial_datagram_sockets() {
  let receiver =
    announce(Family::V4, SocketKind::Datagram, Some("127.0.0.1"), 0).unwrap();
  let port = receiver.local_addr().unwrap().port();
  // SAFETY: fd ownership moves into the std socket exactly once.
  let receiver =
    unsafe { UdpSocket::from_raw_fd(receiver.into_raw_fd()) };

  let sender =
    dial(Family::V4, SocketKind::Datagram, None, 0, "127.0.0.1", port)
      .unwrap();
  match write_exact(&sender, b"ping") {
    TransferOutcome::Completed(4) => {}
    other => panic!("datagram send: {other:?}"),
  }

  let mut buf = [0u8; 16];
  let (n, _) = receiver.recv_from(&mut buf).unwrap();
  assert_eq!(&buf[..n], b"ping");
}
