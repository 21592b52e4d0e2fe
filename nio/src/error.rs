use std::io;

use thiserror::Error;

/// Name or address lookup failure.
///
/// Carries the resolver's own diagnostic text (`gai_strerror`, or the
/// errno description when the resolver reports a system error).
#[derive(Debug, Error)]
#[error("cannot resolve {host}: {detail}")]
pub struct ResolutionError {
  host: String,
  detail: String,
}

impl ResolutionError {
  pub(crate) fn new(host: Option<&str>, detail: impl Into<String>) -> Self {
    Self {
      host: host.unwrap_or("<wildcard>").to_owned(),
      detail: detail.into(),
    }
  }
}

/// Failure while setting up an outbound connection.
///
/// Whatever variant surfaces, the partially constructed socket (if one
/// existed) has already been closed.
#[derive(Debug, Error)]
pub enum DialError {
  #[error(transparent)]
  Resolution(#[from] ResolutionError),
  #[error("socket creation failed")]
  Socket(#[source] io::Error),
  #[error("binding the local address failed")]
  Bind(#[source] io::Error),
  #[error("connect failed")]
  Connect(#[source] io::Error),
}

/// Failure while setting up a listening socket.
///
/// Same cleanup guarantee as [`DialError`]: no descriptor survives a
/// failed announce.
#[derive(Debug, Error)]
pub enum ListenError {
  #[error(transparent)]
  Resolution(#[from] ResolutionError),
  #[error("socket creation failed")]
  Socket(#[source] io::Error),
  #[error("enabling address reuse failed")]
  ReuseAddr(#[source] io::Error),
  #[error("applying the dual-stack accept policy failed")]
  V6Only(#[source] io::Error),
  #[error("bind failed")]
  Bind(#[source] io::Error),
  #[error("listen failed")]
  Listen(#[source] io::Error),
}
