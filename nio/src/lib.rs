//! Minimal cross-platform socket I/O primitives.
//!
//! `nio` hands a measurement-style caller a connected or listening
//! descriptor and moves exactly-counted byte ranges over it, reporting
//! what actually happened. Four primitives cover the whole surface:
//!
//! - [`dial`] — outbound TCP/UDP connection, optionally pinned to a
//!   local address and source port.
//! - [`announce`] — bound/listening socket, with a dual-stack policy for
//!   wildcard binds.
//! - [`read_exact`] / [`write_exact`] — counted transfer loops that stop
//!   cleanly on transient conditions instead of spinning or failing.
//! - [`bulk_copy`] — zero-copy descriptor-to-descriptor transfer where
//!   the kernel has one.
//!
//! Everything is synchronous and descriptor-oriented: no event loop, no
//! internal threads, no retry policy beyond the current call. A
//! [`TransferOutcome::Partial`] or [`TransferOutcome::Soft`] outcome
//! means "this call will not proceed further right now"; the caller
//! decides whether to poll readiness, sleep, or retry. One thread may
//! own reads and another writes on the same descriptor, but concurrent
//! calls on the same direction must be serialized by the caller.
//!
//! ## Zero-copy support
//!
//! | Platform | Facility                       | [`bulk_copy_supported`] |
//! |----------|--------------------------------|-------------------------|
//! | Linux    | `sendfile(2)`, result-as-count | yes                     |
//! | FreeBSD  | `sendfile(2)`, `sbytes` param  | yes                     |
//! | macOS    | `sendfile(2)`, in-out length   | yes                     |
//! | others   | —                              | no (`bulk_copy` fails)  |

#[macro_use]
mod macros;

mod addr;
mod announce;
mod dial;
mod error;
mod handle;
mod sendfile;
mod transfer;

pub use addr::{Family, SocketKind};
pub use announce::announce;
pub use dial::dial;
pub use error::{DialError, ListenError, ResolutionError};
pub use handle::SocketHandle;
pub use sendfile::{bulk_copy, bulk_copy_supported};
pub use transfer::{TransferOutcome, read_exact, write_exact};
