//! # xcloud_listener
//!
//! Native messaging host for the Xcloud browser extension.
//!
//! - Talks to the extension over **stdin/stdout** with length-prefixed JSON frames
//! - Exposes a small **HTTP trigger** (`/action`) that pushes messages to the extension
//! - Installs, verifies and removes the **host manifest** for common browsers
//!
//! ---
//!
//! ## Wire protocol
//!
//! 1. The sender writes a **4-byte length prefix** (`u32`) in **native endianness**.
//! 2. Then writes **that many bytes** of UTF-8 JSON.
//!
//! The extension sends `{"query": "..."}`. The host answers with the response
//! **string only**, e.g. `"pong"`:
//!
//! | query     | response    |
//! |-----------|-------------|
//! | `ping`    | `pong`      |
//! | `hello`   | `goodbye`   |
//! | anything  | `42`        |
//!
//! Malformed JSON is answered as if the query were empty (`"42"`).
//!
//! ### Gotchas
//!
//! - **Disconnect is normal:** the browser closes stdin when the extension disconnects.
//!   The stdio loop treats that as a clean shutdown.
//! - **Incoming size:** frames above the buffer size (8192 bytes by default) are drained and
//!   dropped without a reply, see [`codec::OversizePolicy`].
//! - **Outgoing size:** host → browser frames are capped at 1 MiB ([`codec::MAX_TO_BROWSER`]).
//! - **Never log to stdout:** stdout is reserved for frames. Logs go to
//!   `xcloudListener.log`, or stderr if that file cannot be opened.
//!
//! ---
//!
//! ## Crate layout
//!
//! - [`codec`] — length-prefix framing.
//! - [`message`] — JSON envelopes and the query → response table.
//! - [`host`] — stdio loop and the single frame writer.
//! - [`http`] — HTTP trigger endpoint.
//! - [`install`] — browser manifest install/verify/remove.
//!
//! ---
//!
//! ## Pure framing
//!
//! ```rust
//! use std::io::Cursor;
//! use xcloud_listener::codec::{read_frame, write_frame, Frame, OversizePolicy, DEFAULT_BUFFER_SIZE};
//!
//! let mut wire = Vec::new();
//! write_frame(&mut wire, br#"{"query":"ping"}"#).unwrap();
//!
//! let mut cur = Cursor::new(wire);
//! let frame = read_frame(&mut cur, DEFAULT_BUFFER_SIZE, OversizePolicy::Skip).unwrap();
//! assert_eq!(frame, Frame::Payload(br#"{"query":"ping"}"#.to_vec()));
//! ```
//!
//! ## Running the stdio loop on any reader/writer
//!
//! All writes go through a [`host::Sender`], which feeds one writer thread.
//!
//! ```no_run
//! use std::io;
//! use xcloud_listener::codec::{OversizePolicy, DEFAULT_BUFFER_SIZE};
//! use xcloud_listener::host::{run_stdio, spawn_writer};
//!
//! # fn main() -> Result<(), xcloud_listener::NmError> {
//! let (sender, writer) = spawn_writer(io::stdout())?;
//! run_stdio(&mut io::stdin().lock(), DEFAULT_BUFFER_SIZE, OversizePolicy::Skip, &sender)?;
//! drop(sender);
//! let _ = writer.join();
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod host;
pub mod http;
#[cfg(feature = "install")]
pub mod install;
pub mod logging;
pub mod message;

#[doc(inline)]
pub use error::NmError;

#[doc(inline)]
pub use host::{run_stdio, spawn_writer, Sender};

#[doc(inline)]
pub use message::{IncomingMessage, OutgoingMessage};
