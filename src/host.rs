//! Stdio side of the host: the read/dispatch loop and the single frame writer.
//!
//! Both the stdio loop and the HTTP endpoint send through a [`Sender`]. Every
//! `Sender` feeds one writer thread, so frames never interleave on stdout.

use std::io::{self, Read, Write};
use std::thread::{self, JoinHandle};

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, info_span, trace, warn};

use crate::codec::{read_frame, write_frame, Frame, OversizePolicy};
use crate::error::NmError;
use crate::message::{decode_incoming_or_default, encode_outgoing, OutgoingMessage};

#[derive(Debug)]
enum WriterMsg {
    Frame(Vec<u8>),
    Flush(oneshot::Sender<()>),
}

/// Cloneable handle that queues outgoing messages for the frame writer.
#[derive(Debug, Clone)]
pub struct Sender {
    tx: mpsc::UnboundedSender<WriterMsg>,
}

impl Sender {
    /// Encode `msg` and queue it for writing.
    ///
    /// Returns [`NmError::SerializeJson`] if the message cannot be encoded (nothing
    /// is queued) and [`NmError::Disconnected`] once the writer has stopped.
    pub fn send(&self, msg: &OutgoingMessage) -> Result<(), NmError> {
        let body = encode_outgoing(msg)?;
        self.tx
            .send(WriterMsg::Frame(body))
            .map_err(|_| NmError::Disconnected)
    }

    /// Wait until every message queued before this call has been written.
    pub async fn flush(&self) -> Result<(), NmError> {
        let (ack, done) = oneshot::channel();
        self.tx
            .send(WriterMsg::Flush(ack))
            .map_err(|_| NmError::Disconnected)?;
        done.await.map_err(|_| NmError::Disconnected)
    }

    /// True once the writer has stopped accepting frames.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Start the writer thread that owns `sink`.
///
/// The thread writes each queued payload as one frame and flushes it. It exits
/// with `Ok(())` when every [`Sender`] is dropped, or with the first write error.
/// Payloads over the browser limit are logged and dropped.
pub fn spawn_writer<W>(mut sink: W) -> io::Result<(Sender, JoinHandle<Result<(), NmError>>)>
where
    W: Write + Send + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<WriterMsg>();

    let handle = thread::Builder::new()
        .name("frame-writer".to_string())
        .spawn(move || {
            let _span = info_span!("writer").entered();
            while let Some(msg) = rx.blocking_recv() {
                let body = match msg {
                    WriterMsg::Frame(body) => body,
                    WriterMsg::Flush(ack) => {
                        let _ = ack.send(());
                        continue;
                    }
                };
                match write_frame(&mut sink, &body) {
                    Ok(()) => trace!(bytes = body.len(), "frame written"),
                    Err(NmError::Io(e)) => {
                        error!(error = %e, "unable to write message to stdout");
                        return Err(NmError::Io(e));
                    }
                    Err(e) => error!(error = %e, "message dropped"),
                }
            }
            debug!("all senders dropped, writer stopping");
            Ok(())
        })?;

    Ok((Sender { tx }, handle))
}

/// Decode one payload and build the reply for it.
///
/// Malformed JSON is not an error here: it is treated as an empty query.
pub fn dispatch(payload: &[u8]) -> OutgoingMessage {
    let incoming = decode_incoming_or_default(payload);
    trace!(message = %String::from_utf8_lossy(payload), "message received");
    OutgoingMessage::answer(incoming.query)
}

/// Read frames from `reader` until it closes, answering each through `sender`.
///
/// Returns `Ok(())` on end of stream. Read failures and a stopped writer end
/// the loop with an error; the caller treats those as fatal.
pub fn run_stdio<R: Read>(
    reader: &mut R,
    max_size: usize,
    policy: OversizePolicy,
    sender: &Sender,
) -> Result<(), NmError> {
    let _span = info_span!("stdio").entered();
    info!(buffer_size = max_size, %policy, "reading messages from stdin");

    loop {
        let payload = match read_frame(reader, max_size, policy) {
            Ok(Frame::Payload(payload)) => payload,
            Ok(Frame::Skipped { declared }) => {
                warn!(declared, "oversize message dropped without reply");
                continue;
            }
            Ok(Frame::Eof) => {
                info!("stdin closed");
                return Ok(());
            }
            Err(e) => {
                error!(error = %e, "unable to read message");
                return Err(e);
            }
        };

        let reply = dispatch(&payload);
        match sender.send(&reply) {
            Ok(()) => debug!(query = %reply.query, response = %reply.response, "reply queued"),
            Err(e) if e.is_fatal() => {
                error!(error = %e, "unable to send reply");
                return Err(e);
            }
            Err(e) => error!(error = %e, "reply dropped"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_maps_known_queries() {
        assert_eq!(dispatch(br#"{"query":"ping"}"#).response, "pong");
        assert_eq!(dispatch(br#"{"query":"hello"}"#).response, "goodbye");
        assert_eq!(dispatch(br#"{"query":"zzz"}"#).response, "42");
    }

    #[test]
    fn dispatch_survives_garbage() {
        let reply = dispatch(b"\xff\xfe not json");
        assert_eq!(reply.query, "");
        assert_eq!(reply.response, "42");
    }

    #[test]
    fn send_after_writer_exit_is_disconnected() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let sender = Sender { tx };
        assert!(sender.is_closed());
        let err = sender
            .send(&OutgoingMessage::echo("ping"))
            .expect_err("writer is gone");
        assert!(matches!(err, NmError::Disconnected));
    }
}
