//! TCP transport speaking newline-delimited JSON.
//!
//! The first line of a connection is a [`Handshake`]; every following line is
//! a [`ClientMessage`]. Lines that are not UTF-8 or exceed
//! [`MAX_LINE_BYTES`] are skipped like any other malformed message. Outbound
//! messages are written one per line by a dedicated writer task so a slow
//! socket never blocks the scheduler.

use std::{io, net::SocketAddr, sync::Arc};

use dice_defense_core::Deck;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader},
    net::{
        tcp::{OwnedReadHalf, OwnedWriteHalf},
        TcpListener, TcpStream,
    },
    sync::watch,
};
use tracing::{debug, info, warn, Instrument};

use crate::{
    config::parse_deck,
    error::ServerError,
    protocol::{self, Handshake, ServerMessage},
    registry::{SessionId, SessionRegistry},
    transport::{self, Inbound},
};

/// Longest accepted inbound line in bytes, excluding the terminator.
pub const MAX_LINE_BYTES: usize = 8 * 1024;

/// Accepts connections until `shutdown` turns `true` or closes.
pub async fn serve(
    listener: TcpListener,
    registry: Arc<SessionRegistry>,
    default_deck: Deck,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), ServerError> {
    info!(addr = %listener.local_addr()?, "listening");
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = accepted?;
                let registry = Arc::clone(&registry);
                let deck = default_deck.clone();
                let span = tracing::info_span!("connection", %peer);
                let _ = tokio::spawn(
                    async move {
                        if let Err(error) = handle_connection(stream, peer, registry, deck).await {
                            warn!(%error, "connection closed with error");
                        }
                    }
                    .instrument(span),
                );
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }
    info!("listener stopped");
    Ok(())
}

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    registry: Arc<SessionRegistry>,
    default_deck: Deck,
) -> Result<(), ServerError> {
    debug!(%peer, "accepted");
    let (read, write) = stream.into_split();
    let mut reader = BufReader::new(read);
    let mut buf = Vec::new();
    let (outbound, inbound) = transport::channel();
    let writer = tokio::spawn(write_lines(write, inbound));

    let joined = match next_frame(&mut reader, &mut buf).await? {
        Frame::Closed => return Ok(()),
        Frame::Malformed => Err(ServerError::MalformedLine),
        Frame::Line(first) => join(&registry, &first, default_deck),
    };
    let room = match joined {
        Ok(room) => room,
        Err(error) => {
            let message = ServerMessage::Error {
                message: error.to_string(),
            };
            let _ = outbound.send(protocol::encode(&message)?).await;
            drop(outbound);
            let _ = writer.await;
            return Err(error);
        }
    };
    let connection = registry.connect(&room, outbound)?;
    info!(%room, connection = connection.get(), "joined");

    let result = read_commands(&mut reader, &mut buf, &registry, &room).await;
    if registry.disconnect(&room, connection) {
        debug!(%room, "room closed");
    }
    writer.abort();
    result
}

fn join(
    registry: &SessionRegistry,
    line: &str,
    default_deck: Deck,
) -> Result<SessionId, ServerError> {
    match protocol::decode_handshake(line)? {
        Handshake::Create { deck } => {
            let deck = match deck {
                Some(names) => parse_deck(&names)?,
                None => default_deck,
            };
            Ok(registry.create(deck))
        }
        Handshake::Join { room } => {
            let room = SessionId::new(&room);
            if registry.contains(&room) {
                Ok(room)
            } else {
                Err(ServerError::UnknownSession(room))
            }
        }
    }
}

async fn read_commands(
    reader: &mut BufReader<OwnedReadHalf>,
    buf: &mut Vec<u8>,
    registry: &SessionRegistry,
    room: &SessionId,
) -> Result<(), ServerError> {
    loop {
        let line = match next_frame(reader, buf).await? {
            Frame::Closed => return Ok(()),
            Frame::Malformed => {
                debug!(%room, "ignoring line that is not UTF-8 or too long");
                continue;
            }
            Frame::Line(line) => line,
        };
        if line.trim().is_empty() {
            continue;
        }
        let message = match protocol::decode(&line) {
            Ok(message) => message,
            Err(error) => {
                debug!(%room, %error, "ignoring malformed message");
                continue;
            }
        };
        match message.into_command() {
            Some(command) => registry.submit(room, command)?,
            None => debug!(%room, "ignoring command with invalid cell index"),
        }
    }
}

/// One inbound line as seen by the connection loop.
#[derive(Debug, PartialEq, Eq)]
enum Frame {
    Line(String),
    Malformed,
    Closed,
}

/// Reads the next newline-terminated frame, buffering at most
/// [`MAX_LINE_BYTES`] plus the terminator.
async fn next_frame<R>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<Frame>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    let limit = MAX_LINE_BYTES as u64 + 1;
    let read = (&mut *reader).take(limit).read_until(b'\n', buf).await?;
    if read == 0 {
        return Ok(Frame::Closed);
    }
    if buf.last() != Some(&b'\n') && buf.len() > MAX_LINE_BYTES {
        skip_line(reader).await?;
        return Ok(Frame::Malformed);
    }
    Ok(match std::str::from_utf8(buf) {
        Ok(text) => Frame::Line(text.trim_end_matches(['\r', '\n']).to_owned()),
        Err(_) => Frame::Malformed,
    })
}

/// Discards input up to and including the next newline.
async fn skip_line<R>(reader: &mut R) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok(());
        }
        let (consumed, done) = match available.iter().position(|byte| *byte == b'\n') {
            Some(end) => (end + 1, true),
            None => (available.len(), false),
        };
        reader.consume(consumed);
        if done {
            return Ok(());
        }
    }
}

async fn write_lines(mut write: OwnedWriteHalf, mut inbound: Inbound) {
    while let Some(mut line) = inbound.recv().await {
        line.push('\n');
        if let Err(error) = write.write_all(line.as_bytes()).await {
            debug!(%error, "write failed");
            break;
        }
    }
}
