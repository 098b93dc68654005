//! Newline-delimited JSON gateway.
//!
//! Each connection sends one [`ClientCommand`] per line and receives one
//! [`ServerEvent`] per line. The first line must be `identify`; the
//! identity it names is trusted for the rest of the connection.

use anyhow::{Result, bail};
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use runtime::{
    ClientCommand, Envelope, ErrorKind, Identity, RoomManager, RuntimeError, ServerEvent, Topic,
};

/// Events buffered per connection before the bus forwarders wait.
const OUTBOUND_BUFFER: usize = 256;

/// Accepts connections until the listener fails.
pub async fn serve(listener: TcpListener, manager: RoomManager) -> Result<()> {
    loop {
        let (stream, peer) = listener.accept().await?;
        debug!(target: "server::gateway", peer = %peer, "connection accepted");

        let manager = manager.clone();
        tokio::spawn(async move {
            if let Err(err) = handle_connection(stream, manager).await {
                warn!(target: "server::gateway", peer = %peer, error = %err, "connection ended with error");
            }
        });
    }
}

async fn handle_connection(stream: TcpStream, manager: RoomManager) -> Result<()> {
    let (rd, mut wr) = stream.into_split();
    let mut lines = BufReader::new(rd).lines();

    let Some(first) = lines.next_line().await? else {
        return Ok(());
    };
    let identity = match identify(&first) {
        Ok(identity) => identity,
        Err(kind) => {
            write_event(&mut wr, &ServerEvent::Error { kind }).await?;
            bail!("connection did not identify");
        }
    };
    info!(target: "server::gateway", player = %identity, "player connected");

    let (outbound_tx, mut outbound_rx) = mpsc::channel(OUTBOUND_BUFFER);
    let forwarders = forward_events(&manager, &identity, outbound_tx);

    let result = async {
        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else { break };
                    if line.trim().is_empty() {
                        continue;
                    }
                    if let Some(reply) = handle_line(&manager, &identity, &line).await {
                        write_event(&mut wr, &reply).await?;
                    }
                }
                Some(event) = outbound_rx.recv() => write_event(&mut wr, &event).await?,
            }
        }
        anyhow::Ok(())
    }
    .await;

    for task in forwarders {
        task.abort();
    }
    match manager.leave(&identity).await {
        Ok(()) | Err(RuntimeError::NotInRoom) => {}
        Err(err) => warn!(target: "server::gateway", player = %identity, error = %err, "leave on disconnect failed"),
    }
    info!(target: "server::gateway", player = %identity, "player disconnected");
    result
}

fn identify(line: &str) -> std::result::Result<Identity, ErrorKind> {
    match serde_json::from_str::<ClientCommand>(line) {
        Ok(ClientCommand::Identify { identity }) if !identity.as_str().trim().is_empty() => {
            Ok(identity)
        }
        _ => Err(ErrorKind::Validation),
    }
}

/// Runs one command line, returning the reply to write back.
async fn handle_line(manager: &RoomManager, identity: &Identity, line: &str) -> Option<ServerEvent> {
    let command = match serde_json::from_str::<ClientCommand>(line) {
        Ok(command) => command,
        Err(err) => {
            debug!(target: "server::gateway", player = %identity, error = %err, "undecodable command");
            return Some(ServerEvent::Error {
                kind: ErrorKind::Validation,
            });
        }
    };

    match manager.dispatch(identity, command).await {
        Ok(reply) => reply,
        Err(err) => {
            debug!(target: "server::gateway", player = %identity, error = %err, "command failed");
            Some(ServerEvent::Error { kind: err.kind() })
        }
    }
}

/// Relays bus events addressed to `identity` into the connection's queue.
fn forward_events(
    manager: &RoomManager,
    identity: &Identity,
    outbound: mpsc::Sender<ServerEvent>,
) -> Vec<JoinHandle<()>> {
    manager
        .event_bus()
        .subscribe_multiple(&Topic::ALL)
        .into_iter()
        .map(|(topic, rx)| {
            let manager = manager.clone();
            let identity = identity.clone();
            let outbound = outbound.clone();
            tokio::spawn(relay(topic, rx, manager, identity, outbound))
        })
        .collect()
}

async fn relay(
    topic: Topic,
    mut rx: broadcast::Receiver<Envelope>,
    manager: RoomManager,
    identity: Identity,
    outbound: mpsc::Sender<ServerEvent>,
) {
    loop {
        match rx.recv().await {
            Ok(envelope) if envelope.is_for(&identity) => {
                if outbound.send(envelope.event).await.is_err() {
                    break;
                }
            }
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(target: "server::gateway", player = %identity, ?topic, skipped, "client lagging, resyncing");
                // Drop the stale backlog; recovery republishes current state
                // behind the new tail.
                rx = rx.resubscribe();
                if !recover(topic, &manager, &identity, &outbound).await {
                    break;
                }
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Replaces events a lagging relay skipped with current state. Returns
/// false once the connection is gone.
async fn recover(
    topic: Topic,
    manager: &RoomManager,
    identity: &Identity,
    outbound: &mpsc::Sender<ServerEvent>,
) -> bool {
    match topic {
        Topic::Room | Topic::Game => match manager.resync(identity).await {
            Ok(()) | Err(RuntimeError::NotInRoom | RuntimeError::RoomNotFound(_)) => {}
            Err(err) => {
                warn!(target: "server::gateway", player = %identity, error = %err, "resync failed");
            }
        },
        Topic::Lobby => {
            let rooms = manager.list().await;
            return outbound.send(ServerEvent::RoomList { rooms }).await.is_ok();
        }
        // Missed chat is not replayed.
        Topic::Chat => {}
    }
    true
}

async fn write_event<W>(wr: &mut W, event: &ServerEvent) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut line = serde_json::to_vec(event)?;
    line.push(b'\n');
    wr.write_all(&line).await?;
    Ok(())
}
