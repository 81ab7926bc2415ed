//! TCP line server
//!
//! One task per connection reads lines and forwards them over a channel
//! to a single simulation task. That task owns the `Game`, interleaves
//! commands with fixed-rate ticks, and routes the outbox back to the
//! connections.

use std::time::Duration;

use ahash::AHashMap;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::command::{parse_line, Command};
use crate::core::error::Result;
use crate::core::types::EntityId;
use crate::messaging::{Delivery, Message};
use crate::simulation::Game;

pub type ConnId = u64;

/// Connection events funnelled into the simulation task
#[derive(Debug)]
pub enum Inbound {
    Join {
        conn: ConnId,
        name: String,
        out: UnboundedSender<Outgoing>,
    },
    Line {
        conn: ConnId,
        line: String,
    },
    Leave {
        conn: ConnId,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outgoing {
    Line(String),
    Close,
}

struct Session {
    player: EntityId,
    out: UnboundedSender<Outgoing>,
}

/// Names are 2 to 16 ASCII letters
pub fn valid_name(name: &str) -> bool {
    (2..=16).contains(&name.len()) && name.chars().all(|c| c.is_ascii_alphabetic())
}

fn render(message: &Message) -> String {
    message.text.replace('\n', "\r\n")
}

/// Bind and serve until the process is stopped
pub async fn serve(game: Game) -> Result<()> {
    let addr = game.config().listen_addr.clone();
    let listener = TcpListener::bind(&addr).await?;
    info!(addr = %addr, "listening");

    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(simulation_loop(game, rx));

    let mut next_conn: ConnId = 0;
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!(error = %e, "accept failed");
                continue;
            }
        };
        next_conn += 1;
        let conn = next_conn;
        debug!(conn, peer = %peer, "connection opened");
        let tx = tx.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, conn, tx).await {
                debug!(conn, error = %e, "connection ended with error");
            }
        });
    }
}

async fn handle_connection(
    stream: TcpStream,
    conn: ConnId,
    tx: UnboundedSender<Inbound>,
) -> Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    writer.write_all(b"By what name are you known?\r\n").await?;
    let name = loop {
        let Some(line) = lines.next_line().await? else {
            return Ok(());
        };
        let name = line.trim().to_string();
        if valid_name(&name) {
            break name;
        }
        writer
            .write_all(b"Names are 2 to 16 letters. Try again.\r\n")
            .await?;
    };

    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Outgoing>();
    let writer_task = tokio::spawn(async move {
        while let Some(outgoing) = out_rx.recv().await {
            match outgoing {
                Outgoing::Line(text) => {
                    if writer.write_all(text.as_bytes()).await.is_err()
                        || writer.write_all(b"\r\n").await.is_err()
                    {
                        break;
                    }
                }
                Outgoing::Close => break,
            }
        }
        let _ = writer.shutdown().await;
    });

    if tx.send(Inbound::Join { conn, name, out: out_tx }).is_err() {
        return Ok(());
    }
    while let Some(line) = lines.next_line().await? {
        if tx.send(Inbound::Line { conn, line }).is_err() {
            break;
        }
    }
    let _ = tx.send(Inbound::Leave { conn });
    writer_task.abort();
    Ok(())
}

async fn simulation_loop(mut game: Game, mut rx: UnboundedReceiver<Inbound>) {
    let dt = game.config().tick_seconds();
    let mut interval = tokio::time::interval(Duration::from_secs_f32(dt));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut sessions: AHashMap<ConnId, Session> = AHashMap::new();

    loop {
        tokio::select! {
            _ = interval.tick() => game.tick(dt),
            inbound = rx.recv() => match inbound {
                Some(inbound) => handle_inbound(&mut game, &mut sessions, inbound),
                None => break,
            },
        }
        flush(&mut game, &sessions);
    }
    info!("simulation loop stopped");
}

fn handle_inbound(game: &mut Game, sessions: &mut AHashMap<ConnId, Session>, inbound: Inbound) {
    match inbound {
        Inbound::Join { conn, name, out } => match game.spawn_player(&name) {
            Ok(player) => {
                // a second connection for the same character takes over
                sessions.retain(|_, s| {
                    if s.player == player {
                        let _ = s.out.send(Outgoing::Close);
                        false
                    } else {
                        true
                    }
                });
                sessions.insert(conn, Session { player, out });
            }
            Err(e) => {
                error!(conn, name = %name, error = %e, "could not spawn player");
                let _ = out.send(Outgoing::Line("Something went wrong.".to_string()));
                let _ = out.send(Outgoing::Close);
            }
        },
        Inbound::Line { conn, line } => {
            let Some(session) = sessions.get(&conn) else {
                return;
            };
            let player = session.player.clone();
            game.execute_line(&player, &line);
            if matches!(parse_line(&line), Ok(Command::Quit)) {
                flush(game, sessions);
                if let Some(session) = sessions.remove(&conn) {
                    let _ = session.out.send(Outgoing::Close);
                }
            }
        }
        Inbound::Leave { conn } => {
            if let Some(session) = sessions.remove(&conn) {
                game.disconnect(&session.player);
            }
        }
    }
}

/// Send every pending delivery to the connections of its recipients
fn flush(game: &mut Game, sessions: &AHashMap<ConnId, Session>) {
    for delivery in game.drain_deliveries() {
        let message = match &delivery {
            Delivery::Direct { message, .. } | Delivery::Room { message, .. } => message,
        };
        let text = render(message);
        for recipient in game.recipients(&delivery) {
            for session in sessions.values().filter(|s| s.player == recipient) {
                let _ = session.out.send(Outgoing::Line(text.clone()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        assert!(valid_name("Ayla"));
        assert!(!valid_name("a"));
        assert!(!valid_name("bob smith"));
        assert!(!valid_name("r2d2"));
        assert!(!valid_name("abcdefghijklmnopq"));
    }

    #[test]
    fn test_quit_closes_session() {
        let mut game = Game::default();
        let mut sessions = AHashMap::new();
        let (out, mut rx) = mpsc::unbounded_channel();
        handle_inbound(
            &mut game,
            &mut sessions,
            Inbound::Join {
                conn: 1,
                name: "Ayla".into(),
                out,
            },
        );
        assert_eq!(sessions.len(), 1);
        flush(&mut game, &sessions);
        assert!(matches!(rx.try_recv(), Ok(Outgoing::Line(_))));

        handle_inbound(
            &mut game,
            &mut sessions,
            Inbound::Line {
                conn: 1,
                line: "quit".into(),
            },
        );
        assert!(sessions.is_empty());
        let mut closed = false;
        while let Ok(outgoing) = rx.try_recv() {
            closed |= outgoing == Outgoing::Close;
        }
        assert!(closed);
    }
}
