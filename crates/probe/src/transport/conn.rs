//! Connection driver — owns the socket, the reconnect timer, and inbound
//! config frames, executing the effects decided by `ClientCore`.

use futures_util::{SinkExt, StreamExt};
use parking_lot::RwLock;
use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::{sleep, Sleep};
use tokio_util::codec::{Framed, LinesCodec, LinesCodecError};
use tracing::{debug, info, warn};
use wire::{ClientMessage, ServerMessage};

use super::client::{ClientCore, Effect};
use crate::context::ClientConfig;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Codec error: {0}")]
    Codec(#[from] LinesCodecError),
}

#[derive(Debug, Clone)]
pub struct TransportSettings {
    pub host: String,
    pub port: u16,
    pub reconnect_delay: Duration,
    /// Handshake frame re-sent on every successful connection.
    pub hello: ClientMessage,
}

enum Command {
    Start,
    Send(Box<ClientMessage>),
    Stop,
}

/// Cheap-to-clone handle to the connection actor.
#[derive(Clone)]
pub struct TransportHandle {
    tx: mpsc::UnboundedSender<Command>,
}

impl TransportHandle {
    /// Spawn the connection actor. Must be called within a tokio runtime;
    /// the actor idles disconnected until `start`.
    pub fn spawn(
        settings: TransportSettings,
        config: Arc<RwLock<ClientConfig>>,
    ) -> TransportHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run(settings, config, rx));
        TransportHandle { tx }
    }

    pub fn start(&self) {
        let _ = self.tx.send(Command::Start);
    }

    /// Hand one outbound message to the actor. Never blocks; while the
    /// connection is down the frame lands in the in-memory queue.
    pub fn send(&self, msg: ClientMessage) {
        let _ = self.tx.send(Command::Send(Box::new(msg)));
    }

    pub fn stop(&self) {
        let _ = self.tx.send(Command::Stop);
    }
}

type Socket = Framed<TcpStream, LinesCodec>;

struct Driver {
    settings: TransportSettings,
    config: Arc<RwLock<ClientConfig>>,
    core: ClientCore,
    socket: Option<Socket>,
    timer: Option<Pin<Box<Sleep>>>,
}

async fn run(
    settings: TransportSettings,
    config: Arc<RwLock<ClientConfig>>,
    mut rx: mpsc::UnboundedReceiver<Command>,
) {
    let core = ClientCore::new(&settings.hello);
    let mut driver = Driver {
        settings,
        config,
        core,
        socket: None,
        timer: None,
    };

    enum Ev {
        Cmd(Option<Command>),
        Frame(Option<Result<String, LinesCodecError>>),
        Due,
    }

    loop {
        let ev = tokio::select! {
            cmd = rx.recv() => Ev::Cmd(cmd),
            frame = next_frame(&mut driver.socket) => Ev::Frame(frame),
            _ = wait_timer(&mut driver.timer) => Ev::Due,
        };
        match ev {
            // every handle dropped: the owning context is gone
            Ev::Cmd(None) => break,
            Ev::Cmd(Some(Command::Start)) => {
                let fx = driver.core.on_start();
                driver.apply(fx).await;
            }
            Ev::Cmd(Some(Command::Send(msg))) => {
                let fx = driver.core.on_send(&msg);
                driver.apply(fx).await;
            }
            Ev::Cmd(Some(Command::Stop)) => {
                driver.timer = None;
                let fx = driver.core.on_stop();
                driver.apply(fx).await;
            }
            Ev::Frame(Some(Ok(line))) => driver.handle_inbound(&line),
            Ev::Frame(Some(Err(e))) => {
                debug!("socket error: {}", e);
                driver.socket = None;
                let fx = driver.core.on_closed();
                driver.apply(fx).await;
            }
            Ev::Frame(None) => {
                debug!("connection closed by peer");
                driver.socket = None;
                let fx = driver.core.on_closed();
                driver.apply(fx).await;
            }
            Ev::Due => {
                driver.timer = None;
                let fx = driver.core.on_reconnect_due();
                driver.apply(fx).await;
            }
        }
    }
}

impl Driver {
    /// Execute effects; an effect may produce follow-up effects (a failed
    /// connect schedules a reconnect through the same close path).
    async fn apply(&mut self, effects: Vec<Effect>) {
        let mut pending: VecDeque<Effect> = effects.into();
        while let Some(effect) = pending.pop_front() {
            match effect {
                Effect::Connect => match self.connect().await {
                    Ok(socket) => {
                        info!(
                            "connected to {}:{}",
                            self.settings.host, self.settings.port
                        );
                        self.socket = Some(socket);
                        pending.extend(self.core.on_opened());
                    }
                    Err(e) => {
                        debug!("connect failed: {}", e);
                        pending.extend(self.core.on_closed());
                    }
                },
                Effect::Transmit(frame) => {
                    if let Err(e) = self.transmit(frame).await {
                        warn!("transmit failed: {}", e);
                        self.socket = None;
                        pending.extend(self.core.on_closed());
                    }
                }
                Effect::ScheduleReconnect => {
                    self.timer = Some(Box::pin(sleep(self.settings.reconnect_delay)));
                }
                Effect::CloseSocket => {
                    self.socket = None;
                }
            }
        }
    }

    async fn connect(&self) -> Result<Socket, TransportError> {
        let stream =
            TcpStream::connect((self.settings.host.as_str(), self.settings.port)).await?;
        Ok(Framed::new(stream, LinesCodec::new()))
    }

    async fn transmit(&mut self, frame: String) -> Result<(), TransportError> {
        match self.socket.as_mut() {
            Some(socket) => {
                socket.send(frame).await?;
                Ok(())
            }
            None => {
                // connection died mid-flush; in-flight frames are lost
                debug!("no connection; frame dropped");
                Ok(())
            }
        }
    }

    fn handle_inbound(&self, line: &str) {
        match serde_json::from_str::<ServerMessage>(line) {
            Ok(ServerMessage::Config { config }) => {
                self.config.write().apply(&config);
                debug!("applied config update from hub");
            }
            Err(e) => debug!("discarding malformed server frame: {}", e),
        }
    }
}

async fn next_frame(socket: &mut Option<Socket>) -> Option<Result<String, LinesCodecError>> {
    match socket {
        Some(s) => s.next().await,
        None => std::future::pending().await,
    }
}

async fn wait_timer(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer {
        Some(t) => t.as_mut().await,
        None => std::future::pending().await,
    }
}
