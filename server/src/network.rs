//! Server network layer: UDP receive task, dispatch loop and notice delivery

use crate::config::ServerConfig;
use crate::coordinator::{MatchCoordinator, Outbox};
use crate::error::{DeliveryError, ServerError};
use crate::registry::SessionId;
use log::{debug, error, info, warn};
use shared::MAX_DATAGRAM_SIZE;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, Semaphore};

/// Messages sent from the receive task to the dispatch loop
#[derive(Debug)]
pub enum ServerMessage {
    DatagramReceived { text: String, addr: SocketAddr },
    Shutdown,
}

/// Fire-and-forget delivery of one text payload
pub trait Transport: Send + Sync + 'static {
    fn send(
        &self,
        to: SessionId,
        text: &str,
    ) -> impl Future<Output = Result<(), DeliveryError>> + Send;
}

/// Sends notices from the server's own socket
#[derive(Debug, Clone)]
pub struct UdpTransport {
    socket: Arc<UdpSocket>,
}

impl UdpTransport {
    pub fn new(socket: Arc<UdpSocket>) -> Self {
        Self { socket }
    }
}

impl Transport for UdpTransport {
    async fn send(&self, to: SessionId, text: &str) -> Result<(), DeliveryError> {
        self.socket
            .send_to(text.as_bytes(), to)
            .await
            .map(|_| ())
            .map_err(|source| DeliveryError { to, source })
    }
}

/// Sends every notice in order, independently of each other
///
/// Returns the number of notices that could not be delivered.
pub async fn deliver<T: Transport>(transport: &T, outbox: Outbox) -> usize {
    let mut failed = 0;
    for notice in outbox {
        if let Err(e) = transport.send(notice.to, &notice.text).await {
            warn!("{}", e);
            failed += 1;
        }
    }
    failed
}

/// Handles one datagram from start to finish
///
/// A submission that has to wait for the rest of the party keeps this task
/// suspended until the round is resolved or interrupted.
pub async fn handle_datagram<T: Transport>(
    coordinator: &MatchCoordinator,
    transport: &T,
    from: SessionId,
    text: &str,
) {
    let step = coordinator.handle(from, text).await;
    deliver(transport, step.outbox).await;

    let Some(ticket) = step.ticket else {
        return;
    };
    let (outcome, outbox) = coordinator.wait_for_round(ticket).await;
    deliver(transport, outbox).await;

    match outcome.into_result() {
        Ok(generation) => debug!("Round {} finished for {}", generation, from),
        Err(e) => info!("Waiting round for {} ended: {}", from, e),
    }
}

/// Main server coordinating the socket and the match
pub struct Server {
    socket: Arc<UdpSocket>,
    coordinator: Arc<MatchCoordinator>,
    transport: Arc<UdpTransport>,
    workers: Arc<Semaphore>,

    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
}

impl Server {
    pub async fn new(config: ServerConfig) -> Result<Self, ServerError> {
        config.validate()?;

        let socket = Arc::new(UdpSocket::bind(&config.bind_addr).await?);
        info!("Server listening on {}", socket.local_addr()?);
        info!(
            "Party size {}, {} workers, round timeout {:?}",
            config.game.party_size, config.workers, config.game.round_timeout
        );

        let (server_tx, server_rx) = mpsc::unbounded_channel();

        Ok(Server {
            transport: Arc::new(UdpTransport::new(Arc::clone(&socket))),
            socket,
            coordinator: Arc::new(MatchCoordinator::new(config.game)),
            workers: Arc::new(Semaphore::new(config.workers)),
            server_tx,
            server_rx,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.socket.local_addr()?)
    }

    pub fn coordinator(&self) -> Arc<MatchCoordinator> {
        Arc::clone(&self.coordinator)
    }

    /// Sender that can stop the dispatch loop with `ServerMessage::Shutdown`
    pub fn shutdown_handle(&self) -> mpsc::UnboundedSender<ServerMessage> {
        self.server_tx.clone()
    }

    /// Spawns task that continuously listens for incoming datagrams
    fn spawn_network_receiver(&self) {
        let socket = Arc::clone(&self.socket);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut buffer = [0u8; MAX_DATAGRAM_SIZE];

            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => {
                        let text = String::from_utf8_lossy(&buffer[..len]).trim().to_string();
                        if let Err(e) =
                            server_tx.send(ServerMessage::DatagramReceived { text, addr })
                        {
                            error!("Failed to send datagram to dispatch loop: {}", e);
                            break;
                        }
                    }
                    Err(e) => {
                        error!("Error receiving datagram: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    /// Hands a datagram to a worker, waiting for a free one if needed
    async fn dispatch(&self, text: String, addr: SocketAddr) {
        let permit = match Arc::clone(&self.workers).acquire_owned().await {
            Ok(permit) => permit,
            Err(e) => {
                error!("Worker pool closed: {}", e);
                return;
            }
        };

        let coordinator = Arc::clone(&self.coordinator);
        let transport = Arc::clone(&self.transport);
        tokio::spawn(async move {
            handle_datagram(&coordinator, transport.as_ref(), addr, &text).await;
            drop(permit);
        });
    }

    /// Runs the dispatch loop until shutdown
    pub async fn run(&mut self) -> Result<(), ServerError> {
        self.spawn_network_receiver();
        info!("Server started successfully");

        while let Some(message) = self.server_rx.recv().await {
            match message {
                ServerMessage::DatagramReceived { text, addr } => {
                    debug!("Message received from {} -> {}", addr, text);
                    self.dispatch(text, addr).await;
                }
                ServerMessage::Shutdown => break,
            }
        }

        info!("Server shutting down");
        Ok(())
    }
}
