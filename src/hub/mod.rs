//! The hub is the single owner of the client registry.
//!
//! All registry mutations and fan-outs happen inside [`Hub::run`], one input at
//! a time, so the registry needs no locking. Other tasks talk to the hub only
//! through the three inputs behind [`HubHandle`]. The inputs share one queue so
//! the hub sees them strictly in arrival order, which also keeps each
//! submitter's own requests in the order it made them.

use crate::client::{Client, ClientId};
use crate::error::ChatError;
use crate::message::{Codec, Event, Frame, JsonCodec};
use crate::utils::kitchen_time;
use std::collections::HashMap;
use tokio::sync::mpsc::{self, error::TrySendError, Receiver, Sender};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// One request to the hub.
#[derive(Debug)]
pub enum HubCommand {
    Register(Client),
    Unregister(ClientId),
    Broadcast(Event),
}

/// Sending side of the hub's inputs. Cheap to clone.
#[derive(Debug, Clone)]
pub struct HubHandle {
    tx: Sender<HubCommand>,
}

impl HubHandle {
    /// Submits a client for registration. The hub then owns it.
    pub async fn register(&self, client: Client) -> Result<(), ChatError> {
        self.submit(HubCommand::Register(client)).await
    }

    /// Submits an unregister request. Unknown ids are ignored by the hub.
    pub async fn unregister(&self, id: ClientId) -> Result<(), ChatError> {
        self.submit(HubCommand::Unregister(id)).await
    }

    /// Submits an event for fan-out to every registered client.
    pub async fn broadcast(&self, event: Event) -> Result<(), ChatError> {
        self.submit(HubCommand::Broadcast(event)).await
    }

    async fn submit(&self, command: HubCommand) -> Result<(), ChatError> {
        self.tx.send(command).await.map_err(|_| ChatError::HubClosed)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

pub struct Hub<C: Codec = JsonCodec> {
    clients: HashMap<ClientId, Client>,
    codec: C,
    rx: Receiver<HubCommand>,
}

impl Hub<JsonCodec> {
    /// Creates a hub encoding messages as JSON, with inputs of the given capacity.
    pub fn new(capacity: usize) -> (Self, HubHandle) {
        Hub::with_codec(JsonCodec, capacity)
    }
}

impl<C: Codec> Hub<C> {
    pub fn with_codec(codec: C, capacity: usize) -> (Self, HubHandle) {
        let (tx, rx) = mpsc::channel(capacity);
        let hub = Hub {
            clients: HashMap::new(),
            codec,
            rx,
        };
        (hub, HubHandle { tx })
    }

    /// Runs the control loop on its own task.
    pub fn spawn(self) -> JoinHandle<Self> {
        tokio::spawn(self.run())
    }

    /// Processes inputs one at a time, in the order they arrive.
    ///
    /// Returns once every [`HubHandle`] has been dropped and the queue is
    /// drained. Client-level failures never end the loop.
    pub async fn run(mut self) -> Self {
        while let Some(command) = self.rx.recv().await {
            self.process(command);
        }
        info!(registry_size = self.clients.len(), "hub stopped");
        self
    }

    pub fn process(&mut self, command: HubCommand) {
        match command {
            HubCommand::Register(client) => self.handle_register(client),
            HubCommand::Unregister(id) => {
                self.handle_unregister(id);
            }
            HubCommand::Broadcast(event) => {
                self.handle_broadcast(event);
            }
        }
    }

    /// Inserts the client, then announces it to the registry including itself.
    pub fn handle_register(&mut self, client: Client) {
        let username = client.username.clone();
        info!(client_id = %client.id, %username, "client registered");
        self.clients.insert(client.id, client);
        self.publish(Event::join(username));
    }

    /// Removes the client and closes its queue. Returns false, and announces
    /// nothing, when the client is not registered.
    pub fn handle_unregister(&mut self, id: ClientId) -> bool {
        let Some(client) = self.clients.remove(&id) else {
            debug!(client_id = %id, "unregister for unknown client ignored");
            return false;
        };
        let username = client.username.clone();
        client.close();
        info!(client_id = %id, %username, "client unregistered");
        self.publish(Event::leave(username));
        true
    }

    /// Stamps, encodes and fans out an event. Returns the number of clients it reached.
    pub fn handle_broadcast(&mut self, event: Event) -> usize {
        self.publish(event)
    }

    fn publish(&mut self, event: Event) -> usize {
        let message = event.stamp(kitchen_time());
        match self.codec.encode(&message) {
            Ok(frame) => self.fan_out(&frame),
            Err(e) => {
                error!(error = %e, kind = ?message.kind, "dropping broadcast");
                0
            }
        }
    }

    /// Non-blocking enqueue to every registered client. A client whose queue
    /// is full (or whose consumer is gone) is evicted on the spot.
    fn fan_out(&mut self, frame: &Frame) -> usize {
        let mut delivered = 0;
        let mut evicted = Vec::new();

        for (id, client) in self.clients.iter() {
            match client.try_send(frame.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    warn!(client_id = %id, username = %client.username, "send queue full, evicting client");
                    evicted.push(*id);
                }
                Err(TrySendError::Closed(_)) => {
                    debug!(client_id = %id, username = %client.username, "outbound pump gone, evicting client");
                    evicted.push(*id);
                }
            }
        }

        for id in evicted {
            if let Some(client) = self.clients.remove(&id) {
                client.close();
            }
        }
        delivered
    }

    pub fn contains(&self, id: &ClientId) -> bool {
        self.clients.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn client_ids(&self) -> Vec<ClientId> {
        let mut ids: Vec<ClientId> = self.clients.keys().copied().collect();
        ids.sort();
        ids
    }
}
