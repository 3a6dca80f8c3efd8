//! Fan-out of server events to every connected client

use tokio::sync::broadcast;

use super::protocol::ServerMsg;

/// Publish side of the client transport
pub trait Broadcast: Send {
    fn publish(&self, msg: ServerMsg);
}

impl Broadcast for broadcast::Sender<ServerMsg> {
    fn publish(&self, msg: ServerMsg) {
        // No subscribers just means nobody is connected
        let _ = self.send(msg);
    }
}
