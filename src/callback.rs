//! Notifications delivered to the embedding application.

use crossbeam_channel::Sender;
use tracing::debug;

/// One notification per accepted inbound message, plus connection loss and
/// rejected messages.
///
/// Notifications carry no payload. The consumer reads the updated model
/// through the session's accessors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// Handshake accepted; identity and level are known.
    HelloReply,
    /// Match started; player ids are known.
    GameStarted,
    /// New item offers are available.
    RequestItemChoice,
    /// Equipment must be chosen for the chosen items.
    RequestEquipmentChoice,
    /// A new snapshot was reconciled.
    GameStatus,
    /// One of this client's characters must act.
    RequestGameOperation,
    /// Match statistics and winner are known.
    Statistics,
    /// A player left the match.
    GameLeft,
    /// The game was paused or resumed.
    GamePause,
    /// Requested meta information arrived.
    MetaInformation,
    /// The server issued a strike.
    Strike,
    /// The server reported an error.
    Error,
    /// A replay arrived.
    Replay,
    /// The transport dropped the connection.
    ConnectionLost,
    /// An inbound message was rejected and left the model untouched.
    WrongDestination {
        /// Why the message was rejected.
        reason: String,
    },
}

/// Receiver of session notifications.
pub trait Callback {
    /// Delivers one notification.
    fn notify(&mut self, notification: Notification);
}

impl Callback for Sender<Notification> {
    fn notify(&mut self, notification: Notification) {
        if let Err(err) = self.send(notification) {
            debug!(notification = ?err.0, "notification receiver dropped");
        }
    }
}

impl Callback for Vec<Notification> {
    fn notify(&mut self, notification: Notification) {
        self.push(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sender_callback_forwards() {
        let (mut tx, rx) = crossbeam_channel::unbounded();
        tx.notify(Notification::GameStarted);
        assert_eq!(rx.try_recv().unwrap(), Notification::GameStarted);

        drop(rx);
        // a dropped receiver is not an error for the session
        tx.notify(Notification::ConnectionLost);
    }

    #[test]
    fn test_vec_callback_collects() {
        let mut sink = Vec::new();
        sink.notify(Notification::Strike);
        sink.notify(Notification::WrongDestination {
            reason: "late".to_string(),
        });
        assert_eq!(sink.len(), 2);
    }
}
