use crate::notify::event::{Event, Notification};
use crate::notify::route::{self, Emit};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

/// Subscription address. A connection joins `User(id)` and
/// `Department(name)` at registration, plus `Admins` for admin principals.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChannelKey {
    User(u64),
    Department(String),
    Admins,
}

/// Channel(..) addresses one key; AllDepartments expands to every live
/// department channel with each connection hit at most once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Audience {
    Channel(ChannelKey),
    AllDepartments,
}

#[derive(Serialize)]
struct Frame<'a> {
    event: &'a str,
    data: &'a Notification,
}

type Subscribers = HashMap<u64, UnboundedSender<String>>;

/// Connection registry plus fire-and-forget delivery. Shared as app data;
/// interior locking keeps registration off the request handlers' way.
/// Nothing is queued for offline users and nothing is retried: a frame
/// either reaches a live socket now or it is gone.
#[derive(Default)]
pub struct Hub {
    next_conn_id: AtomicU64,
    channels: RwLock<HashMap<ChannelKey, Subscribers>>,
}

impl Hub {
    pub fn new() -> Self {
        Hub::default()
    }

    /// Subscribes a new connection to `keys` and hands back its id plus the
    /// receiving end its socket task drains.
    pub fn register(&self, keys: &[ChannelKey]) -> (u64, UnboundedReceiver<String>) {
        let conn_id = self.next_conn_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();

        let mut channels = self.channels.write().expect("hub registry poisoned");
        for key in keys {
            channels
                .entry(key.clone())
                .or_default()
                .insert(conn_id, tx.clone());
        }

        (conn_id, rx)
    }

    /// Removes a connection from its channels. Empty channels are dropped so
    /// the registry tracks only live departments.
    pub fn unregister(&self, conn_id: u64, keys: &[ChannelKey]) {
        let mut channels = self.channels.write().expect("hub registry poisoned");
        for key in keys {
            if let Some(subscribers) = channels.get_mut(key) {
                subscribers.remove(&conn_id);
                if subscribers.is_empty() {
                    channels.remove(key);
                }
            }
        }
    }

    /// Routes a domain event and delivers every resulting frame.
    pub fn dispatch(&self, event: Event) {
        for emit in route::route(event) {
            self.publish(&emit);
        }
    }

    pub fn publish(&self, emit: &Emit) {
        let frame = Frame {
            event: emit.event,
            data: &emit.notification,
        };
        let frame = match serde_json::to_string(&frame) {
            Ok(text) => text,
            Err(e) => {
                debug!(error = %e, event = emit.event, "Dropping unserializable frame");
                return;
            }
        };

        let channels = self.channels.read().expect("hub registry poisoned");
        match &emit.audience {
            Audience::Channel(key) => {
                if let Some(subscribers) = channels.get(key) {
                    for (conn_id, tx) in subscribers {
                        if tx.send(frame.clone()).is_err() {
                            debug!(conn_id, event = emit.event, "Subscriber gone, frame dropped");
                        }
                    }
                }
            }
            Audience::AllDepartments => {
                let mut seen = HashSet::new();
                for (key, subscribers) in channels.iter() {
                    if !matches!(key, ChannelKey::Department(_)) {
                        continue;
                    }
                    for (conn_id, tx) in subscribers {
                        if !seen.insert(*conn_id) {
                            continue;
                        }
                        if tx.send(frame.clone()).is_err() {
                            debug!(conn_id, event = emit.event, "Subscriber gone, frame dropped");
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::event::NotificationKind;
    use serde_json::json;

    fn emit_to(audience: Audience, event: &'static str, message: &str) -> Emit {
        Emit {
            audience,
            event,
            notification: Notification::new(
                NotificationKind::System,
                message.to_string(),
                json!({}),
            ),
        }
    }

    #[test]
    fn frames_reach_every_channel_subscriber() {
        let hub = Hub::new();
        let (_, mut first) = hub.register(&[ChannelKey::Department("IT".into())]);
        let (_, mut second) = hub.register(&[ChannelKey::Department("IT".into())]);
        let (_, mut other) = hub.register(&[ChannelKey::Department("HR".into())]);

        hub.publish(&emit_to(
            Audience::Channel(ChannelKey::Department("IT".into())),
            "systemAlert",
            "hello",
        ));

        assert!(first.try_recv().is_ok());
        assert!(second.try_recv().is_ok());
        assert!(other.try_recv().is_err());
    }

    #[test]
    fn frame_is_event_plus_data() {
        let hub = Hub::new();
        let (_, mut rx) = hub.register(&[ChannelKey::User(7)]);

        hub.publish(&emit_to(
            Audience::Channel(ChannelKey::User(7)),
            "leaveStatusUpdate",
            "Your leave request has been submitted",
        ));

        let text = rx.try_recv().unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["event"], "leaveStatusUpdate");
        assert_eq!(
            value["data"]["message"],
            "Your leave request has been submitted"
        );
        assert_eq!(value["data"]["read"], false);
    }

    #[test]
    fn broadcast_hits_each_connection_once() {
        let hub = Hub::new();
        // One connection improbably in two departments still gets one copy.
        let (_, mut doubled) = hub.register(&[
            ChannelKey::Department("IT".into()),
            ChannelKey::Department("HR".into()),
        ]);
        let (_, mut single) = hub.register(&[ChannelKey::Department("Sales".into())]);
        let (_, mut admin_only) = hub.register(&[ChannelKey::Admins]);

        hub.publish(&emit_to(Audience::AllDepartments, "holidayAnnouncement", "hi"));

        assert!(doubled.try_recv().is_ok());
        assert!(doubled.try_recv().is_err(), "deduped to a single copy");
        assert!(single.try_recv().is_ok());
        assert!(
            admin_only.try_recv().is_err(),
            "admin channel is not a department"
        );
    }

    #[test]
    fn unregister_stops_delivery_and_drops_empty_channels() {
        let hub = Hub::new();
        let keys = [ChannelKey::User(3), ChannelKey::Department("IT".into())];
        let (conn_id, mut rx) = hub.register(&keys);

        hub.unregister(conn_id, &keys);
        hub.publish(&emit_to(
            Audience::Channel(ChannelKey::User(3)),
            "systemAlert",
            "gone",
        ));

        assert!(rx.try_recv().is_err());
        assert!(
            hub.channels
                .read()
                .expect("hub registry poisoned")
                .is_empty()
        );
    }

    #[test]
    fn delivery_to_a_dropped_receiver_is_swallowed() {
        let hub = Hub::new();
        let (_, rx) = hub.register(&[ChannelKey::User(9)]);
        drop(rx);

        // Must not panic; the frame just disappears.
        hub.publish(&emit_to(
            Audience::Channel(ChannelKey::User(9)),
            "systemAlert",
            "into the void",
        ));
    }

    #[test]
    fn connection_ids_are_unique() {
        let hub = Hub::new();
        let (a, _rx_a) = hub.register(&[ChannelKey::User(1)]);
        let (b, _rx_b) = hub.register(&[ChannelKey::User(1)]);
        assert_ne!(a, b);
    }
}
