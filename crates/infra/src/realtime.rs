//! Realtime change feed: publishing committed writes and listening for
//! changes made by other users.

use std::io;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use serde_json::json;
use tracing::{debug, warn};

use stockroom_core::{AggregateRoot, UserId};
use stockroom_events::{ChangeEvent, ChangeKind, EventBus, Subscription, is_self_originated};
use stockroom_inventory::{ActivityRecord, InventoryItem};

pub const INVENTORY_TABLE: &str = "inventory";
pub const ACTIVITY_TABLE: &str = "activity_logs";

/// Publishes row-level change events for one channel.
///
/// Every event is tagged with the bridge's channel before it reaches the bus.
/// Publication happens after the write has committed. A failed publish is
/// logged and dropped: other clients will catch up on their next refresh.
#[derive(Debug, Clone)]
pub struct RealtimeBridge<B> {
    channel: String,
    bus: B,
}

impl<B> RealtimeBridge<B>
where
    B: EventBus<ChangeEvent>,
{
    pub fn new(channel: impl Into<String>, bus: B) -> Self {
        Self {
            channel: channel.into(),
            bus,
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn publish_item_inserted(&self, item: &InventoryItem, user_id: Option<UserId>) {
        self.publish(ChangeEvent::new(INVENTORY_TABLE, ChangeKind::Insert, item_row(item, user_id)));
    }

    pub fn publish_item_updated(&self, item: &InventoryItem, user_id: Option<UserId>) {
        self.publish(ChangeEvent::new(INVENTORY_TABLE, ChangeKind::Update, item_row(item, user_id)));
    }

    pub fn publish_item_deleted(&self, item: &InventoryItem, user_id: Option<UserId>) {
        self.publish(ChangeEvent::new(INVENTORY_TABLE, ChangeKind::Delete, item_row(item, user_id)));
    }

    pub fn publish_activity_inserted(&self, record: &ActivityRecord) {
        match serde_json::to_value(record) {
            Ok(row) => self.publish(ChangeEvent::new(ACTIVITY_TABLE, ChangeKind::Insert, row)),
            Err(err) => warn!(
                channel = %self.channel,
                activity_id = %record.id(),
                error = %err,
                "failed to encode activity change"
            ),
        }
    }

    fn publish(&self, change: ChangeEvent) {
        let change = change.on_channel(self.channel.as_str());
        let (table, kind) = (change.table.clone(), change.event);
        match self.bus.publish(change) {
            Ok(()) => debug!(channel = %self.channel, table = %table, event = kind.as_str(), "change published"),
            Err(err) => warn!(
                channel = %self.channel,
                table = %table,
                event = kind.as_str(),
                error = ?err,
                "failed to publish change"
            ),
        }
    }
}

fn item_row(item: &InventoryItem, user_id: Option<UserId>) -> serde_json::Value {
    json!({
        "id": item.id_typed(),
        "name": item.name(),
        "stock": item.stock(),
        "stock_locations": item.stock_locations(),
        "revision": item.version(),
        "user_id": user_id,
    })
}

/// Handle to stop and join a running listener.
#[derive(Debug)]
pub struct WorkerHandle {
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
}

impl WorkerHandle {
    /// Request shutdown and wait for the listener thread to exit.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }
}

/// Background listener for one channel of a change feed.
///
/// Changes tagged with another channel and changes authored by `current_user`
/// are skipped. Everything else on the channel (other users, system writes,
/// anonymous rows) is handed to the handler.
#[derive(Debug)]
pub struct RealtimeListener;

impl RealtimeListener {
    pub fn spawn<B, H, E>(
        name: &'static str,
        bus: &B,
        channel: impl Into<String>,
        current_user: Option<UserId>,
        mut handler: H,
    ) -> io::Result<WorkerHandle>
    where
        B: EventBus<ChangeEvent> + ?Sized,
        H: FnMut(ChangeEvent) -> Result<(), E> + Send + 'static,
        E: core::fmt::Debug + Send + 'static,
    {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let sub = bus.subscribe();
        let channel = channel.into();

        let join = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || listen(name, &channel, sub, shutdown_rx, current_user, &mut handler))?;

        Ok(WorkerHandle {
            shutdown: shutdown_tx,
            join: Some(join),
        })
    }
}

fn listen<H, E>(
    name: &'static str,
    channel: &str,
    sub: Subscription<ChangeEvent>,
    shutdown_rx: mpsc::Receiver<()>,
    current_user: Option<UserId>,
    handler: &mut H,
) where
    H: FnMut(ChangeEvent) -> Result<(), E>,
    E: core::fmt::Debug,
{
    let tick = Duration::from_millis(50);

    loop {
        if shutdown_rx.try_recv().is_ok() {
            break;
        }

        match sub.recv_timeout(tick) {
            Ok(change) => {
                if !change.is_on_channel(channel) {
                    debug!(listener = name, channel = %change.channel, "change on another channel skipped");
                    continue;
                }
                if is_self_originated(&change, current_user) {
                    continue;
                }
                if let Err(err) = handler(change) {
                    warn!(listener = name, error = ?err, "realtime handler failed");
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }
}
