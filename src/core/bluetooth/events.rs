//! Events delivered to the connection session.
//!
//! The wireless stack, the scan task and the operator console all run in their
//! own tasks. They never touch the session directly; they send one of these
//! messages on the session's queue and the session loop applies them in order.

use tokio::sync::mpsc;

/// One advertisement received during a scan.
#[derive(Debug, Clone)]
pub struct SightingEvent<P> {
    /// Scan cycle the advertisement belongs to
    pub scan_id: u64,
    pub address: String,
    pub name: String,
    pub rssi: i16,
    pub handle: P,
}

#[derive(Debug, Clone)]
pub enum SessionEvent<P> {
    Sighting(SightingEvent<P>),
    /// The scan window of `scan_id` has elapsed.
    ScanComplete { scan_id: u64 },
    /// The link layer reports a connection to `address`.
    Connected { address: String },
    /// The link layer reports the loss of the connection to `address`.
    Disconnected { address: String },
    /// A line typed by the operator.
    OperatorInput(String),
}

pub type EventSender<P> = mpsc::UnboundedSender<SessionEvent<P>>;
pub type EventReceiver<P> = mpsc::UnboundedReceiver<SessionEvent<P>>;

/// Creates the session's event queue.
pub fn event_channel<P>() -> (EventSender<P>, EventReceiver<P>) {
    mpsc::unbounded_channel()
}
