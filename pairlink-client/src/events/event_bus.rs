use crate::error::ClientError;
use crate::events::listeners::{Handler, Listeners};
use crate::transport::RemoteStream;
use pairlink_core::{ConnectionState, NegotiationRole};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventName {
    ConnectionStateChange,
    RemoteAudioStream,
    Paired,
    Error,
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventName::ConnectionStateChange => "connectionStateChange",
            EventName::RemoteAudioStream => "remoteAudioStream",
            EventName::Paired => "paired",
            EventName::Error => "error",
        };
        f.write_str(name)
    }
}

/// Returned by [`EventBus::on`]; pass it to [`EventBus::off`] to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId {
    event: EventName,
    id: u64,
}

impl ListenerId {
    pub fn event(&self) -> EventName {
        self.event
    }
}

/// Payload of the `paired` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairedInfo {
    pub client_id: Option<String>,
    pub role: NegotiationRole,
}

mod sealed {
    pub trait Sealed {}
}

/// One of the four client events, with its payload type.
pub trait EventKind: sealed::Sealed + 'static {
    type Payload: 'static;
    const NAME: EventName;

    #[doc(hidden)]
    fn listeners(bus: &EventBus) -> &Listeners<Self::Payload>;
}

pub struct ConnectionStateChange;
pub struct RemoteAudioStream;
pub struct Paired;
pub struct ErrorEvent;

macro_rules! event_kind {
    ($kind:ty, $payload:ty, $name:expr, $field:ident) => {
        impl sealed::Sealed for $kind {}

        impl EventKind for $kind {
            type Payload = $payload;
            const NAME: EventName = $name;

            fn listeners(bus: &EventBus) -> &Listeners<Self::Payload> {
                &bus.inner.$field
            }
        }
    };
}

event_kind!(
    ConnectionStateChange,
    ConnectionState,
    EventName::ConnectionStateChange,
    connection_state
);
event_kind!(
    RemoteAudioStream,
    RemoteStream,
    EventName::RemoteAudioStream,
    remote_stream
);
event_kind!(Paired, PairedInfo, EventName::Paired, paired);
event_kind!(ErrorEvent, ClientError, EventName::Error, error);

#[derive(Default)]
struct Registries {
    next_id: AtomicU64,
    connection_state: Listeners<ConnectionState>,
    remote_stream: Listeners<RemoteStream>,
    paired: Listeners<PairedInfo>,
    error: Listeners<ClientError>,
}

/// Typed listener registries shared by a client handle and its coordinator.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<Registries>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<E, F>(&self, handler: F) -> ListenerId
    where
        E: EventKind,
        F: Fn(&E::Payload) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let handler: Handler<E::Payload> = Arc::new(handler);
        E::listeners(self).insert(id, handler);
        ListenerId { event: E::NAME, id }
    }

    /// Removes a listener. Returns false if it was not registered.
    pub fn off(&self, listener: ListenerId) -> bool {
        match listener.event {
            EventName::ConnectionStateChange => self.inner.connection_state.remove(listener.id),
            EventName::RemoteAudioStream => self.inner.remote_stream.remove(listener.id),
            EventName::Paired => self.inner.paired.remove(listener.id),
            EventName::Error => self.inner.error.remove(listener.id),
        }
    }

    pub fn emit<E: EventKind>(&self, payload: &E::Payload) -> usize {
        E::listeners(self).emit(payload)
    }

    pub fn listener_count<E: EventKind>(&self) -> usize {
        E::listeners(self).len()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("connection_state", &self.inner.connection_state.len())
            .field("remote_stream", &self.inner.remote_stream.len())
            .field("paired", &self.inner.paired.len())
            .field("error", &self.inner.error.len())
            .finish()
    }
}
