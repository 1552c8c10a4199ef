mod events;

pub use events::{
    ConnectEvent, ConnectionRequestEvent, DisconnectEvent, DisconnectReason, ErrorEvent, Event,
    Events,
};
