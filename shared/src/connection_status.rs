/// Lifecycle state of one peer link
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    /// Terminal for the record it is reached on. A later connect request
    /// starts a new record.
    Failed,
}

impl ConnectionStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionStatus::Connected)
    }

    pub fn is_connecting(&self) -> bool {
        matches!(self, ConnectionStatus::Connecting)
    }

    /// Connecting or Connected
    pub fn is_live(&self) -> bool {
        matches!(self, ConnectionStatus::Connecting | ConnectionStatus::Connected)
    }
}

/// Route an established link takes through the network
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LinkPath {
    Direct,
    Relay,
}

impl LinkPath {
    pub fn is_relay(&self) -> bool {
        matches!(self, LinkPath::Relay)
    }
}
