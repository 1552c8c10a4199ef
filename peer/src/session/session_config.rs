use std::default::Default;

use peerlink_shared::{
    ConfigError, DEFAULT_DRAIN_BUDGET, DEFAULT_INBOUND_CAPACITY, DEFAULT_MAX_PACKET_SIZE,
    DEFAULT_NAMESPACE, DEFAULT_NUM_CHANNELS, MAX_NAMESPACE_LEN,
};

/// Contains Config properties which will be used by a PeerSession
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Name of the logical network. Traffic from other namespaces is ignored.
    pub namespace_id: String,
    /// Whether links may fall back to a relay when a direct path fails
    pub allow_relay: bool,
    /// Largest payload accepted by `send`, in bytes
    pub max_packet_size: usize,
    /// Channels 0..num_channels are valid
    pub num_channels: u8,
    /// Accept every incoming connection request. When off, requests surface
    /// as `ConnectionRequestEvent` and must be accepted explicitly.
    pub auto_accept: bool,
    /// Inbound packets buffered before the oldest is evicted
    pub inbound_capacity: usize,
    /// Packets handled per `tick`
    pub drain_budget: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            namespace_id: DEFAULT_NAMESPACE.to_string(),
            allow_relay: true,
            max_packet_size: DEFAULT_MAX_PACKET_SIZE,
            num_channels: DEFAULT_NUM_CHANNELS,
            auto_accept: true,
            inbound_capacity: DEFAULT_INBOUND_CAPACITY,
            drain_budget: DEFAULT_DRAIN_BUDGET,
        }
    }
}

impl SessionConfig {
    pub fn with_namespace(namespace_id: impl Into<String>) -> Self {
        Self {
            namespace_id: namespace_id.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let namespace = &self.namespace_id;
        if namespace.is_empty() {
            return Err(ConfigError::EmptyNamespace);
        }
        if namespace.len() > MAX_NAMESPACE_LEN {
            return Err(ConfigError::NamespaceTooLong {
                namespace: namespace.clone(),
                len: namespace.len(),
                max: MAX_NAMESPACE_LEN,
            });
        }
        if !namespace.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ConfigError::InvalidNamespace {
                namespace: namespace.clone(),
            });
        }
        if self.num_channels == 0 {
            return Err(ConfigError::NoChannels);
        }
        if self.max_packet_size == 0 {
            return Err(ConfigError::ZeroPacketSize);
        }
        if self.inbound_capacity == 0 {
            return Err(ConfigError::ZeroInboundCapacity);
        }
        Ok(())
    }
}
