// Link limits

/// Largest payload a single packet may carry, in bytes. Matches the limit of
/// the relay-capable platform transports this crate was written against.
pub const DEFAULT_MAX_PACKET_SIZE: usize = 1170;

/// Channel 0 carries unreliable state, channel 1 reliable events.
pub const DEFAULT_NUM_CHANNELS: u8 = 2;

/// Name of the logical network a session binds to when none is configured.
pub const DEFAULT_NAMESPACE: &str = "GameSocket";

/// Namespaces double as platform socket names, which are capped at 32
/// alphanumeric characters.
pub const MAX_NAMESPACE_LEN: usize = 32;

// Inbound queue

/// Packets buffered between transport and drain before the oldest is evicted.
pub const DEFAULT_INBOUND_CAPACITY: usize = 1024;

/// Packets handled per tick when the caller does not drain explicitly.
pub const DEFAULT_DRAIN_BUDGET: usize = 100;
