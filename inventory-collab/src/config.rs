//! Registry configuration.

/// Collaboration configuration.
#[derive(Debug, Clone)]
pub struct CollabConfig {
    /// Broadcast channel capacity per topic (events buffered per subscriber)
    pub broadcast_capacity: usize,
    /// Maximum participants bound to one topic
    pub max_participants_per_topic: usize,
    /// Initial buffer reservation for an upload, in bytes
    pub upload_chunk_hint: usize,
}

impl Default for CollabConfig {
    fn default() -> Self {
        Self {
            broadcast_capacity: 256,
            max_participants_per_topic: 100,
            upload_chunk_hint: 64 * 1024,
        }
    }
}
