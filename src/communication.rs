pub struct Message {
    pub kind: MessageType,
    pub chime_id: u64,
}

impl Message {
    #[must_use]
    pub const fn new(kind: MessageType, chime_id: u64) -> Self {
        Self { kind, chime_id }
    }
}

#[derive(Debug, Clone)]
pub enum MessageType {
    /// mono samples, replacing whatever is playing
    Play { samples: Vec<i16>, sample_rate: u32 },
    // silence the current chime early
    Stop,
}
