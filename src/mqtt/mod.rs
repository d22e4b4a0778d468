pub mod client;

/// One message delivered by the broker, not yet interpreted.
pub struct InboundMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}
