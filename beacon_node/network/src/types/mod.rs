pub mod metadata;
pub mod pubsub;
pub mod topics;

pub use metadata::{EnrAttestationBitfield, MetaData};
pub use pubsub::PubsubMessage;
pub use topics::{GossipEncoding, GossipKind, GossipTopic};
