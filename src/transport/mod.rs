pub mod backend;
pub mod memory;
pub mod messages;
pub mod nats;
pub mod track;

pub use backend::{Participant, TranscriptionSegment, Transport, TransportEvent};
pub use memory::{MemoryRemote, MemoryTransport, TransportCommand};
pub use messages::{MicrophoneMessage, RoomEventMessage};
pub use nats::NatsTransport;
pub use track::{MediaElement, RemoteTrack, TrackKind};
