pub mod config;
pub mod credentials;
pub mod error;
pub mod http;
pub mod session;
pub mod transcript;
pub mod transport;

pub use config::Config;
pub use credentials::{Credential, CredentialError, CredentialSource, HttpCredentialFetcher};
pub use error::SessionError;
pub use http::{create_router, AppState};
pub use session::{
    ConnectionState, ControllerConfig, SessionController, SessionHandle, SessionSnapshot,
    SessionStatus,
};
pub use transcript::{Speaker, SpeakerPolicy, TranscriptEntry};
pub use transport::{MemoryRemote, MemoryTransport, NatsTransport, Transport, TransportEvent};
