//! # inventory-collab: collaborative editing of inventory records
//!
//! Several users editing the same record share one draft per record topic.
//! Field writes are fanned out to the other participants; saves go through
//! the optimistic version guard in `inventory-core`.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  bind / set_field   ┌─────────────────┐
//! │ RecordEditor │ ──────────────────► │ SessionRegistry │
//! │ (per user)   │                     │ Topic → Session │
//! └──────┬───────┘                     └────────┬────────┘
//!        │ save                                 │
//!        ▼                                      ▼
//! ┌──────────────┐                     ┌─────────────────┐
//! │ VersionGuard │                     │ Session         │
//! │ (core)       │                     │ roster + draft  │
//! └──────────────┘                     │ broadcast::Tx   │
//!                                      └────────┬────────┘
//!                                               │ SessionEvent
//!                                               ▼
//!                                      Subscription (per user)
//! ```
//!
//! ## Modules
//!
//! - [`protocol`]: participant identity and topic events (bincode-encoded)
//! - [`topic`]: topic keys derived from record ids
//! - [`draft`]: the shared draft of one topic
//! - [`registry`]: topic map, bind/unbind lifecycle
//! - [`sync`]: field writes and subscriptions
//! - [`presence`]: roster and avatar-group visibility
//! - [`upload`]: image upload buffering and staging
//! - [`editor`]: per-user form commands and notifications

pub mod config;
pub mod draft;
pub mod editor;
pub mod error;
pub mod presence;
pub mod protocol;
pub mod registry;
pub mod session;
pub mod sync;
pub mod topic;
pub mod upload;

pub use config::CollabConfig;
pub use draft::SharedDraft;
pub use editor::{EditorUpdate, Notification, NotificationLevel, RecordEditor};
pub use error::CollabError;
pub use presence::{Avatar, PresenceView, Roster, Visibility};
pub use protocol::{ProtocolError, SessionEvent, UserIdentity};
pub use registry::{Binding, RegistryStats, SessionRegistry};
pub use session::Session;
pub use sync::Subscription;
pub use topic::Topic;
pub use upload::{stage, StageTarget, UploadError, UploadIntake};
