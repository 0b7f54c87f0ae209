//! SurrealDB repository implementations.

mod event;
mod record;
mod workspace;

pub use event::SurrealConsentEventRepository;
pub use record::SurrealConsentRecordRepository;
pub use workspace::SurrealWorkspaceRepository;
