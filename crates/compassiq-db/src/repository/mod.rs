//! SurrealDB repository implementations.

mod alert;
mod audit;
mod cadence_item;
mod instance;
mod invite;
mod membership;
mod organization;
mod template;

pub use alert::SurrealAlertRepository;
pub use audit::SurrealAuditLogRepository;
pub use cadence_item::SurrealCadenceItemRepository;
pub use instance::SurrealInstanceRepository;
pub use invite::SurrealInviteRepository;
pub use membership::SurrealMembershipRepository;
pub use organization::SurrealOrganizationRepository;
pub use template::SurrealTemplateRepository;
