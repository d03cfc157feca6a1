//! CompassIQ Service — the operation layer consumed by the web/UI tier.
//!
//! Each service is generic over the repository traits it needs, so
//! this crate has no dependency on the database crate. Every mutating
//! operation re-resolves its permission gate server-side, independent
//! of whatever the UI already disabled.

pub mod alerts;
pub mod audit;
pub mod catalog;
pub mod config;
pub mod context;
pub mod instances;
pub mod invites;
pub mod members;
pub mod token;

pub use alerts::AlertService;
pub use catalog::{CatalogEntry, TemplateCatalog};
pub use config::ServiceConfig;
pub use context::OrgContextService;
pub use instances::{InstanceService, PublishOutcome};
pub use invites::InviteService;
pub use members::MemberService;
