//! Multi-step onboarding wizards for job seekers and employers.
//!
//! - [`steps`]: canonical step sequences per role.
//! - [`validation`]: per-step field rules.
//! - [`store`]: in-memory wizard data and derived completion.
//! - [`guard`]: navigation guard and position state machine.
//! - [`gate`]: session/role admission.
//! - [`sync`]: loading and saving against a [`profile::ProfileStore`].
//! - [`entry`]: page-entry state machine.
//! - [`session`]: a single user's wizard interaction.

pub mod entry;
pub mod gate;
pub mod guard;
pub mod memory;
pub mod profile;
pub mod session;
pub mod steps;
pub mod store;
pub mod sync;
pub mod validation;
pub mod write_gate;

#[cfg(test)]
mod testing;

pub use entry::{resolve_entry, EntryOutcome, RedirectReason};
pub use gate::{authorize, Authorization, Session, SessionUser};
pub use guard::{GuardDecision, RequestedPage, WizardPosition};
pub use memory::InMemoryProfileStore;
pub use profile::{FieldPatch, ProfileRecord, ProfileStore};
pub use session::{StepOutcome, WizardSession};
pub use steps::{StepDefinition, StepRegistry};
pub use sync::{OnboardingStatus, PersistenceSynchronizer, Progress, ProgressOrigin};
pub use write_gate::WriteGate;
