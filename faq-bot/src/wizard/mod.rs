//! Admin wizard: per-chat state machine with creation-based expiry and a background sweep.

mod state;
mod sweeper;

pub use state::{WizardError, WizardStage, WizardState, WizardStore};
pub use sweeper::{spawn_wizard_sweeper, sweep_and_notify, WIZARD_EXPIRED_TEXT};
