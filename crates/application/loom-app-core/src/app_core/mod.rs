pub mod commands;
pub mod events;
pub mod reducer;
pub mod store;

pub use commands::WizardCommand;
pub use events::{ServiceEvent, WizardEvent};
pub use reducer::reduce;
pub use store::WizardStore;
