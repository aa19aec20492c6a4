//! Business logic services for the Barn Tracker backend

pub mod blanketing;
pub mod horse;
pub mod journal;
pub mod shavings;
pub mod supplement;
pub mod task;

pub use blanketing::BlanketingService;
pub use horse::HorseService;
pub use journal::JournalService;
pub use shavings::ShavingsService;
pub use supplement::SupplementService;
pub use task::TaskService;
