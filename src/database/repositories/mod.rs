/// Repository traits and their diesel implementations
///
/// Repositories are synchronous; async callers move them onto the blocking pool.

pub mod settings_repository;
pub mod tick_repository;

pub use settings_repository::{SettingsRepository, SettingsRepositoryImpl};
pub use tick_repository::{TickRepository, TickRepositoryImpl};
