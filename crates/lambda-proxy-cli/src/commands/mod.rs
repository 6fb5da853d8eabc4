mod clean;
mod doctor;
mod eject;
mod init;
mod package;

pub use clean::clean;
pub use doctor::doctor;
pub use eject::eject;
pub use init::init_project;
pub use package::package;
