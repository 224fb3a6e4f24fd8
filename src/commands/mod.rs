// ABOUTME: Command module aggregator for the hoist CLI.
// ABOUTME: Re-exports the install, deploy, status and logs handlers.

mod connection;
mod deploy;
mod install;
mod logs;
mod status;

pub use deploy::deploy;
pub use install::install;
pub use logs::logs;
pub use status::status;
