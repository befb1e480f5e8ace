// ABOUTME: Command handlers dispatched from main.
// ABOUTME: One module per subcommand.

mod deploy;

pub use deploy::{deploy, DeployArgs};
