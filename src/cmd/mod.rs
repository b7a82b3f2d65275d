//! CLI command implementations.
//!
//! Each submodule owns one or more related `Commands` variants:
//!
//! | Module          | Commands handled                                   |
//! |-----------------|-----------------------------------------------------|
//! | `project`       | `Init`, `Create`, `Projects`                       |
//! | `checkpoint`    | `Checkpoint`                                       |
//! | `status`        | `Status`, `History`                                |
//! | `commit`        | `Message`, `Commit`                                |
//! | `brain`         | `Brain`                                            |
//! | `config`        | `Config`                                           |

pub mod brain;
pub mod checkpoint;
pub mod commit;
pub mod config;
pub mod project;
pub mod status;

pub use brain::cmd_brain;
pub use checkpoint::{CheckpointArgs, cmd_checkpoint};
pub use commit::{cmd_commit, cmd_message};
pub use config::cmd_config;
pub use project::{SeedArgs, cmd_create, cmd_init, cmd_projects};
pub use status::{cmd_history, cmd_status};
