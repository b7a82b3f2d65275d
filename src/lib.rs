pub mod brain;
pub mod checkpoint;
pub mod commit;
pub mod config;
pub mod design;
pub mod errors;
pub mod init;
pub mod orchestrator;
pub mod status;
pub mod tracker;
pub mod ui;
pub mod util;
pub mod waymark_config;
