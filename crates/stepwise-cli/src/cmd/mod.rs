pub mod config;
pub mod help;
pub mod history;
pub mod new;
pub mod step;
