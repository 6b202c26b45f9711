pub mod classify;
pub mod config;
pub mod quiz;
pub mod run;
