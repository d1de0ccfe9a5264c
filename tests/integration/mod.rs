//! Integration test modules

pub mod cli_tests;
pub mod config_tests;
pub mod erp_client_tests;
pub mod runner_tests;
