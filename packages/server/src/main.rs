#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Standalone entry point for the dashboard API server.
//!
//! Inputs come from the environment: `BESS_MAP_DATA`, `BESS_MAP_CONFIG`,
//! `BIND_ADDR`, and `PORT`.

use bess_map_server::{ServerOptions, run_server};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    run_server(ServerOptions::default())
        .await
        .map_err(std::io::Error::other)
}
