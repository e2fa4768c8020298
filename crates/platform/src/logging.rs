// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Process-wide `tracing` setup

use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Install a formatting subscriber filtered by `filter`, or by `RUST_LOG`
/// when `filter` is `None`
///
/// Returns `false` if a global subscriber was already installed.
pub fn init_tracing(filter: Option<&str>) -> bool {
    let env_filter = match filter {
        Some(directives) => EnvFilter::try_new(directives).unwrap_or_else(|e| {
            eprintln!("Ignoring invalid log filter '{directives}': {e}");
            EnvFilter::from_default_env()
        }),
        None => EnvFilter::from_default_env(),
    };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .finish();
    tracing::subscriber::set_global_default(subscriber).is_ok()
}
