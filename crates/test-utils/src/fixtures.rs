// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Test fixtures and sample catalogs

use crate::mock_server::{MockColumn, MockDataSource, MockIndex, MockServer, MockTable};
use sqlmeta_model::Dialect;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Server with a `public` schema holding:
///
/// - `T` (`A int`, `B varchar(50)`, `C bool`)
/// - `orders` (`id`, `customer_id`, `total`, `note`) with two indexes
/// - `customers` (`id`, `name`)
/// - view `v_orders`
///
/// and an empty `audit` schema.
pub fn sample_server() -> MockServer {
    let server = MockServer::new();
    server
        .add_table(
            "public",
            MockTable::new("T").columns(&[("A", "int"), ("B", "varchar(50)"), ("C", "bool")]),
        )
        .add_table(
            "public",
            MockTable::new("orders")
                .column(MockColumn::new("id", "bigint").not_null())
                .column(MockColumn::new("customer_id", "bigint").not_null())
                .column(MockColumn::new("total", "numeric(10,2)").with_default("0"))
                .column(MockColumn::new("note", "varchar(200)"))
                .index(MockIndex::new("pk_orders", true, &["id"]))
                .index(MockIndex::new("ix_orders_customer", false, &["customer_id"])),
        )
        .add_table(
            "public",
            MockTable::new("customers").columns(&[("id", "bigint"), ("name", "varchar(100)")]),
        )
        .add_table(
            "public",
            MockTable::view("v_orders").columns(&[("id", "bigint"), ("total", "numeric(10,2)")]),
        )
        .add_schema("audit");
    server
}

/// `sample_server` behind a data source named `sample`
pub fn sample_source(dialect: Dialect) -> (MockServer, Arc<MockDataSource>) {
    let server = sample_server();
    let source = server.data_source("sample", dialect);
    (server, source)
}

/// Route `tracing` output to the test harness; honours `RUST_LOG`
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
