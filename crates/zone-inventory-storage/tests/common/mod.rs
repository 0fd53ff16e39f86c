//! Shared test harness for storage backends
//!
//! Generic test functions that verify the storage traits. Every backend
//! must pass these. Each test receives a freshly initialized store from the
//! factory, because DNS reimports replace the whole host table.
//!
//! # Usage
//!
//! ```ignore
//! #[tokio::test]
//! async fn sqlite_passes_all_tests() {
//!     common::run_all_tests(create_storage).await;
//! }
//! ```

pub mod group_store_tests;
pub mod host_store_tests;

use std::future::Future;
use zone_inventory_storage::{ImportedHost, Storage};

/// Run all storage trait tests
pub async fn run_all_tests<S, F, Fut>(create: F)
where
    S: Storage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    println!("Running HostStore tests...");
    host_store_tests::run_all(&create).await;

    println!("Running GroupStore tests...");
    group_store_tests::run_all(&create).await;

    println!("All storage tests passed!");
}

/// Run only HostStore trait tests
pub async fn run_host_store_tests<S, F, Fut>(create: F)
where
    S: Storage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    host_store_tests::run_all(&create).await;
}

/// Run only GroupStore trait tests
pub async fn run_group_store_tests<S, F, Fut>(create: F)
where
    S: Storage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    group_store_tests::run_all(&create).await;
}

/// Build an imported host
pub fn imported(name: &str, ipv4: Option<&str>, ipv6: Option<&str>, aliases: &[&str]) -> ImportedHost {
    ImportedHost {
        name: name.to_string(),
        ipv4: ipv4.map(String::from),
        ipv6: ipv6.map(String::from),
        aliases: aliases.iter().map(|a| a.to_string()).collect(),
    }
}
