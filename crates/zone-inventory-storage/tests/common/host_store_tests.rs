//! HostStore trait test suite

use std::future::Future;
use zone_inventory_storage::{GroupStore, Membership, Storage, StorageError};

use super::imported;

/// Run all HostStore tests
pub async fn run_all<S, F, Fut>(create: &F)
where
    S: Storage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    test_list_enabled_sorted_by_name(&create().await).await;
    test_list_empty_store(&create().await).await;
    test_facts_include_sorted_aliases_and_vars(&create().await).await;
    test_enabled_host_facts_unknown_host(&create().await).await;
    test_disabled_host_is_invisible(&create().await).await;
    test_assignable_hosts_require_ipv4(&create().await).await;
    test_reimport_preserves_disabled_flag(&create().await).await;
    test_reimport_preserves_memberships_and_vars(&create().await).await;
    test_reimport_removes_vanished_hosts(&create().await).await;
    test_reimport_replaces_aliases_and_addresses(&create().await).await;
    test_set_host_disabled_not_found(&create().await).await;
    test_unicode_and_odd_names(&create().await).await;
}

pub async fn test_list_enabled_sorted_by_name<S: Storage>(storage: &S) {
    storage
        .replace_dns_facts(&[
            imported("zeta", Some("10.0.0.3"), None, &[]),
            imported("alpha", Some("10.0.0.1"), None, &[]),
            imported("mid", None, Some("fd00::2"), &[]),
        ])
        .await
        .expect("import should succeed");

    let facts = storage
        .list_enabled_host_facts()
        .await
        .expect("list should succeed");
    let names: Vec<&str> = facts.iter().map(|f| f.host.name.as_str()).collect();
    assert_eq!(names, vec!["alpha", "mid", "zeta"]);

    let names = storage
        .list_enabled_host_names()
        .await
        .expect("list names should succeed");
    assert_eq!(names.into_iter().collect::<Vec<_>>(), vec!["alpha", "mid", "zeta"]);
}

pub async fn test_list_empty_store<S: Storage>(storage: &S) {
    assert!(storage.list_enabled_host_facts().await.unwrap().is_empty());
    assert!(storage.list_enabled_host_names().await.unwrap().is_empty());
    assert!(storage.list_assignable_hosts().await.unwrap().is_empty());
}

pub async fn test_facts_include_sorted_aliases_and_vars<S: Storage>(storage: &S) {
    storage
        .replace_dns_facts(&[
            imported("web01", Some("10.0.0.10"), Some("fd00::10"), &["www", "api", "mail"]),
            imported("db01", Some("10.0.0.20"), None, &[]),
        ])
        .await
        .expect("import should succeed");
    storage
        .set_host_var("web01", "http_port", "8080")
        .await
        .expect("set_host_var should succeed");

    let facts = storage
        .enabled_host_facts("web01")
        .await
        .expect("query should succeed")
        .expect("web01 should exist");
    assert_eq!(facts.host.ipv4.as_deref(), Some("10.0.0.10"));
    assert_eq!(facts.host.ipv6.as_deref(), Some("fd00::10"));
    assert_eq!(facts.aliases, vec!["api", "mail", "www"]);
    assert_eq!(facts.vars.get("http_port").map(String::as_str), Some("8080"));

    // Bulk listing agrees with the single-host query
    let all = storage.list_enabled_host_facts().await.unwrap();
    let web = all.iter().find(|f| f.host.name == "web01").unwrap();
    assert_eq!(web, &facts);
    let db = all.iter().find(|f| f.host.name == "db01").unwrap();
    assert!(db.aliases.is_empty());
    assert!(db.vars.is_empty());
    assert_eq!(db.host.ipv6, None);
}

pub async fn test_enabled_host_facts_unknown_host<S: Storage>(storage: &S) {
    let facts = storage
        .enabled_host_facts("does-not-exist")
        .await
        .expect("unknown host is not an error");
    assert!(facts.is_none());
}

pub async fn test_disabled_host_is_invisible<S: Storage>(storage: &S) {
    storage
        .replace_dns_facts(&[
            imported("on", Some("10.0.0.1"), None, &["on-alias"]),
            imported("off", Some("10.0.0.2"), None, &["off-alias"]),
        ])
        .await
        .unwrap();
    storage.set_host_disabled("off", true).await.unwrap();

    assert!(storage.enabled_host_facts("off").await.unwrap().is_none());
    let names = storage.list_enabled_host_names().await.unwrap();
    assert!(!names.contains("off"));
    let facts = storage.list_enabled_host_facts().await.unwrap();
    assert_eq!(facts.len(), 1);
    assert!(storage
        .list_assignable_hosts()
        .await
        .unwrap()
        .iter()
        .all(|(name, _)| name != "off"));

    // Soft delete: the row is still there
    let raw = storage.get_host("off").await.unwrap().expect("row retained");
    assert!(raw.disabled);
    assert_eq!(raw.ipv4.as_deref(), Some("10.0.0.2"));

    storage.set_host_disabled("off", false).await.unwrap();
    let facts = storage.enabled_host_facts("off").await.unwrap().unwrap();
    assert_eq!(facts.aliases, vec!["off-alias"]);
}

pub async fn test_assignable_hosts_require_ipv4<S: Storage>(storage: &S) {
    storage
        .replace_dns_facts(&[
            imported("v4", Some("192.168.1.10"), None, &[]),
            imported("v6", None, Some("fd00::1"), &[]),
            imported("both", Some("192.168.1.11"), Some("fd00::2"), &[]),
        ])
        .await
        .unwrap();

    let hosts = storage.list_assignable_hosts().await.unwrap();
    assert_eq!(
        hosts,
        vec![
            ("both".to_string(), "192.168.1.11".to_string()),
            ("v4".to_string(), "192.168.1.10".to_string()),
        ]
    );
}

pub async fn test_reimport_preserves_disabled_flag<S: Storage>(storage: &S) {
    let zone = [
        imported("printer", Some("10.0.5.5"), None, &[]),
        imported("laptop", Some("10.0.5.6"), None, &[]),
    ];
    storage.replace_dns_facts(&zone).await.unwrap();
    storage.set_host_disabled("printer", true).await.unwrap();

    let summary = storage.replace_dns_facts(&zone).await.unwrap();
    assert_eq!(summary.hosts, 2);
    assert_eq!(summary.disabled_preserved, 1);
    assert_eq!(summary.removed_hosts, 0);

    assert!(storage.get_host("printer").await.unwrap().unwrap().disabled);
    assert!(!storage.get_host("laptop").await.unwrap().unwrap().disabled);
}

pub async fn test_reimport_preserves_memberships_and_vars<S: Storage>(storage: &S) {
    let zone = [imported("app01", Some("10.1.0.1"), None, &[])];
    storage.replace_dns_facts(&zone).await.unwrap();
    storage
        .apply_memberships(&[Membership::new("app01", "curated")])
        .await
        .unwrap();
    storage.set_host_var("app01", "owner", "team-a").await.unwrap();

    storage.replace_dns_facts(&zone).await.unwrap();

    let groups = storage.load_groups().await.unwrap();
    assert!(groups["curated"].hosts.contains("app01"));
    let facts = storage.enabled_host_facts("app01").await.unwrap().unwrap();
    assert_eq!(facts.vars.get("owner").map(String::as_str), Some("team-a"));
}

pub async fn test_reimport_removes_vanished_hosts<S: Storage>(storage: &S) {
    storage
        .replace_dns_facts(&[
            imported("stays", Some("10.2.0.1"), None, &[]),
            imported("goes", Some("10.2.0.2"), None, &["goes-alias"]),
        ])
        .await
        .unwrap();
    storage
        .apply_memberships(&[Membership::new("goes", "lab")])
        .await
        .unwrap();

    let summary = storage
        .replace_dns_facts(&[imported("stays", Some("10.2.0.1"), None, &[])])
        .await
        .unwrap();
    assert_eq!(summary.removed_hosts, 1);

    assert!(storage.get_host("goes").await.unwrap().is_none());
    let groups = storage.load_groups().await.unwrap();
    assert!(groups["lab"].hosts.is_empty(), "group row itself is kept");
}

pub async fn test_reimport_replaces_aliases_and_addresses<S: Storage>(storage: &S) {
    storage
        .replace_dns_facts(&[imported("gw", Some("10.3.0.1"), Some("fd00::1"), &["router", "old"])])
        .await
        .unwrap();
    storage
        .replace_dns_facts(&[imported("gw", Some("10.3.0.254"), None, &["router"])])
        .await
        .unwrap();

    let facts = storage.enabled_host_facts("gw").await.unwrap().unwrap();
    assert_eq!(facts.host.ipv4.as_deref(), Some("10.3.0.254"));
    assert_eq!(facts.host.ipv6, None);
    assert_eq!(facts.aliases, vec!["router"]);
}

pub async fn test_set_host_disabled_not_found<S: Storage>(storage: &S) {
    let result = storage.set_host_disabled("missing", true).await;
    assert!(
        matches!(result, Err(StorageError::NotFound { .. })),
        "should return NotFound error, got: {:?}",
        result
    );
}

pub async fn test_unicode_and_odd_names<S: Storage>(storage: &S) {
    let names = ["bücher.example", "name with space", "x'; DROP TABLE hosts; --"];
    let hosts: Vec<_> = names
        .iter()
        .enumerate()
        .map(|(i, n)| imported(n, Some(&format!("10.4.0.{}", i + 1)), None, &[]))
        .collect();
    storage.replace_dns_facts(&hosts).await.unwrap();

    for name in names {
        let facts = storage.enabled_host_facts(name).await.unwrap();
        assert!(facts.is_some(), "{name} should round-trip");
    }
}
