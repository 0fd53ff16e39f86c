//! GroupStore trait test suite

use std::future::Future;
use zone_inventory_storage::{HostStore, Membership, Storage};

use super::imported;

/// Run all GroupStore tests
pub async fn run_all<S, F, Fut>(create: &F)
where
    S: Storage,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    test_load_groups_empty(&create().await).await;
    test_group_members_sorted_and_vars_merged(&create().await).await;
    test_empty_group_is_returned(&create().await).await;
    test_disabled_members_filtered(&create().await).await;
    test_apply_memberships_is_idempotent(&create().await).await;
    test_apply_memberships_counts_new_rows_only(&create().await).await;
    test_group_names_keep_spaces(&create().await).await;
    test_set_group_var_overwrites(&create().await).await;
}

async fn seed<S: Storage>(storage: &S) {
    storage
        .replace_dns_facts(&[
            imported("web02", Some("10.0.1.2"), None, &[]),
            imported("web01", Some("10.0.1.1"), None, &[]),
            imported("db01", Some("10.0.2.1"), None, &[]),
        ])
        .await
        .expect("seed import should succeed");
}

pub async fn test_load_groups_empty<S: Storage>(storage: &S) {
    assert!(storage.load_groups().await.unwrap().is_empty());
    assert_eq!(storage.count_memberships().await.unwrap(), 0);
}

pub async fn test_group_members_sorted_and_vars_merged<S: Storage>(storage: &S) {
    seed(storage).await;
    storage
        .apply_memberships(&[
            Membership::new("web02", "web"),
            Membership::new("web01", "web"),
            Membership::new("db01", "db"),
        ])
        .await
        .unwrap();
    storage.set_group_var("web", "http_port", "80").await.unwrap();
    storage.set_group_var("web", "tls", "true").await.unwrap();

    let groups = storage.load_groups().await.unwrap();
    assert_eq!(groups.len(), 2);

    let web = &groups["web"];
    assert_eq!(web.hosts.iter().collect::<Vec<_>>(), vec!["web01", "web02"]);
    assert_eq!(web.vars.len(), 2);
    assert_eq!(web.vars["tls"], "true");

    let db = &groups["db"];
    assert_eq!(db.hosts.iter().collect::<Vec<_>>(), vec!["db01"]);
    assert!(db.vars.is_empty());
}

pub async fn test_empty_group_is_returned<S: Storage>(storage: &S) {
    storage.ensure_group("staging").await.unwrap();
    storage.ensure_group("staging").await.unwrap();

    let groups = storage.load_groups().await.unwrap();
    let staging = groups.get("staging").expect("empty group is still a record");
    assert!(staging.hosts.is_empty());
}

pub async fn test_disabled_members_filtered<S: Storage>(storage: &S) {
    seed(storage).await;
    storage
        .apply_memberships(&[
            Membership::new("web01", "web"),
            Membership::new("web02", "web"),
            Membership::new("db01", "db"),
        ])
        .await
        .unwrap();
    storage.set_host_disabled("web02", true).await.unwrap();
    storage.set_host_disabled("db01", true).await.unwrap();

    let groups = storage.load_groups().await.unwrap();
    assert_eq!(groups["web"].hosts.iter().collect::<Vec<_>>(), vec!["web01"]);
    assert!(groups["db"].hosts.is_empty(), "group kept with no visible members");

    // Membership rows themselves are untouched
    assert_eq!(storage.count_memberships().await.unwrap(), 3);
}

pub async fn test_apply_memberships_is_idempotent<S: Storage>(storage: &S) {
    seed(storage).await;
    let batch = [
        Membership::new("web01", "web"),
        Membership::new("web01", "all-servers"),
        Membership::new("db01", "all-servers"),
    ];

    let first = storage.apply_memberships(&batch).await.unwrap();
    assert_eq!(first.memberships_processed, 3);
    assert_eq!(first.memberships_inserted, 3);
    assert_eq!(first.groups_ensured, 2);

    let second = storage.apply_memberships(&batch).await.unwrap();
    assert_eq!(second.memberships_processed, 3);
    assert_eq!(second.memberships_inserted, 0);

    assert_eq!(storage.count_memberships().await.unwrap(), 3);
}

pub async fn test_apply_memberships_counts_new_rows_only<S: Storage>(storage: &S) {
    seed(storage).await;
    storage
        .apply_memberships(&[Membership::new("web01", "web")])
        .await
        .unwrap();

    let summary = storage
        .apply_memberships(&[
            Membership::new("web01", "web"),
            Membership::new("web02", "web"),
        ])
        .await
        .unwrap();
    assert_eq!(summary.memberships_inserted, 1);
    assert_eq!(storage.count_memberships().await.unwrap(), 2);
}

pub async fn test_group_names_keep_spaces<S: Storage>(storage: &S) {
    seed(storage).await;
    storage
        .apply_memberships(&[Membership::new("db01", "Server VLAN 20")])
        .await
        .unwrap();

    let groups = storage.load_groups().await.unwrap();
    assert!(groups.contains_key("Server VLAN 20"));
}

pub async fn test_set_group_var_overwrites<S: Storage>(storage: &S) {
    storage.set_group_var("dmz", "gateway", "10.9.0.1").await.unwrap();
    storage.set_group_var("dmz", "gateway", "10.9.0.254").await.unwrap();

    let groups = storage.load_groups().await.unwrap();
    assert_eq!(groups["dmz"].vars["gateway"], "10.9.0.254");
    assert_eq!(groups["dmz"].vars.len(), 1);
}
