use std::collections::HashSet;

use blacklist_store::{BlacklistError, Product};

use crate::support::record_repository;

#[tokio::test]
async fn upsert_creates_then_extends_a_record() {
    let repo = record_repository();

    let record = repo
        .upsert_restriction("r1", "c1", Product::new("p1", "Loans"))
        .await
        .unwrap();
    assert_eq!(record.len(), 1);

    let record = repo
        .upsert_restriction("r1", "c2", Product::new("p1", "Loans"))
        .await
        .unwrap();
    assert_eq!(record.len(), 2);

    let stored = repo.get_by_id("r1").await.unwrap();
    assert_eq!(stored, record);
    assert!(stored.contains("c1", "p1"));
    assert!(stored.contains("c2", "p1"));
}

#[tokio::test]
async fn duplicate_upsert_is_rejected_and_keeps_one_restriction() {
    let repo = record_repository();
    let first = repo
        .upsert_restriction("r1", "c1", Product::new("p1", "Loans"))
        .await
        .unwrap();

    let err = repo
        .upsert_restriction("r1", "c1", Product::new("p1", "Loans"))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        BlacklistError::DuplicateRestriction {
            client_id: "c1".into(),
            product_id: "p1".into()
        }
    );

    let stored = repo.get_by_id("r1").await.unwrap();
    assert_eq!(stored.len(), 1);
    // The first timestamp survives the rejected upsert.
    assert_eq!(
        stored.restriction("c1", "p1").unwrap().added_date,
        first.restriction("c1", "p1").unwrap().added_date
    );
}

#[tokio::test]
async fn removing_the_last_restriction_deletes_the_record() {
    let repo = record_repository();
    repo.upsert_restriction("r1", "c1", Product::new("p1", "Loans"))
        .await
        .unwrap();
    repo.upsert_restriction("r1", "c1", Product::new("p2", "Cards"))
        .await
        .unwrap();

    let record = repo.remove_restriction("r1", "c1", "p1").await.unwrap();
    assert_eq!(record.len(), 1);
    assert_eq!(repo.get_by_id("r1").await.unwrap().len(), 1);

    let record = repo.remove_restriction("r1", "c1", "p2").await.unwrap();
    assert!(record.is_empty());
    assert_eq!(
        repo.get_by_id("r1").await.unwrap_err(),
        BlacklistError::NotFound("r1".into())
    );
}

#[tokio::test]
async fn removing_unknown_restrictions_fails() {
    let repo = record_repository();
    assert_eq!(
        repo.remove_restriction("r1", "c1", "p1").await.unwrap_err(),
        BlacklistError::NotFound("r1".into())
    );

    repo.upsert_restriction("r1", "c1", Product::new("p1", "Loans"))
        .await
        .unwrap();
    assert_eq!(
        repo.remove_restriction("r1", "c1", "p2").await.unwrap_err(),
        BlacklistError::RestrictionNotFound {
            client_id: "c1".into(),
            product_id: "p2".into()
        }
    );
    assert_eq!(repo.get_by_id("r1").await.unwrap().len(), 1);
}

#[tokio::test]
async fn concurrent_upserts_on_one_record_all_land() {
    let repo = record_repository();

    let mut tasks = Vec::new();
    for i in 0..16 {
        let repo = repo.clone();
        tasks.push(tokio::spawn(async move {
            repo.upsert_restriction("shared", &format!("c{}", i), Product::new("p1", "Loans"))
                .await
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let stored = repo.get_by_id("shared").await.unwrap();
    let clients: HashSet<&str> = stored.restrictions().map(|r| r.client_id.as_str()).collect();
    assert_eq!(stored.len(), 16);
    assert_eq!(clients.len(), 16);
}
