use blacklist_store::{
    BetweenQuery, BlacklistError, Entry, InMemoryItemStore, Operator, Query,
};
use futures_util::TryStreamExt;

use crate::support::entry_repository;

#[tokio::test]
async fn save_get_delete_entry() {
    let repo = entry_repository(InMemoryItemStore::new(), 25);

    let saved = repo.save(Entry::new("r1", "c1", "p1")).await.unwrap();
    let id = Entry::derive_id("r1", "c1", "p1");
    assert_eq!(saved.id(), id);

    let found = repo.get_by_id(&id).await.unwrap();
    assert_eq!(found.record_id, "r1");
    assert_eq!(found.client_id, "c1");
    assert_eq!(found.product_id, "p1");
    assert_eq!(found, saved);

    repo.delete(&id).await.unwrap();
    assert_eq!(
        repo.get_by_id(&id).await.unwrap_err(),
        BlacklistError::NotFound(id)
    );
}

#[tokio::test]
async fn saving_twice_stores_the_same_state() {
    let store = InMemoryItemStore::new();
    let repo = entry_repository(store.clone(), 25);
    let entry = Entry::new("r1", "c1", "p1");

    let once = repo.save(entry.clone()).await.unwrap();
    let after_once = repo.get_by_id(&once.id()).await.unwrap();
    let twice = repo.save(repo.save(entry).await.unwrap()).await.unwrap();
    let after_twice = repo.get_by_id(&twice.id()).await.unwrap();

    assert_eq!(after_once, after_twice);
    assert_eq!(store.len().unwrap(), 1);
}

#[tokio::test]
async fn numeric_looking_ids_match_as_text() {
    let repo = entry_repository(InMemoryItemStore::new(), 25);
    repo.save(Entry::new("r1", "123", "p1")).await.unwrap();
    repo.save(Entry::new("r2", "1234", "p1")).await.unwrap();

    let found: Vec<Entry> = repo
        .get_by_filter(&[Query::new("client_id", Operator::Equals, "123")], &[])
        .unwrap()
        .try_collect()
        .await
        .unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].record_id, "r1");
}

#[tokio::test]
async fn filters_drain_across_pages() {
    let store = InMemoryItemStore::new().with_page_size(4);
    let repo = entry_repository(store, 25);
    for i in 0..20 {
        let product = if i < 12 { "loan" } else { "card" };
        repo.save(Entry::new(format!("r{:02}", i), format!("client-{}", i % 3), product))
            .await
            .unwrap();
    }

    let loans: Vec<Entry> = repo
        .get_by_filter(&[Query::new("product_id", Operator::Equals, "loan")], &[])
        .unwrap()
        .try_collect()
        .await
        .unwrap();
    assert_eq!(loans.len(), 12);

    let narrowed: Vec<Entry> = repo
        .get_by_filter(
            &[
                Query::new("product_id", Operator::Equals, "loan"),
                Query::new("client_id", Operator::BeginsWith, "client-0"),
            ],
            &[BetweenQuery::new("record_id", "r00", "r05")],
        )
        .unwrap()
        .try_collect()
        .await
        .unwrap();
    let mut record_ids: Vec<&str> = narrowed.iter().map(|e| e.record_id.as_str()).collect();
    record_ids.sort();
    assert_eq!(record_ids, vec!["r00", "r03"]);
}
