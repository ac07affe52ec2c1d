use blacklist_store::{BlacklistError, Entry, InMemoryItemStore, RetryPolicy, StoreAdapter, Repository};

use crate::support::{entries, entry_repository, ids};

#[tokio::test]
async fn batch_ceiling_applies_to_every_batch_operation() {
    let repo = entry_repository(InMemoryItemStore::new(), 25);

    let too_many = entries(26);
    let too_many_ids = ids(&too_many);
    let expected = BlacklistError::BatchTooLarge {
        limit: 25,
        actual: 26,
    };
    assert_eq!(repo.save_batch(too_many).await.unwrap_err(), expected);
    assert_eq!(repo.get_batch(&too_many_ids).await.unwrap_err(), expected);
    assert_eq!(repo.delete_batch(&too_many_ids).await.unwrap_err(), expected);

    let full = entries(25);
    let full_ids = ids(&full);
    assert_eq!(repo.save_batch(full.clone()).await.unwrap(), full);
    assert_eq!(repo.get_batch(&full_ids).await.unwrap(), full);
    repo.delete_batch(&full_ids).await.unwrap();
    assert!(repo.get_batch(&full_ids).await.unwrap().is_empty());
}

#[tokio::test]
async fn caller_ceiling_can_be_lower_than_the_store() {
    let repo = entry_repository(InMemoryItemStore::new(), 5);
    assert_eq!(
        repo.save_batch(entries(6)).await.unwrap_err(),
        BlacklistError::BatchTooLarge { limit: 5, actual: 6 }
    );
    assert_eq!(repo.save_batch(entries(5)).await.unwrap().len(), 5);
}

#[tokio::test]
async fn throttled_batch_writes_eventually_complete() {
    let store = InMemoryItemStore::new();
    store.set_write_capacity(Some(7));
    let repo = entry_repository(store.clone(), 25);

    repo.save_batch(entries(25)).await.unwrap();
    assert_eq!(store.len().unwrap(), 25);
    assert_eq!(store.batch_write_calls(), 4);

    repo.delete_batch(&ids(&entries(25))).await.unwrap();
    assert!(store.is_empty().unwrap());
}

#[tokio::test]
async fn stalled_store_surfaces_exhausted_retries() {
    let store = InMemoryItemStore::new();
    store.set_write_capacity(Some(0));
    let repo: Repository<_, Entry> = Repository::new(
        StoreAdapter::new(store.clone()).with_retry(RetryPolicy::immediate(4)),
        25,
    );

    assert_eq!(
        repo.save_batch(entries(3)).await.unwrap_err(),
        BlacklistError::ExhaustedRetries {
            attempts: 4,
            unprocessed: 3
        }
    );
    assert!(store.is_empty().unwrap());
}

#[tokio::test]
async fn throttled_batch_reads_eventually_complete() {
    let store = InMemoryItemStore::new();
    let repo = entry_repository(store.clone(), 25);
    let saved = repo.save_batch(entries(10)).await.unwrap();
    store.set_read_capacity(Some(4));

    assert_eq!(repo.get_batch(&ids(&saved)).await.unwrap(), saved);
    assert_eq!(store.batch_get_calls(), 3);
}

#[tokio::test]
async fn repeated_ids_are_answered_once() {
    let store = InMemoryItemStore::new();
    let repo = entry_repository(store.clone(), 25);
    let saved = repo.save_batch(entries(3)).await.unwrap();
    let [a, b, c] = [saved[0].id(), saved[1].id(), saved[2].id()];

    let found = repo
        .get_batch(&[b.clone(), a.clone(), b.clone()])
        .await
        .unwrap();
    assert_eq!(ids(&found), vec![b.clone(), a.clone()]);

    repo.delete_batch(&[a.clone(), a, c.clone(), c]).await.unwrap();
    assert_eq!(store.len().unwrap(), 1);
    assert_eq!(repo.get_by_id(&b).await.unwrap(), saved[1]);
}

#[tokio::test]
async fn repeated_ids_in_one_save_batch_are_rejected() {
    let store = InMemoryItemStore::new();
    let repo = entry_repository(store.clone(), 25);
    let mut batch = entries(2);
    batch.push(Entry::new("r1", "c1", "p1"));

    assert_eq!(
        repo.save_batch(batch).await.unwrap_err(),
        BlacklistError::InvalidRequest("duplicate id r1:c1:p1 in batch".into())
    );
    assert!(store.is_empty().unwrap());
}
