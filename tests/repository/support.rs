use blacklist_store::{
    Config, Entry, InMemoryItemStore, Model, Record, Repository, RetryPolicy, StoreAdapter,
};

pub fn record_repository() -> Repository<InMemoryItemStore, Record> {
    Repository::from_config(InMemoryItemStore::new(), &Config::default())
}

pub fn entry_repository(store: InMemoryItemStore, batch_size: usize) -> Repository<InMemoryItemStore, Entry> {
    Repository::new(
        StoreAdapter::new(store).with_retry(RetryPolicy::immediate(10)),
        batch_size,
    )
}

pub fn entries(count: usize) -> Vec<Entry> {
    (0..count)
        .map(|i| Entry::new(format!("r{}", i), "c1", "p1"))
        .collect()
}

pub fn ids<M: Model>(models: &[M]) -> Vec<String> {
    models.iter().map(Model::key).collect()
}
