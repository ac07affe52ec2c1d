use blacklist_store::grpc::{
    DeleteRestrictionRequest, GetRequest, IdBatch, RecordBatch, UpsertRestrictionRequest,
};
use tonic::Code;

use crate::support::{accumulating_server, default_server, product, record};

#[tokio::test]
async fn save_batch_answers_in_order() {
    let mut client = default_server().await;
    let batch = RecordBatch {
        records: vec![record("A", &["c1"]), record("B", &["c1"]), record("C", &["c1"])],
    };

    let mut responses = client
        .save_batch(tokio_stream::iter(vec![batch.clone()]))
        .await
        .unwrap()
        .into_inner();

    let mut saved = Vec::new();
    while let Some(record) = responses.message().await.unwrap() {
        saved.push(record);
    }
    assert_eq!(saved, batch.records);
}

#[tokio::test]
async fn get_and_delete_batches_cover_every_envelope() {
    let mut client = default_server().await;
    for id in ["a", "b", "c", "d"] {
        client.save(record(id, &["c1"])).await.unwrap();
    }

    let envelopes = vec![
        IdBatch {
            ids: vec!["c".into(), "a".into()],
        },
        IdBatch {
            ids: vec!["missing".into(), "d".into()],
        },
    ];
    let mut found = client
        .get_batch(tokio_stream::iter(envelopes.clone()))
        .await
        .unwrap()
        .into_inner();
    let mut ids = Vec::new();
    while let Some(record) = found.message().await.unwrap() {
        ids.push(record.id);
    }
    assert_eq!(ids, vec!["c", "a", "d"]);

    let mut deleted = client
        .delete_batch(tokio_stream::iter(envelopes))
        .await
        .unwrap()
        .into_inner();
    let mut acks = 0;
    while deleted.message().await.unwrap().is_some() {
        acks += 1;
    }
    assert_eq!(acks, 4);

    let remaining = client
        .get_by_id(GetRequest { id: "b".into() })
        .await
        .unwrap()
        .into_inner();
    assert_eq!(remaining.id, "b");
    let status = client
        .get_by_id(GetRequest { id: "a".into() })
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::NotFound);
}

#[tokio::test]
async fn oversized_envelope_fails_the_stream() {
    let mut client = default_server().await;
    let ids: Vec<String> = (0..26).map(|i| format!("r{}", i)).collect();

    let mut responses = client
        .get_batch(tokio_stream::iter(vec![IdBatch { ids }]))
        .await
        .unwrap()
        .into_inner();

    let status = responses.message().await.unwrap_err();
    assert_eq!(status.code(), Code::InvalidArgument);
}

#[tokio::test]
async fn accumulated_upserts_flush_the_tail() {
    let mut client = accumulating_server(2).await;
    let requests: Vec<UpsertRestrictionRequest> = ["c1", "c2", "c3"]
        .iter()
        .map(|client_id| UpsertRestrictionRequest {
            record_id: "r1".into(),
            client_id: (*client_id).into(),
            product: product("p1"),
        })
        .collect();

    let mut responses = client
        .upsert_restriction_batch(tokio_stream::iter(requests))
        .await
        .unwrap()
        .into_inner();

    let mut sizes = Vec::new();
    while let Some(record) = responses.message().await.unwrap() {
        sizes.push(record.restrictions.len());
    }
    assert_eq!(sizes, vec![1, 2, 3]);

    let removals: Vec<DeleteRestrictionRequest> = ["c1", "c2", "c3"]
        .iter()
        .map(|client_id| DeleteRestrictionRequest {
            record_id: "r1".into(),
            client_id: (*client_id).into(),
            product_id: "p1".into(),
        })
        .collect();
    let mut responses = client
        .delete_restriction_batch(tokio_stream::iter(removals))
        .await
        .unwrap()
        .into_inner();
    let mut sizes = Vec::new();
    while let Some(record) = responses.message().await.unwrap() {
        sizes.push(record.restrictions.len());
    }
    assert_eq!(sizes, vec![2, 1, 0]);

    let status = client
        .get_by_id(GetRequest { id: "r1".into() })
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::NotFound);
}

#[tokio::test]
async fn applied_upserts_are_answered_before_a_failure() {
    let mut client = accumulating_server(3).await;
    let requests: Vec<UpsertRestrictionRequest> = [("r1", "c1"), ("r2", "c1"), ("r1", "c1")]
        .iter()
        .map(|(record_id, client_id)| UpsertRestrictionRequest {
            record_id: (*record_id).into(),
            client_id: (*client_id).into(),
            product: product("p1"),
        })
        .collect();

    let mut responses = client
        .upsert_restriction_batch(tokio_stream::iter(requests))
        .await
        .unwrap()
        .into_inner();

    let first = responses.message().await.unwrap().unwrap();
    assert_eq!(first.id, "r1");
    let second = responses.message().await.unwrap().unwrap();
    assert_eq!(second.id, "r2");
    let status = responses.message().await.unwrap_err();
    assert_eq!(status.code(), Code::AlreadyExists);

    for id in ["r1", "r2"] {
        let stored = client
            .get_by_id(GetRequest { id: id.into() })
            .await
            .unwrap()
            .into_inner();
        assert_eq!(stored.restrictions.len(), 1);
    }
}

#[tokio::test]
async fn repeated_ids_in_a_save_batch_are_rejected() {
    let mut client = default_server().await;
    let batch = RecordBatch {
        records: vec![record("A", &["c1"]), record("A", &["c2"])],
    };

    let mut responses = client
        .save_batch(tokio_stream::iter(vec![batch]))
        .await
        .unwrap()
        .into_inner();

    let status = responses.message().await.unwrap_err();
    assert_eq!(status.code(), Code::InvalidArgument);
    let status = client
        .get_by_id(GetRequest { id: "A".into() })
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::NotFound);
}
