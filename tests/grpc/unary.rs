use blacklist_store::grpc::{
    DeleteRestrictionRequest, FilterRequest, GetRequest, QueryDto, RecordDto,
    UpsertRestrictionRequest,
};
use tonic::Code;

use crate::support::{default_server, product, record};

#[tokio::test]
async fn save_then_get_by_id() {
    let mut client = default_server().await;

    let saved = client
        .save(record("r1", &["c1", "c2"]))
        .await
        .unwrap()
        .into_inner();
    assert_eq!(saved, record("r1", &["c1", "c2"]));

    let found = client
        .get_by_id(GetRequest { id: "r1".into() })
        .await
        .unwrap()
        .into_inner();
    assert_eq!(found, saved);
}

#[tokio::test]
async fn save_without_restrictions_is_invalid() {
    let mut client = default_server().await;

    let status = client
        .save(RecordDto {
            id: "r1".into(),
            restrictions: Vec::new(),
        })
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::InvalidArgument);

    let status = client
        .get_by_id(GetRequest { id: "r1".into() })
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::NotFound);
}

#[tokio::test]
async fn missing_record_is_not_found() {
    let mut client = default_server().await;
    let status = client
        .get_by_id(GetRequest { id: "nope".into() })
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::NotFound);
}

#[tokio::test]
async fn restriction_lifecycle() {
    let mut client = default_server().await;

    let record = client
        .upsert_restriction(UpsertRestrictionRequest {
            record_id: "r1".into(),
            client_id: "c1".into(),
            product: product("p1"),
        })
        .await
        .unwrap()
        .into_inner();
    assert_eq!(record.restrictions.len(), 1);
    assert!(!record.restrictions[0].added_date.is_empty());

    let duplicate = client
        .upsert_restriction(UpsertRestrictionRequest {
            record_id: "r1".into(),
            client_id: "c1".into(),
            product: product("p1"),
        })
        .await
        .unwrap_err();
    assert_eq!(duplicate.code(), Code::AlreadyExists);

    let missing_product = client
        .upsert_restriction(UpsertRestrictionRequest {
            record_id: "r1".into(),
            client_id: "c2".into(),
            product: None,
        })
        .await
        .unwrap_err();
    assert_eq!(missing_product.code(), Code::InvalidArgument);

    let record = client
        .delete_restriction(DeleteRestrictionRequest {
            record_id: "r1".into(),
            client_id: "c1".into(),
            product_id: "p1".into(),
        })
        .await
        .unwrap()
        .into_inner();
    assert!(record.restrictions.is_empty());

    let gone = client
        .get_by_id(GetRequest { id: "r1".into() })
        .await
        .unwrap_err();
    assert_eq!(gone.code(), Code::NotFound);
}

#[tokio::test]
async fn delete_removes_the_record() {
    let mut client = default_server().await;
    client.save(record("r1", &["c1"])).await.unwrap();

    client
        .delete(GetRequest { id: "r1".into() })
        .await
        .unwrap();

    let status = client
        .get_by_id(GetRequest { id: "r1".into() })
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::NotFound);
}

#[tokio::test]
async fn filter_streams_matching_records() {
    let mut client = default_server().await;
    for id in ["alpha-1", "alpha-2", "beta-1"] {
        client.save(record(id, &["c1"])).await.unwrap();
    }

    let mut stream = client
        .get_by_filter(FilterRequest {
            queries: vec![QueryDto {
                field: "id".into(),
                operation: "BEGINS_WITH".into(),
                value: "alpha".into(),
            }],
            between_queries: vec![],
        })
        .await
        .unwrap()
        .into_inner();

    let mut ids = Vec::new();
    while let Some(record) = stream.message().await.unwrap() {
        ids.push(record.id);
    }
    ids.sort();
    assert_eq!(ids, vec!["alpha-1", "alpha-2"]);
}

#[tokio::test]
async fn unknown_operator_is_invalid_argument() {
    let mut client = default_server().await;
    let status = client
        .get_by_filter(FilterRequest {
            queries: vec![QueryDto {
                field: "id".into(),
                operation: "LIKE".into(),
                value: "a".into(),
            }],
            between_queries: vec![],
        })
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::InvalidArgument);
}
