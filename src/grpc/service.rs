use std::pin::Pin;

use futures_util::{Stream, StreamExt, TryStreamExt};
use tonic::{Request, Response, Status, Streaming};
use tracing::debug;

use super::convert::require_product;
use super::messages::{
    DeleteRestrictionRequest, Empty, FilterRequest, GetRequest, IdBatch, RecordBatch, RecordDto,
    UpsertRestrictionRequest,
};
use super::Blacklist;
use crate::batch::{BatchCoordinator, Flushed};
use crate::config::Config;
use crate::filter::{BetweenQuery, Query};
use crate::model::Record;
use crate::repository::Repository;
use crate::store::ItemStore;

type ResponseStream<T> = Pin<Box<dyn Stream<Item = Result<T, Status>> + Send>>;

/// gRPC handler over a [`Record`] repository. Unary calls go straight to the
/// repository; streaming calls run through the [`BatchCoordinator`].
#[derive(Clone)]
pub struct BlacklistService<S> {
    repository: Repository<S, Record>,
    coordinator: BatchCoordinator,
}

impl<S: ItemStore + Clone + 'static> BlacklistService<S> {
    pub fn new(repository: Repository<S, Record>, coordinator: BatchCoordinator) -> Self {
        Self {
            repository,
            coordinator,
        }
    }

    pub fn from_config(store: S, config: &Config) -> Self {
        Self::new(
            Repository::from_config(store, config),
            BatchCoordinator::from_config(config),
        )
    }

    pub fn repository(&self) -> &Repository<S, Record> {
        &self.repository
    }
}

fn records_of(batch: RecordBatch) -> Result<Vec<Record>, Status> {
    batch
        .records
        .into_iter()
        .map(|dto| Record::try_from(dto).map_err(Status::from))
        .collect()
}

#[tonic::async_trait]
impl<S: ItemStore + Clone + 'static> Blacklist for BlacklistService<S> {
    async fn get_by_id(&self, request: Request<GetRequest>) -> Result<Response<RecordDto>, Status> {
        let id = request.into_inner().id;
        debug!(%id, "GetById");
        let record = self.repository.get_by_id(&id).await?;
        Ok(Response::new(record.into()))
    }

    type GetBatchStream = ResponseStream<RecordDto>;

    async fn get_batch(
        &self,
        request: Request<Streaming<IdBatch>>,
    ) -> Result<Response<Self::GetBatchStream>, Status> {
        let repository = self.repository.clone();
        let incoming = request.into_inner().map_ok(|batch| batch.ids);
        let responses = self.coordinator.spawn(incoming, move |ids: Vec<String>| {
            let repository = repository.clone();
            async move {
                let records = repository.get_batch(&ids).await.map_err(Status::from);
                Flushed::from(records.map(|r| r.into_iter().map(RecordDto::from).collect()))
            }
        });
        Ok(Response::new(Box::pin(responses)))
    }

    type GetByFilterStream = ResponseStream<RecordDto>;

    async fn get_by_filter(
        &self,
        request: Request<FilterRequest>,
    ) -> Result<Response<Self::GetByFilterStream>, Status> {
        let request = request.into_inner();
        let queries: Vec<Query> = request.queries.into_iter().map(Query::from).collect();
        let between: Vec<BetweenQuery> = request
            .between_queries
            .into_iter()
            .map(BetweenQuery::from)
            .collect();
        debug!(queries = queries.len(), between = between.len(), "GetByFilter");

        let records = self.repository.get_by_filter(&queries, &between)?;
        let responses = records.map_ok(RecordDto::from).map_err(Status::from);
        Ok(Response::new(Box::pin(responses)))
    }

    async fn save(&self, request: Request<RecordDto>) -> Result<Response<RecordDto>, Status> {
        let record = Record::try_from(request.into_inner())?;
        debug!(id = record.id(), "Save");
        let saved = self.repository.save(record).await?;
        Ok(Response::new(saved.into()))
    }

    type SaveBatchStream = ResponseStream<RecordDto>;

    async fn save_batch(
        &self,
        request: Request<Streaming<RecordBatch>>,
    ) -> Result<Response<Self::SaveBatchStream>, Status> {
        let repository = self.repository.clone();
        let incoming = request
            .into_inner()
            .map(|batch| batch.and_then(records_of));
        let responses = self.coordinator.spawn(incoming, move |records: Vec<Record>| {
            let repository = repository.clone();
            async move {
                let saved = repository.save_batch(records).await.map_err(Status::from);
                Flushed::from(saved.map(|r| r.into_iter().map(RecordDto::from).collect()))
            }
        });
        Ok(Response::new(Box::pin(responses)))
    }

    async fn upsert_restriction(
        &self,
        request: Request<UpsertRestrictionRequest>,
    ) -> Result<Response<RecordDto>, Status> {
        let request = request.into_inner();
        let product = require_product(request.product)?;
        debug!(record_id = %request.record_id, client_id = %request.client_id, "UpsertRestriction");
        let record = self
            .repository
            .upsert_restriction(&request.record_id, &request.client_id, product)
            .await?;
        Ok(Response::new(record.into()))
    }

    type UpsertRestrictionBatchStream = ResponseStream<RecordDto>;

    async fn upsert_restriction_batch(
        &self,
        request: Request<Streaming<UpsertRestrictionRequest>>,
    ) -> Result<Response<Self::UpsertRestrictionBatchStream>, Status> {
        let repository = self.repository.clone();
        let incoming = request.into_inner().map_ok(|request| vec![request]);
        let responses = self.coordinator.spawn(
            incoming,
            move |requests: Vec<UpsertRestrictionRequest>| {
                let repository = repository.clone();
                async move {
                    let mut records = Vec::with_capacity(requests.len());
                    for request in requests {
                        let upserted = match require_product(request.product) {
                            Ok(product) => {
                                repository
                                    .upsert_restriction(
                                        &request.record_id,
                                        &request.client_id,
                                        product,
                                    )
                                    .await
                            }
                            Err(err) => Err(err),
                        };
                        match upserted {
                            Ok(record) => records.push(RecordDto::from(record)),
                            Err(err) => return Flushed::partial(records, Status::from(err)),
                        }
                    }
                    Flushed::ok(records)
                }
            },
        );
        Ok(Response::new(Box::pin(responses)))
    }

    async fn delete_restriction(
        &self,
        request: Request<DeleteRestrictionRequest>,
    ) -> Result<Response<RecordDto>, Status> {
        let request = request.into_inner();
        debug!(record_id = %request.record_id, client_id = %request.client_id, "DeleteRestriction");
        let record = self
            .repository
            .remove_restriction(&request.record_id, &request.client_id, &request.product_id)
            .await?;
        Ok(Response::new(record.into()))
    }

    type DeleteRestrictionBatchStream = ResponseStream<RecordDto>;

    async fn delete_restriction_batch(
        &self,
        request: Request<Streaming<DeleteRestrictionRequest>>,
    ) -> Result<Response<Self::DeleteRestrictionBatchStream>, Status> {
        let repository = self.repository.clone();
        let incoming = request.into_inner().map_ok(|request| vec![request]);
        let responses = self.coordinator.spawn(
            incoming,
            move |requests: Vec<DeleteRestrictionRequest>| {
                let repository = repository.clone();
                async move {
                    let mut records = Vec::with_capacity(requests.len());
                    for request in requests {
                        let removed = repository
                            .remove_restriction(
                                &request.record_id,
                                &request.client_id,
                                &request.product_id,
                            )
                            .await;
                        match removed {
                            Ok(record) => records.push(RecordDto::from(record)),
                            Err(err) => return Flushed::partial(records, Status::from(err)),
                        }
                    }
                    Flushed::ok(records)
                }
            },
        );
        Ok(Response::new(Box::pin(responses)))
    }

    async fn delete(&self, request: Request<GetRequest>) -> Result<Response<Empty>, Status> {
        let id = request.into_inner().id;
        debug!(%id, "Delete");
        self.repository.delete(&id).await?;
        Ok(Response::new(Empty {}))
    }

    type DeleteBatchStream = ResponseStream<Empty>;

    async fn delete_batch(
        &self,
        request: Request<Streaming<IdBatch>>,
    ) -> Result<Response<Self::DeleteBatchStream>, Status> {
        let repository = self.repository.clone();
        let incoming = request.into_inner().map_ok(|batch| batch.ids);
        let responses = self.coordinator.spawn(incoming, move |ids: Vec<String>| {
            let repository = repository.clone();
            async move {
                let deleted = repository.delete_batch(&ids).await.map_err(Status::from);
                Flushed::from(deleted.map(|()| ids.iter().map(|_| Empty {}).collect()))
            }
        });
        Ok(Response::new(Box::pin(responses)))
    }
}
