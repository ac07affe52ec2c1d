use blacklist_store::grpc::{
    blacklist_server, BlacklistClient, BlacklistService, ProductDto, RecordDto, RestrictionDto,
};
use blacklist_store::{ChunkPolicy, Config, InMemoryItemStore};
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Channel;

/// Bind to port 0, spawn the gRPC server, and return a connected client.
pub async fn start_server(config: Config) -> BlacklistClient<Channel> {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let service = BlacklistService::from_config(InMemoryItemStore::new(), &config);
    tokio::spawn(async move {
        tonic::transport::Server::builder()
            .add_service(blacklist_server(service))
            .serve_with_incoming(TcpListenerStream::new(listener))
            .await
            .unwrap();
    });

    BlacklistClient::connect(format!("http://{addr}")).await.unwrap()
}

pub async fn default_server() -> BlacklistClient<Channel> {
    start_server(Config::default()).await
}

pub async fn accumulating_server(batch_size: usize) -> BlacklistClient<Channel> {
    start_server(
        Config::default()
            .with_batch_size(batch_size)
            .with_chunking(ChunkPolicy::Accumulate),
    )
    .await
}

pub fn product(id: &str) -> Option<ProductDto> {
    Some(ProductDto {
        product_id: id.into(),
        product_name: format!("{} product", id),
    })
}

pub fn record(id: &str, clients: &[&str]) -> RecordDto {
    RecordDto {
        id: id.into(),
        restrictions: clients
            .iter()
            .map(|client| RestrictionDto {
                client_id: (*client).into(),
                added_date: "2024-05-01T10:00:00.000Z".into(),
                product: product("p1"),
            })
            .collect(),
    }
}
