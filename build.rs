use tonic_build::manual::Method;

fn method(name: &str, route: &str, input: &str, output: &str) -> tonic_build::manual::MethodBuilder {
    Method::builder()
        .name(name)
        .route_name(route)
        .input_type(format!("crate::grpc::{}", input))
        .output_type(format!("crate::grpc::{}", output))
        .codec_path("tonic::codec::ProstCodec")
}

fn main() {
    // Only run gRPC codegen when the "grpc" feature is enabled.
    // Cargo sets CARGO_FEATURE_GRPC when compiling with --features grpc.
    if std::env::var("CARGO_FEATURE_GRPC").is_ok() {
        let service = tonic_build::manual::Service::builder()
            .name("Blacklist")
            .package("blacklist.v1")
            .method(method("get_by_id", "GetById", "GetRequest", "RecordDto").build())
            .method(
                method("get_batch", "GetBatch", "IdBatch", "RecordDto")
                    .client_streaming()
                    .server_streaming()
                    .build(),
            )
            .method(
                method("get_by_filter", "GetByFilter", "FilterRequest", "RecordDto")
                    .server_streaming()
                    .build(),
            )
            .method(method("save", "Save", "RecordDto", "RecordDto").build())
            .method(
                method("save_batch", "SaveBatch", "RecordBatch", "RecordDto")
                    .client_streaming()
                    .server_streaming()
                    .build(),
            )
            .method(
                method(
                    "upsert_restriction",
                    "UpsertRestriction",
                    "UpsertRestrictionRequest",
                    "RecordDto",
                )
                .build(),
            )
            .method(
                method(
                    "upsert_restriction_batch",
                    "UpsertRestrictionBatch",
                    "UpsertRestrictionRequest",
                    "RecordDto",
                )
                .client_streaming()
                .server_streaming()
                .build(),
            )
            .method(
                method(
                    "delete_restriction",
                    "DeleteRestriction",
                    "DeleteRestrictionRequest",
                    "RecordDto",
                )
                .build(),
            )
            .method(
                method(
                    "delete_restriction_batch",
                    "DeleteRestrictionBatch",
                    "DeleteRestrictionRequest",
                    "RecordDto",
                )
                .client_streaming()
                .server_streaming()
                .build(),
            )
            .method(method("delete", "Delete", "GetRequest", "Empty").build())
            .method(
                method("delete_batch", "DeleteBatch", "IdBatch", "Empty")
                    .client_streaming()
                    .server_streaming()
                    .build(),
            )
            .build();

        tonic_build::manual::Builder::new().compile(&[service]);
    }
}
