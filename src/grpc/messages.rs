//! Wire messages for `blacklist.v1.Blacklist` (prost, no `.proto` file).

#[derive(Clone, PartialEq, prost::Message)]
pub struct ProductDto {
    #[prost(string, tag = "1")]
    pub product_id: String,
    #[prost(string, tag = "2")]
    pub product_name: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct RestrictionDto {
    #[prost(string, tag = "1")]
    pub client_id: String,
    /// RFC 3339. Left empty on input to stamp the current time.
    #[prost(string, tag = "2")]
    pub added_date: String,
    #[prost(message, optional, tag = "3")]
    pub product: Option<ProductDto>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct RecordDto {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(message, repeated, tag = "2")]
    pub restrictions: Vec<RestrictionDto>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct GetRequest {
    #[prost(string, tag = "1")]
    pub id: String,
}

/// One envelope of ids on a batch stream.
#[derive(Clone, PartialEq, prost::Message)]
pub struct IdBatch {
    #[prost(string, repeated, tag = "1")]
    pub ids: Vec<String>,
}

/// One envelope of records on a save stream.
#[derive(Clone, PartialEq, prost::Message)]
pub struct RecordBatch {
    #[prost(message, repeated, tag = "1")]
    pub records: Vec<RecordDto>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct QueryDto {
    #[prost(string, tag = "1")]
    pub field: String,
    /// `EQUALS`, `GREATER_THAN`, `LESSER_THAN` or `BEGINS_WITH`.
    #[prost(string, tag = "2")]
    pub operation: String,
    #[prost(string, tag = "3")]
    pub value: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct BetweenQueryDto {
    #[prost(string, tag = "1")]
    pub field: String,
    #[prost(string, tag = "2")]
    pub init: String,
    #[prost(string, tag = "3")]
    pub end: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct FilterRequest {
    #[prost(message, repeated, tag = "1")]
    pub queries: Vec<QueryDto>,
    #[prost(message, repeated, tag = "2")]
    pub between_queries: Vec<BetweenQueryDto>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct UpsertRestrictionRequest {
    #[prost(string, tag = "1")]
    pub record_id: String,
    #[prost(string, tag = "2")]
    pub client_id: String,
    #[prost(message, optional, tag = "3")]
    pub product: Option<ProductDto>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct DeleteRestrictionRequest {
    #[prost(string, tag = "1")]
    pub record_id: String,
    #[prost(string, tag = "2")]
    pub client_id: String,
    #[prost(string, tag = "3")]
    pub product_id: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Empty {}
