//! DynamoDB item store.
//!
//! One table, primary key `id` (string). Every call maps SDK failures to
//! `StoreUnavailable`; unprocessed batch entries are handed back to the
//! adapter rather than retried here.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::{
    AttributeValue as DynamoValue, DeleteRequest, KeysAndAttributes, PutRequest,
    WriteRequest as DynamoWrite,
};
use aws_sdk_dynamodb::Client;

use super::{BatchGetOutput, Cursor, ItemStore, ScanPage, WriteRequest};
use crate::error::{BlacklistError, Result};
use crate::filter::Filter;
use crate::item::{AttributeValue, Item, ID};

/// DynamoDB-backed item store. Clone-cheap; the SDK client is shared.
#[derive(Clone)]
pub struct DynamoItemStore {
    client: Client,
    table: String,
}

impl std::fmt::Debug for DynamoItemStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamoItemStore")
            .field("table", &self.table)
            .finish()
    }
}

impl DynamoItemStore {
    /// Connect using the default AWS configuration chain, optionally
    /// overriding the endpoint (e.g. DynamoDB Local).
    pub async fn connect(table: impl Into<String>, endpoint: Option<String>) -> Self {
        let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let mut builder = aws_sdk_dynamodb::config::Builder::from(&sdk_config);
        if let Some(endpoint) = endpoint {
            builder = builder.endpoint_url(endpoint);
        }
        Self::from_client(Client::from_conf(builder.build()), table)
    }

    /// Create from a pre-built client.
    pub fn from_client(client: Client, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }
}

fn unavailable(operation: &str, err: impl std::fmt::Display) -> BlacklistError {
    BlacklistError::StoreUnavailable(format!("DynamoDB {} failed: {}", operation, err))
}

fn to_dynamo(value: &AttributeValue) -> DynamoValue {
    match value {
        AttributeValue::S(s) => DynamoValue::S(s.clone()),
        AttributeValue::N(n) => DynamoValue::N(n.clone()),
        AttributeValue::Bool(b) => DynamoValue::Bool(*b),
        AttributeValue::Null => DynamoValue::Null(true),
        AttributeValue::L(l) => DynamoValue::L(l.iter().map(to_dynamo).collect()),
        AttributeValue::M(m) => DynamoValue::M(to_dynamo_map(m)),
    }
}

fn to_dynamo_map(item: &HashMap<String, AttributeValue>) -> HashMap<String, DynamoValue> {
    item.iter()
        .map(|(k, v)| (k.clone(), to_dynamo(v)))
        .collect()
}

fn from_dynamo(value: &DynamoValue) -> Result<AttributeValue> {
    Ok(match value {
        DynamoValue::S(s) => AttributeValue::S(s.clone()),
        DynamoValue::N(n) => AttributeValue::N(n.clone()),
        DynamoValue::Bool(b) => AttributeValue::Bool(*b),
        DynamoValue::Null(_) => AttributeValue::Null,
        DynamoValue::L(l) => AttributeValue::L(l.iter().map(from_dynamo).collect::<Result<_>>()?),
        DynamoValue::M(m) => AttributeValue::M(from_dynamo_map(m)?),
        other => {
            return Err(BlacklistError::MalformedItem(format!(
                "unsupported attribute type {:?}",
                other
            )))
        }
    })
}

fn from_dynamo_map(item: &HashMap<String, DynamoValue>) -> Result<Item> {
    item.iter()
        .map(|(k, v)| Ok((k.clone(), from_dynamo(v)?)))
        .collect()
}

fn key_of(id: &str) -> HashMap<String, DynamoValue> {
    HashMap::from([(ID.to_string(), DynamoValue::S(id.to_string()))])
}

fn id_of(key: &HashMap<String, DynamoValue>) -> Result<String> {
    match key.get(ID) {
        Some(DynamoValue::S(id)) => Ok(id.clone()),
        _ => Err(BlacklistError::missing(ID)),
    }
}

fn to_dynamo_write(write: &WriteRequest) -> Result<DynamoWrite> {
    let request = match write {
        WriteRequest::Put(item) => DynamoWrite::builder().put_request(
            PutRequest::builder()
                .set_item(Some(to_dynamo_map(item)))
                .build()
                .map_err(|e| BlacklistError::InvalidRequest(e.to_string()))?,
        ),
        WriteRequest::Delete(id) => DynamoWrite::builder().delete_request(
            DeleteRequest::builder()
                .set_key(Some(key_of(id)))
                .build()
                .map_err(|e| BlacklistError::InvalidRequest(e.to_string()))?,
        ),
    };
    Ok(request.build())
}

fn from_dynamo_write(write: &DynamoWrite) -> Result<WriteRequest> {
    if let Some(put) = write.put_request() {
        return Ok(WriteRequest::Put(from_dynamo_map(put.item())?));
    }
    if let Some(delete) = write.delete_request() {
        return Ok(WriteRequest::Delete(id_of(delete.key())?));
    }
    Err(BlacklistError::MalformedItem(
        "unprocessed write without put or delete".into(),
    ))
}

#[async_trait]
impl ItemStore for DynamoItemStore {
    async fn get_item(&self, id: &str) -> Result<Option<Item>> {
        let response = self
            .client
            .get_item()
            .table_name(&self.table)
            .set_key(Some(key_of(id)))
            .send()
            .await
            .map_err(|e| unavailable("GetItem", e))?;
        response.item().map(from_dynamo_map).transpose()
    }

    async fn batch_get_items(&self, ids: &[String]) -> Result<BatchGetOutput> {
        if ids.is_empty() {
            return Ok(BatchGetOutput::default());
        }
        let keys = KeysAndAttributes::builder()
            .set_keys(Some(ids.iter().map(|id| key_of(id)).collect()))
            .build()
            .map_err(|e| BlacklistError::InvalidRequest(e.to_string()))?;

        let response = self
            .client
            .batch_get_item()
            .request_items(&self.table, keys)
            .send()
            .await
            .map_err(|e| unavailable("BatchGetItem", e))?;

        let mut output = BatchGetOutput::default();
        if let Some(items) = response.responses().and_then(|r| r.get(&self.table)) {
            for item in items {
                output.items.push(from_dynamo_map(item)?);
            }
        }
        if let Some(pending) = response.unprocessed_keys().and_then(|u| u.get(&self.table)) {
            for key in pending.keys() {
                output.unprocessed.push(id_of(key)?);
            }
        }
        Ok(output)
    }

    async fn put_item(&self, item: Item) -> Result<()> {
        self.client
            .put_item()
            .table_name(&self.table)
            .set_item(Some(to_dynamo_map(&item)))
            .send()
            .await
            .map_err(|e| unavailable("PutItem", e))?;
        Ok(())
    }

    async fn delete_item(&self, id: &str) -> Result<()> {
        self.client
            .delete_item()
            .table_name(&self.table)
            .set_key(Some(key_of(id)))
            .send()
            .await
            .map_err(|e| unavailable("DeleteItem", e))?;
        Ok(())
    }

    async fn batch_write(&self, writes: Vec<WriteRequest>) -> Result<Vec<WriteRequest>> {
        if writes.is_empty() {
            return Ok(Vec::new());
        }
        let requests = writes
            .iter()
            .map(to_dynamo_write)
            .collect::<Result<Vec<_>>>()?;

        let response = self
            .client
            .batch_write_item()
            .request_items(&self.table, requests)
            .send()
            .await
            .map_err(|e| unavailable("BatchWriteItem", e))?;

        match response.unprocessed_items().and_then(|u| u.get(&self.table)) {
            Some(pending) => pending.iter().map(from_dynamo_write).collect(),
            None => Ok(Vec::new()),
        }
    }

    async fn scan(&self, filter: Option<&Filter>, cursor: Option<&Cursor>) -> Result<ScanPage> {
        let mut request = self.client.scan().table_name(&self.table);
        if let Some(filter) = filter {
            let expression = filter.to_expression();
            request = request
                .filter_expression(expression.expression)
                .set_expression_attribute_names(Some(expression.names))
                .set_expression_attribute_values(Some(
                    expression
                        .values
                        .iter()
                        .map(|(k, v)| (k.clone(), to_dynamo(v)))
                        .collect(),
                ));
        }
        if let Some(cursor) = cursor {
            request = request.set_exclusive_start_key(Some(key_of(cursor.last_key())));
        }

        let response = request.send().await.map_err(|e| unavailable("Scan", e))?;

        let items = response
            .items()
            .iter()
            .map(from_dynamo_map)
            .collect::<Result<Vec<_>>>()?;
        let cursor = match response.last_evaluated_key() {
            Some(key) if !key.is_empty() => Some(Cursor::new(id_of(key)?)),
            _ => None,
        };
        Ok(ScanPage { items, cursor })
    }
}
