//! Conversions between wire messages and domain types.

use super::messages::{
    BetweenQueryDto, ProductDto, QueryDto, RecordDto, RestrictionDto,
};
use crate::error::{BlacklistError, Result};
use crate::filter::{BetweenQuery, Query};
use crate::model::{now, Product, Record, Restriction};

impl From<Product> for ProductDto {
    fn from(product: Product) -> Self {
        Self {
            product_id: product.id,
            product_name: product.name,
        }
    }
}

impl From<ProductDto> for Product {
    fn from(dto: ProductDto) -> Self {
        Product::new(dto.product_id, dto.product_name)
    }
}

impl From<&Restriction> for RestrictionDto {
    fn from(restriction: &Restriction) -> Self {
        Self {
            client_id: restriction.client_id.clone(),
            added_date: restriction.added_date.clone(),
            product: Some(restriction.product.clone().into()),
        }
    }
}

impl From<&Record> for RecordDto {
    fn from(record: &Record) -> Self {
        Self {
            id: record.id().to_string(),
            restrictions: record.restrictions().map(RestrictionDto::from).collect(),
        }
    }
}

impl From<Record> for RecordDto {
    fn from(record: Record) -> Self {
        RecordDto::from(&record)
    }
}

impl From<QueryDto> for Query {
    fn from(dto: QueryDto) -> Self {
        Query {
            field: dto.field,
            operator: dto.operation,
            value: dto.value,
        }
    }
}

impl From<BetweenQueryDto> for BetweenQuery {
    fn from(dto: BetweenQueryDto) -> Self {
        BetweenQuery::new(dto.field, dto.init, dto.end)
    }
}

/// Unwrap a required product field.
pub(crate) fn require_product(product: Option<ProductDto>) -> Result<Product> {
    product
        .map(Product::from)
        .ok_or_else(|| BlacklistError::InvalidRequest("product is required".into()))
}

impl TryFrom<RestrictionDto> for Restriction {
    type Error = BlacklistError;

    fn try_from(dto: RestrictionDto) -> Result<Self> {
        let added_date = if dto.added_date.is_empty() {
            now()
        } else {
            dto.added_date
        };
        Ok(Restriction {
            client_id: dto.client_id,
            added_date,
            product: require_product(dto.product)?,
        })
    }
}

impl TryFrom<RecordDto> for Record {
    type Error = BlacklistError;

    fn try_from(dto: RecordDto) -> Result<Self> {
        if dto.id.is_empty() {
            return Err(BlacklistError::InvalidRequest("record id is required".into()));
        }
        if dto.restrictions.is_empty() {
            return Err(BlacklistError::InvalidRequest(
                "record must carry at least one restriction".into(),
            ));
        }
        let restrictions = dto
            .restrictions
            .into_iter()
            .map(Restriction::try_from)
            .collect::<Result<Vec<_>>>()?;
        Record::with_restrictions(dto.id, restrictions)
    }
}
