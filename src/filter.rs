//! Filter compiler: typed predicates to a store filter.
//!
//! Point predicates (`EQUALS`, `GREATER_THAN`, `LESSER_THAN`, `BEGINS_WITH`)
//! and inclusive range predicates (`BETWEEN`) are conjoined into one
//! [`Filter`]. A filter can render itself as a DynamoDB filter expression or
//! evaluate itself against an [`Item`] directly.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{BlacklistError, Result};
use crate::item::{AttributeValue, Item};

/// Comparison operator of a point predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Equals,
    GreaterThan,
    LesserThan,
    BeginsWith,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Equals => "EQUALS",
            Operator::GreaterThan => "GREATER_THAN",
            Operator::LesserThan => "LESSER_THAN",
            Operator::BeginsWith => "BEGINS_WITH",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = BlacklistError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "EQUALS" => Ok(Operator::Equals),
            "GREATER_THAN" => Ok(Operator::GreaterThan),
            "LESSER_THAN" => Ok(Operator::LesserThan),
            "BEGINS_WITH" => Ok(Operator::BeginsWith),
            other => Err(BlacklistError::UnsupportedOperator(other.to_string())),
        }
    }
}

/// A point predicate as received from a caller; the operator is validated
/// at compile time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub field: String,
    pub operator: String,
    pub value: String,
}

impl Query {
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            operator: operator.as_str().to_string(),
            value: value.into(),
        }
    }
}

/// Inclusive range predicate `init <= field <= end`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BetweenQuery {
    pub field: String,
    pub init: String,
    pub end: String,
}

impl BetweenQuery {
    pub fn new(field: impl Into<String>, init: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            init: init.into(),
            end: end.into(),
        }
    }
}

/// A predicate value as the caller wrote it.
///
/// Callers send text, while the store types attributes. The operand matches
/// string attributes by its text and number attributes by its numeric
/// reading, when it has one.
#[derive(Debug, Clone, PartialEq)]
pub struct Operand {
    text: String,
}

impl Operand {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Numeric reading of the exact text. Surrounding whitespace disqualifies.
    pub fn number(&self) -> Option<f64> {
        self.text.parse::<f64>().ok().filter(|n| n.is_finite())
    }

    fn as_string(&self) -> AttributeValue {
        AttributeValue::S(self.text.clone())
    }

    fn as_number(&self) -> Option<AttributeValue> {
        self.number().map(|_| AttributeValue::N(self.text.clone()))
    }

    /// Order `stored` against this operand the way the store does: strings
    /// lexicographically, numbers numerically, anything else incomparable.
    fn compare(&self, stored: &AttributeValue) -> Option<Ordering> {
        match stored {
            AttributeValue::S(s) => Some(s.as_str().cmp(self.text.as_str())),
            AttributeValue::N(_) => stored.as_n()?.partial_cmp(&self.number()?),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Compare(Operator, Operand),
    Between(Operand, Operand),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: String,
    pub predicate: Predicate,
}

/// Conjunction of conditions. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

/// A filter rendered for DynamoDB: expression plus placeholder maps.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterExpression {
    pub expression: String,
    pub names: HashMap<String, String>,
    pub values: HashMap<String, AttributeValue>,
}

/// Compile point and range predicates into one filter.
///
/// Returns `None` when there are no predicates at all, meaning a full scan.
pub fn compile(queries: &[Query], between: &[BetweenQuery]) -> Result<Option<Filter>> {
    let mut conditions = Vec::with_capacity(queries.len() + between.len());

    for query in queries {
        let operator: Operator = query.operator.parse()?;
        conditions.push(Condition {
            field: query.field.clone(),
            predicate: Predicate::Compare(operator, Operand::new(query.value.clone())),
        });
    }

    for range in between {
        conditions.push(Condition {
            field: range.field.clone(),
            predicate: Predicate::Between(
                Operand::new(range.init.clone()),
                Operand::new(range.end.clone()),
            ),
        });
    }

    if conditions.is_empty() {
        return Ok(None);
    }
    Ok(Some(Filter { conditions }))
}

impl Condition {
    fn matches(&self, item: &Item) -> bool {
        let Some(stored) = item.get(&self.field) else {
            return false;
        };
        match &self.predicate {
            Predicate::Compare(Operator::BeginsWith, prefix) => stored
                .as_s()
                .map_or(false, |s| s.starts_with(prefix.text())),
            Predicate::Compare(Operator::Equals, value) => {
                value.compare(stored) == Some(Ordering::Equal)
            }
            Predicate::Compare(Operator::GreaterThan, value) => {
                value.compare(stored) == Some(Ordering::Greater)
            }
            Predicate::Compare(Operator::LesserThan, value) => {
                value.compare(stored) == Some(Ordering::Less)
            }
            Predicate::Between(low, high) => {
                matches!(
                    low.compare(stored),
                    Some(Ordering::Greater | Ordering::Equal)
                ) && matches!(
                    high.compare(stored),
                    Some(Ordering::Less | Ordering::Equal)
                )
            }
        }
    }

    /// One clause per attribute type the operands can match.
    fn render(
        &self,
        index: usize,
        names: &mut HashMap<String, String>,
        values: &mut HashMap<String, AttributeValue>,
    ) -> String {
        let name = format!("#f{}", index);
        names.insert(name.clone(), self.field.clone());

        match &self.predicate {
            Predicate::Compare(Operator::BeginsWith, prefix) => {
                let placeholder = format!(":v{}", index);
                values.insert(placeholder.clone(), prefix.as_string());
                format!("begins_with({}, {})", name, placeholder)
            }
            Predicate::Compare(operator, value) => {
                let symbol = match operator {
                    Operator::GreaterThan => ">",
                    Operator::LesserThan => "<",
                    _ => "=",
                };
                let placeholder = format!(":v{}", index);
                values.insert(placeholder.clone(), value.as_string());
                let clause = format!("{} {} {}", name, symbol, placeholder);
                match value.as_number() {
                    Some(number) => {
                        let numeric = format!(":v{}n", index);
                        values.insert(numeric.clone(), number);
                        format!("({} OR {} {} {})", clause, name, symbol, numeric)
                    }
                    None => clause,
                }
            }
            Predicate::Between(low, high) => {
                let low_placeholder = format!(":v{}a", index);
                let high_placeholder = format!(":v{}b", index);
                values.insert(low_placeholder.clone(), low.as_string());
                values.insert(high_placeholder.clone(), high.as_string());
                let clause = format!("{} BETWEEN {} AND {}", name, low_placeholder, high_placeholder);
                match (low.as_number(), high.as_number()) {
                    (Some(low), Some(high)) => {
                        let low_numeric = format!(":v{}an", index);
                        let high_numeric = format!(":v{}bn", index);
                        values.insert(low_numeric.clone(), low);
                        values.insert(high_numeric.clone(), high);
                        format!(
                            "({} OR {} BETWEEN {} AND {})",
                            clause, name, low_numeric, high_numeric
                        )
                    }
                    _ => clause,
                }
            }
        }
    }
}

impl Filter {
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// True when every condition holds for `item`.
    pub fn matches(&self, item: &Item) -> bool {
        self.conditions.iter().all(|c| c.matches(item))
    }

    pub fn to_expression(&self) -> FilterExpression {
        let mut names = HashMap::new();
        let mut values = HashMap::new();
        let clauses: Vec<String> = self
            .conditions
            .iter()
            .enumerate()
            .map(|(i, condition)| condition.render(i, &mut names, &mut values))
            .collect();

        FilterExpression {
            expression: clauses.join(" AND "),
            names,
            values,
        }
    }
}
