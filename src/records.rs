use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

pub type ProductId = u32;
pub type OrderId = u32;
pub type PersonId = u32;
pub type Quantity = u32;

/// A row of `products.csv`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ProductRecord {
    pub id: ProductId,
    pub name: String,
    pub category: String,
    /// Unit price
    pub price: Decimal,
    pub stock: Quantity,
}

/// A line of an order in `orders.json`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct OrderItemRecord {
    pub product_id: ProductId,
    pub qty: Quantity,
}

/// An entry of `orders.json`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct OrderRecord {
    pub order_id: OrderId,
    /// Customer name, customers are keyed by it
    pub customer: String,
    pub items: Vec<OrderItemRecord>,
}

/// An entry of `students.json`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StudentRecord {
    pub id: PersonId,
    pub name: String,
    pub age: u32,
    #[serde(deserialize_with = "text_or_number")]
    pub grade: String,
    /// Subject -> score, in the order they were entered
    #[serde(default)]
    pub marks: IndexMap<String, Decimal>,
}

/// A row of `teachers.csv`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TeacherRecord {
    pub id: PersonId,
    pub name: String,
    pub subject: String,
    pub salary: Decimal,
}

/// Reads a field written either as `"10"` or `10`
fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TextOrNumber {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match TextOrNumber::deserialize(deserializer)? {
        TextOrNumber::Text(text) => text,
        TextOrNumber::Number(number) => number.to_string(),
    })
}
