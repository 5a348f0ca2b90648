use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::plans::dto::format_date;
use crate::shopping::repo::{ShoppingList, ShoppingListItem};

#[derive(Debug, Deserialize)]
pub struct GenerateShoppingListRequest {
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Deserialize)]
pub struct CheckItemRequest {
    pub checked: bool,
}

#[derive(Debug, Serialize)]
pub struct ShoppingListItemResponse {
    pub id: Uuid,
    pub name: String,
    pub amount: f64,
    pub unit: String,
    pub checked: bool,
}

impl From<ShoppingListItem> for ShoppingListItemResponse {
    fn from(i: ShoppingListItem) -> Self {
        Self {
            id: i.id,
            name: i.name,
            amount: i.amount,
            unit: i.unit,
            checked: i.checked,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ShoppingListSummary {
    pub id: Uuid,
    pub start_date: String,
    pub end_date: String,
}

impl From<ShoppingList> for ShoppingListSummary {
    fn from(l: ShoppingList) -> Self {
        Self {
            id: l.id,
            start_date: format_date(l.start_date),
            end_date: format_date(l.end_date),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ShoppingListResponse {
    pub id: Uuid,
    pub start_date: String,
    pub end_date: String,
    pub items: Vec<ShoppingListItemResponse>,
}

impl ShoppingListResponse {
    pub fn from_parts(list: ShoppingList, items: Vec<ShoppingListItem>) -> Self {
        Self {
            id: list.id,
            start_date: format_date(list.start_date),
            end_date: format_date(list.end_date),
            items: items.into_iter().map(Into::into).collect(),
        }
    }
}
