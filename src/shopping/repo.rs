use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::shopping::aggregate::AggregatedIngredient;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ShoppingList {
    pub id: Uuid,
    pub user_id: Uuid,
    pub start_date: Date,
    pub end_date: Date,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ShoppingListItem {
    pub id: Uuid,
    pub shopping_list_id: Uuid,
    pub name: String,
    pub amount: f64,
    pub unit: String,
    pub checked: bool,
}

/// Insert a shopping list and its items in one transaction so a crash cannot
/// leave a header without items.
pub async fn create_with_items(
    db: &PgPool,
    user_id: Uuid,
    start_date: Date,
    end_date: Date,
    items: &[AggregatedIngredient],
) -> anyhow::Result<(ShoppingList, Vec<ShoppingListItem>)> {
    let mut tx = db.begin().await?;

    let list = sqlx::query_as::<_, ShoppingList>(
        r#"
        INSERT INTO shopping_lists (user_id, start_date, end_date)
        VALUES ($1, $2, $3)
        RETURNING id, user_id, start_date, end_date, created_at
        "#,
    )
    .bind(user_id)
    .bind(start_date)
    .bind(end_date)
    .fetch_one(&mut *tx)
    .await?;

    let mut rows = Vec::with_capacity(items.len());
    for item in items {
        let row = sqlx::query_as::<_, ShoppingListItem>(
            r#"
            INSERT INTO shopping_list_items (shopping_list_id, name, amount, unit)
            VALUES ($1, $2, $3, $4)
            RETURNING id, shopping_list_id, name, amount, unit, checked
            "#,
        )
        .bind(list.id)
        .bind(&item.name)
        .bind(item.amount)
        .bind(&item.unit)
        .fetch_one(&mut *tx)
        .await?;
        rows.push(row);
    }

    tx.commit().await?;
    Ok((list, rows))
}

pub async fn list_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<ShoppingList>> {
    let rows = sqlx::query_as::<_, ShoppingList>(
        r#"
        SELECT id, user_id, start_date, end_date, created_at
        FROM shopping_lists
        WHERE user_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn find_with_items(
    db: &PgPool,
    user_id: Uuid,
    list_id: Uuid,
) -> anyhow::Result<Option<(ShoppingList, Vec<ShoppingListItem>)>> {
    let list = sqlx::query_as::<_, ShoppingList>(
        r#"
        SELECT id, user_id, start_date, end_date, created_at
        FROM shopping_lists
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(list_id)
    .bind(user_id)
    .fetch_optional(db)
    .await?;

    let Some(list) = list else {
        return Ok(None);
    };

    let items = sqlx::query_as::<_, ShoppingListItem>(
        r#"
        SELECT id, shopping_list_id, name, amount, unit, checked
        FROM shopping_list_items
        WHERE shopping_list_id = $1
        ORDER BY lower(name) ASC
        "#,
    )
    .bind(list.id)
    .fetch_all(db)
    .await?;

    Ok(Some((list, items)))
}

/// Delete a list owned by the user; items go via ON DELETE CASCADE.
pub async fn delete(db: &PgPool, user_id: Uuid, list_id: Uuid) -> anyhow::Result<u64> {
    let result = sqlx::query(r#"DELETE FROM shopping_lists WHERE id = $1 AND user_id = $2"#)
        .bind(list_id)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

/// Toggle an item; ownership is enforced through the parent list.
pub async fn set_item_checked(
    db: &PgPool,
    user_id: Uuid,
    item_id: Uuid,
    checked: bool,
) -> anyhow::Result<Option<ShoppingListItem>> {
    let item = sqlx::query_as::<_, ShoppingListItem>(
        r#"
        UPDATE shopping_list_items i
        SET checked = $3
        FROM shopping_lists l
        WHERE i.id = $1
          AND i.shopping_list_id = l.id
          AND l.user_id = $2
        RETURNING i.id, i.shopping_list_id, i.name, i.amount, i.unit, i.checked
        "#,
    )
    .bind(item_id)
    .bind(user_id)
    .bind(checked)
    .fetch_optional(db)
    .await?;
    Ok(item)
}
