use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use common::OrderId;
use domain::{Chain, Money, Order, OrderEvent, OrderStatus};
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{
    Result, StoreError,
    store::{OrderStore, OrderUpdate},
};

/// Schema for the orders projection and its event log.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS orders (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    tld TEXT NOT NULL,
    chain TEXT NOT NULL,
    years INT NOT NULL DEFAULT 1,
    price_cents BIGINT NOT NULL,
    owner_address TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'PENDING_PAYMENT',
    payment_session_id TEXT,
    payment_id TEXT,
    registration_tx TEXT,
    swap_tx TEXT,
    registration_error TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    paid_at TIMESTAMPTZ,
    registered_at TIMESTAMPTZ
);

CREATE INDEX IF NOT EXISTS idx_orders_status ON orders(status);
CREATE INDEX IF NOT EXISTS idx_orders_name ON orders(name);
CREATE INDEX IF NOT EXISTS idx_orders_session ON orders(payment_session_id);

CREATE TABLE IF NOT EXISTS order_events (
    id BIGSERIAL PRIMARY KEY,
    order_id TEXT NOT NULL REFERENCES orders(id),
    kind TEXT NOT NULL,
    payload JSONB,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX IF NOT EXISTS idx_order_events_order ON order_events(order_id);
"#;

const ORDER_COLUMNS: &str = "id, name, tld, chain, years, price_cents, owner_address, status, \
     payment_session_id, payment_id, registration_tx, swap_tx, registration_error, \
     created_at, updated_at, paid_at, registered_at";

/// PostgreSQL-backed order store.
#[derive(Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    /// Creates a new PostgreSQL order store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Applies the schema. Idempotent.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let chain_raw: String = row.try_get("chain")?;
        let chain = Chain::from_str(&chain_raw).map_err(|_| StoreError::Decode {
            column: "chain".to_string(),
            value: chain_raw,
        })?;
        let status_raw: String = row.try_get("status")?;
        let status = OrderStatus::from_str(&status_raw).map_err(|_| StoreError::Decode {
            column: "status".to_string(),
            value: status_raw,
        })?;

        Ok(Order {
            id: OrderId::from_string(row.try_get::<String, _>("id")?),
            name: row.try_get("name")?,
            tld: row.try_get("tld")?,
            chain,
            years: row.try_get::<i32, _>("years")? as u32,
            price: Money::from_cents(row.try_get("price_cents")?),
            owner_address: row.try_get("owner_address")?,
            status,
            payment_session_id: row.try_get("payment_session_id")?,
            payment_id: row.try_get("payment_id")?,
            registration_tx: row.try_get("registration_tx")?,
            swap_tx: row.try_get("swap_tx")?,
            registration_error: row.try_get("registration_error")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            paid_at: row.try_get("paid_at")?,
            registered_at: row.try_get("registered_at")?,
        })
    }

    fn row_to_event(row: PgRow) -> Result<OrderEvent> {
        Ok(OrderEvent {
            id: row.try_get("id")?,
            order_id: OrderId::from_string(row.try_get::<String, _>("order_id")?),
            kind: row.try_get("kind")?,
            payload: row.try_get("payload")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    #[tracing::instrument(skip(self, order), fields(order_id = %order.id))]
    async fn insert_order(&self, order: Order) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO orders (id, name, tld, chain, years, price_cents, owner_address, status,
                payment_session_id, payment_id, registration_tx, swap_tx, registration_error,
                created_at, updated_at, paid_at, registered_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#,
        )
        .bind(order.id.as_str())
        .bind(&order.name)
        .bind(&order.tld)
        .bind(order.chain.as_str())
        .bind(order.years as i32)
        .bind(order.price.cents())
        .bind(&order.owner_address)
        .bind(order.status.as_str())
        .bind(&order.payment_session_id)
        .bind(&order.payment_id)
        .bind(&order.registration_tx)
        .bind(&order.swap_tx)
        .bind(&order.registration_error)
        .bind(order.created_at)
        .bind(order.updated_at)
        .bind(order.paid_at)
        .bind(order.registered_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                metrics::counter!("store_orders_inserted").increment(1);
                Ok(())
            }
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(StoreError::Duplicate(order.id))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_order(&self, id: &OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn find_by_payment_ref(&self, reference: &str) -> Result<Option<Order>> {
        let row = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE payment_session_id = $1 OR payment_id = $1"
        ))
        .bind(reference)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_order).transpose()
    }

    #[tracing::instrument(skip(self, update), fields(order_id = %id))]
    async fn apply(&self, id: &OrderId, update: OrderUpdate) -> Result<Order> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.as_str())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StoreError::OrderNotFound(id.clone()))?;

        let mut order = Self::row_to_order(row)?;
        update.apply_to(&mut order);

        sqlx::query(
            r#"
            UPDATE orders
            SET status = $2, payment_id = $3, registration_tx = $4, swap_tx = $5,
                registration_error = $6, updated_at = $7, paid_at = $8, registered_at = $9
            WHERE id = $1
            "#,
        )
        .bind(order.id.as_str())
        .bind(order.status.as_str())
        .bind(&order.payment_id)
        .bind(&order.registration_tx)
        .bind(&order.swap_tx)
        .bind(&order.registration_error)
        .bind(order.updated_at)
        .bind(order.paid_at)
        .bind(order.registered_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(order)
    }

    async fn append_event(
        &self,
        id: &OrderId,
        kind: &str,
        payload: Option<serde_json::Value>,
    ) -> Result<()> {
        let result = sqlx::query(
            "INSERT INTO order_events (order_id, kind, payload, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(id.as_str())
        .bind(kind)
        .bind(payload)
        .bind(Utc::now())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                metrics::counter!("store_events_appended").increment(1);
                Ok(())
            }
            Err(sqlx::Error::Database(db_err)) if db_err.is_foreign_key_violation() => {
                Err(StoreError::OrderNotFound(id.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn events_for_order(&self, id: &OrderId) -> Result<Vec<OrderEvent>> {
        let rows = sqlx::query(
            "SELECT id, order_id, kind, payload, created_at \
             FROM order_events WHERE order_id = $1 ORDER BY id ASC",
        )
        .bind(id.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_event).collect()
    }
}
