use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::collections::HashMap;

use crate::db::{OrderRepository, RepositoryError};
use crate::models::order::{Delivery, Item, Order, Payment};

const ORDER_COLUMNS: &str = r#"
    o.order_uid, o.track_number, o.entry, o.locale, o.internal_signature,
    o.customer_id, o.delivery_service, o.shardkey, o.sm_id, o.date_created, o.oof_shard,
    d.name, d.phone, d.zip, d.city, d.address, d.region, d.email,
    p.transaction, p.request_id, p.currency, p.provider, p.amount, p.payment_dt,
    p.bank, p.delivery_cost, p.goods_total, p.custom_fee
"#;

const ITEM_COLUMNS: &str = r#"
    order_uid, chrt_id, track_number, price, rid, name, sale, size,
    total_price, nm_id, brand, status
"#;

/// PostgreSQL-backed order repository.
#[derive(Clone)]
pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_items(&self, order_uids: &[String]) -> Result<Vec<(String, Item)>, sqlx::Error> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM items WHERE order_uid = ANY($1) ORDER BY id ASC",
            ITEM_COLUMNS
        ))
        .bind(order_uids)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|r| Ok((r.try_get("order_uid")?, item_from_row(r)?)))
            .collect()
    }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn save_order(&self, order: &Order) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders
                (order_uid, track_number, entry, locale, internal_signature, customer_id,
                 delivery_service, shardkey, sm_id, date_created, oof_shard)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (order_uid) DO UPDATE SET
                track_number = EXCLUDED.track_number,
                entry = EXCLUDED.entry,
                locale = EXCLUDED.locale,
                internal_signature = EXCLUDED.internal_signature,
                customer_id = EXCLUDED.customer_id,
                delivery_service = EXCLUDED.delivery_service,
                shardkey = EXCLUDED.shardkey,
                sm_id = EXCLUDED.sm_id,
                date_created = EXCLUDED.date_created,
                oof_shard = EXCLUDED.oof_shard
            "#,
        )
        .bind(&order.order_uid)
        .bind(&order.track_number)
        .bind(&order.entry)
        .bind(&order.locale)
        .bind(&order.internal_signature)
        .bind(&order.customer_id)
        .bind(&order.delivery_service)
        .bind(&order.shardkey)
        .bind(order.sm_id)
        .bind(order.date_created)
        .bind(&order.oof_shard)
        .execute(&mut *tx)
        .await?;

        let payment = &order.payment;
        sqlx::query(
            r#"
            INSERT INTO payments
                (order_uid, transaction, request_id, currency, provider, amount, payment_dt,
                 bank, delivery_cost, goods_total, custom_fee)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (order_uid) DO UPDATE SET
                transaction = EXCLUDED.transaction,
                request_id = EXCLUDED.request_id,
                currency = EXCLUDED.currency,
                provider = EXCLUDED.provider,
                amount = EXCLUDED.amount,
                payment_dt = EXCLUDED.payment_dt,
                bank = EXCLUDED.bank,
                delivery_cost = EXCLUDED.delivery_cost,
                goods_total = EXCLUDED.goods_total,
                custom_fee = EXCLUDED.custom_fee
            "#,
        )
        .bind(&order.order_uid)
        .bind(&payment.transaction)
        .bind(&payment.request_id)
        .bind(&payment.currency)
        .bind(&payment.provider)
        .bind(payment.amount)
        .bind(payment.payment_dt)
        .bind(&payment.bank)
        .bind(payment.delivery_cost)
        .bind(payment.goods_total)
        .bind(payment.custom_fee)
        .execute(&mut *tx)
        .await?;

        let delivery = &order.delivery;
        sqlx::query(
            r#"
            INSERT INTO delivery (order_uid, name, phone, zip, city, address, region, email)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (order_uid) DO UPDATE SET
                name = EXCLUDED.name,
                phone = EXCLUDED.phone,
                zip = EXCLUDED.zip,
                city = EXCLUDED.city,
                address = EXCLUDED.address,
                region = EXCLUDED.region,
                email = EXCLUDED.email
            "#,
        )
        .bind(&order.order_uid)
        .bind(&delivery.name)
        .bind(&delivery.phone)
        .bind(&delivery.zip)
        .bind(&delivery.city)
        .bind(&delivery.address)
        .bind(&delivery.region)
        .bind(&delivery.email)
        .execute(&mut *tx)
        .await?;

        // Items have no natural key; a redelivered order replaces its item set.
        sqlx::query("DELETE FROM items WHERE order_uid = $1")
            .bind(&order.order_uid)
            .execute(&mut *tx)
            .await?;

        for item in &order.items {
            sqlx::query(
                r#"
                INSERT INTO items
                    (order_uid, chrt_id, track_number, price, rid, name, sale, size,
                     total_price, nm_id, brand, status)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                "#,
            )
            .bind(&order.order_uid)
            .bind(item.chrt_id)
            .bind(&item.track_number)
            .bind(item.price)
            .bind(&item.rid)
            .bind(&item.name)
            .bind(item.sale)
            .bind(&item.size)
            .bind(item.total_price)
            .bind(item.nm_id)
            .bind(&item.brand)
            .bind(item.status)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get_order_by_uid(&self, order_uid: &str) -> Result<Order, RepositoryError> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {}
            FROM orders o
            JOIN delivery d ON o.order_uid = d.order_uid
            JOIN payments p ON o.order_uid = p.order_uid
            WHERE o.order_uid = $1
            "#,
            ORDER_COLUMNS
        ))
        .bind(order_uid)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        let mut order = order_from_row(&row)?;
        order.items = self
            .load_items(&[order.order_uid.clone()])
            .await?
            .into_iter()
            .map(|(_, item)| item)
            .collect();

        Ok(order)
    }

    async fn get_last_n_orders(&self, limit: usize) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {}
            FROM orders o
            JOIN delivery d ON o.order_uid = d.order_uid
            JOIN payments p ON o.order_uid = p.order_uid
            ORDER BY o.date_created DESC
            LIMIT $1
            "#,
            ORDER_COLUMNS
        ))
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        let mut orders = rows
            .iter()
            .map(order_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        if orders.is_empty() {
            return Ok(orders);
        }

        let uids: Vec<String> = orders.iter().map(|o| o.order_uid.clone()).collect();
        let mut items_by_order: HashMap<String, Vec<Item>> = HashMap::new();
        for (uid, item) in self.load_items(&uids).await? {
            items_by_order.entry(uid).or_default().push(item);
        }

        for order in &mut orders {
            order.items = items_by_order.remove(&order.order_uid).unwrap_or_default();
        }

        Ok(orders)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn order_from_row(r: &PgRow) -> Result<Order, sqlx::Error> {
    Ok(Order {
        order_uid: r.try_get("order_uid")?,
        track_number: r.try_get("track_number")?,
        entry: r.try_get("entry")?,
        delivery: Delivery {
            name: r.try_get("name")?,
            phone: r.try_get("phone")?,
            zip: r.try_get("zip")?,
            city: r.try_get("city")?,
            address: r.try_get("address")?,
            region: r.try_get("region")?,
            email: r.try_get("email")?,
        },
        payment: Payment {
            transaction: r.try_get("transaction")?,
            request_id: r.try_get("request_id")?,
            currency: r.try_get("currency")?,
            provider: r.try_get("provider")?,
            amount: r.try_get("amount")?,
            payment_dt: r.try_get("payment_dt")?,
            bank: r.try_get("bank")?,
            delivery_cost: r.try_get("delivery_cost")?,
            goods_total: r.try_get("goods_total")?,
            custom_fee: r.try_get("custom_fee")?,
        },
        items: Vec::new(),
        locale: r.try_get("locale")?,
        internal_signature: r.try_get("internal_signature")?,
        customer_id: r.try_get("customer_id")?,
        delivery_service: r.try_get("delivery_service")?,
        shardkey: r.try_get("shardkey")?,
        sm_id: r.try_get("sm_id")?,
        date_created: r.try_get("date_created")?,
        oof_shard: r.try_get("oof_shard")?,
    })
}

fn item_from_row(r: &PgRow) -> Result<Item, sqlx::Error> {
    Ok(Item {
        chrt_id: r.try_get("chrt_id")?,
        track_number: r.try_get("track_number")?,
        price: r.try_get("price")?,
        rid: r.try_get("rid")?,
        name: r.try_get("name")?,
        sale: r.try_get("sale")?,
        size: r.try_get("size")?,
        total_price: r.try_get("total_price")?,
        nm_id: r.try_get("nm_id")?,
        brand: r.try_get("brand")?,
        status: r.try_get("status")?,
    })
}
