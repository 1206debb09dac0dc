use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use common::{
    BeerId, BeerOrderId, BeerOrderLineId, CustomerId, Money, Page, PageRequest, ShipmentId,
    Version,
};
use domain::{
    Audit, Beer, BeerFields, BeerOrder, BeerOrderLine, BeerOrderShipment, BeerRef, Customer,
    CustomerFields, OrderStatus, ShipmentDraft,
};
use sqlx::{PgConnection, PgPool, Postgres, Row, Transaction, postgres::PgRow};

use crate::{
    BeerFilter, Result, StoreError,
    repository::{BeerOrderRepository, BeerRepository, CustomerRepository, ShipmentRepository},
};

const BEER_COLUMNS: &str = "id, version, created_date, update_date, beer_name, beer_style, upc, \
                            quantity_on_hand, price_cents, description";

const CUSTOMER_COLUMNS: &str = "id, version, created_date, update_date, name, email, phone_number, \
                                address_line1, address_line2, city, state, postal_code";

const ORDER_COLUMNS: &str = "id, version, created_date, update_date, customer_id, customer_ref, \
                             payment_amount_cents, status";

const SHIPMENT_COLUMNS: &str = "id, version, created_date, update_date, beer_order_id, \
                                shipment_date, carrier, tracking_number";

/// PostgreSQL-backed store implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_audit(row: &PgRow) -> Result<Audit> {
        Ok(Audit {
            version: Version::new(row.try_get("version")?),
            created_date: row.try_get::<Option<DateTime<Utc>>, _>("created_date")?,
            update_date: row.try_get::<Option<DateTime<Utc>>, _>("update_date")?,
        })
    }

    fn row_to_beer(row: PgRow) -> Result<Beer> {
        Ok(Beer::restore(
            Some(BeerId::new(row.try_get("id")?)),
            Self::row_to_audit(&row)?,
            BeerFields {
                name: row.try_get("beer_name")?,
                style: row.try_get("beer_style")?,
                upc: row.try_get("upc")?,
                quantity_on_hand: row.try_get("quantity_on_hand")?,
                price: Money::from_cents(row.try_get("price_cents")?),
                description: row.try_get("description")?,
            },
        ))
    }

    fn row_to_customer(row: PgRow) -> Result<Customer> {
        Ok(Customer::restore(
            Some(CustomerId::new(row.try_get("id")?)),
            Self::row_to_audit(&row)?,
            CustomerFields {
                name: row.try_get("name")?,
                email: row.try_get("email")?,
                phone_number: row.try_get("phone_number")?,
                address_line1: row.try_get("address_line1")?,
                address_line2: row.try_get("address_line2")?,
                city: row.try_get("city")?,
                state: row.try_get("state")?,
                postal_code: row.try_get("postal_code")?,
            },
        ))
    }

    fn row_to_line(row: &PgRow) -> Result<BeerOrderLine> {
        let beer = match row.try_get::<Option<i64>, _>("beer_id")? {
            Some(beer_id) => Some(BeerRef {
                id: BeerId::new(beer_id),
                name: row.try_get("beer_name")?,
                style: row.try_get("beer_style")?,
                upc: row.try_get("upc")?,
            }),
            None => None,
        };
        Ok(BeerOrderLine::restore(
            BeerOrderLineId::new(row.try_get("id")?),
            Self::row_to_audit(row)?,
            beer,
            row.try_get("order_quantity")?,
            row.try_get("quantity_allocated")?,
            row.try_get("status")?,
        ))
    }

    fn row_to_shipment(row: &PgRow) -> Result<BeerOrderShipment> {
        Ok(BeerOrderShipment::restore(
            ShipmentId::new(row.try_get("id")?),
            Self::row_to_audit(row)?,
            BeerOrderId::new(row.try_get("beer_order_id")?),
            ShipmentDraft {
                shipment_date: row.try_get::<NaiveDateTime, _>("shipment_date")?,
                carrier: row.try_get("carrier")?,
                tracking_number: row.try_get("tracking_number")?,
            },
        ))
    }

    /// Opens a read-only transaction whose statements all see one snapshot.
    async fn begin_snapshot(&self) -> Result<Transaction<'static, Postgres>> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;
        Ok(tx)
    }

    /// Loads lines and shipments for the given order rows and assembles the
    /// aggregates, preserving row order. Must run on the connection that
    /// fetched `rows`, inside the same snapshot.
    async fn hydrate_orders(conn: &mut PgConnection, rows: Vec<PgRow>) -> Result<Vec<BeerOrder>> {
        let ids = rows
            .iter()
            .map(|row| row.try_get::<i64, _>("id"))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let line_rows = sqlx::query(
            r#"
            SELECT l.id, l.version, l.created_date, l.update_date, l.beer_order_id, l.beer_id,
                   l.order_quantity, l.quantity_allocated, l.status,
                   b.beer_name, b.beer_style, b.upc
            FROM beer_order_line l
            LEFT JOIN beer b ON b.id = l.beer_id
            WHERE l.beer_order_id = ANY($1)
            ORDER BY l.id ASC
            "#,
        )
        .bind(&ids)
        .fetch_all(&mut *conn)
        .await?;

        let mut lines: HashMap<i64, Vec<BeerOrderLine>> = HashMap::new();
        for row in &line_rows {
            let order_id: i64 = row.try_get("beer_order_id")?;
            lines.entry(order_id).or_default().push(Self::row_to_line(row)?);
        }

        let shipment_rows = sqlx::query(&format!(
            "SELECT {SHIPMENT_COLUMNS} FROM beer_order_shipment WHERE beer_order_id = ANY($1) ORDER BY id ASC"
        ))
        .bind(&ids)
        .fetch_all(&mut *conn)
        .await?;

        let mut shipments: HashMap<i64, Vec<BeerOrderShipment>> = HashMap::new();
        for row in &shipment_rows {
            let order_id: i64 = row.try_get("beer_order_id")?;
            shipments
                .entry(order_id)
                .or_default()
                .push(Self::row_to_shipment(row)?);
        }

        rows.into_iter()
            .map(|row| -> Result<BeerOrder> {
                let id: i64 = row.try_get("id")?;
                let status: String = row.try_get("status")?;
                let status = status
                    .parse::<OrderStatus>()
                    .map_err(|e| StoreError::Corrupt(e.to_string()))?;
                Ok(BeerOrder::restore(
                    BeerOrderId::new(id),
                    Self::row_to_audit(&row)?,
                    row.try_get::<Option<i64>, _>("customer_id")?
                        .map(CustomerId::new),
                    row.try_get("customer_ref")?,
                    Money::from_cents(row.try_get("payment_amount_cents")?),
                    status,
                    lines.remove(&id).unwrap_or_default(),
                    shipments.remove(&id).unwrap_or_default(),
                ))
            })
            .collect()
    }
}

/// Locks the row and checks the caller's version against the stored one.
async fn lock_for_update(
    conn: &mut PgConnection,
    table: &'static str,
    entity: &'static str,
    id: i64,
    expected: Version,
) -> Result<Audit> {
    let row = sqlx::query(&format!(
        "SELECT version, created_date, update_date FROM {table} WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(StoreError::NotFound { entity, id })?;

    let stored = PostgresStore::row_to_audit(&row)?;
    if stored.version != expected {
        return Err(StoreError::version_conflict(
            entity,
            id,
            expected,
            stored.version,
        ));
    }
    Ok(stored)
}

/// Maps a foreign key violation on insert/update to `MissingReference`.
fn missing_reference(entity: &'static str) -> impl FnOnce(sqlx::Error) -> StoreError {
    move |e| {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_foreign_key_violation()
        {
            return StoreError::MissingReference { entity };
        }
        StoreError::Database(e)
    }
}

#[async_trait]
impl BeerRepository for PostgresStore {
    async fn find_all_beers(&self, filter: &BeerFilter, page: PageRequest) -> Result<Page<Beer>> {
        let name = filter.name_pattern();
        let style = filter.style_pattern();

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM beer WHERE beer_name ILIKE $1 AND beer_style ILIKE $2",
        )
        .bind(&name)
        .bind(&style)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query(&format!(
            r#"
            SELECT {BEER_COLUMNS} FROM beer
            WHERE beer_name ILIKE $1 AND beer_style ILIKE $2
            ORDER BY id ASC
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(&name)
        .bind(&style)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let content = rows
            .into_iter()
            .map(Self::row_to_beer)
            .collect::<Result<Vec<_>>>()?;
        Ok(Page::new(content, page, total as u64))
    }

    async fn find_beer_by_id(&self, id: BeerId) -> Result<Option<Beer>> {
        let row = sqlx::query(&format!("SELECT {BEER_COLUMNS} FROM beer WHERE id = $1"))
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Self::row_to_beer).transpose()
    }

    async fn save_beer(&self, mut beer: Beer) -> Result<Beer> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        match beer.id {
            None => {
                let audit = Audit::inserted(now);
                let id: i64 = sqlx::query_scalar(
                    r#"
                    INSERT INTO beer (version, created_date, update_date, beer_name, beer_style, upc,
                                      quantity_on_hand, price_cents, description)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                    RETURNING id
                    "#,
                )
                .bind(audit.version.as_i64())
                .bind(audit.created_date)
                .bind(audit.update_date)
                .bind(&beer.name)
                .bind(&beer.style)
                .bind(&beer.upc)
                .bind(beer.quantity_on_hand)
                .bind(beer.price.cents())
                .bind(&beer.description)
                .fetch_one(&mut *tx)
                .await?;
                beer.id = Some(BeerId::new(id));
                beer.audit = audit;
            }
            Some(id) => {
                let stored =
                    lock_for_update(&mut tx, "beer", "Beer", id.as_i64(), beer.audit.version)
                        .await?;
                let audit = stored.updated(now);
                sqlx::query(
                    r#"
                    UPDATE beer
                    SET version = $2, update_date = $3, beer_name = $4, beer_style = $5, upc = $6,
                        quantity_on_hand = $7, price_cents = $8, description = $9
                    WHERE id = $1
                    "#,
                )
                .bind(id.as_i64())
                .bind(audit.version.as_i64())
                .bind(audit.update_date)
                .bind(&beer.name)
                .bind(&beer.style)
                .bind(&beer.upc)
                .bind(beer.quantity_on_hand)
                .bind(beer.price.cents())
                .bind(&beer.description)
                .execute(&mut *tx)
                .await?;
                beer.audit = audit;
            }
        }

        tx.commit().await?;
        Ok(beer)
    }

    async fn delete_beer_by_id(&self, id: BeerId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM beer WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_foreign_key_violation()
                {
                    return StoreError::Referenced {
                        entity: "Beer",
                        id: id.as_i64(),
                        referenced_by: "BeerOrderLine",
                    };
                }
                StoreError::Database(e)
            })?;
        Ok(result.rows_affected() > 0)
    }

    async fn exists_beer_by_id(&self, id: BeerId) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM beer WHERE id = $1)")
            .bind(id.as_i64())
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }
}

#[async_trait]
impl CustomerRepository for PostgresStore {
    async fn find_all_customers(&self, page: PageRequest) -> Result<Page<Customer>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customer")
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customer ORDER BY id ASC LIMIT $1 OFFSET $2"
        ))
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let content = rows
            .into_iter()
            .map(Self::row_to_customer)
            .collect::<Result<Vec<_>>>()?;
        Ok(Page::new(content, page, total as u64))
    }

    async fn find_customer_by_id(&self, id: CustomerId) -> Result<Option<Customer>> {
        let row = sqlx::query(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customer WHERE id = $1"
        ))
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_customer).transpose()
    }

    async fn save_customer(&self, mut customer: Customer) -> Result<Customer> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        match customer.id {
            None => {
                let audit = Audit::inserted(now);
                let id: i64 = sqlx::query_scalar(
                    r#"
                    INSERT INTO customer (version, created_date, update_date, name, email, phone_number,
                                          address_line1, address_line2, city, state, postal_code)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                    RETURNING id
                    "#,
                )
                .bind(audit.version.as_i64())
                .bind(audit.created_date)
                .bind(audit.update_date)
                .bind(&customer.name)
                .bind(&customer.email)
                .bind(&customer.phone_number)
                .bind(&customer.address_line1)
                .bind(&customer.address_line2)
                .bind(&customer.city)
                .bind(&customer.state)
                .bind(&customer.postal_code)
                .fetch_one(&mut *tx)
                .await?;
                customer.id = Some(CustomerId::new(id));
                customer.audit = audit;
            }
            Some(id) => {
                let stored = lock_for_update(
                    &mut tx,
                    "customer",
                    "Customer",
                    id.as_i64(),
                    customer.audit.version,
                )
                .await?;
                let audit = stored.updated(now);
                sqlx::query(
                    r#"
                    UPDATE customer
                    SET version = $2, update_date = $3, name = $4, email = $5, phone_number = $6,
                        address_line1 = $7, address_line2 = $8, city = $9, state = $10, postal_code = $11
                    WHERE id = $1
                    "#,
                )
                .bind(id.as_i64())
                .bind(audit.version.as_i64())
                .bind(audit.update_date)
                .bind(&customer.name)
                .bind(&customer.email)
                .bind(&customer.phone_number)
                .bind(&customer.address_line1)
                .bind(&customer.address_line2)
                .bind(&customer.city)
                .bind(&customer.state)
                .bind(&customer.postal_code)
                .execute(&mut *tx)
                .await?;
                customer.audit = audit;
            }
        }

        tx.commit().await?;
        Ok(customer)
    }

    async fn delete_customer_by_id(&self, id: CustomerId) -> Result<bool> {
        // beer_order.customer_id is ON DELETE SET NULL
        let result = sqlx::query("DELETE FROM customer WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn exists_customer_by_id(&self, id: CustomerId) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM customer WHERE id = $1)")
                .bind(id.as_i64())
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }
}

#[async_trait]
impl BeerOrderRepository for PostgresStore {
    async fn find_all_orders(&self, page: PageRequest) -> Result<Page<BeerOrder>> {
        let mut tx = self.begin_snapshot().await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM beer_order")
            .fetch_one(&mut *tx)
            .await?;

        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM beer_order ORDER BY id ASC LIMIT $1 OFFSET $2"
        ))
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&mut *tx)
        .await?;

        let content = Self::hydrate_orders(&mut tx, rows).await?;
        tx.commit().await?;
        Ok(Page::new(content, page, total as u64))
    }

    async fn find_order_by_id(&self, id: BeerOrderId) -> Result<Option<BeerOrder>> {
        let mut tx = self.begin_snapshot().await?;

        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM beer_order WHERE id = $1"
        ))
        .bind(id.as_i64())
        .fetch_all(&mut *tx)
        .await?;

        let order = Self::hydrate_orders(&mut tx, rows).await?.into_iter().next();
        tx.commit().await?;
        Ok(order)
    }

    async fn find_orders_by_customer(&self, customer_id: CustomerId) -> Result<Vec<BeerOrder>> {
        let mut tx = self.begin_snapshot().await?;

        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM beer_order WHERE customer_id = $1 ORDER BY id ASC"
        ))
        .bind(customer_id.as_i64())
        .fetch_all(&mut *tx)
        .await?;

        let orders = Self::hydrate_orders(&mut tx, rows).await?;
        tx.commit().await?;
        Ok(orders)
    }

    async fn save_order(&self, mut order: BeerOrder) -> Result<BeerOrder> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let (order_id, audit) = match order.id() {
            None => {
                let audit = Audit::inserted(now);
                let id: i64 = sqlx::query_scalar(
                    r#"
                    INSERT INTO beer_order (version, created_date, update_date, customer_id,
                                            customer_ref, payment_amount_cents, status)
                    VALUES ($1, $2, $3, $4, $5, $6, $7)
                    RETURNING id
                    "#,
                )
                .bind(audit.version.as_i64())
                .bind(audit.created_date)
                .bind(audit.update_date)
                .bind(order.customer_id().map(|c| c.as_i64()))
                .bind(order.customer_ref())
                .bind(order.payment_amount().cents())
                .bind(order.status().as_str())
                .fetch_one(&mut *tx)
                .await
                .map_err(missing_reference("Customer"))?;
                (BeerOrderId::new(id), audit)
            }
            Some(id) => {
                let stored = lock_for_update(
                    &mut tx,
                    "beer_order",
                    "BeerOrder",
                    id.as_i64(),
                    order.audit().version,
                )
                .await?;
                let audit = stored.updated(now);
                sqlx::query(
                    r#"
                    UPDATE beer_order
                    SET version = $2, update_date = $3, customer_id = $4, customer_ref = $5,
                        payment_amount_cents = $6, status = $7
                    WHERE id = $1
                    "#,
                )
                .bind(id.as_i64())
                .bind(audit.version.as_i64())
                .bind(audit.update_date)
                .bind(order.customer_id().map(|c| c.as_i64()))
                .bind(order.customer_ref())
                .bind(order.payment_amount().cents())
                .bind(order.status().as_str())
                .execute(&mut *tx)
                .await
                .map_err(missing_reference("Customer"))?;
                (id, audit)
            }
        };

        order.assign_identity(order_id, audit);

        // Orphan removal
        let attached: Vec<i64> = order
            .lines()
            .iter()
            .filter_map(|line| line.id.map(|id| id.as_i64()))
            .collect();
        let orphans_removed = sqlx::query(
            "DELETE FROM beer_order_line WHERE beer_order_id = $1 AND NOT (id = ANY($2))",
        )
        .bind(order_id.as_i64())
        .bind(&attached)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        for line in order.lines_mut() {
            let beer_id = line.beer_id().map(|b| b.as_i64());
            match line.id {
                None => {
                    let line_audit = Audit::inserted(now);
                    let id: i64 = sqlx::query_scalar(
                        r#"
                        INSERT INTO beer_order_line (version, created_date, update_date, beer_order_id,
                                                     beer_id, order_quantity, quantity_allocated, status)
                        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                        RETURNING id
                        "#,
                    )
                    .bind(line_audit.version.as_i64())
                    .bind(line_audit.created_date)
                    .bind(line_audit.update_date)
                    .bind(order_id.as_i64())
                    .bind(beer_id)
                    .bind(line.order_quantity)
                    .bind(line.quantity_allocated)
                    .bind(&line.status)
                    .fetch_one(&mut *tx)
                    .await
                    .map_err(missing_reference("Beer"))?;
                    line.id = Some(BeerOrderLineId::new(id));
                    line.audit = line_audit;
                }
                Some(id) => {
                    // The parent predicate keeps lines of other orders out of reach.
                    let row = sqlx::query(
                        r#"
                        UPDATE beer_order_line
                        SET version = version + 1, update_date = $3, beer_id = $4,
                            order_quantity = $5, quantity_allocated = $6, status = $7
                        WHERE id = $1 AND beer_order_id = $2
                        RETURNING version, created_date, update_date
                        "#,
                    )
                    .bind(id.as_i64())
                    .bind(order_id.as_i64())
                    .bind(now)
                    .bind(beer_id)
                    .bind(line.order_quantity)
                    .bind(line.quantity_allocated)
                    .bind(&line.status)
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(missing_reference("Beer"))?
                    .ok_or(StoreError::NotFound {
                        entity: "BeerOrderLine",
                        id: id.as_i64(),
                    })?;
                    line.audit = Self::row_to_audit(&row)?;
                }
            }
        }

        for shipment in order.shipments_mut() {
            match shipment.id {
                None => {
                    let shipment_audit = Audit::inserted(now);
                    let id: i64 = sqlx::query_scalar(
                        r#"
                        INSERT INTO beer_order_shipment (version, created_date, update_date, beer_order_id,
                                                         shipment_date, carrier, tracking_number)
                        VALUES ($1, $2, $3, $4, $5, $6, $7)
                        RETURNING id
                        "#,
                    )
                    .bind(shipment_audit.version.as_i64())
                    .bind(shipment_audit.created_date)
                    .bind(shipment_audit.update_date)
                    .bind(order_id.as_i64())
                    .bind(shipment.shipment_date)
                    .bind(&shipment.carrier)
                    .bind(&shipment.tracking_number)
                    .fetch_one(&mut *tx)
                    .await?;
                    shipment.id = Some(ShipmentId::new(id));
                    shipment.audit = shipment_audit;
                }
                Some(id) => {
                    // Stored shipments are only written through save_shipment.
                    let row = sqlx::query(&format!(
                        "SELECT {SHIPMENT_COLUMNS} FROM beer_order_shipment \
                         WHERE id = $1 AND beer_order_id = $2"
                    ))
                    .bind(id.as_i64())
                    .bind(order_id.as_i64())
                    .fetch_optional(&mut *tx)
                    .await?
                    .ok_or(StoreError::NotFound {
                        entity: "BeerOrderShipment",
                        id: id.as_i64(),
                    })?;
                    *shipment = Self::row_to_shipment(&row)?;
                }
            }
        }

        tx.commit().await?;
        tracing::debug!(%order_id, lines = order.lines().len(), orphans_removed, "saved beer order");
        Ok(order)
    }

    async fn delete_order_by_id(&self, id: BeerOrderId) -> Result<bool> {
        // Lines and shipments cascade.
        let result = sqlx::query("DELETE FROM beer_order WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn exists_order_by_id(&self, id: BeerOrderId) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM beer_order WHERE id = $1)")
                .bind(id.as_i64())
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }
}

#[async_trait]
impl ShipmentRepository for PostgresStore {
    async fn find_shipments_by_order(
        &self,
        order_id: BeerOrderId,
    ) -> Result<Vec<BeerOrderShipment>> {
        let rows = sqlx::query(&format!(
            "SELECT {SHIPMENT_COLUMNS} FROM beer_order_shipment WHERE beer_order_id = $1 ORDER BY id ASC"
        ))
        .bind(order_id.as_i64())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(Self::row_to_shipment).collect()
    }

    async fn find_shipment_by_id(&self, id: ShipmentId) -> Result<Option<BeerOrderShipment>> {
        let row = sqlx::query(&format!(
            "SELECT {SHIPMENT_COLUMNS} FROM beer_order_shipment WHERE id = $1"
        ))
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(Self::row_to_shipment).transpose()
    }

    async fn save_shipment(&self, mut shipment: BeerOrderShipment) -> Result<BeerOrderShipment> {
        let order_id = shipment.beer_order_id().ok_or(StoreError::Detached {
            entity: "BeerOrderShipment",
        })?;
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        match shipment.id {
            None => {
                let audit = Audit::inserted(now);
                let id: i64 = sqlx::query_scalar(
                    r#"
                    INSERT INTO beer_order_shipment (version, created_date, update_date, beer_order_id,
                                                     shipment_date, carrier, tracking_number)
                    VALUES ($1, $2, $3, $4, $5, $6, $7)
                    RETURNING id
                    "#,
                )
                .bind(audit.version.as_i64())
                .bind(audit.created_date)
                .bind(audit.update_date)
                .bind(order_id.as_i64())
                .bind(shipment.shipment_date)
                .bind(&shipment.carrier)
                .bind(&shipment.tracking_number)
                .fetch_one(&mut *tx)
                .await
                .map_err(missing_reference("BeerOrder"))?;
                shipment.id = Some(ShipmentId::new(id));
                shipment.audit = audit;
            }
            Some(id) => {
                let owner: Option<i64> = sqlx::query_scalar(
                    "SELECT beer_order_id FROM beer_order_shipment WHERE id = $1",
                )
                .bind(id.as_i64())
                .fetch_optional(&mut *tx)
                .await?;
                if owner != Some(order_id.as_i64()) {
                    return Err(StoreError::NotFound {
                        entity: "BeerOrderShipment",
                        id: id.as_i64(),
                    });
                }

                let stored = lock_for_update(
                    &mut tx,
                    "beer_order_shipment",
                    "BeerOrderShipment",
                    id.as_i64(),
                    shipment.audit.version,
                )
                .await?;
                let audit = stored.updated(now);
                sqlx::query(
                    r#"
                    UPDATE beer_order_shipment
                    SET version = $2, update_date = $3, shipment_date = $4, carrier = $5,
                        tracking_number = $6
                    WHERE id = $1
                    "#,
                )
                .bind(id.as_i64())
                .bind(audit.version.as_i64())
                .bind(audit.update_date)
                .bind(shipment.shipment_date)
                .bind(&shipment.carrier)
                .bind(&shipment.tracking_number)
                .execute(&mut *tx)
                .await?;
                shipment.audit = audit;
            }
        }

        tx.commit().await?;
        Ok(shipment)
    }

    async fn delete_shipment_by_id(&self, id: ShipmentId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM beer_order_shipment WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
