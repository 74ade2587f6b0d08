//! # Customer Repository
//!
//! Customers a bill can name. Walk-in sales carry no customer; the seeded
//! `walk-in` row is there for counters that always want one selected.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use tsk_core::validation::{validate_customer_name, validate_phone};
use tsk_core::Customer;

use crate::error::DbResult;

/// ID of the customer seeded by the schema.
pub const WALK_IN_CUSTOMER_ID: &str = "walk-in";

const CUSTOMER_COLUMNS: &str = "id, name, phone, address, created_at";

#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    id: String,
    name: String,
    phone: Option<String>,
    address: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Customer {
            id: row.id,
            name: row.name,
            phone: row.phone,
            address: row.address,
            created_at: row.created_at,
        }
    }
}

/// Loads a customer inside the caller's transaction.
pub async fn fetch_customer(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Customer>> {
    let row: Option<CustomerRow> =
        sqlx::query_as(&format!("SELECT {} FROM customers WHERE id = ?1", CUSTOMER_COLUMNS))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

    Ok(row.map(Customer::from))
}

/// Repository for customers.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Adds a customer. Blank phone and address are stored as NULL.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - Phone number already on file
    pub async fn insert(
        &self,
        name: &str,
        phone: Option<&str>,
        address: Option<&str>,
    ) -> DbResult<Customer> {
        validate_customer_name(name)?;
        let phone = phone.map(str::trim).filter(|p| !p.is_empty());
        if let Some(phone) = phone {
            validate_phone(phone)?;
        }

        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            phone: phone.map(str::to_string),
            address: address
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_string),
            created_at: Utc::now(),
        };

        debug!(id = %customer.id, name = %customer.name, "Inserting customer");

        sqlx::query(
            "INSERT INTO customers (id, name, phone, address, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(&customer.address)
        .bind(customer.created_at)
        .execute(&self.pool)
        .await?;

        Ok(customer)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let mut conn = self.pool.acquire().await?;
        fetch_customer(&mut conn, id).await
    }

    pub async fn get_by_phone(&self, phone: &str) -> DbResult<Option<Customer>> {
        let row: Option<CustomerRow> =
            sqlx::query_as(&format!("SELECT {} FROM customers WHERE phone = ?1", CUSTOMER_COLUMNS))
                .bind(phone.trim())
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(Customer::from))
    }

    /// The seeded walk-in customer.
    pub async fn walk_in(&self) -> DbResult<Option<Customer>> {
        self.get_by_id(WALK_IN_CUSTOMER_ID).await
    }

    /// Customers whose name or phone contains `query`, by name.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Customer>> {
        let pattern = format!("%{}%", query.trim());
        let rows: Vec<CustomerRow> = sqlx::query_as(&format!(
            "SELECT {} FROM customers WHERE name LIKE ?1 OR phone LIKE ?1 ORDER BY name LIMIT ?2",
            CUSTOMER_COLUMNS
        ))
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Customer::from).collect())
    }
}
