//! SQLite persistence layer for the property-management back end.
//!
//! This crate stores apartments, rooms, customers, invoices (with their send
//! history) and notifications using SQLx with SQLite. Every operation is a
//! free function taking the pool, so callers thread a [`Database`] handle
//! through their constructors instead of relying on a global connection.
//!
//! # Example
//!
//! ```no_run
//! use database::{apartment, room, Database};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:property.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     // Create an apartment and one of its rooms
//!     let building = apartment::find_or_create_apartment(db.pool(), "P1").await?;
//!     room::find_or_create_room(db.pool(), "101", building.id).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod apartment;
pub mod customer;
pub mod error;
pub mod invoice;
pub mod models;
pub mod notification;
pub mod room;
pub mod validation;

pub use error::{DatabaseError, Result};
pub use models::{
    Apartment, Contract, Customer, DeliveryLog, Electricity, HistoryEntry, Invoice, InvoiceDraft,
    InvoiceKey, InvoiceStatus, Notification, Room,
};
pub use validation::ValidationError;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    const DEFAULT_POOL_SIZE: u32 = 10;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `sqlite::memory:` for tests.
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!(
            "Connected to database: {} (pool size: {})",
            url,
            pool_size
        );

        Ok(Self { pool })
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apartment::ApartmentInput;
    use crate::customer::{CustomerFilter, CustomerUpdate, NewCustomer};
    use crate::invoice::InvoiceFilter;
    use crate::notification::NewNotification;
    use chrono::NaiveDate;

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    fn draft(room_code: &str, customer_name: &str, month: i64, year: i64) -> InvoiceDraft {
        InvoiceDraft {
            room_code: room_code.to_string(),
            apartment_code: Some("P1".to_string()),
            customer_name: customer_name.to_string(),
            gender: "Nam".to_string(),
            phone: "84901111111".to_string(),
            room_price: 3_000_000,
            actual_room_fee: 3_000_000,
            total_amount: 3_000_000,
            remaining_amount: 3_000_000,
            month,
            year,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_apartment_crud() {
        let db = test_db().await;
        let pool = db.pool();

        let created = apartment::create_apartment(
            pool,
            &ApartmentInput {
                code: "P1".to_string(),
                name: "Phu Nhuan 1".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(created.code, "P1");
        assert_eq!(created.description, "");

        let dup = apartment::create_apartment(pool, &ApartmentInput::with_code("P1")).await;
        assert!(matches!(dup, Err(DatabaseError::AlreadyExists { .. })));

        let same = apartment::find_or_create_apartment(pool, "P1").await.unwrap();
        assert_eq!(same.id, created.id);
        assert_eq!(apartment::count_apartments(pool).await.unwrap(), 1);

        let renamed = apartment::update_apartment(
            pool,
            created.id,
            &ApartmentInput {
                code: "P1".to_string(),
                address: "12 Le Loi".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(renamed.address, "12 Le Loi");

        apartment::delete_apartment(pool, created.id).await.unwrap();
        assert!(apartment::get_apartment(pool, created.id)
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn test_delete_apartment_with_rooms_conflicts() {
        let db = test_db().await;
        let pool = db.pool();

        let building = apartment::find_or_create_apartment(pool, "P1").await.unwrap();
        room::create_room(pool, "101", building.id).await.unwrap();

        let err = apartment::delete_apartment(pool, building.id).await.unwrap_err();
        assert!(err.is_conflict());
        assert!(matches!(err, DatabaseError::InUse { count: 1, .. }));
    }

    #[tokio::test]
    async fn test_room_code_unique_per_apartment() {
        let db = test_db().await;
        let pool = db.pool();

        let p1 = apartment::find_or_create_apartment(pool, "P1").await.unwrap();
        let p2 = apartment::find_or_create_apartment(pool, "P2").await.unwrap();

        room::create_room(pool, "101", p1.id).await.unwrap();
        room::create_room(pool, "101", p2.id).await.unwrap();

        let dup = room::create_room(pool, "101", p1.id).await;
        assert!(matches!(dup, Err(DatabaseError::AlreadyExists { .. })));

        let missing = room::create_room(pool, "102", 999).await;
        assert!(matches!(missing, Err(DatabaseError::NotFound { .. })));

        assert_eq!(room::list_rooms(pool, Some(p1.id)).await.unwrap().len(), 1);
        assert_eq!(room::count_rooms(pool).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_delete_room_with_customers_conflicts() {
        let db = test_db().await;
        let pool = db.pool();

        let building = apartment::find_or_create_apartment(pool, "P1").await.unwrap();
        let unit = room::create_room(pool, "101", building.id).await.unwrap();
        customer::create_customer(
            pool,
            &NewCustomer {
                name: "Lan".to_string(),
                room_id: Some(unit.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let err = room::delete_room(pool, unit.id).await.unwrap_err();
        assert!(matches!(err, DatabaseError::InUse { dependent: "customer", .. }));
    }

    #[tokio::test]
    async fn test_customer_placement_rules() {
        let db = test_db().await;
        let pool = db.pool();

        let p1 = apartment::find_or_create_apartment(pool, "P1").await.unwrap();
        let p2 = apartment::find_or_create_apartment(pool, "P2").await.unwrap();
        let r1 = room::create_room(pool, "101", p1.id).await.unwrap();
        let r2 = room::create_room(pool, "201", p2.id).await.unwrap();

        // Apartment is derived from the room
        let lan = customer::create_customer(
            pool,
            &NewCustomer {
                uuid: Some("zalo-1".to_string()),
                name: "Lan".to_string(),
                phone: Some("0901111111".to_string()),
                dob: NaiveDate::from_ymd_opt(1990, 1, 1),
                room_id: Some(r1.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(lan.apartment_id, Some(p1.id));

        // Mismatched room and apartment
        let mismatch = customer::create_customer(
            pool,
            &NewCustomer {
                name: "Minh".to_string(),
                room_id: Some(r1.id),
                apartment_id: Some(p2.id),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(
            mismatch,
            Err(DatabaseError::Validation(ValidationError::RoomApartmentMismatch { .. }))
        ));

        // Duplicate uuid
        let dup = customer::create_customer(
            pool,
            &NewCustomer {
                uuid: Some("zalo-1".to_string()),
                name: "Other".to_string(),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(dup, Err(DatabaseError::AlreadyExists { .. })));

        // Standalone customer, assigned later
        let minh = customer::create_customer(
            pool,
            &NewCustomer {
                name: "Minh".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(minh.room_id, None);

        let moved = customer::assign_room(pool, minh.id, r2.id).await.unwrap();
        assert_eq!(moved.room_id, Some(r2.id));
        assert_eq!(moved.apartment_id, Some(p2.id));

        let updated = customer::update_customer(
            pool,
            lan.id,
            &CustomerUpdate {
                phone: Some("0909999999".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.name, "Lan");
        assert_eq!(updated.phone.as_deref(), Some("84909999999"));

        let found = customer::find_customer_by_phone(pool, "0909999999")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, lan.id);

        let in_p2 = customer::list_customers(
            pool,
            &CustomerFilter {
                apartment_id: Some(p2.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(in_p2.len(), 1);

        let search = customer::list_customers(
            pool,
            &CustomerFilter {
                search: Some("lan".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(search.len(), 1);
    }

    #[tokio::test]
    async fn test_invoice_natural_key_and_overwrite() {
        let db = test_db().await;
        let pool = db.pool();

        let created = invoice::insert_invoice(pool, &draft("101", "Lan", 6, 2024))
            .await
            .unwrap();
        assert_eq!(created.invoice_status, InvoiceStatus::Pending);
        assert!(created.history.is_empty());
        assert_eq!(created.invoice_message, None);

        let key = InvoiceKey {
            room_code: "101".to_string(),
            customer_name: "Lan".to_string(),
            month: 6,
            year: 2024,
        };
        let found = invoice::find_invoice_by_key(pool, &key).await.unwrap().unwrap();
        assert_eq!(found.id, created.id);

        let other_period = InvoiceKey { month: 7, ..key.clone() };
        assert!(invoice::find_invoice_by_key(pool, &other_period)
            .await
            .unwrap()
            .is_none());

        invoice::record_dispatch(pool, created.id, InvoiceStatus::Sent, "ok")
            .await
            .unwrap();

        let mut changed = draft("101", "Lan", 6, 2024);
        changed.water_fee = 100_000;
        let overwritten = invoice::overwrite_invoice(pool, created.id, &changed)
            .await
            .unwrap();
        assert_eq!(overwritten.water_fee, 100_000);
        assert_eq!(overwritten.invoice_status, InvoiceStatus::Sent);
        assert_eq!(overwritten.history.len(), 1);
    }

    #[tokio::test]
    async fn test_record_dispatch_appends_history() {
        let db = test_db().await;
        let pool = db.pool();

        let created = invoice::insert_invoice(pool, &draft("101", "Lan", 6, 2024))
            .await
            .unwrap();

        invoice::record_dispatch(pool, created.id, InvoiceStatus::Failed, "timeout")
            .await
            .unwrap();
        let sent = invoice::record_dispatch(pool, created.id, InvoiceStatus::Sent, "delivered")
            .await
            .unwrap();

        assert_eq!(sent.invoice_status, InvoiceStatus::Sent);
        assert_eq!(sent.invoice_message.as_deref(), Some("delivered"));
        assert_eq!(sent.history.len(), 2);
        assert_eq!(sent.history[0].status, InvoiceStatus::Failed);
        assert_eq!(sent.history[0].message, "timeout");
        assert_eq!(sent.latest_history().unwrap().message, "delivered");

        let missing = invoice::record_dispatch(pool, 999, InvoiceStatus::Sent, "x").await;
        assert!(matches!(missing, Err(DatabaseError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_update_customer_keeps_room_and_apartment_together() {
        let db = test_db().await;
        let pool = db.pool();

        let p1 = apartment::find_or_create_apartment(pool, "P1").await.unwrap();
        let p2 = apartment::find_or_create_apartment(pool, "P2").await.unwrap();
        let r1 = room::create_room(pool, "101", p1.id).await.unwrap();
        let r2 = room::create_room(pool, "201", p2.id).await.unwrap();

        let lan = customer::create_customer(
            pool,
            &NewCustomer {
                name: "Lan".to_string(),
                room_id: Some(r1.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let mismatch = customer::update_customer(
            pool,
            lan.id,
            &CustomerUpdate {
                room_id: Some(r1.id),
                apartment_id: Some(p2.id),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(
            mismatch,
            Err(DatabaseError::Validation(ValidationError::RoomApartmentMismatch { .. }))
        ));

        // Apartment alone cannot pull the customer away from their room
        let stray = customer::update_customer(
            pool,
            lan.id,
            &CustomerUpdate {
                apartment_id: Some(p2.id),
                ..Default::default()
            },
        )
        .await;
        assert!(stray.is_err());

        let unchanged = customer::get_customer(pool, lan.id).await.unwrap();
        assert_eq!(unchanged.room_id, Some(r1.id));
        assert_eq!(unchanged.apartment_id, Some(p1.id));

        // Room alone re-derives the apartment
        let moved = customer::update_customer(
            pool,
            lan.id,
            &CustomerUpdate {
                room_id: Some(r2.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(moved.room_id, Some(r2.id));
        assert_eq!(moved.apartment_id, Some(p2.id));
    }

    #[tokio::test]
    async fn test_moving_room_moves_its_tenants() {
        let db = test_db().await;
        let pool = db.pool();

        let p1 = apartment::find_or_create_apartment(pool, "P1").await.unwrap();
        let p2 = apartment::find_or_create_apartment(pool, "P2").await.unwrap();
        let r1 = room::create_room(pool, "101", p1.id).await.unwrap();
        let other = room::create_room(pool, "102", p1.id).await.unwrap();

        let tenant = customer::create_customer(
            pool,
            &NewCustomer {
                name: "Lan".to_string(),
                room_id: Some(r1.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let neighbour = customer::create_customer(
            pool,
            &NewCustomer {
                name: "Minh".to_string(),
                room_id: Some(other.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let moved = room::update_room(pool, r1.id, "101", Some(p2.id)).await.unwrap();
        assert_eq!(moved.apartment_id, p2.id);

        let tenant = customer::get_customer(pool, tenant.id).await.unwrap();
        assert_eq!(tenant.room_id, Some(r1.id));
        assert_eq!(tenant.apartment_id, Some(p2.id));

        let neighbour = customer::get_customer(pool, neighbour.id).await.unwrap();
        assert_eq!(neighbour.apartment_id, Some(p1.id));

        // Renaming in place leaves tenants alone
        room::update_room(pool, r1.id, "101A", None).await.unwrap();
        let tenant = customer::get_customer(pool, tenant.id).await.unwrap();
        assert_eq!(tenant.apartment_id, Some(p2.id));
    }

    #[tokio::test]
    async fn test_customer_phone_stored_in_international_form() {
        let db = test_db().await;
        let pool = db.pool();

        let lan = customer::create_customer(
            pool,
            &NewCustomer {
                name: "Lan".to_string(),
                phone: Some(" 0901111111 ".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(lan.phone.as_deref(), Some("84901111111"));

        let found = customer::find_customer_by_phone(pool, "84901111111")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, lan.id);

        let blank = customer::create_customer(
            pool,
            &NewCustomer {
                name: "Minh".to_string(),
                phone: Some("  ".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(blank.phone, None);
    }

    #[tokio::test]
    async fn test_search_treats_wildcards_literally() {
        let db = test_db().await;
        let pool = db.pool();

        invoice::insert_invoice(pool, &draft("101", "Lan", 6, 2024)).await.unwrap();
        invoice::insert_invoice(pool, &draft("1_2", "Minh", 6, 2024)).await.unwrap();

        let underscore = InvoiceFilter {
            search: Some("1_".to_string()),
            ..Default::default()
        };
        let rows = invoice::list_invoices(pool, &underscore).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].room_code, "1_2");

        let percent = InvoiceFilter {
            search: Some("%".to_string()),
            ..Default::default()
        };
        assert_eq!(invoice::count_matching_invoices(pool, &percent).await.unwrap(), 0);

        customer::create_customer(
            pool,
            &NewCustomer {
                name: "Lan".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let customers = customer::list_customers(
            pool,
            &CustomerFilter {
                search: Some("L_n".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(customers.is_empty());
    }

    #[tokio::test]
    async fn test_list_invoices_filters() {
        let db = test_db().await;
        let pool = db.pool();

        invoice::insert_invoice(pool, &draft("101", "Lan", 5, 2024)).await.unwrap();
        invoice::insert_invoice(pool, &draft("102", "Minh", 6, 2024)).await.unwrap();
        invoice::insert_invoice(pool, &draft("101", "Lan", 12, 2023)).await.unwrap();

        let june = InvoiceFilter {
            month: Some(6),
            year: Some(2024),
            ..Default::default()
        };
        assert_eq!(invoice::list_invoices(pool, &june).await.unwrap().len(), 1);

        let older = InvoiceFilter {
            before: Some((5, 2024)),
            ..Default::default()
        };
        let rows = invoice::list_invoices(pool, &older).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].year, 2023);

        let search = InvoiceFilter {
            search: Some("min".to_string()),
            ..Default::default()
        };
        assert_eq!(invoice::count_matching_invoices(pool, &search).await.unwrap(), 1);

        let by_ids = invoice::get_invoices_by_ids(pool, &[3, 999, 1]).await.unwrap();
        assert_eq!(by_ids.iter().map(|i| i.id).collect::<Vec<_>>(), vec![3, 1]);
    }

    #[tokio::test]
    async fn test_notification_roundtrip() {
        let db = test_db().await;
        let pool = db.pool();

        let stored = notification::create_notification(
            pool,
            &NewNotification {
                title: "Water outage".to_string(),
                content: "No water on Sunday".to_string(),
                apartment_ids: vec![1],
                room_ids: vec![],
                logs: vec![DeliveryLog {
                    customer_name: "Lan".to_string(),
                    customer_phone: "84901111111".to_string(),
                    message: "Sent to Lan 84901111111".to_string(),
                    result: "Success".to_string(),
                }],
            },
        )
        .await
        .unwrap();

        assert_eq!(stored.apartment_ids, vec![1]);
        assert_eq!(stored.logs.len(), 1);

        let blank = notification::create_notification(
            pool,
            &NewNotification {
                title: " ".to_string(),
                content: "x".to_string(),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(blank, Err(DatabaseError::Validation(_))));

        assert_eq!(notification::list_notifications(pool).await.unwrap().len(), 1);
    }
}
