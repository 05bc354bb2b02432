//! Notification broadcasts for the property back end.
//!
//! A notification targets whole apartments and single rooms. Sending one
//! dispatches a templated message to every tenant of those targets and keeps
//! a log line per tenant; the notification is stored once, after the fan-out.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use broadcaster::{Broadcaster, NotificationRequest};
//! use database::Database;
//! use zns_client::{ZnsClient, ZnsConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::connect("sqlite:property.db?mode=rwc").await?;
//! let zns = ZnsClient::new(ZnsConfig::new("access-token"))?;
//! let broadcaster = Broadcaster::new(db, Arc::new(zns), "431200");
//!
//! let request = NotificationRequest::new("Cắt nước", "Thứ Bảy 8h-12h")
//!     .with_apartments([1]);
//! let sent = broadcaster.send_notification(&request).await?;
//! println!("{} deliveries", sent.logs.len());
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use database::notification::{self, NewNotification, MAX_CONTENT_LENGTH};
use database::validation::{validate_required, MAX_NAME_LENGTH};
use database::{apartment, customer, room, Customer, Database, DatabaseError, DeliveryLog, Notification};
use indexmap::IndexMap;
use invoicing::parser::normalize_phone;
use invoicing::{DispatchOutcome, DispatchRequest, MessageDispatcher};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

const FALLBACK_NAME: &str = "Quý khách";
const FALLBACK_CODE: &str = "Chưa cập nhật";

/// Errors that can occur during broadcast operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Store failure, including unknown apartment or room targets.
    #[error(transparent)]
    Database(#[from] DatabaseError),

    /// Request rejected before anything was sent.
    #[error("validation error: {0}")]
    Validation(String),
}

impl From<database::ValidationError> for Error {
    fn from(err: database::ValidationError) -> Self {
        Error::Validation(err.to_string())
    }
}

/// Result type for broadcast operations.
pub type Result<T> = std::result::Result<T, Error>;

/// What to broadcast and to whom.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub apartment_ids: Vec<i64>,
    #[serde(default)]
    pub room_ids: Vec<i64>,
}

impl NotificationRequest {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_apartments(mut self, ids: impl IntoIterator<Item = i64>) -> Self {
        self.apartment_ids.extend(ids);
        self
    }

    pub fn with_rooms(mut self, ids: impl IntoIterator<Item = i64>) -> Self {
        self.room_ids.extend(ids);
        self
    }

    fn validate(&self) -> Result<()> {
        validate_required("title", &self.title, MAX_NAME_LENGTH)?;
        validate_required("content", &self.content, MAX_CONTENT_LENGTH)?;
        Ok(())
    }
}

/// A tenant to notify, with the codes shown in the message.
struct Recipient {
    customer: Customer,
    apartment_code: Option<String>,
    room_code: Option<String>,
}

/// Sends notifications through a [`MessageDispatcher`] and records them.
#[derive(Clone)]
pub struct Broadcaster {
    db: Database,
    dispatcher: Arc<dyn MessageDispatcher>,
    template_id: String,
}

impl Broadcaster {
    pub fn new(
        db: Database,
        dispatcher: Arc<dyn MessageDispatcher>,
        template_id: impl Into<String>,
    ) -> Self {
        Self {
            db,
            dispatcher,
            template_id: template_id.into(),
        }
    }

    /// Store a notification without sending anything.
    pub async fn record_notification(&self, request: &NotificationRequest) -> Result<Notification> {
        request.validate()?;

        let stored = notification::create_notification(
            self.db.pool(),
            &NewNotification {
                title: request.title.clone(),
                content: request.content.clone(),
                apartment_ids: request.apartment_ids.clone(),
                room_ids: request.room_ids.clone(),
                logs: Vec::new(),
            },
        )
        .await?;

        Ok(stored)
    }

    /// Send to every tenant of the targets, then store the notification with its log.
    ///
    /// Unknown targets fail the call before anything is sent. A tenant listed
    /// under both an apartment and a room is messaged once. A failed delivery
    /// is logged and the fan-out goes on.
    pub async fn send_notification(&self, request: &NotificationRequest) -> Result<Notification> {
        request.validate()?;

        let recipients = self.resolve_recipients(request).await?;
        info!(
            title = %request.title,
            recipients = recipients.len(),
            "Broadcasting notification"
        );

        let mut logs = Vec::with_capacity(recipients.len());
        for recipient in recipients.values() {
            logs.push(self.deliver(request, recipient).await);
        }

        let stored = notification::create_notification(
            self.db.pool(),
            &NewNotification {
                title: request.title.clone(),
                content: request.content.clone(),
                apartment_ids: request.apartment_ids.clone(),
                room_ids: request.room_ids.clone(),
                logs,
            },
        )
        .await?;

        Ok(stored)
    }

    /// Tenants of every listed apartment, then of every listed room, by customer ID.
    async fn resolve_recipients(&self, request: &NotificationRequest) -> Result<IndexMap<i64, Recipient>> {
        let pool = self.db.pool();
        let mut apartment_codes: HashMap<i64, String> = HashMap::new();
        let mut room_codes: HashMap<i64, String> = HashMap::new();
        let mut tenants: Vec<Customer> = Vec::new();

        for &apartment_id in &request.apartment_ids {
            let building = apartment::get_apartment(pool, apartment_id).await?;
            apartment_codes.insert(building.id, building.code);
            tenants.extend(customer::list_customers_in_apartment(pool, apartment_id).await?);
        }

        for &room_id in &request.room_ids {
            let unit = room::get_room(pool, room_id).await?;
            room_codes.insert(unit.id, unit.code);
            tenants.extend(customer::list_customers_in_room(pool, room_id).await?);
        }

        let mut recipients = IndexMap::new();
        for tenant in tenants {
            if recipients.contains_key(&tenant.id) {
                continue;
            }

            let apartment_code = match tenant.apartment_id {
                Some(id) => match apartment_codes.get(&id) {
                    Some(code) => Some(code.clone()),
                    None => {
                        let code = apartment::get_apartment(pool, id).await?.code;
                        apartment_codes.insert(id, code.clone());
                        Some(code)
                    }
                },
                None => None,
            };
            let room_code = match tenant.room_id {
                Some(id) => match room_codes.get(&id) {
                    Some(code) => Some(code.clone()),
                    None => {
                        let code = room::get_room(pool, id).await?.code;
                        room_codes.insert(id, code.clone());
                        Some(code)
                    }
                },
                None => None,
            };

            recipients.insert(
                tenant.id,
                Recipient {
                    customer: tenant,
                    apartment_code,
                    room_code,
                },
            );
        }

        Ok(recipients)
    }

    async fn deliver(&self, request: &NotificationRequest, recipient: &Recipient) -> DeliveryLog {
        let name = match recipient.customer.name.trim() {
            "" => FALLBACK_NAME,
            name => name,
        };

        let phone = match recipient.customer.phone.as_deref().map(str::trim) {
            Some(phone) if !phone.is_empty() => normalize_phone(phone),
            _ => {
                warn!(customer_id = recipient.customer.id, "Customer has no phone, not notified");
                return DeliveryLog {
                    customer_name: name.to_string(),
                    customer_phone: String::new(),
                    message: format!("Không gửi được thông báo đến {}: thiếu số điện thoại", name),
                    result: "missing phone".to_string(),
                };
            }
        };

        let dispatch = DispatchRequest {
            phone: phone.clone(),
            template_id: self.template_id.clone(),
            fields: notification_fields(request, name, recipient),
            tracking_id: Some(format!("notification_{}", Uuid::new_v4())),
        };

        let outcome = match self.dispatcher.send(&dispatch).await {
            Ok(outcome) => outcome,
            Err(e) => DispatchOutcome::failed(e.to_string()),
        };

        let message = if outcome.success {
            format!("Gửi thông báo thành công đến {} {}", name, phone)
        } else {
            warn!(customer_id = recipient.customer.id, phone = %phone, reason = %outcome.message, "Notification delivery failed");
            format!("Gửi thông báo thất bại đến {} {}", name, phone)
        };

        DeliveryLog {
            customer_name: name.to_string(),
            customer_phone: phone,
            message,
            result: outcome.message,
        }
    }
}

fn notification_fields(request: &NotificationRequest, name: &str, recipient: &Recipient) -> Map<String, Value> {
    let fields = json!({
        "notification_title": request.title,
        "notification_body": request.content,
        "customer_name": name,
        "apartment_code": recipient.apartment_code.as_deref().unwrap_or(FALLBACK_CODE),
        "room_code": recipient.room_code.as_deref().unwrap_or(FALLBACK_CODE),
    });

    match fields {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

impl std::fmt::Debug for Broadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broadcaster")
            .field("template_id", &self.template_id)
            .finish()
    }
}
