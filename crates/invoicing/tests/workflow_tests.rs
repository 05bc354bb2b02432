//! Send workflow, manual creation and reporting against an in-memory store.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use database::{invoice, Database, Electricity, InvoiceDraft, InvoiceStatus};
use invoicing::{
    create_manual_invoice, get_invoice_report, DispatchError, DispatchOutcome, DispatchRequest,
    InvoiceSender, InvoicingError, ManualInvoice, MemoryTrackingCache, MessageDispatcher,
    DEFAULT_INVOICE_TEMPLATE_ID, ELECTRICITY_UNIT_RATE,
};

/// Replays scripted outcomes and records every request.
#[derive(Default)]
struct ScriptedDispatcher {
    outcomes: Mutex<VecDeque<Result<DispatchOutcome, DispatchError>>>,
    requests: Mutex<Vec<DispatchRequest>>,
}

impl ScriptedDispatcher {
    fn new(outcomes: Vec<Result<DispatchOutcome, DispatchError>>) -> Arc<Self> {
        Arc::new(Self {
            outcomes: Mutex::new(outcomes.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<DispatchRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageDispatcher for ScriptedDispatcher {
    async fn send(&self, request: &DispatchRequest) -> Result<DispatchOutcome, DispatchError> {
        self.requests.lock().unwrap().push(request.clone());
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(DispatchOutcome::sent("Success")))
    }
}

async fn test_db() -> Database {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    db.migrate().await.unwrap();
    db
}

fn sample_invoice(customer_name: &str) -> ManualInvoice {
    let mut input = ManualInvoice::new("101", customer_name, "0901111111", 6, 2024);
    input.apartment_code = Some("P1".to_string());
    input.room_price = 3_000_000;
    input.old_index = 1200;
    input.new_index = 1250;
    input.water_fee = 100_000;
    input.management_fee = 150_000;
    input
}

fn sender(
    db: &Database,
    dispatcher: Arc<ScriptedDispatcher>,
    cache: Arc<MemoryTrackingCache>,
) -> InvoiceSender {
    InvoiceSender::new(db.clone(), dispatcher, cache)
}

#[tokio::test]
async fn test_create_manual_invoice() {
    let db = test_db().await;

    let created = create_manual_invoice(&db, &sample_invoice("Nguyen Van A")).await.unwrap();

    assert_eq!(created.invoice_status, InvoiceStatus::Pending);
    assert_eq!(created.invoice_message, None);
    assert!(created.history.is_empty());
    assert_eq!(created.gender, "Nam");
    assert_eq!(created.stay_days, 30);
    assert_eq!(created.electricity.used_kwh, 50);
    assert_eq!(created.electricity.price, 50 * ELECTRICITY_UNIT_RATE);
    assert_eq!(created.actual_room_fee, 3_000_000);
    assert_eq!(created.total_amount, 3_450_000);
    assert_eq!(created.amount_paid, 0);
    assert_eq!(created.remaining_amount, 3_450_000);
}

#[tokio::test]
async fn test_manual_invoice_validation() {
    let db = test_db().await;

    let mut no_phone = sample_invoice("Nguyen Van A");
    no_phone.phone = "  ".to_string();
    assert!(matches!(
        create_manual_invoice(&db, &no_phone).await,
        Err(InvoicingError::Validation(_))
    ));

    let mut bad_month = sample_invoice("Nguyen Van A");
    bad_month.month = 13;
    assert!(matches!(
        create_manual_invoice(&db, &bad_month).await,
        Err(InvoicingError::Validation(_))
    ));

    let mut runaway_meter = sample_invoice("Nguyen Van A");
    runaway_meter.new_index = 3_000_000_000_000_000;
    assert!(matches!(
        create_manual_invoice(&db, &runaway_meter).await,
        Err(InvoicingError::Validation(_))
    ));

    assert_eq!(invoice::count_invoices(db.pool()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_electricity_line_quotes_manual_tariff_for_synced_price() {
    let db = test_db().await;
    // Synced invoices keep the sheet's price, which need not be used × 4000.
    let synced = invoice::insert_invoice(
        db.pool(),
        &InvoiceDraft {
            room_code: "101".to_string(),
            customer_name: "Nguyen Van A".to_string(),
            phone: "84901111111".to_string(),
            electricity: Electricity {
                old_index: 1200,
                new_index: 1250,
                used_kwh: 50,
                price: 175_000,
                staff: None,
            },
            total_amount: 175_000,
            remaining_amount: 175_000,
            month: 6,
            year: 2024,
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let fields = invoicing::workflow::invoice_fields(&synced);

    assert_eq!(fields["electricityCost"], "1250 - 1200 = 50 * 4000 = 175.000đ");
    assert_ne!(
        synced.electricity.used_kwh * ELECTRICITY_UNIT_RATE,
        synced.electricity.price
    );
}

#[tokio::test]
async fn test_failed_dispatch_marks_invoice_failed() {
    let db = test_db().await;
    let created = create_manual_invoice(&db, &sample_invoice("Nguyen Van A")).await.unwrap();
    let dispatcher = ScriptedDispatcher::new(vec![Ok(DispatchOutcome::failed("timeout"))]);

    let updated = sender(&db, dispatcher, Arc::new(MemoryTrackingCache::new()))
        .send_invoice(created.id)
        .await
        .unwrap();

    assert_eq!(updated.invoice_status.code(), 4);
    assert_eq!(updated.invoice_message.as_deref(), Some("timeout"));
    assert_eq!(updated.history.len(), 1);
    assert_eq!(updated.history[0].status, InvoiceStatus::Failed);
    assert_eq!(updated.history[0].message, "timeout");
}

#[tokio::test]
async fn test_successful_dispatch_sends_template_and_tracks_phone() {
    let db = test_db().await;
    let created = create_manual_invoice(&db, &sample_invoice("Nguyen Van A")).await.unwrap();
    let dispatcher = ScriptedDispatcher::new(vec![Ok(DispatchOutcome::sent("Success"))]);
    let cache = Arc::new(MemoryTrackingCache::new());

    let updated = sender(&db, dispatcher.clone(), cache.clone())
        .send_invoice(created.id)
        .await
        .unwrap();

    assert_eq!(updated.invoice_status, InvoiceStatus::Sent);
    assert_eq!(updated.invoice_message.as_deref(), Some("Success"));

    let tracking = format!("invoice_{}", created.id);
    assert_eq!(cache.get(&tracking).as_deref(), Some("84901111111"));

    let requests = dispatcher.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.phone, "84901111111");
    assert_eq!(request.template_id, DEFAULT_INVOICE_TEMPLATE_ID);
    assert_eq!(request.tracking_id.as_deref(), Some(tracking.as_str()));
    assert_eq!(request.fields["tenantName"], "Nguyen Van A");
    assert_eq!(request.fields["billingMonth"], "6/2024");
    assert_eq!(request.fields["bank_transfer_note"], "101 6 2024");
    assert_eq!(request.fields["transfer_amount"], 3_450_000);
    assert_eq!(request.fields["totalCost"], "3.450.000đ");
}

#[tokio::test]
async fn test_resend_appends_history() {
    let db = test_db().await;
    let created = create_manual_invoice(&db, &sample_invoice("Nguyen Van A")).await.unwrap();
    let dispatcher = ScriptedDispatcher::new(vec![
        Ok(DispatchOutcome::failed("timeout")),
        Ok(DispatchOutcome::sent("Success")),
        Ok(DispatchOutcome::sent("Success")),
    ]);
    let sender = sender(&db, dispatcher, Arc::new(MemoryTrackingCache::new()));

    sender.send_invoice(created.id).await.unwrap();
    sender.send_invoice(created.id).await.unwrap();
    let last = sender.send_invoice(created.id).await.unwrap();

    assert_eq!(last.invoice_status, InvoiceStatus::Sent);
    let statuses: Vec<InvoiceStatus> = last.history.iter().map(|h| h.status).collect();
    assert_eq!(
        statuses,
        vec![InvoiceStatus::Failed, InvoiceStatus::Sent, InvoiceStatus::Sent]
    );
}

#[tokio::test]
async fn test_transport_error_becomes_failed_outcome() {
    let db = test_db().await;
    let created = create_manual_invoice(&db, &sample_invoice("Nguyen Van A")).await.unwrap();
    let dispatcher = ScriptedDispatcher::new(vec![Err(DispatchError(
        "connection refused".to_string(),
    ))]);

    let updated = sender(&db, dispatcher, Arc::new(MemoryTrackingCache::new()))
        .send_invoice(created.id)
        .await
        .unwrap();

    assert_eq!(updated.invoice_status, InvoiceStatus::Failed);
    assert_eq!(updated.invoice_message.as_deref(), Some("connection refused"));
}

#[tokio::test]
async fn test_send_unknown_invoice_is_not_found() {
    let db = test_db().await;
    let dispatcher = ScriptedDispatcher::new(vec![]);

    let err = sender(&db, dispatcher.clone(), Arc::new(MemoryTrackingCache::new()))
        .send_invoice(404)
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert!(dispatcher.requests().is_empty());
}

#[tokio::test]
async fn test_bulk_send_isolates_failures() {
    let db = test_db().await;
    let first = create_manual_invoice(&db, &sample_invoice("Nguyen Van A")).await.unwrap();
    let second = create_manual_invoice(&db, &sample_invoice("Tran Thi B")).await.unwrap();
    let dispatcher = ScriptedDispatcher::new(vec![
        Ok(DispatchOutcome::sent("Success")),
        Ok(DispatchOutcome::failed("Invalid phone")),
    ]);

    let results = sender(&db, dispatcher, Arc::new(MemoryTrackingCache::new()))
        .send_invoices_bulk(&[first.id, 9999, second.id])
        .await
        .unwrap();

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].invoice_id, first.id);
    assert_eq!(results[0].status, Some(InvoiceStatus::Sent));
    assert_eq!(results[1].invoice_id, 9999);
    assert_eq!(results[1].status, None);
    assert_eq!(results[1].message, "not found");
    assert_eq!(results[2].status, Some(InvoiceStatus::Failed));
    assert_eq!(results[2].message, "Invalid phone");

    let stored = invoice::get_invoice(db.pool(), first.id).await.unwrap();
    assert_eq!(stored.invoice_status, InvoiceStatus::Sent);
}

#[tokio::test]
async fn test_bulk_send_rejects_empty_list() {
    let db = test_db().await;
    let dispatcher = ScriptedDispatcher::new(vec![]);

    let result = sender(&db, dispatcher, Arc::new(MemoryTrackingCache::new()))
        .send_invoices_bulk(&[])
        .await;

    assert!(matches!(result, Err(InvoicingError::Validation(_))));
}

#[tokio::test]
async fn test_report_reads_latest_history() {
    let db = test_db().await;
    let sent = create_manual_invoice(&db, &sample_invoice("Nguyen Van A")).await.unwrap();
    create_manual_invoice(&db, &sample_invoice("Tran Thi B")).await.unwrap();
    let mut other_period = sample_invoice("Le Van C");
    other_period.month = 7;
    create_manual_invoice(&db, &other_period).await.unwrap();

    let dispatcher = ScriptedDispatcher::new(vec![
        Ok(DispatchOutcome::failed("timeout")),
        Ok(DispatchOutcome::sent("Success")),
    ]);
    let sender = sender(&db, dispatcher, Arc::new(MemoryTrackingCache::new()));
    sender.send_invoice(sent.id).await.unwrap();
    sender.send_invoice(sent.id).await.unwrap();

    let report = get_invoice_report(&db, 6, 2024).await.unwrap();

    assert_eq!(report.len(), 2);
    let row = &report[0];
    assert_eq!(row.customer_name, "Nguyen Van A");
    assert_eq!(row.electricity_fee, 200_000);
    assert_eq!(row.invoice_status, InvoiceStatus::Sent);
    assert_eq!(row.latest_send_status, Some(InvoiceStatus::Sent));
    assert_eq!(row.latest_send_message.as_deref(), Some("Success"));
    assert!(row.latest_send_time.is_some());

    let untouched = &report[1];
    assert_eq!(untouched.latest_send_status, None);
    assert_eq!(untouched.latest_send_time, None);

    assert!(get_invoice_report(&db, 6, 2025).await.unwrap().is_empty());
    assert!(matches!(
        get_invoice_report(&db, 0, 2024).await,
        Err(InvoicingError::Validation(_))
    ));
}
