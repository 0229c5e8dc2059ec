//! Shared fixtures for the monitor tests: a scripted inventory fake, a
//! recording notifier and tempfile-backed database helpers.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rental_db::{DatabaseError, DbOrder, DbUser, MonitoredUser, OrderStatus, RentalDatabase};
use rental_monitor::notifier::{Notifier, NotifyAction, NotifyError};
use rental_monitor::store::{RentalStore, StoreResult};
use smspool_client::{
    AccountInfo, InventoryApi, InventoryError, Rental, Result as InvResult, SmsStatus, StockStatus,
};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CheckStock(String),
    CheckSms(String),
    CancelOrder(String),
    GetBalance(String),
}

/// Scripted inventory fake. Stock answers are consumed per call and keyed
/// by api key; SMS and cancel outcomes are keyed by order id.
#[derive(Default)]
pub struct FakeInventory {
    stock: Mutex<HashMap<String, VecDeque<Result<StockStatus, String>>>>,
    sms: Mutex<HashMap<String, Result<SmsStatus, String>>>,
    cancel: Mutex<HashMap<String, Result<bool, String>>>,
    balance: Mutex<f64>,
    balance_fails: Mutex<bool>,
    calls: Mutex<Vec<Call>>,
}

impl FakeInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script_stock(&self, api_key: &str, results: Vec<Result<StockStatus, String>>) {
        self.stock
            .lock()
            .unwrap()
            .insert(api_key.to_string(), results.into_iter().collect());
    }

    pub fn set_sms(&self, order_id: &str, status: SmsStatus) {
        self.sms
            .lock()
            .unwrap()
            .insert(order_id.to_string(), Ok(status));
    }

    pub fn fail_sms(&self, order_id: &str) {
        self.sms
            .lock()
            .unwrap()
            .insert(order_id.to_string(), Err("injected sms failure".to_string()));
    }

    pub fn set_cancel(&self, order_id: &str, accepted: bool) {
        self.cancel
            .lock()
            .unwrap()
            .insert(order_id.to_string(), Ok(accepted));
    }

    pub fn fail_cancel(&self, order_id: &str) {
        self.cancel.lock().unwrap().insert(
            order_id.to_string(),
            Err("injected cancel failure".to_string()),
        );
    }

    pub fn set_balance(&self, amount: f64) {
        *self.balance.lock().unwrap() = amount;
    }

    pub fn fail_balance(&self) {
        *self.balance_fails.lock().unwrap() = true;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: &Call) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

pub fn stock(count: u32, price: f64) -> Result<StockStatus, String> {
    Ok(StockStatus {
        available: count > 0,
        count,
        price,
    })
}

pub fn no_stock() -> Result<StockStatus, String> {
    Ok(StockStatus::unavailable())
}

pub fn stock_error() -> Result<StockStatus, String> {
    Err("injected stock failure".to_string())
}

pub fn received(code: &str) -> SmsStatus {
    SmsStatus {
        received: true,
        content: Some(code.to_string()),
    }
}

#[async_trait]
impl InventoryApi for FakeInventory {
    async fn verify_key(&self, _api_key: &str) -> InvResult<AccountInfo> {
        Ok(AccountInfo {
            valid: true,
            balance: *self.balance.lock().unwrap(),
        })
    }

    async fn check_stock(&self, api_key: &str) -> InvResult<StockStatus> {
        self.record(Call::CheckStock(api_key.to_string()));
        let next = self
            .stock
            .lock()
            .unwrap()
            .get_mut(api_key)
            .and_then(|queue| queue.pop_front());
        match next {
            Some(Ok(status)) => Ok(status),
            Some(Err(message)) => Err(InventoryError::ApiError(message)),
            None => Ok(StockStatus::unavailable()),
        }
    }

    async fn get_price(&self, _api_key: &str) -> InvResult<f64> {
        Ok(4.8)
    }

    async fn rent_number(&self, _api_key: &str) -> InvResult<Rental> {
        Err(InventoryError::ApiError("rent_number not scripted".to_string()))
    }

    async fn check_sms(&self, _api_key: &str, order_id: &str) -> InvResult<SmsStatus> {
        self.record(Call::CheckSms(order_id.to_string()));
        match self.sms.lock().unwrap().get(order_id) {
            Some(Ok(status)) => Ok(status.clone()),
            Some(Err(message)) => Err(InventoryError::ApiError(message.clone())),
            None => Ok(SmsStatus::pending()),
        }
    }

    async fn cancel_order(&self, _api_key: &str, order_id: &str) -> InvResult<bool> {
        self.record(Call::CancelOrder(order_id.to_string()));
        match self.cancel.lock().unwrap().get(order_id) {
            Some(Ok(accepted)) => Ok(*accepted),
            Some(Err(message)) => Err(InventoryError::ApiError(message.clone())),
            None => Ok(false),
        }
    }

    async fn get_balance(&self, api_key: &str) -> InvResult<f64> {
        self.record(Call::GetBalance(api_key.to_string()));
        if *self.balance_fails.lock().unwrap() {
            return Err(InventoryError::ApiError("injected balance failure".to_string()));
        }
        Ok(*self.balance.lock().unwrap())
    }
}

/// Notifier that records every delivery; can be switched to fail.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(i64, String)>>,
    unreachable: Mutex<bool>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn make_unreachable(&self) {
        *self.unreachable.lock().unwrap() = true;
    }

    pub fn sent(&self) -> Vec<(i64, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, user_id: i64) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|(id, _)| *id == user_id)
            .map(|(_, text)| text)
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(
        &self,
        user_id: i64,
        text: &str,
        _actions: Option<Vec<NotifyAction>>,
    ) -> Result<(), NotifyError> {
        if *self.unreachable.lock().unwrap() {
            return Err(NotifyError::Unreachable);
        }
        self.sent.lock().unwrap().push((user_id, text.to_string()));
        Ok(())
    }
}

/// Store wrapper that fails every status write; everything else delegates.
pub struct FailingStatusStore {
    pub inner: Arc<RentalDatabase>,
}

fn injected_write_failure() -> DatabaseError {
    DatabaseError::ConnectionError(sqlx_protocol_error())
}

fn sqlx_protocol_error() -> sqlx::Error {
    sqlx::Error::Protocol("injected write failure".to_string())
}

#[async_trait]
impl RentalStore for FailingStatusStore {
    async fn get_user(&self, user_id: i64) -> StoreResult<Option<DbUser>> {
        self.inner.get_user(user_id).await
    }

    async fn list_monitored_users(&self) -> StoreResult<Vec<MonitoredUser>> {
        self.inner.list_monitored_users().await
    }

    async fn update_balance(&self, user_id: i64, balance: f64) -> StoreResult<()> {
        self.inner.update_balance(user_id, balance).await
    }

    async fn update_monitoring_cursor(
        &self,
        user_id: i64,
        last_check: DateTime<Utc>,
        notification_sent: bool,
    ) -> StoreResult<()> {
        self.inner
            .update_monitoring_cursor(user_id, last_check, notification_sent)
            .await
    }

    async fn list_active_orders(&self) -> StoreResult<Vec<DbOrder>> {
        self.inner.list_active_orders().await
    }

    async fn list_active_orders_for_user(&self, user_id: i64) -> StoreResult<Vec<DbOrder>> {
        self.inner.list_active_orders_for_user(user_id).await
    }

    async fn update_order_status(&self, _order_id: &str, _status: OrderStatus) -> StoreResult<bool> {
        Err(injected_write_failure())
    }

    async fn update_order_sms(&self, _order_id: &str, _content: &str) -> StoreResult<bool> {
        Err(injected_write_failure())
    }
}

pub async fn open_store() -> (TempDir, Arc<RentalDatabase>) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rental.db");
    let db = RentalDatabase::new(path.to_str().unwrap()).await.unwrap();
    (dir, Arc::new(db))
}

pub fn order_expiring_in(order_id: &str, user_id: i64, secs_from_now: i64) -> DbOrder {
    let now = Utc::now();
    DbOrder {
        order_id: order_id.to_string(),
        user_id,
        phone_number: "+818012345678".to_string(),
        country_code: "jp".to_string(),
        service_id: "1552".to_string(),
        service_name: "Pokemon Center".to_string(),
        status: OrderStatus::Active,
        price: 4.8,
        sms_content: None,
        created_at: now,
        expires_at: now + ChronoDuration::seconds(secs_from_now),
        completed_at: None,
    }
}
