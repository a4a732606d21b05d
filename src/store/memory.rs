//! In-memory store for dev mode and tests
//!
//! Mirrors the MongoDB store's contract: ObjectId-shaped ids, unique email
//! and username, atomic balance increments, newest-first listings.

use bson::oid::ObjectId;
use chrono::{DateTime, Duration, DurationRound, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::cmp::Reverse;
use std::sync::Mutex;

use super::{CropStore, CropTotals, ReadingStore, UserStore};
use crate::types::{
    CropPage, CropQuery, CropRecord, CropchainError, NewCrop, NewReading, NewUser, Page,
    PageRequest, ReadingPage, Result, SensorReading, User,
};

#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<String, User>,
    /// email -> user id
    emails: DashMap<String, String>,
    /// username -> user id
    usernames: DashMap<String, String>,
    crops: DashMap<String, CropRecord>,
    readings: DashMap<String, SensorReading>,
    /// Last timestamp handed out
    clock: Mutex<Option<DateTime<Utc>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Millisecond-precision timestamps that strictly increase, so that
    /// newest-first listings have a total order like MongoDB's.
    fn next_timestamp(&self) -> DateTime<Utc> {
        let now = Utc::now();
        let now = now
            .duration_trunc(Duration::milliseconds(1))
            .unwrap_or(now);

        let mut last = self.clock.lock().unwrap_or_else(|e| e.into_inner());
        let stamp = match *last {
            Some(prev) if now <= prev => prev + Duration::milliseconds(1),
            _ => now,
        };
        *last = Some(stamp);
        stamp
    }
}

fn newest_first<T>(items: &mut [T], key: impl Fn(&T) -> (DateTime<Utc>, String)) {
    items.sort_by_key(|item| Reverse(key(item)));
}

fn slice_page<T: Clone>(items: Vec<T>, paging: PageRequest) -> Page<T> {
    let total = items.len() as u64;
    let page_items = items
        .into_iter()
        .skip(usize::try_from(paging.offset()).unwrap_or(usize::MAX))
        .take(usize::try_from(paging.page_size).unwrap_or(usize::MAX))
        .collect();
    Page::new(page_items, total, paging)
}

#[async_trait::async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, input: NewUser) -> Result<User> {
        let id = ObjectId::new().to_hex();

        match self.emails.entry(input.email.clone()) {
            Entry::Occupied(_) => {
                return Err(CropchainError::Conflict("User already exists".into()))
            }
            Entry::Vacant(slot) => {
                slot.insert(id.clone());
            }
        }

        match self.usernames.entry(input.username.clone()) {
            Entry::Occupied(_) => {
                self.emails.remove(&input.email);
                return Err(CropchainError::Conflict("User already exists".into()));
            }
            Entry::Vacant(slot) => {
                slot.insert(id.clone());
            }
        }

        let user = User {
            id: id.clone(),
            email: input.email,
            username: input.username,
            password_hash: input.password_hash,
            role: input.role,
            wallet_address: None,
            token_balance: 0,
            last_login: None,
            created_at: Some(self.next_timestamp()),
        };
        self.users.insert(id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: &str) -> Result<Option<User>> {
        Ok(self.users.get(id).map(|u| u.clone()))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let Some(id) = self.emails.get(email).map(|id| id.clone()) else {
            return Ok(None);
        };
        self.find_user(&id).await
    }

    async fn user_exists(&self, email: &str, username: &str) -> Result<bool> {
        Ok(self.emails.contains_key(email) || self.usernames.contains_key(username))
    }

    async fn set_wallet_address(&self, id: &str, address: &str) -> Result<bool> {
        Ok(match self.users.get_mut(id) {
            Some(mut user) => {
                user.wallet_address = Some(address.to_string());
                true
            }
            None => false,
        })
    }

    async fn record_login(&self, id: &str) -> Result<()> {
        if let Some(mut user) = self.users.get_mut(id) {
            user.last_login = Some(Utc::now());
        }
        Ok(())
    }

    async fn increment_balance(&self, id: &str, amount: u64) -> Result<Option<u64>> {
        // get_mut holds the shard write lock for the whole update
        let Some(mut user) = self.users.get_mut(id) else {
            return Ok(None);
        };
        // Same ceiling as an int64 `$inc` in MongoDB
        let balance = user
            .token_balance
            .checked_add(amount)
            .filter(|b| i64::try_from(*b).is_ok())
            .ok_or_else(|| {
                CropchainError::Internal(format!("Token balance overflow for user {id}"))
            })?;
        user.token_balance = balance;
        Ok(Some(balance))
    }

    async fn list_holders(&self, limit: u64) -> Result<Vec<User>> {
        let mut holders: Vec<User> = self
            .users
            .iter()
            .filter(|u| u.token_balance > 0)
            .map(|u| u.clone())
            .collect();
        holders.sort_by(|a, b| {
            b.token_balance
                .cmp(&a.token_balance)
                .then_with(|| a.username.cmp(&b.username))
        });
        holders.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(holders)
    }
}

#[async_trait::async_trait]
impl CropStore for MemoryStore {
    async fn insert_crop(&self, input: NewCrop) -> Result<CropRecord> {
        let record = CropRecord {
            id: ObjectId::new().to_hex(),
            name: input.name,
            weight: input.weight,
            location: input.location,
            farmer_id: input.farmer_id,
            registered_at: self.next_timestamp(),
            token_amount: input.token_amount,
        };
        self.crops.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn find_crop(&self, id: &str) -> Result<Option<CropRecord>> {
        Ok(self.crops.get(id).map(|c| c.clone()))
    }

    async fn list_crops(&self, farmer_id: &str, query: &CropQuery) -> Result<CropPage> {
        let mut crops: Vec<CropRecord> = self
            .crops
            .iter()
            .filter(|c| c.farmer_id == farmer_id && query.range.contains(c.registered_at))
            .map(|c| c.clone())
            .collect();
        newest_first(&mut crops, |c| (c.registered_at, c.id.clone()));
        Ok(slice_page(crops, query.paging))
    }

    async fn sum_tokens(&self, farmer_id: &str) -> Result<u64> {
        Ok(self
            .crops
            .iter()
            .filter(|c| c.farmer_id == farmer_id)
            .fold(0u64, |acc, c| acc.saturating_add(c.token_amount)))
    }

    async fn crop_totals(&self, farmer_id: &str) -> Result<CropTotals> {
        Ok(self
            .crops
            .iter()
            .filter(|c| c.farmer_id == farmer_id)
            .fold(CropTotals::default(), |mut totals, c| {
                totals.crop_count += 1;
                totals.total_weight += c.weight;
                totals.total_tokens = totals.total_tokens.saturating_add(c.token_amount);
                totals
            }))
    }
}

#[async_trait::async_trait]
impl ReadingStore for MemoryStore {
    async fn insert_reading(&self, input: NewReading) -> Result<SensorReading> {
        let reading = SensorReading {
            id: ObjectId::new().to_hex(),
            temperature: input.temperature,
            humidity: input.humidity,
            moisture: input.moisture,
            recorded_at: self.next_timestamp(),
        };
        self.readings.insert(reading.id.clone(), reading.clone());
        Ok(reading)
    }

    async fn list_readings(&self, paging: PageRequest) -> Result<ReadingPage> {
        let mut readings: Vec<SensorReading> = self.readings.iter().map(|r| r.clone()).collect();
        newest_first(&mut readings, |r| (r.recorded_at, r.id.clone()));
        Ok(slice_page(readings, paging))
    }

    async fn latest_reading(&self) -> Result<Option<SensorReading>> {
        Ok(self
            .readings
            .iter()
            .max_by_key(|r| (r.recorded_at, r.id.clone()))
            .map(|r| r.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use std::sync::Arc;

    fn new_user(email: &str, username: &str) -> NewUser {
        NewUser {
            email: email.into(),
            username: username.into(),
            password_hash: "hash".into(),
            role: Role::Farmer,
        }
    }

    fn new_crop(farmer_id: &str, tokens: u64) -> NewCrop {
        NewCrop {
            farmer_id: farmer_id.into(),
            name: "Maize".into(),
            weight: tokens as f64,
            location: "Nakuru".into(),
            token_amount: tokens,
        }
    }

    #[tokio::test]
    async fn test_balance_overflow_is_an_error() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("a@farm.io", "ana")).await.unwrap();

        let top = i64::MAX as u64;
        assert_eq!(store.increment_balance(&user.id, top - 1).await.unwrap(), Some(top - 1));
        assert_eq!(store.increment_balance(&user.id, 1).await.unwrap(), Some(top));

        let err = store.increment_balance(&user.id, 1).await.unwrap_err();
        assert!(matches!(err, CropchainError::Internal(_)));
        let err = store.increment_balance(&user.id, u64::MAX).await.unwrap_err();
        assert!(matches!(err, CropchainError::Internal(_)));

        // The failed increments left the balance untouched
        let stored = store.find_user(&user.id).await.unwrap().unwrap();
        assert_eq!(stored.token_balance, top);
    }

    #[tokio::test]
    async fn test_duplicate_email_or_username_conflicts() {
        let store = MemoryStore::new();
        store.create_user(new_user("a@farm.io", "ana")).await.unwrap();

        let dup_email = store.create_user(new_user("a@farm.io", "other")).await;
        assert!(matches!(dup_email, Err(CropchainError::Conflict(_))));

        let dup_name = store.create_user(new_user("b@farm.io", "ana")).await;
        assert!(matches!(dup_name, Err(CropchainError::Conflict(_))));

        // The failed username attempt must not leave its email reserved
        assert!(store.create_user(new_user("b@farm.io", "bea")).await.is_ok());
    }

    #[tokio::test]
    async fn test_timestamps_strictly_increase() {
        let store = MemoryStore::new();
        let mut last = None;
        for _ in 0..50 {
            let crop = store.insert_crop(new_crop("f", 1)).await.unwrap();
            if let Some(prev) = last {
                assert!(crop.registered_at > prev);
            }
            last = Some(crop.registered_at);
        }
    }

    #[tokio::test]
    async fn test_concurrent_increments_are_not_lost() {
        let store = Arc::new(MemoryStore::new());
        let user = store.create_user(new_user("a@farm.io", "ana")).await.unwrap();

        let mut handles = Vec::new();
        for i in 1..=64u64 {
            let store = Arc::clone(&store);
            let id = user.id.clone();
            handles.push(tokio::spawn(async move {
                store.increment_balance(&id, i).await.unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let user = store.find_user(&user.id).await.unwrap().unwrap();
        assert_eq!(user.token_balance, (1..=64u64).sum::<u64>());
    }

    #[tokio::test]
    async fn test_increment_unknown_user_is_none() {
        let store = MemoryStore::new();
        assert_eq!(store.increment_balance("missing", 5).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_holders_sorted_by_balance() {
        let store = MemoryStore::new();
        let a = store.create_user(new_user("a@farm.io", "ana")).await.unwrap();
        let b = store.create_user(new_user("b@farm.io", "bea")).await.unwrap();
        store.create_user(new_user("c@farm.io", "cai")).await.unwrap();
        store.increment_balance(&a.id, 10).await.unwrap();
        store.increment_balance(&b.id, 30).await.unwrap();

        let holders = store.list_holders(10).await.unwrap();
        let names: Vec<_> = holders.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["bea", "ana"]);

        assert_eq!(store.list_holders(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_latest_reading() {
        let store = MemoryStore::new();
        assert!(store.latest_reading().await.unwrap().is_none());

        for t in [18.0, 19.5, 21.0] {
            store
                .insert_reading(NewReading {
                    temperature: t,
                    humidity: 50.0,
                    moisture: 30.0,
                })
                .await
                .unwrap();
        }
        let latest = store.latest_reading().await.unwrap().unwrap();
        assert_eq!(latest.temperature, 21.0);

        let page = store.list_readings(PageRequest::new(Some(1), Some(2))).await.unwrap();
        assert_eq!(page.total_count, 3);
        assert_eq!(page.items[0].temperature, 21.0);
        assert_eq!(page.items[1].temperature, 19.5);
    }
}
