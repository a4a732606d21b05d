//! MongoDB-backed store

use bson::{doc, oid::ObjectId, DateTime, Document};
use std::str::FromStr;
use tracing::{debug, info};

use super::{CropStore, CropTotals, ReadingStore, UserStore};
use crate::db::schemas::{
    CropDoc, ReadingDoc, UserDoc, CROP_COLLECTION, READING_COLLECTION, USER_COLLECTION,
};
use crate::db::{MongoClient, MongoCollection};
use crate::types::{
    CropPage, CropQuery, CropRecord, CropchainError, NewCrop, NewReading, NewUser, Page,
    PageRequest, ReadingPage, Result, SensorReading, User,
};

/// Collections are opened (and indexed) once at startup
pub struct MongoStore {
    users: MongoCollection<UserDoc>,
    crops: MongoCollection<CropDoc>,
    readings: MongoCollection<ReadingDoc>,
}

impl MongoStore {
    pub async fn new(mongo: &MongoClient) -> Result<Self> {
        let store = Self {
            users: mongo.collection(USER_COLLECTION).await?,
            crops: mongo.collection(CROP_COLLECTION).await?,
            readings: mongo.collection(READING_COLLECTION).await?,
        };
        info!(db = mongo.db_name(), "Collections opened and indexed");
        Ok(store)
    }
}

/// Filter by `_id`, or `None` when the id is not a valid ObjectId
fn id_filter(id: &str) -> Option<Document> {
    ObjectId::from_str(id).ok().map(|oid| doc! { "_id": oid })
}

fn crop_filter(farmer_id: &str, query: &CropQuery) -> Document {
    let mut filter = doc! { "farmer_id": farmer_id };
    if !query.range.is_open() {
        let mut window = Document::new();
        if let Some(from) = query.range.from {
            window.insert("$gte", DateTime::from_chrono(from));
        }
        if let Some(to) = query.range.to {
            window.insert("$lte", DateTime::from_chrono(to));
        }
        filter.insert("registered_at", window);
    }
    filter
}

/// Read an integer aggregation output without a round trip through f64.
///
/// `$sum` over int64 only falls back to a double once it overflows, so a
/// double here is an error rather than a value to truncate.
fn integer_field(doc: &Document, key: &str) -> Result<u64> {
    let value = match doc.get(key) {
        None => return Ok(0),
        Some(bson::Bson::Int32(v)) => i64::from(*v),
        Some(bson::Bson::Int64(v)) => *v,
        Some(other) => {
            return Err(CropchainError::Database(format!(
                "Expected an integer for {key}, got {other}"
            )))
        }
    };
    u64::try_from(value)
        .map_err(|_| CropchainError::Database(format!("Negative total for {key}: {value}")))
}

/// Read a numeric aggregation output that may come back as i32, i64 or f64
fn number_field(doc: &Document, key: &str) -> f64 {
    match doc.get(key) {
        Some(bson::Bson::Int32(v)) => f64::from(*v),
        Some(bson::Bson::Int64(v)) => *v as f64,
        Some(bson::Bson::Double(v)) => *v,
        _ => 0.0,
    }
}

fn to_i64(amount: u64) -> Result<i64> {
    i64::try_from(amount)
        .map_err(|_| CropchainError::Validation(format!("Amount {amount} out of range")))
}

#[async_trait::async_trait]
impl UserStore for MongoStore {
    async fn create_user(&self, input: NewUser) -> Result<User> {
        let mut user_doc = UserDoc::new(input);
        let id = self.users.insert_one(user_doc.clone()).await.map_err(|e| match e {
            CropchainError::Conflict(_) => CropchainError::Conflict("User already exists".into()),
            other => other,
        })?;
        user_doc._id = Some(id);
        Ok(user_doc.into_user())
    }

    async fn find_user(&self, id: &str) -> Result<Option<User>> {
        let Some(filter) = id_filter(id) else {
            return Ok(None);
        };
        Ok(self.users.find_one(filter).await?.map(UserDoc::into_user))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .find_one(doc! { "email": email })
            .await?
            .map(UserDoc::into_user))
    }

    async fn user_exists(&self, email: &str, username: &str) -> Result<bool> {
        let count = self
            .users
            .count(doc! { "$or": [ { "email": email }, { "username": username } ] })
            .await?;
        Ok(count > 0)
    }

    async fn set_wallet_address(&self, id: &str, address: &str) -> Result<bool> {
        let Some(filter) = id_filter(id) else {
            return Ok(false);
        };
        let matched = self
            .users
            .update_one(
                filter,
                doc! { "$set": {
                    "wallet_address": address,
                    "metadata.updated_at": DateTime::now(),
                } },
            )
            .await?;
        Ok(matched > 0)
    }

    async fn record_login(&self, id: &str) -> Result<()> {
        if let Some(filter) = id_filter(id) {
            self.users
                .update_one(filter, doc! { "$set": { "last_login": DateTime::now() } })
                .await?;
        }
        Ok(())
    }

    async fn increment_balance(&self, id: &str, amount: u64) -> Result<Option<u64>> {
        let Some(filter) = id_filter(id) else {
            return Ok(None);
        };
        let updated = self
            .users
            .update_and_fetch(
                filter,
                doc! {
                    "$inc": { "token_balance": to_i64(amount)? },
                    "$set": { "metadata.updated_at": DateTime::now() },
                },
            )
            .await?;

        debug!(user_id = %id, amount, "Incremented token balance");
        Ok(updated.map(|u| u64::try_from(u.token_balance).unwrap_or(0)))
    }

    async fn list_holders(&self, limit: u64) -> Result<Vec<User>> {
        let docs = self
            .users
            .find_page(
                doc! { "token_balance": { "$gt": 0_i64 } },
                doc! { "token_balance": -1, "username": 1 },
                0,
                limit,
            )
            .await?;
        Ok(docs.into_iter().map(UserDoc::into_user).collect())
    }
}

#[async_trait::async_trait]
impl CropStore for MongoStore {
    async fn insert_crop(&self, input: NewCrop) -> Result<CropRecord> {
        let mut crop_doc = CropDoc::new(input)?;
        let id = self.crops.insert_one(crop_doc.clone()).await?;
        crop_doc._id = Some(id);
        Ok(crop_doc.into_record())
    }

    async fn find_crop(&self, id: &str) -> Result<Option<CropRecord>> {
        let Some(filter) = id_filter(id) else {
            return Ok(None);
        };
        Ok(self.crops.find_one(filter).await?.map(CropDoc::into_record))
    }

    async fn list_crops(&self, farmer_id: &str, query: &CropQuery) -> Result<CropPage> {
        let filter = crop_filter(farmer_id, query);
        let total = self.crops.count(filter.clone()).await?;
        let docs = self
            .crops
            .find_page(
                filter,
                doc! { "registered_at": -1, "_id": -1 },
                query.paging.offset(),
                query.paging.page_size,
            )
            .await?;

        Ok(Page::new(
            docs.into_iter().map(CropDoc::into_record).collect(),
            total,
            query.paging,
        ))
    }

    async fn sum_tokens(&self, farmer_id: &str) -> Result<u64> {
        Ok(self.crop_totals(farmer_id).await?.total_tokens)
    }

    async fn crop_totals(&self, farmer_id: &str) -> Result<CropTotals> {
        let rows = self
            .crops
            .aggregate(
                doc! { "farmer_id": farmer_id },
                vec![doc! { "$group": {
                    "_id": null,
                    "count": { "$sum": 1 },
                    "weight": { "$sum": "$weight" },
                    "tokens": { "$sum": "$token_amount" },
                } }],
            )
            .await?;

        let Some(row) = rows.first() else {
            return Ok(CropTotals::default());
        };
        Ok(CropTotals {
            crop_count: integer_field(row, "count")?,
            total_weight: number_field(row, "weight"),
            total_tokens: integer_field(row, "tokens")?,
        })
    }
}

#[async_trait::async_trait]
impl ReadingStore for MongoStore {
    async fn insert_reading(&self, input: NewReading) -> Result<SensorReading> {
        let mut reading_doc = ReadingDoc::new(input);
        let id = self.readings.insert_one(reading_doc.clone()).await?;
        reading_doc._id = Some(id);
        Ok(reading_doc.into_reading())
    }

    async fn list_readings(&self, paging: PageRequest) -> Result<ReadingPage> {
        let total = self.readings.count(Document::new()).await?;
        let docs = self
            .readings
            .find_page(
                Document::new(),
                doc! { "recorded_at": -1, "_id": -1 },
                paging.offset(),
                paging.page_size,
            )
            .await?;
        Ok(Page::new(
            docs.into_iter().map(ReadingDoc::into_reading).collect(),
            total,
            paging,
        ))
    }

    async fn latest_reading(&self) -> Result<Option<SensorReading>> {
        let mut docs = self
            .readings
            .find_page(Document::new(), doc! { "recorded_at": -1, "_id": -1 }, 0, 1)
            .await?;
        Ok(docs.pop().map(ReadingDoc::into_reading))
    }
}
