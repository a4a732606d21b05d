//! Field sensor readings

use std::sync::Arc;
use tracing::debug;

use crate::store::ReadingStore;
use crate::types::{CropchainError, NewReading, PageRequest, ReadingPage, Result, SensorReading};

/// Plausible air temperature bounds, °C
const TEMPERATURE_RANGE: (f64, f64) = (-60.0, 70.0);

pub struct ReadingService {
    readings: Arc<dyn ReadingStore>,
}

fn check(value: f64, (min, max): (f64, f64), field: &str) -> Result<()> {
    if !value.is_finite() || value < min || value > max {
        return Err(CropchainError::Validation(format!(
            "{field} must be between {min} and {max}"
        )));
    }
    Ok(())
}

impl ReadingService {
    pub fn new(readings: Arc<dyn ReadingStore>) -> Self {
        Self { readings }
    }

    pub async fn record(&self, input: NewReading) -> Result<SensorReading> {
        check(input.temperature, TEMPERATURE_RANGE, "temperature")?;
        check(input.humidity, (0.0, 100.0), "humidity")?;
        check(input.moisture, (0.0, 100.0), "moisture")?;

        let reading = self.readings.insert_reading(input).await?;
        debug!(reading_id = %reading.id, "Sensor reading stored");
        Ok(reading)
    }

    pub async fn list(&self, paging: PageRequest) -> Result<ReadingPage> {
        self.readings.list_readings(paging).await
    }

    pub async fn latest(&self) -> Result<SensorReading> {
        self.readings
            .latest_reading()
            .await?
            .ok_or_else(|| CropchainError::NotFound("No sensor readings yet".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn reading(temperature: f64, humidity: f64, moisture: f64) -> NewReading {
        NewReading {
            temperature,
            humidity,
            moisture,
        }
    }

    #[tokio::test]
    async fn test_out_of_range_readings_rejected() {
        let svc = ReadingService::new(Arc::new(MemoryStore::new()));
        for bad in [
            reading(22.0, 101.0, 40.0),
            reading(22.0, 50.0, -1.0),
            reading(f64::NAN, 50.0, 40.0),
            reading(150.0, 50.0, 40.0),
        ] {
            assert!(matches!(
                svc.record(bad).await,
                Err(CropchainError::Validation(_))
            ));
        }
        assert_eq!(svc.list(PageRequest::default()).await.unwrap().total_count, 0);
    }

    #[tokio::test]
    async fn test_latest_requires_a_reading() {
        let svc = ReadingService::new(Arc::new(MemoryStore::new()));
        assert!(matches!(svc.latest().await, Err(CropchainError::NotFound(_))));

        svc.record(reading(24.5, 61.0, 33.0)).await.unwrap();
        assert_eq!(svc.latest().await.unwrap().humidity, 61.0);
    }
}
