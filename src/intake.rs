// 📝 Intake Service - appends raw records through the store
// The intake form registers a person, then submits payment, treatment, and
// doctor records tied to that visit. Every record gets a stable id and a
// created-at stamp; normalization for reporting happens later, at read time.

use crate::entities::{RawDoctor, RawPayment, RawPerson, RawTreatment};
use crate::normalize::normalize_text;
use crate::report::RawAdminData;
use crate::store::AdminStore;
use anyhow::Result;
use chrono::Utc;

pub struct IntakeService<'a> {
    store: &'a AdminStore,
}

impl<'a> IntakeService<'a> {
    pub fn new(store: &'a AdminStore) -> Self {
        IntakeService { store }
    }

    fn load_or_default(&self) -> Result<RawAdminData> {
        let (data, _source) = self.store.load()?;
        Ok(data.unwrap_or_default())
    }

    fn new_id() -> serde_json::Value {
        serde_json::Value::String(uuid::Uuid::new_v4().to_string())
    }

    fn now() -> String {
        Utc::now().to_rfc3339()
    }

    /// Register a person. Duplicate names are stored as-is; the report
    /// collapses them into one entry with a submission count.
    pub fn register_person(&self, first_name: &str, last_name: &str) -> Result<RawPerson> {
        let record = RawPerson {
            id: Some(Self::new_id()),
            first_name: Some(normalize_text(first_name)),
            last_name: Some(normalize_text(last_name)),
            created_at: Some(Self::now()),
            ..Default::default()
        };

        let mut data = self.load_or_default()?;
        data.persons_mut().push(record.clone());
        self.store.save(&data)?;
        Ok(record)
    }

    /// Submit a payment method record. `payment_type` may bundle several
    /// method names; the report splits them.
    pub fn add_payment(
        &self,
        payment_type: &str,
        score: f64,
        description: Option<&str>,
    ) -> Result<RawPayment> {
        let record = RawPayment {
            id: Some(Self::new_id()),
            payment_type: Some(normalize_text(payment_type)),
            score: serde_json::Number::from_f64(score).map(serde_json::Value::Number),
            description: description.map(normalize_text),
            created_at: Some(Self::now()),
            ..Default::default()
        };

        let mut data = self.load_or_default()?;
        data.payments_mut().push(record.clone());
        self.store.save(&data)?;
        Ok(record)
    }

    pub fn add_treatment(
        &self,
        name: &str,
        profitability: &str,
        cost: Option<f64>,
        description: Option<&str>,
    ) -> Result<RawTreatment> {
        let record = RawTreatment {
            id: Some(Self::new_id()),
            name: Some(normalize_text(name)),
            profitability: Some(profitability.to_lowercase()),
            cost: cost
                .and_then(serde_json::Number::from_f64)
                .map(serde_json::Value::Number),
            description: description.map(normalize_text),
            created_at: Some(Self::now()),
            ..Default::default()
        };

        let mut data = self.load_or_default()?;
        data.treatments_mut().push(record.clone());
        self.store.save(&data)?;
        Ok(record)
    }

    pub fn add_doctor(&self, name: &str, specialty: Option<&str>) -> Result<RawDoctor> {
        let record = RawDoctor {
            id: Some(Self::new_id()),
            name: Some(normalize_text(name)),
            specialty: specialty.map(normalize_text),
            ..Default::default()
        };

        let mut data = self.load_or_default()?;
        data.doctors_mut().push(record.clone());
        self.store.save(&data)?;
        Ok(record)
    }
}

// ============================================================================
// TESTS
// ============================================================================
