// 📊 Report Assembler - folds raw admin data into one ReportData value
// One normalization/aggregation policy, many consumers: the CLI, the CSV/JSON
// export, and the REST surface all call prepare_report and never re-derive
// metrics themselves.

use crate::entities::{
    Doctor, DoctorFolder, PaymentFolder, PaymentMethod, Person, PersonFolder, RawDoctor,
    RawPayment, RawPerson, RawTreatment, Treatment, TreatmentFolder,
};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Default "needs review" cost threshold: a positive price below this is
/// almost certainly missing zeros. Policy, not a law of nature; override it
/// through [`ReportEngine`].
pub const DEFAULT_COST_REVIEW_THRESHOLD: f64 = 1000.0;

// ============================================================================
// RAW INPUT
// ============================================================================

/// The loosely shaped blob the data sources produce. Every array is optional
/// and alternate field names are honored (`persons`/`people`,
/// `payments`/`paymentTypes`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawAdminData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persons: Option<Vec<RawPerson>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub people: Option<Vec<RawPerson>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payments: Option<Vec<RawPayment>>,

    #[serde(default, rename = "paymentTypes", skip_serializing_if = "Option::is_none")]
    pub payment_types: Option<Vec<RawPayment>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub treatments: Option<Vec<RawTreatment>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctors: Option<Vec<RawDoctor>>,
}

impl RawAdminData {
    pub fn persons(&self) -> &[RawPerson] {
        self.persons
            .as_deref()
            .or(self.people.as_deref())
            .unwrap_or(&[])
    }

    pub fn payments(&self) -> &[RawPayment] {
        self.payments
            .as_deref()
            .or(self.payment_types.as_deref())
            .unwrap_or(&[])
    }

    pub fn treatments(&self) -> &[RawTreatment] {
        self.treatments.as_deref().unwrap_or(&[])
    }

    pub fn doctors(&self) -> &[RawDoctor] {
        self.doctors.as_deref().unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.persons().is_empty()
            && self.payments().is_empty()
            && self.treatments().is_empty()
            && self.doctors().is_empty()
    }

    /// Mutable access for intake writes. Records stored under a legacy
    /// alias key are consolidated into the canonical field first so the
    /// read accessors keep seeing them.
    pub fn persons_mut(&mut self) -> &mut Vec<RawPerson> {
        let legacy = if self.persons.is_none() {
            self.people.take()
        } else {
            None
        };
        let list = self.persons.get_or_insert_with(Vec::new);
        if let Some(mut legacy) = legacy {
            list.append(&mut legacy);
        }
        list
    }

    pub fn payments_mut(&mut self) -> &mut Vec<RawPayment> {
        let legacy = if self.payments.is_none() {
            self.payment_types.take()
        } else {
            None
        };
        let list = self.payments.get_or_insert_with(Vec::new);
        if let Some(mut legacy) = legacy {
            list.append(&mut legacy);
        }
        list
    }

    pub fn treatments_mut(&mut self) -> &mut Vec<RawTreatment> {
        self.treatments.get_or_insert_with(Vec::new)
    }

    pub fn doctors_mut(&mut self) -> &mut Vec<RawDoctor> {
        self.doctors.get_or_insert_with(Vec::new)
    }
}

// ============================================================================
// REPORT OUTPUT
// ============================================================================

/// Summary counts shown at the top of the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Kpis {
    pub total_people: usize,
    pub total_payment_types: usize,
    pub total_treatments: usize,
    pub total_doctors: usize,
}

/// One bar/slice of a chart: a label and its count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartBucket {
    pub name: String,
    pub value: usize,
}

/// Pre-bucketed chart series; presentation code renders these verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Charts {
    /// Full payment list, descending best score (ties keep merge order).
    pub payments_by_score: Vec<PaymentMethod>,
    pub treatment_profit_buckets: Vec<ChartBucket>,
    pub doctors_by_specialty: Vec<ChartBucket>,
}

/// Everything the presentation layer needs. Every field is always present,
/// possibly empty; consumers never null-check.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportData {
    pub doctors: Vec<Doctor>,
    pub treatments: Vec<Treatment>,
    pub payments: Vec<PaymentMethod>,
    pub people: Vec<Person>,
    pub kpis: Kpis,
    pub charts: Charts,
}

// ============================================================================
// REPORT ENGINE
// ============================================================================

/// Aggregation pipeline with its one tunable policy knob. Pure over its
/// input: every call allocates fresh output and mutates no shared state.
pub struct ReportEngine {
    /// Costs in (0, threshold) get a "needs review" note.
    pub cost_review_threshold: f64,
}

impl ReportEngine {
    pub fn new() -> Self {
        ReportEngine {
            cost_review_threshold: DEFAULT_COST_REVIEW_THRESHOLD,
        }
    }

    /// Fold raw arrays into the deduplicated report. Total: missing input
    /// or missing arrays produce a valid, empty report.
    pub fn prepare(&self, raw: Option<&RawAdminData>) -> ReportData {
        let empty = RawAdminData::default();
        let raw = raw.unwrap_or(&empty);

        let mut doctor_folder = DoctorFolder::new();
        for doc in raw.doctors() {
            doctor_folder.fold(doc);
        }

        let mut treatment_folder = TreatmentFolder::new(self.cost_review_threshold);
        for treatment in raw.treatments() {
            treatment_folder.fold(treatment);
        }

        let mut payment_folder = PaymentFolder::new();
        for payment in raw.payments() {
            payment_folder.fold(payment);
        }

        let mut person_folder = PersonFolder::new();
        for person in raw.persons() {
            person_folder.fold(person);
        }

        let doctors = doctor_folder.into_entries();
        let treatments = treatment_folder.into_entries();
        let payments = payment_folder.into_entries();
        let people = person_folder.into_entries();

        let mut treatment_profit_buckets: Vec<ChartBucket> = Vec::new();
        for treatment in &treatments {
            bump_bucket(&mut treatment_profit_buckets, &treatment.profitability_label);
        }

        let mut doctors_by_specialty: Vec<ChartBucket> = Vec::new();
        for doctor in &doctors {
            bump_bucket(&mut doctors_by_specialty, &doctor.specialty);
        }

        let mut payments_by_score = payments.clone();
        payments_by_score.sort_by(|a, b| {
            b.best_score
                .partial_cmp(&a.best_score)
                .unwrap_or(Ordering::Equal)
        });

        let kpis = Kpis {
            total_people: people.len(),
            total_payment_types: payments.len(),
            total_treatments: treatments.len(),
            total_doctors: doctors.len(),
        };

        ReportData {
            doctors,
            treatments,
            payments,
            people,
            kpis,
            charts: Charts {
                payments_by_score,
                treatment_profit_buckets,
                doctors_by_specialty,
            },
        }
    }
}

impl Default for ReportEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Prepare a report with the default policy.
pub fn prepare_report(raw: Option<&RawAdminData>) -> ReportData {
    ReportEngine::new().prepare(raw)
}

fn bump_bucket(buckets: &mut Vec<ChartBucket>, name: &str) {
    match buckets.iter_mut().find(|b| b.name == name) {
        Some(bucket) => bucket.value += 1,
        None => buckets.push(ChartBucket {
            name: name.to_string(),
            value: 1,
        }),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn person(name: &str) -> RawPerson {
        RawPerson {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    fn payment(payment_type: &str, score: serde_json::Value) -> RawPayment {
        RawPayment {
            payment_type: Some(payment_type.to_string()),
            score: Some(score),
            ..Default::default()
        }
    }

    fn treatment(name: &str, profitability: &str) -> RawTreatment {
        RawTreatment {
            name: Some(name.to_string()),
            profitability: Some(profitability.to_string()),
            ..Default::default()
        }
    }

    fn doctor(name: &str) -> RawDoctor {
        RawDoctor {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_none_and_empty_inputs_give_empty_report() {
        for report in [
            prepare_report(None),
            prepare_report(Some(&RawAdminData::default())),
        ] {
            assert_eq!(report.kpis, Kpis::default());
            assert!(report.people.is_empty());
            assert!(report.payments.is_empty());
            assert!(report.treatments.is_empty());
            assert!(report.doctors.is_empty());
            assert!(report.charts.payments_by_score.is_empty());
            assert!(report.charts.treatment_profit_buckets.is_empty());
            assert!(report.charts.doctors_by_specialty.is_empty());
        }
    }

    #[test]
    fn test_idempotent_over_same_input() {
        let raw = RawAdminData {
            persons: Some(vec![person("علی رضایی"), person("علی رضایی")]),
            payments: Some(vec![payment("نقد - چک", json!(7))]),
            treatments: Some(vec![treatment("ایمپلنت", "high")]),
            doctors: Some(vec![doctor("دکتر ارتودنسی")]),
            ..Default::default()
        };

        let first = prepare_report(Some(&raw));
        let second = prepare_report(Some(&raw));
        assert_eq!(first, second);
    }

    #[test]
    fn test_alternate_field_names() {
        let raw = RawAdminData {
            people: Some(vec![person("علی")]),
            payment_types: Some(vec![payment("کارت", json!(8))]),
            ..Default::default()
        };

        let report = prepare_report(Some(&raw));
        assert_eq!(report.kpis.total_people, 1);
        assert_eq!(report.kpis.total_payment_types, 1);
    }

    #[test]
    fn test_canonical_field_shadows_alias() {
        let raw = RawAdminData {
            persons: Some(vec![person("الف")]),
            people: Some(vec![person("ب"), person("ج")]),
            ..Default::default()
        };

        let report = prepare_report(Some(&raw));
        assert_eq!(report.kpis.total_people, 1);
        assert_eq!(report.people[0].name, "الف");
    }

    #[test]
    fn test_person_dedup_invariant() {
        let raw = RawAdminData {
            persons: Some(vec![person("عل\u{064A}"), person("عل\u{06CC}")]),
            ..Default::default()
        };

        let report = prepare_report(Some(&raw));
        assert_eq!(report.people.len(), 1);
        assert_eq!(report.people[0].submissions, 2);
    }

    #[test]
    fn test_payments_sorted_by_best_score_descending() {
        let raw = RawAdminData {
            payments: Some(vec![
                payment("کارت", json!(6)),
                payment("نقد", json!(9)),
                payment("چک", json!(6)),
            ]),
            ..Default::default()
        };

        let report = prepare_report(Some(&raw));
        let order: Vec<&str> = report
            .charts
            .payments_by_score
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        // descending score; ties keep merge order (کارت before چک)
        assert_eq!(order, vec!["نقد", "کارت", "چک"]);
        // the unsorted list keeps input order
        assert_eq!(report.payments[0].name, "کارت");
    }

    #[test]
    fn test_bucket_counts() {
        let raw = RawAdminData {
            treatments: Some(vec![
                treatment("ایمپلنت", "very-high"),
                treatment("لمینت", "very-high"),
                treatment("جرم‌گیری", "low"),
            ]),
            doctors: Some(vec![
                doctor("دکتر ارتودنسی"),
                doctor("دکتر اطفال"),
                doctor("متخصص ارتودنسی فلان"),
            ]),
            ..Default::default()
        };

        let report = prepare_report(Some(&raw));
        assert_eq!(
            report.charts.treatment_profit_buckets,
            vec![
                ChartBucket {
                    name: "خیلی پرسود".to_string(),
                    value: 2
                },
                ChartBucket {
                    name: "کم‌سود".to_string(),
                    value: 1
                },
            ]
        );
        assert_eq!(
            report.charts.doctors_by_specialty,
            vec![
                ChartBucket {
                    name: "ارتودنسی".to_string(),
                    value: 2
                },
                ChartBucket {
                    name: "اطفال".to_string(),
                    value: 1
                },
            ]
        );
    }

    #[test]
    fn test_end_to_end_scenario() {
        let raw = RawAdminData {
            persons: Some(vec![RawPerson {
                first_name: Some("علی".to_string()),
                last_name: Some("رضایی".to_string()),
                created_at: Some("2024-01-01".to_string()),
                ..Default::default()
            }]),
            payments: Some(vec![payment("نقدی", json!(9))]),
            treatments: Some(vec![RawTreatment {
                name: Some("ایمپلنت".to_string()),
                profitability: Some("very-high".to_string()),
                cost: Some(json!(5_000_000)),
                ..Default::default()
            }]),
            doctors: Some(vec![]),
            ..Default::default()
        };

        let report = prepare_report(Some(&raw));

        assert_eq!(
            report.kpis,
            Kpis {
                total_people: 1,
                total_payment_types: 1,
                total_treatments: 1,
                total_doctors: 0,
            }
        );

        assert_eq!(report.people[0].name, "علی رضایی");
        assert_eq!(report.people[0].first_seen.as_deref(), Some("2024-01-01"));

        assert_eq!(report.payments[0].best_score, 9.0);
        assert_eq!(report.payments[0].stars, "4.5⭐");

        assert_eq!(report.treatments[0].profitability_label, "خیلی پرسود");
        assert_eq!(report.treatments[0].cost, "۵٬۰۰۰٬۰۰۰");
        assert_eq!(report.treatments[0].notes, None);
    }

    #[test]
    fn test_configurable_review_threshold() {
        let raw = RawAdminData {
            treatments: Some(vec![RawTreatment {
                name: Some("ویزیت".to_string()),
                cost: Some(json!(5000)),
                ..Default::default()
            }]),
            ..Default::default()
        };

        let default_report = prepare_report(Some(&raw));
        assert_eq!(default_report.treatments[0].notes, None);

        let strict = ReportEngine {
            cost_review_threshold: 10_000.0,
        };
        let strict_report = strict.prepare(Some(&raw));
        assert!(strict_report.treatments[0]
            .notes
            .as_deref()
            .unwrap()
            .contains("نیاز به اصلاح"));
    }

    #[test]
    fn test_report_round_trips_through_json() {
        let raw = RawAdminData {
            persons: Some(vec![person("علی رضایی")]),
            payments: Some(vec![payment("نقدی", json!(9))]),
            ..Default::default()
        };

        let report = prepare_report(Some(&raw));
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"totalPeople\":1"));
        assert!(json.contains("\"bestScore\":9.0"));
        let back: ReportData = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }

    #[test]
    fn test_raw_data_parses_loose_json() {
        let raw: RawAdminData = serde_json::from_str(
            r#"{
                "persons": [{"firstName": "علی", "lastName": "رضایی", "extra": 1}],
                "paymentTypes": [{"type": "نقدی", "score": "9"}],
                "treatments": [{"name": "ایمپلنت", "cost": "2,000,000"}],
                "unknownTopLevel": {"ignored": true}
            }"#,
        )
        .unwrap();

        let report = prepare_report(Some(&raw));
        assert_eq!(report.kpis.total_people, 1);
        assert_eq!(report.payments[0].best_score, 9.0);
        assert_eq!(report.treatments[0].cost, "۲٬۰۰۰٬۰۰۰");
    }
}
