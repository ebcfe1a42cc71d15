// Clinic Intake System - Core Library
// Exposes all modules for use in the CLI, API server, and tests

pub mod entities;
pub mod export;
pub mod intake;
pub mod normalize;
pub mod report;
pub mod store;

// Re-export commonly used types
pub use entities::{
    format_cost, infer_delay, parse_specialty, score_to_stars, split_payment_names, CostInfo,
    Doctor, PaymentMethod, Person, RawDoctor, RawPayment, RawPerson, RawTreatment, SplitPayment,
    Treatment, UNKNOWN_LABEL,
};
pub use export::{report_to_csv, report_to_json};
pub use intake::IntakeService;
pub use normalize::{normalize_name, normalize_text};
pub use report::{
    prepare_report, ChartBucket, Charts, Kpis, RawAdminData, ReportData, ReportEngine,
    DEFAULT_COST_REVIEW_THRESHOLD,
};
pub use store::{AdminStore, DataSource};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
