use serde::{Deserialize, Serialize};

/// One row of the cars dataset after cleaning. Numeric fields are `None`
/// whenever the raw cell held nothing parseable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CarRecord {
    pub company: Option<String>,
    pub name: Option<String>,
    pub fuel_type: Option<String>,
    pub price: Option<f64>,
    pub horsepower: Option<f64>,
    pub cc: Option<f64>,
    pub perf_sec: Option<f64>,
    pub torque: Option<f64>,
    pub seats: Option<f64>,
}

/// Numeric columns in the order the reports and the model use them.
pub const NUMERIC_COLUMNS: [&str; 6] = ["price", "horsepower", "cc", "perf_sec", "torque", "seats"];

impl CarRecord {
    pub fn numeric(&self, column: &str) -> Option<f64> {
        match column {
            "price" => self.price,
            "horsepower" => self.horsepower,
            "cc" => self.cc,
            "perf_sec" => self.perf_sec,
            "torque" => self.torque,
            "seats" => self.seats,
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxStats {
    pub company: String,
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    /// Row-major; `None` where fewer than two paired values exist or a
    /// column has no variance.
    pub values: Vec<Vec<Option<f64>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdaSummary {
    pub rows: usize,
    pub non_missing: Vec<(String, usize)>,
    pub generated_at: chrono::DateTime<chrono::Utc>,
}

/// Everything the EDA pipeline computes before writing it out.
#[derive(Debug, Clone)]
pub struct EdaReport {
    pub summary: EdaSummary,
    pub price_hist: Vec<HistogramBin>,
    pub log_price_hist: Vec<HistogramBin>,
    pub horsepower_vs_price: Vec<(f64, f64)>,
    pub company_boxplot: Vec<BoxStats>,
    pub correlation: CorrelationMatrix,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetrics {
    pub cv_rmse_mean: f64,
    pub cv_rmse_std: f64,
    pub test_rmse: f64,
    pub test_r2: f64,
    pub train_rows: usize,
    pub test_rows: usize,
}
