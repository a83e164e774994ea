use crate::app::pipelines::{dataset_key, load_dataset};
use crate::config::ProjectConfig;
use crate::core::eda::{build_report, format_currency};
use crate::domain::model::{CarRecord, EdaReport};
use crate::domain::ports::{Pipeline, Storage};
use crate::utils::error::{ProjectError, Result};
use std::io::Write;
use std::path::Path;
use zip::write::{FileOptions, ZipWriter};

pub const REPORT_ARCHIVE: &str = "eda_report.zip";

pub struct EdaPipeline<S: Storage> {
    storage: S,
    config: ProjectConfig,
}

impl<S: Storage> EdaPipeline<S> {
    pub fn new(storage: S, config: ProjectConfig) -> Self {
        Self { storage, config }
    }

    fn report_dir(&self) -> String {
        Path::new(&self.config.paths.reports_dir)
            .join("eda")
            .to_string_lossy()
            .into_owned()
    }
}

fn finish_csv(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>> {
    writer
        .into_inner()
        .map_err(|e| ProjectError::IoError(e.into_error()))
}

/// Renders every report table as `(file name, bytes)`.
pub fn render_report(report: &EdaReport) -> Result<Vec<(String, Vec<u8>)>> {
    let mut files = Vec::new();

    for (name, bins) in [
        ("price_hist.csv", &report.price_hist),
        ("log_price_hist.csv", &report.log_price_hist),
    ] {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for bin in bins {
            writer.serialize(bin)?;
        }
        files.push((name.to_string(), finish_csv(writer)?));
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["horsepower", "price"])?;
    for (hp, price) in &report.horsepower_vs_price {
        writer.write_record([hp.to_string(), price.to_string()])?;
    }
    files.push(("horsepower_vs_price.csv".to_string(), finish_csv(writer)?));

    let mut writer = csv::Writer::from_writer(Vec::new());
    for stats in &report.company_boxplot {
        writer.serialize(stats)?;
    }
    files.push(("company_price_boxplot.csv".to_string(), finish_csv(writer)?));

    let mut writer = csv::Writer::from_writer(Vec::new());
    let mut header = vec![String::new()];
    header.extend(report.correlation.columns.iter().cloned());
    writer.write_record(&header)?;
    for (column, row) in report.correlation.columns.iter().zip(&report.correlation.values) {
        let mut record = vec![column.clone()];
        record.extend(row.iter().map(|v| v.map(|v| format!("{:.4}", v)).unwrap_or_default()));
        writer.write_record(&record)?;
    }
    files.push(("numeric_corr.csv".to_string(), finish_csv(writer)?));

    files.push((
        "summary.json".to_string(),
        serde_json::to_vec_pretty(&report.summary)?,
    ));

    Ok(files)
}

fn zip_files(files: &[(String, Vec<u8>)]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    for (name, data) in files {
        zip.start_file::<_, ()>(name.as_str(), FileOptions::default())?;
        zip.write_all(data)?;
    }
    Ok(zip.finish()?.into_inner())
}

#[async_trait::async_trait]
impl<S: Storage> Pipeline for EdaPipeline<S> {
    type Output = EdaReport;

    fn name(&self) -> &str {
        "eda"
    }

    async fn extract(&self) -> Result<Vec<CarRecord>> {
        load_dataset(&self.storage, &dataset_key(&self.config)).await
    }

    async fn transform(&self, data: Vec<CarRecord>) -> Result<EdaReport> {
        let report = build_report(&data, self.config.eda.histogram_bins, self.config.eda.top_companies);

        for stats in &report.company_boxplot {
            tracing::debug!(
                "{}: median price {} over {} cars",
                stats.company,
                format_currency(stats.median),
                stats.count
            );
        }
        Ok(report)
    }

    async fn load(&self, report: EdaReport) -> Result<String> {
        let dir = self.report_dir();
        tracing::info!("Saving reports to {}", self.storage.locate(&dir));

        let files = render_report(&report)?;
        for (name, data) in &files {
            let key = format!("{}/{}", dir, name);
            self.storage.write_file(&key, data).await?;
        }

        if self.config.eda.compress {
            let archive = zip_files(&files)?;
            tracing::debug!("Writing {} ({} bytes)", REPORT_ARCHIVE, archive.len());
            self.storage
                .write_file(&format!("{}/{}", dir, REPORT_ARCHIVE), &archive)
                .await?;
        }

        Ok(self.storage.locate(&dir))
    }
}
