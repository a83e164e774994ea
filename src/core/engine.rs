use crate::domain::ports::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

pub struct PipelineEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> PipelineEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    /// Runs extract, transform and load in order and returns where the
    /// output was written.
    pub async fn run(&self) -> Result<String> {
        let name = self.pipeline.name();
        tracing::info!("Starting {} pipeline", name);
        self.monitor.log_stats("Start");

        tracing::debug!("Extracting data...");
        let rows = self.pipeline.extract().await?;
        tracing::info!("Rows loaded: {}", rows.len());
        self.monitor.log_stats("Extract");

        tracing::debug!("Transforming data...");
        let output = self.pipeline.transform(rows).await?;
        self.monitor.log_stats("Transform");

        tracing::debug!("Loading results...");
        let location = self.pipeline.load(output).await?;
        self.monitor.log_stats("Load");
        tracing::info!("{} output saved to: {}", name, location);

        self.monitor.log_final_stats();
        Ok(location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::CarRecord;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct RecordingPipeline {
        calls: Mutex<Vec<&'static str>>,
    }

    #[async_trait]
    impl Pipeline for RecordingPipeline {
        type Output = usize;

        fn name(&self) -> &str {
            "recording"
        }

        async fn extract(&self) -> Result<Vec<CarRecord>> {
            self.calls.lock().unwrap().push("extract");
            Ok(vec![CarRecord::default(); 3])
        }

        async fn transform(&self, data: Vec<CarRecord>) -> Result<usize> {
            self.calls.lock().unwrap().push("transform");
            Ok(data.len())
        }

        async fn load(&self, output: usize) -> Result<String> {
            self.calls.lock().unwrap().push("load");
            Ok(format!("{} rows", output))
        }
    }

    #[tokio::test]
    async fn test_engine_runs_phases_in_order() {
        let engine = PipelineEngine::new(RecordingPipeline {
            calls: Mutex::new(Vec::new()),
        });

        let location = engine.run().await.unwrap();

        assert_eq!(location, "3 rows");
        assert_eq!(
            *engine.pipeline.calls.lock().unwrap(),
            vec!["extract", "transform", "load"]
        );
    }
}
