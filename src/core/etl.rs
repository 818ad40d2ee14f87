use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(false),
        }
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    /// Drives one fetch run. Returns the output path, or `None` when the API
    /// produced no records (in which case nothing is written to disk).
    pub async fn run(&self) -> Result<Option<String>> {
        println!("Starting fetch process...");

        println!("Extracting data...");
        let records = self.pipeline.extract().await?;
        println!("Fetched {} records", records.len());
        self.monitor.log_stats("Extract");

        if records.is_empty() {
            tracing::warn!("No records fetched, skipping file output");
            self.monitor.log_final_stats();
            return Ok(None);
        }

        println!("Transforming data...");
        let bundle = self.pipeline.transform(records).await?;
        self.monitor.log_stats("Transform");

        println!("Loading data...");
        let output_path = self.pipeline.load(bundle).await?;
        println!("Output saved to: {}", output_path);
        self.monitor.log_stats("Load");
        self.monitor.log_final_stats();

        Ok(Some(output_path))
    }
}
