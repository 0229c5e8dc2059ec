//! Binary runner utilities
//!
//! Provides a standardized way to run binaries with proper
//! logging banners and graceful shutdown.

use tracing::info;

/// Configuration for running a binary application
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Name of the binary (for logging)
    pub name: String,
    /// Main loop interval (if applicable)
    pub loop_interval_secs: Option<u64>,
}

impl RunConfig {
    /// Create a new run configuration
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            loop_interval_secs: None,
        }
    }

    /// Set loop interval
    pub fn with_loop_interval(mut self, secs: u64) -> Self {
        self.loop_interval_secs = Some(secs);
        self
    }
}

/// Trait for binary applications
pub trait BinaryRunner {
    /// Run the application until shutdown
    async fn run(&mut self) -> anyhow::Result<()>;

    /// Get the run configuration
    fn config(&self) -> &RunConfig;

    /// Print startup banner
    fn print_banner(&self) {
        let config = self.config();
        info!("");
        info!("========================================");
        info!("Starting {}", config.name);
        if let Some(interval) = config.loop_interval_secs {
            info!("Sweep interval: {} seconds", interval);
        }
        info!("Press Ctrl+C to stop");
        info!("========================================");
        info!("");
    }

    /// Print shutdown banner
    fn print_shutdown(&self) {
        let config = self.config();
        info!("");
        info!("========================================");
        info!("{} stopped gracefully", config.name);
        info!("========================================");
    }

    /// Execute the binary with banners around the main loop
    async fn execute(&mut self) -> anyhow::Result<()> {
        self.print_banner();
        let result = self.run().await;
        self.print_shutdown();
        result
    }
}
