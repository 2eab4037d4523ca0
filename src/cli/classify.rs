//! Classify command implementation

use anyhow::Result;
use clap::Args;
use tracing::info;

use crate::classify::{Classifier, ModuleDescriptor};
use crate::config::Config;

/// Print the bundle a module is assigned to
#[derive(Args, Debug)]
pub struct ClassifyCommand {
    /// Directory containing the module
    #[arg(long)]
    pub context: String,

    /// Import specifier the module is requested with
    #[arg(long)]
    pub request: Option<String>,

    /// The module is a stylesheet
    #[arg(long)]
    pub style: bool,
}

impl ClassifyCommand {
    pub fn execute(&self, config_path: &str) -> Result<()> {
        info!("Loading configuration from {}", config_path);
        let config = Config::load_or_default(config_path)?;
        let classifier = Classifier::new(&config.split)?;

        let bundle = classifier.classify(&self.descriptor())?;
        println!("{}", bundle);

        Ok(())
    }

    fn descriptor(&self) -> ModuleDescriptor {
        ModuleDescriptor {
            context: self.context.clone(),
            raw_request: self.request.clone(),
            is_style: self.style,
        }
    }
}
