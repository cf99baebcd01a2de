//! Command handlers for the `skeleton` binary.
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Subcommand;
use core_logging::{LoggingConfig, LoggingPlugin};
use skeleton_core::kernel::constants::DEFAULT_DATA_DIR;
use skeleton_core::kernel::create_configured_components;
use skeleton_core::kernel::error::{Error, Result};
use skeleton_core::utils::{IdGenerator, ProcessIdGenerator};
use skeleton_core::{Configuration, Context, Database, Plugin, System};

/// Key of the logging plugin's settings in `customConfig`.
const LOGGING_CONFIG_KEY: &str = "logging";

#[derive(Subcommand, Debug)]
pub enum StoreCommand {
    /// Create a store (no-op if it exists)
    Create {
        /// Store name, letters and digits only
        namespace: String,
    },
    /// List every store
    List,
    /// Set a key and save a new version of the store
    Put {
        namespace: String,
        key: String,
        value: String,
    },
    /// Print the value stored under a key
    Get { namespace: String, key: String },
}

pub fn load_configuration(path: Option<&Path>) -> Result<Configuration> {
    match path {
        Some(path) => {
            let configuration = Configuration::load_from_file(path)?;
            log::debug!("Loaded configuration from {}", path.display());
            Ok(configuration)
        }
        None => Ok(Configuration::default()),
    }
}

/// Boot the kernel, start it, report the status and stop it.
pub async fn run(mut configuration: Configuration, data_dir: Option<PathBuf>) -> Result<()> {
    if data_dir.is_some() {
        configuration.store.base_dir = data_dir;
    }
    let logging = LoggingConfig::from_value(&configuration.custom_config[LOGGING_CONFIG_KEY])?;

    let system = System::from_configuration(configuration)?;
    let ctx = Context::background().with_trace_id(ProcessIdGenerator::new("run").generate_id()?);

    system.initialize(&ctx).await?;
    println!("Registering static core plugins...");
    let logging_plugin: Arc<dyn Plugin> = Arc::new(LoggingPlugin::new(logging));
    system.plugin_manager().add_plugin(&ctx, logging_plugin).await?;
    println!("  - Registered: core-logging");

    create_configured_components(&ctx, &system).await?;

    system.start(&ctx).await?;
    println!("System status: {}", system.status().await);
    println!(
        "Components: {}, stores: {}",
        system.component_registrar().component_count().await,
        system.multi_store().get_store_count()
    );

    let failures = system.stop_with_report(&ctx).await?;
    for failure in &failures {
        eprintln!("Service '{}' failed to stop: {}", failure.service_id, failure.error);
    }
    system.plugin_manager().stop_plugins(&ctx).await?;
    println!("System status: {}", system.status().await);
    Ok(())
}

/// Run one store command against the on-disk multi-store.
pub fn store(mut configuration: Configuration, data_dir: Option<PathBuf>, command: StoreCommand) -> Result<()> {
    let base_dir = data_dir
        .or_else(|| configuration.store.base_dir.take())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
    configuration.store.base_dir = Some(base_dir);

    let system = System::from_configuration(configuration)?;
    let multi_store = system.multi_store();
    log::debug!("Opened multi-store with {} stores", multi_store.get_store_count());

    match command {
        StoreCommand::Create { namespace } => {
            let (store, created) = multi_store.create_store(&namespace)?;
            if created {
                let (_, version) = multi_store.save_version()?;
                println!("Created store '{}' (root version {})", store.name(), version);
            } else {
                println!("Store '{}' already exists", store.name());
            }
        }
        StoreCommand::List => {
            let ids = multi_store.store_ids();
            if ids.is_empty() {
                println!("No stores.");
            }
            for id in ids {
                if let Some(store) = multi_store.get_store(&id) {
                    println!("{}\t{}\tversion {}", store.name(), id, store.version());
                }
            }
        }
        StoreCommand::Put { namespace, key, value } => {
            let (store, _) = multi_store.create_store(&namespace)?;
            store.set(key.as_bytes(), value.as_bytes())?;
            let (_, version) = store.save_version()?;
            multi_store.save_version()?;
            println!("Saved '{}' in '{}' at version {}", key, namespace, version);
        }
        StoreCommand::Get { namespace, key } => {
            let store = multi_store
                .get_store_by_name(&namespace)
                .ok_or_else(|| Error::InvalidInput(format!("store '{}' not found", namespace)))?;
            let value = store.get_required(key.as_bytes())?;
            println!("{}", String::from_utf8_lossy(&value));
        }
    }
    Ok(())
}
