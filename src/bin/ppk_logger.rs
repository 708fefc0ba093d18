use anyhow::Context;
use anyhow::Result;

use chrono::Local;

use ppk_logger::acquisition::Pipeline;
use ppk_logger::acquisition::PipelineSettings;
use ppk_logger::configuration::Configuration;
use ppk_logger::configuration::SerialSettings;
use ppk_logger::prometheus::Exporter;
use ppk_logger::prometheus::Metrics;
use ppk_logger::recording::LogPaths;

use prometheus::Registry;

use std::convert::TryFrom;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use tokio::runtime;

use tokio_util::sync::CancellationToken;

use tracing::error;
use tracing::info;
use tracing::Level;

use tracing_subscriber::filter::EnvFilter;

fn main() {
    let (config, filter) = load_config();

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("unable to install log subscriber: {}", e);
        std::process::exit(1);
    }

    let runtime = runtime::Builder::new_multi_thread()
        .thread_name_fn(|| {
            static ATOMIC_ID: AtomicUsize = AtomicUsize::new(0);
            let id = ATOMIC_ID.fetch_add(1, Ordering::SeqCst);
            format!("ppk_logger-{}", id)
        })
        .enable_all()
        .build();

    let runtime = match runtime {
        Ok(r) => r,
        Err(e) => {
            error!("unable to start runtime: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run(config)) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn load_config() -> (Configuration, EnvFilter) {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        let config = match Configuration::load_from_next_arg() {
            Ok(c) => c,
            Err(e) => {
                error!("failed to load configuration file: {}", e);
                std::process::exit(1);
            }
        };

        let filter = match EnvFilter::try_from(&config) {
            Ok(f) => f,
            Err(e) => {
                error!("{}", e);
                std::process::exit(1);
            }
        };

        (config, filter)
    })
}

async fn run(config: Configuration) -> Result<()> {
    let serial =
        SerialSettings::try_from(&config.receiver).context("invalid receiver configuration")?;

    let output = &config.output;
    let paths = LogPaths::new(&output.directory(), output.prefix(), &Local::now());

    info!("Logging UBX to {}", paths.primary.display());
    info!("Logging time correlation to {}", paths.correlation.display());

    let mut settings = PipelineSettings::new(paths, config.caster.clone()).for_receiver(&serial);
    settings.status_interval = output.status_interval();

    let cancel = CancellationToken::new();
    let mut pipeline = Pipeline::new(settings);

    let exporter = match &config.prometheus {
        Some(prometheus) => {
            let registry = Registry::new();
            let metrics = Metrics::register(&registry).context("unable to register metrics")?;

            pipeline = pipeline.with_metrics(metrics);

            let exporter = Exporter::new(&prometheus.bind_address, registry)?;

            Some(exporter.start(cancel.clone()))
        }
        None => None,
    };

    tokio::spawn(stop_on_interrupt(cancel.clone()));

    let result = pipeline.run(&serial, cancel.clone()).await;

    cancel.cancel();

    if let Some(exporter) = exporter {
        if let Err(e) = exporter.await {
            error!("prometheus exporter failed: {}", e);
        }
    }

    result.context("acquisition failed")?;

    Ok(())
}

async fn stop_on_interrupt(cancel: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            info!("Stopping");
            cancel.cancel();
        }
        Err(e) => error!("unable to listen for interrupt: {}", e),
    }
}
