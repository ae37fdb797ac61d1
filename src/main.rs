use anyhow::{bail, Context, Result};
use chrono::Local;
use tracing::info;

use uhi_mapper::backend::HttpBackendClient;
use uhi_mapper::basemap::{BaseMap, JsonPreferences, MemoryPreferences, PreferenceStore};
use uhi_mapper::config::MapperConfig;
use uhi_mapper::layers::HeadlessMap;
use uhi_mapper::Session;

const USAGE: &str = "usage: uhi-mapper <heat [START END] | mitigation | basemap NAME>";

#[tokio::main]
async fn main() -> Result<()> {
    uhi_mapper::init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config_path = std::env::var_os("UHI_MAPPER_CONFIG").map(std::path::PathBuf::from);
    let config = MapperConfig::load(config_path.as_deref())?;
    info!("Using backend at {}", config.backend_url);

    let backend = HttpBackendClient::from_config(&config)?;
    match config.preferences_path() {
        Some(path) => {
            let prefs = JsonPreferences::open(&path)
                .with_context(|| format!("opening preferences at {:?}", path))?;
            run(&args, &config, backend, prefs).await
        }
        None => run(&args, &config, backend, MemoryPreferences::default()).await,
    }
}

async fn run<P: PreferenceStore>(
    args: &[String],
    config: &MapperConfig,
    backend: HttpBackendClient,
    prefs: P,
) -> Result<()> {
    let today = Local::now().date_naive();
    let mut session = Session::open(HeadlessMap::new(), backend, prefs, config, today);

    match args.first().map(String::as_str) {
        Some("heat") => {
            let default = session.controller().state().default_range();
            let start = args.get(1).cloned().unwrap_or_else(|| default.start_param());
            let end = args.get(2).cloned().unwrap_or_else(|| default.end_param());
            session.load_heat_data(&start, &end).await;
        }
        Some("mitigation") => session.load_mitigation().await,
        Some("basemap") => {
            let name = args.get(1).context(USAGE)?;
            let base: BaseMap = name.parse()?;
            session.select_base_map(base)?;
        }
        _ => bail!(USAGE),
    }

    println!("phase: {:?}", session.controller().phase());
    println!("base map: {} ({})", session.base_map(), session.base_map().tile_url());
    for (handle, layer) in session.map().layers() {
        println!("layer {}: {}", handle, layer.summary());
    }
    if let Some(viewport) = session.map().viewport() {
        println!(
            "viewport: S{:.4} W{:.4} N{:.4} E{:.4}",
            viewport.south, viewport.west, viewport.north, viewport.east
        );
    }
    for (kind, message) in session.visible_notices() {
        println!("[{:?}] {}", kind, message);
    }
    Ok(())
}
