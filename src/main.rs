use clap::Parser;
use glucowatch::chart::ChartViewport;
use glucowatch::config::{AppConfig, JsonGuiStateRepository};
use glucowatch::device::{LogCompanionSync, LogDisplayControl};
use glucowatch::sources::SimulatedCache;
use glucowatch::ui::{spawn_stdin_reader, TerminalView, ThresholdColors};
use glucowatch::{MainController, Services};
use glucowatch_audio::AlarmSound;
use glucowatch_core::{GuiStateRepository, SilentSound, SoundPlayer, ThresholdAlarmRule};
use log::{error, info, warn};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

/// glucowatch - continuous glucose monitor main screen in the terminal
#[derive(Parser, Debug, Clone)]
#[command(name = "glucowatch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Debug verbosity level (0=quiet, 1=info, 2=debug, 3=trace)
    #[arg(short = 'd', long = "debug", value_name = "LEVEL", default_value = "0")]
    debug: u8,

    /// Config file to use instead of the default location
    #[arg(short = 'c', long = "config", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Never play the alarm sound
    #[arg(long = "no-sound")]
    no_sound: bool,

    /// Make every Nth fresh reading load fail, to exercise the error banner
    #[arg(long = "fail-every", value_name = "N")]
    fail_every: Option<u32>,

    /// Exit after N poll cycles
    #[arg(long = "ticks", value_name = "N")]
    ticks: Option<u64>,
}

fn main() {
    let cli = Cli::parse();

    // Level 0 (default): warn only
    // Level 1: info
    // Level 2: debug
    // Level 3+: trace
    let log_level = match cli.debug {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    // Allow RUST_LOG to override CLI setting
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    info!("Starting glucowatch v{}", env!("CARGO_PKG_VERSION"));

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            std::process::exit(1);
        }
    };

    let result = rt.block_on(run(cli));
    // A pending stdin read would block a regular runtime shutdown
    rt.shutdown_background();

    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<(AppConfig, PathBuf)> {
    match &cli.config {
        Some(path) => {
            let config = AppConfig::load_from_path(path)?;
            let dir = path
                .parent()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."));
            Ok((config, dir))
        }
        None => Ok((AppConfig::load()?, AppConfig::config_dir()?)),
    }
}

fn alarm_sound(cli: &Cli, config: &AppConfig) -> Arc<dyn SoundPlayer> {
    if cli.no_sound || !config.sound.enabled {
        info!("Alarm sound disabled");
        return Arc::new(SilentSound::default());
    }
    match AlarmSound::spawn(config.sound.clone()) {
        Ok(sound) => Arc::new(sound),
        Err(e) => {
            warn!("No alarm audio available, continuing silently: {:#}", e);
            Arc::new(SilentSound::default())
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let (mut config, state_dir) = load_config(&cli)?;
    if let Some(fail_every) = cli.fail_every {
        config.simulation.fail_every = fail_every;
    }

    let settings = Arc::new(JsonGuiStateRepository::open(state_dir.join("gui_state.json"))?);
    info!("GUI state at {}", settings.path().display());

    let services = Services {
        cache: Arc::new(SimulatedCache::new(config.simulation.clone(), settings.units())),
        alarm_rule: Arc::new(ThresholdAlarmRule::new(config.alarm.clone())),
        sound: alarm_sound(&cli, &config),
        settings,
        companion: Arc::new(LogCompanionSync),
        display: Arc::new(LogDisplayControl::default()),
        colors: Arc::new(ThresholdColors::new(config.alarm.clone())),
    };

    let mut controller_config = config.controller_config();
    controller_config.max_ticks = cli.ticks;

    let controller = MainController::new(
        services,
        controller_config,
        Box::new(ChartViewport::new(config.chart.view_width)),
        Box::new(TerminalView::new(std::io::stdout().is_terminal())),
    );

    let (tx, rx) = mpsc::channel(32);
    let _reader = spawn_stdin_reader(tx);

    controller.run(rx).await?;
    info!("glucowatch stopped");
    Ok(())
}
