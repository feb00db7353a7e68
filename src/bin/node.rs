//! Pin-controller node binary.
//!
//! Runs on both ESP32 and host platforms:
//! - **Host**: `cargo run --bin node` (OS networking, credentials in
//!   `~/.pin-controller-esp32/networks.json`)
//! - **ESP32**: `cargo espflash flash --bin node --features esp32 --release`
//!
//! ## Endpoints
//!
//! - `GET/POST/DELETE /networks`, `POST /connect`, `GET /status`, `GET /log`
//!   on port 8080 (host) or 80 (ESP32)
//!
//! ## Threads
//!
//! - `api-server` - HTTP requests
//! - `wifi-retry` - link check and reconnection every retry interval
//! - main - status LED

use log::{error, info};
use pin_controller_esp32::config::DeviceConfig;
use pin_controller_esp32::wifi::{CredentialStorage, RetryTicker, WifiRadio};
use pin_controller_esp32::{
    ApiServer, ConnectionManager, LogBuffer, SharedBlinkInterval, SharedManager, StatusLed,
};
use std::time::{Duration, Instant};

/// Status LED refresh period.
const LED_TICK: Duration = Duration::from_millis(10);

/// Interval between heartbeat log lines.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(60);

// ESP32: Initialize ESP-IDF before anything else
#[cfg(feature = "esp32")]
fn platform_init() {
    esp_idf_sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();
    info!("ESP-IDF initialized");
}

// Host: Just initialize env_logger
#[cfg(not(feature = "esp32"))]
fn platform_init() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

/// Running connectivity services. Dropping stops the threads.
struct Services<R: WifiRadio + 'static> {
    manager: SharedManager<R>,
    _api: ApiServer,
    _ticker: RetryTicker,
}

/// Initialize the manager, then start the API server and retry ticker.
fn start_services<R: WifiRadio + 'static>(
    config: DeviceConfig,
    radio: R,
    storage: Box<dyn CredentialStorage>,
    indicator: SharedBlinkInterval,
    log: LogBuffer,
) -> Result<Services<R>, std::io::Error> {
    let port = config.listen_port;
    let retry_interval = config.retry_interval;

    let mut manager = ConnectionManager::new(
        config,
        radio,
        storage,
        Box::new(indicator),
        Box::new(log.clone()),
    );
    let mode = manager.initialize();
    info!("Connectivity initialized: {}", mode);

    let manager = manager.into_shared();
    let api = ApiServer::start(None, port, manager.clone(), log)?;
    let ticker = RetryTicker::start(manager.clone(), retry_interval)?;

    Ok(Services {
        manager,
        _api: api,
        _ticker: ticker,
    })
}

/// Drive the status LED until `set_level` fails, logging a heartbeat
/// every minute.
fn led_loop<R: WifiRadio + 'static, E>(
    services: &Services<R>,
    indicator: SharedBlinkInterval,
    mut set_level: impl FnMut(bool) -> Result<(), E>,
) -> Result<(), E> {
    let mut led = StatusLed::new(indicator);
    let started = Instant::now();
    let mut next_heartbeat = started + HEARTBEAT_INTERVAL;
    loop {
        set_level(led.update(started.elapsed().as_millis() as u64))?;

        if Instant::now() >= next_heartbeat {
            next_heartbeat += HEARTBEAT_INTERVAL;
            if let Ok(manager) = services.manager.lock() {
                info!("Heartbeat: {}", manager.mode());
            }
        }
        std::thread::sleep(LED_TICK);
    }
}

#[cfg(feature = "esp32")]
fn run() -> Result<(), Box<dyn std::error::Error>> {
    use esp_idf_hal::gpio::PinDriver;
    use esp_idf_hal::peripherals::Peripherals;
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::nvs::EspDefaultNvsPartition;
    use pin_controller_esp32::wifi::{EspRadio, NvsStorage};

    let config = DeviceConfig::default();
    config.validate()?;

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs_partition = EspDefaultNvsPartition::take()?;

    let radio = EspRadio::new(peripherals.modem, sysloop, Some(nvs_partition.clone()))?;
    let storage = NvsStorage::new(nvs_partition)?;

    let indicator = SharedBlinkInterval::new();
    let services = start_services(
        config,
        radio,
        Box::new(storage),
        indicator.clone(),
        LogBuffer::new(),
    )?;

    // Status LED on GPIO2
    let mut pin = PinDriver::output(peripherals.pins.gpio2)?;
    led_loop(&services, indicator, |on| {
        if on {
            pin.set_high()
        } else {
            pin.set_low()
        }
    })?;
    Ok(())
}

#[cfg(not(feature = "esp32"))]
fn run() -> Result<(), Box<dyn std::error::Error>> {
    use pin_controller_esp32::wifi::HostRadio;
    use pin_controller_esp32::FileStorage;

    let config = DeviceConfig::default();
    config.validate()?;

    let storage = FileStorage::at_default_path()?;
    info!("Network store: {:?}", storage.path());

    let indicator = SharedBlinkInterval::new();
    let services = start_services(
        config,
        HostRadio::new(),
        Box::new(storage),
        indicator.clone(),
        LogBuffer::new(),
    )?;

    // No LED on host; trace level changes instead.
    let mut last_level = None;
    led_loop(&services, indicator, |on| {
        if last_level != Some(on) {
            log::trace!("Status LED {}", if on { "on" } else { "off" });
            last_level = Some(on);
        }
        Ok::<(), std::convert::Infallible>(())
    })?;
    Ok(())
}

fn main() {
    platform_init();
    info!("=== Pin controller starting ===");

    if let Err(e) = run() {
        error!("Fatal: {}", e);
        std::process::exit(1);
    }
}
