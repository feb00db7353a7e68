//! Seed a known network without going through the HTTP API.
//!
//! Usage:
//!   WIFI_SSID="MyNetwork" WIFI_PASSWORD="secret" cargo run --bin configure-wifi
//!
//! The SSID and password are read at compile time. The network is stored as
//! the default, in NVS on ESP32 (build with `--features esp32`) or in
//! `~/.pin-controller-esp32/networks.json` on host. Existing networks are kept.

use pin_controller_esp32::config::{ConfigError, NetworkCredential};
use pin_controller_esp32::wifi::{CredentialStorage, NetworkStore};

/// WiFi SSID - set via WIFI_SSID environment variable at compile time.
const WIFI_SSID: Option<&str> = option_env!("WIFI_SSID");

/// WiFi password - set via WIFI_PASSWORD environment variable at compile time.
/// Empty string for open networks.
const WIFI_PASSWORD: Option<&str> = option_env!("WIFI_PASSWORD");

/// Print error message and exit. On ESP32, pause briefly first so the serial
/// monitor shows the output.
fn halt_with_error(msg: &str) -> ! {
    eprintln!("\n{}", msg);
    eprintln!("\n=== Configuration failed ===\n");
    #[cfg(feature = "esp32")]
    std::thread::sleep(std::time::Duration::from_secs(2));
    std::process::exit(1);
}

#[cfg(feature = "esp32")]
fn open_storage() -> Result<Box<dyn CredentialStorage>, String> {
    use esp_idf_svc::nvs::EspDefaultNvsPartition;
    use pin_controller_esp32::wifi::NvsStorage;

    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    let partition =
        EspDefaultNvsPartition::take().map_err(|e| format!("Error initializing NVS: {:?}", e))?;
    let storage =
        NvsStorage::new(partition).map_err(|e| format!("Error opening NVS: {:?}", e))?;
    Ok(Box::new(storage))
}

#[cfg(not(feature = "esp32"))]
fn open_storage() -> Result<Box<dyn CredentialStorage>, String> {
    use pin_controller_esp32::FileStorage;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let storage = FileStorage::at_default_path()
        .map_err(|e| format!("Error locating network store: {}", e))?;
    println!("Store: {}", storage.path().display());
    Ok(Box::new(storage))
}

fn main() {
    println!("\n=== WiFi Configuration Utility ===\n");

    let ssid = match WIFI_SSID {
        Some(s) if !s.is_empty() => s,
        _ => {
            halt_with_error(
                "Error: WIFI_SSID environment variable not set at compile time.\n\n\
                 Usage:\n  \
                 WIFI_SSID=\"MyNetwork\" WIFI_PASSWORD=\"secret\" cargo run --bin configure-wifi\n\n\
                 For open networks:\n  \
                 WIFI_SSID=\"OpenNetwork\" WIFI_PASSWORD=\"\" cargo run --bin configure-wifi",
            );
        }
    };

    let password = WIFI_PASSWORD.unwrap_or("");

    println!("SSID: {}", ssid);
    println!(
        "Password: {} ({} chars)",
        if password.is_empty() {
            "(none)"
        } else {
            "****"
        },
        password.len()
    );

    let credential = match NetworkCredential::new(ssid, password, true) {
        Ok(credential) => credential,
        Err(ConfigError::SsidTooLong { len, max }) => {
            halt_with_error(&format!(
                "Error: SSID too long ({} bytes, max {})",
                len, max
            ));
        }
        Err(ConfigError::PasswordTooLong { len, max }) => {
            halt_with_error(&format!(
                "Error: Password too long ({} bytes, max {})",
                len, max
            ));
        }
        Err(e) => halt_with_error(&format!("Error: {}", e)),
    };

    let storage = open_storage().unwrap_or_else(|msg| halt_with_error(&msg));
    let mut store = NetworkStore::new(storage);
    match store.load() {
        Ok(count) => println!("{} network(s) already stored", count),
        Err(e) => println!("Existing store unreadable ({}), starting fresh", e),
    }

    if let Err(e) = store.upsert(credential) {
        halt_with_error(&format!("Error saving network: {}", e));
    }

    println!("\n=== {} saved as default network ===", ssid);
    for network in store.list() {
        println!(
            "  {}{}",
            network.ssid,
            if network.is_default { " (default)" } else { "" }
        );
    }
    println!("\nThe device joins this network on next boot.\n");
}
