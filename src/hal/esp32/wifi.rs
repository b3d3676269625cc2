//! Soft access point for the bridge control network.
//!
//! The controller hosts its own Wi-Fi network; operators join it and reach
//! the HTTP API and UDP port at the access point address (192.168.71.1 by
//! default in ESP-IDF).
//!
//! # Example
//!
//! ```ignore
//! use rs_drawbridge::hal::esp32::Esp32AccessPoint;
//! use rs_drawbridge::config::WifiConfig;
//!
//! let ap = Esp32AccessPoint::new(modem, sysloop, nvs, &WifiConfig::default())?;
//! log::info!("AP up at {:?}", ap.ip_addr());
//! ```

use anyhow::anyhow;
use esp_idf_hal::modem::Modem;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{AccessPointConfiguration, AuthMethod, BlockingWifi, Configuration, EspWifi};
use std::net::Ipv4Addr;

use crate::config::WifiConfig;

/// Running soft access point.
///
/// The network stays up for the lifetime of this struct.
pub struct Esp32AccessPoint<'a> {
    wifi: BlockingWifi<EspWifi<'a>>,
}

impl<'a> Esp32AccessPoint<'a> {
    /// Start the access point described by `config`.
    ///
    /// An empty password gives an open network; otherwise WPA2-Personal.
    ///
    /// # Errors
    ///
    /// Returns an error if the SSID or password does not fit the driver's
    /// limits, or if the driver fails to start.
    pub fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: Option<EspDefaultNvsPartition>,
        config: &WifiConfig,
    ) -> anyhow::Result<Self> {
        let esp_wifi = EspWifi::new(modem, sysloop.clone(), nvs)?;
        let mut wifi = BlockingWifi::wrap(esp_wifi, sysloop)?;

        let auth_method = if config.is_secured() {
            AuthMethod::WPA2Personal
        } else {
            AuthMethod::None
        };

        wifi.set_configuration(&Configuration::AccessPoint(AccessPointConfiguration {
            ssid: config
                .ssid
                .as_str()
                .try_into()
                .map_err(|_| anyhow!("ssid too long: {}", config.ssid))?,
            password: config
                .password
                .as_str()
                .try_into()
                .map_err(|_| anyhow!("wifi password too long"))?,
            channel: config.channel,
            max_connections: config.max_connections,
            auth_method,
            ..Default::default()
        }))?;

        log::info!("starting access point '{}'", config.ssid);
        wifi.start()?;
        wifi.wait_netif_up()?;

        let ap = Self { wifi };
        if let Some(ip) = ap.ip_addr() {
            log::info!("access point up, address {}", ip);
        }
        Ok(ap)
    }

    /// Address of the access point interface.
    pub fn ip_addr(&self) -> Option<Ipv4Addr> {
        self.wifi
            .wifi()
            .ap_netif()
            .get_ip_info()
            .ok()
            .map(|info| info.ip)
    }

    /// Stop the access point.
    pub fn stop(&mut self) -> anyhow::Result<()> {
        self.wifi.stop()?;
        Ok(())
    }
}
