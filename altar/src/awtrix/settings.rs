//! Global display settings
//!
//! See <https://blueforcer.github.io/awtrix3/#/api?id=json-properties-1>

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Global configuration the broker can apply to an Awtrix device
///
/// Every field is optional. An unset field is left out of the JSON body so
/// the device keeps whatever value it already has, which is different from
/// explicitly sending `false`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Built-in time app
    #[serde(rename = "TIM", default, skip_serializing_if = "Option::is_none")]
    pub time_app: Option<bool>,

    /// Built-in weekday app
    #[serde(rename = "WD", default, skip_serializing_if = "Option::is_none")]
    pub weekday_app: Option<bool>,

    /// Built-in date app
    #[serde(rename = "DAT", default, skip_serializing_if = "Option::is_none")]
    pub date_app: Option<bool>,

    /// Built-in humidity app
    #[serde(rename = "HUM", default, skip_serializing_if = "Option::is_none")]
    pub humidity_app: Option<bool>,

    /// Built-in temperature app
    #[serde(rename = "TEMP", default, skip_serializing_if = "Option::is_none")]
    pub temperature_app: Option<bool>,

    /// Built-in battery app
    #[serde(rename = "BAT", default, skip_serializing_if = "Option::is_none")]
    pub battery_app: Option<bool>,

    /// Effect drawn over every app
    #[serde(rename = "OVERLAY", default, skip_serializing_if = "Option::is_none")]
    pub overlay: Option<Overlay>,

    /// Transition effect, bumped on every settings push so the device re-renders
    #[serde(rename = "TEFF", default, skip_serializing_if = "Option::is_none")]
    pub transition_effect: Option<u32>,
}

impl DisplayConfig {
    /// Fold a requested delta into this configuration
    ///
    /// Fields set in `delta` overwrite ours, fields unset in `delta` keep our
    /// current value. The transition effect belongs to the broker and is never
    /// taken from a delta.
    pub fn merge(&mut self, delta: &DisplayConfig) {
        self.time_app = delta.time_app.or(self.time_app);
        self.weekday_app = delta.weekday_app.or(self.weekday_app);
        self.date_app = delta.date_app.or(self.date_app);
        self.humidity_app = delta.humidity_app.or(self.humidity_app);
        self.temperature_app = delta.temperature_app.or(self.temperature_app);
        self.battery_app = delta.battery_app.or(self.battery_app);
        self.overlay = delta.overlay.or(self.overlay);
    }

    /// Move to the next transition effect, starting at 0
    pub fn advance_transition_effect(&mut self) -> u32 {
        let next = match self.transition_effect {
            Some(current) => current.wrapping_add(1),
            None => 0,
        };
        debug!(next, "DisplayConfig::advance_transition_effect: called");
        self.transition_effect = Some(next);
        next
    }

    fn set_default_app(&mut self, app: DefaultApp, enabled: bool) {
        let slot = match app {
            DefaultApp::Time => &mut self.time_app,
            DefaultApp::Weekday => &mut self.weekday_app,
            DefaultApp::Date => &mut self.date_app,
            DefaultApp::Humidity => &mut self.humidity_app,
            DefaultApp::Temperature => &mut self.temperature_app,
            DefaultApp::Battery => &mut self.battery_app,
        };
        *slot = Some(enabled);
    }
}

/// Overlay effects supported by the firmware
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Overlay {
    /// Removes any previously applied overlay
    Clear,
    Snow,
    Rain,
    Drizzle,
    Storm,
    Thunder,
    Frost,
}

/// The firmware's built-in apps that can be switched off
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefaultApp {
    Time,
    Weekday,
    Date,
    Humidity,
    Temperature,
    Battery,
}

impl DefaultApp {
    pub const ALL: [DefaultApp; 6] = [
        DefaultApp::Time,
        DefaultApp::Weekday,
        DefaultApp::Date,
        DefaultApp::Humidity,
        DefaultApp::Temperature,
        DefaultApp::Battery,
    ];
}

/// A mutation applied to the broker's initial display configuration
pub type ConfigOption = Box<dyn Fn(&mut DisplayConfig) + Send + Sync>;

/// Disable one of the firmware's built-in apps on startup
pub fn disable_default_app(app: DefaultApp) -> ConfigOption {
    Box::new(move |cfg: &mut DisplayConfig| cfg.set_default_app(app, false))
}

/// Disable every built-in app on startup
pub fn disable_all_default_apps() -> ConfigOption {
    Box::new(|cfg: &mut DisplayConfig| {
        for app in DefaultApp::ALL {
            cfg.set_default_app(app, false);
        }
    })
}

/// Start with the given global overlay
pub fn with_overlay(overlay: Overlay) -> ConfigOption {
    Box::new(move |cfg: &mut DisplayConfig| cfg.overlay = Some(overlay))
}
