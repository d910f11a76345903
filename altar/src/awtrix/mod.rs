//! Awtrix device data model
//!
//! Types that mirror the JSON accepted by the Awtrix 3 firmware: the global
//! settings object posted to `/api/settings` and the payloads posted to
//! `/api/custom` and `/api/notify`.

mod payload;
mod settings;

pub use payload::{AppData, NotificationData, Payload, Text, TextFragment};
pub use settings::{
    ConfigOption, DefaultApp, DisplayConfig, Overlay, disable_all_default_apps, disable_default_app, with_overlay,
};
