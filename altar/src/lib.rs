//! Altar - scheduling broker for Awtrix pixel clocks
//!
//! Altar polls a set of independently scheduled routines, merges the global
//! display settings they ask for, and pushes their payloads to one Awtrix
//! device over HTTP.
//!
//! # Modules
//!
//! - [`awtrix`] - Device settings and payload types
//! - [`routine`] - The routine capability and the stock app/notifier routines
//! - [`device`] - HTTP transport seam and device gateway
//! - [`broker`] - The poll/merge/push cycle
//! - [`admin`] - Admin command server and client
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod admin;
pub mod awtrix;
pub mod broker;
pub mod cli;
pub mod config;
pub mod device;
pub mod routine;

pub use awtrix::{AppData, DisplayConfig, NotificationData, Overlay};
pub use broker::{Broker, BrokerError, CycleReport};
pub use config::Config;
pub use device::{DeviceGateway, Transport};
pub use routine::{Application, Fetcher, Notifier, Routine, WidgetState};
