//! Custom app and notification payloads
//!
//! Field reference: <https://blueforcer.github.io/awtrix3/#/api?id=json-properties>

use serde::{Deserialize, Serialize};

use super::settings::Overlay;
use crate::routine::RoutineKind;

/// Data a routine renders for the device
///
/// The associated kind decides which endpoint the payload is posted to.
pub trait Payload: Serialize + Clone + Default + Send + Sync + 'static {
    const KIND: RoutineKind;
}

/// Text shown by an app or notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Text {
    Plain(String),
    /// Segments drawn in their own colours, left to right
    Fragments(Vec<TextFragment>),
}

impl From<&str> for Text {
    fn from(text: &str) -> Self {
        Text::Plain(text.to_string())
    }
}

impl From<String> for Text {
    fn from(text: String) -> Self {
        Text::Plain(text)
    }
}

impl From<Vec<TextFragment>> for Text {
    fn from(fragments: Vec<TextFragment>) -> Self {
        Text::Fragments(fragments)
    }
}

/// One coloured piece of text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextFragment {
    #[serde(rename = "t")]
    pub text: String,

    /// Hex colour, e.g. `#3396FF`
    #[serde(rename = "c")]
    pub colour: String,
}

impl TextFragment {
    pub fn new(text: impl Into<String>, colour: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            colour: colour.into(),
        }
    }
}

/// Payload of a custom app (`/api/custom`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<Text>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_case: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_text: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_offset: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<[u8; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gradient: Option<[[u8; 3]; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blink_text: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fade_text: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<[u8; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rainbow: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push_icon: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat: Option<i32>,
    /// Seconds the app stays on screen
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bar: Option<Vec<i32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<Vec<i32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autoscale: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos: Option<u32>,
    /// Seconds without an update before the device drops the app
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifetime: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifetime_mode: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_scroll: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scroll_speed: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub save: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlay: Option<Overlay>,
}

impl Payload for AppData {
    const KIND: RoutineKind = RoutineKind::CustomApp;
}

/// Payload of a one-off notification (`/api/notify`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<Text>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_case: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_text: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<[u8; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<[u8; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rainbow: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    /// Keep the notification until it is dismissed on the device
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hold: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rtttl: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loop_sound: Option<bool>,
    /// Queue behind other notifications instead of replacing them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<bool>,
    /// Turn the matrix on if it is asleep
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wakeup: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_scroll: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clients: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scroll_speed: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlay: Option<Overlay>,
}

impl Payload for NotificationData {
    const KIND: RoutineKind = RoutineKind::Notification;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_data_only_serializes_set_fields() {
        let data = AppData {
            text: Some("Hello, World!".into()),
            ..Default::default()
        };
        assert_eq!(serde_json::to_string(&data).unwrap(), r#"{"text":"Hello, World!"}"#);
    }

    #[test]
    fn test_app_data_camel_case_keys() {
        let data = AppData {
            scroll_speed: Some(50),
            lifetime_mode: Some(1),
            no_scroll: Some(true),
            ..Default::default()
        };
        let json = serde_json::to_string(&data).unwrap();
        assert_eq!(json, r#"{"lifetimeMode":1,"noScroll":true,"scrollSpeed":50}"#);
    }

    #[test]
    fn test_fragment_text_serialization() {
        let data = AppData {
            text: Some(Text::from(vec![
                TextFragment::new("40% ", "#3396FF"),
                TextFragment::new("in 2 hours", "#FFFFFF"),
            ])),
            ..Default::default()
        };
        let json = serde_json::to_string(&data).unwrap();
        assert_eq!(
            json,
            r##"{"text":[{"t":"40% ","c":"#3396FF"},{"t":"in 2 hours","c":"#FFFFFF"}]}"##
        );
    }

    #[test]
    fn test_text_deserializes_both_shapes() {
        let plain: Text = serde_json::from_str(r#""sunny week""#).unwrap();
        assert_eq!(plain, Text::Plain("sunny week".to_string()));

        let fragments: Text = serde_json::from_str(r##"[{"t":"a","c":"#000000"}]"##).unwrap();
        assert_eq!(fragments, Text::Fragments(vec![TextFragment::new("a", "#000000")]));
    }

    #[test]
    fn test_notification_data_with_overlay() {
        let data = NotificationData {
            text: Some("octocat starred altar".into()),
            overlay: Some(Overlay::Rain),
            stack: Some(false),
            ..Default::default()
        };
        let json = serde_json::to_string(&data).unwrap();
        assert_eq!(json, r#"{"text":"octocat starred altar","stack":false,"overlay":"rain"}"#);
    }

    #[test]
    fn test_payload_kinds() {
        assert_eq!(AppData::KIND, RoutineKind::CustomApp);
        assert_eq!(NotificationData::KIND, RoutineKind::Notification);
    }
}
