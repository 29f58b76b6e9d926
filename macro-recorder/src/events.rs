use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

/// Represents a mouse button by its portable name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    /// Any other button, by the host's button number
    Other(u8),
}

impl fmt::Display for MouseButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MouseButton::Left => f.write_str("left"),
            MouseButton::Right => f.write_str("right"),
            MouseButton::Middle => f.write_str("middle"),
            MouseButton::Other(code) => write!(f, "button{}", code),
        }
    }
}

impl FromStr for MouseButton {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(MouseButton::Left),
            "right" => Ok(MouseButton::Right),
            "middle" => Ok(MouseButton::Middle),
            "x1" => Ok(MouseButton::Other(1)),
            "x2" => Ok(MouseButton::Other(2)),
            other => other
                .strip_prefix("button")
                .and_then(|code| code.parse::<u8>().ok())
                .map(MouseButton::Other)
                .ok_or_else(|| format!("unknown mouse button `{}`", other)),
        }
    }
}

/// The payload of a recorded event
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    /// The pointer moved to an absolute screen position
    MouseMove { x: i32, y: i32 },

    /// A mouse button was pressed or released at a position
    MouseClick {
        x: i32,
        y: i32,
        button: MouseButton,
        pressed: bool,
    },

    /// The wheel scrolled while the pointer was at a position
    MouseScroll { x: i32, y: i32, dx: i64, dy: i64 },

    /// A key went down. `key` is a single character or a symbolic key name.
    KeyPress { key: String },

    /// A key went up
    KeyRelease { key: String },
}

/// One captured input occurrence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "EventRecord", into = "EventRecord")]
pub struct Event {
    /// Seconds since the Unix epoch at capture
    pub time: f64,

    pub kind: EventKind,
}

impl EventKind {
    pub fn key_press(key: impl Into<String>) -> Self {
        EventKind::KeyPress { key: key.into() }
    }

    pub fn key_release(key: impl Into<String>) -> Self {
        EventKind::KeyRelease { key: key.into() }
    }
}

impl Event {
    pub fn new(time: f64, kind: EventKind) -> Self {
        Self { time, kind }
    }

    /// Whether this is a mouse event
    pub fn is_mouse(&self) -> bool {
        matches!(
            self.kind,
            EventKind::MouseMove { .. }
                | EventKind::MouseClick { .. }
                | EventKind::MouseScroll { .. }
        )
    }

    /// Whether this is a keyboard event
    pub fn is_keyboard(&self) -> bool {
        !self.is_mouse()
    }
}

/// Convert a host timestamp into seconds since the Unix epoch
pub fn unix_seconds(time: SystemTime) -> f64 {
    time.duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Device {
    Mouse,
    Keyboard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Action {
    Move,
    Click,
    Scroll,
    Press,
    Release,
}

/// On-disk shape of an event: `type` and `action` discriminators, the payload
/// fields of that kind, and `time`.
#[derive(Debug, Serialize, Deserialize)]
struct EventRecord {
    #[serde(rename = "type")]
    device: Device,
    action: Action,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    x: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    y: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    button: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pressed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    dx: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    dy: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    key: Option<String>,
    time: f64,
}

impl EventRecord {
    fn empty(device: Device, action: Action, time: f64) -> Self {
        Self {
            device,
            action,
            x: None,
            y: None,
            button: None,
            pressed: None,
            dx: None,
            dy: None,
            key: None,
            time,
        }
    }
}

fn required<T>(
    value: Option<T>,
    field: &str,
    device: Device,
    action: Action,
) -> Result<T, String> {
    value.ok_or_else(|| {
        format!(
            "{:?} {:?} event is missing field `{}`",
            device, action, field
        )
        .to_lowercase()
    })
}

impl TryFrom<EventRecord> for Event {
    type Error = String;

    fn try_from(record: EventRecord) -> Result<Self, Self::Error> {
        let (device, action) = (record.device, record.action);

        let kind = match (device, action) {
            (Device::Mouse, Action::Move) => EventKind::MouseMove {
                x: required(record.x, "x", device, action)?,
                y: required(record.y, "y", device, action)?,
            },
            (Device::Mouse, Action::Click) => {
                let button = required(record.button, "button", device, action)?;
                EventKind::MouseClick {
                    x: required(record.x, "x", device, action)?,
                    y: required(record.y, "y", device, action)?,
                    button: button.parse()?,
                    pressed: required(record.pressed, "pressed", device, action)?,
                }
            }
            (Device::Mouse, Action::Scroll) => EventKind::MouseScroll {
                x: required(record.x, "x", device, action)?,
                y: required(record.y, "y", device, action)?,
                dx: required(record.dx, "dx", device, action)?,
                dy: required(record.dy, "dy", device, action)?,
            },
            (Device::Keyboard, Action::Press) => EventKind::KeyPress {
                key: required(record.key, "key", device, action)?,
            },
            (Device::Keyboard, Action::Release) => EventKind::KeyRelease {
                key: required(record.key, "key", device, action)?,
            },
            (device, action) => {
                let message = format!("{:?} events have no {:?} action", device, action);
                return Err(message.to_lowercase());
            }
        };

        Ok(Event {
            time: record.time,
            kind,
        })
    }
}

impl From<Event> for EventRecord {
    fn from(event: Event) -> Self {
        match event.kind {
            EventKind::MouseMove { x, y } => EventRecord {
                x: Some(x),
                y: Some(y),
                ..EventRecord::empty(Device::Mouse, Action::Move, event.time)
            },
            EventKind::MouseClick {
                x,
                y,
                button,
                pressed,
            } => EventRecord {
                x: Some(x),
                y: Some(y),
                button: Some(button.to_string()),
                pressed: Some(pressed),
                ..EventRecord::empty(Device::Mouse, Action::Click, event.time)
            },
            EventKind::MouseScroll { x, y, dx, dy } => EventRecord {
                x: Some(x),
                y: Some(y),
                dx: Some(dx),
                dy: Some(dy),
                ..EventRecord::empty(Device::Mouse, Action::Scroll, event.time)
            },
            EventKind::KeyPress { key } => EventRecord {
                key: Some(key),
                ..EventRecord::empty(Device::Keyboard, Action::Press, event.time)
            },
            EventKind::KeyRelease { key } => EventRecord {
                key: Some(key),
                ..EventRecord::empty(Device::Keyboard, Action::Release, event.time)
            },
        }
    }
}
