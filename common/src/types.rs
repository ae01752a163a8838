use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnOff {
    Off,
    On,
}

impl OnOff {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::On => "on",
        }
    }

    pub fn code(self) -> i64 {
        match self {
            Self::Off => 0,
            Self::On => 1,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Off),
            1 => Some(Self::On),
            _ => None,
        }
    }

    pub fn parse(token: &str) -> Option<Self> {
        match token.trim() {
            "off" => Some(Self::Off),
            "on" => Some(Self::On),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activity {
    None,
    Wake,
    Away,
    Home,
    Sleep,
}

impl Activity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Wake => "wake",
            Self::Away => "away",
            Self::Home => "home",
            Self::Sleep => "sleep",
        }
    }

    pub fn code(self) -> i64 {
        match self {
            Self::None => 0,
            Self::Wake => 1,
            Self::Away => 2,
            Self::Home => 3,
            Self::Sleep => 4,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::None),
            1 => Some(Self::Wake),
            2 => Some(Self::Away),
            3 => Some(Self::Home),
            4 => Some(Self::Sleep),
            _ => None,
        }
    }

    pub fn parse(token: &str) -> Option<Self> {
        match token.trim() {
            "none" => Some(Self::None),
            "wake" => Some(Self::Wake),
            "away" => Some(Self::Away),
            "home" => Some(Self::Home),
            "sleep" => Some(Self::Sleep),
            _ => None,
        }
    }
}

/// The five mirrored fields, in write-back order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    RunState,
    Hold,
    Activity,
    Temperature,
    Humidity,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::RunState,
        Field::Hold,
        Field::Activity,
        Field::Temperature,
        Field::Humidity,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::RunState => "run_state",
            Self::Hold => "hold",
            Self::Activity => "activity",
            Self::Temperature => "temperature",
            Self::Humidity => "humidity",
        }
    }

    pub fn offset(self) -> u16 {
        match self {
            Self::RunState => 0,
            Self::Hold => 2,
            Self::Activity => 4,
            Self::Temperature => 6,
            Self::Humidity => 8,
        }
    }

    pub fn is_mode(self) -> bool {
        matches!(self, Self::RunState | Self::Hold | Self::Activity)
    }

    pub fn slot(self, zone_index: u16) -> VarSlot {
        VarSlot(zone_index.saturating_add(self.offset()))
    }
}

/// Zero-based position of an integer variable in the controller's bulk listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct VarSlot(pub u16);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VarKind {
    Integer,
    State,
}

impl VarKind {
    pub fn code(self) -> u8 {
        match self {
            Self::Integer => 1,
            Self::State => 2,
        }
    }
}

/// A controller variable as addressed on the wire: kind plus one-based id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarAddress {
    pub kind: VarKind,
    pub id: u16,
}

impl VarAddress {
    pub const fn integer(id: u16) -> Self {
        Self {
            kind: VarKind::Integer,
            id,
        }
    }

    pub const fn state(id: u16) -> Self {
        Self {
            kind: VarKind::State,
            id,
        }
    }

    pub fn for_slot(slot: VarSlot) -> Option<Self> {
        slot.0.checked_add(1).map(Self::integer)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ZoneStatus {
    pub run_state: OnOff,
    pub hold: OnOff,
    pub activity: Activity,
    pub temperature: f64,
    pub humidity: f64,
}

impl ZoneStatus {
    /// Integer form of a field as stored by the controller. Sensor readings truncate.
    pub fn encoded(&self, field: Field) -> i64 {
        match field {
            Field::RunState => self.run_state.code(),
            Field::Hold => self.hold.code(),
            Field::Activity => self.activity.code(),
            Field::Temperature => self.temperature.trunc() as i64,
            Field::Humidity => self.humidity.trunc() as i64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MirroredVars {
    pub run_state: i64,
    pub hold: i64,
    pub activity: i64,
    pub temperature: i64,
    pub humidity: i64,
}

impl MirroredVars {
    pub fn get(&self, field: Field) -> i64 {
        match field {
            Field::RunState => self.run_state,
            Field::Hold => self.hold,
            Field::Activity => self.activity,
            Field::Temperature => self.temperature,
            Field::Humidity => self.humidity,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChangeVector {
    pub run_state: bool,
    pub hold: bool,
    pub activity: bool,
    pub temperature: bool,
    pub humidity: bool,
}

impl ChangeVector {
    pub fn get(&self, field: Field) -> bool {
        match field {
            Field::RunState => self.run_state,
            Field::Hold => self.hold,
            Field::Activity => self.activity,
            Field::Temperature => self.temperature,
            Field::Humidity => self.humidity,
        }
    }

    pub fn any_changed(&self) -> bool {
        Field::ALL.iter().any(|field| self.get(*field))
    }

    pub fn mode_changed(&self) -> bool {
        self.run_state || self.hold || self.activity
    }

    pub fn changed_fields(&self) -> impl Iterator<Item = Field> + '_ {
        Field::ALL.into_iter().filter(|field| self.get(*field))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TempStatus {
    Hi,
    Lo,
    Ok,
}

impl TempStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hi => "hi",
            Self::Lo => "lo",
            Self::Ok => "ok",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HeartbeatState {
    #[default]
    Set,
    Clear,
}

impl HeartbeatState {
    pub fn toggled(self) -> Self {
        match self {
            Self::Set => Self::Clear,
            Self::Clear => Self::Set,
        }
    }

    pub fn value(self) -> i64 {
        match self {
            Self::Set => 1,
            Self::Clear => 0,
        }
    }

    pub fn marker(self) -> char {
        match self {
            Self::Set => '*',
            Self::Clear => ' ',
        }
    }
}
