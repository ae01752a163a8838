use serde::Serialize;

use crate::{
    topics::{EVENT_FIRST_RUN, EVENT_MODE_CHANGE, EVENT_TEMPERATURE},
    types::{TempStatus, ZoneStatus},
};

/// Priority attached to informational notices. Alarms go out with the service default.
pub const LOW_PRIORITY: i8 = -2;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub event: String,
    pub description: String,
    pub priority: Option<i8>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempBounds {
    pub lower: f64,
    pub upper: f64,
}

/// Readings exactly on a bound are still `ok`.
pub fn classify(temp: f64, bounds: TempBounds) -> TempStatus {
    if temp > bounds.upper {
        TempStatus::Hi
    } else if temp < bounds.lower {
        TempStatus::Lo
    } else {
        TempStatus::Ok
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeLabel {
    FirstRun,
    ModeChange,
}

impl ModeLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FirstRun => EVENT_FIRST_RUN,
            Self::ModeChange => EVENT_MODE_CHANGE,
        }
    }
}

/// What the last notices said. Owned by the scheduler for the life of the process.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NotificationState {
    last_mode_notice: Option<ModeLabel>,
    last_temp_status: Option<TempStatus>,
}

impl NotificationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_mode_notice(&self) -> Option<ModeLabel> {
        self.last_mode_notice
    }

    pub fn last_temp_status(&self) -> Option<TempStatus> {
        self.last_temp_status
    }

    /// Always produces a notice; the caller decides whether a mode change warrants one.
    /// Controller-initiated changes (`update_requested`) go out at low priority.
    pub fn mode_notice(&mut self, status: &ZoneStatus, update_requested: bool) -> Notice {
        let label = match self.last_mode_notice {
            None => ModeLabel::FirstRun,
            Some(_) => ModeLabel::ModeChange,
        };
        self.last_mode_notice = Some(label);

        Notice {
            event: label.as_str().to_string(),
            description: format!(
                "currAct:{} hold:{} vac:{}",
                status.activity.as_str(),
                status.hold.as_str(),
                status.run_state.as_str()
            ),
            priority: update_requested.then_some(LOW_PRIORITY),
        }
    }

    /// Fires when the classification moved since the last cycle, or when forced.
    pub fn temp_notice(
        &mut self,
        status: &ZoneStatus,
        bounds: TempBounds,
        force: bool,
    ) -> Option<Notice> {
        let current = classify(status.temperature, bounds);
        if !force && self.last_temp_status == Some(current) {
            return None;
        }
        self.last_temp_status = Some(current);

        Some(Notice {
            event: EVENT_TEMPERATURE.to_string(),
            description: format!(
                " *** {} {:.1} ***  rh {:.1}",
                current.as_str(),
                status.temperature,
                status.humidity
            ),
            priority: (current == TempStatus::Ok).then_some(LOW_PRIORITY),
        })
    }
}
