use crate::types::{ChangeVector, MirroredVars, ZoneStatus};

/// Compares each status field against its mirrored integer. Sensor readings are compared
/// exactly, so a fractional reading never matches until the mirror holds the same value.
pub fn diff(status: &ZoneStatus, vars: &MirroredVars) -> ChangeVector {
    ChangeVector {
        run_state: status.run_state.code() != vars.run_state,
        hold: status.hold.code() != vars.hold,
        activity: status.activity.code() != vars.activity,
        temperature: status.temperature != vars.temperature as f64,
        humidity: status.humidity != vars.humidity as f64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Activity, Field, OnOff};
    use pretty_assertions::assert_eq;

    fn status(temperature: f64, humidity: f64) -> ZoneStatus {
        ZoneStatus {
            run_state: OnOff::On,
            hold: OnOff::Off,
            activity: Activity::Home,
            temperature,
            humidity,
        }
    }

    fn mirror_of(status: &ZoneStatus) -> MirroredVars {
        MirroredVars {
            run_state: status.encoded(Field::RunState),
            hold: status.encoded(Field::Hold),
            activity: status.encoded(Field::Activity),
            temperature: status.encoded(Field::Temperature),
            humidity: status.encoded(Field::Humidity),
        }
    }

    #[test]
    fn mirrored_status_is_unchanged() {
        let current = status(68.0, 40.0);
        let changes = diff(&current, &mirror_of(&current));

        assert_eq!(changes, ChangeVector::default());
        assert!(!changes.any_changed());
        assert!(!changes.mode_changed());
    }

    #[test]
    fn run_state_and_temperature_drift() {
        let current = status(68.0, 40.0);
        let vars = MirroredVars {
            run_state: 0,
            hold: 0,
            activity: 3,
            temperature: 67,
            humidity: 40,
        };
        let changes = diff(&current, &vars);

        assert_eq!(
            changes,
            ChangeVector {
                run_state: true,
                hold: false,
                activity: false,
                temperature: true,
                humidity: false,
            }
        );
        assert!(changes.any_changed());
        assert!(changes.mode_changed());
    }

    #[test]
    fn fractional_reading_never_matches_truncated_mirror() {
        let current = status(68.4, 40.0);
        let changes = diff(&current, &mirror_of(&current));

        assert!(changes.temperature);
        assert!(changes.any_changed());
        assert!(!changes.mode_changed());
    }

    #[test]
    fn unknown_mirror_code_counts_as_change() {
        let current = status(70.0, 40.0);
        let mut vars = mirror_of(&current);
        vars.activity = 9;

        let changes = diff(&current, &vars);
        assert_eq!(changes.changed_fields().collect::<Vec<_>>(), vec![Field::Activity]);
    }
}
