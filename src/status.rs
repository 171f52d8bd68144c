//! Status and alarm derivation: pure mappings from raw tag codes to
//! semantic labels and presentation colors.
//!
//! Every taxonomy lives here exactly once and is shared by all chart
//! feeds; nothing downstream defines its own copy of these tables.

use std::fmt;

// ─────────────────────────────────────────────────────────────────────────────
// VesselStatus – per-vessel status code
// ─────────────────────────────────────────────────────────────────────────────

/// Semantic status of one pressure vessel, derived from its status tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VesselStatus {
    Ok,
    OverPressure,
    UnderPressure,
    /// Code 3: the PLC reports "no status".
    None,
    SensorError,
    /// Any unmapped code, and the state before the first status sample.
    #[default]
    Unknown,
}

impl VesselStatus {
    /// Total mapping from the raw status code. Unmapped codes yield
    /// [`VesselStatus::Unknown`].
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => VesselStatus::Ok,
            1 => VesselStatus::OverPressure,
            2 => VesselStatus::UnderPressure,
            3 => VesselStatus::None,
            4 => VesselStatus::SensorError,
            _ => VesselStatus::Unknown,
        }
    }

    /// Human-readable label shown next to the chart.
    pub fn label(&self) -> &'static str {
        match self {
            VesselStatus::Ok => "Ok",
            VesselStatus::OverPressure => "Over Pressure",
            VesselStatus::UnderPressure => "Under Pressure",
            VesselStatus::None => "None",
            VesselStatus::SensorError => "Sensor Error",
            VesselStatus::Unknown => "Unknown",
        }
    }

    /// Presentation color (CSS hex) for the status badge.
    pub fn color(&self) -> &'static str {
        match self {
            VesselStatus::Ok => "#28a745",
            VesselStatus::OverPressure => "#dc3545",
            VesselStatus::UnderPressure => "#ffc107",
            VesselStatus::SensorError => "#6c757d",
            VesselStatus::None | VesselStatus::Unknown => "#888",
        }
    }
}

impl fmt::Display for VesselStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HoldState – the AFBLAST/Holding alarm tag
// ─────────────────────────────────────────────────────────────────────────────

/// State of a sterilizer's hold/alarm tag (`HA_S<n>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HoldState {
    #[default]
    Inactive,
    /// Code 1: pressure is being held.
    Holding,
    /// Code 2: blow-off in progress.
    Afblast,
}

impl HoldState {
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => HoldState::Holding,
            2 => HoldState::Afblast,
            _ => HoldState::Inactive,
        }
    }

    /// Overlay label; empty while inactive.
    pub fn label(&self) -> &'static str {
        match self {
            HoldState::Inactive => "",
            HoldState::Holding => "Holding",
            HoldState::Afblast => "AFBLAST",
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        !matches!(self, HoldState::Inactive)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Countdown formatting
// ─────────────────────────────────────────────────────────────────────────────

/// Render a countdown tag value (seconds, possibly fractional) as
/// `minutes:seconds`, recalculated fresh on each update.
pub fn format_countdown(total_seconds: f64) -> String {
    let total = if total_seconds.is_finite() && total_seconds > 0.0 {
        total_seconds
    } else {
        0.0
    };
    let minutes = (total / 60.0).floor() as u64;
    let seconds = (total % 60.0).floor() as u64;
    format!("{minutes}:{seconds:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_is_total() {
        assert_eq!(VesselStatus::from_code(0), VesselStatus::Ok);
        assert_eq!(VesselStatus::from_code(1), VesselStatus::OverPressure);
        assert_eq!(VesselStatus::from_code(2), VesselStatus::UnderPressure);
        assert_eq!(VesselStatus::from_code(3), VesselStatus::None);
        assert_eq!(VesselStatus::from_code(4), VesselStatus::SensorError);
        // Anything else maps to Unknown instead of panicking.
        for code in [-1, 5, 42, i64::MAX, i64::MIN] {
            assert_eq!(VesselStatus::from_code(code), VesselStatus::Unknown);
        }
    }

    #[test]
    fn every_status_has_a_color() {
        let all = [
            VesselStatus::Ok,
            VesselStatus::OverPressure,
            VesselStatus::UnderPressure,
            VesselStatus::None,
            VesselStatus::SensorError,
            VesselStatus::Unknown,
        ];
        for status in all {
            assert!(status.color().starts_with('#'), "{status} missing color");
            assert!(!status.label().is_empty());
        }
        assert_eq!(VesselStatus::Ok.color(), "#28a745");
        assert_eq!(VesselStatus::OverPressure.color(), "#dc3545");
        assert_eq!(VesselStatus::UnderPressure.color(), "#ffc107");
        assert_eq!(VesselStatus::SensorError.color(), "#6c757d");
        assert_eq!(VesselStatus::Unknown.color(), "#888");
    }

    #[test]
    fn hold_state_mapping() {
        assert_eq!(HoldState::from_code(1), HoldState::Holding);
        assert_eq!(HoldState::from_code(2), HoldState::Afblast);
        assert_eq!(HoldState::from_code(0), HoldState::Inactive);
        assert_eq!(HoldState::from_code(7), HoldState::Inactive);
        assert!(HoldState::Holding.is_active());
        assert!(HoldState::Afblast.is_active());
        assert!(!HoldState::Inactive.is_active());
        assert_eq!(HoldState::Inactive.label(), "");
        assert_eq!(HoldState::Afblast.label(), "AFBLAST");
    }

    #[test]
    fn countdown_formatting() {
        assert_eq!(format_countdown(0.0), "0:00");
        assert_eq!(format_countdown(65.0), "1:05");
        assert_eq!(format_countdown(59.9), "0:59");
        assert_eq!(format_countdown(600.0), "10:00");
        // Garbage in, zero out.
        assert_eq!(format_countdown(-3.0), "0:00");
        assert_eq!(format_countdown(f64::NAN), "0:00");
    }
}
