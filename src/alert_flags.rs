//! TapeAlert flag classification
//!
//! Flag numbers follow the SCSI TapeAlert specification (LOG SENSE page
//! 2Eh), flag `n` is stored as bit `n - 1`.

use crate::alerts::AlertRecord;

bitflags::bitflags! {

    /// Tape Alert Flags
    pub struct TapeAlertFlags: u64 {
        #[allow(clippy::eq_op)]
        const READ_WARNING = 1 << (1 - 1);
        const WRITE_WARNING = 1 << (2 - 1);
        const HARD_ERROR = 1 << (3 - 1);
        const MEDIA = 1 << (4 - 1);
        const READ_FAILURE = 1 << (5 - 1);
        const WRITE_FAILURE = 1 << (6 - 1);
        const MEDIA_LIFE = 1 << (7 - 1);
        const NOT_DATA_GRADE = 1 << (8 - 1);
        const WRITE_PROTECT = 1 << (9 - 1);
        const NO_REMOVAL = 1 << (10 - 1);
        const CLEANING_MEDIA = 1 << (11 - 1);
        const UNSUPPORTED_FORMAT = 1 << (12 - 1);
        const RECOVERABLE_SNAPPED_TAPE = 1 << (13 - 1);
        const UNRECOVERABLE_SNAPPED_TAPE = 1 << (14 - 1);
        const MEMORY_CHIP_IN_CARTRIDGE_FAILURE = 1 << (15 - 1);
        const FORCED_EJECT = 1 << (16 - 1);
        const READ_ONLY_FORMAT = 1 << (17 - 1);
        const TAPE_DIRECTORY_CORRUPTED = 1 << (18 - 1);
        const NEARING_MEDIA_LIFE = 1 << (19 - 1);
        const CLEAN_NOW = 1 << (20 - 1);
        const CLEAN_PERIODIC = 1 << (21 - 1);
        const EXPIRED_CLEANING_MEDIA = 1 << (22 - 1);
        const INVALID_CLEANING_TAPE = 1 << (23 - 1);
        const RETENSION_REQUEST = 1 << (24 - 1);
        const HOST_CHANNEL_FAILURE = 1 << (25 - 1);
        const COOLING_FAN_FAILURE = 1 << (26 - 1);
        const POWER_SUPPLY_FAILURE = 1 << (27 - 1);
        const POWER_CONSUMPTION = 1 << (28 - 1);
        const DRIVE_MAINTENANCE = 1 << (29 - 1);
        const HARDWARE_A = 1 << (30 - 1);
        const HARDWARE_B = 1 << (31 - 1);
        const INTERFACE = 1 << (32 - 1);
        const EJECT_MEDIA = 1 << (33 - 1);
        const DOWNLOAD_FAULT = 1 << (34 - 1);
        const DRIVE_HUMIDITY = 1 << (35 - 1);
        const DRIVE_TEMPERATURE = 1 << (36 - 1);
        const DRIVE_VOLTAGE = 1 << (37 - 1);
        const PREDICTIVE_FAILURE = 1 << (38 - 1);
        const DIAGNOSTICS_REQUIRED = 1 << (39 - 1);
        const LOADER_STRAY_TAPE = 1 << (41 - 1);
        const LOADER_HARDWARE = 1 << (42 - 1);
        const LOADER_MAGAZINE = 1 << (45 - 1);
        const DIMINISHED_NATIVE_CAPACITY = 1 << (49 - 1);
        const LOST_STATISTICS = 1 << (50 - 1);
        const TAPE_DIRECTORY_INVALID_AT_UNLOAD = 1 << (51 - 1);
        const TAPE_SYSTEM_AREA_WRITE_FAILURE = 1 << (52 - 1);
        const TAPE_SYSTEM_AREA_READ_FAILURE = 1 << (53 - 1);
        const NO_START_OF_DATA = 1 << (54 - 1);
        const LOADING_FAILURE = 1 << (55 - 1);
        const UNRECOVERABLE_UNLOAD_FAILURE = 1 << (56 - 1);
        const AUTOMATION_INTERFACE_FAILURE = 1 << (57 - 1);
        const FIRMWARE_FAILURE = 1 << (58 - 1);
        const WORM_INTEGRITY_CHECK_FAILED = 1 << (59 - 1);
        const WORM_OVERWRITE_ATTEMPTED = 1 << (60 - 1);
        const ENCRYPTION_POLICY_VIOLATION = 1 << (61 - 1);
    }
}

impl TapeAlertFlags {
    /// Flag for TapeAlert number `code` (1-64)
    ///
    /// Reserved numbers map to their bit as well, they just have no name.
    pub fn from_code(code: u8) -> Self {
        match code {
            1..=64 => Self {
                bits: 1u64 << (code - 1),
            },
            _ => Self::empty(),
        }
    }

    pub fn from_alerts(alerts: &[AlertRecord]) -> Self {
        alerts
            .iter()
            .fold(Self::empty(), |flags, alert| flags | Self::from_code(alert.code()))
    }
}

const CRITICAL_FLAG_MASK: u64 = TapeAlertFlags::MEDIA.bits()
    | TapeAlertFlags::WRITE_FAILURE.bits()
    | TapeAlertFlags::READ_FAILURE.bits()
    | TapeAlertFlags::WRITE_PROTECT.bits()
    | TapeAlertFlags::UNRECOVERABLE_SNAPPED_TAPE.bits()
    | TapeAlertFlags::FORCED_EJECT.bits()
    | TapeAlertFlags::EXPIRED_CLEANING_MEDIA.bits()
    | TapeAlertFlags::INVALID_CLEANING_TAPE.bits()
    | TapeAlertFlags::HARDWARE_A.bits()
    | TapeAlertFlags::HARDWARE_B.bits()
    | TapeAlertFlags::EJECT_MEDIA.bits()
    | TapeAlertFlags::PREDICTIVE_FAILURE.bits()
    | TapeAlertFlags::LOADER_STRAY_TAPE.bits()
    | TapeAlertFlags::LOADER_MAGAZINE.bits()
    | TapeAlertFlags::TAPE_SYSTEM_AREA_WRITE_FAILURE.bits()
    | TapeAlertFlags::TAPE_SYSTEM_AREA_READ_FAILURE.bits()
    | TapeAlertFlags::NO_START_OF_DATA.bits()
    | TapeAlertFlags::LOADING_FAILURE.bits()
    | TapeAlertFlags::UNRECOVERABLE_UNLOAD_FAILURE.bits()
    | TapeAlertFlags::AUTOMATION_INTERFACE_FAILURE.bits();

const MEDIA_LIFE_MASK: u64 =
    TapeAlertFlags::MEDIA_LIFE.bits() | TapeAlertFlags::NEARING_MEDIA_LIFE.bits();

const CLEANING_REQUEST_MASK: u64 =
    TapeAlertFlags::CLEAN_NOW.bits() | TapeAlertFlags::CLEAN_PERIODIC.bits();

/// Check if tape-alert-flags contains critical errors.
pub fn tape_alert_flags_critical(flags: TapeAlertFlags) -> bool {
    (flags.bits() & CRITICAL_FLAG_MASK) != 0
}

/// Check if tape-alert-flags indicates media-life end
pub fn tape_alert_flags_media_life(flags: TapeAlertFlags) -> bool {
    (flags.bits() & MEDIA_LIFE_MASK) != 0
}

/// Check if tape-alert-flags indicates a cleaning request
pub fn tape_alert_flags_cleaning_request(flags: TapeAlertFlags) -> bool {
    (flags.bits() & CLEANING_REQUEST_MASK) != 0
}

/// What the detected alerts ask the operator to do
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AlertClassification {
    pub critical: bool,
    pub media_life: bool,
    pub cleaning_request: bool,
}

impl AlertClassification {
    pub fn from_alerts(alerts: &[AlertRecord]) -> Self {
        let flags = TapeAlertFlags::from_alerts(alerts);
        Self {
            critical: tape_alert_flags_critical(flags),
            media_life: tape_alert_flags_media_life(flags),
            cleaning_request: tape_alert_flags_cleaning_request(flags),
        }
    }

    /// Human readable remarks, one per raised category
    pub fn remarks(&self) -> Vec<&'static str> {
        let mut list = Vec::new();
        if self.critical {
            list.push("CRITICAL: drive or media failure reported, check the drive before further use");
        }
        if self.media_life {
            list.push("Media is at or near the end of its life, consider replacing the tape");
        }
        if self.cleaning_request {
            list.push("Drive requests cleaning, load a cleaning cartridge");
        }
        list
    }
}
