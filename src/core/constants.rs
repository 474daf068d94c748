//! Engine constants and default parameters

/// Centimeters per meter; range samples are recorded in centimeters
pub const CM_PER_METER: f64 = 100.0;

/// Number of anchors consumed by a single trilateration solve
pub const ANCHORS_PER_SOLVE: usize = 3;

/// Decimal places kept when a tag position is stored
pub const POSITION_DECIMALS: i32 = 2;

/// Default delay between estimation cycles (milliseconds)
pub const DEFAULT_CYCLE_INTERVAL_MS: u64 = 3000;

/// Legacy device type code for anchors
pub const ANCHOR_TYPE_CODE: u8 = 1;

/// Legacy device type code for tags
pub const TAG_TYPE_CODE: u8 = 2;
