//! Corrected class-id to label mapping.
//!
//! The model was trained with the two class names transposed, so the raw
//! names baked into the weights cannot be trusted. This table is the single
//! source of truth for the corrected names; both the verdict logic and the
//! metadata endpoints go through it.

/// Class id for a rider wearing a helmet.
pub const WITH_HELMET: i64 = 0;
/// Class id for a rider without a helmet.
pub const WITHOUT_HELMET: i64 = 1;

/// Label reported for class ids outside the mapping.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Corrected id -> name table.
pub const CORRECTED_NAMES: [(i64, &str); 2] =
    [(WITH_HELMET, "With_Helmet"), (WITHOUT_HELMET, "Without_Helmet")];

/// Look up the corrected label for a raw class id.
pub fn correct(class_id: i64) -> &'static str {
    CORRECTED_NAMES
        .iter()
        .find(|(id, _)| *id == class_id)
        .map(|(_, name)| *name)
        .unwrap_or(UNKNOWN_LABEL)
}

/// Corrected class names, in id order.
pub fn class_names() -> Vec<&'static str> {
    CORRECTED_NAMES.iter().map(|(_, name)| *name).collect()
}
