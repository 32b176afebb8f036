use crate::pipeline::rules::Condition;

/// Rejections raised while building the zone and rule sets. The messages are
/// shown to the user as-is.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("A zone with id '{0}' already exists")]
    DuplicateZone(String),

    #[error("A rule with id '{0}' already exists")]
    DuplicateRule(String),

    #[error("Zone '{0}' does not exist")]
    UnknownZone(String),

    #[error("'Cross' rules can only be used with line zones ('{zone}' is not a line)")]
    CrossRequiresLine { zone: String },

    #[error("'{condition}' rules need a circle or rectangle zone ('{zone}' is a line)")]
    AreaConditionOnLine { condition: Condition, zone: String },

    #[error("Court corners must form a convex quadrilateral in TL, TR, BR, BL order")]
    InvalidCourt,

    #[error("Configure either a court boundary or court corners, not both")]
    ConflictingCourt,
}
