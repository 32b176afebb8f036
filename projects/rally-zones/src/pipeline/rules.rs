use crate::pipeline::error::ValidationError;
use crate::pipeline::zones::{Zone, ZoneKind, ZoneSet};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What has to happen between two consecutive samples for a rule to fire
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    /// Path between samples crosses a line zone
    Cross,
    /// Previous sample outside, current sample inside
    Enter,
    /// Previous sample inside, current sample outside
    Exit,
    /// Ball bottoms out (bounces) while inside the zone
    Inside,
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Condition::Cross => "Cross",
            Condition::Enter => "Enter",
            Condition::Exit => "Exit",
            Condition::Inside => "Inside",
        };
        f.write_str(name)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Add,
    Deduct,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Rule {
    pub id: String,
    pub zone_id: String,
    pub condition: Condition,
    pub action: Action,
    pub points: u32,
}

impl Rule {
    /// Creates a rule bound to `zone`, rejecting conditions the zone kind
    /// cannot produce.
    pub fn new(
        id: impl Into<String>,
        zone: &Zone,
        condition: Condition,
        action: Action,
        points: u32,
    ) -> Result<Self, ValidationError> {
        check_condition(zone, condition)?;
        Ok(Self {
            id: id.into(),
            zone_id: zone.id.clone(),
            condition,
            action,
            points,
        })
    }

    /// Signed score change applied each time the rule fires
    pub fn delta(&self) -> i64 {
        match self.action {
            Action::Add => i64::from(self.points),
            Action::Deduct => -i64::from(self.points),
        }
    }
}

/// Cross needs a line; Enter/Exit/Inside need an area
pub fn check_condition(zone: &Zone, condition: Condition) -> Result<(), ValidationError> {
    match (zone.kind, condition) {
        (ZoneKind::Line, Condition::Cross) => Ok(()),
        (ZoneKind::Line, condition) => Err(ValidationError::AreaConditionOnLine {
            condition,
            zone: zone.display_name().to_string(),
        }),
        (_, Condition::Cross) => Err(ValidationError::CrossRequiresLine {
            zone: zone.display_name().to_string(),
        }),
        _ => Ok(()),
    }
}

/// Rules in evaluation order
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule after checking it against the zone it references.
    /// Nothing is added on error.
    pub fn add(&mut self, rule: Rule, zones: &ZoneSet) -> Result<(), ValidationError> {
        if self.rules.iter().any(|r| r.id == rule.id) {
            return Err(ValidationError::DuplicateRule(rule.id));
        }
        let zone = zones
            .get(&rule.zone_id)
            .ok_or_else(|| ValidationError::UnknownZone(rule.zone_id.clone()))?;
        check_condition(zone, rule.condition)?;
        self.rules.push(rule);
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> Option<Rule> {
        let idx = self.rules.iter().position(|r| r.id == id)?;
        Some(self.rules.remove(idx))
    }

    /// Drops rules whose zone no longer exists. Returns how many were removed.
    pub fn retain_zones(&mut self, zones: &ZoneSet) -> usize {
        let before = self.rules.len();
        self.rules.retain(|r| zones.get(&r.zone_id).is_some());
        before - self.rules.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
