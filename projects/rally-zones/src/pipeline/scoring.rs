use crate::pipeline::rules::{Condition, Rule, RuleSet};
use crate::pipeline::trajectory::{sorted_by_time, TrajectoryPoint};
use crate::pipeline::zones::{crosses, is_inside, Zone, ZoneSet};
use serde::{Deserialize, Serialize};

/// One rule firing
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ScoreLogEntry {
    /// Time of the sample that completed the triggering pair
    pub time: f64,
    pub message: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ScoreReport {
    pub score: i64,
    /// In evaluation order: by sample pair, then by rule order
    pub events: Vec<ScoreLogEntry>,
}

/// Scores a trajectory from scratch.
///
/// The points are time-sorted first, then every consecutive pair is checked
/// against every rule. Rules whose zone is gone never fire.
pub fn evaluate(points: &[TrajectoryPoint], zones: &ZoneSet, rules: &RuleSet) -> ScoreReport {
    let trajectory = sorted_by_time(points);
    let mut report = ScoreReport::default();

    for i in 1..trajectory.len() {
        let prev = &trajectory[i - 1];
        let curr = &trajectory[i];
        let next = trajectory.get(i + 1);

        for rule in rules.iter() {
            let Some(zone) = zones.get(&rule.zone_id) else {
                continue;
            };

            if rule_fires(rule.condition, zone, prev, curr, next) {
                let delta = rule.delta();
                report.score += delta;
                report.events.push(ScoreLogEntry {
                    time: curr.time,
                    message: event_message(zone, rule, delta),
                });
            }
        }
    }

    report
}

fn rule_fires(
    condition: Condition,
    zone: &Zone,
    prev: &TrajectoryPoint,
    curr: &TrajectoryPoint,
    next: Option<&TrajectoryPoint>,
) -> bool {
    match condition {
        Condition::Cross => crosses(prev.center, curr.center, zone),
        Condition::Enter => !is_inside(prev.center, zone) && is_inside(curr.center, zone),
        Condition::Exit => is_inside(prev.center, zone) && !is_inside(curr.center, zone),
        Condition::Inside => next.is_some_and(|next| is_bounce_inside(zone, prev, curr, next)),
    }
}

/// Live-scoring bounce check over three samples: `curr` is inside the zone
/// and is the lowest point on screen (largest y) of the three. A flat
/// approach (`curr.y == prev.y`) still counts; the ball must rise right after.
pub fn is_bounce_inside(
    zone: &Zone,
    prev: &TrajectoryPoint,
    curr: &TrajectoryPoint,
    next: &TrajectoryPoint,
) -> bool {
    is_inside(curr.center, zone) && curr.center.y >= prev.center.y && curr.center.y > next.center.y
}

fn event_message(zone: &Zone, rule: &Rule, delta: i64) -> String {
    format!("{}: {} {:+}", zone.display_name(), rule.condition, delta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::rules::Action;
    use crate::pipeline::trajectory::sample_point;
    use crate::pipeline::types::Point;
    use crate::pipeline::zones::ZoneKind;

    fn setup(zone: Zone, rules: &[(Condition, Action, u32)]) -> (ZoneSet, RuleSet) {
        let mut zones = ZoneSet::new();
        zones.insert(zone.clone()).unwrap();
        let mut set = RuleSet::new();
        for (i, (condition, action, points)) in rules.iter().enumerate() {
            let rule = Rule::new(format!("r{}", i), &zone, *condition, *action, *points).unwrap();
            set.add(rule, &zones).unwrap();
        }
        (zones, set)
    }

    fn circle() -> Zone {
        Zone::new(
            "ring",
            ZoneKind::Circle,
            [Point::new(0.0, 0.0), Point::new(5.0, 0.0)],
            "Ring",
            "red",
        )
    }

    #[test]
    fn test_cross_rule_end_to_end() {
        let net = Zone::new(
            "net",
            ZoneKind::Line,
            [Point::new(0.0, 0.0), Point::new(10.0, 0.0)],
            "Net",
            "white",
        );
        let (zones, rules) = setup(net, &[(Condition::Cross, Action::Add, 5)]);
        let points = vec![sample_point(0.0, 5.0, -1.0), sample_point(1.0, 5.0, 1.0)];

        let report = evaluate(&points, &zones, &rules);
        assert_eq!(report.score, 5);
        assert_eq!(report.events.len(), 1);
        assert_eq!(report.events[0].time, 1.0);
        assert_eq!(report.events[0].message, "Net: Cross +5");
    }

    #[test]
    fn test_enter_exit_pair() {
        let (zones, rules) = setup(
            circle(),
            &[
                (Condition::Enter, Action::Add, 3),
                (Condition::Exit, Action::Deduct, 2),
            ],
        );
        let points = vec![
            sample_point(0.0, 10.0, 0.0),
            sample_point(1.0, 0.0, 0.0),
            sample_point(2.0, 10.0, 0.0),
        ];

        let report = evaluate(&points, &zones, &rules);
        assert_eq!(report.score, 1);
        assert_eq!(report.events.len(), 2);
        assert_eq!(report.events[0].time, 1.0);
        assert_eq!(report.events[0].message, "Ring: Enter +3");
        assert_eq!(report.events[1].time, 2.0);
        assert_eq!(report.events[1].message, "Ring: Exit -2");
    }

    #[test]
    fn test_inside_bounce_fires_once_at_local_max() {
        let court = Zone::new(
            "court",
            ZoneKind::Rectangle,
            [Point::new(0.0, 0.0), Point::new(100.0, 100.0)],
            "Court",
            "green",
        );
        let (zones, rules) = setup(court, &[(Condition::Inside, Action::Add, 1)]);
        let points = vec![
            sample_point(0.0, 1.0, 5.0),
            sample_point(0.1, 2.0, 8.0),
            sample_point(0.2, 3.0, 10.0),
            sample_point(0.3, 4.0, 6.0),
        ];

        let report = evaluate(&points, &zones, &rules);
        assert_eq!(report.score, 1);
        assert_eq!(report.events.len(), 1);
        assert_eq!(report.events[0].time, 0.2);
    }

    #[test]
    fn test_inside_needs_lookahead() {
        let court = Zone::new(
            "court",
            ZoneKind::Rectangle,
            [Point::new(0.0, 0.0), Point::new(100.0, 100.0)],
            "Court",
            "green",
        );
        let (zones, rules) = setup(court, &[(Condition::Inside, Action::Add, 1)]);
        // descending into the last sample: no next point to confirm the bounce
        let points = vec![sample_point(0.0, 1.0, 5.0), sample_point(0.1, 2.0, 9.0)];
        assert_eq!(evaluate(&points, &zones, &rules).score, 0);
    }

    #[test]
    fn test_inside_flat_approach_counts() {
        let court = Zone::new(
            "court",
            ZoneKind::Rectangle,
            [Point::new(0.0, 0.0), Point::new(100.0, 100.0)],
            "Court",
            "green",
        );
        let (zones, rules) = setup(court, &[(Condition::Inside, Action::Deduct, 4)]);
        let points = vec![
            sample_point(0.0, 1.0, 10.0),
            sample_point(0.1, 2.0, 10.0),
            sample_point(0.2, 3.0, 4.0),
        ];
        let report = evaluate(&points, &zones, &rules);
        assert_eq!(report.score, -4);
        assert_eq!(report.events[0].time, 0.1);
    }

    #[test]
    fn test_inside_outside_zone_ignored() {
        let small = Zone::new(
            "small",
            ZoneKind::Rectangle,
            [Point::new(50.0, 50.0), Point::new(60.0, 60.0)],
            "Small",
            "green",
        );
        let (zones, rules) = setup(small, &[(Condition::Inside, Action::Add, 1)]);
        let points = vec![
            sample_point(0.0, 1.0, 5.0),
            sample_point(0.1, 2.0, 10.0),
            sample_point(0.2, 3.0, 6.0),
        ];
        assert_eq!(evaluate(&points, &zones, &rules).score, 0);
    }

    #[test]
    fn test_dangling_rule_is_inert() {
        let (mut zones, rules) = setup(circle(), &[(Condition::Enter, Action::Add, 3)]);
        zones.remove("ring");
        let points = vec![sample_point(0.0, 10.0, 0.0), sample_point(1.0, 0.0, 0.0)];
        let report = evaluate(&points, &zones, &rules);
        assert_eq!(report, ScoreReport::default());
    }

    #[test]
    fn test_multiple_rules_same_pair_keep_rule_order() {
        let (zones, rules) = setup(
            circle(),
            &[
                (Condition::Enter, Action::Add, 3),
                (Condition::Enter, Action::Deduct, 1),
            ],
        );
        let points = vec![sample_point(0.0, 10.0, 0.0), sample_point(1.0, 0.0, 0.0)];
        let report = evaluate(&points, &zones, &rules);
        assert_eq!(report.score, 2);
        let messages: Vec<&str> = report.events.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, ["Ring: Enter +3", "Ring: Enter -1"]);
    }

    #[test]
    fn test_evaluation_is_idempotent_and_order_invariant() {
        let (zones, rules) = setup(
            circle(),
            &[
                (Condition::Enter, Action::Add, 3),
                (Condition::Exit, Action::Deduct, 2),
            ],
        );
        let sorted = vec![
            sample_point(0.0, 10.0, 0.0),
            sample_point(1.0, 0.0, 0.0),
            sample_point(2.0, 10.0, 0.0),
            sample_point(3.0, 1.0, 1.0),
        ];
        let shuffled = vec![
            sorted[2].clone(),
            sorted[0].clone(),
            sorted[3].clone(),
            sorted[1].clone(),
        ];

        let first = evaluate(&sorted, &zones, &rules);
        let second = evaluate(&sorted, &zones, &rules);
        let from_shuffled = evaluate(&shuffled, &zones, &rules);
        assert_eq!(first, second);
        assert_eq!(first, from_shuffled);
        assert_eq!(first.score, 4);
    }

    #[test]
    fn test_short_trajectories_score_zero() {
        let (zones, rules) = setup(circle(), &[(Condition::Enter, Action::Add, 3)]);
        assert_eq!(evaluate(&[], &zones, &rules).score, 0);
        assert_eq!(
            evaluate(&[sample_point(0.0, 0.0, 0.0)], &zones, &rules).score,
            0
        );
    }
}
