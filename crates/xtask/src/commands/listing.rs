//! JSON plan listing shared by `plan --json` and `print-plans`.

use std::fmt::Write as _;

use planner::Plan;
use serde::{Deserialize, Serialize};

/// `{"plans": [["(step ...)", ...], ...], "total": n}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanListing {
    #[serde(default)]
    pub plans: Vec<Vec<String>>,
    /// Plans found in total; may exceed the listed ones.
    #[serde(default)]
    pub total: Option<usize>,
}

impl PlanListing {
    pub fn from_plans<'a>(plans: impl IntoIterator<Item = &'a Plan>) -> Self {
        let plans: Vec<Vec<String>> = plans
            .into_iter()
            .map(|plan| plan.steps.iter().map(ToString::to_string).collect())
            .collect();
        Self {
            total: Some(plans.len()),
            plans,
        }
    }

    pub fn total(&self) -> usize {
        self.total.unwrap_or(self.plans.len())
    }

    /// Numbered, human-readable rendering.
    pub fn render(&self) -> String {
        let mut out = format!("Total plans found: {}\n\n", self.total());
        for (i, plan) in self.plans.iter().enumerate() {
            let _ = writeln!(out, "Plan {}:", i + 1);
            for (j, step) in plan.iter().enumerate() {
                let _ = writeln!(out, "  {}. {}", j + 1, step);
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use planner::PlanStep;

    use super::*;

    #[test]
    fn listing_round_trips_through_json() {
        let plan = Plan::new(vec![
            PlanStep::new("shift-context", ["player", "a", "b"]),
            PlanStep::new("learn-concept", ["player", "b", "cpt_x"]),
        ]);
        let listing = PlanListing::from_plans([&plan]);
        let json = serde_json::to_string(&listing).unwrap();
        assert_eq!(
            json,
            r#"{"plans":[["(shift-context player a b)","(learn-concept player b cpt_x)"]],"total":1}"#
        );
        assert_eq!(serde_json::from_str::<PlanListing>(&json).unwrap(), listing);
    }

    #[test]
    fn missing_total_counts_the_plans() {
        let listing: PlanListing = serde_json::from_str(r#"{"plans": [["(a)"], ["(b)"]]}"#).unwrap();
        assert_eq!(listing.total(), 2);
        assert_eq!(
            listing.render(),
            "Total plans found: 2\n\nPlan 1:\n  1. (a)\n\nPlan 2:\n  1. (b)\n\n"
        );
    }
}
