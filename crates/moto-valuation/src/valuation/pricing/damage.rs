use serde::Serialize;

use crate::valuation::domain::{
    ConditionCategory, DamagePart, DamageReport, PartCondition, StatusSeverity,
};

/// Share of the overall damage impact carried by each part, in basis points.
const fn weight_basis_points(part: DamagePart) -> u32 {
    match part {
        DamagePart::Chassis => 2_000,
        DamagePart::Engine => 2_500,
        DamagePart::Transmission => 1_500,
        DamagePart::FrontFork => 1_000,
        DamagePart::FuelTank => 500,
        DamagePart::Electrical => 1_000,
        DamagePart::FrontPanel => 500,
        DamagePart::RearPanel => 500,
        DamagePart::Exhaust => 500,
    }
}

const fn total_weight_basis_points() -> u32 {
    let mut total = 0;
    let mut index = 0;
    while index < DamagePart::ALL.len() {
        total += weight_basis_points(DamagePart::ALL[index]);
        index += 1;
    }
    total
}

const _: () = assert!(total_weight_basis_points() == 10_000);

pub fn part_weight(part: DamagePart) -> f64 {
    weight_basis_points(part) as f64 / 10_000.0
}

/// Multiplier for a part's category/severity pair, 1.0 down to 0.5.
pub fn part_multiplier(condition: PartCondition) -> f64 {
    use ConditionCategory::*;
    use StatusSeverity::*;

    match (condition.condition_category, condition.status_severity) {
        (Original, Excellent) => 1.00,
        (Original, Good) => 0.95,
        (Original, Fair) => 0.85,
        (Original, Poor) => 0.75,
        (Modified, Excellent) => 0.95,
        (Modified, Good) => 0.90,
        (Modified, Fair) => 0.80,
        (Modified, Poor) => 0.70,
        (Replaced, Excellent) => 0.90,
        (Replaced, Good) => 0.85,
        (Replaced, Fair) => 0.75,
        (Replaced, Poor) => 0.65,
        (Damaged, Excellent) => 0.80,
        (Damaged, Good) => 0.70,
        (Damaged, Fair) => 0.60,
        (Damaged, Poor) => 0.50,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartImpact {
    pub part: DamagePart,
    pub condition: PartCondition,
    pub multiplier: f64,
    pub weight: f64,
}

impl PartImpact {
    /// Signed fraction of the pre-damage price this part removes.
    pub fn impact(&self) -> f64 {
        (self.multiplier - 1.0) * self.weight
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DamageAssessment {
    pub effect: f64,
    pub parts: Vec<PartImpact>,
}

/// Weighted sum of part multipliers over all nine parts.
pub fn assess_damage(report: &DamageReport) -> DamageAssessment {
    let parts: Vec<PartImpact> = report
        .iter()
        .map(|(part, condition)| PartImpact {
            part,
            condition,
            multiplier: part_multiplier(condition),
            weight: part_weight(part),
        })
        .collect();

    let effect = parts
        .iter()
        .map(|impact| impact.multiplier * impact.weight)
        .sum();

    DamageAssessment { effect, parts }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_sum_to_one() {
        assert_eq!(total_weight_basis_points(), 10_000);
        let total: f64 = DamagePart::ALL.into_iter().map(part_weight).sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn pristine_report_has_no_damage_effect() {
        let assessment = assess_damage(&DamageReport::pristine());
        assert!((assessment.effect - 1.0).abs() < 1e-12);
        assert_eq!(assessment.parts.len(), 9);
        assert!(assessment.parts.iter().all(|part| part.impact() == 0.0));
    }

    #[test]
    fn table_spans_pristine_to_worst_case() {
        assert_eq!(part_multiplier(PartCondition::PRISTINE), 1.0);
        assert_eq!(
            part_multiplier(PartCondition {
                condition_category: ConditionCategory::Damaged,
                status_severity: StatusSeverity::Poor,
            }),
            0.5
        );
    }

    #[test]
    fn damaged_engine_weighs_by_its_share() {
        let report = DamageReport::pristine().with_part(
            DamagePart::Engine,
            PartCondition {
                condition_category: ConditionCategory::Damaged,
                status_severity: StatusSeverity::Poor,
            },
        );

        let assessment = assess_damage(&report);
        // 0.75 * 1.0 + 0.25 * 0.5
        assert!((assessment.effect - 0.875).abs() < 1e-12);
        let engine = assessment
            .parts
            .iter()
            .find(|impact| impact.part == DamagePart::Engine)
            .expect("engine row present");
        assert!((engine.impact() + 0.125).abs() < 1e-12);
    }

    #[test]
    fn every_damaged_part_still_leaves_positive_effect() {
        let worst = PartCondition {
            condition_category: ConditionCategory::Damaged,
            status_severity: StatusSeverity::Poor,
        };
        let report = DamagePart::ALL
            .into_iter()
            .fold(DamageReport::pristine(), |report, part| {
                report.with_part(part, worst)
            });

        let assessment = assess_damage(&report);
        assert!((assessment.effect - 0.5).abs() < 1e-12);
    }
}
