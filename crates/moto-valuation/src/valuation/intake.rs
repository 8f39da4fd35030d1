use std::collections::{BTreeMap, BTreeSet};

use super::domain::{
    Accessory, AccessorySet, Condition, ConditionCategory, Cooling, DamagePart, DamageReport,
    DealerId, PartCondition, PowerRange, SafetyFeature, SafetyFeatureSet, StatusSeverity,
    TechnicalSpecInput, UserId, ValuationInput, ValuationRequest, VehicleCondition, VehicleId,
};

/// Odometer readings above this are treated as data-entry errors.
pub const MAX_MILEAGE_KM: i64 = 1_000_000;

/// Validation errors raised before any pricing work starts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} must not be blank")]
    BlankField { field: &'static str },
    #[error("mileage must be zero or greater (found {0})")]
    NegativeMileage(i64),
    #[error("mileage must be at most {max} km (found {found})", max = MAX_MILEAGE_KM, found = .0)]
    MileageOutOfRange(i64),
    #[error("{field}: unsupported value '{value}'")]
    UnknownValue { field: String, value: String },
    #[error("{field}: unknown key '{key}'")]
    UnknownKey { field: &'static str, key: String },
    #[error("technicalSpecs.enginePowerRange: cannot read a power range from '{0}'")]
    MalformedPowerRange(String),
    #[error("damageReport.{0}: part is missing from the report")]
    MissingDamagePart(&'static str),
}

/// Converts wire requests into validated [`ValuationInput`] values.
///
/// Every enum-like string goes through an exhaustive lookup; anything outside
/// the closed vocabulary is rejected instead of being mapped to a default.
/// Vocabulary values are matched exactly, surrounding whitespace included.
/// Only identifiers are trimmed.
#[derive(Debug, Clone, Default)]
pub struct RequestGuard;

impl RequestGuard {
    pub fn input_from_request(
        &self,
        request: ValuationRequest,
    ) -> Result<ValuationInput, ValidationError> {
        let motorcycle_id = non_blank("motorcycleId", request.motorcycle_id)?;
        let dealer_id = non_blank("dealerId", request.dealer_id)?;
        let user_id = non_blank("userId", request.user_id)?;

        if request.mileage < 0 {
            return Err(ValidationError::NegativeMileage(request.mileage));
        }
        if request.mileage > MAX_MILEAGE_KM {
            return Err(ValidationError::MileageOutOfRange(request.mileage));
        }
        let mileage = request.mileage as u64;

        let condition = Condition::from_key(&request.condition)
            .ok_or_else(|| unknown_value("condition", &request.condition))?;

        let specs = request.technical_specs;
        let vehicle_condition = VehicleCondition::from_key(&specs.vehicle_condition).ok_or_else(
            || unknown_value("technicalSpecs.vehicleCondition", &specs.vehicle_condition),
        )?;
        let engine_power_range = specs
            .engine_power_range
            .as_deref()
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| {
                PowerRange::parse(raw)
                    .ok_or_else(|| ValidationError::MalformedPowerRange(raw.to_string()))
            })
            .transpose()?;
        let cooling = specs
            .cooling
            .as_deref()
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| {
                Cooling::from_key(raw).ok_or_else(|| unknown_value("technicalSpecs.cooling", raw))
            })
            .transpose()?;

        let safety = SafetyFeatureSet(enabled_flags(
            "safetyFeatures",
            &request.safety_features,
            SafetyFeature::from_key,
        )?);
        let accessories = AccessorySet(enabled_flags(
            "accessories",
            &request.accessories,
            Accessory::from_key,
        )?);

        let damage = damage_report(request.damage_report)?;

        Ok(ValuationInput {
            motorcycle_id: VehicleId(motorcycle_id),
            dealer_id: DealerId(dealer_id),
            user_id: UserId(user_id),
            mileage,
            condition,
            technical: TechnicalSpecInput {
                vehicle_condition,
                engine_power_range,
                cooling,
                exchange_available: specs.exchange_available,
            },
            safety,
            accessories,
            damage,
        })
    }
}

fn non_blank(field: &'static str, value: String) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::BlankField { field });
    }
    Ok(trimmed.to_string())
}

fn unknown_value(field: &str, value: &str) -> ValidationError {
    ValidationError::UnknownValue {
        field: field.to_string(),
        value: value.to_string(),
    }
}

fn enabled_flags<T: Ord>(
    field: &'static str,
    flags: &BTreeMap<String, bool>,
    lookup: fn(&str) -> Option<T>,
) -> Result<BTreeSet<T>, ValidationError> {
    let mut enabled = BTreeSet::new();
    for (key, value) in flags {
        let flag = lookup(key).ok_or_else(|| ValidationError::UnknownKey {
            field,
            key: key.clone(),
        })?;
        if *value {
            enabled.insert(flag);
        }
    }
    Ok(enabled)
}

fn damage_report(
    raw: BTreeMap<String, super::domain::PartConditionRequest>,
) -> Result<DamageReport, ValidationError> {
    let mut parts = BTreeMap::new();
    for (key, entry) in raw {
        let part = DamagePart::from_key(&key).ok_or_else(|| ValidationError::UnknownKey {
            field: "damageReport",
            key: key.clone(),
        })?;
        let condition_category = ConditionCategory::from_key(&entry.condition_category)
            .ok_or_else(|| {
                unknown_value(
                    &format!("damageReport.{}.conditionCategory", part.key()),
                    &entry.condition_category,
                )
            })?;
        let status_severity = StatusSeverity::from_key(&entry.status_severity).ok_or_else(|| {
            unknown_value(
                &format!("damageReport.{}.statusSeverity", part.key()),
                &entry.status_severity,
            )
        })?;
        parts.insert(
            part,
            PartCondition {
                condition_category,
                status_severity,
            },
        );
    }

    DamageReport::from_parts(parts).map_err(|part| ValidationError::MissingDamagePart(part.key()))
}
