use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Catalog identifier for a motorcycle model/year.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VehicleId(pub String);

/// Dealer owning an algorithm configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DealerId(pub String);

/// User that requested a valuation, kept for the audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for DealerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Read-only catalog entry. The engine never mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleRecord {
    pub id: VehicleId,
    pub brand: String,
    pub model: String,
    pub year: i32,
    #[serde(rename = "engineCC")]
    pub engine_cc: u32,
    #[serde(rename = "enginePowerHP")]
    pub engine_power_hp: u32,
    pub category: String,
    pub base_price: u64,
}

impl VehicleRecord {
    pub fn headline(&self) -> String {
        format!("{} {} ({})", self.brand, self.model, self.year)
    }
}

/// Overall cosmetic/mechanical condition declared by the appraiser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Condition {
    New,
    Excellent,
    Good,
    Fair,
    Poor,
}

impl Condition {
    pub fn from_key(raw: &str) -> Option<Self> {
        match raw {
            "new" => Some(Self::New),
            "excellent" => Some(Self::Excellent),
            "good" => Some(Self::Good),
            "fair" => Some(Self::Fair),
            "poor" => Some(Self::Poor),
            _ => None,
        }
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Fair => "fair",
            Self::Poor => "poor",
        }
    }

    pub const fn base_multiplier(self) -> f64 {
        match self {
            Self::New => 1.0,
            Self::Excellent => 0.95,
            Self::Good => 0.85,
            Self::Fair => 0.75,
            Self::Poor => 0.60,
        }
    }
}

/// Provenance of the vehicle as declared in the technical sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VehicleCondition {
    New,
    Used,
    GreyImport,
}

impl VehicleCondition {
    pub fn from_key(raw: &str) -> Option<Self> {
        match raw {
            "new" => Some(Self::New),
            "used" => Some(Self::Used),
            "greyImport" => Some(Self::GreyImport),
            _ => None,
        }
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Used => "used",
            Self::GreyImport => "greyImport",
        }
    }

    pub const fn multiplier(self) -> f64 {
        match self {
            Self::New => 1.10,
            Self::Used => 1.00,
            Self::GreyImport => 0.90,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Cooling {
    Liquid,
    Air,
    Oil,
}

impl Cooling {
    pub fn from_key(raw: &str) -> Option<Self> {
        match raw {
            "liquid" => Some(Self::Liquid),
            "air" => Some(Self::Air),
            "oil" => Some(Self::Oil),
            _ => None,
        }
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::Liquid => "liquid",
            Self::Air => "air",
            Self::Oil => "oil",
        }
    }
}

/// Declared engine power bracket, e.g. `"70-100"` or `"100+"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerRange {
    pub lower: u32,
    pub upper: Option<u32>,
}

impl PowerRange {
    /// Accepts `N-M`, `N+`, `>N`, `>=N`, `<N`, `<=N` and `N`, optionally
    /// suffixed with `hp`. Returns `None` for anything else.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let s = trimmed
            .strip_suffix("hp")
            .or_else(|| trimmed.strip_suffix("HP"))
            .unwrap_or(trimmed)
            .trim();

        if let Some(val) = s.strip_prefix(">=") {
            Some(Self::at_least(val.trim().parse().ok()?))
        } else if let Some(val) = s.strip_prefix("<=") {
            Some(Self::up_to(val.trim().parse().ok()?))
        } else if let Some(val) = s.strip_prefix('>') {
            Some(Self::at_least(val.trim().parse().ok()?))
        } else if let Some(val) = s.strip_prefix('<') {
            Some(Self::up_to(val.trim().parse().ok()?))
        } else if let Some(val) = s.strip_suffix('+') {
            Some(Self::at_least(val.trim().parse().ok()?))
        } else if let Some((low, high)) = s.split_once('-') {
            let lower: u32 = low.trim().parse().ok()?;
            let upper: u32 = high.trim().parse().ok()?;
            if upper < lower {
                return None;
            }
            Some(Self {
                lower,
                upper: Some(upper),
            })
        } else {
            let exact: u32 = s.parse().ok()?;
            Some(Self {
                lower: exact,
                upper: Some(exact),
            })
        }
    }

    fn at_least(lower: u32) -> Self {
        Self { lower, upper: None }
    }

    fn up_to(upper: u32) -> Self {
        Self {
            lower: 0,
            upper: Some(upper),
        }
    }
}

impl fmt::Display for PowerRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upper {
            Some(upper) if upper == self.lower => write!(f, "{} hp", self.lower),
            Some(upper) => write!(f, "{}-{} hp", self.lower, upper),
            None => write!(f, "{}+ hp", self.lower),
        }
    }
}

/// Validated technical sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalSpecInput {
    pub vehicle_condition: VehicleCondition,
    pub engine_power_range: Option<PowerRange>,
    pub cooling: Option<Cooling>,
    pub exchange_available: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SafetyFeature {
    Abs,
    Airbag,
    TractionControl,
    Immobilizer,
    Alarm,
    SideBars,
    FrontProtectionBar,
    HandsFree,
}

impl SafetyFeature {
    pub const ALL: [SafetyFeature; 8] = [
        Self::Abs,
        Self::Airbag,
        Self::TractionControl,
        Self::Immobilizer,
        Self::Alarm,
        Self::SideBars,
        Self::FrontProtectionBar,
        Self::HandsFree,
    ];

    pub fn from_key(raw: &str) -> Option<Self> {
        match raw {
            "abs" => Some(Self::Abs),
            "airbag" => Some(Self::Airbag),
            "tractionControl" => Some(Self::TractionControl),
            "immobilizer" => Some(Self::Immobilizer),
            "alarm" => Some(Self::Alarm),
            "sideBars" => Some(Self::SideBars),
            "frontProtectionBar" => Some(Self::FrontProtectionBar),
            "handsFree" => Some(Self::HandsFree),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Abs => "ABS",
            Self::Airbag => "Airbag",
            Self::TractionControl => "Traction control",
            Self::Immobilizer => "Immobilizer",
            Self::Alarm => "Alarm",
            Self::SideBars => "Side bars",
            Self::FrontProtectionBar => "Front protection bar",
            Self::HandsFree => "Hands-free assistant",
        }
    }

    pub const fn weight(self) -> f64 {
        match self {
            Self::Abs | Self::Airbag | Self::TractionControl => 0.15,
            Self::Immobilizer | Self::Alarm | Self::SideBars | Self::FrontProtectionBar => 0.10,
            Self::HandsFree => 0.05,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Accessory {
    HeatedGrips,
    TopCase,
    LuggageSystem,
    CarbonParts,
    PerformanceBoost,
    LedStop,
    Xenon,
    Gps,
    LedSignal,
    SoundSystem,
    FrontCamera,
    UsbPort,
    UnderSeatStorage,
}

impl Accessory {
    pub const ALL: [Accessory; 13] = [
        Self::HeatedGrips,
        Self::TopCase,
        Self::LuggageSystem,
        Self::CarbonParts,
        Self::PerformanceBoost,
        Self::LedStop,
        Self::Xenon,
        Self::Gps,
        Self::LedSignal,
        Self::SoundSystem,
        Self::FrontCamera,
        Self::UsbPort,
        Self::UnderSeatStorage,
    ];

    pub fn from_key(raw: &str) -> Option<Self> {
        match raw {
            "heatedGrips" => Some(Self::HeatedGrips),
            "topCase" => Some(Self::TopCase),
            "luggageSystem" => Some(Self::LuggageSystem),
            "carbonParts" => Some(Self::CarbonParts),
            "performanceBoost" => Some(Self::PerformanceBoost),
            "ledStop" => Some(Self::LedStop),
            "xenon" => Some(Self::Xenon),
            "gps" => Some(Self::Gps),
            "ledSignal" => Some(Self::LedSignal),
            "soundSystem" => Some(Self::SoundSystem),
            "frontCamera" => Some(Self::FrontCamera),
            "usbPort" => Some(Self::UsbPort),
            "underSeatStorage" => Some(Self::UnderSeatStorage),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::HeatedGrips => "Heated grips",
            Self::TopCase => "Top case",
            Self::LuggageSystem => "Luggage system",
            Self::CarbonParts => "Carbon parts",
            Self::PerformanceBoost => "Performance boost",
            Self::LedStop => "LED stop light",
            Self::Xenon => "Xenon headlight",
            Self::Gps => "GPS",
            Self::LedSignal => "LED signals",
            Self::SoundSystem => "Sound system",
            Self::FrontCamera => "Front camera",
            Self::UsbPort => "USB port",
            Self::UnderSeatStorage => "Under-seat storage",
        }
    }

    pub const fn weight(self) -> f64 {
        match self {
            Self::CarbonParts => 0.15,
            Self::TopCase
            | Self::LuggageSystem
            | Self::Gps
            | Self::FrontCamera
            | Self::UnderSeatStorage => 0.10,
            Self::HeatedGrips
            | Self::PerformanceBoost
            | Self::LedStop
            | Self::Xenon
            | Self::LedSignal
            | Self::SoundSystem
            | Self::UsbPort => 0.05,
        }
    }
}

/// Safety flags that are present and set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyFeatureSet(pub BTreeSet<SafetyFeature>);

/// Accessory flags that are present and set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessorySet(pub BTreeSet<Accessory>);

/// The nine inspected parts. Discriminants index into [`DamageReport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DamagePart {
    Chassis = 0,
    Engine = 1,
    Transmission = 2,
    FrontFork = 3,
    FuelTank = 4,
    Electrical = 5,
    FrontPanel = 6,
    RearPanel = 7,
    Exhaust = 8,
}

impl DamagePart {
    pub const ALL: [DamagePart; 9] = [
        Self::Chassis,
        Self::Engine,
        Self::Transmission,
        Self::FrontFork,
        Self::FuelTank,
        Self::Electrical,
        Self::FrontPanel,
        Self::RearPanel,
        Self::Exhaust,
    ];

    pub fn from_key(raw: &str) -> Option<Self> {
        match raw {
            "chassis" => Some(Self::Chassis),
            "engine" => Some(Self::Engine),
            "transmission" => Some(Self::Transmission),
            "frontFork" => Some(Self::FrontFork),
            "fuelTank" => Some(Self::FuelTank),
            "electrical" => Some(Self::Electrical),
            "frontPanel" => Some(Self::FrontPanel),
            "rearPanel" => Some(Self::RearPanel),
            "exhaust" => Some(Self::Exhaust),
            _ => None,
        }
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::Chassis => "chassis",
            Self::Engine => "engine",
            Self::Transmission => "transmission",
            Self::FrontFork => "frontFork",
            Self::FuelTank => "fuelTank",
            Self::Electrical => "electrical",
            Self::FrontPanel => "frontPanel",
            Self::RearPanel => "rearPanel",
            Self::Exhaust => "exhaust",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Chassis => "Chassis",
            Self::Engine => "Engine",
            Self::Transmission => "Transmission",
            Self::FrontFork => "Front fork",
            Self::FuelTank => "Fuel tank",
            Self::Electrical => "Electrical",
            Self::FrontPanel => "Front panel",
            Self::RearPanel => "Rear panel",
            Self::Exhaust => "Exhaust",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConditionCategory {
    Original,
    Modified,
    Damaged,
    Replaced,
}

impl ConditionCategory {
    pub fn from_key(raw: &str) -> Option<Self> {
        match raw {
            "original" => Some(Self::Original),
            "modified" => Some(Self::Modified),
            "damaged" => Some(Self::Damaged),
            "replaced" => Some(Self::Replaced),
            _ => None,
        }
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::Modified => "modified",
            Self::Damaged => "damaged",
            Self::Replaced => "replaced",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatusSeverity {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl StatusSeverity {
    pub fn from_key(raw: &str) -> Option<Self> {
        match raw {
            "excellent" => Some(Self::Excellent),
            "good" => Some(Self::Good),
            "fair" => Some(Self::Fair),
            "poor" => Some(Self::Poor),
            _ => None,
        }
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Fair => "fair",
            Self::Poor => "poor",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartCondition {
    pub condition_category: ConditionCategory,
    pub status_severity: StatusSeverity,
}

impl PartCondition {
    pub const PRISTINE: PartCondition = PartCondition {
        condition_category: ConditionCategory::Original,
        status_severity: StatusSeverity::Excellent,
    };

    pub fn status_label(&self) -> String {
        format!(
            "{} / {}",
            self.condition_category.key(),
            self.status_severity.key()
        )
    }
}

/// Inspection result for all nine parts. Completeness holds by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageReport {
    parts: [PartCondition; 9],
}

impl DamageReport {
    /// Every part original and in excellent shape.
    pub fn pristine() -> Self {
        Self {
            parts: [PartCondition::PRISTINE; 9],
        }
    }

    /// Builds a report, returning the first missing part on failure.
    pub fn from_parts(
        mut parts: BTreeMap<DamagePart, PartCondition>,
    ) -> Result<Self, DamagePart> {
        let mut report = Self::pristine();
        for part in DamagePart::ALL {
            let condition = parts.remove(&part).ok_or(part)?;
            report.parts[part as usize] = condition;
        }
        Ok(report)
    }

    pub fn with_part(mut self, part: DamagePart, condition: PartCondition) -> Self {
        self.parts[part as usize] = condition;
        self
    }

    pub fn get(&self, part: DamagePart) -> PartCondition {
        self.parts[part as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = (DamagePart, PartCondition)> + '_ {
        DamagePart::ALL.into_iter().map(|part| (part, self.get(part)))
    }
}

/// Validated request, produced by the intake guard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationInput {
    pub motorcycle_id: VehicleId,
    pub dealer_id: DealerId,
    pub user_id: UserId,
    pub mileage: u64,
    pub condition: Condition,
    pub technical: TechnicalSpecInput,
    pub safety: SafetyFeatureSet,
    pub accessories: AccessorySet,
    pub damage: DamageReport,
}

/// Wire shape of an inbound valuation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuationRequest {
    pub motorcycle_id: String,
    pub dealer_id: String,
    pub user_id: String,
    pub mileage: i64,
    pub condition: String,
    pub technical_specs: TechnicalSpecRequest,
    #[serde(default)]
    pub safety_features: BTreeMap<String, bool>,
    #[serde(default)]
    pub accessories: BTreeMap<String, bool>,
    #[serde(default)]
    pub damage_report: BTreeMap<String, PartConditionRequest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalSpecRequest {
    pub vehicle_condition: String,
    #[serde(default)]
    pub engine_power_range: Option<String>,
    #[serde(default)]
    pub cooling: Option<String>,
    #[serde(default)]
    pub exchange_available: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartConditionRequest {
    pub condition_category: String,
    pub status_severity: String,
}
