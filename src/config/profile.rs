use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, AnalysisResult};

/// Named preset of configuration thresholds. Parameterizes every stage of
/// the pipeline: signal thresholds, stop widths, R:R floors, plan counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum RiskProfile {
    Averse,
    Neutral,
    Risky,
}

impl Default for RiskProfile {
    fn default() -> Self {
        RiskProfile::Neutral
    }
}

impl RiskProfile {
    pub const ALL: [RiskProfile; 3] = [RiskProfile::Averse, RiskProfile::Neutral, RiskProfile::Risky];

    pub fn as_str(self) -> &'static str {
        match self {
            RiskProfile::Averse => "averse",
            RiskProfile::Neutral => "neutral",
            RiskProfile::Risky => "risky",
        }
    }

    pub fn parse(s: &str) -> AnalysisResult<RiskProfile> {
        match s {
            "averse" => Ok(RiskProfile::Averse),
            "neutral" => Ok(RiskProfile::Neutral),
            "risky" => Ok(RiskProfile::Risky),
            other => Err(AnalysisError::UnknownProfile(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trip() {
        for p in RiskProfile::ALL {
            assert_eq!(RiskProfile::parse(p.as_str()).unwrap(), p);
        }
    }

    #[test]
    fn unknown_profile_is_rejected() {
        let err = RiskProfile::parse("yolo").unwrap_err();
        assert_eq!(err.code(), "UNKNOWN_PROFILE");
    }

    #[test]
    fn default_is_neutral() {
        assert_eq!(RiskProfile::default(), RiskProfile::Neutral);
    }
}
