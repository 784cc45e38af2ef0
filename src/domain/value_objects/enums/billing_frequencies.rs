use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Default, Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum BillingFrequency {
    #[default]
    Monthly,
    Yearly,
}

impl Display for BillingFrequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let frequency = match self {
            BillingFrequency::Monthly => "monthly",
            BillingFrequency::Yearly => "yearly",
        };
        write!(f, "{}", frequency)
    }
}

impl BillingFrequency {
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "monthly" => Some(BillingFrequency::Monthly),
            "yearly" => Some(BillingFrequency::Yearly),
            _ => None,
        }
    }

    pub fn months(&self) -> u32 {
        match self {
            BillingFrequency::Monthly => 1,
            BillingFrequency::Yearly => 12,
        }
    }
}
