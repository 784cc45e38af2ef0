use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Caller convention: a limit of `-1` means "unlimited".
pub const UNLIMITED: i64 = -1;

/// Well-known limit keys.
pub mod limits {
    pub const MAX_CLIENTS: &str = "max_clients";
    pub const MAX_JOBS_PER_MONTH: &str = "max_jobs_per_month";
    pub const MAX_COLLABORATORS: &str = "max_collaborators";
}

/// Well-known feature toggle keys.
pub mod features {
    pub const JOB_SCHEDULING: &str = "job_scheduling";
    pub const CALENDAR: &str = "calendar";
    pub const REPORTS: &str = "reports";
}

/// Typed schema for the feature blob stored on plans and plan configurations.
///
/// The wire shape mixes flat feature toggles with nested maps for limits,
/// page access, field visibility and permissions. Everything is validated
/// once here at the boundary; consumers never re-parse the raw JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFeatures {
    #[serde(default)]
    pub limits: BTreeMap<String, i64>,

    #[serde(default)]
    pub page_access: BTreeMap<String, bool>,

    #[serde(default)]
    pub field_visibility: BTreeMap<String, bool>,

    #[serde(default)]
    pub permissions: BTreeMap<String, bool>,

    /// Legacy field that arrives as a comma-separated string, an array or a
    /// single string. Normalized into a string set at deserialization time.
    #[serde(default, deserialize_with = "deserialize_page_set")]
    pub visible_pages: BTreeSet<String>,

    /// Remaining top-level keys are plain feature toggles.
    #[serde(flatten)]
    pub toggles: BTreeMap<String, bool>,
}

impl ConfigFeatures {
    /// Validates a raw JSONB blob into the typed schema.
    pub fn from_value(value: &serde_json::Value) -> serde_json::Result<Self> {
        serde_json::from_value(value.clone())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PageSetRepr {
    Many(Vec<String>),
    One(String),
}

fn deserialize_page_set<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<PageSetRepr>::deserialize(deserializer)?;
    let pages = match raw {
        None => Vec::new(),
        Some(PageSetRepr::Many(values)) => values,
        Some(PageSetRepr::One(value)) => value.split(',').map(str::to_string).collect(),
    };

    Ok(pages
        .into_iter()
        .map(|page| page.trim().to_string())
        .filter(|page| !page.is_empty())
        .collect())
}

/// Effective entitlements for one user: the active plan's defaults with the
/// user's plan-configuration override layered on top. Pure lookups, no side
/// effects; absent keys fall through to the call-site fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitlementSet {
    pub plan_id: Option<Uuid>,
    pub features: ConfigFeatures,
}

impl EntitlementSet {
    pub fn new(plan_id: Option<Uuid>, features: ConfigFeatures) -> Self {
        Self { plan_id, features }
    }

    /// Layer an optional per-user override on top of plan defaults. Override
    /// keys win per entry; absent keys keep the plan default. A non-empty
    /// override page set replaces the default set wholesale.
    pub fn from_layers(
        plan_id: Option<Uuid>,
        defaults: &ConfigFeatures,
        overrides: Option<&ConfigFeatures>,
    ) -> Self {
        let mut features = defaults.clone();

        if let Some(overrides) = overrides {
            features.toggles.extend(
                overrides
                    .toggles
                    .iter()
                    .map(|(key, value)| (key.clone(), *value)),
            );
            features.limits.extend(
                overrides
                    .limits
                    .iter()
                    .map(|(key, value)| (key.clone(), *value)),
            );
            features.page_access.extend(
                overrides
                    .page_access
                    .iter()
                    .map(|(key, value)| (key.clone(), *value)),
            );
            features.field_visibility.extend(
                overrides
                    .field_visibility
                    .iter()
                    .map(|(key, value)| (key.clone(), *value)),
            );
            features.permissions.extend(
                overrides
                    .permissions
                    .iter()
                    .map(|(key, value)| (key.clone(), *value)),
            );

            if !overrides.visible_pages.is_empty() {
                features.visible_pages = overrides.visible_pages.clone();
            }
        }

        Self { plan_id, features }
    }

    pub fn has_feature(&self, feature_id: &str) -> bool {
        self.has_feature_or(feature_id, false)
    }

    pub fn has_feature_or(&self, feature_id: &str, fallback: bool) -> bool {
        self.features
            .toggles
            .get(feature_id)
            .copied()
            .unwrap_or(fallback)
    }

    pub fn get_limit(&self, limit_id: &str) -> i64 {
        self.get_limit_or(limit_id, UNLIMITED)
    }

    pub fn get_limit_or(&self, limit_id: &str, fallback: i64) -> i64 {
        self.features
            .limits
            .get(limit_id)
            .copied()
            .unwrap_or(fallback)
    }

    /// Permission checks are default-deny: a permission absent from the
    /// configuration is never granted.
    pub fn has_permission(&self, permission_id: &str) -> bool {
        self.features
            .permissions
            .get(permission_id)
            .copied()
            .unwrap_or(false)
    }

    pub fn can_access_page(&self, page_id: &str, fallback: bool) -> bool {
        self.features
            .page_access
            .get(page_id)
            .copied()
            .unwrap_or(fallback)
    }

    pub fn is_field_visible(&self, field_id: &str, fallback: bool) -> bool {
        self.features
            .field_visibility
            .get(field_id)
            .copied()
            .unwrap_or(fallback)
    }

    /// Whether one more countable item fits under the named limit.
    pub fn allows_one_more(&self, limit_id: &str, current_count: i64) -> bool {
        let limit = self.get_limit(limit_id);
        limit == UNLIMITED || current_count < limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_features() -> ConfigFeatures {
        serde_json::from_value(json!({
            "calendar": true,
            "reports": false,
            "limits": { "max_clients": 5 },
            "pageAccess": { "dashboard": true },
            "fieldVisibility": { "client_phone": false },
            "permissions": { "delete_jobs": true }
        }))
        .unwrap()
    }

    #[test]
    fn present_feature_returns_exact_boolean_regardless_of_fallback() {
        let entitlements = EntitlementSet::new(None, sample_features());

        assert!(entitlements.has_feature_or("calendar", false));
        assert!(entitlements.has_feature_or("calendar", true));
        assert!(!entitlements.has_feature_or("reports", true));
        assert!(!entitlements.has_feature_or("reports", false));
    }

    #[test]
    fn absent_feature_returns_fallback() {
        let entitlements = EntitlementSet::new(None, sample_features());

        assert!(!entitlements.has_feature("time_tracking"));
        assert!(entitlements.has_feature_or("time_tracking", true));
    }

    #[test]
    fn present_limit_returns_exact_number_and_is_idempotent() {
        let entitlements = EntitlementSet::new(None, sample_features());

        assert_eq!(entitlements.get_limit("max_clients"), 5);
        assert_eq!(entitlements.get_limit("max_clients"), 5);
        assert_eq!(entitlements.get_limit_or("max_clients", 99), 5);
    }

    #[test]
    fn absent_limit_defaults_to_unlimited() {
        let entitlements = EntitlementSet::new(None, sample_features());

        assert_eq!(entitlements.get_limit("max_jobs"), UNLIMITED);
        assert_eq!(entitlements.get_limit_or("max_jobs", 10), 10);
    }

    #[test]
    fn resolves_calendar_scenario() {
        let features: ConfigFeatures = serde_json::from_value(json!({
            "calendar": true,
            "limits": { "max_clients": 5 }
        }))
        .unwrap();
        let entitlements = EntitlementSet::new(None, features);

        assert!(entitlements.has_feature("calendar"));
        assert!(!entitlements.has_feature("reports"));
        assert_eq!(entitlements.get_limit("max_clients"), 5);
        assert_eq!(entitlements.get_limit("max_jobs"), -1);
    }

    #[test]
    fn permissions_are_default_deny() {
        let entitlements = EntitlementSet::new(None, sample_features());

        assert!(entitlements.has_permission("delete_jobs"));
        assert!(!entitlements.has_permission("export_reports"));
    }

    #[test]
    fn page_and_field_lookups_honor_fallback() {
        let entitlements = EntitlementSet::new(None, sample_features());

        assert!(entitlements.can_access_page("dashboard", false));
        assert!(!entitlements.can_access_page("billing", false));
        assert!(entitlements.can_access_page("billing", true));
        assert!(!entitlements.is_field_visible("client_phone", true));
        assert!(entitlements.is_field_visible("client_email", true));
    }

    #[test]
    fn override_wins_per_key_and_defaults_fill_the_rest() {
        let defaults: ConfigFeatures = serde_json::from_value(json!({
            "calendar": true,
            "reports": true,
            "limits": { "max_clients": 5, "max_jobs_per_month": 20 }
        }))
        .unwrap();
        let overrides: ConfigFeatures = serde_json::from_value(json!({
            "reports": false,
            "limits": { "max_clients": 50 }
        }))
        .unwrap();

        let entitlements = EntitlementSet::from_layers(None, &defaults, Some(&overrides));

        assert!(entitlements.has_feature("calendar"));
        assert!(!entitlements.has_feature("reports"));
        assert_eq!(entitlements.get_limit("max_clients"), 50);
        assert_eq!(entitlements.get_limit("max_jobs_per_month"), 20);
    }

    #[test]
    fn visible_pages_accepts_csv_array_and_single_string() {
        let from_csv: ConfigFeatures =
            serde_json::from_value(json!({ "visiblePages": "jobs, clients ,reports" })).unwrap();
        let from_array: ConfigFeatures =
            serde_json::from_value(json!({ "visiblePages": ["jobs", "clients", "reports"] }))
                .unwrap();
        let from_single: ConfigFeatures =
            serde_json::from_value(json!({ "visiblePages": "jobs" })).unwrap();

        let expected: BTreeSet<String> = ["jobs", "clients", "reports"]
            .into_iter()
            .map(str::to_string)
            .collect();
        assert_eq!(from_csv.visible_pages, expected);
        assert_eq!(from_array.visible_pages, expected);
        assert_eq!(
            from_single.visible_pages,
            BTreeSet::from(["jobs".to_string()])
        );
    }

    #[test]
    fn allows_one_more_treats_unlimited_as_no_ceiling() {
        let entitlements = EntitlementSet::new(None, sample_features());

        assert!(entitlements.allows_one_more("max_clients", 4));
        assert!(!entitlements.allows_one_more("max_clients", 5));
        assert!(entitlements.allows_one_more("max_jobs_per_month", 1_000_000));
    }

    #[test]
    fn rejects_non_boolean_feature_toggle() {
        let result: Result<ConfigFeatures, _> =
            serde_json::from_value(json!({ "calendar": "yes" }));

        assert!(result.is_err());
    }
}
