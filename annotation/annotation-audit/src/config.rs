//! Rule configuration.
//!
//! A [`RuleConfig`] is loaded once per run and shared read-only by every
//! validator. Rule files are YAML (or JSON) documents; the rules may sit at
//! the document root or under a top-level `rules:` key.
//!
//! ```yaml
//! rules:
//!   min_lidar_points: 5
//!   size_rules:
//!     - name: vehicle
//!       keywords: [vehicle, car, truck, bus]
//!       length: [2.0, 12.0]
//!       width: [1.0, 3.0]
//!       height: [1.0, 4.5]
//! ```
//!
//! Every section other than `min_lidar_points` and `size_rules` has
//! defaults. Loading fails fast on a missing required entry or an
//! inconsistent value; nothing is silently defaulted after a parse error.

use std::f64::consts::FRAC_PI_2;
use std::path::Path;

use annotation_fusion::{ResolverConfig, YawSource};
use serde::{Deserialize, Serialize};

use crate::error::{AuditError, Result};
use crate::regime::MotionRegime;

/// Inclusive `[min, max]` range, serialized as a two-element list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Bounds {
    /// Lower bound (inclusive).
    pub min: f64,
    /// Upper bound (inclusive).
    pub max: f64,
}

impl Bounds {
    /// Creates a range.
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Returns true if `value` lies within the range, bounds included.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    fn validate(&self, what: &str) -> Result<()> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(AuditError::invalid_config(format!("{what} bounds must be finite")));
        }
        if self.min > self.max {
            return Err(AuditError::invalid_config(format!(
                "{what} bounds are inverted: [{}, {}]",
                self.min, self.max
            )));
        }
        Ok(())
    }
}

impl From<[f64; 2]> for Bounds {
    fn from([min, max]: [f64; 2]) -> Self {
        Self { min, max }
    }
}

impl From<Bounds> for [f64; 2] {
    fn from(b: Bounds) -> Self {
        [b.min, b.max]
    }
}

/// Case-insensitive substring predicate over class labels.
///
/// Keywords are lowercased on construction, so matching compares against a
/// lowercased label only.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct ClassMatcher {
    keywords: Vec<String>,
}

impl ClassMatcher {
    /// Creates a matcher from keywords in any case.
    pub fn new<S: AsRef<str>>(keywords: impl IntoIterator<Item = S>) -> Self {
        Self {
            keywords: keywords.into_iter().map(|k| k.as_ref().to_lowercase()).collect(),
        }
    }

    /// Returns the lowercased keywords.
    #[must_use]
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Returns true if any keyword is a substring of `class_name`, ignoring
    /// case.
    #[must_use]
    pub fn matches(&self, class_name: &str) -> bool {
        self.matches_lowercase(&class_name.to_lowercase())
    }

    /// Like [`matches`](Self::matches) for a label that is already lowercase.
    #[must_use]
    pub fn matches_lowercase(&self, class_lower: &str) -> bool {
        self.keywords.iter().any(|k| class_lower.contains(k.as_str()))
    }

    fn validate(&self, what: &str) -> Result<()> {
        if self.keywords.is_empty() {
            return Err(AuditError::invalid_config(format!("{what} needs at least one keyword")));
        }
        if self.keywords.iter().any(|k| k.trim().is_empty()) {
            return Err(AuditError::invalid_config(format!("{what} has an empty keyword")));
        }
        Ok(())
    }
}

impl From<Vec<String>> for ClassMatcher {
    fn from(keywords: Vec<String>) -> Self {
        Self::new(keywords)
    }
}

impl From<ClassMatcher> for Vec<String> {
    fn from(m: ClassMatcher) -> Self {
        m.keywords
    }
}

/// Admissible box dimensions for one class family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SizeRule {
    /// Rule name used in reports (`vehicle`, `pedestrian`, ...).
    pub name: String,
    /// Class labels this rule applies to.
    pub keywords: ClassMatcher,
    /// Admissible length in meters.
    pub length: Bounds,
    /// Admissible width in meters.
    pub width: Bounds,
    /// Admissible height in meters.
    pub height: Bounds,
}

impl SizeRule {
    /// Creates a size rule.
    #[must_use]
    pub fn new<S: AsRef<str>>(
        name: impl Into<String>,
        keywords: impl IntoIterator<Item = S>,
        length: [f64; 2],
        width: [f64; 2],
        height: [f64; 2],
    ) -> Self {
        Self {
            name: name.into(),
            keywords: ClassMatcher::new(keywords),
            length: length.into(),
            width: width.into(),
            height: height.into(),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(AuditError::invalid_config("size rule name must not be empty"));
        }
        let what = format!("size rule '{}'", self.name);
        self.keywords.validate(&what)?;
        self.length.validate(&format!("{what} length"))?;
        self.width.validate(&format!("{what} width"))?;
        self.height.validate(&format!("{what} height"))?;
        Ok(())
    }
}

/// Limits on object attitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttitudeLimits {
    /// Maximum |roll| in radians.
    pub max_roll: f64,
    /// Maximum |pitch| in radians.
    pub max_pitch: f64,
    /// Maximum deviation of the orientation quaternion norm from 1.
    pub norm_tolerance: f64,
}

impl Default for AttitudeLimits {
    fn default() -> Self {
        Self {
            max_roll: 0.5,
            max_pitch: 0.5,
            norm_tolerance: 0.01,
        }
    }
}

impl AttitudeLimits {
    fn validate(&self) -> Result<()> {
        positive("attitude.max_roll", self.max_roll)?;
        positive("attitude.max_pitch", self.max_pitch)?;
        positive("attitude.norm_tolerance", self.norm_tolerance)
    }
}

/// Per-regime parameters for heading alignment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegimeProfile {
    /// Multiplier applied to the base angle tolerance.
    pub tolerance_scale: f64,
    /// Planar displacement below which alignment is not checked, in meters.
    pub min_displacement: f64,
}

impl RegimeProfile {
    /// Creates a regime profile.
    #[must_use]
    pub const fn new(tolerance_scale: f64, min_displacement: f64) -> Self {
        Self {
            tolerance_scale,
            min_displacement,
        }
    }
}

/// Thresholds for the motion checks.
///
/// Speeds are in m/s, distances in meters, angles in radians and times in
/// seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MotionThresholds {
    /// Speeds below this are static.
    pub static_speed_max: f64,
    /// Speeds below this (and not static) are low speed.
    pub low_speed_max: f64,
    /// Base heading tolerance before regime scaling.
    pub angle_tolerance: f64,
    /// Static regime profile.
    pub static_regime: RegimeProfile,
    /// Low-speed regime profile.
    pub low_speed_regime: RegimeProfile,
    /// Normal-speed regime profile.
    pub normal_speed_regime: RegimeProfile,
    /// Maximum plausible acceleration magnitude.
    pub max_acceleration: f64,
    /// Maximum plausible speed between consecutive samples.
    pub max_speed: f64,
    /// Maximum angle between consecutive displacement vectors.
    pub max_direction_change: f64,
    /// Maximum rate of change of annotated heading, in rad/s.
    pub max_turn_rate: f64,
    /// Maximum fraction of intervals on which the regime may switch.
    pub max_regime_switch_ratio: f64,
    /// Maximum displacement leaving a static interval.
    pub static_jump_distance: f64,
    /// Time between consecutive frames when samples carry no timestamps.
    pub frame_interval: f64,
    /// Tracks shorter than this are not checked.
    pub min_track_len: usize,
}

impl Default for MotionThresholds {
    fn default() -> Self {
        Self {
            static_speed_max: 0.1,
            low_speed_max: 0.5,
            angle_tolerance: 0.5236,
            static_regime: RegimeProfile::new(1.5, 0.05),
            low_speed_regime: RegimeProfile::new(1.0, 0.10),
            normal_speed_regime: RegimeProfile::new(0.8, 0.20),
            max_acceleration: 3.0,
            max_speed: 8.0,
            max_direction_change: FRAC_PI_2,
            max_turn_rate: FRAC_PI_2,
            max_regime_switch_ratio: 0.6,
            static_jump_distance: 0.5,
            frame_interval: 0.1,
            min_track_len: 3,
        }
    }
}

impl MotionThresholds {
    /// Returns the profile of a regime.
    #[must_use]
    pub const fn profile(&self, regime: MotionRegime) -> &RegimeProfile {
        match regime {
            MotionRegime::Static => &self.static_regime,
            MotionRegime::LowSpeed => &self.low_speed_regime,
            MotionRegime::NormalSpeed => &self.normal_speed_regime,
        }
    }

    /// Returns the heading tolerance of a regime.
    #[must_use]
    pub fn tolerance(&self, regime: MotionRegime) -> f64 {
        self.angle_tolerance * self.profile(regime).tolerance_scale
    }

    fn validate(&self) -> Result<()> {
        positive("motion.static_speed_max", self.static_speed_max)?;
        positive("motion.low_speed_max", self.low_speed_max)?;
        if self.static_speed_max >= self.low_speed_max {
            return Err(AuditError::invalid_config(
                "motion.static_speed_max must be below motion.low_speed_max",
            ));
        }
        positive("motion.angle_tolerance", self.angle_tolerance)?;
        for (name, profile) in [
            ("static_regime", &self.static_regime),
            ("low_speed_regime", &self.low_speed_regime),
            ("normal_speed_regime", &self.normal_speed_regime),
        ] {
            positive(&format!("motion.{name}.tolerance_scale"), profile.tolerance_scale)?;
            non_negative(&format!("motion.{name}.min_displacement"), profile.min_displacement)?;
        }
        for regime in MotionRegime::ALL {
            if self.tolerance(regime) >= FRAC_PI_2 {
                return Err(AuditError::invalid_config(format!(
                    "motion heading tolerance for {regime} must be below 90 degrees"
                )));
            }
        }
        positive("motion.max_acceleration", self.max_acceleration)?;
        positive("motion.max_speed", self.max_speed)?;
        positive("motion.max_direction_change", self.max_direction_change)?;
        positive("motion.max_turn_rate", self.max_turn_rate)?;
        positive("motion.max_regime_switch_ratio", self.max_regime_switch_ratio)?;
        positive("motion.static_jump_distance", self.static_jump_distance)?;
        positive("motion.frame_interval", self.frame_interval)?;
        if self.min_track_len < 2 {
            return Err(AuditError::invalid_config("motion.min_track_len must be at least 2"));
        }
        Ok(())
    }
}

/// How sample poses are obtained.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PoseSection {
    /// Pose resolution strategy and tolerance.
    pub resolver: ResolverConfig,
    /// Source of the ego heading.
    pub yaw_source: YawSource,
    /// Pair frames with log entries by position when no timestamp is known.
    pub index_fallback: bool,
}

impl Default for PoseSection {
    fn default() -> Self {
        Self {
            resolver: ResolverConfig::default(),
            yaw_source: YawSource::default(),
            index_fallback: true,
        }
    }
}

fn default_vehicle_keywords() -> ClassMatcher {
    ClassMatcher::new(["vehicle", "car", "truck", "bus", "motorcycle", "bicycle"])
}

/// Complete rule set for one audit run.
///
/// The `attitude`, `motion` and `pose` sections may be omitted and then
/// take their defaults. A section that is present must list every field.
/// Unknown keys are rejected at every level.
///
/// # Example
///
/// ```
/// use annotation_audit::RuleConfig;
///
/// let yaml = r#"
/// rules:
///   min_lidar_points: 5
///   size_rules:
///     - name: cone
///       keywords: [Cone]
///       length: [0.2, 0.8]
///       width: [0.2, 0.8]
///       height: [0.3, 1.2]
/// "#;
///
/// let config = RuleConfig::from_yaml(yaml).unwrap();
/// assert_eq!(config.min_lidar_points, 5);
/// assert_eq!(config.size_rule_for("movable.traffic_cone").unwrap().name, "cone");
/// assert!(config.size_rule_for("animal").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    /// Minimum LiDAR returns inside a box.
    pub min_lidar_points: u32,
    /// Size rules in priority order; the first matching rule wins.
    pub size_rules: Vec<SizeRule>,
    /// Labels that receive motion checks.
    #[serde(default = "default_vehicle_keywords")]
    pub vehicle_keywords: ClassMatcher,
    /// Attitude limits.
    #[serde(default)]
    pub attitude: AttitudeLimits,
    /// Motion thresholds.
    #[serde(default)]
    pub motion: MotionThresholds,
    /// Pose handling.
    #[serde(default)]
    pub pose: PoseSection,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl RuleConfig {
    /// Creates a config with the given point minimum and size rules, and
    /// defaults elsewhere.
    #[must_use]
    pub fn new(min_lidar_points: u32, size_rules: Vec<SizeRule>) -> Self {
        Self {
            min_lidar_points,
            size_rules,
            vehicle_keywords: default_vehicle_keywords(),
            attitude: AttitudeLimits::default(),
            motion: MotionThresholds::default(),
            pose: PoseSection::default(),
        }
    }

    /// Standard road-scene rule set.
    ///
    /// Two-wheelers come before the generic vehicle rule so that
    /// `vehicle.bicycle` is sized as a cyclist.
    #[must_use]
    pub fn standard() -> Self {
        Self::new(
            5,
            vec![
                SizeRule::new(
                    "cyclist",
                    ["bicycle", "motorcycle", "cyclist"],
                    [1.0, 2.5],
                    [0.4, 1.2],
                    [1.0, 2.2],
                ),
                SizeRule::new(
                    "vehicle",
                    ["vehicle", "car", "truck", "bus"],
                    [2.0, 12.0],
                    [1.0, 3.0],
                    [1.0, 4.5],
                ),
                SizeRule::new(
                    "pedestrian",
                    ["pedestrian", "person"],
                    [0.2, 1.2],
                    [0.2, 1.2],
                    [0.8, 2.2],
                ),
                SizeRule::new("cone", ["cone"], [0.2, 0.8], [0.2, 0.8], [0.3, 1.2]),
                SizeRule::new("sign", ["sign"], [0.05, 2.0], [0.05, 2.0], [0.3, 3.0]),
            ],
        )
    }

    /// Sets the attitude limits.
    #[must_use]
    pub const fn with_attitude(mut self, attitude: AttitudeLimits) -> Self {
        self.attitude = attitude;
        self
    }

    /// Sets the motion thresholds.
    #[must_use]
    pub const fn with_motion(mut self, motion: MotionThresholds) -> Self {
        self.motion = motion;
        self
    }

    /// Sets the pose handling.
    #[must_use]
    pub const fn with_pose(mut self, pose: PoseSection) -> Self {
        self.pose = pose;
        self
    }

    /// Sets the labels that receive motion checks.
    #[must_use]
    pub fn with_vehicle_keywords(mut self, keywords: ClassMatcher) -> Self {
        self.vehicle_keywords = keywords;
        self
    }

    /// Loads and validates a rule file. `.json` files are parsed as JSON,
    /// anything else as YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| AuditError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json(&contents)
        } else {
            Self::from_yaml(&contents)
        }
    }

    /// Parses and validates a YAML rule document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is malformed, misses a required
    /// entry or fails validation.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let mut doc: serde_yaml::Value =
            serde_yaml::from_str(yaml).map_err(|e| AuditError::parse(e.to_string()))?;
        if let Some(rules) = doc.get_mut("rules") {
            doc = std::mem::take(rules);
        }
        let config: Self =
            serde_yaml::from_value(doc).map_err(|e| AuditError::parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parses and validates a JSON rule document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is malformed, misses a required
    /// entry or fails validation.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut doc: serde_json::Value =
            serde_json::from_str(json).map_err(|e| AuditError::parse(e.to_string()))?;
        if let Some(rules) = doc.get_mut("rules") {
            doc = std::mem::take(rules);
        }
        let config: Self =
            serde_json::from_value(doc).map_err(|e| AuditError::parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes the config as YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| AuditError::parse(e.to_string()))
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::InvalidConfig`] on the first inconsistent entry.
    pub fn validate(&self) -> Result<()> {
        if self.size_rules.is_empty() {
            return Err(AuditError::invalid_config("size_rules must not be empty"));
        }
        for rule in &self.size_rules {
            rule.validate()?;
        }
        self.vehicle_keywords.validate("vehicle_keywords")?;
        self.attitude.validate()?;
        self.motion.validate()?;
        self.pose.resolver.validate()?;
        Ok(())
    }

    /// Returns the first size rule matching `class_name`, if any.
    #[must_use]
    pub fn size_rule_for(&self, class_name: &str) -> Option<&SizeRule> {
        let lower = class_name.to_lowercase();
        self.size_rules
            .iter()
            .find(|rule| rule.keywords.matches_lowercase(&lower))
    }

    /// Returns true if `class_name` receives motion checks.
    #[must_use]
    pub fn is_vehicle(&self, class_name: &str) -> bool {
        self.vehicle_keywords.matches(class_name)
    }
}

fn positive(what: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(AuditError::invalid_config(format!("{what} must be positive, got {value}")))
    }
}

fn non_negative(what: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(AuditError::invalid_config(format!("{what} must be non-negative, got {value}")))
    }
}
