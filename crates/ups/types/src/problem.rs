use crate::genome::{Genome, ParamValue};
use crate::scoring::Metrics;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Declared range of one tunable parameter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParamSpec {
    Float { min: f64, max: f64, default: f64 },
    Int { min: i64, max: i64, default: i64 },
    Choice { options: Vec<String>, default: String },
}

impl ParamSpec {
    pub fn default_value(&self) -> ParamValue {
        match self {
            ParamSpec::Float { default, .. } => ParamValue::Float(*default),
            ParamSpec::Int { default, .. } => ParamValue::Int(*default),
            ParamSpec::Choice { default, .. } => ParamValue::Choice(default.clone()),
        }
    }

    /// Position of `value` inside the declared range, in [0, 1].
    ///
    /// Choices map to their option index. Returns `None` when the value kind
    /// does not match the spec or the choice is unknown.
    pub fn normalize(&self, value: &ParamValue) -> Option<f64> {
        match (self, value) {
            (ParamSpec::Float { min, max, .. }, v) if v.as_f64().is_some() => {
                let x = v.as_f64()?;
                Some(unit(x, *min, *max))
            }
            (ParamSpec::Int { min, max, .. }, v) if v.as_f64().is_some() => {
                let x = v.as_f64()?;
                Some(unit(x, *min as f64, *max as f64))
            }
            (ParamSpec::Choice { options, .. }, ParamValue::Choice(c)) => {
                let idx = options.iter().position(|o| o == c)?;
                if options.len() <= 1 {
                    Some(0.0)
                } else {
                    Some(idx as f64 / (options.len() - 1) as f64)
                }
            }
            _ => None,
        }
    }

    /// Bring `value` back inside the declared range.
    pub fn clamp(&self, value: ParamValue) -> ParamValue {
        match (self, value) {
            (ParamSpec::Float { min, max, .. }, ParamValue::Float(v)) => {
                ParamValue::Float(v.clamp(*min, *max))
            }
            (ParamSpec::Int { min, max, .. }, ParamValue::Int(v)) => {
                ParamValue::Int(v.clamp(*min, *max))
            }
            (ParamSpec::Choice { options, default }, ParamValue::Choice(c)) => {
                if options.contains(&c) {
                    ParamValue::Choice(c)
                } else {
                    ParamValue::Choice(default.clone())
                }
            }
            _ => self.default_value(),
        }
    }

    pub fn contains(&self, value: &ParamValue) -> bool {
        match (self, value) {
            (ParamSpec::Float { min, max, .. }, ParamValue::Float(v)) => v >= min && v <= max,
            (ParamSpec::Int { min, max, .. }, ParamValue::Int(v)) => v >= min && v <= max,
            (ParamSpec::Choice { options, .. }, ParamValue::Choice(c)) => options.contains(c),
            _ => false,
        }
    }
}

fn unit(x: f64, min: f64, max: f64) -> f64 {
    if max <= min {
        return 0.0;
    }
    ((x - min) / (max - min)).clamp(0.0, 1.0)
}

/// Tunable parameters declared for one algorithm family.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FamilySpec {
    #[serde(default)]
    pub parameters: BTreeMap<String, ParamSpec>,
}

impl FamilySpec {
    pub fn with_param(mut self, name: impl Into<String>, spec: ParamSpec) -> Self {
        self.parameters.insert(name.into(), spec);
        self
    }
}

/// The declared search space: algorithm families with their parameter
/// ranges, and the menu of alternatives for every structural slot.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchSpace {
    #[serde(default)]
    pub families: BTreeMap<String, FamilySpec>,
    #[serde(default)]
    pub components: BTreeMap<String, Vec<String>>,
}

impl SearchSpace {
    pub fn with_family(mut self, name: impl Into<String>, spec: FamilySpec) -> Self {
        self.families.insert(name.into(), spec);
        self
    }

    pub fn with_component_menu(
        mut self,
        slot: impl Into<String>,
        choices: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.components
            .insert(slot.into(), choices.into_iter().map(Into::into).collect());
        self
    }

    pub fn family(&self, name: &str) -> Option<&FamilySpec> {
        self.families.get(name)
    }

    pub fn param_spec(&self, family: &str, param: &str) -> Option<&ParamSpec> {
        self.families.get(family)?.parameters.get(param)
    }

    /// Genome for `family` built from declared defaults, taking the first
    /// alternative of every structural slot.
    pub fn default_genome(&self, family: &str) -> Option<Genome> {
        let spec = self.families.get(family)?;
        let mut genome = Genome::new(family);
        for (name, p) in &spec.parameters {
            genome.parameters.insert(name.clone(), p.default_value());
        }
        for (slot, choices) in &self.components {
            if let Some(first) = choices.first() {
                genome.components.insert(slot.clone(), first.clone());
            }
        }
        Some(genome)
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }
}

/// Immutable problem description. Read-only for the lifetime of a run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    pub description: String,
    pub domain: String,
    #[serde(default)]
    pub requirements: Vec<String>,
    /// Metric name → target value that counts as success.
    #[serde(default)]
    pub success_criteria: BTreeMap<String, f64>,
    #[serde(default)]
    pub constraints: BTreeMap<String, String>,
    #[serde(default)]
    pub search_space: SearchSpace,
}

impl Problem {
    pub fn new(description: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            domain: domain.into(),
            ..Default::default()
        }
    }

    pub fn with_requirement(mut self, requirement: impl Into<String>) -> Self {
        self.requirements.push(requirement.into());
        self
    }

    pub fn with_criterion(mut self, metric: impl Into<String>, target: f64) -> Self {
        self.success_criteria.insert(metric.into(), target);
        self
    }

    pub fn with_constraint(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.constraints.insert(key.into(), value.into());
        self
    }

    pub fn with_search_space(mut self, space: SearchSpace) -> Self {
        self.search_space = space;
        self
    }

    /// True when there is at least one criterion and every one is reached.
    pub fn criteria_met(&self, metrics: &Metrics) -> bool {
        !self.success_criteria.is_empty()
            && self
                .success_criteria
                .iter()
                .all(|(name, target)| metrics.get(name).is_some_and(|v| v >= target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn space() -> SearchSpace {
        SearchSpace::default()
            .with_family(
                "random_forest",
                FamilySpec::default()
                    .with_param("trees", ParamSpec::Int { min: 10, max: 500, default: 100 })
                    .with_param(
                        "criterion",
                        ParamSpec::Choice {
                            options: vec!["gini".into(), "entropy".into()],
                            default: "gini".into(),
                        },
                    ),
            )
            .with_component_menu("preprocessing", ["none", "standard_scaler"])
    }

    #[test]
    fn default_genome_uses_defaults() {
        let g = space().default_genome("random_forest").unwrap();
        assert_eq!(g.parameters["trees"], ParamValue::Int(100));
        assert_eq!(g.components["preprocessing"], "none");
        assert!(space().default_genome("missing").is_none());
    }

    #[test]
    fn normalize_and_clamp() {
        let spec = ParamSpec::Float { min: 0.0, max: 2.0, default: 1.0 };
        assert_eq!(spec.normalize(&ParamValue::Float(1.0)), Some(0.5));
        assert_eq!(spec.clamp(ParamValue::Float(5.0)), ParamValue::Float(2.0));
        assert!(!spec.contains(&ParamValue::Float(-1.0)));

        let choice = ParamSpec::Choice {
            options: vec!["a".into(), "b".into(), "c".into()],
            default: "a".into(),
        };
        assert_eq!(choice.normalize(&ParamValue::Choice("c".into())), Some(1.0));
        assert_eq!(choice.normalize(&ParamValue::Choice("z".into())), None);
        assert_eq!(
            choice.clamp(ParamValue::Choice("z".into())),
            ParamValue::Choice("a".into())
        );
    }

    #[test]
    fn degenerate_range_normalizes_to_zero() {
        let spec = ParamSpec::Int { min: 3, max: 3, default: 3 };
        assert_eq!(spec.normalize(&ParamValue::Int(3)), Some(0.0));
    }

    #[test]
    fn criteria_met() {
        let p = Problem::new("classify", "ml").with_criterion("accuracy", 0.9);
        let mut m = Metrics::new();
        m.insert("accuracy".into(), 0.85);
        assert!(!p.criteria_met(&m));
        m.insert("accuracy".into(), 0.91);
        assert!(p.criteria_met(&m));
        assert!(!Problem::new("x", "y").criteria_met(&m));
    }

    #[test]
    fn problem_serde() {
        let p = Problem::new("d", "ml")
            .with_requirement("must run under 1s")
            .with_search_space(space());
        let json = serde_json::to_string(&p).unwrap();
        let restored: Problem = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, p);
    }
}
