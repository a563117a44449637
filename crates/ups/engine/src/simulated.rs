//! Simulated collaborators for demos and tests
//!
//! [`TemplateGenerator`] stands in for the solution generator and
//! [`SurrogateEvaluator`] for a real evaluator: a fixed, deterministic
//! objective landscape over genomes, so runs are cheap and reproducible.

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;
use ups_strategies::TemplateSynthesizer;
use ups_types::{
    AggregationPolicy, EvaluationError, Evaluator, GeneratorError, Genome, Metrics, ParamValue,
    Problem, Solution, SolutionGenerator, SolutionId,
};

/// Builds the baseline from the search space's declared defaults.
#[derive(Clone, Debug, Default)]
pub struct TemplateGenerator {
    synthesizer: TemplateSynthesizer,
    family: Option<String>,
    seed: Option<u64>,
}

impl TemplateGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from `family` instead of the first declared one.
    pub fn with_family(mut self, family: impl Into<String>) -> Self {
        self.family = Some(family.into());
        self
    }

    /// Derive the baseline id from `seed`.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_synthesizer(mut self, synthesizer: TemplateSynthesizer) -> Self {
        self.synthesizer = synthesizer;
        self
    }
}

#[async_trait]
impl SolutionGenerator for TemplateGenerator {
    async fn generate_baseline(&self, problem: &Problem) -> Result<Solution, GeneratorError> {
        let space = &problem.search_space;
        let family = match &self.family {
            Some(f) => f.clone(),
            None => space.families.keys().next().cloned().ok_or_else(|| {
                GeneratorError::Unsupported("problem declares no algorithm families".into())
            })?,
        };
        let genome = space.default_genome(&family).ok_or_else(|| {
            GeneratorError::Failed(format!("family {} is not declared by the problem", family))
        })?;

        let code = self.synthesizer.render_baseline(problem, &genome);
        let mut solution = Solution::baseline(code, genome);
        if let Some(seed) = self.seed {
            solution = solution.with_id(SolutionId::from_rng(&mut StdRng::seed_from_u64(seed)));
        }
        debug!(solution = %solution.id, family = %family, "baseline generated");
        Ok(solution)
    }
}

/// Deterministic objective over genomes, reported as an `accuracy` metric.
///
/// Each family has a base quality, each component choice a small bonus, and
/// each numeric parameter an optimum inside its declared range. Unless
/// overridden, these come from a stable hash of their names.
#[derive(Clone, Debug)]
pub struct SurrogateEvaluator {
    family_quality: BTreeMap<String, f64>,
    optima: BTreeMap<String, f64>,
    latency: Option<Duration>,
}

impl SurrogateEvaluator {
    pub fn new() -> Self {
        Self {
            family_quality: BTreeMap::new(),
            optima: BTreeMap::new(),
            latency: None,
        }
    }

    /// Base accuracy contribution of `family`, in `[0, 0.3]`.
    pub fn with_family_quality(mut self, family: impl Into<String>, quality: f64) -> Self {
        self.family_quality.insert(family.into(), quality.clamp(0.0, 0.3));
        self
    }

    /// Optimum of `param`, as a fraction of its declared range.
    pub fn with_optimum(mut self, param: impl Into<String>, at: f64) -> Self {
        self.optima.insert(param.into(), at.clamp(0.0, 1.0));
        self
    }

    /// Sleep this long before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// The accuracy a genome scores; pure.
    pub fn score(&self, genome: &Genome, problem: &Problem) -> f64 {
        let family = self
            .family_quality
            .get(&genome.family)
            .copied()
            .unwrap_or_else(|| 0.3 * unit_hash(&genome.family));

        let components = if genome.components.is_empty() {
            0.0
        } else {
            genome
                .components
                .iter()
                .map(|(slot, choice)| 0.1 * unit_hash(&format!("{}={}", slot, choice)))
                .sum::<f64>()
                / genome.components.len() as f64
        };

        let closeness: Vec<f64> = genome
            .parameters
            .iter()
            .filter_map(|(name, value)| {
                let spec = problem.search_space.param_spec(&genome.family, name)?;
                if matches!(value, ParamValue::Choice(_)) {
                    return None;
                }
                let x = spec.normalize(value)?;
                let target = self
                    .optima
                    .get(name)
                    .copied()
                    .unwrap_or_else(|| 0.2 + 0.6 * unit_hash(&format!("{}.{}", genome.family, name)));
                Some(1.0 - (x - target).abs())
            })
            .collect();
        let parameters = if closeness.is_empty() {
            0.5
        } else {
            closeness.iter().sum::<f64>() / closeness.len() as f64
        };

        (0.3 + family + components + 0.3 * parameters).clamp(0.0, 1.0)
    }
}

impl Default for SurrogateEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Evaluator for SurrogateEvaluator {
    async fn evaluate(
        &self,
        solution: &Solution,
        problem: &Problem,
    ) -> Result<Metrics, EvaluationError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let accuracy = self.score(solution.genome(), problem);
        Ok(BTreeMap::from([("accuracy".to_string(), accuracy)]))
    }

    fn aggregation_policy(&self) -> AggregationPolicy {
        AggregationPolicy::weighted([("accuracy", 1.0)])
    }
}

/// FNV-1a of `s`, mapped to `[0, 1]`.
fn unit_hash(s: &str) -> f64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in s.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    (hash >> 11) as f64 / (1u64 << 53) as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use ups_types::{FamilySpec, ParamSpec, SearchSpace};

    fn problem() -> Problem {
        let space = SearchSpace::default()
            .with_family(
                "linear",
                FamilySpec::default().with_param(
                    "alpha",
                    ParamSpec::Float {
                        min: 0.0,
                        max: 1.0,
                        default: 0.5,
                    },
                ),
            )
            .with_family("tree", FamilySpec::default())
            .with_component_menu("scaler", ["none", "standard"]);
        Problem::new("predict churn", "ml").with_search_space(space)
    }

    #[tokio::test]
    async fn generator_uses_first_family_defaults() {
        let baseline = TemplateGenerator::new()
            .generate_baseline(&problem())
            .await
            .unwrap();
        assert_eq!(baseline.genome().family, "linear");
        assert_eq!(
            baseline.genome().parameters.get("alpha"),
            Some(&ParamValue::Float(0.5))
        );
        assert_eq!(baseline.genome().components.get("scaler").map(String::as_str), Some("none"));
        assert!(baseline.code.contains("family = linear"));
        assert!(!baseline.is_evaluated());
    }

    #[tokio::test]
    async fn generator_honours_family_and_seed() {
        let generator = TemplateGenerator::new().with_family("tree").with_seed(7);
        let a = generator.generate_baseline(&problem()).await.unwrap();
        let b = generator.generate_baseline(&problem()).await.unwrap();
        assert_eq!(a.genome().family, "tree");
        assert_eq!(a.id, b.id);
    }

    #[tokio::test]
    async fn generator_fails_without_families() {
        let err = TemplateGenerator::new()
            .generate_baseline(&Problem::new("anything", "misc"))
            .await
            .unwrap_err();
        assert!(matches!(err, GeneratorError::Unsupported(_)));

        let err = TemplateGenerator::new()
            .with_family("forest")
            .generate_baseline(&problem())
            .await
            .unwrap_err();
        assert!(matches!(err, GeneratorError::Failed(_)));
    }

    #[test]
    fn surrogate_is_deterministic_and_bounded() {
        let evaluator = SurrogateEvaluator::new();
        let genome = Genome::new("linear")
            .with_component("scaler", "standard")
            .with_param("alpha", ParamValue::Float(0.3));
        let a = evaluator.score(&genome, &problem());
        let b = evaluator.score(&genome, &problem());
        assert_eq!(a, b);
        assert!((0.0..=1.0).contains(&a));
    }

    #[test]
    fn surrogate_rewards_parameters_near_optimum() {
        let evaluator = SurrogateEvaluator::new().with_optimum("alpha", 0.8);
        let near = Genome::new("linear").with_param("alpha", ParamValue::Float(0.8));
        let far = Genome::new("linear").with_param("alpha", ParamValue::Float(0.1));
        assert!(evaluator.score(&near, &problem()) > evaluator.score(&far, &problem()));
    }

    #[test]
    fn surrogate_family_quality_override() {
        let evaluator = SurrogateEvaluator::new()
            .with_family_quality("linear", 0.0)
            .with_family_quality("tree", 0.3);
        let linear = Genome::new("linear");
        let tree = Genome::new("tree");
        assert!(evaluator.score(&tree, &problem()) > evaluator.score(&linear, &problem()));
    }

    #[tokio::test]
    async fn surrogate_reports_accuracy() {
        let baseline = Solution::baseline("", Genome::new("tree"));
        let metrics = SurrogateEvaluator::new()
            .evaluate(&baseline, &problem())
            .await
            .unwrap();
        assert!(metrics.contains_key("accuracy"));
    }
}
