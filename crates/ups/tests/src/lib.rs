//! Shared fixtures for the UPS end-to-end and property tests.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use ups_engine::{EvolutionConfig, EvolutionOrchestrator, SurrogateEvaluator, TemplateGenerator};
use ups_strategies::TemplateSynthesizer;
use ups_types::{
    AggregationPolicy, EvaluationError, Evaluator, FamilySpec, Metrics, ParamSpec, Problem,
    SearchSpace, Solution, StrategyKind, SynthesisError, SynthesisRequest, Synthesizer,
};

/// Three algorithm families, each with one tunable parameter, and a scaler
/// menu.
pub fn churn_problem() -> Problem {
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
        .with_family(
            "tree",
            FamilySpec::default().with_param(
                "depth",
                ParamSpec::Int {
                    min: 1,
                    max: 16,
                    default: 4,
                },
            ),
        )
        .with_family(
            "knn",
            FamilySpec::default().with_param(
                "k",
                ParamSpec::Int {
                    min: 1,
                    max: 15,
                    default: 5,
                },
            ),
        )
        .with_component_menu("scaler", ["none", "standard", "minmax"]);
    Problem::new("predict customer churn", "ml")
        .with_requirement("binary classifier")
        .with_search_space(space)
}

/// Orchestrator over the simulated collaborators.
pub fn surrogate_orchestrator(config: EvolutionConfig) -> EvolutionOrchestrator {
    orchestrator_with(config, Arc::new(SurrogateEvaluator::new()), Arc::new(TemplateSynthesizer::new()))
}

pub fn orchestrator_with(
    config: EvolutionConfig,
    evaluator: Arc<dyn Evaluator>,
    synthesizer: Arc<dyn Synthesizer>,
) -> EvolutionOrchestrator {
    let mut generator = TemplateGenerator::new();
    if let Some(seed) = config.seed {
        generator = generator.with_seed(seed);
    }
    match EvolutionOrchestrator::new(Arc::new(generator), evaluator, synthesizer, config) {
        Ok(orchestrator) => orchestrator,
        Err(e) => panic!("fixture config rejected: {}", e),
    }
}

pub fn accuracy(value: f64) -> Metrics {
    BTreeMap::from([("accuracy".to_string(), value)])
}

type ScoreFn = dyn Fn(&Solution) -> Result<f64, EvaluationError> + Send + Sync;

/// Evaluator driven by a closure; reports `accuracy`.
pub struct FnEvaluator {
    score: Box<ScoreFn>,
    latency: Option<Duration>,
}

impl FnEvaluator {
    pub fn new(score: impl Fn(&Solution) -> Result<f64, EvaluationError> + Send + Sync + 'static) -> Self {
        Self {
            score: Box::new(score),
            latency: None,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }
}

#[async_trait]
impl Evaluator for FnEvaluator {
    async fn evaluate(
        &self,
        solution: &Solution,
        _problem: &Problem,
    ) -> Result<Metrics, EvaluationError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        (self.score)(solution).map(accuracy)
    }

    fn aggregation_policy(&self) -> AggregationPolicy {
        AggregationPolicy::weighted([("accuracy", 1.0)])
    }
}

/// Baseline scores `baseline`; every later candidate scores strictly less
/// than everything evaluated before it.
pub fn declining_evaluator(baseline: f64) -> FnEvaluator {
    let calls = AtomicU64::new(0);
    FnEvaluator::new(move |solution| {
        if solution.origin().strategy().is_none() {
            return Ok(baseline);
        }
        let n = calls.fetch_add(1, Ordering::SeqCst) as f64;
        Ok(baseline / 2.0 - n * 1e-4)
    })
}

/// Delegates to the template synthesizer, but stalls for `kind`.
pub struct StallingSynthesizer {
    inner: TemplateSynthesizer,
    stalled: StrategyKind,
    stall: Duration,
}

impl StallingSynthesizer {
    pub fn new(stalled: StrategyKind, stall: Duration) -> Self {
        Self {
            inner: TemplateSynthesizer::new(),
            stalled,
            stall,
        }
    }
}

#[async_trait]
impl Synthesizer for StallingSynthesizer {
    async fn synthesize(&self, request: &SynthesisRequest<'_>) -> Result<String, SynthesisError> {
        if request.kind == self.stalled {
            tokio::time::sleep(self.stall).await;
        }
        self.inner.synthesize(request).await
    }
}
