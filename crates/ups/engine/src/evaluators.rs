//! Evaluators built on the collaborator contracts

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;
use ups_types::{
    AggregationPolicy, EvaluationError, Evaluator, ExecutionEnvironment, Metrics, Problem,
    ResourceLimits, Solution,
};

/// Scores a solution by running its code in an [`ExecutionEnvironment`].
///
/// The run must exit with status 0 and print its metrics as a JSON object of
/// numbers; the last stdout line that parses as one wins.
pub struct SandboxEvaluator {
    environment: Arc<dyn ExecutionEnvironment>,
    limits: ResourceLimits,
    policy: AggregationPolicy,
}

impl SandboxEvaluator {
    pub fn new(environment: Arc<dyn ExecutionEnvironment>) -> Self {
        Self {
            environment,
            limits: ResourceLimits::default(),
            policy: AggregationPolicy::uniform(),
        }
    }

    pub fn with_limits(mut self, limits: ResourceLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_policy(mut self, policy: AggregationPolicy) -> Self {
        self.policy = policy;
        self
    }
}

#[async_trait]
impl Evaluator for SandboxEvaluator {
    async fn evaluate(
        &self,
        solution: &Solution,
        _problem: &Problem,
    ) -> Result<Metrics, EvaluationError> {
        let report = self.environment.execute(&solution.code, &self.limits).await?;
        if !report.success() {
            return Err(EvaluationError::NonZeroExit {
                status: report.exit_status,
                stderr: report.stderr,
            });
        }
        let metrics = parse_metrics(&report.stdout)?;
        debug!(solution = %solution.id, elapsed_ms = report.elapsed_ms, "sandbox evaluation finished");
        Ok(metrics)
    }

    fn aggregation_policy(&self) -> AggregationPolicy {
        self.policy.clone()
    }
}

/// Extract metrics from the last stdout line that is a JSON object whose
/// values are all numbers.
pub fn parse_metrics(stdout: &str) -> Result<Metrics, EvaluationError> {
    let metrics = stdout
        .lines()
        .rev()
        .find_map(|line| {
            let object: serde_json::Map<String, serde_json::Value> =
                serde_json::from_str(line.trim()).ok()?;
            object
                .into_iter()
                .map(|(name, value)| value.as_f64().map(|v| (name, v)))
                .collect::<Option<Metrics>>()
        })
        .ok_or(EvaluationError::NoMetrics)?;
    validate(metrics)
}

/// Reject empty or non-finite metrics.
pub fn validate(metrics: Metrics) -> Result<Metrics, EvaluationError> {
    if metrics.is_empty() {
        return Err(EvaluationError::NoMetrics);
    }
    if let Some((name, value)) = metrics.iter().find(|(_, v)| !v.is_finite()) {
        return Err(EvaluationError::InvalidMetric {
            name: name.clone(),
            value: *value,
        });
    }
    Ok(metrics)
}

/// Two-stage evaluation: a cheap screen first, the full evaluator only for
/// candidates whose screened score reaches `screen_threshold`.
///
/// Screen metrics are never returned; a candidate stopped at the screen fails
/// with [`EvaluationError::Screened`].
pub struct CascadeEvaluator {
    screen: Arc<dyn Evaluator>,
    full: Arc<dyn Evaluator>,
    screen_threshold: f64,
}

impl CascadeEvaluator {
    pub fn new(screen: Arc<dyn Evaluator>, full: Arc<dyn Evaluator>, screen_threshold: f64) -> Self {
        Self {
            screen,
            full,
            screen_threshold,
        }
    }
}

#[async_trait]
impl Evaluator for CascadeEvaluator {
    async fn evaluate(
        &self,
        solution: &Solution,
        problem: &Problem,
    ) -> Result<Metrics, EvaluationError> {
        let screened = validate(self.screen.evaluate(solution, problem).await?)?;
        let score = self.screen.aggregation_policy().aggregate(&screened);
        if score < self.screen_threshold {
            debug!(solution = %solution.id, score, threshold = self.screen_threshold, "stopped at screen");
            return Err(EvaluationError::Screened {
                score,
                threshold: self.screen_threshold,
            });
        }
        self.full.evaluate(solution, problem).await
    }

    fn aggregation_policy(&self) -> AggregationPolicy {
        self.full.aggregation_policy()
    }
}
