use async_trait::async_trait;
use std::fmt::Write;
use ups_types::{Genome, Problem, SolutionId, SynthesisError, SynthesisRequest, Synthesizer};

/// Deterministic synthesizer that renders a genome as a manifest script.
///
/// Output depends only on the request, so seeded runs reproduce byte for
/// byte.
#[derive(Clone, Debug)]
pub struct TemplateSynthesizer {
    interpreter: String,
    strict: bool,
}

impl TemplateSynthesizer {
    pub fn new() -> Self {
        Self {
            interpreter: "ups-runner".into(),
            strict: true,
        }
    }

    pub fn with_interpreter(mut self, interpreter: impl Into<String>) -> Self {
        self.interpreter = interpreter.into();
        self
    }

    /// When strict, genomes whose family the problem does not declare are
    /// rejected.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

impl Default for TemplateSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Synthesizer for TemplateSynthesizer {
    async fn synthesize(&self, request: &SynthesisRequest<'_>) -> Result<String, SynthesisError> {
        let genome = request.genome;
        let space = &request.problem.search_space;
        if self.strict && !space.is_empty() && space.family(&genome.family).is_none() {
            return Err(SynthesisError::Rejected(format!(
                "family {} is not declared by the problem",
                genome.family
            )));
        }

        let heading = format!(
            "{} (generation {}, strategy {})",
            request.problem.domain, request.generation, request.kind
        );
        let parents: Vec<_> = request.parents.iter().map(|p| p.id).collect();
        Ok(self.render(&heading, &parents, genome))
    }
}

impl TemplateSynthesizer {
    /// Render the generation-zero manifest for `genome`.
    pub fn render_baseline(&self, problem: &Problem, genome: &Genome) -> String {
        self.render(&format!("{} (baseline)", problem.domain), &[], genome)
    }

    fn render(&self, heading: &str, parents: &[SolutionId], genome: &Genome) -> String {
        let mut code = String::new();
        let _ = writeln!(code, "#!/usr/bin/env {}", self.interpreter);
        let _ = writeln!(code, "# {}", heading);
        for parent in parents {
            let _ = writeln!(code, "# parent {}", parent);
        }
        let _ = writeln!(code, "family = {}", genome.family);
        for (slot, choice) in &genome.components {
            let _ = writeln!(code, "component.{} = {}", slot, choice);
        }
        for (name, value) in &genome.parameters {
            let _ = writeln!(code, "param.{} = {}", name, value);
        }
        code
    }
}

/// Failing synthesizer for testing error paths.
#[derive(Clone, Copy, Debug, Default)]
pub struct FailingSynthesizer;

#[async_trait]
impl Synthesizer for FailingSynthesizer {
    async fn synthesize(&self, _request: &SynthesisRequest<'_>) -> Result<String, SynthesisError> {
        Err(SynthesisError::Provider("simulated synthesis failure".into()))
    }
}
