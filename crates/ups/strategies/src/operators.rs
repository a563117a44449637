//! Genome-level variation operators shared by the strategies.

use rand::seq::SliceRandom;
use rand::Rng;
use ups_types::{FamilySpec, Genome, ParamSpec, ParamValue, SearchSpace};

/// Whether a parameter has room to move.
pub fn is_tunable(spec: &ParamSpec) -> bool {
    match spec {
        ParamSpec::Float { min, max, .. } => max > min,
        ParamSpec::Int { min, max, .. } => max > min,
        ParamSpec::Choice { options, .. } => options.len() > 1,
    }
}

/// Move one parameter value by at most `step_fraction` of its range.
///
/// The result always differs from `current` when the spec is tunable.
pub fn perturb<R: Rng + ?Sized>(
    spec: &ParamSpec,
    current: &ParamValue,
    step_fraction: f64,
    rng: &mut R,
) -> ParamValue {
    let current = spec.clamp(current.clone());
    match (spec, &current) {
        (ParamSpec::Float { min, max, .. }, ParamValue::Float(v)) => {
            let magnitude = rng.gen_range(0.1..=1.0) * step_fraction * (max - min);
            let sign = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
            let moved = (v + sign * magnitude).clamp(*min, *max);
            if moved != *v {
                ParamValue::Float(moved)
            } else {
                ParamValue::Float((v - sign * magnitude).clamp(*min, *max))
            }
        }
        (ParamSpec::Int { min, max, .. }, ParamValue::Int(v)) => {
            let reach = (((max - min) as f64) * step_fraction).round().max(1.0) as i64;
            let magnitude = rng.gen_range(1..=reach);
            let sign = if rng.gen_bool(0.5) { 1 } else { -1 };
            let moved = (v + sign * magnitude).clamp(*min, *max);
            if moved != *v {
                ParamValue::Int(moved)
            } else {
                ParamValue::Int((v - sign * magnitude).clamp(*min, *max))
            }
        }
        (ParamSpec::Choice { options, .. }, ParamValue::Choice(c)) => {
            let others: Vec<&String> = options.iter().filter(|o| *o != c).collect();
            match others.choose(rng) {
                Some(o) => ParamValue::Choice((*o).clone()),
                None => current.clone(),
            }
        }
        _ => current.clone(),
    }
}

/// Perturb each tunable parameter with probability `rate`, forcing at least
/// one change. Returns `None` when the family has nothing tunable.
pub fn mutate_parameters<R: Rng + ?Sized>(
    genome: &Genome,
    family: &FamilySpec,
    rate: f64,
    step_fraction: f64,
    rng: &mut R,
) -> Option<Genome> {
    let tunable: Vec<(&String, &ParamSpec)> = family
        .parameters
        .iter()
        .filter(|(_, spec)| is_tunable(spec))
        .collect();
    if tunable.is_empty() {
        return None;
    }

    let mut child = genome.clone();
    let mut changed = false;
    for (name, spec) in &tunable {
        if rng.gen_bool(rate) {
            let current = value_or_default(genome, name, spec);
            child
                .parameters
                .insert((*name).clone(), perturb(spec, &current, step_fraction, rng));
            changed = true;
        }
    }
    if !changed {
        let (name, spec) = tunable[rng.gen_range(0..tunable.len())];
        let current = value_or_default(genome, name, spec);
        child
            .parameters
            .insert(name.clone(), perturb(spec, &current, step_fraction, rng));
    }
    Some(child)
}

/// Uniform random genome of `family`, components drawn from the menu.
pub fn random_genome<R: Rng + ?Sized>(
    space: &SearchSpace,
    family: &str,
    rng: &mut R,
) -> Option<Genome> {
    let spec = space.family(family)?;
    let mut genome = Genome::new(family);
    for (slot, options) in &space.components {
        if let Some(choice) = options.choose(rng) {
            genome.components.insert(slot.clone(), choice.clone());
        }
    }
    for (name, param) in &spec.parameters {
        genome.parameters.insert(name.clone(), random_value(param, rng));
    }
    Some(genome)
}

pub fn random_value<R: Rng + ?Sized>(spec: &ParamSpec, rng: &mut R) -> ParamValue {
    match spec {
        ParamSpec::Float { min, max, .. } if max > min => ParamValue::Float(rng.gen_range(*min..=*max)),
        ParamSpec::Int { min, max, .. } if max > min => ParamValue::Int(rng.gen_range(*min..=*max)),
        ParamSpec::Choice { options, .. } if !options.is_empty() => {
            ParamValue::Choice(options[rng.gen_range(0..options.len())].clone())
        }
        _ => spec.default_value(),
    }
}

/// Re-home a genome into another family. Same-named parameters that fit the
/// new family's ranges are carried over; the rest take the family defaults.
pub fn switch_family(genome: &Genome, family: &str, spec: &FamilySpec) -> Genome {
    let mut child = Genome::new(family);
    child.components = genome.components.clone();
    for (name, param) in &spec.parameters {
        let value = match genome.parameters.get(name) {
            Some(v) if param.contains(v) => v.clone(),
            _ => param.default_value(),
        };
        child.parameters.insert(name.clone(), value);
    }
    child
}

fn value_or_default(genome: &Genome, name: &str, spec: &ParamSpec) -> ParamValue {
    genome
        .parameters
        .get(name)
        .cloned()
        .unwrap_or_else(|| spec.default_value())
}
