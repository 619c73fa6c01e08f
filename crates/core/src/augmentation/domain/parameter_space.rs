use std::collections::BTreeMap;

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::shared::error::{AugmentError, Result};

/// One concrete parameter value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    IntList(Vec<i64>),
    FloatList(Vec<f64>),
    TextList(Vec<String>),
}

/// How a named parameter gets its value on each activation.
///
/// Uniform ranges are sampled in the units they are declared in: a `*_db`
/// parameter is uniform in decibels, a linear amplitude is uniform in linear
/// amplitude.
#[derive(Clone, Debug, PartialEq)]
pub enum ParamSpec {
    Fixed(ParamValue),
    Uniform { min: f64, max: f64 },
    /// Inclusive integer range.
    UniformInt { min: i64, max: i64 },
    Choice(Vec<ParamValue>),
    /// A fresh non-negative integer used to seed per-activation randomness
    /// (e.g. noise realizations), so frozen parameters replay it exactly.
    Seed,
}

impl ParamSpec {
    fn sample(&self, rng: &mut dyn RngCore) -> ParamValue {
        match self {
            ParamSpec::Fixed(value) => value.clone(),
            ParamSpec::Uniform { min, max } => {
                if min == max {
                    ParamValue::Float(*min)
                } else {
                    ParamValue::Float(rng.gen_range(*min..=*max))
                }
            }
            ParamSpec::UniformInt { min, max } => ParamValue::Int(rng.gen_range(*min..=*max)),
            ParamSpec::Choice(choices) => choices[rng.gen_range(0..choices.len())].clone(),
            ParamSpec::Seed => ParamValue::Int(rng.gen_range(0..i64::MAX)),
        }
    }
}

/// Concrete values produced for a single activation, keyed by name.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SampledParameters(BTreeMap<String, ParamValue>);

impl SampledParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ParamValue) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.0.iter()
    }

    pub fn float(&self, name: &str) -> Result<f64> {
        match self.require(name)? {
            ParamValue::Float(v) => Ok(*v),
            ParamValue::Int(v) => Ok(*v as f64),
            other => Err(type_mismatch(name, "a number", other)),
        }
    }

    pub fn int(&self, name: &str) -> Result<i64> {
        match self.require(name)? {
            ParamValue::Int(v) => Ok(*v),
            other => Err(type_mismatch(name, "an integer", other)),
        }
    }

    pub fn seed(&self, name: &str) -> Result<u64> {
        let value = self.int(name)?;
        u64::try_from(value).map_err(|_| {
            AugmentError::Replay(format!("parameter '{name}' is a negative seed ({value})"))
        })
    }

    pub fn text(&self, name: &str) -> Result<&str> {
        match self.require(name)? {
            ParamValue::Text(v) => Ok(v),
            other => Err(type_mismatch(name, "a string", other)),
        }
    }

    /// Integer list interpreted as indices, each checked against `len`.
    pub fn indices(&self, name: &str, len: usize) -> Result<Vec<usize>> {
        let values = match self.require(name)? {
            ParamValue::IntList(v) => v,
            other => return Err(type_mismatch(name, "an index list", other)),
        };
        values
            .iter()
            .map(|&i| {
                usize::try_from(i)
                    .ok()
                    .filter(|&i| i < len)
                    .ok_or_else(|| {
                        AugmentError::Replay(format!(
                            "index {i} in '{name}' is out of range for {len} transforms"
                        ))
                    })
            })
            .collect()
    }

    /// Number list; integers are widened. An empty list may come back from
    /// JSON as any list kind.
    pub fn floats(&self, name: &str) -> Result<Vec<f64>> {
        match self.require(name)? {
            ParamValue::FloatList(v) => Ok(v.clone()),
            ParamValue::IntList(v) => Ok(v.iter().map(|&i| i as f64).collect()),
            ParamValue::TextList(v) if v.is_empty() => Ok(Vec::new()),
            other => Err(type_mismatch(name, "a number list", other)),
        }
    }

    pub fn texts(&self, name: &str) -> Result<&[String]> {
        match self.require(name)? {
            ParamValue::TextList(v) => Ok(v),
            ParamValue::IntList(v) if v.is_empty() => Ok(&[]),
            ParamValue::FloatList(v) if v.is_empty() => Ok(&[]),
            other => Err(type_mismatch(name, "a string list", other)),
        }
    }

    fn require(&self, name: &str) -> Result<&ParamValue> {
        self.0
            .get(name)
            .ok_or_else(|| AugmentError::Replay(format!("missing parameter '{name}'")))
    }
}

fn type_mismatch(name: &str, expected: &str, found: &ParamValue) -> AugmentError {
    AugmentError::Replay(format!(
        "parameter '{name}' should be {expected}, found {found:?}"
    ))
}

/// Checks that `[min, max]` is a range a float can be drawn from: both
/// bounds finite, ordered, and with a finite width.
pub fn check_range(name: &str, min: f64, max: f64) -> Result<()> {
    if !min.is_finite() || !max.is_finite() {
        return Err(AugmentError::config(format!(
            "{name}: range bounds must be finite, got [{min}, {max}]"
        )));
    }
    if min > max {
        return Err(AugmentError::config(format!(
            "{name}: minimum {min} must not exceed maximum {max}"
        )));
    }
    if !(max - min).is_finite() {
        return Err(AugmentError::config(format!(
            "{name}: range [{min}, {max}] is too wide to sample"
        )));
    }
    Ok(())
}

/// Ordered set of parameter declarations owned by one operator instance.
///
/// Bounds are validated while the space is built, so sampling never fails.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParameterSpace {
    declarations: Vec<(String, ParamSpec)>,
}

impl ParameterSpace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fixed(mut self, name: &str, value: ParamValue) -> Self {
        self.declarations
            .push((name.to_string(), ParamSpec::Fixed(value)));
        self
    }

    pub fn uniform(mut self, name: &str, min: f64, max: f64) -> Result<Self> {
        check_range(name, min, max)?;
        self.declarations
            .push((name.to_string(), ParamSpec::Uniform { min, max }));
        Ok(self)
    }

    pub fn uniform_int(mut self, name: &str, min: i64, max: i64) -> Result<Self> {
        if min > max {
            return Err(AugmentError::config(format!(
                "{name}: minimum {min} must not exceed maximum {max}"
            )));
        }
        self.declarations
            .push((name.to_string(), ParamSpec::UniformInt { min, max }));
        Ok(self)
    }

    pub fn choice(mut self, name: &str, choices: Vec<ParamValue>) -> Result<Self> {
        if choices.is_empty() {
            return Err(AugmentError::config(format!(
                "{name}: at least one choice is required"
            )));
        }
        self.declarations
            .push((name.to_string(), ParamSpec::Choice(choices)));
        Ok(self)
    }

    pub fn seed(mut self, name: &str) -> Self {
        self.declarations.push((name.to_string(), ParamSpec::Seed));
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.declarations.iter().map(|(name, _)| name.as_str())
    }

    pub fn spec(&self, name: &str) -> Option<&ParamSpec> {
        self.declarations
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, spec)| spec)
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Draws every declared parameter once, in declaration order.
    pub fn sample(&self, rng: &mut dyn RngCore) -> SampledParameters {
        let mut params = SampledParameters::new();
        for (name, spec) in &self.declarations {
            params.insert(name.clone(), spec.sample(rng));
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rstest::rstest;

    #[test]
    fn test_uniform_stays_in_bounds() {
        let space = ParameterSpace::new().uniform("gain_db", -6.0, 6.0).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let value = space.sample(&mut rng).float("gain_db").unwrap();
            assert!((-6.0..=6.0).contains(&value));
        }
    }

    #[test]
    fn test_degenerate_range_returns_bound() {
        let space = ParameterSpace::new().uniform("snr_db", 5.0, 5.0).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(space.sample(&mut rng).float("snr_db").unwrap(), 5.0);
    }

    #[rstest]
    #[case::inverted(10.0, 3.0)]
    #[case::nan_min(f64::NAN, 3.0)]
    #[case::infinite_max(0.0, f64::INFINITY)]
    #[case::overflowing_width(-1e308, 1e308)]
    fn test_invalid_uniform_bounds_rejected(#[case] min: f64, #[case] max: f64) {
        let result = ParameterSpace::new().uniform("snr_db", min, max);
        assert!(matches!(result, Err(AugmentError::Configuration(_))));
    }

    #[test]
    fn test_empty_choice_rejected() {
        let result = ParameterSpace::new().choice("noise_path", vec![]);
        assert!(matches!(result, Err(AugmentError::Configuration(_))));
    }

    #[test]
    fn test_inverted_int_range_rejected() {
        assert!(ParameterSpace::new().uniform_int("count", 3, 1).is_err());
    }

    #[test]
    fn test_choice_draws_every_option() {
        let choices = vec![
            ParamValue::Text("a.wav".into()),
            ParamValue::Text("b.wav".into()),
            ParamValue::Text("c.wav".into()),
        ];
        let space = ParameterSpace::new()
            .choice("noise_path", choices.clone())
            .unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            seen.insert(space.sample(&mut rng).text("noise_path").unwrap().to_string());
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_same_seed_same_samples() {
        let space = ParameterSpace::new()
            .uniform("a", 0.0, 1.0)
            .unwrap()
            .seed("noise_seed")
            .fixed("mode", ParamValue::Text("relative".into()));
        let mut rng_a = StdRng::seed_from_u64(42);
        let mut rng_b = StdRng::seed_from_u64(42);
        for _ in 0..20 {
            assert_eq!(space.sample(&mut rng_a), space.sample(&mut rng_b));
        }
    }

    #[test]
    fn test_sample_keeps_declared_names() {
        let space = ParameterSpace::new()
            .uniform("t", 0.0, 0.5)
            .unwrap()
            .seed("seed");
        let names: Vec<_> = space.names().collect();
        assert_eq!(names, vec!["t", "seed"]);
        assert_eq!(space.sample(&mut StdRng::seed_from_u64(0)).len(), 2);
    }

    #[test]
    fn test_typed_getters_report_mismatch() {
        let mut params = SampledParameters::new();
        params.insert("path", ParamValue::Text("x.wav".into()));
        assert!(matches!(params.float("path"), Err(AugmentError::Replay(_))));
        assert!(matches!(params.float("missing"), Err(AugmentError::Replay(_))));
    }

    #[test]
    fn test_float_getter_accepts_integers() {
        let mut params = SampledParameters::new();
        params.insert("snr_db", ParamValue::Int(20));
        assert_eq!(params.float("snr_db").unwrap(), 20.0);
    }

    #[test]
    fn test_indices_checked_against_length() {
        let mut params = SampledParameters::new();
        params.insert("order", ParamValue::IntList(vec![2, 0, 1]));
        assert_eq!(params.indices("order", 3).unwrap(), vec![2, 0, 1]);
        assert!(params.indices("order", 2).is_err());
    }

    #[test]
    fn test_json_values_keep_their_kind() {
        let mut params = SampledParameters::new();
        params.insert("snr_db", ParamValue::Float(12.5));
        params.insert("noise_seed", ParamValue::Int(99));
        params.insert("noise_path", ParamValue::Text("/n/rain.wav".into()));
        params.insert("order", ParamValue::IntList(vec![1, 0]));
        params.insert("start_times", ParamValue::FloatList(vec![0.5, 2.0]));
        params.insert("noise_paths", ParamValue::TextList(vec!["/n/door.wav".into()]));
        let json = serde_json::to_string(&params).unwrap();
        let back: SampledParameters = serde_json::from_str(&json).unwrap();
        assert_eq!(back, params);
    }

    #[test]
    fn test_empty_lists_read_as_any_list_kind() {
        let back: SampledParameters =
            serde_json::from_str(r#"{"start_times": [], "noise_paths": []}"#).unwrap();
        assert!(back.floats("start_times").unwrap().is_empty());
        assert!(back.texts("noise_paths").unwrap().is_empty());
    }

    #[test]
    fn test_list_getters_report_mismatch() {
        let mut params = SampledParameters::new();
        params.insert("noise_paths", ParamValue::TextList(vec!["a.wav".into()]));
        params.insert("gain", ParamValue::Float(1.0));
        assert!(matches!(params.floats("noise_paths"), Err(AugmentError::Replay(_))));
        assert!(matches!(params.texts("gain"), Err(AugmentError::Replay(_))));
    }
}
