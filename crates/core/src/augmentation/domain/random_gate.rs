use rand::{Rng, RngCore};

use crate::shared::error::{AugmentError, Result};

/// Bernoulli "apply with probability p" decision.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RandomGate {
    p: f64,
}

impl RandomGate {
    pub fn new(p: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&p) {
            return Err(AugmentError::config(format!(
                "probability must be within [0, 1], got {p}"
            )));
        }
        Ok(Self { p })
    }

    pub fn always() -> Self {
        Self { p: 1.0 }
    }

    pub fn probability(&self) -> f64 {
        self.p
    }

    /// Draws one uniform value in `[0, 1)`; the gate opens when it is below `p`.
    pub fn decide(&self, rng: &mut dyn RngCore) -> bool {
        rng.gen::<f64>() < self.p
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rstest::rstest;

    #[rstest]
    #[case::negative(-0.1)]
    #[case::above_one(1.5)]
    #[case::nan(f64::NAN)]
    fn test_rejects_out_of_range(#[case] p: f64) {
        assert!(matches!(RandomGate::new(p), Err(AugmentError::Configuration(_))));
    }

    #[test]
    fn test_zero_never_opens() {
        let gate = RandomGate::new(0.0).unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        assert!((0..1000).all(|_| !gate.decide(&mut rng)));
    }

    #[test]
    fn test_one_always_opens() {
        let gate = RandomGate::always();
        let mut rng = StdRng::seed_from_u64(5);
        assert!((0..1000).all(|_| gate.decide(&mut rng)));
    }

    #[test]
    fn test_half_opens_about_half_the_time() {
        let gate = RandomGate::new(0.5).unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        let opened = (0..10_000).filter(|_| gate.decide(&mut rng)).count();
        assert!((4700..=5300).contains(&opened), "opened {opened} times");
    }
}
