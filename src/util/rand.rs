use anyhow::{anyhow, Result};
use rand::SeedableRng;
use rand_distr::{
    num_traits::{Float, PrimInt},
    Distribution, Exp, Normal, Uniform,
};
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContinuousDistribution<F: Float> {
    Always { value: F },
    Uniform { min: F, max: F },
    Normal { mean: F, std_dev: F },
    Exponential { mean: F },
}

impl<F> ContinuousDistribution<F>
where
    F: Float,
{
    /// Rejects parameters the underlying samplers cannot be built from.
    pub fn validate(&self) -> Result<()> {
        let finite = |values: &[F]| values.iter().all(|v| v.is_finite());
        match *self {
            ContinuousDistribution::Always { value } if !finite(&[value]) => {
                Err(anyhow!("Constant value must be finite!"))
            }
            ContinuousDistribution::Uniform { min, max } if !finite(&[min, max]) || min >= max => {
                Err(anyhow!("Uniform bounds must be finite with min < max!"))
            }
            ContinuousDistribution::Normal { mean, std_dev }
                if !finite(&[mean, std_dev]) || std_dev < F::zero() =>
            {
                Err(anyhow!("Normal needs a finite mean and a non-negative std_dev!"))
            }
            ContinuousDistribution::Exponential { mean } if !finite(&[mean]) || mean <= F::zero() => {
                Err(anyhow!("Exponential mean must be positive!"))
            }
            _ => Ok(()),
        }
    }
}

impl<F> Distribution<F> for ContinuousDistribution<F>
where
    F: Float + rand_distr::uniform::SampleUniform,
    rand_distr::Exp1: rand_distr::Distribution<F>,
    rand_distr::StandardNormal: rand_distr::Distribution<F>,
{
    fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> F {
        match self {
            ContinuousDistribution::Uniform { min, max } => rng.sample(Uniform::new(min, max)),
            ContinuousDistribution::Normal { mean, std_dev } => {
                rng.sample(Normal::new(*mean, *std_dev).unwrap())
            }
            ContinuousDistribution::Exponential { mean } => {
                rng.sample(Exp::new(F::one() / *mean).unwrap())
            }
            ContinuousDistribution::Always { value } => *value,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DiscreteDistribution<I: PrimInt> {
    /// A max-exclusive uniform distribution in the range [min, max).
    Uniform {
        min: I,
        max: I,
    },
    Always {
        value: I,
    },
}

impl<I> Distribution<I> for DiscreteDistribution<I>
where
    I: PrimInt + rand_distr::uniform::SampleUniform,
{
    fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> I {
        match self {
            DiscreteDistribution::Uniform { min, max } => rng.sample(Uniform::new(min, max)),
            DiscreteDistribution::Always { value } => *value,
        }
    }
}

#[derive(Debug)]
pub struct Rng {
    rng: Xoshiro256PlusPlus,
}

impl Rng {
    #[must_use]
    pub fn from_seed(seed: u64) -> Rng {
        Rng {
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
        }
    }

    pub fn sample<R>(&mut self, dist: &impl Distribution<R>) -> R {
        dist.sample(&mut self.rng)
    }
}

#[cfg(test)]
mod tests {
    use super::{ContinuousDistribution, DiscreteDistribution, Rng};

    #[test]
    fn same_seed_same_samples() {
        let seed = 123_497_239_457;
        let nodes = DiscreteDistribution::Uniform { min: 0, max: 50 };
        let gaps = ContinuousDistribution::Exponential { mean: 20. };
        let draw = |rng: &mut Rng| (rng.sample(&nodes), rng.sample(&gaps));

        let mut a = Rng::from_seed(seed);
        let mut b = Rng::from_seed(seed);
        let v1 = (0..16).map(|_| draw(&mut a)).collect::<Vec<(usize, f64)>>();
        let v2 = (0..16).map(|_| draw(&mut b)).collect::<Vec<(usize, f64)>>();
        assert_eq!(v1, v2);
        assert!(v1.iter().all(|&(n, gap)| n < 50 && gap >= 0.));
    }

    #[test]
    fn always_is_constant() {
        let mut rng = Rng::from_seed(1);
        let dist = ContinuousDistribution::Always { value: 2.5 };
        assert!((0..10).all(|_| (rng.sample(&dist) - 2.5_f64).abs() < f64::EPSILON));
    }

    #[test]
    fn unsampleable_parameters_are_rejected() {
        let valid = [
            ContinuousDistribution::Always { value: 0. },
            ContinuousDistribution::Uniform { min: 5., max: 30. },
            ContinuousDistribution::Normal { mean: 10., std_dev: 0. },
            ContinuousDistribution::Exponential { mean: 20. },
        ];
        for dist in valid {
            assert!(dist.validate().is_ok(), "{dist:?}");
        }

        let invalid = [
            ContinuousDistribution::Always { value: f64::NAN },
            ContinuousDistribution::Uniform { min: 10., max: 10. },
            ContinuousDistribution::Uniform { min: 30., max: 5. },
            ContinuousDistribution::Normal { mean: 10., std_dev: -1. },
            ContinuousDistribution::Exponential { mean: 0. },
            ContinuousDistribution::Exponential { mean: -3. },
            ContinuousDistribution::Exponential { mean: f64::INFINITY },
        ];
        for dist in invalid {
            assert!(dist.validate().is_err(), "{dist:?}");
        }
    }
}
