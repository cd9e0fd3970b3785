//! Balanced mass/tension comparison statements for pairs of scene objects.
//!
//! For an ordered pair (A, B) the sampler produces a statement
//! "A is {comparator} {factor}B" together with whether it holds. The factor
//! reflects the mechanical advantage of a dynamic pulley: an object hanging
//! from one is compared against twice (or half) the other mass.
//!
//! True and false statements are returned with equal probability so that
//! the dataset carries no bias towards "yes", whatever the physics of the
//! scene. A small share of answers uses a factor other than the physically
//! relevant one, so the factor alone never gives the answer away.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::scene::{ObjectId, SceneGraph};

/// Tolerance used for every mass comparison.
pub const EPS: f64 = 1e-5;

/// Probability that an unrelated pair yields an explicit "can not answer" item.
pub const CANNOT_ANSWER_PROB: f64 = 0.3;

/// Probability of picking the true statement over the false one.
pub const RIGHT_ANSWER_PROB: f64 = 0.5;

/// Probability of swapping in an alternative factor where the branch allows it.
pub const DIVERSE_FACTOR_PROB: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Comparator {
    GreaterThan,
    LessThan,
    EqualTo,
}

impl Comparator {
    pub const ALL: [Comparator; 3] = [Self::GreaterThan, Self::LessThan, Self::EqualTo];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::GreaterThan => "greater than",
            Self::LessThan => "less than",
            Self::EqualTo => "equal to",
        }
    }

    /// Evaluates `x {self} y * k` with tolerance [`EPS`].
    pub fn holds(self, x: f64, y: f64, k: f64) -> bool {
        match self {
            Self::GreaterThan => x > y * k + EPS,
            Self::LessThan => x < y * k - EPS,
            Self::EqualTo => (x - y * k).abs() < EPS,
        }
    }

    /// The two comparators that contradict `self`.
    pub fn others(self) -> [Comparator; 2] {
        match self {
            Self::GreaterThan => [Self::LessThan, Self::EqualTo],
            Self::LessThan => [Self::GreaterThan, Self::EqualTo],
            Self::EqualTo => [Self::LessThan, Self::GreaterThan],
        }
    }
}

/// Multiplier applied to B before comparing it to A. The rendered strings
/// carry a trailing space so templates can write `"{comparator} {factor}that"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Factor {
    One,
    Twice,
    Half,
}

impl Factor {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::One => "",
            Self::Twice => "twice ",
            Self::Half => "half ",
        }
    }

    pub fn multiplier(self) -> f64 {
        match self {
            Self::One => 1.0,
            Self::Twice => 2.0,
            Self::Half => 0.5,
        }
    }
}

/// Answer attached to a comparison statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Truth {
    Yes,
    No,
    CannotAnswer,
}

impl Truth {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
            Self::CannotAnswer => "can not answer",
        }
    }
}

/// A rendered-ready comparison: "A is {comparator} {factor}B" → `truth`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Comparison {
    pub truth: Truth,
    pub comparator: Comparator,
    pub factor: Factor,
}

impl Comparison {
    fn new(truth: Truth, comparator: Comparator, factor: Factor) -> Self {
        Self {
            truth,
            comparator,
            factor,
        }
    }
}

/// Which side of the pair, if any, hangs from a dynamic pulley.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Advantage {
    Neither,
    First,
    Second,
}

/// Samples comparison statements for object pairs of one scene.
pub struct ComparativeFactSampler<'a> {
    scene: &'a SceneGraph,
}

impl<'a> ComparativeFactSampler<'a> {
    pub fn new(scene: &'a SceneGraph) -> Self {
        Self { scene }
    }

    /// Samples a comparison for the ordered pair `(a, b)`.
    ///
    /// Returns `None` when the pair yields no question: either one of the
    /// masses is unknown, or the pair is unrelated and the 70% discard branch
    /// was taken. Unrelated pairs otherwise produce a
    /// [`Truth::CannotAnswer`] statement with a random comparator.
    pub fn sample(&self, a: ObjectId, b: ObjectId, rng: &mut ChaCha8Rng) -> Option<Comparison> {
        let m1 = self.scene.get(a)?.mass?;
        let m2 = self.scene.get(b)?.mass?;

        if !self.scene.check_relation(a, b) {
            let comparator = *Comparator::ALL.choose(rng)?;
            if rng.random::<f64>() < CANNOT_ANSWER_PROB {
                return Some(Comparison::new(Truth::CannotAnswer, comparator, Factor::One));
            }
            return None;
        }

        let advantage = match (
            self.scene.has_mechanical_advantage(a),
            self.scene.has_mechanical_advantage(b),
        ) {
            (true, false) => Advantage::First,
            (false, true) => Advantage::Second,
            // Both linked cannot happen in a consistent scene; compare 1:1.
            _ => Advantage::Neither,
        };

        let (right, wrong) = match advantage {
            Advantage::Neither => Self::without_advantage(m1, m2, rng),
            Advantage::First => Self::with_advantage(m1, m2, Factor::Twice, Factor::Half, rng),
            Advantage::Second => Self::with_advantage(m1, m2, Factor::Half, Factor::Twice, rng),
        };

        if rng.random::<f64>() < RIGHT_ANSWER_PROB {
            Some(right)
        } else {
            Some(wrong)
        }
    }

    /// Static pulley: plain 1:1 comparison, wrong answers keep the empty factor.
    fn without_advantage(m1: f64, m2: f64, rng: &mut ChaCha8Rng) -> (Comparison, Comparison) {
        let actual = Self::classify(m1, m2, Factor::One);
        let right = Comparison::new(Truth::Yes, actual, Factor::One);
        let wrong = Comparison::new(Truth::No, pick(&actual.others(), rng), Factor::One);
        (right, wrong)
    }

    /// Dynamic pulley on one side. `factor` is the physically relevant
    /// multiplier and `inverse` the other non-trivial one.
    ///
    /// Decoy factors only appear where the statement stays decidable: when
    /// A exceeds the scaled B in the direction the factor already favours, a
    /// true statement may use a weaker factor, and a false one may swap its
    /// factor too. On exact equality a false statement may keep "equal to"
    /// with a different factor.
    fn with_advantage(
        m1: f64,
        m2: f64,
        factor: Factor,
        inverse: Factor,
        rng: &mut ChaCha8Rng,
    ) -> (Comparison, Comparison) {
        let actual = Self::classify(m1, m2, factor);
        let decoys = [inverse, Factor::One];
        // Twice favours "greater than", half favours "less than".
        let favoured = match factor {
            Factor::Twice => Comparator::GreaterThan,
            _ => Comparator::LessThan,
        };

        if actual == Comparator::EqualTo {
            let right = Comparison::new(Truth::Yes, Comparator::EqualTo, factor);
            let mut wrong = Comparison::new(Truth::No, pick(&actual.others(), rng), factor);
            if rng.random::<f64>() < DIVERSE_FACTOR_PROB {
                wrong = Comparison::new(Truth::No, Comparator::EqualTo, pick(&decoys, rng));
            }
            return (right, wrong);
        }

        if actual == favoured {
            let mut right = Comparison::new(Truth::Yes, actual, factor);
            if rng.random::<f64>() < DIVERSE_FACTOR_PROB {
                right = Comparison::new(Truth::Yes, actual, pick(&decoys, rng));
            }
            let wrong_comparator = pick(&actual.others(), rng);
            let mut wrong = Comparison::new(Truth::No, wrong_comparator, factor);
            if rng.random::<f64>() < DIVERSE_FACTOR_PROB {
                wrong = Comparison::new(Truth::No, wrong_comparator, pick(&decoys, rng));
            }
            return (right, wrong);
        }

        let right = Comparison::new(Truth::Yes, actual, factor);
        let wrong = Comparison::new(Truth::No, pick(&actual.others(), rng), factor);
        (right, wrong)
    }

    fn classify(m1: f64, m2: f64, factor: Factor) -> Comparator {
        let k = factor.multiplier();
        if Comparator::GreaterThan.holds(m1, m2, k) {
            Comparator::GreaterThan
        } else if Comparator::LessThan.holds(m1, m2, k) {
            Comparator::LessThan
        } else {
            Comparator::EqualTo
        }
    }
}

fn pick<T: Copy>(options: &[T; 2], rng: &mut ChaCha8Rng) -> T {
    options[rng.random_range(0..options.len())]
}
