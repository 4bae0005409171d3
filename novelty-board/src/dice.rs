//! Dice: face sets, distribution and type tags, and seeded roll streams.
use hmac::{Hmac, Mac};
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::{BoardError, BoardResult};
use crate::numbers::u32_to_f64;
use crate::registry::{Binding, DieRollFn, ExtensionRegistry};

/// How faces are weighted when rolling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DieDistribution {
    #[default]
    Uniform,
    Biased,
}

impl DieDistribution {
    /// Registry name of the roll strategy implementing this distribution.
    #[must_use]
    pub const fn handler_name(self) -> &'static str {
        match self {
            Self::Uniform => "uniform_die_roll",
            Self::Biased => "biased_die_roll",
        }
    }
}

/// Filter applied to the face set before rolling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DieType {
    #[default]
    Consecutive,
    OddOnly,
    EvenOnly,
}

impl DieType {
    #[must_use]
    pub const fn admits(self, face: u32) -> bool {
        match self {
            Self::Consecutive => true,
            Self::OddOnly => face % 2 == 1,
            Self::EvenOnly => face % 2 == 0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Die {
    faces: Vec<u32>,
    distribution: DieDistribution,
    die_type: DieType,
    roll: Binding<DieRollFn>,
}

impl Die {
    /// # Errors
    ///
    /// Returns [`BoardError::Validation`] when the type filter leaves no faces, and
    /// [`BoardError::UnknownExtension`] when the distribution's roll strategy is missing.
    pub fn new(
        faces: Vec<u32>,
        distribution: DieDistribution,
        die_type: DieType,
        registry: &ExtensionRegistry,
    ) -> BoardResult<Self> {
        check_faces(&faces, die_type)?;
        let roll = registry.resolve_die_roll(distribution.handler_name())?;
        Ok(Self {
            faces,
            distribution,
            die_type,
            roll,
        })
    }

    #[must_use]
    pub fn faces(&self) -> &[u32] {
        &self.faces
    }

    #[must_use]
    pub const fn distribution(&self) -> DieDistribution {
        self.distribution
    }

    #[must_use]
    pub const fn die_type(&self) -> DieType {
        self.die_type
    }

    #[must_use]
    pub fn roll_strategy(&self) -> &str {
        self.roll.name()
    }

    /// Face set after the type filter.
    #[must_use]
    pub fn effective_faces(&self) -> Vec<u32> {
        filtered(&self.faces, self.die_type)
    }

    pub fn roll(&self, rng: &mut dyn RngCore) -> u32 {
        (self.roll.handler())(&self.effective_faces(), rng)
    }

    /// Replace the face set.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Validation`] when the current type filter would leave no faces.
    pub fn set_faces(&mut self, faces: Vec<u32>) -> BoardResult<()> {
        check_faces(&faces, self.die_type)?;
        self.faces = faces;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`BoardError::UnknownExtension`] when the roll strategy is not registered.
    pub fn set_distribution(
        &mut self,
        distribution: DieDistribution,
        registry: &ExtensionRegistry,
    ) -> BoardResult<()> {
        self.roll = registry.resolve_die_roll(distribution.handler_name())?;
        self.distribution = distribution;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`BoardError::Validation`] when the filter would leave no faces.
    pub fn set_die_type(&mut self, die_type: DieType) -> BoardResult<()> {
        check_faces(&self.faces, die_type)?;
        self.die_type = die_type;
        Ok(())
    }
}

fn filtered(faces: &[u32], die_type: DieType) -> Vec<u32> {
    faces
        .iter()
        .copied()
        .filter(|face| die_type.admits(*face))
        .collect()
}

fn check_faces(faces: &[u32], die_type: DieType) -> BoardResult<()> {
    if faces.is_empty() {
        return Err(BoardError::validation("die face set is empty"));
    }
    if filtered(faces, die_type).is_empty() {
        return Err(BoardError::validation(format!(
            "die type {die_type:?} leaves no faces of {faces:?}"
        )));
    }
    Ok(())
}

/// Pick a face with equal probability.
pub fn uniform_die_roll(faces: &[u32], rng: &mut dyn RngCore) -> u32 {
    if faces.is_empty() {
        return 0;
    }
    faces[rng.gen_range(0..faces.len())]
}

/// Probability of each face under the biased distribution: face value over the face sum.
#[must_use]
pub fn biased_weights(faces: &[u32]) -> Vec<f64> {
    let total: f64 = faces.iter().copied().map(u32_to_f64).sum();
    if total <= 0.0 {
        return vec![0.0; faces.len()];
    }
    faces.iter().map(|face| u32_to_f64(*face) / total).collect()
}

/// Pick a face with probability proportional to its value.
pub fn biased_die_roll(faces: &[u32], rng: &mut dyn RngCore) -> u32 {
    let weights = biased_weights(faces);
    if weights.iter().all(|w| *w <= 0.0) {
        return uniform_die_roll(faces, rng);
    }
    let mut remaining = rng.r#gen::<f64>();
    for (face, weight) in faces.iter().zip(&weights) {
        if remaining < *weight {
            return *face;
        }
        remaining -= weight;
    }
    // float rounding can leave a sliver past the last weight
    faces
        .iter()
        .zip(&weights)
        .rev()
        .find(|(_, w)| **w > 0.0)
        .map_or(0, |(face, _)| *face)
}

/// One independent RNG stream per die, derived from a user-visible seed.
#[derive(Debug, Clone)]
pub struct DiceStreams {
    seed: u64,
    streams: Vec<ChaCha20Rng>,
}

impl DiceStreams {
    #[must_use]
    pub fn from_user_seed(seed: u64, dice: usize) -> Self {
        let streams = (0..dice)
            .map(|index| ChaCha20Rng::seed_from_u64(derive_stream_seed(seed, index)))
            .collect();
        Self { seed, streams }
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.streams.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// Stream for die `index`, growing the bundle when the die count was raised.
    pub fn stream(&mut self, index: usize) -> &mut ChaCha20Rng {
        while self.streams.len() <= index {
            let next = self.streams.len();
            self.streams
                .push(ChaCha20Rng::seed_from_u64(derive_stream_seed(self.seed, next)));
        }
        &mut self.streams[index]
    }
}

fn derive_stream_seed(user_seed: u64, die_index: usize) -> u64 {
    let tag = format!("die-{die_index}");
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()) else {
        return user_seed ^ die_index as u64;
    };
    mac.update(tag.as_bytes());
    let digest = mac.finalize().into_bytes();
    let mut seed_bytes = [0_u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed_bytes)
}
