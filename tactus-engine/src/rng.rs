//! Random source behind the skip-probability rest.

/// Uniform rolls used to decide probabilistic rests.
///
/// Implementations must not allocate or block; they run once per step on
/// the audio thread.
pub trait RandomSource {
    /// A uniform value in `[0, 100)`.
    fn percent(&mut self) -> f32;

    /// Restart the sequence from `seed`.
    fn reseed(&mut self, seed: u64);
}

impl RandomSource for fastrand::Rng {
    fn percent(&mut self) -> f32 {
        self.f32() * 100.0
    }

    fn reseed(&mut self, seed: u64) {
        self.seed(seed);
    }
}

/// Plays back a fixed list of rolls, cycling when exhausted.
///
/// Reseeding rewinds to the first roll.
#[derive(Debug, Clone)]
pub struct ScriptedRandom {
    rolls: Vec<f32>,
    cursor: usize,
}

impl ScriptedRandom {
    pub fn new(rolls: Vec<f32>) -> Self {
        Self { rolls, cursor: 0 }
    }
}

impl RandomSource for ScriptedRandom {
    fn percent(&mut self) -> f32 {
        if self.rolls.is_empty() {
            return 0.0;
        }
        let roll = self.rolls[self.cursor];
        self.cursor = (self.cursor + 1) % self.rolls.len();
        roll
    }

    fn reseed(&mut self, _seed: u64) {
        self.cursor = 0;
    }
}
