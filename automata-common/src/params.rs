use serde::{Deserialize, Serialize};

/// Index of each transition probability inside [`Params::probs`].
pub const MUTATION: usize = 0;
pub const PROLIFERATION: usize = 1;
pub const EFFECTION: usize = 2;
pub const DEATH: usize = 3;
pub const REBIRTH: usize = 4;

/// Update rule applied to every cell once per step.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModelVariant {
    /// Fixed effection probability `probs[2]`.
    #[default]
    Simple,
    /// Effection probability modulated by local cancer and effector density.
    Extended,
}

/// Model parameters, immutable for the duration of a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Params {
    /// Transition probabilities {k0, k1, k2, k3, k4}:
    /// mutation, base proliferation rate, effection, death, rebirth.
    pub probs: [f64; 5],
    /// Discount proliferation by the number of cancerous neighbours.
    pub competition: bool,
    /// Exponent applied to the cancer-density term (Extended model only).
    pub alpha: f64,
    /// Rate applied to the effector-density term (Extended model only).
    pub beta: f64,
}

impl Default for Params {
    fn default() -> Self {
        Params {
            probs: [0.00, 0.60, 0.05, 0.05, 0.05],
            competition: true,
            alpha: 1.0,
            beta: 1.0,
        }
    }
}

impl Params {
    pub fn with_probs(probs: [f64; 5]) -> Self {
        Params { probs, ..Params::default() }
    }

    #[inline(always)]
    pub fn mutation(&self) -> f64 {
        self.probs[MUTATION]
    }

    #[inline(always)]
    pub fn proliferation(&self) -> f64 {
        self.probs[PROLIFERATION]
    }

    #[inline(always)]
    pub fn effection(&self) -> f64 {
        self.probs[EFFECTION]
    }

    #[inline(always)]
    pub fn death(&self) -> f64 {
        self.probs[DEATH]
    }

    #[inline(always)]
    pub fn rebirth(&self) -> f64 {
        self.probs[REBIRTH]
    }
}
