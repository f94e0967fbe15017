//! The closed set of model parameters and the priors used to draw fresh starting values.
//!
//! Gamma distributions are given by shape and *scale*, exponential distributions by their
//! *scale* (the mean, not the rate), and normal distributions by mean and standard deviation.
use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// Names of the parameters handed to the inference engine as its starting point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamName {
    F1,
    F2,
    Sigmar,
    Sigmad,
    Sigmau,
    Q,
    Mbase,
    Mlocation,
    ExtraStd,
    #[serde(rename = "extra_std_R")]
    ExtraStdR,
    #[serde(rename = "extra_std_D")]
    ExtraStdD,
    Cbase,
    Clocation,
    Ctransition,
    NPop,
    Sigmar1,
    Sigmad1,
    Trelax,
}

impl ParamName {
    pub const ALL: [ParamName; 18] = [
        ParamName::F1,
        ParamName::F2,
        ParamName::Sigmar,
        ParamName::Sigmad,
        ParamName::Sigmau,
        ParamName::Q,
        ParamName::Mbase,
        ParamName::Mlocation,
        ParamName::ExtraStd,
        ParamName::ExtraStdR,
        ParamName::ExtraStdD,
        ParamName::Cbase,
        ParamName::Clocation,
        ParamName::Ctransition,
        ParamName::NPop,
        ParamName::Sigmar1,
        ParamName::Sigmad1,
        ParamName::Trelax,
    ];

    /// The column / key name used by the inference engine.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ParamName::F1 => "f1",
            ParamName::F2 => "f2",
            ParamName::Sigmar => "sigmar",
            ParamName::Sigmad => "sigmad",
            ParamName::Sigmau => "sigmau",
            ParamName::Q => "q",
            ParamName::Mbase => "mbase",
            ParamName::Mlocation => "mlocation",
            ParamName::ExtraStd => "extra_std",
            ParamName::ExtraStdR => "extra_std_R",
            ParamName::ExtraStdD => "extra_std_D",
            ParamName::Cbase => "cbase",
            ParamName::Clocation => "clocation",
            ParamName::Ctransition => "ctransition",
            ParamName::NPop => "n_pop",
            ParamName::Sigmar1 => "sigmar1",
            ParamName::Sigmad1 => "sigmad1",
            ParamName::Trelax => "trelax",
        }
    }
}

impl Display for ParamName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A complete set of starting values, one per [`ParamName`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterVector(BTreeMap<ParamName, f64>);

impl ParameterVector {
    /// Callers must supply every name in [`ParamName::ALL`].
    pub(crate) fn from_values(values: BTreeMap<ParamName, f64>) -> Self {
        debug_assert_eq!(values.len(), ParamName::ALL.len());
        ParameterVector(values)
    }

    #[must_use]
    pub fn get(&self, name: ParamName) -> Option<f64> {
        self.0.get(&name).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ParamName, f64)> + '_ {
        self.0.iter().map(|(name, value)| (*name, *value))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "dist", rename_all = "snake_case")]
pub enum Prior {
    Gamma { shape: f64, scale: f64 },
    Exponential { scale: f64 },
    Normal { mean: f64, sd: f64 },
    /// A normal distribution centred on the mitigation index `tm`.
    NormalAtTm { sd: f64 },
}

/// One prior per parameter. Deserializing merges the given entries over the defaults, so a
/// configuration file only has to name the priors it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<ParamName, Prior>",
    into = "BTreeMap<ParamName, Prior>"
)]
pub struct PriorConfig {
    priors: BTreeMap<ParamName, Prior>,
}

impl PriorConfig {
    #[must_use]
    pub fn get(&self, name: ParamName) -> Prior {
        self.priors[&name]
    }

    pub fn set(&mut self, name: ParamName, prior: Prior) {
        self.priors.insert(name, prior);
    }

    pub fn iter(&self) -> impl Iterator<Item = (ParamName, Prior)> + '_ {
        self.priors.iter().map(|(name, prior)| (*name, *prior))
    }
}

impl Default for PriorConfig {
    fn default() -> Self {
        use ParamName::*;
        use Prior::*;
        let priors = BTreeMap::from([
            (F1, Gamma { shape: 2.0, scale: 10.0 }),
            (F2, Gamma { shape: 40.0, scale: 1.0 / 100.0 }),
            (Sigmar, Gamma { shape: 20.0, scale: 1.0 / 120.0 }),
            (Sigmad, Gamma { shape: 20.0, scale: 1.0 / 120.0 }),
            (Sigmau, Gamma { shape: 2.0, scale: 1.0 / 20.0 }),
            (Q, Exponential { scale: 0.1 }),
            (Mbase, Gamma { shape: 2.0, scale: 0.1 / 2.0 }),
            (Mlocation, NormalAtTm { sd: 4.0 }),
            (ExtraStd, Exponential { scale: 0.5 }),
            (ExtraStdR, Exponential { scale: 0.5 }),
            (ExtraStdD, Exponential { scale: 0.5 }),
            (Cbase, Gamma { shape: 1.0, scale: 1.0 }),
            (Clocation, Normal { mean: 50.0, sd: 1.0 }),
            (Ctransition, Normal { mean: 10.0, sd: 1.0 }),
            (NPop, Normal { mean: 1e6, sd: 1e4 }),
            (Sigmar1, Gamma { shape: 2.0, scale: 0.01 }),
            (Sigmad1, Gamma { shape: 2.0, scale: 0.01 }),
            (Trelax, Normal { mean: 50.0, sd: 5.0 }),
        ]);
        PriorConfig { priors }
    }
}

impl From<BTreeMap<ParamName, Prior>> for PriorConfig {
    fn from(overrides: BTreeMap<ParamName, Prior>) -> Self {
        let mut config = PriorConfig::default();
        config.priors.extend(overrides);
        config
    }
}

impl From<PriorConfig> for BTreeMap<ParamName, Prior> {
    fn from(config: PriorConfig) -> Self {
        config.priors
    }
}
