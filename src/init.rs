//! Starting values for the inference engine.
//!
//! An [`InitProvider`] resolves a [`ParameterVector`] lazily: nothing is read or drawn until
//! the first call to [`InitProvider::get`], and every later call returns the same vector.
//! Resolution runs through these states:
//!
//! * warm start requested: the terminal sample of a previous fit is looked up;
//!   * on success that sample is the result;
//!   * on failure a diagnostic is logged and resolution continues with a fresh sample;
//! * fresh sample: every parameter is drawn from its prior. This is also where resolution
//!   starts when no warm start was requested, or when a fresh sample is forced.
//!
//! The `mlocation` prior is centred on the mitigation index `tm` of the prepared data. The
//! `trelax` prior is deliberately fixed (normal, mean 50, sd 5) and does not follow `tm`;
//! override it in [`PrepConfig::priors`] to centre it elsewhere.
use std::cell::OnceCell;
use std::collections::BTreeMap;

use log::{info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp, Gamma, Normal};

use crate::config::PrepConfig;
use crate::error::PrepError;
use crate::lookup::Lookup;
use crate::params::{ParamName, ParameterVector, Prior, PriorConfig};
use crate::stan_data::StanData;
use crate::warm_start::{recover, WarmStartSource, WarmStartUnavailable};

#[derive(Debug, Clone)]
enum Draw {
    Gamma(Gamma<f64>),
    Exp(Exp<f64>),
    Normal(Normal<f64>),
}

impl Distribution<f64> for Draw {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match self {
            Draw::Gamma(d) => d.sample(rng),
            Draw::Exp(d) => d.sample(rng),
            Draw::Normal(d) => d.sample(rng),
        }
    }
}

fn invalid(name: ParamName, error: impl std::fmt::Display) -> PrepError {
    PrepError::InvalidPrior(format!("{name}: {error}"))
}

impl Draw {
    #[allow(clippy::cast_precision_loss)]
    fn new(name: ParamName, prior: Prior, tm: i64) -> Result<Self, PrepError> {
        match prior {
            Prior::Gamma { shape, scale } => Gamma::new(shape, scale)
                .map(Draw::Gamma)
                .map_err(|e| invalid(name, e)),
            Prior::Exponential { scale } => {
                if !(scale.is_finite() && scale > 0.0) {
                    return Err(invalid(name, format!("scale {scale} must be positive")));
                }
                Exp::new(1.0 / scale)
                    .map(Draw::Exp)
                    .map_err(|e| invalid(name, e))
            }
            Prior::Normal { mean, sd } => Normal::new(mean, sd)
                .map(Draw::Normal)
                .map_err(|e| invalid(name, e)),
            Prior::NormalAtTm { sd } => Normal::new(tm as f64, sd)
                .map(Draw::Normal)
                .map_err(|e| invalid(name, e)),
        }
    }
}

/// The priors of every parameter, ready to draw from.
#[derive(Debug, Clone)]
pub struct FreshPriors {
    draws: Vec<(ParamName, Draw)>,
}

impl FreshPriors {
    /// # Errors
    ///
    /// Returns `PrepError::InvalidPrior` if any hyperparameters are out of range.
    pub fn new(priors: &PriorConfig, tm: i64) -> Result<Self, PrepError> {
        let draws = priors
            .iter()
            .map(|(name, prior)| Draw::new(name, prior, tm).map(|draw| (name, draw)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(FreshPriors { draws })
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> ParameterVector {
        let values: BTreeMap<ParamName, f64> = self
            .draws
            .iter()
            .map(|(name, draw)| (*name, draw.sample(rng)))
            .collect();
        ParameterVector::from_values(values)
    }
}

/// Why a fresh sample was drawn.
#[derive(Debug, Clone, PartialEq)]
pub enum FreshReason {
    NotRequested,
    Forced,
    WarmStartFailed(WarmStartUnavailable),
}

/// How the resolved vector was obtained.
#[derive(Debug, Clone, PartialEq)]
pub enum InitOrigin {
    WarmStart { fit_id: String },
    Fresh(FreshReason),
}

struct WarmStartRequest {
    source: Box<dyn WarmStartSource>,
    fit_id: String,
    model_id: String,
}

pub struct InitProvider {
    priors: FreshPriors,
    seed: Option<u64>,
    warm_start: Option<WarmStartRequest>,
    force_fresh: bool,
    resolved: OnceCell<(ParameterVector, InitOrigin)>,
}

impl InitProvider {
    /// A provider drawing fresh values, with `mlocation` centred on `stan_data.tm`.
    ///
    /// # Errors
    ///
    /// Returns `PrepError::InvalidPrior` if the configured priors are invalid.
    pub fn new(stan_data: &StanData, config: &PrepConfig) -> Result<Self, PrepError> {
        Ok(InitProvider {
            priors: FreshPriors::new(&config.priors, stan_data.tm)?,
            seed: config.seed,
            warm_start: None,
            force_fresh: false,
            resolved: OnceCell::new(),
        })
    }

    /// Try the terminal sample of `fit_id` first.
    #[must_use]
    pub fn with_warm_start(
        mut self,
        source: impl WarmStartSource + 'static,
        fit_id: &str,
        model_id: &str,
    ) -> Self {
        self.warm_start = Some(WarmStartRequest {
            source: Box::new(source),
            fit_id: fit_id.to_string(),
            model_id: model_id.to_string(),
        });
        self
    }

    /// Skip any requested warm start.
    #[must_use]
    pub fn force_fresh(mut self, force: bool) -> Self {
        self.force_fresh = force;
        self
    }

    /// The resolved starting values, resolving them on first use.
    pub fn get(&self) -> &ParameterVector {
        &self.resolve().0
    }

    pub fn origin(&self) -> &InitOrigin {
        &self.resolve().1
    }

    /// Consumes the provider into the initializer handed to the fitting routine.
    pub fn into_init_fn(self) -> impl Fn() -> ParameterVector {
        move || self.get().clone()
    }

    fn resolve(&self) -> &(ParameterVector, InitOrigin) {
        self.resolved.get_or_init(|| self.resolve_once())
    }

    fn resolve_once(&self) -> (ParameterVector, InitOrigin) {
        let reason = match &self.warm_start {
            None => FreshReason::NotRequested,
            Some(_) if self.force_fresh => FreshReason::Forced,
            Some(request) => {
                match recover(request.source.as_ref(), &request.fit_id, &request.model_id) {
                    Lookup::Found(sample) => {
                        info!("Using last sample from previous fit to initialize");
                        let origin = InitOrigin::WarmStart {
                            fit_id: request.fit_id.clone(),
                        };
                        return (sample, origin);
                    }
                    Lookup::Fallback(unavailable) => {
                        warn!("{unavailable}");
                        FreshReason::WarmStartFailed(unavailable)
                    }
                }
            }
        };
        info!("Using default values to initialize fit");
        (self.sample_fresh(), InitOrigin::Fresh(reason))
    }

    fn sample_fresh(&self) -> ParameterVector {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        self.priors.sample(&mut rng)
    }
}
