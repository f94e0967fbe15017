//! Preparation of epidemiological time series for fitting an SICR model
//!
//! A region's daily counts of new cases, recoveries and deaths are turned into the fixed-shape
//! numeric bundle ([`StanData`]) consumed by the inference engine, together with an
//! initializer ([`InitProvider`]) producing the engine's starting parameter values.
//!
//! Preparation is a pipeline of small steps, each with its own module:
//! * [`series`] loads the daily table.
//! * [`alignment`] applies an optional cutoff date and finds the onset day `t0` and the
//!   mitigation day `tm`, consulting the per-region table of [`mitigation`] dates.
//! * [`stan_data`] builds the daily bundle, or [`weekly`] aggregates the series into weeks
//!   anchored on the onset weekday and builds the weekly bundle.
//! * [`init`] resolves starting values, either the last sample of a previous fit
//!   ([`warm_start`]) or fresh draws from the priors in [`params`].
//!
//! [`prepare`] strings the steps together for one region:
//!
//! ```no_run
//! use std::path::Path;
//! use sicr_prep::prelude::*;
//!
//! fn main() -> Result<(), PrepError> {
//!     let config = PrepConfig::from_json_path(Path::new("prep.json"))?;
//!     let series_path = Path::new("data/covidtimeseries_US_MD.csv");
//!     let prepared = prepare_region(series_path, "US_MD", None, &config)?;
//!     if let Some(provider) = init_provider(&prepared, &config, None, "reducedlinearmodelq0")? {
//!         let init = provider.into_init_fn();
//!         println!("{:?}", init());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Days with too few cases, a missing mitigation date, a missing population figure and an
//! unusable previous fit are not errors: each is handled by a documented fallback and reported
//! as a `warn!` diagnostic (see [`lookup`] and [`log`]).
pub mod alignment;
pub mod config;
pub mod error;
pub mod init;
pub mod log;
pub mod lookup;
pub mod mitigation;
pub mod params;
pub mod prelude;
pub mod prepare;
pub mod series;
pub mod stan_data;
pub mod warm_start;
pub mod weekly;

pub use config::PrepConfig;
pub use error::PrepError;
pub use init::InitProvider;
pub use stan_data::{Prepared, StanData};
