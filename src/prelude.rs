pub use crate::alignment::{Alignment, AlignmentIndices};
pub use crate::config::{PrepConfig, PrepMode};
pub use crate::error::PrepError;
pub use crate::init::{FreshReason, InitOrigin, InitProvider};
pub use crate::log::{debug, error, info, trace, warn};
pub use crate::lookup::Lookup;
pub use crate::mitigation::MitigationTable;
pub use crate::params::{ParamName, ParameterVector, Prior, PriorConfig};
pub use crate::prepare::{init_provider, prepare_region, prepare_series};
pub use crate::series::{DailyRow, DailySeries};
pub use crate::stan_data::{Prepared, StanData};
pub use crate::warm_start::{SampleCsvSource, WarmStartSource};
