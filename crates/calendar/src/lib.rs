//! Trading calendar resolution: mapping arbitrary dates onto trading days,
//! slicing lookback windows and pairing month-end trading days with calendar
//! month ends.
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/tessera/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod calendar;
pub use calendar::TradingCalendar;

mod dates;
pub use dates::{first_of_next_month, last_fiscal_year_end, last_month_end, month_end};

mod error;
pub use error::CalendarError;

mod map;
pub use map::CalendarMap;

mod resolve;
pub use resolve::{BoundaryPolicy, PeriodUnit, exact_date_index, resolve_date_index, slice_lookback};
