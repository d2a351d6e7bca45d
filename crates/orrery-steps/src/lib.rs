//! Orrery Steps
//!
//! Generic steps that need no platform backend:
//!
//! | plugin id | effect |
//! |-----------|--------|
//! | `value.set` | parameter `value` -> output `value` |
//! | `value.copy` | input `value` -> output `value` |
//! | `value.assert_exists` | fail unless input `value` is set |
//! | `number.add` | output `value` = `left` + `right` (or `amount`) |
//! | `number.compare` | output `result` = `value` `op` `threshold` |
//! | `string.concat` | join `parts` with `separator` |
//! | `debug.log` | log `message` at `level` |
//! | `debug.metrics` | record / aggregate / reset a metric series |
//! | `app.quit` | set the `app.quit` flag |

mod app;
mod debug;
mod metrics;
mod number;
mod registrar;
mod string;
mod value;

pub use app::{AppQuitStep, QUIT_FLAG};
pub use debug::{DebugLogStep, DebugMetricsStep};
pub use metrics::{Aggregation, MetricsAggregator, MetricsError};
pub use number::{NumberAddStep, NumberCompareStep};
pub use registrar::{builtin_steps, register_builtin_steps, register_used_steps};
pub use string::StringConcatStep;
pub use value::{ValueAssertExistsStep, ValueCopyStep, ValueSetStep};
