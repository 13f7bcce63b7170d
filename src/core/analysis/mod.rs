mod class_balance;
mod channel_stats;

pub use channel_stats::compute_channel_stats;
pub use class_balance::{analyze_labels, ClassDistribution};
