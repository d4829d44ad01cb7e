mod duration;

pub use duration::{duration_arg, parse_duration, positive_duration_arg};
