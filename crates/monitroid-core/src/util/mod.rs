mod interval;

pub use interval::{IntervalParseError, parse_interval};
