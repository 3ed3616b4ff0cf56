/// Hardware temperature collector built on lm-sensors output
pub mod sensor_collector;

/// CPU and memory usage probe for status reports
pub mod system_probe;

pub use sensor_collector::{
    parse_sensors_output, parse_temperature, CommandSource, ReplaySource, SensorReader,
    SensorSource,
};
pub use system_probe::{SysinfoProbe, SystemProbe, SystemSnapshot};
