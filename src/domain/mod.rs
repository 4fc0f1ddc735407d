// Domain layer: report and portfolio models plus the ports (interfaces) adapters implement.

pub mod model;
pub mod ports;
