pub mod characteristics;
pub mod config;
pub mod error;
pub mod fan_override;
pub mod modes;
pub mod outdoor;
pub mod thresholds;
pub mod topics;
pub mod types;

pub use characteristics::{CharacteristicDescriptor, CharacteristicId, CHARACTERISTICS};
pub use config::{BridgeConfig, OutdoorConfig, OverrideConfig, PolicyConfig};
pub use error::ConfigError;
pub use fan_override::{GateDecision, GateInput, OverrideMode, OverrideState};
pub use modes::ModeChange;
pub use outdoor::{Coordinates, OutdoorTemperatureCache};
pub use thresholds::{Setpoint, SetpointPlan, SkipReason};
pub use topics::*;
pub use types::{
    BridgeStatus, CurrentMode, DeviceState, HostMode, HvacMode, HvacState, Scope,
    TemperatureScale,
};
