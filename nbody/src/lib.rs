pub mod body;
pub mod constants;
pub mod device;
pub mod diagnostics;
pub mod error;
pub mod params;
pub mod scenario;
pub mod sim;

pub use body::{Body, make_central_body, make_random_body};
pub use device::{DeviceConfig, DeviceContext, DeviceKind};
pub use error::{InitError, StepError, TransferError};
pub use params::{PairExclusion, StepParams};
pub use scenario::{InitialVelocity, Scenario};
pub use sim::{
    Sequential, StepStrategy, Strategy,
    batch::{Batch, from_batch, to_batch},
};
