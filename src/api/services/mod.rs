// Services module - error mapping and its clock

pub mod clock;
pub mod error_mapper;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error_mapper::{ErrorMapper, RequestContext};
