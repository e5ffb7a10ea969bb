mod aggregation;
mod business_unit;
mod fan;
mod money;
mod revenue;
mod scope;
mod years;

pub use aggregation::*;
pub use business_unit::*;
pub use fan::*;
pub use money::*;
pub use revenue::*;
pub use scope::*;
pub use years::*;
