pub mod dates;
pub mod etl;
pub mod fetch;
pub mod pipeline;

pub use crate::domain::model::{OutputBundle, Record};
pub use crate::domain::ports::{Pipeline, Storage};
pub use crate::utils::error::Result;
