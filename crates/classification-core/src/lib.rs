pub mod error;
pub mod fields;
pub mod grid;
pub mod traits;
pub mod types;

pub use error::*;
pub use fields::*;
pub use grid::*;
pub use traits::*;
pub use types::*;
