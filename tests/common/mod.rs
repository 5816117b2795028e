pub mod builders;
pub mod mock_backend;
pub mod strategies;

pub use builders::*;
pub use mock_backend::*;
pub use strategies::*;
