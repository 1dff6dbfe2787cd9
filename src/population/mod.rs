mod errors;
mod population;

pub use errors::Error;
pub use population::Population;
