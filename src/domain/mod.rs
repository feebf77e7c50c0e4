pub mod damage;
pub mod detection;
pub mod errors;
pub mod evaluation;
pub mod identity;
pub mod model;
