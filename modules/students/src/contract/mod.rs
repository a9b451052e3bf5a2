pub mod model;

pub use model::{NewStudent, Student};
