pub mod fakes;
pub mod params;
