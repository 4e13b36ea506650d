pub mod analyzer;
pub mod interval;
pub mod observation;
pub mod series;
pub mod session;
pub mod summary;
pub mod tariff;
