//! Generator endpoints under `/api/generators/`.

pub mod fake_data;
pub mod random_number;

pub use fake_data::FakeDataTool;
pub use random_number::RandomNumberTool;
