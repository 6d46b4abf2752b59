pub mod history;
pub mod medicine;
