pub mod scorer;
pub mod explanation;
