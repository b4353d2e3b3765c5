use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BoxError {
    #[error("Duplicate value in ordered set. index: {index}, first_index: {first_index}")]
    DuplicateValue { index: usize, first_index: usize },
}
