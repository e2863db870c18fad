use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    InvalidDataUri(String),
    InvalidDimensions { width: f32, height: f32 },
    EmptyGrid { rows: u32, cols: u32 },
}

impl Display for DomainError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDataUri(reason) => write!(f, "invalid data uri: {reason}"),
            Self::InvalidDimensions { width, height } => write!(
                f,
                "grid dimensions must be finite and non-negative, got {width}x{height}"
            ),
            Self::EmptyGrid { rows, cols } => {
                write!(f, "grid must have at least one row and column, got {rows}x{cols}")
            }
        }
    }
}

impl std::error::Error for DomainError {}
