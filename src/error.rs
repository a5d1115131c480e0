use derive_more::{Display, Error};

/// Result type used throughout the indexed priority queue crate
pub type IPQResult<T> = Result<T, IPQError>;

/// Indexed priority queue custom error
#[derive(Debug, Display, Error)]
pub enum IPQError {
    #[display(fmt = "Index {} is out of range for capacity {}", index, capacity)]
    IndexOutOfRange { index: usize, capacity: usize },
    #[display(fmt = "Queue is empty")]
    EmptyQueue,
    #[display(fmt = "Invalid node {}", node)]
    InvalidNode { node: usize },
    #[display(fmt = "{}", message)]
    Parse { message: String },
    #[display(fmt = "{}", _0)]
    Io(#[error(source)] std::io::Error),
}

impl IPQError {
    /// Return the name of this error
    pub fn name(&self) -> String {
        match self {
            Self::IndexOutOfRange { .. } => "Index Out Of Range".to_string(),
            Self::EmptyQueue => "Empty Queue".to_string(),
            Self::InvalidNode { .. } => "Invalid Node".to_string(),
            Self::Parse { .. } => "Parse Error".to_string(),
            Self::Io(_) => "I/O Error".to_string(),
        }
    }
}

impl From<std::io::Error> for IPQError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

#[cfg(test)]
mod test {
    use std::error::Error;
    use std::io;

    use crate::error::IPQError;

    #[test]
    fn test_display_and_name() {
        let err = IPQError::IndexOutOfRange { index: 7, capacity: 5 };
        assert_eq!(err.to_string(), "Index 7 is out of range for capacity 5");
        assert_eq!(err.name(), "Index Out Of Range");

        assert_eq!(IPQError::EmptyQueue.to_string(), "Queue is empty");
        assert_eq!(IPQError::InvalidNode { node: 3 }.to_string(), "Invalid node 3");
    }

    #[test]
    fn test_io_source() {
        let err: IPQError = io::Error::new(io::ErrorKind::NotFound, "missing").into();
        assert_eq!(err.name(), "I/O Error");
        assert!(err.source().is_some());

        let err = IPQError::Parse { message: "bad".to_string() };
        assert!(err.source().is_none());
    }
}
