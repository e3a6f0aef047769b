use crate::hash::Oid;
use crate::kind::ObjectKind;
use std::fmt::{self, Display, Formatter};

pub type BitResult<T> = Result<T, BitGenericError>;
pub type BitGenericError = anyhow::Error;

/// classifiable error cases, downcast out of a [`BitGenericError`] when a caller
/// needs to branch on *why* something failed rather than just propagate it
#[derive(Debug, PartialEq)]
pub enum OdbError {
    NotFound(Oid),
    InvalidType { expected: ObjectKind, actual: ObjectKind },
    Busy,
    BadKindName,
}

impl Display for OdbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            OdbError::NotFound(oid) => write!(f, "object `{}` not found", oid),
            OdbError::InvalidType { expected, actual } =>
                write!(f, "expected object of type `{}`, found `{}`", expected, actual),
            OdbError::Busy => write!(f, "backend is already bound to an object database"),
            OdbError::BadKindName => write!(f, "unrecognized object kind name"),
        }
    }
}

impl std::error::Error for OdbError {
}

pub trait BitResultExt {
    fn is_not_found_err(&self) -> bool;
}

macro_rules! error_ext_is_method {
    ($method:ident) => {
        fn $method(&self) -> bool {
            match self {
                Ok(..) => false,
                Err(err) => err.$method(),
            }
        }
    };
}

impl<T> BitResultExt for BitResult<T> {
    error_ext_is_method!(is_not_found_err);
}

impl BitResultExt for BitGenericError {
    fn is_not_found_err(&self) -> bool {
        matches!(self.downcast_ref::<OdbError>(), Some(OdbError::NotFound(..)))
    }
}

pub trait BitErrorExt {
    fn try_into_odb_error(self) -> BitResult<OdbError>;
    fn try_into_not_found_err(self) -> BitResult<Oid>;
}

impl BitErrorExt for BitGenericError {
    fn try_into_odb_error(self) -> BitResult<OdbError> {
        self.downcast::<OdbError>().map_err(|err| err)
    }

    fn try_into_not_found_err(self) -> BitResult<Oid> {
        match self.try_into_odb_error()? {
            OdbError::NotFound(oid) => Ok(oid),
            err => Err(anyhow::anyhow!(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_not_found_odb_errors_are_classified_as_not_found() {
        let not_found: BitGenericError = anyhow::anyhow!(OdbError::NotFound(Oid::UNKNOWN));
        assert!(not_found.is_not_found_err());

        let busy: BitGenericError = anyhow::anyhow!(OdbError::Busy);
        assert!(!busy.is_not_found_err());

        let opaque: BitGenericError = anyhow::anyhow!("disk on fire");
        assert!(!opaque.is_not_found_err());
    }
}
