//! Errors that can appear when interacting with datasets
use std::ffi::CStr;
use std::num::TryFromIntError;

use netcdf_sys::{
    nc_strerror, nc_type, NC_EBADDIM, NC_EBADID, NC_EBADNAME, NC_EBADTYPE, NC_ECANTCREATE,
    NC_ECANTREAD, NC_ECANTWRITE, NC_EEDGE, NC_EEXIST, NC_EINVALCOORDS, NC_EIO, NC_EMAXNAME,
    NC_ENAMEINUSE, NC_ENOTATT, NC_ENOTFOUND, NC_ENOTNC, NC_ENOTVAR, NC_NOERR,
};

use super::types::ScalarKind;
use super::utils::with_lock;

/// Various error types that can occur in this crate
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Named dimension, variable, attribute or file does not exist
    #[error("could not find {0}")]
    NotFound(String),
    /// The file or entity is already present
    #[error("{0} already exists")]
    AlreadyExists(String),
    /// Name is already taken by another declaration of the same kind
    #[error("the name {0:?} is already in use")]
    DuplicateName(String),
    /// Dimension handle belongs to another dataset
    #[error("dimension {0:?} belongs to a different dataset")]
    ForeignDimension(String),
    /// The type is not known, or not storable in this file format
    #[error("unsupported type: {0}")]
    UnsupportedType(String),
    /// Buffer length or index rank disagrees with the variable
    #[error("shape mismatch, needs {wanted} elements but got {actual}")]
    ShapeMismatch {
        /// Length required by the variable or slab
        wanted: usize,
        /// Length supplied
        actual: usize,
    },
    /// Element type of the request differs from the declared one
    #[error("type mismatch, declared as {expected} but used as {actual}")]
    TypeMismatch {
        /// Kind stored in the file
        expected: ScalarKind,
        /// Kind of the supplied or requested values
        actual: ScalarKind,
    },
    /// A slab reaches past the extent of a dimension
    #[error("index out of bounds: {0}")]
    OutOfBounds(String),
    /// Output buffer can not hold the requested elements
    #[error("buffer too small, needs {wanted} elements but has room for {actual}")]
    BufferTooSmall {
        /// Elements to be read
        wanted: usize,
        /// Capacity of the buffer
        actual: usize,
    },
    /// `_FillValue` must be a single value of the variable's own type
    #[error("invalid fill value: {0}")]
    InvalidFillValue(String),
    /// The dataset has been closed
    #[error("the dataset has been closed")]
    ClosedHandle,
    /// The file is not a recognized container
    #[error("not a netCDF file: {0}")]
    Format(String),
    /// Operating system or file level failure
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Any other status code reported by the library
    #[error("netcdf error({code}): {}", describe(.code))]
    Storage {
        /// Raw status code
        code: nc_type,
    },
    /// Attribute writes need at least one value
    #[error("attribute {0:?} can not be empty")]
    Empty(String),
    /// Name is empty, too long, or contains a nul byte
    #[error("invalid name: {0}")]
    BadName(String),
    /// Strings handed to the library can not contain nul bytes
    #[error(transparent)]
    Nul(#[from] std::ffi::NulError),
    /// Integer conversion at the library boundary failed
    #[error(transparent)]
    Conversion(#[from] TryFromIntError),
}

fn describe(code: &nc_type) -> String {
    strerror(*code)
}

fn strerror(code: nc_type) -> String {
    with_lock(|| unsafe {
        let msg = nc_strerror(code);
        if msg.is_null() {
            String::from("unknown error")
        } else {
            CStr::from_ptr(msg).to_string_lossy().into_owned()
        }
    })
}

impl Error {
    /// Translate a non-zero status code from the library
    ///
    /// Positive codes are operating system `errno` values, negative codes
    /// belong to the library itself.
    pub fn from_status(code: nc_type) -> Self {
        if code > 0 {
            let err = std::io::Error::from_raw_os_error(code);
            return match code {
                libc::ENOENT => Error::NotFound(err.to_string()),
                libc::EEXIST => Error::AlreadyExists(err.to_string()),
                _ => Error::Io(err),
            };
        }
        let detail = || strerror(code);
        match code {
            NC_ENOTVAR | NC_ENOTATT | NC_EBADDIM | NC_ENOTFOUND => Error::NotFound(detail()),
            NC_EEXIST => Error::AlreadyExists(detail()),
            NC_ENAMEINUSE => Error::DuplicateName(detail()),
            NC_EBADTYPE => Error::UnsupportedType(detail()),
            NC_EINVALCOORDS | NC_EEDGE => Error::OutOfBounds(detail()),
            NC_EBADID => Error::ClosedHandle,
            NC_ENOTNC => Error::Format(detail()),
            NC_EBADNAME | NC_EMAXNAME => Error::BadName(detail()),
            NC_ECANTREAD | NC_ECANTWRITE | NC_ECANTCREATE | NC_EIO => {
                Error::Io(std::io::Error::new(std::io::ErrorKind::Other, detail()))
            }
            code => Error::Storage { code },
        }
    }
}

/// Result type used in this crate
pub type Result<T> = std::result::Result<T, Error>;

pub(crate) fn checked(err: nc_type) -> Result<()> {
    if err != NC_NOERR {
        return Err(Error::from_status(err));
    }
    Ok(())
}
