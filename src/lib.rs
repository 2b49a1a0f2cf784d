//! Typed multi-dimensional array datasets backed by Unidata's
//! [libnetcdf](https://www.unidata.ucar.edu/software/netcdf/)
//!
//! A [`Dataset`] is an open `netCDF` file. It owns named [`Dimension`]s, typed
//! [`Variable`]s laid out over those dimensions, and [`Attribute`]s attached to
//! either the dataset itself or to a single variable. The on-disk format is
//! entirely owned by `libnetcdf`; this crate validates every request before it
//! crosses into the library and maps the library's status codes to [`Error`].
//!
//! Element types are never converted implicitly: a variable declared as
//! [`ScalarKind::U8`] is read and written as `u8` and nothing else.
//!
//! # Examples
//!
//! Create a file and write to it:
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use ncdataset::{Dataset, Options, ScalarKind};
//!
//! let mut ds = Dataset::create("gopher.nc", Options::CLOBBER | Options::NETCDF4)?;
//! let height = ds.add_dim("height", 5)?;
//! let width = ds.add_dim("width", 4)?;
//!
//! let mut var = ds.add_var("gopher", ScalarKind::U8, &[&height, &width])?;
//! var.attr("_FillValue").write(255_u8)?;
//! var.attr("year").write(2012_i32)?;
//!
//! let data: Vec<u8> = (0..5)
//!     .flat_map(|y| (0..4).map(move |x| (x + y) as u8))
//!     .collect();
//! var.write_all(&data)?;
//! ds.close()?;
//! # Ok(()) }
//! ```
//!
//! Read it back:
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use ncdataset::{Dataset, Mode};
//!
//! let ds = Dataset::open("gopher.nc", Mode::ReadOnly)?;
//! let var = ds.var("gopher")?;
//! let year = var.attr("year").read_as::<i32>()?;
//! assert_eq!(year, [2012]);
//!
//! let data: Vec<u8> = var.read_all()?;
//! assert_eq!(var.shape()?, [5, 4]);
//! assert_eq!(&data[..4], &[0, 1, 2, 3]);
//! # Ok(()) }
//! ```
//!
//! Unlimited dimensions grow through slab writes:
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut ds = ncdataset::create("series.nc")?;
//! let time = ds.add_unlimited_dim("time")?;
//! let station = ds.add_dim("station", 3)?;
//! let mut temp = ds.add_var_of::<f32>("temperature", &[&time, &station])?;
//!
//! temp.write_slab(&[0, 0], &[1, 3], &[280.1_f32, 281.0, 279.6])?;
//! temp.write_slab(&[1, 0], &[1, 3], &[280.4_f32, 281.2, 279.9])?;
//! assert_eq!(temp.shape()?, [2, 3]);
//! # Ok(()) }
//! ```

#![warn(missing_docs)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod attribute;
pub mod dataset;
pub mod dimension;
pub mod error;
pub(crate) mod handle;
pub(crate) mod slab;
pub mod types;
pub mod variable;

pub use attribute::{Attribute, FILL_VALUE};
pub use dataset::{Dataset, Format, Mode, Options};
pub use dimension::{Dimension, DimensionIdentifier, UNLIMITED};
pub use error::{Error, Result};
pub use types::{NcScalar, ScalarKind, Values};
pub use variable::Variable;

/// Create a `netCDF-4` dataset, overwriting any existing file
pub fn create<P>(path: P) -> error::Result<Dataset>
where
    P: AsRef<std::path::Path>,
{
    Dataset::create(path, Options::CLOBBER | Options::NETCDF4)
}

/// Open an existing dataset for reading
pub fn open<P>(path: P) -> error::Result<Dataset>
where
    P: AsRef<std::path::Path>,
{
    Dataset::open(path, Mode::ReadOnly)
}

/// Open an existing dataset for reading and writing
pub fn append<P>(path: P) -> error::Result<Dataset>
where
    P: AsRef<std::path::Path>,
{
    Dataset::open(path, Mode::ReadWrite)
}

/// Version string reported by the linked `libnetcdf`
pub fn library_version() -> &'static str {
    &utils::LIBRARY.version
}

pub(crate) mod utils {
    use std::ffi::CStr;

    use lazy_static::lazy_static;
    use netcdf_sys::{nc_inq_libvers, nc_type, NC_MAX_NAME};

    use super::error;

    /// Process-wide state of the native library, set up on first use
    pub(crate) struct Library {
        pub(crate) version: String,
    }

    lazy_static! {
        pub(crate) static ref LIBRARY: Library = {
            let version = with_lock(|| unsafe {
                let ptr = nc_inq_libvers();
                if ptr.is_null() {
                    String::new()
                } else {
                    CStr::from_ptr(ptr).to_string_lossy().into_owned()
                }
            });
            tracing::debug!(%version, "libnetcdf initialised");
            Library { version }
        };
    }

    /// Run `f` while holding the library lock
    ///
    /// `libnetcdf` (and the `hdf5` library below it) is not thread-safe.
    /// The lock is the one `hdf5-sys` exports, so other users of either
    /// library in the process are serialized with us.
    pub(crate) fn with_lock<T, F: FnOnce() -> T>(f: F) -> T {
        let _l = netcdf_sys::libnetcdf_lock.lock();
        f()
    }

    /// Run `f` under the library lock and map its status code
    pub(crate) fn checked_with_lock<F: FnOnce() -> nc_type>(f: F) -> error::Result<()> {
        error::checked(with_lock(f))
    }

    /// Names are handed to the library as a fixed, nul-terminated buffer,
    /// which avoids allocating a `CString` for every call
    pub(crate) fn short_name_to_bytes(name: &str) -> error::Result<[u8; NC_MAX_NAME as usize + 1]> {
        if name.is_empty() {
            return Err(error::Error::BadName("names can not be empty".into()));
        }
        if name.len() > NC_MAX_NAME as usize {
            return Err(error::Error::BadName(format!(
                "{name:?} is longer than {NC_MAX_NAME} bytes"
            )));
        }
        if name.bytes().any(|b| b == 0) {
            return Err(error::Error::BadName(format!(
                "{name:?} contains a nul byte"
            )));
        }
        let mut bytes = [0_u8; NC_MAX_NAME as usize + 1];
        bytes[..name.len()].copy_from_slice(name.as_bytes());
        Ok(bytes)
    }

    /// Inverse of [`short_name_to_bytes`] for names filled in by the library
    pub(crate) fn name_from_bytes(bytes: &[u8]) -> String {
        let zeropos = bytes.iter().position(|&x| x == 0).unwrap_or(bytes.len());
        String::from_utf8_lossy(&bytes[..zeropos]).into_owned()
    }

}
