//! Create, open and close datasets, and declare their contents
use std::path;
use std::sync::Arc;

use netcdf_sys::{
    nc_create, nc_inq_format, nc_open, nc_type, NC_64BIT_OFFSET, NC_64BIT_DATA, NC_CLASSIC_MODEL, NC_DISKLESS,
    NC_FORMAT_64BIT_DATA, NC_FORMAT_64BIT_OFFSET, NC_FORMAT_CLASSIC, NC_FORMAT_NETCDF4,
    NC_FORMAT_NETCDF4_CLASSIC, NC_NETCDF4, NC_NOCLOBBER, NC_NOWRITE, NC_SHARE, NC_WRITE,
};

use super::attribute::{self, Attribute, Owner};
use super::dimension::{self, Dimension, UNLIMITED};
use super::error;
use super::handle::FileHandle;
use super::types::{NcScalar, ScalarKind};
use super::utils::{checked_with_lock, with_lock};
use super::variable::{self, Variable};

#[cfg(unix)]
fn get_ffi_from_path(path: &path::Path) -> error::Result<Vec<u8>> {
    use std::os::unix::ffi::OsStrExt;
    let bytes = path.as_os_str().as_bytes();
    if bytes.contains(&0) {
        return Err(error::Error::BadName(format!("{path:?} contains a nul byte")));
    }
    let mut bytes = bytes.to_vec();
    bytes.push(0);
    Ok(bytes)
}
#[cfg(not(unix))]
fn get_ffi_from_path(path: &path::Path) -> error::Result<Vec<u8>> {
    let s = path
        .to_str()
        .ok_or_else(|| error::Error::BadName(format!("{path:?} is not valid unicode")))?;
    Ok(std::ffi::CString::new(s)?.into_bytes_with_nul())
}

bitflags::bitflags! {
    /// Options for creating and opening datasets
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Options: nc_type {
        /// Overwrite an existing file. This is the default.
        const CLOBBER = 0;
        /// Fail with `AlreadyExists` instead of overwriting
        const NOCLOBBER = NC_NOCLOBBER;
        /// Use the `hdf5` based `netCDF-4` format
        const NETCDF4 = NC_NETCDF4;
        /// Restrict to the classic data model
        const CLASSIC = NC_CLASSIC_MODEL;
        /// Use 64 bit file offsets (`CDF-2`)
        const _64BIT_OFFSET = NC_64BIT_OFFSET;
        /// Use 64 bit dimensions and sizes (`CDF-5`)
        const _64BIT_DATA = NC_64BIT_DATA;
        /// Limits internal caching
        const SHARE = NC_SHARE;
        /// Keep the file in memory only. Nothing is written to disk.
        const DISKLESS = NC_DISKLESS;
    }
}

impl Default for Options {
    fn default() -> Self {
        Options::CLOBBER
    }
}

/// Access mode of an opened dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Reads only, writes fail
    ReadOnly,
    /// Reads, writes and new declarations
    ReadWrite,
}

impl Mode {
    fn bits(self) -> nc_type {
        match self {
            Mode::ReadOnly => NC_NOWRITE,
            Mode::ReadWrite => NC_WRITE,
        }
    }
}

/// Container format of a dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// `CDF-1`
    Classic,
    /// `CDF-2`, 64 bit offsets
    Offset64,
    /// `CDF-5`, 64 bit data
    Cdf5,
    /// `netCDF-4`, `hdf5` based
    Netcdf4,
    /// `netCDF-4` restricted to the classic model
    Netcdf4Classic,
}

impl Format {
    fn from_code(code: nc_type) -> error::Result<Self> {
        match code {
            NC_FORMAT_CLASSIC => Ok(Format::Classic),
            NC_FORMAT_64BIT_OFFSET => Ok(Format::Offset64),
            NC_FORMAT_64BIT_DATA => Ok(Format::Cdf5),
            NC_FORMAT_NETCDF4 => Ok(Format::Netcdf4),
            NC_FORMAT_NETCDF4_CLASSIC => Ok(Format::Netcdf4Classic),
            code => Err(error::Error::Format(format!("unknown format code {code}"))),
        }
    }

    pub(crate) fn of(ncid: nc_type) -> error::Result<Self> {
        let mut code = 0;
        checked_with_lock(|| unsafe { nc_inq_format(ncid, &mut code) })?;
        Self::from_code(code)
    }

    /// Whether variables and attributes of `kind` can be stored
    pub fn supports(self, kind: ScalarKind) -> bool {
        match self {
            Format::Netcdf4 => true,
            Format::Cdf5 => kind != ScalarKind::Str,
            Format::Classic | Format::Offset64 | Format::Netcdf4Classic => kind.is_classic(),
        }
    }
}

/// An open `netCDF` file
///
/// Dropping the dataset closes it. Dimensions, variables and attributes
/// obtained from it fail with [`Error::ClosedHandle`](error::Error::ClosedHandle)
/// once it is closed, except for the infallible accessors returning what
/// was known when the handle was made: [`Variable::kind`], [`Variable::rank`],
/// [`Variable::dims`], [`Dimension::is_unlimited`], [`Dimension::identifier`]
/// and [`Attribute::name`].
#[derive(Debug)]
pub struct Dataset {
    handle: Arc<FileHandle>,
    path: path::PathBuf,
    mode: Mode,
}

impl Dataset {
    /// Create a new dataset at `path`
    ///
    /// # Errors
    ///
    /// `AlreadyExists` when `path` exists and [`Options::NOCLOBBER`] is
    /// given, `Io` when the file can not be created
    pub fn create<P>(path: P, options: Options) -> error::Result<Self>
    where
        P: AsRef<path::Path>,
    {
        let path = path.as_ref();
        let f = get_ffi_from_path(path)?;
        let mut ncid: nc_type = -1;
        let status = with_lock(|| unsafe { nc_create(f.as_ptr().cast(), options.bits(), &mut ncid) });
        error::checked(status).map_err(|e| match e {
            // Missing parent directories
            error::Error::NotFound(msg) => {
                error::Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, msg))
            }
            e => e,
        })?;
        tracing::debug!(path = %path.display(), ?options, ncid, "created dataset");
        Ok(Self {
            handle: Arc::new(FileHandle::new(ncid, true)),
            path: path.to_owned(),
            mode: Mode::ReadWrite,
        })
    }

    /// Open an existing dataset
    ///
    /// # Errors
    ///
    /// `NotFound` if there is no file at `path`, `Format` if it is not
    /// a `netCDF` file
    pub fn open<P>(path: P, mode: Mode) -> error::Result<Self>
    where
        P: AsRef<path::Path>,
    {
        Self::open_with(path, mode, Options::empty())
    }

    /// Open an existing dataset, passing extra flags such as
    /// [`Options::DISKLESS`] or [`Options::SHARE`]
    pub fn open_with<P>(path: P, mode: Mode, options: Options) -> error::Result<Self>
    where
        P: AsRef<path::Path>,
    {
        let path = path.as_ref();
        let f = get_ffi_from_path(path)?;
        let mut ncid: nc_type = -1;
        let flags = mode.bits() | options.bits();
        checked_with_lock(|| unsafe { nc_open(f.as_ptr().cast(), flags, &mut ncid) })?;
        tracing::debug!(path = %path.display(), ?mode, ncid, "opened dataset");
        Ok(Self {
            handle: Arc::new(FileHandle::new(ncid, false)),
            path: path.to_owned(),
            mode,
        })
    }

    /// Flush and release the file
    ///
    /// Closing an already closed dataset does nothing. Handles derived
    /// from the dataset fail afterwards, see [`Dataset`].
    pub fn close(&mut self) -> error::Result<()> {
        if self.handle.close()? {
            tracing::debug!(path = %self.path.display(), "closed dataset");
        }
        Ok(())
    }

    /// `false` once the dataset has been closed
    pub fn is_open(&self) -> bool {
        self.handle.is_open()
    }

    /// Path given when creating or opening the dataset
    pub fn path(&self) -> &path::Path {
        &self.path
    }

    /// Mode the dataset was opened with
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Container format on disk
    pub fn format(&self) -> error::Result<Format> {
        Format::of(self.handle.ncid()?)
    }

    /// Write buffered data to disk without closing
    pub fn sync(&self) -> error::Result<()> {
        self.handle.sync()
    }

    /// Declare a dimension of length `len`, or [`UNLIMITED`]
    ///
    /// # Errors
    ///
    /// `DuplicateName` if a dimension of this name exists
    pub fn add_dim(&mut self, name: &str, len: usize) -> error::Result<Dimension> {
        dimension::add(&self.handle, name, len)
    }

    /// Declare a dimension which grows as data is written along it
    pub fn add_unlimited_dim(&mut self, name: &str) -> error::Result<Dimension> {
        self.add_dim(name, UNLIMITED)
    }

    /// Declare a variable over `dims`, slowest varying first.
    /// An empty list declares a scalar.
    ///
    /// # Errors
    ///
    /// `DuplicateName` if the name is taken, `ForeignDimension` if a
    /// dimension comes from another dataset, and `UnsupportedType`
    /// if the format can not store `kind`
    pub fn add_var(
        &mut self,
        name: &str,
        kind: ScalarKind,
        dims: &[&Dimension],
    ) -> error::Result<Variable> {
        variable::add(&self.handle, name, kind, dims)
    }

    /// Declare a variable holding elements of type `T`
    pub fn add_var_of<T: NcScalar>(
        &mut self,
        name: &str,
        dims: &[&Dimension],
    ) -> error::Result<Variable> {
        self.add_var(name, T::KIND, dims)
    }

    /// Look up a dimension
    pub fn dim(&self, name: &str) -> error::Result<Dimension> {
        dimension::from_name(&self.handle, name)?
            .ok_or_else(|| error::Error::NotFound(format!("dimension {name}")))
    }

    /// All dimensions, in order of declaration
    pub fn dims(&self) -> error::Result<Vec<Dimension>> {
        dimension::all(&self.handle)
    }

    /// Names of all dimensions, in order of declaration
    pub fn dim_names(&self) -> error::Result<Vec<String>> {
        self.dims()?.iter().map(Dimension::name).collect()
    }

    /// Look up a variable
    pub fn var(&self, name: &str) -> error::Result<Variable> {
        variable::from_name(&self.handle, name)?
            .ok_or_else(|| error::Error::NotFound(format!("variable {name}")))
    }

    /// All variables, in order of declaration
    pub fn vars(&self) -> error::Result<Vec<Variable>> {
        variable::all(&self.handle)
    }

    /// Names of all variables, in order of declaration
    pub fn var_names(&self) -> error::Result<Vec<String>> {
        self.vars()?.iter().map(Variable::name).collect()
    }

    /// Global attribute `name`. Nothing is created until it is written.
    pub fn attr(&self, name: &str) -> Attribute {
        Attribute::new(&self.handle, Owner::Global, name)
    }

    /// All global attributes
    pub fn attrs(&self) -> error::Result<Vec<Attribute>> {
        attribute::all(&self.handle, Owner::Global)
    }
}

impl Drop for Dataset {
    fn drop(&mut self) {
        if let Err(e) = self.handle.close() {
            tracing::warn!(path = %self.path.display(), error = %e, "could not close dataset");
        }
    }
}
