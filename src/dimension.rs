//! Interact with dimensions of a dataset
#![allow(clippy::similar_names)]

use std::num::NonZeroUsize;
use std::sync::Arc;

use netcdf_sys::{
    nc_def_dim, nc_inq_dimid, nc_inq_dimids, nc_inq_dimlen, nc_inq_dimname, nc_inq_unlimdims,
    nc_inq_vardimid, nc_inq_varndims, nc_type, NC_EBADDIM, NC_MAX_NAME,
};

use super::error;
use super::handle::FileHandle;
use super::utils::{checked_with_lock, name_from_bytes, short_name_to_bytes, with_lock};

/// Length given to a dimension which grows with the data written to it
pub const UNLIMITED: usize = netcdf_sys::NC_UNLIMITED;

/// A named axis of a dataset, either of fixed length or unlimited
#[derive(Clone)]
pub struct Dimension {
    pub(crate) file: Arc<FileHandle>,
    pub(crate) id: DimensionIdentifier,
    /// None when unlimited
    pub(crate) len: Option<NonZeroUsize>,
}

/// Identifies a dimension within one open file
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct DimensionIdentifier {
    pub(crate) ncid: nc_type,
    pub(crate) dimid: nc_type,
}

impl std::fmt::Debug for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dimension")
            .field("id", &self.id)
            .field("unlimited", &self.is_unlimited())
            .finish_non_exhaustive()
    }
}

#[allow(clippy::len_without_is_empty)]
impl Dimension {
    /// Current length. For unlimited dimensions this is the extent
    /// written so far.
    pub fn len(&self) -> error::Result<usize> {
        let ncid = self.file.ncid()?;
        if let Some(len) = self.len {
            return Ok(len.get());
        }
        let mut len = 0;
        // Other variables may have extended the dimension in the meantime
        checked_with_lock(|| unsafe { nc_inq_dimlen(ncid, self.id.dimid, &mut len) })?;
        Ok(len)
    }

    /// Checks whether the dimension is growable
    pub fn is_unlimited(&self) -> bool {
        self.len.is_none()
    }

    /// Gets the name of the dimension
    pub fn name(&self) -> error::Result<String> {
        let ncid = self.file.ncid()?;
        let mut name = [0_u8; NC_MAX_NAME as usize + 1];
        checked_with_lock(|| unsafe {
            nc_inq_dimname(ncid, self.id.dimid, name.as_mut_ptr().cast())
        })?;
        Ok(name_from_bytes(&name))
    }

    /// Unique identifier of this dimension within its file
    pub fn identifier(&self) -> DimensionIdentifier {
        self.id
    }

    /// Whether this dimension was obtained from the file behind `file`
    pub(crate) fn belongs_to(&self, file: &Arc<FileHandle>) -> bool {
        Arc::ptr_eq(&self.file, file)
    }
}

pub(crate) fn unlimited_ids(ncid: nc_type) -> error::Result<Vec<nc_type>> {
    let mut nunlim = 0;
    checked_with_lock(|| unsafe { nc_inq_unlimdims(ncid, &mut nunlim, std::ptr::null_mut()) })?;
    let mut unlimdims = vec![0; nunlim.try_into()?];
    if !unlimdims.is_empty() {
        checked_with_lock(|| unsafe {
            nc_inq_unlimdims(ncid, std::ptr::null_mut(), unlimdims.as_mut_ptr())
        })?;
    }
    Ok(unlimdims)
}

fn from_id(
    file: &Arc<FileHandle>,
    ncid: nc_type,
    dimid: nc_type,
    unlimdims: &[nc_type],
) -> error::Result<Dimension> {
    let len = if unlimdims.contains(&dimid) {
        None
    } else {
        let mut len = 0;
        checked_with_lock(|| unsafe { nc_inq_dimlen(ncid, dimid, &mut len) })?;
        // Only unlimited dimensions can have length zero
        NonZeroUsize::new(len)
    };
    Ok(Dimension {
        file: Arc::clone(file),
        id: DimensionIdentifier { ncid, dimid },
        len,
    })
}

pub(crate) fn from_name(file: &Arc<FileHandle>, name: &str) -> error::Result<Option<Dimension>> {
    let ncid = file.ncid()?;
    let cname = short_name_to_bytes(name)?;
    let mut dimid = 0;
    let e = with_lock(|| unsafe { nc_inq_dimid(ncid, cname.as_ptr().cast(), &mut dimid) });
    if e == NC_EBADDIM {
        return Ok(None);
    }
    error::checked(e)?;

    let unlimdims = unlimited_ids(ncid)?;
    from_id(file, ncid, dimid, &unlimdims).map(Some)
}

/// All dimensions of the file, in order of definition
pub(crate) fn all(file: &Arc<FileHandle>) -> error::Result<Vec<Dimension>> {
    let ncid = file.ncid()?;
    let mut ndims = 0;
    checked_with_lock(|| unsafe { nc_inq_dimids(ncid, &mut ndims, std::ptr::null_mut(), 0) })?;
    let mut dimids = vec![0; ndims.try_into()?];
    if !dimids.is_empty() {
        checked_with_lock(|| unsafe {
            nc_inq_dimids(ncid, std::ptr::null_mut(), dimids.as_mut_ptr(), 0)
        })?;
    }
    let unlimdims = unlimited_ids(ncid)?;
    dimids
        .into_iter()
        .map(|dimid| from_id(file, ncid, dimid, &unlimdims))
        .collect()
}

/// Dimensions of a variable, slowest varying first
pub(crate) fn of_variable(file: &Arc<FileHandle>, varid: nc_type) -> error::Result<Vec<Dimension>> {
    let ncid = file.ncid()?;
    let mut ndims = 0;
    checked_with_lock(|| unsafe { nc_inq_varndims(ncid, varid, &mut ndims) })?;
    let mut dimids = vec![0; ndims.try_into()?];
    if !dimids.is_empty() {
        checked_with_lock(|| unsafe { nc_inq_vardimid(ncid, varid, dimids.as_mut_ptr()) })?;
    }
    let unlimdims = unlimited_ids(ncid)?;
    dimids
        .into_iter()
        .map(|dimid| from_id(file, ncid, dimid, &unlimdims))
        .collect()
}

pub(crate) fn add(file: &Arc<FileHandle>, name: &str, len: usize) -> error::Result<Dimension> {
    file.ncid()?;
    let cname = short_name_to_bytes(name)?;
    if from_name(file, name)?.is_some() {
        return Err(error::Error::DuplicateName(name.to_owned()));
    }
    let ncid = file.define_mode()?;
    let mut dimid = 0;
    checked_with_lock(|| unsafe { nc_def_dim(ncid, cname.as_ptr().cast(), len, &mut dimid) })?;
    tracing::debug!(name, len, dimid, "defined dimension");
    Ok(Dimension {
        file: Arc::clone(file),
        id: DimensionIdentifier { ncid, dimid },
        len: NonZeroUsize::new(len),
    })
}
