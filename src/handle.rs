//! Native file id shared by a dataset and everything derived from it
use netcdf_sys::{nc_close, nc_enddef, nc_redef, nc_sync, nc_type, NC_EINDEFINE, NC_ENOTINDEFINE};
use parking_lot::Mutex;

use super::error;
use super::utils::with_lock;

#[derive(Debug)]
struct State {
    open: bool,
    define_mode: bool,
}

/// Closing flips `open`, after which every holder of the handle
/// gets `ClosedHandle`, even if the library hands the same numeric id
/// to a later file.
#[derive(Debug)]
pub(crate) struct FileHandle {
    ncid: nc_type,
    state: Mutex<State>,
}

impl FileHandle {
    /// Freshly created files start out in define mode, opened ones do not
    pub(crate) fn new(ncid: nc_type, define_mode: bool) -> Self {
        Self {
            ncid,
            state: Mutex::new(State {
                open: true,
                define_mode,
            }),
        }
    }

    pub(crate) fn is_open(&self) -> bool {
        self.state.lock().open
    }

    /// The native id, as long as the file is open
    pub(crate) fn ncid(&self) -> error::Result<nc_type> {
        if self.state.lock().open {
            Ok(self.ncid)
        } else {
            Err(error::Error::ClosedHandle)
        }
    }

    /// Make sure declarations are accepted. Files in the enhanced
    /// model accept them either way.
    pub(crate) fn define_mode(&self) -> error::Result<nc_type> {
        let mut state = self.state.lock();
        if !state.open {
            return Err(error::Error::ClosedHandle);
        }
        if !state.define_mode {
            let status = with_lock(|| unsafe { nc_redef(self.ncid) });
            if status != NC_EINDEFINE {
                error::checked(status)?;
            }
            state.define_mode = true;
        }
        Ok(self.ncid)
    }

    /// Make sure data can be read or written
    pub(crate) fn data_mode(&self) -> error::Result<nc_type> {
        let mut state = self.state.lock();
        if !state.open {
            return Err(error::Error::ClosedHandle);
        }
        if state.define_mode {
            let status = with_lock(|| unsafe { nc_enddef(self.ncid) });
            if status != NC_ENOTINDEFINE {
                error::checked(status)?;
            }
            state.define_mode = false;
        }
        Ok(self.ncid)
    }

    pub(crate) fn sync(&self) -> error::Result<()> {
        let ncid = self.data_mode()?;
        error::checked(with_lock(|| unsafe { nc_sync(ncid) }))
    }

    /// Release the native id. Returns `Ok(false)` if it was already closed.
    ///
    /// The handle counts as closed afterwards even if the library reports
    /// an error, the id is not valid in either case.
    pub(crate) fn close(&self) -> error::Result<bool> {
        let mut state = self.state.lock();
        if !state.open {
            return Ok(false);
        }
        state.open = false;
        state.define_mode = false;
        error::checked(with_lock(|| unsafe { nc_close(self.ncid) }))?;
        Ok(true)
    }
}
