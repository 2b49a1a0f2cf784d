//! Add and read attributes of datasets and variables
#![allow(clippy::similar_names)]

use std::os::raw::c_char;
use std::sync::Arc;

use netcdf_sys::{
    nc_del_att, nc_get_att_text, nc_inq_att, nc_inq_attid, nc_inq_attname, nc_inq_varnatts,
    nc_put_att_text, nc_type, NC_ENOTATT, NC_GLOBAL, NC_MAX_NAME,
};

use super::error;
use super::handle::FileHandle;
use super::types::{NcScalar, ScalarKind, Values};
use super::utils::{checked_with_lock, name_from_bytes, short_name_to_bytes, with_lock};

/// Name of the attribute holding the value of unwritten elements
pub const FILL_VALUE: &str = "_FillValue";

/// What an attribute is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Owner {
    Global,
    Variable { varid: nc_type, kind: ScalarKind },
}

impl Owner {
    fn varid(self) -> nc_type {
        match self {
            Owner::Global => NC_GLOBAL,
            Owner::Variable { varid, .. } => varid,
        }
    }
}

/// A named list of values attached to a dataset or a variable
///
/// The handle can exist before the attribute does, the attribute is
/// created by the first [`Attribute::write`].
#[derive(Clone)]
pub struct Attribute {
    file: Arc<FileHandle>,
    owner: Owner,
    name: String,
}

impl std::fmt::Debug for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attribute")
            .field("name", &self.name)
            .field("owner", &self.owner)
            .finish_non_exhaustive()
    }
}

#[allow(clippy::len_without_is_empty)]
impl Attribute {
    pub(crate) fn new(file: &Arc<FileHandle>, owner: Owner, name: &str) -> Self {
        Self {
            file: Arc::clone(file),
            owner,
            name: name.to_owned(),
        }
    }

    /// Get the name of the attribute
    pub fn name(&self) -> &str {
        &self.name
    }

    fn not_found(&self) -> error::Error {
        error::Error::NotFound(format!("attribute {}", self.name))
    }

    /// Kind and number of elements
    fn inquire(&self) -> error::Result<(ScalarKind, usize)> {
        let ncid = self.file.ncid()?;
        let cname = short_name_to_bytes(&self.name)?;
        let mut xtype = 0;
        let mut len = 0;
        let e = with_lock(|| unsafe {
            nc_inq_att(
                ncid,
                self.owner.varid(),
                cname.as_ptr().cast(),
                &mut xtype,
                &mut len,
            )
        });
        if e == NC_ENOTATT {
            return Err(self.not_found());
        }
        error::checked(e)?;
        Ok((ScalarKind::from_code(xtype)?, len))
    }

    /// Whether the attribute has been written
    pub fn exists(&self) -> error::Result<bool> {
        let ncid = self.file.ncid()?;
        let cname = short_name_to_bytes(&self.name)?;
        let mut attid = 0;
        let e = with_lock(|| unsafe {
            nc_inq_attid(ncid, self.owner.varid(), cname.as_ptr().cast(), &mut attid)
        });
        if e == NC_ENOTATT {
            return Ok(false);
        }
        error::checked(e)?;
        Ok(true)
    }

    /// Number of stored elements, bytes for text
    pub fn len(&self) -> error::Result<usize> {
        self.inquire().map(|(_, len)| len)
    }

    /// Kind of the stored elements
    pub fn kind(&self) -> error::Result<ScalarKind> {
        self.inquire().map(|(kind, _)| kind)
    }

    /// Read the stored values
    ///
    /// # Errors
    ///
    /// `NotFound` if the attribute was never written
    pub fn read(&self) -> error::Result<Values> {
        let (kind, len) = self.inquire()?;
        Ok(match kind {
            ScalarKind::I8 => Values::I8(self.read_typed(len)?),
            ScalarKind::U8 => Values::U8(self.read_typed(len)?),
            ScalarKind::I16 => Values::I16(self.read_typed(len)?),
            ScalarKind::U16 => Values::U16(self.read_typed(len)?),
            ScalarKind::I32 => Values::I32(self.read_typed(len)?),
            ScalarKind::U32 => Values::U32(self.read_typed(len)?),
            ScalarKind::I64 => Values::I64(self.read_typed(len)?),
            ScalarKind::U64 => Values::U64(self.read_typed(len)?),
            ScalarKind::F32 => Values::F32(self.read_typed(len)?),
            ScalarKind::F64 => Values::F64(self.read_typed(len)?),
            ScalarKind::Str => Values::Str(self.read_typed(len)?),
            ScalarKind::Char => Values::Text(self.read_text(len)?),
        })
    }

    /// Read the stored values as `T`
    ///
    /// # Errors
    ///
    /// `TypeMismatch` unless the attribute is of kind `T::KIND`
    pub fn read_as<T: NcScalar>(&self) -> error::Result<Vec<T>> {
        let (kind, len) = self.inquire()?;
        if kind != T::KIND {
            return Err(error::Error::TypeMismatch {
                expected: kind,
                actual: T::KIND,
            });
        }
        self.read_typed(len)
    }

    fn read_typed<T: NcScalar>(&self, len: usize) -> error::Result<Vec<T>> {
        let ncid = self.file.ncid()?;
        let cname = short_name_to_bytes(&self.name)?;
        let mut values = vec![T::default(); len];
        unsafe { T::get_att(ncid, self.owner.varid(), cname.as_ptr().cast(), &mut values)? };
        Ok(values)
    }

    fn read_text(&self, len: usize) -> error::Result<String> {
        let ncid = self.file.ncid()?;
        let cname = short_name_to_bytes(&self.name)?;
        let mut buf = vec![0_u8; len];
        checked_with_lock(|| unsafe {
            nc_get_att_text(
                ncid,
                self.owner.varid(),
                cname.as_ptr().cast(),
                buf.as_mut_ptr().cast(),
            )
        })?;
        // Some writers include the terminating nul
        let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
        Ok(String::from_utf8_lossy(&buf[..end]).into_owned())
    }

    /// Write `values`, replacing any previous value, kind and length
    ///
    /// # Errors
    ///
    /// `Empty` without values. On a variable, `_FillValue` must be a
    /// single value of the variable's kind or `InvalidFillValue` is
    /// returned and nothing is written.
    pub fn write(&self, values: impl Into<Values>) -> error::Result<()> {
        let values = values.into();
        self.file.ncid()?;
        let cname = short_name_to_bytes(&self.name)?;
        if values.is_empty() {
            return Err(error::Error::Empty(self.name.clone()));
        }
        if let Owner::Variable { kind, .. } = self.owner {
            if self.name == FILL_VALUE {
                if values.kind() != kind {
                    return Err(error::Error::InvalidFillValue(format!(
                        "variable holds {kind}, got {}",
                        values.kind()
                    )));
                }
                if values.len() != 1 {
                    return Err(error::Error::InvalidFillValue(format!(
                        "needs exactly one value, got {}",
                        values.len()
                    )));
                }
            }
        }

        let ncid = self.file.define_mode()?;
        let varid = self.owner.varid();
        let name: *const c_char = cname.as_ptr().cast();
        unsafe {
            match &values {
                Values::I8(x) => i8::put_att(ncid, varid, name, x),
                Values::U8(x) => u8::put_att(ncid, varid, name, x),
                Values::I16(x) => i16::put_att(ncid, varid, name, x),
                Values::U16(x) => u16::put_att(ncid, varid, name, x),
                Values::I32(x) => i32::put_att(ncid, varid, name, x),
                Values::U32(x) => u32::put_att(ncid, varid, name, x),
                Values::I64(x) => i64::put_att(ncid, varid, name, x),
                Values::U64(x) => u64::put_att(ncid, varid, name, x),
                Values::F32(x) => f32::put_att(ncid, varid, name, x),
                Values::F64(x) => f64::put_att(ncid, varid, name, x),
                Values::Str(x) => String::put_att(ncid, varid, name, x),
                Values::Text(x) => checked_with_lock(|| {
                    nc_put_att_text(ncid, varid, name, x.len(), x.as_ptr().cast())
                }),
            }?;
        }
        tracing::debug!(
            name = %self.name,
            owner = ?self.owner,
            kind = %values.kind(),
            len = values.len(),
            "wrote attribute"
        );
        Ok(())
    }

    /// Remove the attribute
    ///
    /// # Errors
    ///
    /// `NotFound` if it does not exist
    pub fn delete(&self) -> error::Result<()> {
        self.file.ncid()?;
        let cname = short_name_to_bytes(&self.name)?;
        if !self.exists()? {
            return Err(self.not_found());
        }
        let ncid = self.file.define_mode()?;
        checked_with_lock(|| unsafe { nc_del_att(ncid, self.owner.varid(), cname.as_ptr().cast()) })
    }
}

/// Every attribute attached to `owner`, in storage order
pub(crate) fn all(file: &Arc<FileHandle>, owner: Owner) -> error::Result<Vec<Attribute>> {
    let ncid = file.ncid()?;
    let varid = owner.varid();
    let mut natts = 0;
    checked_with_lock(|| unsafe { nc_inq_varnatts(ncid, varid, &mut natts) })?;
    (0..natts)
        .map(|attnum| {
            let mut name = [0_u8; NC_MAX_NAME as usize + 1];
            checked_with_lock(|| unsafe {
                nc_inq_attname(ncid, varid, attnum, name.as_mut_ptr().cast())
            })?;
            Ok(Attribute::new(file, owner, &name_from_bytes(&name)))
        })
        .collect()
}
