//! Typed N-dimensional arrays stored in a dataset
#![allow(clippy::similar_names)]

use std::sync::Arc;

use netcdf_sys::{
    nc_def_var, nc_get_vara_text, nc_inq_varid, nc_inq_varids, nc_inq_varname, nc_inq_vartype,
    nc_put_vara_text, nc_type, NC_ENOTVAR, NC_MAX_NAME,
};

use super::attribute::{self, Attribute, Owner, FILL_VALUE};
use super::dataset::Format;
use super::dimension::{self, Dimension};
use super::error;
use super::handle::FileHandle;
use super::slab;
use super::types::{NcScalar, ScalarKind, Values};
use super::utils::{checked_with_lock, name_from_bytes, short_name_to_bytes, with_lock};

/// A variable of a dataset
///
/// Elements are laid out in row-major order over [`Variable::dims`],
/// the first dimension varying slowest.
#[derive(Clone)]
pub struct Variable {
    pub(crate) file: Arc<FileHandle>,
    pub(crate) varid: nc_type,
    pub(crate) kind: ScalarKind,
    pub(crate) dims: Vec<Dimension>,
}

impl std::fmt::Debug for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Variable")
            .field("varid", &self.varid)
            .field("kind", &self.kind)
            .field("dims", &self.dims)
            .finish_non_exhaustive()
    }
}

#[allow(clippy::len_without_is_empty)]
impl Variable {
    /// Name of the variable
    pub fn name(&self) -> error::Result<String> {
        let ncid = self.file.ncid()?;
        let mut name = [0_u8; NC_MAX_NAME as usize + 1];
        checked_with_lock(|| unsafe { nc_inq_varname(ncid, self.varid, name.as_mut_ptr().cast()) })?;
        Ok(name_from_bytes(&name))
    }

    /// Declared element type
    pub fn kind(&self) -> ScalarKind {
        self.kind
    }

    /// Number of dimensions, zero for a scalar
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Dimensions of the variable, slowest varying first
    pub fn dims(&self) -> &[Dimension] {
        &self.dims
    }

    /// Current length along every dimension. Unlimited dimensions
    /// report the extent written so far.
    pub fn shape(&self) -> error::Result<Vec<usize>> {
        self.dims.iter().map(Dimension::len).collect()
    }

    /// Number of elements currently held
    pub fn len(&self) -> error::Result<usize> {
        slab::elements(&self.shape()?)
    }

    /// Attribute `name` of this variable. Nothing is created until it
    /// is written.
    pub fn attr(&self, name: &str) -> Attribute {
        Attribute::new(
            &self.file,
            Owner::Variable {
                varid: self.varid,
                kind: self.kind,
            },
            name,
        )
    }

    /// All attributes of this variable
    pub fn attrs(&self) -> error::Result<Vec<Attribute>> {
        attribute::all(
            &self.file,
            Owner::Variable {
                varid: self.varid,
                kind: self.kind,
            },
        )
    }

    /// The `_FillValue` attribute, if one was written
    pub fn fill_value<T: NcScalar>(&self) -> error::Result<Option<T>> {
        let attr = self.attr(FILL_VALUE);
        if !attr.exists()? {
            return Ok(None);
        }
        Ok(attr.read_as::<T>()?.into_iter().next())
    }

    fn growable(&self) -> Vec<bool> {
        self.dims.iter().map(Dimension::is_unlimited).collect()
    }

    fn check_kind(&self, actual: ScalarKind) -> error::Result<()> {
        self.file.ncid()?;
        if self.kind == actual {
            Ok(())
        } else {
            Err(error::Error::TypeMismatch {
                expected: self.kind,
                actual,
            })
        }
    }

    /// Replace all elements
    ///
    /// # Errors
    ///
    /// `TypeMismatch` unless `T` is the declared kind, `ShapeMismatch`
    /// unless `values` holds exactly [`Variable::len`] elements
    pub fn write_all<T: NcScalar>(&mut self, values: &[T]) -> error::Result<()> {
        self.check_kind(T::KIND)?;
        let shape = self.shape()?;
        slab::check_input(slab::elements(&shape)?, values.len())?;
        let start = vec![0; shape.len()];
        self.put(&start, &shape, values)
    }

    /// All elements, in row-major order
    pub fn read_all<T: NcScalar>(&self) -> error::Result<Vec<T>> {
        self.check_kind(T::KIND)?;
        let mut values = vec![T::default(); self.len()?];
        self.read_into(&mut values)?;
        Ok(values)
    }

    /// Fill `buffer` with all elements
    ///
    /// # Errors
    ///
    /// `BufferTooSmall` or `ShapeMismatch` unless the buffer has exactly
    /// room for [`Variable::len`] elements
    pub fn read_into<T: NcScalar>(&self, buffer: &mut [T]) -> error::Result<()> {
        self.check_kind(T::KIND)?;
        let shape = self.shape()?;
        slab::check_output(slab::elements(&shape)?, buffer.len())?;
        let start = vec![0; shape.len()];
        self.get(&start, &shape, buffer)
    }

    /// Write the hyperslab at `start` with extent `count`. Writing past
    /// the end of an unlimited dimension grows it.
    pub fn write_slab<T: NcScalar>(
        &mut self,
        start: &[usize],
        count: &[usize],
        values: &[T],
    ) -> error::Result<()> {
        self.check_kind(T::KIND)?;
        let n = slab::validate(&self.shape()?, &self.growable(), start, count)?;
        slab::check_input(n, values.len())?;
        self.put(start, count, values)
    }

    /// Read the hyperslab at `start` with extent `count` into `buffer`
    pub fn read_slab<T: NcScalar>(
        &self,
        start: &[usize],
        count: &[usize],
        buffer: &mut [T],
    ) -> error::Result<()> {
        self.check_kind(T::KIND)?;
        let n = slab::validate(&self.shape()?, &[], start, count)?;
        slab::check_output(n, buffer.len())?;
        self.get(start, count, buffer)
    }

    /// Read the hyperslab at `start` with extent `count`
    pub fn read_slab_vec<T: NcScalar>(
        &self,
        start: &[usize],
        count: &[usize],
    ) -> error::Result<Vec<T>> {
        self.check_kind(T::KIND)?;
        let n = slab::validate(&self.shape()?, &[], start, count)?;
        let mut values = vec![T::default(); n];
        self.get(start, count, &mut values)?;
        Ok(values)
    }

    /// Single element at `index`
    pub fn read_at<T: NcScalar>(&self, index: &[usize]) -> error::Result<T> {
        let count = vec![1; index.len()];
        let mut value = [T::default()];
        self.read_slab(index, &count, &mut value)?;
        let [value] = value;
        Ok(value)
    }

    /// Replace the single element at `index`
    pub fn write_at<T: NcScalar>(&mut self, index: &[usize], value: T) -> error::Result<()> {
        let count = vec![1; index.len()];
        self.write_slab(index, &count, &[value])
    }

    fn put<T: NcScalar>(&self, start: &[usize], count: &[usize], values: &[T]) -> error::Result<()> {
        let ncid = self.file.data_mode()?;
        tracing::trace!(varid = self.varid, ?start, ?count, kind = %T::KIND, "put slab");
        // Lengths were checked against `count` by the caller
        unsafe { T::put_vara(ncid, self.varid, start, count, values) }
    }

    fn get<T: NcScalar>(
        &self,
        start: &[usize],
        count: &[usize],
        values: &mut [T],
    ) -> error::Result<()> {
        let ncid = self.file.data_mode()?;
        tracing::trace!(varid = self.varid, ?start, ?count, kind = %T::KIND, "get slab");
        // Lengths were checked against `count` by the caller
        unsafe { T::get_vara(ncid, self.varid, start, count, values) }
    }

    /// Replace all elements with values of any kind. The variant of
    /// `values` must match the declared kind.
    pub fn write_values(&mut self, values: &Values) -> error::Result<()> {
        match values {
            Values::I8(x) => self.write_all(x),
            Values::U8(x) => self.write_all(x),
            Values::I16(x) => self.write_all(x),
            Values::U16(x) => self.write_all(x),
            Values::I32(x) => self.write_all(x),
            Values::U32(x) => self.write_all(x),
            Values::I64(x) => self.write_all(x),
            Values::U64(x) => self.write_all(x),
            Values::F32(x) => self.write_all(x),
            Values::F64(x) => self.write_all(x),
            Values::Str(x) => self.write_all(x),
            Values::Text(x) => self.write_text(x),
        }
    }

    /// All elements, tagged with the declared kind
    pub fn read_values(&self) -> error::Result<Values> {
        Ok(match self.kind {
            ScalarKind::I8 => Values::I8(self.read_all()?),
            ScalarKind::U8 => Values::U8(self.read_all()?),
            ScalarKind::I16 => Values::I16(self.read_all()?),
            ScalarKind::U16 => Values::U16(self.read_all()?),
            ScalarKind::I32 => Values::I32(self.read_all()?),
            ScalarKind::U32 => Values::U32(self.read_all()?),
            ScalarKind::I64 => Values::I64(self.read_all()?),
            ScalarKind::U64 => Values::U64(self.read_all()?),
            ScalarKind::F32 => Values::F32(self.read_all()?),
            ScalarKind::F64 => Values::F64(self.read_all()?),
            ScalarKind::Str => Values::Str(self.read_all()?),
            ScalarKind::Char => Values::Text(self.read_text()?),
        })
    }

    /// Character variables hold one byte per element
    fn write_text(&mut self, text: &str) -> error::Result<()> {
        self.check_kind(ScalarKind::Char)?;
        let shape = self.shape()?;
        slab::check_input(slab::elements(&shape)?, text.len())?;
        let start = vec![0; shape.len()];
        let ncid = self.file.data_mode()?;
        checked_with_lock(|| unsafe {
            nc_put_vara_text(
                ncid,
                self.varid,
                start.as_ptr(),
                shape.as_ptr(),
                text.as_ptr().cast(),
            )
        })
    }

    fn read_text(&self) -> error::Result<String> {
        self.check_kind(ScalarKind::Char)?;
        let shape = self.shape()?;
        let mut buf = vec![0_u8; slab::elements(&shape)?];
        let start = vec![0; shape.len()];
        let ncid = self.file.data_mode()?;
        checked_with_lock(|| unsafe {
            nc_get_vara_text(
                ncid,
                self.varid,
                start.as_ptr(),
                shape.as_ptr(),
                buf.as_mut_ptr().cast(),
            )
        })?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

#[cfg(feature = "ndarray")]
impl Variable {
    /// All elements as an array shaped like [`Variable::shape`]
    pub fn read_array<T: NcScalar>(&self) -> error::Result<ndarray::ArrayD<T>> {
        let shape = self.shape()?;
        let values = self.read_all::<T>()?;
        let actual = values.len();
        ndarray::ArrayD::from_shape_vec(shape, values).map_err(|_| error::Error::ShapeMismatch {
            wanted: self.len().unwrap_or(0),
            actual,
        })
    }

    /// Write `array` at the origin. Its shape takes the place of the
    /// slab extent, so unlimited dimensions may grow.
    pub fn write_array<T, S, D>(&mut self, array: &ndarray::ArrayBase<S, D>) -> error::Result<()>
    where
        T: NcScalar,
        S: ndarray::Data<Elem = T>,
        D: ndarray::Dimension,
    {
        let standard = array.as_standard_layout();
        let values = standard.as_slice().ok_or(error::Error::ShapeMismatch {
            wanted: array.len(),
            actual: 0,
        })?;
        let start = vec![0; array.ndim()];
        self.write_slab(&start, array.shape(), values)
    }
}

pub(crate) fn from_name(file: &Arc<FileHandle>, name: &str) -> error::Result<Option<Variable>> {
    let ncid = file.ncid()?;
    let cname = short_name_to_bytes(name)?;
    let mut varid = 0;
    let e = with_lock(|| unsafe { nc_inq_varid(ncid, cname.as_ptr().cast(), &mut varid) });
    if e == NC_ENOTVAR {
        return Ok(None);
    }
    error::checked(e)?;
    from_id(file, ncid, varid).map(Some)
}

fn from_id(file: &Arc<FileHandle>, ncid: nc_type, varid: nc_type) -> error::Result<Variable> {
    let mut xtype = 0;
    checked_with_lock(|| unsafe { nc_inq_vartype(ncid, varid, &mut xtype) })?;
    Ok(Variable {
        file: Arc::clone(file),
        varid,
        kind: ScalarKind::from_code(xtype)?,
        dims: dimension::of_variable(file, varid)?,
    })
}

/// All variables of the file, in order of definition
pub(crate) fn all(file: &Arc<FileHandle>) -> error::Result<Vec<Variable>> {
    let ncid = file.ncid()?;
    let mut nvars = 0;
    checked_with_lock(|| unsafe { nc_inq_varids(ncid, &mut nvars, std::ptr::null_mut()) })?;
    let mut varids = vec![0; nvars.try_into()?];
    if !varids.is_empty() {
        checked_with_lock(|| unsafe {
            nc_inq_varids(ncid, std::ptr::null_mut(), varids.as_mut_ptr())
        })?;
    }
    varids
        .into_iter()
        .map(|varid| from_id(file, ncid, varid))
        .collect()
}

pub(crate) fn add(
    file: &Arc<FileHandle>,
    name: &str,
    kind: ScalarKind,
    dims: &[&Dimension],
) -> error::Result<Variable> {
    let ncid = file.ncid()?;
    let cname = short_name_to_bytes(name)?;
    for dim in dims {
        if !dim.belongs_to(file) {
            let label = dim
                .name()
                .unwrap_or_else(|_| format!("dimid {}", dim.id.dimid));
            return Err(error::Error::ForeignDimension(label));
        }
    }
    let format = Format::of(ncid)?;
    if !format.supports(kind) {
        return Err(error::Error::UnsupportedType(format!(
            "{kind} can not be stored in {format:?} files"
        )));
    }
    if from_name(file, name)?.is_some() {
        return Err(error::Error::DuplicateName(name.to_owned()));
    }

    let dimids = dims.iter().map(|d| d.id.dimid).collect::<Vec<_>>();
    let ndims = dimids.len().try_into()?;
    let ncid = file.define_mode()?;
    let mut varid = 0;
    checked_with_lock(|| unsafe {
        nc_def_var(
            ncid,
            cname.as_ptr().cast(),
            kind.code(),
            ndims,
            dimids.as_ptr(),
            &mut varid,
        )
    })?;
    tracing::debug!(name, %kind, ?dimids, varid, "defined variable");

    Ok(Variable {
        file: Arc::clone(file),
        varid,
        kind,
        dims: dims.iter().map(|&d| d.clone()).collect(),
    })
}
