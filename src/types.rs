//! Scalar kinds which can be stored in a dataset
use std::ffi::{CStr, CString};
use std::fmt;
use std::os::raw::c_char;

use netcdf_sys::{
    nc_free_string, nc_get_att, nc_get_att_string, nc_get_vara, nc_get_vara_string, nc_put_att,
    nc_put_att_string, nc_put_vara, nc_put_vara_string, nc_type, NC_BYTE, NC_CHAR, NC_DOUBLE,
    NC_FLOAT, NC_INT, NC_INT64, NC_SHORT, NC_STRING, NC_UBYTE, NC_UINT, NC_UINT64, NC_USHORT,
};

use super::error;
use super::utils::{checked_with_lock, with_lock};

/// The closed set of element types a variable or attribute can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    /// Signed 8 bit integer (`NC_BYTE`)
    I8,
    /// Unsigned 8 bit integer (`NC_UBYTE`)
    U8,
    /// Signed 16 bit integer (`NC_SHORT`)
    I16,
    /// Unsigned 16 bit integer (`NC_USHORT`)
    U16,
    /// Signed 32 bit integer (`NC_INT`)
    I32,
    /// Unsigned 32 bit integer (`NC_UINT`)
    U32,
    /// Signed 64 bit integer (`NC_INT64`)
    I64,
    /// Unsigned 64 bit integer (`NC_UINT64`)
    U64,
    /// 32 bit float (`NC_FLOAT`)
    F32,
    /// 64 bit float (`NC_DOUBLE`)
    F64,
    /// Variable length string (`NC_STRING`)
    Str,
    /// Single byte text character (`NC_CHAR`)
    Char,
}

impl ScalarKind {
    /// Every kind, in order of their library codes
    pub const ALL: [ScalarKind; 12] = [
        ScalarKind::I8,
        ScalarKind::Char,
        ScalarKind::I16,
        ScalarKind::I32,
        ScalarKind::F32,
        ScalarKind::F64,
        ScalarKind::U8,
        ScalarKind::U16,
        ScalarKind::U32,
        ScalarKind::I64,
        ScalarKind::U64,
        ScalarKind::Str,
    ];

    /// Type code used by the library
    pub fn code(self) -> nc_type {
        match self {
            ScalarKind::I8 => NC_BYTE,
            ScalarKind::Char => NC_CHAR,
            ScalarKind::I16 => NC_SHORT,
            ScalarKind::I32 => NC_INT,
            ScalarKind::F32 => NC_FLOAT,
            ScalarKind::F64 => NC_DOUBLE,
            ScalarKind::U8 => NC_UBYTE,
            ScalarKind::U16 => NC_USHORT,
            ScalarKind::U32 => NC_UINT,
            ScalarKind::I64 => NC_INT64,
            ScalarKind::U64 => NC_UINT64,
            ScalarKind::Str => NC_STRING,
        }
    }

    /// Kind for a library type code
    ///
    /// # Errors
    ///
    /// Compound, enum, opaque and vlen types are not supported
    pub fn from_code(code: nc_type) -> error::Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.code() == code)
            .ok_or_else(|| error::Error::UnsupportedType(format!("type code {code}")))
    }

    /// Size of one element in bytes. Strings are stored as pointers.
    pub fn width(self) -> usize {
        match self {
            ScalarKind::I8 | ScalarKind::U8 | ScalarKind::Char => 1,
            ScalarKind::I16 | ScalarKind::U16 => 2,
            ScalarKind::I32 | ScalarKind::U32 | ScalarKind::F32 => 4,
            ScalarKind::I64 | ScalarKind::U64 | ScalarKind::F64 => 8,
            ScalarKind::Str => std::mem::size_of::<*const c_char>(),
        }
    }

    /// Short lowercase name, as printed by `ncdump`
    pub fn name(self) -> &'static str {
        match self {
            ScalarKind::I8 => "byte",
            ScalarKind::U8 => "ubyte",
            ScalarKind::I16 => "short",
            ScalarKind::U16 => "ushort",
            ScalarKind::I32 => "int",
            ScalarKind::U32 => "uint",
            ScalarKind::I64 => "int64",
            ScalarKind::U64 => "uint64",
            ScalarKind::F32 => "float",
            ScalarKind::F64 => "double",
            ScalarKind::Str => "string",
            ScalarKind::Char => "char",
        }
    }

    /// Whether the classic data model (`CDF-1`, `CDF-2` and
    /// `netCDF-4` classic) can store this kind
    pub fn is_classic(self) -> bool {
        matches!(
            self,
            ScalarKind::I8
                | ScalarKind::Char
                | ScalarKind::I16
                | ScalarKind::I32
                | ScalarKind::F32
                | ScalarKind::F64
        )
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

mod sealed {
    pub trait Sealed {}
}

/// Rust types which map one to one onto a [`ScalarKind`]
///
/// Values are moved across the library boundary untouched, a variable of
/// kind [`ScalarKind::I16`] only accepts and produces `i16`.
///
/// This trait is sealed and can not be implemented for types outside
/// this crate.
pub trait NcScalar: sealed::Sealed + Clone + Default + Send + 'static {
    /// Kind corresponding to this type
    const KIND: ScalarKind;

    /// Put `values` into the hyperslab at `start` with extent `count`
    ///
    /// # Safety
    ///
    /// `start` and `count` must have the rank of the variable and
    /// `values.len()` must equal the product of `count`
    #[doc(hidden)]
    unsafe fn put_vara(
        ncid: nc_type,
        varid: nc_type,
        start: &[usize],
        count: &[usize],
        values: &[Self],
    ) -> error::Result<()>;

    /// Fill `values` from the hyperslab at `start` with extent `count`
    ///
    /// # Safety
    ///
    /// `start` and `count` must have the rank of the variable and
    /// `values.len()` must equal the product of `count`
    #[doc(hidden)]
    unsafe fn get_vara(
        ncid: nc_type,
        varid: nc_type,
        start: &[usize],
        count: &[usize],
        values: &mut [Self],
    ) -> error::Result<()>;

    /// # Safety
    ///
    /// `name` must be nul-terminated
    #[doc(hidden)]
    unsafe fn put_att(
        ncid: nc_type,
        varid: nc_type,
        name: *const c_char,
        values: &[Self],
    ) -> error::Result<()>;

    /// # Safety
    ///
    /// `name` must be nul-terminated and `values` must have room for
    /// every element of the attribute
    #[doc(hidden)]
    unsafe fn get_att(
        ncid: nc_type,
        varid: nc_type,
        name: *const c_char,
        values: &mut [Self],
    ) -> error::Result<()>;

    /// Wrap in the matching [`Values`] variant
    fn into_values(values: Vec<Self>) -> Values;

    /// Unwrap the matching [`Values`] variant, handing back anything else
    fn from_values(values: Values) -> Result<Vec<Self>, Values>;
}

/// Implements [`NcScalar`] for a fixed-width type through the untyped
/// `nc_put_vara`/`nc_get_vara` family. The stored type always equals
/// the memory type, so no conversion happens in the library.
macro_rules! impl_numeric {
    ($sized_type: ty, $kind: ident) => {
        impl sealed::Sealed for $sized_type {}

        impl NcScalar for $sized_type {
            const KIND: ScalarKind = ScalarKind::$kind;

            unsafe fn put_vara(
                ncid: nc_type,
                varid: nc_type,
                start: &[usize],
                count: &[usize],
                values: &[Self],
            ) -> error::Result<()> {
                checked_with_lock(|| {
                    nc_put_vara(
                        ncid,
                        varid,
                        start.as_ptr(),
                        count.as_ptr(),
                        values.as_ptr().cast(),
                    )
                })
            }

            unsafe fn get_vara(
                ncid: nc_type,
                varid: nc_type,
                start: &[usize],
                count: &[usize],
                values: &mut [Self],
            ) -> error::Result<()> {
                checked_with_lock(|| {
                    nc_get_vara(
                        ncid,
                        varid,
                        start.as_ptr(),
                        count.as_ptr(),
                        values.as_mut_ptr().cast(),
                    )
                })
            }

            unsafe fn put_att(
                ncid: nc_type,
                varid: nc_type,
                name: *const c_char,
                values: &[Self],
            ) -> error::Result<()> {
                checked_with_lock(|| {
                    nc_put_att(
                        ncid,
                        varid,
                        name,
                        Self::KIND.code(),
                        values.len(),
                        values.as_ptr().cast(),
                    )
                })
            }

            unsafe fn get_att(
                ncid: nc_type,
                varid: nc_type,
                name: *const c_char,
                values: &mut [Self],
            ) -> error::Result<()> {
                checked_with_lock(|| nc_get_att(ncid, varid, name, values.as_mut_ptr().cast()))
            }

            fn into_values(values: Vec<Self>) -> Values {
                Values::$kind(values)
            }

            fn from_values(values: Values) -> Result<Vec<Self>, Values> {
                match values {
                    Values::$kind(x) => Ok(x),
                    other => Err(other),
                }
            }
        }
    };
}

impl_numeric!(i8, I8);
impl_numeric!(u8, U8);
impl_numeric!(i16, I16);
impl_numeric!(u16, U16);
impl_numeric!(i32, I32);
impl_numeric!(u32, U32);
impl_numeric!(i64, I64);
impl_numeric!(u64, U64);
impl_numeric!(f32, F32);
impl_numeric!(f64, F64);

/// Strings allocated by the library, released through
/// `nc_free_string` when dropped
struct NcStrings(Vec<*mut c_char>);

impl NcStrings {
    fn new(len: usize) -> Self {
        Self(vec![std::ptr::null_mut(); len])
    }

    fn to_strings(&self) -> Vec<String> {
        self.0
            .iter()
            .map(|&ptr| {
                if ptr.is_null() {
                    String::new()
                } else {
                    unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
                }
            })
            .collect()
    }
}

impl Drop for NcStrings {
    fn drop(&mut self) {
        if self.0.iter().any(|p| !p.is_null()) {
            let status = with_lock(|| unsafe { nc_free_string(self.0.len(), self.0.as_mut_ptr()) });
            if status != netcdf_sys::NC_NOERR {
                tracing::warn!(status, "could not release strings");
            }
        }
    }
}

/// Owned, nul-terminated copies of strings handed to the library
fn to_cstrings(values: &[String]) -> error::Result<Vec<CString>> {
    values
        .iter()
        .map(|s| CString::new(s.as_str()).map_err(error::Error::from))
        .collect()
}

impl sealed::Sealed for String {}

impl NcScalar for String {
    const KIND: ScalarKind = ScalarKind::Str;

    unsafe fn put_vara(
        ncid: nc_type,
        varid: nc_type,
        start: &[usize],
        count: &[usize],
        values: &[Self],
    ) -> error::Result<()> {
        let owned = to_cstrings(values)?;
        let mut ptrs = owned.iter().map(|s| s.as_ptr()).collect::<Vec<_>>();
        checked_with_lock(|| {
            nc_put_vara_string(
                ncid,
                varid,
                start.as_ptr(),
                count.as_ptr(),
                ptrs.as_mut_ptr(),
            )
        })
    }

    unsafe fn get_vara(
        ncid: nc_type,
        varid: nc_type,
        start: &[usize],
        count: &[usize],
        values: &mut [Self],
    ) -> error::Result<()> {
        let mut buf = NcStrings::new(values.len());
        checked_with_lock(|| {
            nc_get_vara_string(
                ncid,
                varid,
                start.as_ptr(),
                count.as_ptr(),
                buf.0.as_mut_ptr(),
            )
        })?;
        for (value, s) in values.iter_mut().zip(buf.to_strings()) {
            *value = s;
        }
        Ok(())
    }

    unsafe fn put_att(
        ncid: nc_type,
        varid: nc_type,
        name: *const c_char,
        values: &[Self],
    ) -> error::Result<()> {
        let owned = to_cstrings(values)?;
        let mut ptrs = owned.iter().map(|s| s.as_ptr()).collect::<Vec<_>>();
        checked_with_lock(|| nc_put_att_string(ncid, varid, name, ptrs.len(), ptrs.as_mut_ptr()))
    }

    unsafe fn get_att(
        ncid: nc_type,
        varid: nc_type,
        name: *const c_char,
        values: &mut [Self],
    ) -> error::Result<()> {
        let mut buf = NcStrings::new(values.len());
        checked_with_lock(|| nc_get_att_string(ncid, varid, name, buf.0.as_mut_ptr()))?;
        for (value, s) in values.iter_mut().zip(buf.to_strings()) {
            *value = s;
        }
        Ok(())
    }

    fn into_values(values: Vec<Self>) -> Values {
        Values::Str(values)
    }

    fn from_values(values: Values) -> Result<Vec<Self>, Values> {
        match values {
            Values::Str(x) => Ok(x),
            other => Err(other),
        }
    }
}

/// Values of any supported kind, tagged by their kind
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq)]
pub enum Values {
    I8(Vec<i8>),
    U8(Vec<u8>),
    I16(Vec<i16>),
    U16(Vec<u16>),
    I32(Vec<i32>),
    U32(Vec<u32>),
    I64(Vec<i64>),
    U64(Vec<u64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
    Str(Vec<String>),
    /// `NC_CHAR` data, one byte per element
    Text(String),
}

impl Values {
    /// Kind of the contained elements
    pub fn kind(&self) -> ScalarKind {
        match self {
            Values::I8(_) => ScalarKind::I8,
            Values::U8(_) => ScalarKind::U8,
            Values::I16(_) => ScalarKind::I16,
            Values::U16(_) => ScalarKind::U16,
            Values::I32(_) => ScalarKind::I32,
            Values::U32(_) => ScalarKind::U32,
            Values::I64(_) => ScalarKind::I64,
            Values::U64(_) => ScalarKind::U64,
            Values::F32(_) => ScalarKind::F32,
            Values::F64(_) => ScalarKind::F64,
            Values::Str(_) => ScalarKind::Str,
            Values::Text(_) => ScalarKind::Char,
        }
    }

    /// Number of elements, bytes for text
    pub fn len(&self) -> usize {
        match self {
            Values::I8(x) => x.len(),
            Values::U8(x) => x.len(),
            Values::I16(x) => x.len(),
            Values::U16(x) => x.len(),
            Values::I32(x) => x.len(),
            Values::U32(x) => x.len(),
            Values::I64(x) => x.len(),
            Values::U64(x) => x.len(),
            Values::F32(x) => x.len(),
            Values::F64(x) => x.len(),
            Values::Str(x) => x.len(),
            Values::Text(x) => x.len(),
        }
    }

    /// `true` when there are no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take the elements out as `T`
    ///
    /// # Errors
    ///
    /// `TypeMismatch` unless the values are of kind `T::KIND`
    pub fn into_vec<T: NcScalar>(self) -> error::Result<Vec<T>> {
        T::from_values(self).map_err(|other| error::Error::TypeMismatch {
            expected: other.kind(),
            actual: T::KIND,
        })
    }
}

impl fmt::Display for Values {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, x: &[T], suffix: &str) -> fmt::Result {
            for (i, v) in x.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{v}{suffix}")?;
            }
            Ok(())
        }
        match self {
            Values::I8(x) => list(f, x, "b"),
            Values::U8(x) => list(f, x, "ub"),
            Values::I16(x) => list(f, x, "s"),
            Values::U16(x) => list(f, x, "us"),
            Values::I32(x) => list(f, x, ""),
            Values::U32(x) => list(f, x, "u"),
            Values::I64(x) => list(f, x, "ll"),
            Values::U64(x) => list(f, x, "ull"),
            Values::F32(x) => list(f, x, "f"),
            Values::F64(x) => list(f, x, ""),
            Values::Str(x) => {
                let quoted = x.iter().map(|s| format!("{s:?}")).collect::<Vec<_>>();
                list(f, &quoted, "")
            }
            Values::Text(x) => write!(f, "{x:?}"),
        }
    }
}

macro_rules! impl_from {
    ($sized_type: ty, $kind: ident) => {
        impl From<$sized_type> for Values {
            fn from(x: $sized_type) -> Self {
                Values::$kind(vec![x])
            }
        }
        impl From<Vec<$sized_type>> for Values {
            fn from(x: Vec<$sized_type>) -> Self {
                Values::$kind(x)
            }
        }
        impl From<&[$sized_type]> for Values {
            fn from(x: &[$sized_type]) -> Self {
                Values::$kind(x.to_vec())
            }
        }
        impl<const N: usize> From<[$sized_type; N]> for Values {
            fn from(x: [$sized_type; N]) -> Self {
                Values::$kind(x.to_vec())
            }
        }
    };
}

impl_from!(i8, I8);
impl_from!(u8, U8);
impl_from!(i16, I16);
impl_from!(u16, U16);
impl_from!(i32, I32);
impl_from!(u32, U32);
impl_from!(i64, I64);
impl_from!(u64, U64);
impl_from!(f32, F32);
impl_from!(f64, F64);

impl From<&str> for Values {
    fn from(x: &str) -> Self {
        Values::Text(x.to_owned())
    }
}

impl From<String> for Values {
    fn from(x: String) -> Self {
        Values::Text(x)
    }
}

impl From<Vec<String>> for Values {
    fn from(x: Vec<String>) -> Self {
        Values::Str(x)
    }
}

impl From<&[&str]> for Values {
    fn from(x: &[&str]) -> Self {
        Values::Str(x.iter().map(|&s| s.to_owned()).collect())
    }
}
