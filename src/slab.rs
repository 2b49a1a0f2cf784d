//! Validation of hyperslab requests before they reach the library
use super::error;

/// Check a hyperslab against the current `shape` of a variable and
/// return the number of elements it covers.
///
/// Entries of `growable` mark unlimited dimensions which a write
/// may extend past their current length.
pub(crate) fn validate(
    shape: &[usize],
    growable: &[bool],
    start: &[usize],
    count: &[usize],
) -> error::Result<usize> {
    if start.len() != shape.len() {
        return Err(error::Error::ShapeMismatch {
            wanted: shape.len(),
            actual: start.len(),
        });
    }
    if count.len() != shape.len() {
        return Err(error::Error::ShapeMismatch {
            wanted: shape.len(),
            actual: count.len(),
        });
    }
    for (axis, ((&len, &s), &c)) in shape.iter().zip(start).zip(count).enumerate() {
        let end = s.checked_add(c).ok_or_else(|| {
            error::Error::OutOfBounds(format!("slab along axis {axis} overflows"))
        })?;
        let grows = growable.get(axis).copied().unwrap_or(false);
        if end > len && !grows {
            return Err(error::Error::OutOfBounds(format!(
                "{s}+{c} exceeds length {len} of axis {axis}"
            )));
        }
    }
    elements(count)
}

/// Product of all extents, one for a scalar
pub(crate) fn elements(count: &[usize]) -> error::Result<usize> {
    count.iter().try_fold(1_usize, |acc, &c| {
        acc.checked_mul(c).ok_or_else(|| {
            error::Error::OutOfBounds(format!("{count:?} covers too many elements"))
        })
    })
}

/// Length check of a caller supplied output buffer
pub(crate) fn check_output(wanted: usize, actual: usize) -> error::Result<()> {
    if actual < wanted {
        Err(error::Error::BufferTooSmall { wanted, actual })
    } else if actual > wanted {
        Err(error::Error::ShapeMismatch { wanted, actual })
    } else {
        Ok(())
    }
}

/// Length check of values going into the file
pub(crate) fn check_input(wanted: usize, actual: usize) -> error::Result<()> {
    if actual == wanted {
        Ok(())
    } else {
        Err(error::Error::ShapeMismatch { wanted, actual })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_slab() {
        assert_eq!(validate(&[5, 4], &[false, false], &[0, 0], &[5, 4]).unwrap(), 20);
        assert_eq!(validate(&[5, 4], &[false, false], &[4, 3], &[1, 1]).unwrap(), 1);
        assert_eq!(validate(&[5, 4], &[false, false], &[2, 1], &[0, 3]).unwrap(), 0);
    }

    #[test]
    fn scalar() {
        assert_eq!(validate(&[], &[], &[], &[]).unwrap(), 1);
    }

    #[test]
    fn rank_must_match() {
        assert!(matches!(
            validate(&[5, 4], &[false, false], &[0], &[5, 4]),
            Err(error::Error::ShapeMismatch {
                wanted: 2,
                actual: 1
            })
        ));
        assert!(matches!(
            validate(&[5, 4], &[false, false], &[0, 0], &[5, 4, 1]),
            Err(error::Error::ShapeMismatch {
                wanted: 2,
                actual: 3
            })
        ));
    }

    #[test]
    fn bounds() {
        assert!(matches!(
            validate(&[5, 4], &[false, false], &[3, 0], &[3, 4]),
            Err(error::Error::OutOfBounds(_))
        ));
        assert!(matches!(
            validate(&[5], &[false], &[usize::MAX], &[2]),
            Err(error::Error::OutOfBounds(_))
        ));
    }

    #[test]
    fn unlimited_axis_grows() {
        assert_eq!(validate(&[0, 3], &[true, false], &[0, 0], &[2, 3]).unwrap(), 6);
        assert_eq!(validate(&[2, 3], &[true, false], &[7, 0], &[1, 3]).unwrap(), 3);
        assert!(matches!(
            validate(&[0, 3], &[true, false], &[0, 1], &[1, 3]),
            Err(error::Error::OutOfBounds(_))
        ));
    }

    #[test]
    fn buffer_lengths() {
        assert!(check_output(20, 20).is_ok());
        assert!(matches!(
            check_output(20, 19),
            Err(error::Error::BufferTooSmall {
                wanted: 20,
                actual: 19
            })
        ));
        assert!(matches!(
            check_output(20, 21),
            Err(error::Error::ShapeMismatch {
                wanted: 20,
                actual: 21
            })
        ));
        assert!(matches!(
            check_input(4, 3),
            Err(error::Error::ShapeMismatch { .. })
        ));
    }
}
