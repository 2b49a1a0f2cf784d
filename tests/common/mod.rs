#![allow(dead_code)]

use ncdataset::{Dataset, Options, ScalarKind};

/// Rows of the `g` variable written by [`gopher`]
pub(crate) const GOPHER_ROWS: [[u8; 4]; 5] = [
    [0, 1, 2, 3],
    [1, 2, 3, 4],
    [2, 3, 4, 5],
    [3, 4, 5, 6],
    [4, 5, 6, 7],
];

/// Writes a `height` x `width` dataset with a `u8` variable `g`
/// holding `x + y`, then closes it
pub(crate) fn gopher(path: &std::path::Path) {
    let mut ds = Dataset::create(path, Options::CLOBBER | Options::NETCDF4).unwrap();
    let height = ds.add_dim("height", 5).unwrap();
    let width = ds.add_dim("width", 4).unwrap();

    let mut g = ds.add_var("g", ScalarKind::U8, &[&height, &width]).unwrap();
    g.attr("_FillValue").write(255_u8).unwrap();
    g.attr("year").write(2012_i32).unwrap();

    let data = (0..5_u8)
        .flat_map(|y| (0..4_u8).map(move |x| x + y))
        .collect::<Vec<_>>();
    g.write_all(&data).unwrap();
    ds.close().unwrap();
}
