use ncdataset::{error::Error, Dataset, Format, Mode, Options, ScalarKind, Values, UNLIMITED};

mod common;

#[test]
fn create_and_reopen() {
    let d = tempfile::tempdir().unwrap();
    let path = d.path().join("create_and_reopen.nc");
    {
        let mut ds = ncdataset::create(&path).unwrap();
        assert_eq!(ds.path(), path);
        assert_eq!(ds.mode(), Mode::ReadWrite);
        assert_eq!(ds.format().unwrap(), Format::Netcdf4);
        ds.add_dim("x", 3).unwrap();
        ds.close().unwrap();
    }

    let ds = ncdataset::open(&path).unwrap();
    assert_eq!(ds.mode(), Mode::ReadOnly);
    assert_eq!(ds.dim("x").unwrap().len().unwrap(), 3);
}

#[test]
fn formats() {
    let d = tempfile::tempdir().unwrap();
    let cases = [
        (Options::CLOBBER, Format::Classic),
        (Options::_64BIT_OFFSET, Format::Offset64),
        (Options::_64BIT_DATA, Format::Cdf5),
        (Options::NETCDF4, Format::Netcdf4),
        (Options::NETCDF4 | Options::CLASSIC, Format::Netcdf4Classic),
    ];
    for (i, (options, format)) in cases.into_iter().enumerate() {
        let path = d.path().join(format!("format{i}.nc"));
        let ds = Dataset::create(&path, options).unwrap();
        assert_eq!(ds.format().unwrap(), format);
    }
}

#[test]
fn cdf5_kinds() {
    let d = tempfile::tempdir().unwrap();
    let path = d.path().join("cdf5.nc");
    {
        let mut ds = Dataset::create(&path, Options::_64BIT_DATA).unwrap();
        let x = ds.add_dim("x", 2).unwrap();
        let mut v = ds.add_var("v", ScalarKind::U64, &[&x]).unwrap();
        v.write_all(&[1_u64 << 40, u64::MAX]).unwrap();
        let err = ds.add_var("s", ScalarKind::Str, &[&x]).unwrap_err();
        assert!(matches!(err, Error::UnsupportedType(_)), "{err}");
    }
    let ds = Dataset::open(&path, Mode::ReadOnly).unwrap();
    assert_eq!(ds.format().unwrap(), Format::Cdf5);
    assert_eq!(
        ds.var("v").unwrap().read_all::<u64>().unwrap(),
        [1 << 40, u64::MAX]
    );
}

#[test]
fn noclobber() {
    let d = tempfile::tempdir().unwrap();
    let path = d.path().join("noclobber.nc");
    Dataset::create(&path, Options::CLOBBER).unwrap();

    let err = Dataset::create(&path, Options::NOCLOBBER).unwrap_err();
    assert!(matches!(err, Error::AlreadyExists(_)), "{err}");

    // Overwriting is the default
    Dataset::create(&path, Options::CLOBBER).unwrap();
}

#[test]
fn create_in_missing_directory() {
    let d = tempfile::tempdir().unwrap();
    let path = d.path().join("does").join("not").join("exist.nc");
    let err = Dataset::create(path, Options::CLOBBER).unwrap_err();
    assert!(matches!(err, Error::Io(_)), "{err}");
}

#[test]
fn open_missing_file() {
    let d = tempfile::tempdir().unwrap();
    let err = ncdataset::open(d.path().join("blah_stuff.nc")).unwrap_err();
    assert!(matches!(err, Error::NotFound(_)), "{err}");
}

#[test]
fn open_foreign_file() {
    let d = tempfile::tempdir().unwrap();
    let path = d.path().join("plain.txt");
    std::fs::write(&path, "this is not a netCDF file, just some text\n".repeat(50)).unwrap();
    let err = ncdataset::open(&path).unwrap_err();
    assert!(matches!(err, Error::Format(_)), "{err}");
}

#[test]
fn dimensions() {
    let d = tempfile::tempdir().unwrap();
    let mut ds = ncdataset::create(d.path().join("dimensions.nc")).unwrap();

    let time = ds.add_unlimited_dim("time").unwrap();
    let lat = ds.add_dim("lat", 180).unwrap();
    let lon = ds.add_dim("lon", 360).unwrap();
    assert!(time.is_unlimited());
    assert_eq!(time.len().unwrap(), 0);
    assert!(!lat.is_unlimited());
    assert_eq!(lon.name().unwrap(), "lon");

    assert_eq!(ds.dim_names().unwrap(), ["time", "lat", "lon"]);
    let found = ds.dim("time").unwrap();
    assert!(found.is_unlimited());
    assert_eq!(found.identifier(), time.identifier());

    let err = ds.dim("depth").unwrap_err();
    assert!(matches!(err, Error::NotFound(_)), "{err}");
}

#[test]
fn duplicate_names_leave_no_trace() {
    let d = tempfile::tempdir().unwrap();
    let mut ds = ncdataset::create(d.path().join("duplicates.nc")).unwrap();
    let x = ds.add_dim("x", 4).unwrap();

    let err = ds.add_dim("x", 8).unwrap_err();
    assert!(matches!(err, Error::DuplicateName(_)), "{err}");
    assert_eq!(ds.dims().unwrap().len(), 1);
    assert_eq!(ds.dim("x").unwrap().len().unwrap(), 4);

    ds.add_var("v", ScalarKind::F32, &[&x]).unwrap();
    let err = ds.add_var("v", ScalarKind::I32, &[&x]).unwrap_err();
    assert!(matches!(err, Error::DuplicateName(_)), "{err}");
    assert_eq!(ds.var_names().unwrap(), ["v"]);
    assert_eq!(ds.var("v").unwrap().kind(), ScalarKind::F32);
}

#[test]
fn foreign_dimension() {
    let d = tempfile::tempdir().unwrap();
    let mut a = ncdataset::create(d.path().join("a.nc")).unwrap();
    let mut b = ncdataset::create(d.path().join("b.nc")).unwrap();

    let x = a.add_dim("x", 2).unwrap();
    b.add_dim("x", 2).unwrap();

    let err = b.add_var("v", ScalarKind::I32, &[&x]).unwrap_err();
    assert!(matches!(err, Error::ForeignDimension(_)), "{err}");
    assert!(b.vars().unwrap().is_empty());
}

#[test]
fn classic_model_rejects_extended_kinds() {
    let d = tempfile::tempdir().unwrap();
    let mut ds = Dataset::create(d.path().join("classic.nc"), Options::CLOBBER).unwrap();
    let x = ds.add_dim("x", 2).unwrap();

    for kind in [ScalarKind::U8, ScalarKind::U64, ScalarKind::Str] {
        let err = ds.add_var("v", kind, &[&x]).unwrap_err();
        assert!(matches!(err, Error::UnsupportedType(_)), "{err}");
    }
    assert!(ds.vars().unwrap().is_empty());
    ds.add_var("v", ScalarKind::I16, &[&x]).unwrap();
}

#[test]
fn classic_definitions_after_data() {
    let d = tempfile::tempdir().unwrap();
    let path = d.path().join("redef.nc");
    {
        let mut ds = Dataset::create(&path, Options::CLOBBER).unwrap();
        let x = ds.add_dim("x", 3).unwrap();
        let mut a = ds.add_var("a", ScalarKind::I32, &[&x]).unwrap();
        a.write_all(&[1, 2, 3]).unwrap();

        // Back into define mode, then out again
        let mut b = ds.add_var("b", ScalarKind::F64, &[&x]).unwrap();
        b.attr("units").write("m").unwrap();
        b.write_all(&[0.5, 1.5, 2.5]).unwrap();
        ds.attr("title").write("redefined").unwrap();
        assert_eq!(a.read_all::<i32>().unwrap(), [1, 2, 3]);
    }

    let ds = ncdataset::open(&path).unwrap();
    assert_eq!(ds.format().unwrap(), Format::Classic);
    assert_eq!(ds.var("a").unwrap().read_all::<i32>().unwrap(), [1, 2, 3]);
    let b = ds.var("b").unwrap();
    assert_eq!(b.read_all::<f64>().unwrap(), [0.5, 1.5, 2.5]);
    assert_eq!(b.attr("units").read().unwrap(), Values::Text("m".into()));
}

#[test]
fn enumerate_variables() {
    let d = tempfile::tempdir().unwrap();
    let path = d.path().join("gopher.nc");
    common::gopher(&path);

    let ds = Dataset::open(&path, Mode::ReadOnly).unwrap();
    let vars = ds.vars().unwrap();
    assert_eq!(vars.len(), 1);
    let g = &vars[0];
    assert_eq!(g.name().unwrap(), "g");
    assert_eq!(g.kind(), ScalarKind::U8);
    assert_eq!(g.rank(), 2);
    let dims = g
        .dims()
        .iter()
        .map(|d| d.name().unwrap())
        .collect::<Vec<_>>();
    assert_eq!(dims, ["height", "width"]);
}

#[test]
fn unlimited_marker() {
    let d = tempfile::tempdir().unwrap();
    let mut ds = ncdataset::create(d.path().join("unlimited.nc")).unwrap();
    let a = ds.add_dim("a", UNLIMITED).unwrap();
    assert!(a.is_unlimited());
    assert!(ds.dim("a").unwrap().is_unlimited());
}

#[test]
fn sync_keeps_the_dataset_open() {
    let d = tempfile::tempdir().unwrap();
    let mut ds = ncdataset::create(d.path().join("sync.nc")).unwrap();
    let x = ds.add_dim("x", 2).unwrap();
    let mut v = ds.add_var_of::<u16>("v", &[&x]).unwrap();
    v.write_all(&[7_u16, 8]).unwrap();
    ds.sync().unwrap();
    assert!(ds.is_open());
    assert_eq!(v.read_all::<u16>().unwrap(), [7, 8]);
}

#[test]
fn library_version() {
    assert!(!ncdataset::library_version().is_empty());
}
