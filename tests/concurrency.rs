use std::sync::Arc;

mod common;
use common::{gopher, GOPHER_ROWS};

#[test]
fn shared_dataset_across_threads() {
    let d = tempfile::tempdir().unwrap();
    let path = d.path().join("shared.nc");
    gopher(&path);
    let ds = Arc::new(ncdataset::open(&path).unwrap());

    std::thread::scope(|s| {
        for row in 0..5 {
            let ds = Arc::clone(&ds);
            s.spawn(move || {
                let g = ds.var("g").unwrap();
                for _ in 0..50 {
                    let values = g.read_slab_vec::<u8>(&[row, 0], &[1, 4]).unwrap();
                    assert_eq!(values, GOPHER_ROWS[row]);
                }
            });
        }
    });
}

#[test]
fn separate_datasets_per_thread() {
    let d = tempfile::tempdir().unwrap();
    let dir = d.path();

    std::thread::scope(|s| {
        for i in 0..4_i32 {
            s.spawn(move || {
                let path = dir.join(format!("thread{i}.nc"));
                let mut ds = ncdataset::create(&path).unwrap();
                let n = ds.add_dim("n", 100).unwrap();
                let mut v = ds.add_var_of::<i32>("v", &[&n]).unwrap();
                let data = (0..100).map(|x| x * i).collect::<Vec<_>>();
                v.write_all(&data).unwrap();
                ds.close().unwrap();

                let ds = ncdataset::open(&path).unwrap();
                assert_eq!(ds.var("v").unwrap().read_all::<i32>().unwrap(), data);
            });
        }
    });
}
