//! Writes a small image of a gopher-shaped gradient and reads it back
use clap::Parser;
use ncdataset::{Dataset, Mode, Options, ScalarKind};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
struct Opt {
    /// Where to write the dataset
    #[arg(default_value = "gopher.nc")]
    path: std::path::PathBuf,
    #[arg(long, default_value_t = 5)]
    height: usize,
    #[arg(long, default_value_t = 4)]
    width: usize,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let opt = Opt::parse();

    {
        let mut ds = Dataset::create(&opt.path, Options::CLOBBER | Options::NETCDF4)?;
        let height = ds.add_dim("height", opt.height)?;
        let width = ds.add_dim("width", opt.width)?;

        let mut g = ds.add_var("g", ScalarKind::U8, &[&height, &width])?;
        g.attr("_FillValue").write(255_u8)?;
        g.attr("year").write(2012_i32)?;

        let data = (0..opt.height)
            .flat_map(|y| (0..opt.width).map(move |x| u8::try_from(x + y).unwrap_or(u8::MAX)))
            .collect::<Vec<_>>();
        g.write_all(&data)?;
        ds.close()?;
    }

    let ds = Dataset::open(&opt.path, Mode::ReadOnly)?;
    let g = ds.var("g")?;
    println!("year = {}", g.attr("year").read()?);
    let width = g.shape()?[1];
    for row in g.read_all::<u8>()?.chunks(width.max(1)) {
        println!("{row:?}");
    }
    Ok(())
}
