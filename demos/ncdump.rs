use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Print the header of a netCDF file
#[derive(Debug, Parser)]
#[command(version)]
struct Opt {
    path: std::path::PathBuf,
    /// Also print the values of every variable
    #[arg(short, long)]
    values: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    let opt = Opt::parse();

    match run(&opt) {
        Err(e) => {
            println!("{e}");
            std::process::exit(1);
        }
        Ok(()) => {
            std::process::exit(0);
        }
    }
}

fn run(opt: &Opt) -> Result<(), Box<dyn std::error::Error>> {
    let file = ncdataset::open(&opt.path)?;

    println!("{} ({:?})", opt.path.display(), file.format()?);
    println!("Dimensions:");
    for d in file.dims()? {
        if d.is_unlimited() {
            println!("\t{} : Unlimited ({})", d.name()?, d.len()?);
        } else {
            println!("\t{} : ({})", d.name()?, d.len()?);
        }
    }
    println!("Variables:");
    for v in file.vars()? {
        print!("\t{} {}", v.kind(), v.name()?);
        print!("(");
        for d in v.dims() {
            print!(" {} ", d.name()?);
        }
        println!(")");
        for a in v.attrs()? {
            println!("\t\t{} = {}", a.name(), a.read()?);
        }
        if opt.values {
            println!("\t\tdata = {}", v.read_values()?);
        }
    }
    println!("Attributes:");
    for a in file.attrs()? {
        println!("\t\t{} = {}", a.name(), a.read()?);
    }

    Ok(())
}
