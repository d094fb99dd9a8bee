use clap::Parser;
use std::fs::File;
use std::path::PathBuf;
use tg_nav::{RcLoader, RouteTable, Session, Site};

#[derive(Parser, Debug)]
#[command(name = "tg-nav")]
#[command(author, version, about = "Browse a static site of .page files from the keyboard", long_about = None)]
struct Args {
    /// Site directory holding index.page
    #[arg(default_value = ".")]
    site_dir: PathBuf,

    /// Page to open first
    #[arg(long, default_value = "/")]
    path: String,

    /// Milliseconds the loading indicator shows before navigating
    #[arg(long, value_name = "MS")]
    delay: Option<u64>,

    /// Always scroll instantly
    #[arg(long)]
    reduced_motion: bool,

    /// Hide the : / enter / j / k button bar
    #[arg(long)]
    no_key_bar: bool,

    /// Write logs here; the terminal is taken over by the UI
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Print the start page's command routes as JSON and exit
    #[arg(long)]
    dump_routes: bool,

    /// Print a sample .tgnavrc and exit
    #[arg(long)]
    print_rc: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if args.print_rc {
        print!("{}", RcLoader::generate_sample_rc());
        return Ok(());
    }

    if let Some(log_file) = &args.log_file {
        let target = Box::new(File::create(log_file)?);
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .target(env_logger::Target::Pipe(target))
            .init();
    }

    // Load RC configuration, then let flags override it
    let mut config = RcLoader::load_config();
    if let Some(delay) = args.delay {
        config.navigation_delay_ms = delay;
    }
    if args.reduced_motion {
        config.reduced_motion = true;
    }
    if args.no_key_bar {
        config.show_key_bar = false;
    }
    log::info!("starting in {} at {}", args.site_dir.display(), args.path);

    let site = Site::new(args.site_dir)?;
    let session = Session::new(site, config, &args.path)?;

    if args.dump_routes {
        let routes: &RouteTable = session.routes();
        println!("{}", routes.to_json()?);
        return Ok(());
    }

    session.run()
}
