use env_logger::Builder;
use log::LevelFilter;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::env;
use std::path::Path;

use stats_rbm::*;

fn load_params(file_name: Option<String>) -> RbmParams {
    match file_name {
        Some(file_name) => {
            let path = Path::new(&file_name);
            if !path.exists() {
                panic!("{} does not exist", file_name);
            }
            RbmParams::from_yaml(&path).unwrap()
        }
        None => RbmParams::random(10, 4, 0.5, &mut SmallRng::seed_from_u64(0)),
    }
}

fn main() {
    let mut builder = Builder::new();
    builder.filter_level(LevelFilter::Info).init();

    let mut args = env::args().skip(1);
    let params = load_params(args.next());
    let config = match args.next() {
        Some(file_name) => AnalysisConfig::from_yaml(&file_name).unwrap(),
        None => {
            let mut config = AnalysisConfig::new();
            config.set_rng_seed(0).set_eigenvectors(true);
            config
        }
    };

    let log_z = params.log_z(config.strategy()).unwrap();
    println!("log Z = {}", log_z);

    let spectrum = config.analyse(&params).unwrap();
    println!("trace = {}", spectrum.total());
    for (rank, value) in spectrum.eigenvalues.iter().enumerate().take(10) {
        println!("{:>3}: {:.6e}", rank + 1, value);
    }
    if let Some(blocks) = spectrum.eigenvectors {
        let top = blocks.interaction.index_axis(ndarray::Axis(2), 0);
        println!("top eigenvector, weight block:\n{:.3}", top);
    }
}
