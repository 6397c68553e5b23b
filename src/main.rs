use anyhow::{bail, Context, Result};
use env_logger::{Builder, Env};
use gprn::data::Data;
use gprn::inference::{GprnConfig, GprnModel, SamplerModel};
use gprn::GPRN_LOG;
use log::info;
use ndarray::Array2;
use ndarray_npy::write_npy;
use ndarray_rand::rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;
use rayon::prelude::*;
use std::env;

const DEFAULT_DRAWS: usize = 100;

fn main() -> Result<()> {
    let env = Env::new().filter_or(GPRN_LOG, "info");
    let mut builder = Builder::from_env(env);
    let builder = builder.target(env_logger::Target::Stdout);
    builder.try_init().ok();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args.len() > 4 {
        bail!("usage: {} <config.json> [n_draws] [out.npy]", args[0]);
    }
    let config = GprnConfig::from_json_file(&args[1])
        .with_context(|| format!("cannot read configuration {}", args[1]))?;
    let n_draws = match args.get(2) {
        Some(n) => n.parse::<usize>().context("n_draws should be a positive integer")?,
        None => DEFAULT_DRAWS,
    };

    let data = Data::load_instance(&config.data.path, config.data.units, config.data.skip)?;
    info!(
        "{} observations over {:.1} days, rv std = {:.3} m/s",
        data.n(),
        data.get_timespan(),
        data.get_rv_std()
    );

    let mut model = GprnModel::from_instance(&config)?;
    info!("{} parameters: {}", model.dimension(), model.description());

    let mut rng = match config.seed {
        Some(seed) => Xoshiro256Plus::seed_from_u64(seed),
        None => Xoshiro256Plus::from_entropy(),
    };
    let draws: Vec<Vec<f64>> = (0..n_draws)
        .map(|_| {
            model.draw_from_prior(&mut rng);
            model.parameters()
        })
        .collect();
    let loglikes: Vec<f64> = draws
        .par_iter()
        .map(|values| model.log_likelihood_of(values))
        .collect();

    let n_valid = loglikes.iter().filter(|l| l.is_finite()).count();
    info!("{n_valid}/{n_draws} draws with a finite likelihood");
    if let Some((best, loglike)) = loglikes
        .iter()
        .enumerate()
        .filter(|(_, l)| l.is_finite())
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
    {
        info!("Best log-likelihood {loglike:.3} at {:?}", draws[best]);
    }

    if let Some(out) = args.get(3) {
        let dim = model.dimension();
        let table = Array2::from_shape_fn((n_draws, dim + 1), |(i, j)| {
            if j < dim {
                draws[i][j]
            } else {
                loglikes[i]
            }
        });
        write_npy(out, &table).with_context(|| format!("cannot write {out}"))?;
        info!("Draws saved in {out}");
    }
    Ok(())
}
