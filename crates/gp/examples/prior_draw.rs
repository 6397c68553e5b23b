use gprn_gp::correlation_models::CorrelationKind;
use gprn_gp::{sample_prior, Gprn, NodeFunction, WeightFunction};
use linfa::ParamGuard;
use ndarray::{array, Array1};

fn main() {
    let node = NodeFunction::new(CorrelationKind::QuasiPeriodic, &[20., 7., 0.8])
        .expect("valid node");
    let weight = WeightFunction::new(1., CorrelationKind::SquaredExponential, &[50.])
        .expect("valid weight");
    let params = Gprn::params(vec![node], weight, array![[2.], [1.], [-0.5]])
        .check()
        .expect("valid parameters");

    let times = Array1::linspace(0., 100., 200);
    let sample = sample_prior(&params, &times).expect("prior draw");
    println!("{}", sample.outputs);
}
