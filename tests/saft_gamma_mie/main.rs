use despasito::eos::{EosType, ResidualModel};
use despasito_core::EosResult;
use ndarray::arr2;
use serde_json::{json, Value};
use std::sync::Arc;

mod properties;
mod thermo;

pub fn bead_library() -> Value {
    json!({
        "CO2": {
            "epsilon": 207.89, "l_a": 5.055, "l_r": 26.408, "sigma": 3.05e-10,
            "Sk": 0.8468, "Vks": 2, "mass": 0.04401, "NkH": 1, "Nka1": 1
        },
        "H2O": {
            "epsilon": 266.68, "l_a": 6.0, "l_r": 17.02, "sigma": 3.0063e-10,
            "Sk": 1.0, "Vks": 1, "mass": 0.018015, "NkH": 2, "Nke1": 2,
            "epsilonHe1": 1985.4, "KHe1": 1.0169e-28
        }
    })
}

pub fn cross_library() -> Value {
    json!({"CO2": {"H2O": {"epsilon": 226.38, "epsilonHe1": 2200.0, "KHe1": 9.1419e-29}}})
}

pub fn sitenames() -> Vec<String> {
    ["H", "e1", "a1"].iter().map(|s| s.to_string()).collect()
}

pub fn co2_h2o() -> EosResult<Arc<ResidualModel>> {
    let beads = vec!["CO2".to_string(), "H2O".to_string()];
    Ok(Arc::new(ResidualModel::new(
        EosType::SaftGammaMie,
        &beads,
        &arr2(&[[1.0, 0.0], [0.0, 1.0]]),
        bead_library(),
        Some(cross_library()),
        &sitenames(),
    )?))
}
