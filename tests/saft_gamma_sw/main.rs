use despasito::input::InputFile;
use despasito::thermo::ThermoOutput;
use serde_json::json;
use std::error::Error;

fn input(calculation: serde_json::Value) -> InputFile {
    let mut value = json!({
        "eos": "saft.gamma_sw",
        "beads": ["CH3", "CH2"],
        "nui": [[2, 0], [2, 1]],
        "beadparams": {
            "CH3": {"epsilon": 256.77, "sigma": 3.737e-10, "lambda": 1.4, "Sk": 0.667, "mass": 0.015035},
            "CH2": {"epsilon": 473.39, "sigma": 4.0e-10, "lambda": 1.3, "Sk": 0.333, "mass": 0.014027}
        }
    });
    value
        .as_object_mut()
        .unwrap()
        .extend(calculation.as_object().unwrap().clone());
    serde_json::from_value(value).unwrap()
}

#[test]
fn saturation_of_ethane() -> Result<(), Box<dyn Error>> {
    let input = input(json!({
        "calculation_type": "sat_props",
        "Tlist": [150.0, 170.0],
        "xilist": [1.0, 0.0]
    }));
    let ThermoOutput::Saturation(out) = input.run()? else {
        panic!("unexpected output")
    };
    for i in 0..2 {
        assert!(out.pressure[i] > 0.0);
        assert!(out.liquid_density[i] > out.vapor_density[i]);
    }
    assert!(out.pressure[0] < out.pressure[1]);
    Ok(())
}

#[test]
fn compressed_liquid_mixture() -> Result<(), Box<dyn Error>> {
    let input = input(json!({
        "calculation_type": "liquid_properties",
        "Tlist": 150.0,
        "Plist": [1e6, 5e6],
        "xilist": [[0.5, 0.5]]
    }));
    let ThermoOutput::Liquid(out) = input.run()? else {
        panic!("unexpected output")
    };
    assert_eq!(out.density.len(), 2);
    assert!(out.density[1] > out.density[0]);
    assert!(out.fugacity_coefficients.iter().flatten().all(|phi| *phi > 0.0));
    Ok(())
}
