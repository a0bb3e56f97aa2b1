use super::co2_h2o;
use approx::assert_relative_eq;
use despasito::thermo::{thermo, Calculation, CalculationOptions, ThermoOutput};
use serde_json::json;
use std::error::Error;

fn calculation(value: serde_json::Value) -> Calculation {
    serde_json::from_value(value).unwrap()
}

#[test]
fn phase_xi_t() -> Result<(), Box<dyn Error>> {
    let eos = co2_h2o()?;
    let calc = calculation(json!({
        "calculation_type": "phase_xiT",
        "Tlist": [323.2],
        "xilist": [[0.01, 0.99]]
    }));
    let ThermoOutput::PhaseEquilibrium(out) = thermo(&eos, &calc, &CalculationOptions::default())?
    else {
        panic!("unexpected output")
    };
    assert!(out.pressure[0] > 1e6 && out.pressure[0] < 2e7);
    assert!(out.liquid_molefracs.is_none());
    let yi = &out.vapor_molefracs.as_ref().unwrap()[0];
    assert_relative_eq!(yi[0] + yi[1], 1.0, epsilon = 1e-8);
    assert!(yi[0] > 0.95);
    Ok(())
}

#[test]
fn phase_yi_t() -> Result<(), Box<dyn Error>> {
    let eos = co2_h2o()?;
    let calc = calculation(json!({
        "calculation_type": "phase_yiT",
        "Tlist": [323.2],
        "yilist": [[0.995, 0.005]]
    }));
    let ThermoOutput::PhaseEquilibrium(out) = thermo(&eos, &calc, &CalculationOptions::default())?
    else {
        panic!("unexpected output")
    };
    assert!(out.pressure[0] > 5e5 && out.pressure[0] < 1e7);
    assert!(out.vapor_molefracs.is_none());
    let xi = &out.liquid_molefracs.as_ref().unwrap()[0];
    assert_relative_eq!(xi[0] + xi[1], 1.0, epsilon = 1e-8);
    assert!(xi[1] > 0.9);
    Ok(())
}

#[test]
fn flash() -> Result<(), Box<dyn Error>> {
    let eos = co2_h2o()?;
    let calc = calculation(json!({
        "calculation_type": "flash",
        "Tlist": 323.2,
        "Plist": 5e6
    }));
    let ThermoOutput::Flash(out) = thermo(&eos, &calc, &CalculationOptions::default())? else {
        panic!("unexpected output")
    };
    assert!(out.liquid_molefracs[0][1] > 0.9);
    assert!(out.vapor_molefracs[0][0] > 0.95);
    Ok(())
}

#[test]
fn broadcast_temperatures() -> Result<(), Box<dyn Error>> {
    let eos = co2_h2o()?;
    let calc = calculation(json!({
        "calculation_type": "sat_props",
        "Tlist": [280.0, 300.0],
        "xilist": [1.0, 0.0]
    }));
    let ThermoOutput::Saturation(out) = thermo(&eos, &calc, &CalculationOptions::default())?
    else {
        panic!("unexpected output")
    };
    assert_eq!(out.pressure.len(), 2);
    assert!(out.pressure[0] < out.pressure[1]);
    assert!(out.liquid_density[0] > out.liquid_density[1]);
    Ok(())
}

#[test]
fn missing_pressures() -> Result<(), Box<dyn Error>> {
    let eos = co2_h2o()?;
    let calc = calculation(json!({
        "calculation_type": "vapor_properties",
        "Tlist": 323.2,
        "yilist": [[0.9954, 0.0046]]
    }));
    assert!(thermo(&eos, &calc, &CalculationOptions::default()).is_err());
    Ok(())
}

#[test]
fn solubility_parameter_of_water() -> Result<(), Box<dyn Error>> {
    let eos = co2_h2o()?;
    let calc = calculation(json!({
        "calculation_type": "solubility_parameter",
        "Tlist": 298.15,
        "xilist": [[0.0, 1.0]]
    }));
    let ThermoOutput::Solubility(out) = thermo(&eos, &calc, &CalculationOptions::default())?
    else {
        panic!("unexpected output")
    };
    assert!(out.density[0] > 30000.0);
    // 47.8 MPa^1/2 for liquid water at room temperature
    assert_relative_eq!(out.solubility_parameter[0], 47.8e3, max_relative = 1e-1);
    Ok(())
}
