use super::co2_h2o;
use approx::assert_relative_eq;
use despasito_core::density::{
    fugacity_coefficient_liquid, fugacity_coefficient_vapor, liquid_density,
};
use despasito_core::{
    bubble_pressure, dew_pressure, saturation_pressure, tp_flash, BubbleDewOptions, Components,
    Contributions, DensityScanOptions, EosError, PhaseFlag, SolverOptions, State,
};
use ndarray::arr1;
use std::error::Error;

#[test]
fn ideal_gas_limit() -> Result<(), Box<dyn Error>> {
    let eos = co2_h2o()?;
    assert_eq!(eos.components(), 2);
    let state = State::new_density(&eos, 323.2, 1e-6, &arr1(&[0.5, 0.5]))?;
    assert_relative_eq!(
        state.compressibility(Contributions::Total),
        1.0,
        epsilon = 1e-6
    );
    Ok(())
}

#[test]
fn vapor_pressure_co2() -> Result<(), Box<dyn Error>> {
    let eos = co2_h2o()?;
    let x = arr1(&[1.0, 0.0]);
    // saturation pressures of CO2 from the NIST webbook
    for (t, p) in [(220.0, 0.59913e6), (280.0, 4.1607e6), (300.0, 6.7131e6)] {
        let sat = saturation_pressure(
            &eos,
            t,
            &x,
            &DensityScanOptions::default(),
            SolverOptions::default(),
        )?;
        assert_relative_eq!(sat.pressure, p, max_relative = 1e-2);
        assert!(sat.vapor_density < sat.liquid_density);
    }
    Ok(())
}

#[test]
fn saturated_liquid_co2() -> Result<(), Box<dyn Error>> {
    let eos = co2_h2o()?;
    let x = arr1(&[1.0, 0.0]);
    let options = DensityScanOptions::default();
    let sat = saturation_pressure(&eos, 280.0, &x, &options, SolverOptions::default())?;
    // 883.58 kg/m³
    assert_relative_eq!(sat.liquid_density, 20077.0, max_relative = 5e-2);

    let (rho_l, flag) = liquid_density(&eos, sat.pressure, 280.0, &x, &options)?;
    assert_eq!(flag, PhaseFlag::Liquid);
    assert_relative_eq!(rho_l, sat.liquid_density, max_relative = 1e-3);
    Ok(())
}

#[test]
fn co2_is_supercritical_at_323_k() -> Result<(), Box<dyn Error>> {
    let eos = co2_h2o()?;
    let sat = saturation_pressure(
        &eos,
        323.2,
        &arr1(&[1.0, 0.0]),
        &DensityScanOptions::default(),
        SolverOptions::default(),
    );
    assert!(matches!(sat, Err(EosError::SuperCritical)));
    Ok(())
}

#[test]
fn normal_boiling_point_water() -> Result<(), Box<dyn Error>> {
    let eos = co2_h2o()?;
    let sat = saturation_pressure(
        &eos,
        373.15,
        &arr1(&[0.0, 1.0]),
        &DensityScanOptions::default(),
        SolverOptions::default(),
    )?;
    assert_relative_eq!(sat.pressure, 101325.0, max_relative = 1e-1);
    Ok(())
}

#[test]
fn liquid_fugacity_coefficients() -> Result<(), Box<dyn Error>> {
    let eos = co2_h2o()?;
    let x = arr1(&[0.015, 0.985]);
    let (phi, rho, flag) =
        fugacity_coefficient_liquid(&eos, 5e6, 323.2, &x, &DensityScanOptions::default())?;
    assert_eq!(flag, PhaseFlag::Liquid);
    // 988 kg/m³ of liquid water
    assert_relative_eq!(rho, 54850.0, max_relative = 5e-2);
    // CO2 is sparingly soluble, water is far below its vapor pressure
    assert!(phi[0] > 1.0);
    assert!(phi[1] < 0.01);
    Ok(())
}

#[test]
fn bubble_point_co2_h2o() -> Result<(), Box<dyn Error>> {
    let eos = co2_h2o()?;
    let t = 323.2;
    let x = arr1(&[0.01, 0.99]);
    let result = bubble_pressure(&eos, t, &x, &BubbleDewOptions::default())?;
    assert!(result.pressure > 1e6 && result.pressure < 2e7);
    assert_relative_eq!(result.molefracs.sum(), 1.0, epsilon = 1e-8);
    assert!(result.molefracs[0] > 0.95);

    let options = DensityScanOptions::default();
    let (phi_l, _, _) = fugacity_coefficient_liquid(&eos, result.pressure, t, &x, &options)?;
    let (phi_v, _, _) =
        fugacity_coefficient_vapor(&eos, result.pressure, t, &result.molefracs, &options)?;
    for i in 0..2 {
        assert_relative_eq!(
            x[i] * phi_l[i],
            result.molefracs[i] * phi_v[i],
            max_relative = 1e-3
        );
    }
    Ok(())
}

#[test]
fn dew_point_co2_h2o() -> Result<(), Box<dyn Error>> {
    let eos = co2_h2o()?;
    let t = 323.2;
    let y = arr1(&[0.995, 0.005]);
    let result = dew_pressure(&eos, t, &y, &BubbleDewOptions::default())?;
    assert!(result.pressure > 5e5 && result.pressure < 1e7);
    assert!(result.molefracs[1] > 0.9);

    let options = DensityScanOptions::default();
    let (phi_v, _, _) = fugacity_coefficient_vapor(&eos, result.pressure, t, &y, &options)?;
    let (phi_l, _, _) =
        fugacity_coefficient_liquid(&eos, result.pressure, t, &result.molefracs, &options)?;
    for i in 0..2 {
        assert_relative_eq!(
            y[i] * phi_v[i],
            result.molefracs[i] * phi_l[i],
            max_relative = 1e-3
        );
    }
    Ok(())
}

#[test]
fn flash_co2_h2o() -> Result<(), Box<dyn Error>> {
    let eos = co2_h2o()?;
    let flash = tp_flash(&eos, 323.2, 5e6, &BubbleDewOptions::default())?;
    assert!(flash.liquid_molefracs[1] > 0.9);
    assert!(flash.vapor_molefracs[0] > 0.95);
    assert_eq!(flash.flag_liquid, PhaseFlag::Liquid);
    Ok(())
}
