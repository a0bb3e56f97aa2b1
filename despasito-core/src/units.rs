//! Physical constants and conversions between SI and reduced units.
//!
//! Reduced units use Å for lengths, K for energies (ε/k_B) and
//! molecules per Å³ for densities.

/// Boltzmann constant in J/K
pub const KB: f64 = 1.380649e-23;
/// Avogadro constant in 1/mol
pub const NAV: f64 = 6.02214076e23;
/// Planck constant in J s
pub const PLANCK: f64 = 6.62607015e-34;
/// Ideal gas constant in J/(mol K)
pub const RGAS: f64 = KB * NAV;

/// Å³ per m³
pub const ANGSTROM3: f64 = 1e30;

/// Convert a molar density in mol/m³ into molecules per Å³.
pub fn density_to_reduced(density: f64) -> f64 {
    density * NAV / ANGSTROM3
}

/// Convert a number density in molecules per Å³ into mol/m³.
pub fn density_from_reduced(density: f64) -> f64 {
    density * ANGSTROM3 / NAV
}

/// Convert a pressure in Pa into K/Å³.
pub fn pressure_to_reduced(pressure: f64) -> f64 {
    pressure / (KB * ANGSTROM3)
}

/// Convert a pressure in K/Å³ into Pa.
pub fn pressure_from_reduced(pressure: f64) -> f64 {
    pressure * KB * ANGSTROM3
}

/// Convert an amount of substance in mol into a number of molecules.
pub fn moles_to_reduced(moles: f64) -> f64 {
    moles * NAV
}

/// Convert a volume in m³ into Å³.
pub fn volume_to_reduced(volume: f64) -> f64 {
    volume * ANGSTROM3
}
