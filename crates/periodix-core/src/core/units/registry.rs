use phf::{Map, phf_map};

// Internal base units: angstrom, eV, amu, ps, elementary charge, degree, count.

const AVOGADRO: f64 = 6.022_140_76e23;
const ELEMENTARY_CHARGE_C: f64 = 1.602_176_634e-19;
const JOULE_IN_EV: f64 = 1.0 / ELEMENTARY_CHARGE_C;
const GPA_PER_EV_ANGSTROM3: f64 = 160.217_663_4;

/// Size of one named unit expressed in internal base units.
pub static UNIT_FACTORS: Map<&'static str, f64> = phf_map! {
    // length
    "angstrom" => 1.0, "Angstrom" => 1.0, "A" => 1.0,
    "pm" => 1e-2,
    "nm" => 10.0,
    "um" => 1e4,
    "mm" => 1e7,
    "cm" => 1e8,
    "m" => 1e10,
    "bohr" => 0.529_177_210_903, "Bohr" => 0.529_177_210_903,

    // energy
    "eV" => 1.0,
    "meV" => 1e-3,
    "keV" => 1e3,
    "J" => JOULE_IN_EV,
    "kJ" => 1e3 * JOULE_IN_EV,
    "cal" => 4.184 * JOULE_IN_EV,
    "kcal" => 4184.0 * JOULE_IN_EV,
    "hartree" => 27.211_386_245_988, "Ha" => 27.211_386_245_988,
    "Ry" => 13.605_693_122_994, "rydberg" => 13.605_693_122_994,

    // mass
    "amu" => 1.0, "u" => 1.0, "Da" => 1.0,
    "g" => AVOGADRO,
    "kg" => 1e3 * AVOGADRO,

    // time
    "ps" => 1.0,
    "fs" => 1e-3,
    "ns" => 1e3,
    "s" => 1e12,

    // charge
    "e" => 1.0,
    "C" => 1.0 / ELEMENTARY_CHARGE_C,

    // pressure
    "GPa" => 1.0 / GPA_PER_EV_ANGSTROM3,
    "MPa" => 1e-3 / GPA_PER_EV_ANGSTROM3,
    "Pa" => 1e-9 / GPA_PER_EV_ANGSTROM3,
    "bar" => 1e-4 / GPA_PER_EV_ANGSTROM3,
    "atm" => 1.013_25e-4 / GPA_PER_EV_ANGSTROM3,

    // angle
    "degree" => 1.0, "deg" => 1.0,
    "radian" => 57.295_779_513_082_32, "rad" => 57.295_779_513_082_32,

    // amount
    "mol" => AVOGADRO,
};

pub fn factor(name: &str) -> Option<f64> {
    UNIT_FACTORS.get(name).copied()
}
