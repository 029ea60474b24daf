use super::config::{ModelConfig, PositionUnit, SCALED_UNIT};
use crate::core::models::property::PropValue;
use crate::core::models::system::{System, SystemError};
use crate::core::units::{StandardUnits, UnitConverter, UnitError, get_value_in_units};
use crate::core::utils::geometry::is_close;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error(
        "Non-orthogonal boxes are not supported (alpha = {alpha}, beta = {beta}, gamma = {gamma})"
    )]
    NonOrthogonal { alpha: f64, beta: f64, gamma: f64 },

    #[error("Expected {expected} symbols, one per atom type, got {found}")]
    SymbolCount { expected: usize, found: usize },

    #[error("Unit conversion failed for '{key}': {source}")]
    Unit {
        key: String,
        #[source]
        source: UnitError,
    },

    #[error(transparent)]
    System(#[from] SystemError),
}

/// Lattice family of an orthogonal box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellFamily {
    Cubic,
    Tetragonal,
    Orthorhombic,
}

impl CellFamily {
    /// Classifies orthogonal edge lengths.
    ///
    /// All three lengths pairwise close gives [`CellFamily::Cubic`], `a` close
    /// to `b` gives [`CellFamily::Tetragonal`], anything else
    /// [`CellFamily::Orthorhombic`].
    pub fn classify(a: f64, b: f64, c: f64) -> Self {
        if is_close(a, b) && is_close(b, c) && is_close(a, c) {
            CellFamily::Cubic
        } else if is_close(a, b) {
            CellFamily::Tetragonal
        } else {
            CellFamily::Orthorhombic
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CellFamily::Cubic => "cubic",
            CellFamily::Tetragonal => "tetragonal",
            CellFamily::Orthorhombic => "orthorhombic",
        }
    }
}

impl fmt::Display for CellFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured crystallographic description of a system.
///
/// Serializes as `cell -> <family> -> {a, b?, c?, atom[]}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelDocument {
    pub cell: CellModel,
}

impl ModelDocument {
    pub fn family(&self) -> CellFamily {
        self.cell.family
    }

    pub fn atoms(&self) -> &[AtomEntry] {
        &self.cell.body.atom
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CellModel {
    pub family: CellFamily,
    pub body: FamilyBody,
}

impl Serialize for CellModel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.family.as_str(), &self.body)?;
        map.end()
    }
}

/// Edge lengths and atoms of one lattice family. Only the lengths the family
/// leaves free are present.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FamilyBody {
    pub a: Measured,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub b: Option<Measured>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub c: Option<Measured>,
    pub atom: Vec<AtomEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Measured {
    pub value: f64,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AtomEntry {
    pub constituent: Constituent,
    pub position: Position,
    #[serde(rename = "atom-property", skip_serializing_if = "Vec::is_empty")]
    pub atom_property: Vec<AtomPropertyEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Constituent {
    pub component: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Position {
    pub value: [f64; 3],
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AtomPropertyEntry {
    pub name: String,
    pub value: ExportValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

/// A per-atom property value as written to a model; vectors are flattened
/// into plain lists.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExportValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    List(Vec<f64>),
    Text(String),
}

impl From<PropValue> for ExportValue {
    fn from(value: PropValue) -> Self {
        match value {
            PropValue::Bool(v) => ExportValue::Bool(v),
            PropValue::Int(v) => ExportValue::Int(v),
            PropValue::Float(v) => ExportValue::Float(v),
            PropValue::Vector(v) => ExportValue::List(v.iter().copied().collect()),
            PropValue::Sequence(v) => ExportValue::List(v),
            PropValue::Text(v) => ExportValue::Text(v),
        }
    }
}

/// Builds the cell model of `system`.
///
/// # Arguments
///
/// * `system` - The system to describe. Its box must be orthogonal.
/// * `config` - Units, symbols and extra properties to export.
/// * `units` - The unit conversion service.
///
/// # Errors
///
/// Returns [`ModelError::SymbolCount`] if the symbol list does not hold one
/// entry per atom type (checked first), [`ModelError::NonOrthogonal`] for a
/// box with an angle other than 90°, and [`ModelError::Unit`] or
/// [`ModelError::System`] if a value cannot be read or converted. No partial
/// document is returned.
#[instrument(skip_all, name = "model_export")]
pub fn build_model(
    system: &System,
    config: &ModelConfig,
    units: &dyn UnitConverter,
) -> Result<ModelDocument, ModelError> {
    if let Some(symbols) = &config.symbols {
        if symbols.len() != system.natypes() {
            return Err(ModelError::SymbolCount {
                expected: system.natypes(),
                found: symbols.len(),
            });
        }
    }

    let cell = system.cell();
    let (alpha, beta, gamma) = (cell.alpha(), cell.beta(), cell.gamma());
    if [alpha, beta, gamma].iter().any(|&angle| angle != 90.0) {
        return Err(ModelError::NonOrthogonal { alpha, beta, gamma });
    }

    let length = |value: f64, name: &str| {
        units
            .get_in_units(value, &config.box_unit)
            .map_err(|source| ModelError::Unit {
                key: name.to_string(),
                source,
            })
    };
    let a = length(cell.a(), "a")?;
    let b = length(cell.b(), "b")?;
    let c = length(cell.c(), "c")?;

    let family = CellFamily::classify(a, b, c);
    let measured = |value: f64| Measured {
        value,
        unit: config.box_unit.clone(),
    };
    let (a, b, c) = match family {
        CellFamily::Cubic => (measured((a + b + c) / 3.0), None, None),
        CellFamily::Tetragonal => (measured((a + b) / 2.0), None, Some(measured(c))),
        CellFamily::Orthorhombic => (measured(a), Some(measured(b)), Some(measured(c))),
    };

    let atom = (0..system.natoms())
        .map(|index| atom_entry(system, config, units, index))
        .collect::<Result<Vec<_>, _>>()?;

    debug!(
        family = family.as_str(),
        natoms = atom.len(),
        "Cell model built."
    );
    Ok(ModelDocument {
        cell: CellModel {
            family,
            body: FamilyBody { a, b, c, atom },
        },
    })
}

fn atom_entry(
    system: &System,
    config: &ModelConfig,
    units: &dyn UnitConverter,
    index: usize,
) -> Result<AtomEntry, ModelError> {
    let atoms = system.atoms();
    let component = atoms.atype(index).map_err(SystemError::from)?;
    let symbol = config
        .symbols
        .as_ref()
        .and_then(|symbols| symbols.get(component as usize - 1).cloned());

    let absolute = atoms.position(index).map_err(SystemError::from)?;
    let position = match &config.position_unit {
        PositionUnit::Scaled => {
            let fractional = system.scale(&absolute);
            Position {
                value: [fractional.x, fractional.y, fractional.z],
                unit: SCALED_UNIT.to_string(),
            }
        }
        PositionUnit::Unit(unit) => {
            let mut value = [0.0; 3];
            for (out, x) in value.iter_mut().zip(absolute.iter()) {
                *out = units
                    .get_in_units(*x, unit)
                    .map_err(|source| ModelError::Unit {
                        key: "pos".to_string(),
                        source,
                    })?;
            }
            Position {
                value,
                unit: unit.clone(),
            }
        }
    };

    let atom_property = config
        .atom_properties
        .iter()
        .map(|spec| -> Result<AtomPropertyEntry, ModelError> {
            let value = system.atoms_prop(index, &spec.name, false)?;
            let value = match &spec.unit {
                Some(unit) => {
                    get_value_in_units(units, &value, unit).map_err(|source| ModelError::Unit {
                        key: spec.name.clone(),
                        source,
                    })?
                }
                None => value,
            };
            Ok(AtomPropertyEntry {
                name: spec.name.clone(),
                value: value.into(),
                unit: spec.unit.clone(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(AtomEntry {
        constituent: Constituent { component, symbol },
        position,
        atom_property,
    })
}

impl System {
    /// Builds the cell model of this system with the standard unit table.
    ///
    /// See [`build_model`].
    pub fn model(&self, config: &ModelConfig) -> Result<ModelDocument, ModelError> {
        build_model(self, config, &StandardUnits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atoms::Atoms;
    use crate::core::models::cell::{BoxParams, SimBox};
    use crate::workflows::config::ModelConfigBuilder;
    use nalgebra::Vector3;

    fn system_with_box(a: f64, b: f64, c: f64) -> System {
        let atoms = Atoms::from_parts(
            vec![1, 2],
            vec![Vector3::new(0.0, 0.0, 0.0), Vector3::new(0.5, 0.5, 0.5)],
        )
        .unwrap();
        System::from_scaled(atoms, SimBox::orthorhombic(a, b, c).unwrap(), [true; 3])
    }

    #[test]
    fn equal_lengths_classify_as_cubic() {
        let document = system_with_box(2.86, 2.86, 2.86)
            .model(&ModelConfig::default())
            .unwrap();
        assert_eq!(document.family(), CellFamily::Cubic);
        assert!((document.cell.body.a.value - 2.86).abs() < 1e-12);
        assert!(document.cell.body.b.is_none());
        assert!(document.cell.body.c.is_none());
    }

    #[test]
    fn equal_a_and_b_classify_as_tetragonal() {
        let document = system_with_box(3.0, 3.0, 4.5)
            .model(&ModelConfig::default())
            .unwrap();
        let body = &document.cell.body;
        assert_eq!(document.family(), CellFamily::Tetragonal);
        assert!((body.a.value - 3.0).abs() < 1e-12);
        assert!(body.b.is_none());
        assert!((body.c.as_ref().unwrap().value - 4.5).abs() < 1e-12);
    }

    #[test]
    fn distinct_lengths_classify_as_orthorhombic() {
        let document = system_with_box(3.0, 4.0, 5.0)
            .model(&ModelConfig::default())
            .unwrap();
        let body = &document.cell.body;
        assert_eq!(document.family(), CellFamily::Orthorhombic);
        assert_eq!(body.b.as_ref().map(|m| m.value), Some(4.0));
        assert_eq!(body.c.as_ref().map(|m| m.value), Some(5.0));
    }

    #[test]
    fn classification_requires_all_lengths_pairwise_close() {
        assert_eq!(CellFamily::classify(1.0, 1.0 + 1e-9, 1.0), CellFamily::Cubic);
        assert_eq!(CellFamily::classify(1.0, 1.0, 1.001), CellFamily::Tetragonal);
        assert_eq!(CellFamily::classify(1.0, 1.2, 1.0), CellFamily::Orthorhombic);
    }

    #[test]
    fn non_orthogonal_box_is_rejected() {
        let mut system = system_with_box(3.0, 3.0, 3.0);
        system
            .box_set(
                BoxParams::LengthsAngles {
                    a: 3.0,
                    b: 3.0,
                    c: 3.0,
                    alpha: 90.0,
                    beta: 90.0,
                    gamma: 120.0,
                    origin: None,
                },
                true,
            )
            .unwrap();

        let result = system.model(&ModelConfig::default());
        assert!(matches!(result, Err(ModelError::NonOrthogonal { gamma, .. }) if (gamma - 120.0).abs() < 1e-9));
    }

    #[test]
    fn slightly_tilted_box_is_not_orthogonal() {
        let mut system = system_with_box(3.0, 3.0, 3.0);
        system
            .box_set(
                BoxParams::Lammps {
                    lx: 3.0,
                    ly: 3.0,
                    lz: 3.0,
                    xy: 1e-6,
                    xz: 0.0,
                    yz: 0.0,
                    origin: None,
                },
                true,
            )
            .unwrap();
        assert!(system.cell().gamma() < 90.0);
        assert!(is_close(system.cell().gamma(), 90.0));

        let result = system.model(&ModelConfig::default());
        assert!(matches!(result, Err(ModelError::NonOrthogonal { alpha, beta, .. }) if alpha == 90.0 && beta == 90.0));
    }

    #[test]
    fn symbol_count_is_checked_before_geometry() {
        let mut system = system_with_box(3.0, 3.0, 3.0);
        system
            .box_set(
                BoxParams::LengthsAngles {
                    a: 3.0,
                    b: 3.0,
                    c: 3.0,
                    alpha: 70.0,
                    beta: 90.0,
                    gamma: 90.0,
                    origin: None,
                },
                false,
            )
            .unwrap();
        let config = ModelConfig::builder().symbols(["Fe"]).build().unwrap();

        assert_eq!(
            system.model(&config),
            Err(ModelError::SymbolCount {
                expected: 2,
                found: 1,
            })
        );
    }

    #[test]
    fn atoms_carry_symbols_and_scaled_positions() {
        let system = system_with_box(2.0, 2.0, 2.0);
        let config = ModelConfig::builder().symbols(["Fe", "Ni"]).build().unwrap();
        let document = system.model(&config).unwrap();

        let atoms = document.atoms();
        assert_eq!(atoms.len(), 2);
        assert_eq!(atoms[0].constituent.component, 1);
        assert_eq!(atoms[0].constituent.symbol.as_deref(), Some("Fe"));
        assert_eq!(atoms[1].constituent.component, 2);
        assert_eq!(atoms[1].constituent.symbol.as_deref(), Some("Ni"));
        assert_eq!(atoms[1].position.unit, "scaled");
        for x in atoms[1].position.value {
            assert!((x - 0.5).abs() < 1e-12);
        }
        assert!(atoms[0].atom_property.is_empty());
    }

    #[test]
    fn positions_and_box_can_use_physical_units() {
        let system = system_with_box(2.0, 2.0, 2.0);
        let config = ModelConfig::builder()
            .box_unit("nm")
            .position_unit(PositionUnit::Unit("nm".to_string()))
            .build()
            .unwrap();
        let document = system.model(&config).unwrap();

        assert_eq!(document.cell.body.a.unit, "nm");
        assert!((document.cell.body.a.value - 0.2).abs() < 1e-12);
        let position = &document.atoms()[1].position;
        assert_eq!(position.unit, "nm");
        for x in position.value {
            assert!((x - 0.1).abs() < 1e-12);
        }
    }

    #[test]
    fn extra_properties_follow_caller_order_and_units() {
        let mut system = system_with_box(2.0, 2.0, 2.0);
        system
            .set_atoms_prop(1, "charge", PropValue::Float(2.0), false)
            .unwrap();
        system
            .set_atoms_prop(1, "force", [1.0, 2.0, 3.0].into(), false)
            .unwrap();
        system
            .set_atoms_prop(0, "label", PropValue::from("corner"), false)
            .unwrap();

        let config = ModelConfigBuilder::new()
            .atom_property("force", Some("eV/nm"))
            .atom_property("label", None)
            .atom_property("charge", Some("e"))
            .build()
            .unwrap();
        let document = system.model(&config).unwrap();
        let properties = &document.atoms()[1].atom_property;

        let names: Vec<&str> = properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["force", "label", "charge"]);
        let ExportValue::List(force) = &properties[0].value else {
            panic!("force should export as a list, got {:?}", properties[0].value);
        };
        for (x, expected) in force.iter().zip([10.0, 20.0, 30.0]) {
            assert!((x - expected).abs() < 1e-9);
        }
        assert_eq!(properties[1].value, ExportValue::Text(String::new()));
        assert_eq!(properties[1].unit, None);
        assert_eq!(properties[2].value, ExportValue::Float(2.0));
        assert_eq!(
            document.atoms()[0].atom_property[1].value,
            ExportValue::Text("corner".to_string())
        );
    }

    #[test]
    fn converting_text_property_fails() {
        let mut system = system_with_box(2.0, 2.0, 2.0);
        system
            .set_atoms_prop(0, "label", PropValue::from("corner"), false)
            .unwrap();
        let config = ModelConfig::builder()
            .atom_property("label", Some("nm"))
            .build()
            .unwrap();
        assert!(matches!(
            system.model(&config),
            Err(ModelError::Unit { key, .. }) if key == "label"
        ));
    }

    #[test]
    fn missing_property_is_reported() {
        let system = system_with_box(2.0, 2.0, 2.0);
        let config = ModelConfig::builder()
            .atom_property("charge", None)
            .build()
            .unwrap();
        assert!(matches!(system.model(&config), Err(ModelError::System(_))));
    }

    #[test]
    fn toml_output_has_family_keyed_cell() {
        let system = system_with_box(2.0, 2.0, 3.0);
        let config = ModelConfig::builder().symbols(["Fe", "Ni"]).build().unwrap();
        let text = system.model(&config).unwrap().to_toml_string().unwrap();

        let table: toml::Table = toml::from_str(&text).unwrap();
        let family = &table["cell"]["tetragonal"];
        assert_eq!(family["a"]["unit"].as_str(), Some("angstrom"));
        assert_eq!(family["c"]["value"].as_float(), Some(3.0));
        assert!(family.get("b").is_none());
        let atoms = family["atom"].as_array().unwrap();
        assert_eq!(atoms.len(), 2);
        assert_eq!(atoms[1]["constituent"]["symbol"].as_str(), Some("Ni"));
        assert_eq!(atoms[1]["position"]["unit"].as_str(), Some("scaled"));
    }

    #[test]
    fn empty_system_exports_box_only() {
        let system = System::new(Atoms::default(), SimBox::cubic(4.0).unwrap(), [true; 3]);
        let config = ModelConfig::builder()
            .symbols(Vec::<String>::new())
            .build()
            .unwrap();
        let document = system.model(&config).unwrap();
        assert_eq!(document.family(), CellFamily::Cubic);
        assert!(document.atoms().is_empty());
    }
}
