use super::property::PropValue;
use indexmap::IndexMap;
use nalgebra::Vector3;
use std::fmt;
use thiserror::Error;

/// Reserved key of the integer atom type column.
pub const ATYPE_KEY: &str = "atype";
/// Reserved key of the absolute position column.
pub const POS_KEY: &str = "pos";

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AtomsError {
    #[error("Atom index {index} is out of range for {natoms} atoms")]
    IndexOutOfRange { index: usize, natoms: usize },

    #[error("Unknown atom property '{0}'")]
    UnknownProperty(String),

    #[error("Atom property '{key}' expects a {expected} value, got {found}")]
    InvalidValue {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Atom type must be a positive integer, got {0}")]
    InvalidAtype(i64),

    #[error("Atom property '{key}' needs {expected} values, got {found}")]
    LengthMismatch {
        key: String,
        expected: usize,
        found: usize,
    },
}

/// A per-atom column beyond the reserved `atype` and `pos`.
#[derive(Debug, Clone, PartialEq)]
struct Column {
    /// Value given to atoms that were never explicitly assigned.
    fill: PropValue,
    values: Vec<PropValue>,
}

/// An ordered collection of atoms with keyed per-atom properties.
///
/// Every atom carries an integer type (`atype >= 1`) and an absolute position
/// (`pos`). Additional properties are stored as named columns, kept in the
/// order they were first written. Positions are read and replaced as whole
/// batches; no mutable view into the storage is handed out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Atoms {
    atypes: Vec<u32>,
    positions: Vec<Vector3<f64>>,
    columns: IndexMap<String, Column>,
}

impl Atoms {
    /// Creates `natoms` atoms of type 1 located at the coordinate origin.
    pub fn new(natoms: usize) -> Self {
        Self {
            atypes: vec![1; natoms],
            positions: vec![Vector3::zeros(); natoms],
            columns: IndexMap::new(),
        }
    }

    /// Creates atoms from matching type and position lists.
    ///
    /// # Arguments
    ///
    /// * `atypes` - The type of each atom; every entry must be at least 1.
    /// * `positions` - The absolute position of each atom.
    ///
    /// # Errors
    ///
    /// Returns [`AtomsError::LengthMismatch`] if the lists differ in length and
    /// [`AtomsError::InvalidAtype`] if a type is zero.
    pub fn from_parts(atypes: Vec<u32>, positions: Vec<Vector3<f64>>) -> Result<Self, AtomsError> {
        if atypes.len() != positions.len() {
            return Err(AtomsError::LengthMismatch {
                key: POS_KEY.to_string(),
                expected: atypes.len(),
                found: positions.len(),
            });
        }
        if atypes.contains(&0) {
            return Err(AtomsError::InvalidAtype(0));
        }
        Ok(Self {
            atypes,
            positions,
            columns: IndexMap::new(),
        })
    }

    /// Appends an atom and returns its index.
    ///
    /// Extra property columns receive their fill value for the new atom.
    pub fn push(&mut self, atype: u32, position: Vector3<f64>) -> Result<usize, AtomsError> {
        if atype == 0 {
            return Err(AtomsError::InvalidAtype(0));
        }
        self.atypes.push(atype);
        self.positions.push(position);
        for column in self.columns.values_mut() {
            column.values.push(column.fill.clone());
        }
        Ok(self.atypes.len() - 1)
    }

    pub fn natoms(&self) -> usize {
        self.atypes.len()
    }

    /// The largest atom type, or 0 for an empty store.
    pub fn natypes(&self) -> usize {
        self.atypes.iter().copied().max().unwrap_or(0) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.atypes.is_empty()
    }

    /// Lists the property keys in use: `atype`, `pos`, then extra columns in insertion order.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys = vec![ATYPE_KEY, POS_KEY];
        keys.extend(self.columns.keys().map(String::as_str));
        keys
    }

    pub fn contains_key(&self, key: &str) -> bool {
        key == ATYPE_KEY || key == POS_KEY || self.columns.contains_key(key)
    }

    pub fn atypes(&self) -> &[u32] {
        &self.atypes
    }

    pub fn atype(&self, index: usize) -> Result<u32, AtomsError> {
        self.check_index(index)?;
        Ok(self.atypes[index])
    }

    /// All absolute positions in atom-index order.
    pub fn positions(&self) -> &[Vector3<f64>] {
        &self.positions
    }

    pub fn position(&self, index: usize) -> Result<Vector3<f64>, AtomsError> {
        self.check_index(index)?;
        Ok(self.positions[index])
    }

    /// Replaces every position at once.
    ///
    /// # Errors
    ///
    /// Returns [`AtomsError::LengthMismatch`] if `positions` does not hold one
    /// entry per atom; the store is unchanged in that case.
    pub fn set_positions(&mut self, positions: Vec<Vector3<f64>>) -> Result<(), AtomsError> {
        if positions.len() != self.natoms() {
            return Err(AtomsError::LengthMismatch {
                key: POS_KEY.to_string(),
                expected: self.natoms(),
                found: positions.len(),
            });
        }
        self.positions = positions;
        Ok(())
    }

    /// Recomputes every position from its current value in one batch.
    pub fn map_positions<F>(&mut self, f: F)
    where
        F: FnMut(&Vector3<f64>) -> Vector3<f64>,
    {
        self.positions = self.positions.iter().map(f).collect();
    }

    /// Reads one property of one atom.
    pub fn get(&self, index: usize, key: &str) -> Result<PropValue, AtomsError> {
        self.check_index(index)?;
        match key {
            ATYPE_KEY => Ok(PropValue::Int(i64::from(self.atypes[index]))),
            POS_KEY => Ok(PropValue::Vector(self.positions[index])),
            _ => self
                .columns
                .get(key)
                .map(|column| column.values[index].clone())
                .ok_or_else(|| AtomsError::UnknownProperty(key.to_string())),
        }
    }

    /// Reads every property of one atom, in [`Atoms::keys`] order.
    pub fn atom(&self, index: usize) -> Result<Vec<(String, PropValue)>, AtomsError> {
        self.check_index(index)?;
        self.keys()
            .into_iter()
            .map(|key| Ok((key.to_string(), self.get(index, key)?)))
            .collect()
    }

    /// Reads one property of every atom.
    pub fn column(&self, key: &str) -> Result<Vec<PropValue>, AtomsError> {
        match key {
            ATYPE_KEY => Ok(self
                .atypes
                .iter()
                .map(|&atype| PropValue::Int(i64::from(atype)))
                .collect()),
            POS_KEY => Ok(self.positions.iter().copied().map(PropValue::Vector).collect()),
            _ => self
                .columns
                .get(key)
                .map(|column| column.values.clone())
                .ok_or_else(|| AtomsError::UnknownProperty(key.to_string())),
        }
    }

    /// Writes one property of one atom.
    ///
    /// Writing an unknown key creates a new column; the other atoms receive a
    /// zero value of the same kind and shape. Existing columns only accept
    /// values of the kind they were created with.
    pub fn set(&mut self, index: usize, key: &str, value: PropValue) -> Result<(), AtomsError> {
        self.check_index(index)?;
        match key {
            ATYPE_KEY => self.atypes[index] = to_atype(&value)?,
            POS_KEY => self.positions[index] = to_position(&value)?,
            _ => {
                let natoms = self.natoms();
                let column = self.columns.entry(key.to_string()).or_insert_with(|| Column {
                    fill: value.zeroed(),
                    values: vec![value.zeroed(); natoms],
                });
                check_kind(key, &column.fill, &value)?;
                column.values[index] = value;
            }
        }
        Ok(())
    }

    /// Writes one property of every atom.
    ///
    /// The whole column is validated before anything is stored. Setting an
    /// extra column on an empty store is a no-op since there is no value to
    /// infer its kind from.
    pub fn set_column(&mut self, key: &str, values: Vec<PropValue>) -> Result<(), AtomsError> {
        if values.len() != self.natoms() {
            return Err(AtomsError::LengthMismatch {
                key: key.to_string(),
                expected: self.natoms(),
                found: values.len(),
            });
        }
        match key {
            ATYPE_KEY => {
                self.atypes = values.iter().map(to_atype).collect::<Result<_, _>>()?;
            }
            POS_KEY => {
                self.positions = values.iter().map(to_position).collect::<Result<_, _>>()?;
            }
            _ => {
                let Some(first) = values.first() else {
                    return Ok(());
                };
                let fill = match self.columns.get(key) {
                    Some(column) => column.fill.clone(),
                    None => first.zeroed(),
                };
                for value in &values {
                    check_kind(key, &fill, value)?;
                }
                self.columns.insert(key.to_string(), Column { fill, values });
            }
        }
        Ok(())
    }

    fn check_index(&self, index: usize) -> Result<(), AtomsError> {
        if index < self.natoms() {
            Ok(())
        } else {
            Err(AtomsError::IndexOutOfRange {
                index,
                natoms: self.natoms(),
            })
        }
    }
}

impl fmt::Display for Atoms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "     id   atype  pos[0]  pos[1]  pos[2]")?;
        for (i, (atype, pos)) in self.atypes.iter().zip(&self.positions).enumerate() {
            write!(
                f,
                "\n{:7} {:7} {:7.3} {:7.3} {:7.3}",
                i, atype, pos.x, pos.y, pos.z
            )?;
        }
        Ok(())
    }
}

fn to_atype(value: &PropValue) -> Result<u32, AtomsError> {
    let atype = value.as_int().ok_or_else(|| AtomsError::InvalidValue {
        key: ATYPE_KEY.to_string(),
        expected: "int",
        found: value.kind(),
    })?;
    match u32::try_from(atype) {
        Ok(atype) if atype >= 1 => Ok(atype),
        _ => Err(AtomsError::InvalidAtype(atype)),
    }
}

fn to_position(value: &PropValue) -> Result<Vector3<f64>, AtomsError> {
    value.as_vector().ok_or_else(|| AtomsError::InvalidValue {
        key: POS_KEY.to_string(),
        expected: "vector",
        found: value.kind(),
    })
}

fn check_kind(key: &str, fill: &PropValue, value: &PropValue) -> Result<(), AtomsError> {
    if std::mem::discriminant(fill) == std::mem::discriminant(value) {
        Ok(())
    } else {
        Err(AtomsError::InvalidValue {
            key: key.to_string(),
            expected: fill.kind(),
            found: value.kind(),
        })
    }
}
