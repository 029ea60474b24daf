use crate::core::pbc::neighbors::NeighborList;
use nalgebra::Vector3;
use std::fmt;

/// A tagged value stored per atom or as a free-form system property.
#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    /// A 3-vector, such as a position, velocity or force.
    Vector(Vector3<f64>),
    /// An arbitrary-length sequence of numbers.
    Sequence(Vec<f64>),
    Text(String),
}

impl PropValue {
    /// A short name for the kind of value, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            PropValue::Bool(_) => "bool",
            PropValue::Int(_) => "int",
            PropValue::Float(_) => "float",
            PropValue::Vector(_) => "vector",
            PropValue::Sequence(_) => "sequence",
            PropValue::Text(_) => "text",
        }
    }

    /// Returns the value as a 3-vector.
    ///
    /// Three-element sequences are accepted as vectors.
    pub fn as_vector(&self) -> Option<Vector3<f64>> {
        match self {
            PropValue::Vector(v) => Some(*v),
            PropValue::Sequence(values) if values.len() == 3 => {
                Some(Vector3::new(values[0], values[1], values[2]))
            }
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            PropValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            PropValue::Float(value) => Some(*value),
            PropValue::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    /// A value of the same kind and shape with every number set to zero.
    ///
    /// Used to fill a newly created per-atom column for atoms that were not
    /// explicitly assigned.
    pub fn zeroed(&self) -> PropValue {
        match self {
            PropValue::Bool(_) => PropValue::Bool(false),
            PropValue::Int(_) => PropValue::Int(0),
            PropValue::Float(_) => PropValue::Float(0.0),
            PropValue::Vector(_) => PropValue::Vector(Vector3::zeros()),
            PropValue::Sequence(values) => PropValue::Sequence(vec![0.0; values.len()]),
            PropValue::Text(_) => PropValue::Text(String::new()),
        }
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Bool(value)
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        PropValue::Int(value)
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        PropValue::Float(value)
    }
}

impl From<Vector3<f64>> for PropValue {
    fn from(value: Vector3<f64>) -> Self {
        PropValue::Vector(value)
    }
}

impl From<[f64; 3]> for PropValue {
    fn from(value: [f64; 3]) -> Self {
        PropValue::Vector(Vector3::from(value))
    }
}

impl From<Vec<f64>> for PropValue {
    fn from(value: Vec<f64>) -> Self {
        PropValue::Sequence(value)
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::Text(value.to_string())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::Text(value)
    }
}

impl fmt::Display for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Bool(value) => write!(f, "{}", value),
            PropValue::Int(value) => write!(f, "{}", value),
            PropValue::Float(value) => write!(f, "{:.6}", value),
            PropValue::Vector(v) => write!(f, "[{:.6}, {:.6}, {:.6}]", v.x, v.y, v.z),
            PropValue::Sequence(values) => {
                write!(f, "[")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{:.6}", value)?;
                }
                write!(f, "]")
            }
            PropValue::Text(value) => write!(f, "{}", value),
        }
    }
}

/// An entry in a system's free-form property map.
#[derive(Debug, Clone, PartialEq)]
pub enum SystemValue {
    Value(PropValue),
    /// A neighbor list cached by [`System::nlist`](crate::System::nlist).
    NeighborList(NeighborList),
}

impl SystemValue {
    pub fn as_value(&self) -> Option<&PropValue> {
        match self {
            SystemValue::Value(value) => Some(value),
            SystemValue::NeighborList(_) => None,
        }
    }

    pub fn as_neighbor_list(&self) -> Option<&NeighborList> {
        match self {
            SystemValue::NeighborList(list) => Some(list),
            SystemValue::Value(_) => None,
        }
    }
}

impl From<PropValue> for SystemValue {
    fn from(value: PropValue) -> Self {
        SystemValue::Value(value)
    }
}

impl From<NeighborList> for SystemValue {
    fn from(list: NeighborList) -> Self {
        SystemValue::NeighborList(list)
    }
}
