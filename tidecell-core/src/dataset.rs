//! Labeled in-memory datasets
//!
//! Two shapes of data move through the pipeline:
//!
//! - [`ForcingDataset`]: a time axis, a grid cell axis and a set of `(time, gridcell)`
//!   variables. This is what the assembler, resampler and year substitution work on.
//! - [`Dataset`]: a generic mirror of a NetCDF file (named dimensions, typed n-d
//!   variables and attributes), used for the domain and surface data templates and as
//!   the common form handed to the writer.
//!
//! Both are plain owned values. Cloning one is a deep copy.

use crate::errors::{TideCellError, TideCellResult};
use crate::standard_variables;
use crate::timeseries::{FloatValue, TimeAxis};
use indexmap::IndexMap;
use ndarray::{concatenate, Array1, Array2, ArrayD, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

/// Dimension name of the forcing time axis
pub const TIME_DIM: &str = "time";
/// Dimension name of the forcing grid cell axis
pub const GRIDCELL_DIM: &str = "gridcell";

/// Attribute value attached to a dataset or a variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    Str(String),
    Int(i64),
    Ints(Vec<i64>),
    Double(f64),
    Doubles(Vec<f64>),
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Str(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Str(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Double(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Int(value)
    }
}

/// Typed storage of a variable
///
/// One variant per NetCDF storage type, so variables the pipeline never edits are
/// written back exactly as they were read. `Char` holds the raw bytes of a `NC_CHAR`
/// variable, one per element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VariableData {
    F32(ArrayD<f32>),
    F64(ArrayD<f64>),
    I8(ArrayD<i8>),
    I16(ArrayD<i16>),
    I32(ArrayD<i32>),
    I64(ArrayD<i64>),
    U8(ArrayD<u8>),
    U16(ArrayD<u16>),
    U32(ArrayD<u32>),
    U64(ArrayD<u64>),
    Char(ArrayD<u8>),
    Str(ArrayD<String>),
}

/// Apply `$body` to the array of any variant, rewrapping the result in the same variant
macro_rules! map_variant {
    ($data:expr, $array:ident => $body:expr) => {
        match $data {
            VariableData::F32($array) => VariableData::F32($body),
            VariableData::F64($array) => VariableData::F64($body),
            VariableData::I8($array) => VariableData::I8($body),
            VariableData::I16($array) => VariableData::I16($body),
            VariableData::I32($array) => VariableData::I32($body),
            VariableData::I64($array) => VariableData::I64($body),
            VariableData::U8($array) => VariableData::U8($body),
            VariableData::U16($array) => VariableData::U16($body),
            VariableData::U32($array) => VariableData::U32($body),
            VariableData::U64($array) => VariableData::U64($body),
            VariableData::Char($array) => VariableData::Char($body),
            VariableData::Str($array) => VariableData::Str($body),
        }
    };
}

impl VariableData {
    pub fn shape(&self) -> &[usize] {
        match self {
            VariableData::F32(a) => a.shape(),
            VariableData::F64(a) => a.shape(),
            VariableData::I8(a) => a.shape(),
            VariableData::I16(a) => a.shape(),
            VariableData::I32(a) => a.shape(),
            VariableData::I64(a) => a.shape(),
            VariableData::U8(a) | VariableData::Char(a) => a.shape(),
            VariableData::U16(a) => a.shape(),
            VariableData::U32(a) => a.shape(),
            VariableData::U64(a) => a.shape(),
            VariableData::Str(a) => a.shape(),
        }
    }

    /// NetCDF name of the storage type
    pub fn type_name(&self) -> &'static str {
        match self {
            VariableData::F32(_) => "float",
            VariableData::F64(_) => "double",
            VariableData::I8(_) => "byte",
            VariableData::I16(_) => "short",
            VariableData::I32(_) => "int",
            VariableData::I64(_) => "int64",
            VariableData::U8(_) => "ubyte",
            VariableData::U16(_) => "ushort",
            VariableData::U32(_) => "uint",
            VariableData::U64(_) => "uint64",
            VariableData::Char(_) => "char",
            VariableData::Str(_) => "string",
        }
    }

    pub fn as_f64(&self) -> Option<&ArrayD<f64>> {
        match self {
            VariableData::F64(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_f64_mut(&mut self) -> Option<&mut ArrayD<f64>> {
        match self {
            VariableData::F64(a) => Some(a),
            _ => None,
        }
    }

    /// Repeat the data `n` times along `axis`
    fn tiled(&self, axis: usize, n: usize) -> TideCellResult<Self> {
        Ok(map_variant!(self, a => tile(a, axis, n)?))
    }
}

fn not_double(name: &str, data: &VariableData) -> TideCellError {
    TideCellError::schema(format!(
        "variable `{name}` is {}, expected double",
        data.type_name()
    ))
}

fn tile<T: Clone>(array: &ArrayD<T>, axis: usize, n: usize) -> TideCellResult<ArrayD<T>> {
    let views = vec![array.view(); n];
    concatenate(Axis(axis), &views).map_err(|e| TideCellError::schema(e.to_string()))
}

/// A named n-d variable of a [`Dataset`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub dims: Vec<String>,
    pub data: VariableData,
    pub attrs: IndexMap<String, AttributeValue>,
}

impl Variable {
    pub fn new(dims: &[&str], data: VariableData) -> Self {
        Self {
            dims: dims.iter().map(|d| d.to_string()).collect(),
            data,
            attrs: IndexMap::new(),
        }
    }

    pub fn from_f64(dims: &[&str], data: ArrayD<f64>) -> Self {
        Self::new(dims, VariableData::F64(data))
    }

    pub fn with_attrs(mut self, attrs: IndexMap<String, AttributeValue>) -> Self {
        self.attrs.extend(attrs);
        self
    }

    /// Position of `dim` in this variable's dimensions
    pub fn axis_of(&self, dim: &str) -> Option<usize> {
        self.dims.iter().position(|d| d == dim)
    }
}

/// Self-describing labeled dataset, one-to-one with a NetCDF file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub dims: IndexMap<String, usize>,
    pub variables: IndexMap<String, Variable>,
    pub attrs: IndexMap<String, AttributeValue>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a dimension, or check an existing one has the same length
    pub fn add_dimension(&mut self, name: &str, len: usize) -> TideCellResult<()> {
        match self.dims.get(name) {
            Some(&existing) if existing != len => Err(TideCellError::schema(format!(
                "dimension `{name}` already has length {existing}, cannot redefine as {len}"
            ))),
            Some(_) => Ok(()),
            None => {
                self.dims.insert(name.to_string(), len);
                Ok(())
            }
        }
    }

    pub fn dimension_len(&self, name: &str) -> TideCellResult<usize> {
        self.dims
            .get(name)
            .copied()
            .ok_or_else(|| TideCellError::schema(format!("missing dimension `{name}`")))
    }

    /// Add or replace a variable
    ///
    /// The variable's shape must agree with the dataset's dimensions.
    pub fn insert_variable(&mut self, name: &str, variable: Variable) -> TideCellResult<()> {
        let shape = variable.data.shape();
        if shape.len() != variable.dims.len() {
            return Err(TideCellError::schema(format!(
                "variable `{name}` has {} dimension names but {} axes",
                variable.dims.len(),
                shape.len()
            )));
        }
        for (dim, &len) in variable.dims.iter().zip(shape) {
            let expected = self.dimension_len(dim)?;
            if expected != len {
                return Err(TideCellError::schema(format!(
                    "variable `{name}` has length {len} along `{dim}`, dataset has {expected}"
                )));
            }
        }
        self.variables.insert(name.to_string(), variable);
        Ok(())
    }

    pub fn variable(&self, name: &str) -> TideCellResult<&Variable> {
        self.variables
            .get(name)
            .ok_or_else(|| TideCellError::schema(format!("missing variable `{name}`")))
    }

    pub fn variable_mut(&mut self, name: &str) -> TideCellResult<&mut Variable> {
        self.variables
            .get_mut(name)
            .ok_or_else(|| TideCellError::schema(format!("missing variable `{name}`")))
    }

    /// Double precision data of a variable
    pub fn f64_array(&self, name: &str) -> TideCellResult<&ArrayD<f64>> {
        let data = &self.variable(name)?.data;
        data.as_f64().ok_or_else(|| not_double(name, data))
    }

    pub fn f64_array_mut(&mut self, name: &str) -> TideCellResult<&mut ArrayD<f64>> {
        let data = &mut self.variable_mut(name)?.data;
        let type_name = data.type_name();
        data.as_f64_mut().ok_or_else(|| {
            TideCellError::schema(format!("variable `{name}` is {type_name}, expected double"))
        })
    }

    /// Stack `n` copies of the dataset along an existing dimension
    ///
    /// Only variables that depend on `dim` are repeated; everything else is kept once.
    pub fn repeat_along(&self, dim: &str, n: usize) -> TideCellResult<Dataset> {
        if n == 0 {
            return Err(TideCellError::schema("cannot repeat a dataset zero times"));
        }
        let len = self.dimension_len(dim)?;

        let mut out = self.clone();
        out.dims.insert(dim.to_string(), len * n);
        for variable in out.variables.values_mut() {
            if let Some(axis) = variable.axis_of(dim) {
                variable.data = variable.data.tiled(axis, n)?;
            }
        }
        Ok(out)
    }
}

/// A `(time, gridcell)` variable of a [`ForcingDataset`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridVariable {
    pub unit: String,
    pub values: Array2<FloatValue>,
}

impl GridVariable {
    pub fn new(unit: impl Into<String>, values: Array2<FloatValue>) -> Self {
        Self {
            unit: unit.into(),
            values,
        }
    }

    /// Variable of the given shape holding a single value everywhere
    pub fn filled(unit: impl Into<String>, shape: (usize, usize), value: FloatValue) -> Self {
        Self::new(unit, Array2::from_elem(shape, value))
    }
}

/// Multi-cell, time-indexed forcing data
///
/// Every variable has shape `(time.len(), gridcells.len())`. Variables are kept in
/// insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForcingDataset {
    time: TimeAxis,
    gridcells: Vec<i32>,
    variables: IndexMap<String, GridVariable>,
    pub attrs: IndexMap<String, AttributeValue>,
}

impl ForcingDataset {
    pub fn new(time: TimeAxis, gridcells: Vec<i32>) -> Self {
        Self {
            time,
            gridcells,
            variables: IndexMap::new(),
            attrs: IndexMap::new(),
        }
    }

    pub fn time(&self) -> &TimeAxis {
        &self.time
    }

    pub fn gridcells(&self) -> &[i32] {
        &self.gridcells
    }

    pub fn n_times(&self) -> usize {
        self.time.len()
    }

    pub fn n_cells(&self) -> usize {
        self.gridcells.len()
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.n_times(), self.n_cells())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(|k| k.as_str())
    }

    pub fn variables(&self) -> impl Iterator<Item = (&str, &GridVariable)> {
        self.variables.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn has(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    /// Add or replace a variable, checking its shape
    pub fn insert(&mut self, name: &str, variable: GridVariable) -> TideCellResult<()> {
        if variable.values.dim() != self.shape() {
            return Err(TideCellError::schema(format!(
                "variable `{name}` has shape {:?}, dataset is {:?}",
                variable.values.dim(),
                self.shape()
            )));
        }
        self.variables.insert(name.to_string(), variable);
        Ok(())
    }

    pub fn get(&self, name: &str) -> TideCellResult<&GridVariable> {
        self.variables
            .get(name)
            .ok_or_else(|| TideCellError::schema(format!("missing forcing variable `{name}`")))
    }

    pub fn get_mut(&mut self, name: &str) -> TideCellResult<&mut GridVariable> {
        self.variables
            .get_mut(name)
            .ok_or_else(|| TideCellError::schema(format!("missing forcing variable `{name}`")))
    }

    pub fn values(&self, name: &str) -> TideCellResult<&Array2<FloatValue>> {
        Ok(&self.get(name)?.values)
    }

    /// Rows of `name` whose timestamp falls in `year`
    pub fn year_rows(&self, name: &str, year: i32) -> TideCellResult<Array2<FloatValue>> {
        let positions = self.time.year_positions(year);
        Ok(self.values(name)?.select(Axis(0), &positions))
    }

    /// View of one site's column
    pub fn column(&self, name: &str, cell: usize) -> TideCellResult<ndarray::ArrayView1<'_, FloatValue>> {
        let values = self.values(name)?;
        if cell >= self.n_cells() {
            return Err(TideCellError::schema(format!(
                "grid cell {cell} out of range for {} cells",
                self.n_cells()
            )));
        }
        Ok(values.column(cell))
    }

    pub fn view(&self, name: &str) -> TideCellResult<ArrayView2<'_, FloatValue>> {
        Ok(self.values(name)?.view())
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<AttributeValue>) {
        self.attrs.insert(name.to_string(), value.into());
    }

    /// Convert to a generic [`Dataset`] with CF-style coordinates
    ///
    /// Time is encoded as hours since the first timestamp. Data variables get a NaN
    /// `_FillValue` so unfilled gaps survive the round trip.
    pub fn to_dataset(&self) -> TideCellResult<Dataset> {
        let mut ds = Dataset::new();
        ds.add_dimension(TIME_DIM, self.n_times())?;
        ds.add_dimension(GRIDCELL_DIM, self.n_cells())?;

        let mut time_attrs = IndexMap::new();
        if let Some(start) = self.time.first() {
            time_attrs.insert(
                "units".to_string(),
                AttributeValue::Str(format!("hours since {}", start.format("%Y-%m-%d %H:%M:%S"))),
            );
        }
        time_attrs.insert("calendar".to_string(), "proleptic_gregorian".into());
        let hours = Array1::from(self.time.hours_since_start()).into_dyn();
        ds.insert_variable(TIME_DIM, Variable::from_f64(&[TIME_DIM], hours).with_attrs(time_attrs))?;

        let cells = Array1::from(self.gridcells.clone()).into_dyn();
        ds.insert_variable(GRIDCELL_DIM, Variable::new(&[GRIDCELL_DIM], VariableData::I32(cells)))?;

        for (name, variable) in &self.variables {
            let mut attrs = IndexMap::new();
            attrs.insert("_FillValue".to_string(), AttributeValue::Double(f64::NAN));
            attrs.insert("units".to_string(), AttributeValue::Str(variable.unit.clone()));
            if let Some(def) = standard_variables::lookup(name) {
                attrs.insert("long_name".to_string(), def.description.into());
            }
            let data = variable.values.clone().into_dyn();
            ds.insert_variable(
                name,
                Variable::from_f64(&[TIME_DIM, GRIDCELL_DIM], data).with_attrs(attrs),
            )?;
        }

        ds.attrs = self.attrs.clone();
        Ok(ds)
    }
}
