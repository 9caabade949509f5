//! NetCDF reading and writing of [`Dataset`]s
//!
//! Variables keep their storage type through a read and a write: every numeric width,
//! `char` and `string`. User-defined types (compound, opaque, enum, vlen) are skipped
//! with a warning.
//!
//! Without the `netcdf` feature both functions return
//! [`TideCellError::FeatureDisabled`].

use std::path::Path;
#[cfg(feature = "netcdf")]
use tidecell_core::dataset::{AttributeValue, Variable, VariableData};
use tidecell_core::dataset::Dataset;
use tidecell_core::errors::{TideCellError, TideCellResult};

#[cfg(feature = "netcdf")]
use ::netcdf::types::{FloatType, IntType, NcVariableType};
#[cfg(feature = "netcdf")]
use ::netcdf::NcTypeDescriptor;
#[cfg(feature = "netcdf")]
use ndarray::{ArrayD, Dimension, IxDyn};

/// A single `NC_CHAR`, which netCDF does not treat as a number
#[cfg(feature = "netcdf")]
#[repr(transparent)]
#[derive(Debug, Clone, Copy)]
struct NcChar(u8);

#[cfg(feature = "netcdf")]
unsafe impl NcTypeDescriptor for NcChar {
    fn type_descriptor() -> NcVariableType {
        NcVariableType::Char
    }
}

/// Read a whole file into memory
#[cfg(feature = "netcdf")]
pub fn read_dataset(path: impl AsRef<Path>) -> TideCellResult<Dataset> {
    let path = path.as_ref();
    let load = |e: ::netcdf::Error| TideCellError::load(path, e);
    let file = ::netcdf::open(path).map_err(load)?;

    let mut dataset = Dataset::new();
    for dim in file.dimensions() {
        dataset.add_dimension(&dim.name(), dim.len())?;
    }
    for attr in file.attributes() {
        if let Some(value) = from_nc_attribute(attr.value().map_err(load)?) {
            dataset.attrs.insert(attr.name().to_string(), value);
        }
    }

    for var in file.variables() {
        let name = var.name();
        let dims: Vec<String> = var.dimensions().iter().map(|d| d.name()).collect();
        let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
        let Some(data) = read_data(&var, &shape).map_err(load)? else {
            log::warn!(
                "Skipping variable {} of type {:?} in {}",
                name,
                var.vartype(),
                path.display()
            );
            continue;
        };

        let dim_refs: Vec<&str> = dims.iter().map(String::as_str).collect();
        let mut variable = Variable::new(&dim_refs, data);
        for attr in var.attributes() {
            if let Some(value) = from_nc_attribute(attr.value().map_err(load)?) {
                variable.attrs.insert(attr.name().to_string(), value);
            }
        }
        dataset.insert_variable(&name, variable)?;
    }

    log::debug!(
        "Read {} with {} dimensions and {} variables",
        path.display(),
        dataset.dims.len(),
        dataset.variables.len()
    );
    Ok(dataset)
}

#[cfg(not(feature = "netcdf"))]
pub fn read_dataset(_path: impl AsRef<Path>) -> TideCellResult<Dataset> {
    Err(TideCellError::FeatureDisabled)
}

/// Values of a variable in its own storage type, `None` for user-defined types
#[cfg(feature = "netcdf")]
fn read_data(
    var: &::netcdf::Variable<'_>,
    shape: &[usize],
) -> Result<Option<VariableData>, ::netcdf::Error> {
    let data = match var.vartype() {
        NcVariableType::Float(FloatType::F32) => VariableData::F32(read_values(var, shape)?),
        NcVariableType::Float(FloatType::F64) => VariableData::F64(read_values(var, shape)?),
        NcVariableType::Int(IntType::I8) => VariableData::I8(read_values(var, shape)?),
        NcVariableType::Int(IntType::I16) => VariableData::I16(read_values(var, shape)?),
        NcVariableType::Int(IntType::I32) => VariableData::I32(read_values(var, shape)?),
        NcVariableType::Int(IntType::I64) => VariableData::I64(read_values(var, shape)?),
        NcVariableType::Int(IntType::U8) => VariableData::U8(read_values(var, shape)?),
        NcVariableType::Int(IntType::U16) => VariableData::U16(read_values(var, shape)?),
        NcVariableType::Int(IntType::U32) => VariableData::U32(read_values(var, shape)?),
        NcVariableType::Int(IntType::U64) => VariableData::U64(read_values(var, shape)?),
        NcVariableType::Char => {
            VariableData::Char(read_values::<NcChar>(var, shape)?.mapv(|c| c.0))
        }
        NcVariableType::String => {
            let mut strings = ArrayD::<String>::default(IxDyn(shape));
            for (index, value) in strings.indexed_iter_mut() {
                *value = var.get_string(index.slice().to_vec())?;
            }
            VariableData::Str(strings)
        }
        _ => return Ok(None),
    };
    Ok(Some(data))
}

#[cfg(feature = "netcdf")]
fn read_values<T: NcTypeDescriptor + Copy>(
    var: &::netcdf::Variable<'_>,
    shape: &[usize],
) -> Result<ArrayD<T>, ::netcdf::Error> {
    let values: Vec<T> = var.get_values(..)?;
    ArrayD::from_shape_vec(IxDyn(shape), values).map_err(|e| e.to_string().into())
}

/// Write a dataset to a new netCDF-4 file, replacing any existing file
#[cfg(feature = "netcdf")]
pub fn write_dataset(path: impl AsRef<Path>, dataset: &Dataset) -> TideCellResult<()> {
    let path = path.as_ref();
    let fail = |e: ::netcdf::Error| TideCellError::write(path, e);
    let mut file = ::netcdf::create(path).map_err(fail)?;

    for (name, &len) in &dataset.dims {
        file.add_dimension(name, len).map_err(fail)?;
    }
    for (name, value) in &dataset.attrs {
        file.add_attribute(name, to_nc_attribute(value))
            .map_err(fail)?;
    }
    for (name, variable) in &dataset.variables {
        write_variable(&mut file, name, variable).map_err(fail)?;
    }
    file.close().map_err(fail)?;

    log::info!("Wrote {}", path.display());
    Ok(())
}

#[cfg(not(feature = "netcdf"))]
pub fn write_dataset(_path: impl AsRef<Path>, _dataset: &Dataset) -> TideCellResult<()> {
    Err(TideCellError::FeatureDisabled)
}

#[cfg(feature = "netcdf")]
fn write_variable(
    file: &mut ::netcdf::FileMut,
    name: &str,
    variable: &Variable,
) -> Result<(), ::netcdf::Error> {
    let dims: Vec<&str> = variable.dims.iter().map(String::as_str).collect();
    match &variable.data {
        VariableData::F32(values) => write_values(file, name, &dims, variable, values),
        VariableData::F64(values) => write_values(file, name, &dims, variable, values),
        VariableData::I8(values) => write_values(file, name, &dims, variable, values),
        VariableData::I16(values) => write_values(file, name, &dims, variable, values),
        VariableData::I32(values) => write_values(file, name, &dims, variable, values),
        VariableData::I64(values) => write_values(file, name, &dims, variable, values),
        VariableData::U8(values) => write_values(file, name, &dims, variable, values),
        VariableData::U16(values) => write_values(file, name, &dims, variable, values),
        VariableData::U32(values) => write_values(file, name, &dims, variable, values),
        VariableData::U64(values) => write_values(file, name, &dims, variable, values),
        VariableData::Char(values) => {
            let mut var = file.add_variable::<NcChar>(name, &dims)?;
            put_attributes(&mut var, variable, |value| match value {
                AttributeValue::Str(s) if s.len() == 1 => Some(NcChar(s.as_bytes()[0])),
                _ => None,
            })?;
            let flat: Vec<NcChar> = values.iter().map(|&c| NcChar(c)).collect();
            var.put_values(&flat, ..)
        }
        VariableData::Str(values) => {
            let mut var = file.add_variable_with_type(name, &dims, &NcVariableType::String)?;
            for (key, value) in &variable.attrs {
                if key == "_FillValue" {
                    log::debug!("Dropping _FillValue of string variable {}", name);
                    continue;
                }
                var.put_attribute(key, to_nc_attribute(value))?;
            }
            for (index, value) in values.indexed_iter() {
                var.put_string(value, index.slice().to_vec())?;
            }
            Ok(())
        }
    }
}

#[cfg(feature = "netcdf")]
fn write_values<T: FillValue>(
    file: &mut ::netcdf::FileMut,
    name: &str,
    dims: &[&str],
    variable: &Variable,
    values: &ArrayD<T>,
) -> Result<(), ::netcdf::Error> {
    let mut var = file.add_variable::<T>(name, dims)?;
    put_attributes(&mut var, variable, T::from_attribute)?;
    let flat: Vec<T> = values.iter().copied().collect();
    var.put_values(&flat, ..)
}

/// Numeric types whose `_FillValue` can be recovered from an [`AttributeValue`]
#[cfg(feature = "netcdf")]
trait FillValue: NcTypeDescriptor + Copy {
    fn from_attribute(value: &AttributeValue) -> Option<Self>;
}

#[cfg(feature = "netcdf")]
macro_rules! impl_float_fill {
    ($($ty:ty),*) => {$(
        impl FillValue for $ty {
            fn from_attribute(value: &AttributeValue) -> Option<Self> {
                match value {
                    AttributeValue::Double(x) => Some(*x as $ty),
                    _ => None,
                }
            }
        }
    )*};
}

#[cfg(feature = "netcdf")]
macro_rules! impl_int_fill {
    ($($ty:ty),*) => {$(
        impl FillValue for $ty {
            fn from_attribute(value: &AttributeValue) -> Option<Self> {
                match value {
                    AttributeValue::Int(x) => <$ty>::try_from(*x).ok(),
                    _ => None,
                }
            }
        }
    )*};
}

#[cfg(feature = "netcdf")]
impl_float_fill!(f32, f64);
#[cfg(feature = "netcdf")]
impl_int_fill!(i8, i16, i32, i64, u8, u16, u32, u64);

/// `_FillValue` must match the variable type, so it goes through `set_fill_value`
#[cfg(feature = "netcdf")]
fn put_attributes<T: NcTypeDescriptor>(
    var: &mut ::netcdf::VariableMut<'_>,
    variable: &Variable,
    fill_value: impl Fn(&AttributeValue) -> Option<T>,
) -> Result<(), ::netcdf::Error> {
    for (key, value) in &variable.attrs {
        if key == "_FillValue" {
            if let Some(fill) = fill_value(value) {
                var.set_fill_value(fill)?;
                continue;
            }
        }
        var.put_attribute(key, to_nc_attribute(value))?;
    }
    Ok(())
}

#[cfg(feature = "netcdf")]
fn to_nc_attribute(value: &AttributeValue) -> ::netcdf::AttributeValue {
    match value {
        AttributeValue::Str(s) => s.as_str().into(),
        AttributeValue::Int(i) => (*i).into(),
        AttributeValue::Ints(v) => v.clone().into(),
        AttributeValue::Double(x) => (*x).into(),
        AttributeValue::Doubles(v) => v.clone().into(),
    }
}

/// Numeric attributes widen to `i64`/`f64`; `u64` values beyond `i64` are dropped
#[cfg(feature = "netcdf")]
fn from_nc_attribute(value: ::netcdf::AttributeValue) -> Option<AttributeValue> {
    use ::netcdf::AttributeValue as Nc;
    fn ints<T: Into<i64>>(v: Vec<T>) -> AttributeValue {
        AttributeValue::Ints(v.into_iter().map(Into::into).collect())
    }
    let converted = match value {
        Nc::Str(s) => AttributeValue::Str(s),
        Nc::Strs(v) => AttributeValue::Str(v.join("\n")),
        Nc::Uchar(x) => AttributeValue::Int(x.into()),
        Nc::Schar(x) => AttributeValue::Int(x.into()),
        Nc::Ushort(x) => AttributeValue::Int(x.into()),
        Nc::Short(x) => AttributeValue::Int(x.into()),
        Nc::Uint(x) => AttributeValue::Int(x.into()),
        Nc::Int(x) => AttributeValue::Int(x.into()),
        Nc::Longlong(x) => AttributeValue::Int(x),
        Nc::Ulonglong(x) => AttributeValue::Int(i64::try_from(x).ok()?),
        Nc::Uchars(v) => ints(v),
        Nc::Schars(v) => ints(v),
        Nc::Ushorts(v) => ints(v),
        Nc::Shorts(v) => ints(v),
        Nc::Uints(v) => ints(v),
        Nc::Ints(v) => ints(v),
        Nc::Longlongs(v) => AttributeValue::Ints(v),
        Nc::Ulonglongs(v) => AttributeValue::Ints(
            v.into_iter()
                .map(i64::try_from)
                .collect::<Result<_, _>>()
                .ok()?,
        ),
        Nc::Float(x) => AttributeValue::Double(x.into()),
        Nc::Double(x) => AttributeValue::Double(x),
        Nc::Floats(v) => AttributeValue::Doubles(v.into_iter().map(f64::from).collect()),
        Nc::Doubles(v) => AttributeValue::Doubles(v),
    };
    Some(converted)
}


#[cfg(all(test, not(feature = "netcdf")))]
mod disabled_tests {
    use super::*;

    #[test]
    fn reports_feature_disabled() {
        assert!(matches!(
            read_dataset("domain.nc"),
            Err(TideCellError::FeatureDisabled)
        ));
        assert!(matches!(
            write_dataset("out.nc", &Dataset::new()),
            Err(TideCellError::FeatureDisabled)
        ));
    }
}
