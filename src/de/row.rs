use crate::{de::val_reader::ScalarReader, ElementDef, PlyError, PropertyType};

/// A single decoded property value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Scalar(f64),
    List(Vec<f64>),
}

impl PropertyValue {
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            PropertyValue::Scalar(v) => Some(*v),
            PropertyValue::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[f64]> {
        match self {
            PropertyValue::List(values) => Some(values),
            PropertyValue::Scalar(_) => None,
        }
    }
}

/// One element instance, with values in property declaration order.
///
/// Values are looked up by property index; [`ElementDef::property_index`] maps names to
/// indices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementRecord {
    values: Vec<PropertyValue>,
}

impl ElementRecord {
    pub fn get(&self, index: usize) -> Option<&PropertyValue> {
        self.values.get(index)
    }
}

/// Read one record of `elem_def` into `record`, replacing its previous contents.
///
/// On error the record is left partially filled and must not be used.
pub(crate) fn read_row<R: ScalarReader>(
    reader: &mut R,
    elem_def: &ElementDef,
    record: &mut ElementRecord,
) -> Result<(), PlyError> {
    record.values.clear();

    for property in &elem_def.properties {
        let value = match property {
            PropertyType::Scalar { data_type, .. } => {
                PropertyValue::Scalar(reader.read_scalar(*data_type)?)
            }
            PropertyType::List {
                count_type,
                data_type,
                ..
            } => {
                let count = reader.read_count(*count_type)?;
                // Counts come from the body, so don't trust them for preallocation.
                let mut list = Vec::with_capacity(count.min(16));
                for _ in 0..count {
                    list.push(reader.read_scalar(*data_type)?);
                }
                PropertyValue::List(list)
            }
        };
        record.values.push(value);
    }

    Ok(())
}
