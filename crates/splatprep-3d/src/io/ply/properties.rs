use byteorder::{ByteOrder, LittleEndian};

use super::PlyError;

/// Encoding of the PLY body.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum PlyFormat {
    /// Whitespace separated text, one vertex per line
    Ascii,
    /// Packed little endian records
    BinaryLittleEndian,
}

/// Layout of a vertex record.
#[derive(Debug, PartialEq, Clone)]
pub enum PlyType {
    /// float x, y, z followed by uchar red, green, blue
    XYZRgb,
    /// double x, y, z followed by uchar red, green, blue
    XYZDoubleRgb,
    /// Any other list of scalar properties
    Dynamic(Vec<PlyPropertyDefinition>),
}

/// A scalar property of the vertex element.
#[derive(Debug, PartialEq, Clone)]
pub struct PlyPropertyDefinition {
    /// Property name
    pub name: String,
    /// Property scalar type
    pub data_type: PlyDataType,
}

/// Scalar types of the PLY format.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[allow(missing_docs)]
pub enum PlyDataType {
    Float32,
    Float64,
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
}

impl PlyDataType {
    /// Size in bytes of the type in the binary encoding.
    pub fn size(&self) -> usize {
        match self {
            PlyDataType::Float32 | PlyDataType::Int32 | PlyDataType::UInt32 => 4,
            PlyDataType::Float64 => 8,
            PlyDataType::Int16 | PlyDataType::UInt16 => 2,
            PlyDataType::Int8 | PlyDataType::UInt8 => 1,
        }
    }
}

/// Access to the fields of a decoded vertex.
pub trait PlyPropertyTrait {
    /// The vertex position.
    fn to_point(&self) -> [f64; 3];
    /// The vertex color normalized to `[0, 1]`, if the vertex has one.
    fn to_color(&self) -> Option<[f64; 3]>;
}

/// Vertex with float position and 8-bit color.
#[repr(C, packed)]
#[derive(Debug, bincode::Decode)]
#[allow(missing_docs)]
pub struct XYZRgbProperty {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl PlyPropertyTrait for XYZRgbProperty {
    fn to_point(&self) -> [f64; 3] {
        [self.x as f64, self.y as f64, self.z as f64]
    }

    fn to_color(&self) -> Option<[f64; 3]> {
        Some([self.red, self.green, self.blue].map(|c| c as f64 / 255.0))
    }
}

/// Vertex with double position and 8-bit color.
#[repr(C, packed)]
#[derive(Debug, bincode::Decode)]
#[allow(missing_docs)]
pub struct XYZDoubleRgbProperty {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl PlyPropertyTrait for XYZDoubleRgbProperty {
    fn to_point(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    fn to_color(&self) -> Option<[f64; 3]> {
        Some([self.red, self.green, self.blue].map(|c| c as f64 / 255.0))
    }
}

/// A single scalar value of a dynamic vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
#[allow(missing_docs)]
pub enum DynamicPropertyValue {
    Float32(f32),
    Float64(f64),
    Int8(i8),
    UInt8(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
}

impl DynamicPropertyValue {
    fn as_f64(&self) -> f64 {
        match *self {
            DynamicPropertyValue::Float32(v) => v as f64,
            DynamicPropertyValue::Float64(v) => v,
            DynamicPropertyValue::Int8(v) => v as f64,
            DynamicPropertyValue::UInt8(v) => v as f64,
            DynamicPropertyValue::Int16(v) => v as f64,
            DynamicPropertyValue::UInt16(v) => v as f64,
            DynamicPropertyValue::Int32(v) => v as f64,
            DynamicPropertyValue::UInt32(v) => v as f64,
        }
    }

    // integer channels are scaled by their maximum, float channels are already normalized
    fn as_normalized_color(&self) -> f64 {
        match *self {
            DynamicPropertyValue::Float32(v) => v as f64,
            DynamicPropertyValue::Float64(v) => v,
            DynamicPropertyValue::UInt8(v) => v as f64 / u8::MAX as f64,
            DynamicPropertyValue::UInt16(v) => v as f64 / u16::MAX as f64,
            DynamicPropertyValue::UInt32(v) => v as f64 / u32::MAX as f64,
            DynamicPropertyValue::Int8(v) => v.max(0) as f64 / i8::MAX as f64,
            DynamicPropertyValue::Int16(v) => v.max(0) as f64 / i16::MAX as f64,
            DynamicPropertyValue::Int32(v) => v.max(0) as f64 / i32::MAX as f64,
        }
    }
}

/// Vertex with an arbitrary list of scalar properties.
#[derive(Debug)]
pub struct DynamicProperty {
    /// Property names and values in header order
    pub properties: Vec<(String, DynamicPropertyValue)>,
}

impl DynamicProperty {
    /// Decode one vertex from its little endian binary record.
    pub fn parse_from_buffer(
        buffer: &[u8],
        schema: &[PlyPropertyDefinition],
    ) -> Result<Self, PlyError> {
        let mut properties = Vec::with_capacity(schema.len());
        let mut offset = 0;

        for prop_def in schema {
            let size = prop_def.data_type.size();
            let bytes = buffer.get(offset..offset + size).ok_or_else(|| {
                PlyError::Parse(format!("record too short for property {}", prop_def.name))
            })?;

            let value = match prop_def.data_type {
                PlyDataType::Float32 => DynamicPropertyValue::Float32(LittleEndian::read_f32(bytes)),
                PlyDataType::Float64 => DynamicPropertyValue::Float64(LittleEndian::read_f64(bytes)),
                PlyDataType::Int8 => DynamicPropertyValue::Int8(bytes[0] as i8),
                PlyDataType::UInt8 => DynamicPropertyValue::UInt8(bytes[0]),
                PlyDataType::Int16 => DynamicPropertyValue::Int16(LittleEndian::read_i16(bytes)),
                PlyDataType::UInt16 => DynamicPropertyValue::UInt16(LittleEndian::read_u16(bytes)),
                PlyDataType::Int32 => DynamicPropertyValue::Int32(LittleEndian::read_i32(bytes)),
                PlyDataType::UInt32 => DynamicPropertyValue::UInt32(LittleEndian::read_u32(bytes)),
            };

            properties.push((prop_def.name.clone(), value));
            offset += size;
        }

        Ok(DynamicProperty { properties })
    }

    /// Decode one vertex from a line of the ascii body.
    pub fn parse_from_line(line: &str, schema: &[PlyPropertyDefinition]) -> Result<Self, PlyError> {
        let tokens = line.split_whitespace().collect::<Vec<_>>();
        if tokens.len() < schema.len() {
            return Err(PlyError::Parse(format!(
                "expected {} values, got {}: {line:?}",
                schema.len(),
                tokens.len()
            )));
        }

        fn parse<T: std::str::FromStr>(s: &str) -> Result<T, PlyError> {
            s.parse::<T>()
                .map_err(|_| PlyError::Parse(format!("invalid value {s:?}")))
        }

        let properties = schema
            .iter()
            .zip(tokens)
            .map(|(prop_def, token)| -> Result<(String, DynamicPropertyValue), PlyError> {
                let value = match prop_def.data_type {
                    PlyDataType::Float32 => DynamicPropertyValue::Float32(parse(token)?),
                    PlyDataType::Float64 => DynamicPropertyValue::Float64(parse(token)?),
                    PlyDataType::Int8 => DynamicPropertyValue::Int8(parse(token)?),
                    PlyDataType::UInt8 => DynamicPropertyValue::UInt8(parse(token)?),
                    PlyDataType::Int16 => DynamicPropertyValue::Int16(parse(token)?),
                    PlyDataType::UInt16 => DynamicPropertyValue::UInt16(parse(token)?),
                    PlyDataType::Int32 => DynamicPropertyValue::Int32(parse(token)?),
                    PlyDataType::UInt32 => DynamicPropertyValue::UInt32(parse(token)?),
                };
                Ok((prop_def.name.clone(), value))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(DynamicProperty { properties })
    }

    fn get(&self, name: &str) -> Option<&DynamicPropertyValue> {
        self.properties
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }
}

impl PlyPropertyTrait for DynamicProperty {
    fn to_point(&self) -> [f64; 3] {
        ["x", "y", "z"].map(|name| self.get(name).map_or(0.0, |v| v.as_f64()))
    }

    fn to_color(&self) -> Option<[f64; 3]> {
        let red = self.get("red")?;
        let green = self.get("green")?;
        let blue = self.get("blue")?;
        Some([
            red.as_normalized_color(),
            green.as_normalized_color(),
            blue.as_normalized_color(),
        ])
    }
}

/// A decoded vertex of any supported layout.
#[allow(missing_docs)]
pub enum PlyProperty {
    XYZRgb(XYZRgbProperty),
    XYZDoubleRgb(XYZDoubleRgbProperty),
    Dynamic(DynamicProperty),
}

impl PlyType {
    /// Decode one binary vertex record.
    pub fn deserialize(&self, buffer: &[u8]) -> Result<PlyProperty, PlyError> {
        match self {
            PlyType::XYZRgb => {
                let (property, _): (XYZRgbProperty, usize) =
                    bincode::decode_from_slice(buffer, bincode::config::standard())?;
                Ok(PlyProperty::XYZRgb(property))
            }
            PlyType::XYZDoubleRgb => {
                let (property, _): (XYZDoubleRgbProperty, usize) =
                    bincode::decode_from_slice(buffer, bincode::config::standard())?;
                Ok(PlyProperty::XYZDoubleRgb(property))
            }
            PlyType::Dynamic(ref schema) => {
                let dynamic_property = DynamicProperty::parse_from_buffer(buffer, schema)?;
                Ok(PlyProperty::Dynamic(dynamic_property))
            }
        }
    }

    /// Size in bytes of one binary vertex record.
    pub fn size_of(&self) -> usize {
        match self {
            PlyType::XYZRgb => std::mem::size_of::<XYZRgbProperty>(),
            PlyType::XYZDoubleRgb => std::mem::size_of::<XYZDoubleRgbProperty>(),
            PlyType::Dynamic(ref props) => props.iter().map(|p| p.data_type.size()).sum(),
        }
    }

    /// Pick the layout matching the vertex properties.
    ///
    /// The vertex must at least have `x`, `y` and `z`.
    pub fn detect_format(properties: &[PlyPropertyDefinition]) -> Result<Self, PlyError> {
        for axis in ["x", "y", "z"] {
            if !properties.iter().any(|p| p.name == axis) {
                return Err(PlyError::MissingProperty(axis.to_string()));
            }
        }

        let expected_names = ["x", "y", "z", "red", "green", "blue"];
        let names_match = properties.len() == expected_names.len()
            && properties
                .iter()
                .zip(expected_names.iter())
                .all(|(p, expected)| &p.name == expected);

        if names_match && properties[3..].iter().all(|p| p.data_type == PlyDataType::UInt8) {
            if properties[..3].iter().all(|p| p.data_type == PlyDataType::Float32) {
                return Ok(PlyType::XYZRgb);
            }
            if properties[..3].iter().all(|p| p.data_type == PlyDataType::Float64) {
                return Ok(PlyType::XYZDoubleRgb);
            }
        }

        Ok(PlyType::Dynamic(properties.to_vec()))
    }
}

impl PlyPropertyTrait for PlyProperty {
    fn to_point(&self) -> [f64; 3] {
        match self {
            PlyProperty::XYZRgb(property) => property.to_point(),
            PlyProperty::XYZDoubleRgb(property) => property.to_point(),
            PlyProperty::Dynamic(property) => property.to_point(),
        }
    }

    fn to_color(&self) -> Option<[f64; 3]> {
        match self {
            PlyProperty::XYZRgb(property) => property.to_color(),
            PlyProperty::XYZDoubleRgb(property) => property.to_color(),
            PlyProperty::Dynamic(property) => property.to_color(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition(name: &str, data_type: PlyDataType) -> PlyPropertyDefinition {
        PlyPropertyDefinition {
            name: name.to_string(),
            data_type,
        }
    }

    #[test]
    fn test_parse_from_buffer_mixed_types() -> Result<(), PlyError> {
        let schema = vec![
            definition("x", PlyDataType::Float64),
            definition("y", PlyDataType::Int16),
            definition("z", PlyDataType::Int32),
            definition("red", PlyDataType::UInt16),
            definition("green", PlyDataType::UInt32),
            definition("blue", PlyDataType::Float32),
        ];

        let mut buffer = Vec::new();
        buffer.extend_from_slice(&(-1.5f64).to_le_bytes());
        buffer.extend_from_slice(&(-300i16).to_le_bytes());
        buffer.extend_from_slice(&70000i32.to_le_bytes());
        buffer.extend_from_slice(&u16::MAX.to_le_bytes());
        buffer.extend_from_slice(&0u32.to_le_bytes());
        buffer.extend_from_slice(&0.25f32.to_le_bytes());
        assert_eq!(buffer.len(), PlyType::Dynamic(schema.clone()).size_of());

        let vertex = DynamicProperty::parse_from_buffer(&buffer, &schema)?;
        assert_eq!(vertex.get("y"), Some(&DynamicPropertyValue::Int16(-300)));
        assert_eq!(vertex.to_point(), [-1.5, -300.0, 70000.0]);
        assert_eq!(vertex.to_color(), Some([1.0, 0.0, 0.25]));
        Ok(())
    }

    #[test]
    fn test_parse_from_buffer_short_record() {
        let schema = vec![definition("x", PlyDataType::Float64)];
        let res = DynamicProperty::parse_from_buffer(&[0u8; 4], &schema);
        assert!(matches!(res, Err(PlyError::Parse(_))));
    }
}
