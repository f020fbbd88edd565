use std::io::{BufRead, Read};
use std::path::Path;

use super::{
    properties::{PlyDataType, PlyFormat, PlyPropertyDefinition, PlyType},
    DynamicProperty, PlyError, PlyPropertyTrait,
};
use crate::pointcloud::PointCloud;

struct PlyHeader {
    pub vertex_count: usize,
    pub properties: Vec<PlyPropertyDefinition>,
    pub format: PlyFormat,
    pub layout: PlyType,
}

fn parse_header<R: BufRead>(reader: &mut R) -> Result<PlyHeader, PlyError> {
    let mut line = String::new();
    let mut vertex_count = None;
    let mut format = None;
    let mut is_ply = false;
    let mut in_vertex_element = false;
    let mut num_elements = 0;
    let mut properties = Vec::new();

    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Err(PlyError::UnsupportedFormat(
                "missing end_header".to_string(),
            ));
        }
        let trimmed = line.trim();

        if trimmed == "ply" {
            is_ply = true;
            continue;
        }

        if trimmed == "end_header" {
            break;
        }

        let parts: Vec<&str> = trimmed.split_whitespace().collect();
        match parts.as_slice() {
            ["format", "ascii", ..] => format = Some(PlyFormat::Ascii),
            ["format", "binary_little_endian", ..] => format = Some(PlyFormat::BinaryLittleEndian),
            ["format", other, ..] => {
                return Err(PlyError::UnsupportedFormat(other.to_string()));
            }
            ["element", "vertex", count] => {
                if num_elements > 0 {
                    return Err(PlyError::UnsupportedFormat(
                        "vertex must be the first element".to_string(),
                    ));
                }
                vertex_count = Some(count.parse().map_err(|_| {
                    PlyError::UnsupportedFormat(format!("invalid vertex count {count}"))
                })?);
                in_vertex_element = true;
                num_elements += 1;
            }
            ["element", ..] => {
                in_vertex_element = false;
                num_elements += 1;
            }
            ["property", "list", ..] if in_vertex_element => {
                return Err(PlyError::UnsupportedProperty(trimmed.to_string()));
            }
            ["property", data_type, name] if in_vertex_element => {
                properties.push(PlyPropertyDefinition {
                    name: name.to_string(),
                    data_type: parse_data_type(data_type)?,
                });
            }
            _ => {}
        }
    }

    if !is_ply {
        return Err(PlyError::UnsupportedFormat("missing ply magic".to_string()));
    }

    let format = format.ok_or_else(|| PlyError::UnsupportedFormat("missing format".to_string()))?;
    let vertex_count =
        vertex_count.ok_or_else(|| PlyError::UnsupportedFormat("missing vertex element".to_string()))?;
    let layout = PlyType::detect_format(&properties)?;

    Ok(PlyHeader {
        vertex_count,
        properties,
        format,
        layout,
    })
}

fn parse_data_type(type_str: &str) -> Result<PlyDataType, PlyError> {
    match type_str {
        "float" | "float32" => Ok(PlyDataType::Float32),
        "double" | "float64" => Ok(PlyDataType::Float64),
        "char" | "int8" => Ok(PlyDataType::Int8),
        "uchar" | "uint8" => Ok(PlyDataType::UInt8),
        "short" | "int16" => Ok(PlyDataType::Int16),
        "ushort" | "uint16" => Ok(PlyDataType::UInt16),
        "int" | "int32" => Ok(PlyDataType::Int32),
        "uint" | "uint32" => Ok(PlyDataType::UInt32),
        _ => Err(PlyError::UnsupportedProperty(type_str.to_string())),
    }
}

// keep the colors only if every vertex has one
fn into_pointcloud(points: Vec<[f64; 3]>, colors: Vec<Option<[f64; 3]>>) -> PointCloud {
    let colors = colors.into_iter().collect::<Option<Vec<_>>>();
    PointCloud::new(points, colors)
}

// the vertex count comes from the file, so do not trust it for pre-allocation
fn capacity_hint(count: usize) -> usize {
    count.min(1 << 16)
}

/// Read the vertices of a PLY file.
///
/// Both the `ascii` and the `binary_little_endian` encodings are supported. Colors
/// are returned normalized to `[0, 1]`: 8-bit channels are divided by 255 and float
/// channels are kept as they are.
///
/// # Arguments
///
/// * `path` - The path to the PLY file.
pub fn read_ply(path: impl AsRef<Path>) -> Result<PointCloud, PlyError> {
    let file = std::fs::File::open(path)?;
    let mut reader = std::io::BufReader::new(file);
    let header = parse_header(&mut reader)?;

    let mut points = Vec::with_capacity(capacity_hint(header.vertex_count));
    let mut colors = Vec::with_capacity(capacity_hint(header.vertex_count));

    match header.format {
        PlyFormat::BinaryLittleEndian => {
            let mut buffer = vec![0u8; header.layout.size_of()];
            for _ in 0..header.vertex_count {
                reader.read_exact(&mut buffer)?;
                let property_entry = header.layout.deserialize(&buffer)?;
                points.push(property_entry.to_point());
                colors.push(property_entry.to_color());
            }
        }
        PlyFormat::Ascii => {
            let mut lines = reader.lines();
            while points.len() < header.vertex_count {
                let line = lines
                    .next()
                    .ok_or_else(|| PlyError::Parse("unexpected end of file".to_string()))??;
                if line.trim().is_empty() {
                    continue;
                }
                let property_entry = DynamicProperty::parse_from_line(&line, &header.properties)?;
                points.push(property_entry.to_point());
                colors.push(property_entry.to_color());
            }
        }
    }

    Ok(into_pointcloud(points, colors))
}
