//! Coordinate spaces and the transforms that map sources into them

use serde_json::{Map, Value};

use imvox_json::{
    emit_field, emit_nonempty, impl_json_eq, AccessMode, EmptyWithMode, FromJson, JsonObject,
    StateResult, ToJson, TypedMap,
};

/// Physical scale of one dimension; wire form `[scale, "unit"]`.
#[derive(Debug, Clone, PartialEq)]
pub struct DimensionScale {
    pub scale: f64,
    pub unit: String,
}

impl DimensionScale {
    pub fn new(scale: f64, unit: impl Into<String>) -> Self {
        DimensionScale {
            scale,
            unit: unit.into(),
        }
    }
}

impl FromJson for DimensionScale {
    fn from_json(value: &Value, mode: AccessMode) -> StateResult<Self> {
        let [scale, unit] = <[Value; 2]>::from_json(value, mode)?;
        Ok(DimensionScale {
            scale: f64::from_json(&scale, mode)?,
            unit: String::from_json(&unit, mode)?,
        })
    }
}

impl ToJson for DimensionScale {
    fn to_json(&self) -> Value {
        Value::Array(vec![self.scale.to_json(), self.unit.to_json()])
    }
}

/// An ordered set of named dimensions with physical scales.
///
/// Wire form is a JSON object mapping each dimension name to its scale pair,
/// e.g. `{"x": [4e-9, "m"], "y": [4e-9, "m"], "z": [40e-9, "m"]}`.
/// Dimension order is significant: it defines the coordinate rank ordering,
/// so equality here is order-sensitive even though the backing map is not.
#[derive(Debug, Clone, Default)]
pub struct CoordinateSpace {
    dimensions: TypedMap<String, DimensionScale>,
}

impl CoordinateSpace {
    pub fn new() -> Self {
        CoordinateSpace::default()
    }

    /// Number of dimensions.
    pub fn rank(&self) -> usize {
        self.dimensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&DimensionScale> {
        self.dimensions.get(&name.to_string())
    }

    /// Dimension names in rank order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.dimensions.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &DimensionScale)> {
        self.dimensions.iter()
    }

    /// Adds or replaces a dimension; a replaced dimension keeps its rank.
    pub fn insert(&mut self, name: impl Into<String>, scale: DimensionScale) -> StateResult<()> {
        self.dimensions.insert(name.into(), scale)?;
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> StateResult<DimensionScale> {
        self.dimensions.remove(&name.to_string())
    }

    pub fn with_dimension(mut self, name: impl Into<String>, scale: f64, unit: &str) -> Self {
        let _ = self.dimensions.insert(name.into(), DimensionScale::new(scale, unit));
        self
    }
}

impl EmptyWithMode for CoordinateSpace {
    fn empty_with_mode(mode: AccessMode) -> Self {
        CoordinateSpace {
            dimensions: TypedMap::empty_with_mode(mode),
        }
    }
}

impl PartialEq for CoordinateSpace {
    fn eq(&self, other: &Self) -> bool {
        self.rank() == other.rank()
            && self
                .iter()
                .zip(other.iter())
                .all(|((na, sa), (nb, sb))| na == nb && sa == sb)
    }
}

impl FromJson for CoordinateSpace {
    fn from_json(value: &Value, mode: AccessMode) -> StateResult<Self> {
        Ok(CoordinateSpace {
            dimensions: TypedMap::from_json(value, mode)?,
        })
    }
}

impl ToJson for CoordinateSpace {
    fn to_json(&self) -> Value {
        self.dimensions.to_json()
    }
}

/// Affine transform from a source coordinate space into the layer's space.
#[derive(Debug, Clone)]
pub struct CoordinateSpaceTransform {
    output_dimensions: CoordinateSpace,
    input_dimensions: Option<CoordinateSpace>,
    source_rank: Option<i64>,
    matrix: Option<Vec<Vec<f64>>>,
    extra: Map<String, Value>,
    mode: AccessMode,
}

impl CoordinateSpaceTransform {
    pub fn new() -> Self {
        CoordinateSpaceTransform {
            output_dimensions: CoordinateSpace::new(),
            input_dimensions: None,
            source_rank: None,
            matrix: None,
            extra: Map::new(),
            mode: AccessMode::ReadWrite,
        }
    }

    pub fn output_dimensions(&self) -> &CoordinateSpace {
        &self.output_dimensions
    }

    pub fn set_output_dimensions(&mut self, dimensions: CoordinateSpace) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.output_dimensions = dimensions;
        Ok(())
    }

    pub fn input_dimensions(&self) -> Option<&CoordinateSpace> {
        self.input_dimensions.as_ref()
    }

    pub fn set_input_dimensions(&mut self, dimensions: Option<CoordinateSpace>) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.input_dimensions = dimensions;
        Ok(())
    }

    pub fn source_rank(&self) -> Option<i64> {
        self.source_rank
    }

    pub fn set_source_rank(&mut self, rank: Option<i64>) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.source_rank = rank;
        Ok(())
    }

    /// Row-major affine matrix, one row per output dimension.
    pub fn matrix(&self) -> Option<&Vec<Vec<f64>>> {
        self.matrix.as_ref()
    }

    pub fn set_matrix(&mut self, matrix: Option<Vec<Vec<f64>>>) -> StateResult<()> {
        self.mode.ensure_mutable()?;
        self.matrix = matrix;
        Ok(())
    }

    pub fn with_output_dimensions(mut self, dimensions: CoordinateSpace) -> Self {
        self.output_dimensions = dimensions;
        self
    }

    pub fn with_matrix(mut self, matrix: Vec<Vec<f64>>) -> Self {
        self.matrix = Some(matrix);
        self
    }
}

impl Default for CoordinateSpaceTransform {
    fn default() -> Self {
        CoordinateSpaceTransform::new()
    }
}

impl FromJson for CoordinateSpaceTransform {
    fn from_json(value: &Value, mode: AccessMode) -> StateResult<Self> {
        let mut obj = JsonObject::from_value(value, mode)?;
        let output_dimensions = obj.take_or_empty("outputDimensions")?;
        let input_dimensions = obj.take("inputDimensions")?;
        let source_rank = obj.take("sourceRank")?;
        let matrix = obj.take("matrix")?;
        Ok(CoordinateSpaceTransform {
            output_dimensions,
            input_dimensions,
            source_rank,
            matrix,
            extra: obj.into_extra(),
            mode,
        })
    }
}

impl ToJson for CoordinateSpaceTransform {
    fn to_json(&self) -> Value {
        let mut map = Map::new();
        emit_nonempty(&mut map, "outputDimensions", self.output_dimensions.to_json());
        emit_field(&mut map, "inputDimensions", &self.input_dimensions);
        emit_field(&mut map, "sourceRank", &self.source_rank);
        emit_field(&mut map, "matrix", &self.matrix);
        imvox_json::extend_extra(&mut map, &self.extra);
        Value::Object(map)
    }
}

impl_json_eq!(CoordinateSpaceTransform);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dimension_scale_wire_form() {
        let scale =
            DimensionScale::from_json(&json!([4e-9, "m"]), AccessMode::ReadWrite).unwrap();
        assert_eq!(scale.scale, 4e-9);
        assert_eq!(scale.unit, "m");
        assert_eq!(scale.to_json(), json!([4e-9, "m"]));
        assert!(DimensionScale::from_json(&json!([4e-9]), AccessMode::ReadWrite).is_err());
    }

    #[test]
    fn test_coordinate_space_preserves_rank_order() {
        let input = json!({"z": [40e-9, "m"], "y": [4e-9, "m"], "x": [4e-9, "m"]});
        let space = CoordinateSpace::from_json(&input, AccessMode::ReadWrite).unwrap();
        assert_eq!(space.rank(), 3);
        assert_eq!(space.names().collect::<Vec<_>>(), vec!["z", "y", "x"]);
        assert_eq!(space.to_json(), input);
    }

    #[test]
    fn test_coordinate_space_equality_is_order_sensitive() {
        let a = CoordinateSpace::new()
            .with_dimension("x", 1.0, "m")
            .with_dimension("y", 1.0, "m");
        let b = CoordinateSpace::new()
            .with_dimension("y", 1.0, "m")
            .with_dimension("x", 1.0, "m");
        assert_ne!(a, b);
    }

    #[test]
    fn test_transform_round_trip() {
        let input = json!({
            "outputDimensions": {"x": [1.0, "m"]},
            "sourceRank": 3,
            "matrix": [[1.0, 0.0, 0.0, 0.0]],
            "custom": true,
        });
        let transform =
            CoordinateSpaceTransform::from_json(&input, AccessMode::ReadWrite).unwrap();
        assert_eq!(transform.source_rank(), Some(3));
        assert_eq!(transform.output_dimensions().rank(), 1);
        assert_eq!(transform.to_json(), input);
    }

    #[test]
    fn test_empty_transform_emits_nothing() {
        let transform =
            CoordinateSpaceTransform::from_json(&json!({}), AccessMode::ReadWrite).unwrap();
        assert_eq!(transform.to_json(), json!({}));
    }
}
